//! Disposable registration handles.
//!
//! A [`Subscription`] owns one listener or observer registration and
//! releases it when disposed or dropped, so an effect that drops its
//! subscriptions in `destroy()` leaves nothing attached to the page.

use super::{Host, ListenerId, ObserverId};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    Listener(ListenerId),
    Observer(ObserverId),
}

/// Owned listener or observer registration
pub struct Subscription<P: Host> {
    host: Weak<P>,
    registration: Option<Registration>,
}

impl<P: Host> Subscription<P> {
    /// Wrap an event listener registration
    #[must_use]
    pub fn listener(host: &Rc<P>, id: ListenerId) -> Self {
        Self {
            host: Rc::downgrade(host),
            registration: Some(Registration::Listener(id)),
        }
    }

    /// Wrap an intersection observer registration
    #[must_use]
    pub fn observer(host: &Rc<P>, id: ObserverId) -> Self {
        Self {
            host: Rc::downgrade(host),
            registration: Some(Registration::Observer(id)),
        }
    }

    /// Whether the registration is still held
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.registration.is_some()
    }

    /// Observer id, if this wraps an observer
    #[must_use]
    pub fn observer_id(&self) -> Option<ObserverId> {
        match self.registration {
            Some(Registration::Observer(id)) => Some(id),
            _ => None,
        }
    }

    /// Release the registration; later calls are no-ops
    pub fn dispose(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        let Some(host) = self.host.upgrade() else {
            return;
        };
        match registration {
            Registration::Listener(id) => host.unlisten(id),
            Registration::Observer(id) => host.disconnect(id),
        }
    }

    /// Give up ownership without releasing; the registration lives on
    pub fn detach(mut self) {
        self.registration = None;
    }
}

impl<P: Host> Drop for Subscription<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<P: Host> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("registration", &self.registration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EventKind, ListenTarget, MockHost};

    fn listen_click(host: &Rc<MockHost>) -> ListenerId {
        host.listen(
            ListenTarget::Document,
            EventKind::Click,
            false,
            Box::new(|_| {}),
        )
        .unwrap()
    }

    #[test]
    fn test_drop_releases_listener() {
        let host = Rc::new(MockHost::new());
        let id = listen_click(&host);
        assert_eq!(host.listener_count(), 1);
        {
            let _sub = Subscription::listener(&host, id);
        }
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let host = Rc::new(MockHost::new());
        let mut sub = Subscription::listener(&host, listen_click(&host));
        assert!(sub.is_active());
        sub.dispose();
        sub.dispose();
        assert!(!sub.is_active());
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let host = Rc::new(MockHost::new());
        let sub = Subscription::listener(&host, listen_click(&host));
        sub.detach();
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_observer_disconnect_on_drop() {
        let host = Rc::new(MockHost::new());
        let body = host.body().unwrap();
        let id = host
            .observe_intersection(&[body], 0.2, Box::new(|_| {}))
            .unwrap();
        let sub = Subscription::observer(&host, id);
        assert_eq!(sub.observer_id(), Some(id));
        assert_eq!(host.observer_count(), 1);
        drop(sub);
        assert_eq!(host.observer_count(), 0);
    }
}
