//! Host platform abstraction.
//!
//! Every effect talks to the page through [`Host`]: tree queries and
//! mutation, per-frame callbacks, one-shot timers, event listeners and
//! intersection observation. Two implementations ship with the crate:
//!
//! - [`MockHost`]: in-memory document with a deterministic frame queue and
//!   virtual clock, always compiled, used by every test.
//! - `BrowserHost` (feature `wasm`): `web-sys` bindings.
//!
//! All methods take `&self`; hosts use interior mutability and must not hold
//! internal borrows while invoking a callback, because callbacks re-enter
//! the host (a frame callback requests the next frame).

mod mock;
mod subscription;

#[cfg(feature = "wasm")]
mod browser;

#[cfg(feature = "wasm")]
pub use browser::BrowserHost;
pub use mock::{MockHost, MockNode, NodeId};
pub use subscription::Subscription;

use crate::result::FxResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace for SVG elements
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Handle of a pending frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Handle of a pending one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Registration id of an event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Registration id of an intersection observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Element bounding box in client coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a rect
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// DOM events the effects listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `click`
    Click,
    /// `mouseenter`
    MouseEnter,
    /// `mousemove`
    MouseMove,
    /// `mouseleave`
    MouseLeave,
    /// `touchstart`
    TouchStart,
    /// `visibilitychange`
    VisibilityChange,
    /// `DOMContentLoaded`
    DomContentLoaded,
}

impl EventKind {
    /// DOM event type name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseEnter => "mouseenter",
            Self::MouseMove => "mousemove",
            Self::MouseLeave => "mouseleave",
            Self::TouchStart => "touchstart",
            Self::VisibilityChange => "visibilitychange",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// Whether the event propagates from the target up to the document
    #[must_use]
    pub const fn bubbles(self) -> bool {
        matches!(self, Self::Click | Self::MouseMove | Self::TouchStart)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    /// The document itself
    Document,
    /// A specific element
    Element(N),
}

/// An event as seen by effect handlers
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent<N> {
    /// Event type
    pub kind: EventKind,
    /// Innermost element the event was dispatched to
    pub target: Option<N>,
    /// Pointer x in client coordinates (0 for non-pointer events)
    pub client_x: f64,
    /// Pointer y in client coordinates (0 for non-pointer events)
    pub client_y: f64,
}

impl<N> DomEvent<N> {
    /// Create an event without pointer coordinates
    #[must_use]
    pub const fn new(kind: EventKind, target: Option<N>) -> Self {
        Self {
            kind,
            target,
            client_x: 0.0,
            client_y: 0.0,
        }
    }

    /// Attach pointer coordinates
    #[must_use]
    pub const fn at(mut self, client_x: f64, client_y: f64) -> Self {
        self.client_x = client_x;
        self.client_y = client_y;
        self
    }
}

/// One intersection observer record
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<N> {
    /// Observed element
    pub target: N,
    /// Visible fraction of the element, 0.0 to 1.0
    pub ratio: f64,
    /// Whether any part of the element is in view
    pub is_intersecting: bool,
}

/// Callback run before the next repaint, given the frame timestamp in ms
pub type FrameCallback = Box<dyn FnOnce(f64)>;
/// Callback run once when a timer expires
pub type TimerCallback = Box<dyn FnOnce()>;
/// Event listener callback
pub type EventHandler<N> = Box<dyn FnMut(&DomEvent<N>)>;
/// Intersection observer callback
pub type IntersectionHandler<N> = Box<dyn FnMut(&[IntersectionEntry<N>])>;

/// Page environment the effects run against
pub trait Host: fmt::Debug + 'static {
    /// Element handle
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    // ------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------

    /// Evaluate a media query
    fn media_matches(&self, query: &str) -> bool;

    /// Platform random source, uniform in [0, 1)
    fn random(&self) -> f64;

    /// Whether the document is currently hidden (background tab)
    fn document_hidden(&self) -> bool;

    /// Whether the document finished parsing (`readyState != "loading"`)
    fn document_ready(&self) -> bool;

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First element matching `selector`, in document order
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    /// All elements matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Element with the given `id` attribute
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// `node` or its nearest ancestor matching `selector`
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// The `<head>` element
    fn head(&self) -> Option<Self::Node>;

    /// The `<body>` element
    fn body(&self) -> Option<Self::Node>;

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Create a detached HTML element
    fn create_element(&self, tag: &str) -> FxResult<Self::Node>;

    /// Create a detached SVG element
    fn create_svg_element(&self, tag: &str) -> FxResult<Self::Node>;

    /// Append `child` as the last child of `parent`
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> FxResult<()>;

    /// Insert `child` as the first child of `parent`
    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node) -> FxResult<()>;

    /// Detach `node` (and its subtree) from the document
    fn remove_node(&self, node: &Self::Node);

    /// Set an attribute
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> FxResult<()>;

    /// Read an attribute
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set one inline style property
    fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> FxResult<()>;

    /// Read one inline style property
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Read one computed style property
    fn computed_style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Concatenated text of the subtree
    fn text_content(&self, node: &Self::Node) -> String;

    /// Replace the subtree with a single text node
    fn set_text_content(&self, node: &Self::Node, text: &str) -> FxResult<()>;

    /// Bounding box in client coordinates
    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Run `callback` before the next repaint
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a pending frame callback
    fn cancel_frame(&self, handle: FrameHandle);

    /// Run `callback` once after `delay_ms`
    fn set_timeout(&self, callback: TimerCallback, delay_ms: u32) -> TimerHandle;

    /// Drop a pending timer
    fn clear_timeout(&self, handle: TimerHandle);

    /// Attach an event listener; `once` listeners detach after the first call
    fn listen(
        &self,
        target: ListenTarget<Self::Node>,
        kind: EventKind,
        once: bool,
        handler: EventHandler<Self::Node>,
    ) -> FxResult<ListenerId>;

    /// Detach a listener; unknown ids are ignored
    fn unlisten(&self, id: ListenerId);

    /// Observe `nodes` for viewport intersection at `threshold`
    fn observe_intersection(
        &self,
        nodes: &[Self::Node],
        threshold: f64,
        handler: IntersectionHandler<Self::Node>,
    ) -> FxResult<ObserverId>;

    /// Stop observing one node
    fn unobserve(&self, observer: ObserverId, node: &Self::Node);

    /// Stop observing everything and drop the observer
    fn disconnect(&self, observer: ObserverId);

    // ------------------------------------------------------------------
    // Provided helpers
    // ------------------------------------------------------------------

    /// Set several inline style properties in order
    fn set_styles(&self, node: &Self::Node, declarations: &[(&str, &str)]) -> FxResult<()> {
        for (property, value) in declarations {
            self.set_style(node, property, value)?;
        }
        Ok(())
    }

    /// Create an element with a class already set
    fn create_with_class(&self, tag: &str, class: &str) -> FxResult<Self::Node> {
        let node = self.create_element(tag)?;
        self.set_attribute(&node, "class", class)?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::Click.as_str(), "click");
        assert_eq!(EventKind::MouseMove.to_string(), "mousemove");
        assert_eq!(EventKind::DomContentLoaded.as_str(), "DOMContentLoaded");
    }

    #[test]
    fn test_event_kind_bubbles() {
        assert!(EventKind::Click.bubbles());
        assert!(EventKind::TouchStart.bubbles());
        assert!(!EventKind::MouseEnter.bubbles());
        assert!(!EventKind::MouseLeave.bubbles());
        assert!(!EventKind::VisibilityChange.bubbles());
    }

    #[test]
    fn test_dom_event_at() {
        let event: DomEvent<u8> = DomEvent::new(EventKind::Click, Some(1)).at(30.0, 10.0);
        assert_eq!(event.client_x, 30.0);
        assert_eq!(event.client_y, 10.0);
        assert_eq!(event.target, Some(1));
    }
}
