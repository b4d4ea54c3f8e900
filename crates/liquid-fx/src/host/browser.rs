//! Browser host backed by `web-sys`.
//!
//! Every closure handed to JavaScript is owned by the host. Frame and timer
//! closures are dropped on cancel, or set aside when they fire and dropped
//! once the next one fires (a closure is never dropped while it runs).
//! Listener and observer closures live until `unlisten` / `disconnect`.

use super::{
    DomEvent, EventHandler, EventKind, FrameCallback, FrameHandle, Host, IntersectionEntry,
    IntersectionHandler, ListenTarget, ListenerId, ObserverId, Rect, TimerCallback, TimerHandle,
    SVG_NS,
};
use crate::result::{FxError, FxResult};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, CssStyleDeclaration, Document, Element, Event, EventTarget,
    HtmlElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    MouseEvent, SvgElement, Window,
};

struct ListenerEntry {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(Event)>,
}

struct ObserverEntry {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

type FrameClosure = Closure<dyn FnMut(f64)>;
type TimerClosure = Closure<dyn FnMut()>;

/// Frame and timer closures keyed by the handle given to effects
#[derive(Default)]
struct Scheduled {
    frames: HashMap<u64, (i32, FrameClosure)>,
    timers: HashMap<u64, (i32, TimerClosure)>,
    spent_frames: Vec<FrameClosure>,
    spent_timers: Vec<TimerClosure>,
}

impl Scheduled {
    // Callbacks never nest, so everything already spent has returned
    fn drop_spent(&mut self) {
        self.spent_frames.clear();
        self.spent_timers.clear();
    }

    fn retire_frame(&mut self, key: u64) {
        self.drop_spent();
        if let Some((_, closure)) = self.frames.remove(&key) {
            self.spent_frames.push(closure);
        }
    }

    fn retire_timer(&mut self, key: u64) {
        self.drop_spent();
        if let Some((_, closure)) = self.timers.remove(&key) {
            self.spent_timers.push(closure);
        }
    }
}

/// Host talking to the live page
pub struct BrowserHost {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<ListenerId, ListenerEntry>>,
    observers: RefCell<HashMap<ObserverId, ObserverEntry>>,
    scheduled: Rc<RefCell<Scheduled>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for BrowserHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheduled = self.scheduled.borrow();
        f.debug_struct("BrowserHost")
            .field("listeners", &self.listeners.borrow().len())
            .field("observers", &self.observers.borrow().len())
            .field("frames", &scheduled.frames.len())
            .field("timers", &scheduled.timers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for BrowserHost {
    fn drop(&mut self) {
        let mut scheduled = self.scheduled.borrow_mut();
        for (_, (handle, _)) in scheduled.frames.drain() {
            if let Err(err) = self.window.cancel_animation_frame(handle) {
                tracing::debug!(error = %js_message(&err), "cancelAnimationFrame failed");
            }
        }
        for (_, (handle, _)) in scheduled.timers.drain() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn dom_error(operation: &'static str) -> impl Fn(JsValue) -> FxError {
    move |value| FxError::dom(operation, js_message(&value))
}

fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        return Some(html.style());
    }
    element.dyn_ref::<SvgElement>().map(SvgElement::style)
}

fn to_dom_event(kind: EventKind, event: &Event) -> DomEvent<Element> {
    let target = event.target().and_then(|t| t.dyn_into::<Element>().ok());
    let dom_event = DomEvent::new(kind, target);
    match event.dyn_ref::<MouseEvent>() {
        Some(mouse) => dom_event.at(f64::from(mouse.client_x()), f64::from(mouse.client_y())),
        None => dom_event,
    }
}

impl BrowserHost {
    /// Bind to the current window and document
    ///
    /// # Errors
    ///
    /// Returns an error outside a browser window context
    pub fn new() -> FxResult<Self> {
        let window = web_sys::window().ok_or_else(|| FxError::host_unavailable("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| FxError::host_unavailable("window has no document"))?;
        Ok(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
            scheduled: Rc::new(RefCell::new(Scheduled::default())),
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Host for BrowserHost {
    type Node = Element;

    fn media_matches(&self, query: &str) -> bool {
        self.window
            .match_media(query)
            .ok()
            .flatten()
            .is_some_and(|list| list.matches())
    }

    fn random(&self) -> f64 {
        js_sys::Math::random()
    }

    fn document_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn document_ready(&self) -> bool {
        self.document.ready_state() != "loading"
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            tracing::debug!(selector, "invalid selector");
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn head(&self) -> Option<Element> {
        self.document.head().map(Element::from)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn create_element(&self, tag: &str) -> FxResult<Element> {
        self.document
            .create_element(tag)
            .map_err(dom_error("create_element"))
    }

    fn create_svg_element(&self, tag: &str) -> FxResult<Element> {
        self.document
            .create_element_ns(Some(SVG_NS), tag)
            .map_err(dom_error("create_element_ns"))
    }

    fn append_child(&self, parent: &Element, child: &Element) -> FxResult<()> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(dom_error("append_child"))
    }

    fn prepend_child(&self, parent: &Element, child: &Element) -> FxResult<()> {
        let first = parent.first_child();
        parent
            .insert_before(child, first.as_ref())
            .map(|_| ())
            .map_err(dom_error("insert_before"))
    }

    fn remove_node(&self, node: &Element) {
        node.remove();
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> FxResult<()> {
        node.set_attribute(name, value)
            .map_err(dom_error("set_attribute"))
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) -> FxResult<()> {
        let style = inline_style(node)
            .ok_or_else(|| FxError::dom("set_style", "element has no inline style"))?;
        style
            .set_property(property, value)
            .map_err(dom_error("set_property"))
    }

    fn style(&self, node: &Element, property: &str) -> Option<String> {
        inline_style(node)
            .and_then(|style| style.get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn computed_style(&self, node: &Element, property: &str) -> Option<String> {
        self.window
            .get_computed_style(node)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Element, text: &str) -> FxResult<()> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let key = self.next_id();
        let scheduled = Rc::downgrade(&self.scheduled);
        let mut callback = Some(callback);
        let closure = FrameClosure::new(move |timestamp: f64| {
            if let Some(scheduled) = scheduled.upgrade() {
                scheduled.borrow_mut().retire_frame(key);
            }
            if let Some(callback) = callback.take() {
                callback(timestamp);
            }
        });
        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(handle) => {
                self.scheduled.borrow_mut().frames.insert(key, (handle, closure));
                FrameHandle(key)
            }
            Err(err) => {
                tracing::warn!(error = %js_message(&err), "requestAnimationFrame failed");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let pending = self.scheduled.borrow_mut().frames.remove(&handle.0);
        let Some((raw, closure)) = pending else {
            return;
        };
        if let Err(err) = self.window.cancel_animation_frame(raw) {
            tracing::debug!(error = %js_message(&err), "cancelAnimationFrame failed");
        }
        drop(closure);
    }

    fn set_timeout(&self, callback: TimerCallback, delay_ms: u32) -> TimerHandle {
        let key = self.next_id();
        let scheduled = Rc::downgrade(&self.scheduled);
        let mut callback = Some(callback);
        let closure = TimerClosure::new(move || {
            if let Some(scheduled) = scheduled.upgrade() {
                scheduled.borrow_mut().retire_timer(key);
            }
            if let Some(callback) = callback.take() {
                callback();
            }
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            ) {
            Ok(handle) => {
                self.scheduled.borrow_mut().timers.insert(key, (handle, closure));
                TimerHandle(key)
            }
            Err(err) => {
                tracing::warn!(error = %js_message(&err), "setTimeout failed");
                TimerHandle(0)
            }
        }
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let pending = self.scheduled.borrow_mut().timers.remove(&handle.0);
        if let Some((raw, closure)) = pending {
            self.window.clear_timeout_with_handle(raw);
            drop(closure);
        }
    }

    fn listen(
        &self,
        target: ListenTarget<Element>,
        kind: EventKind,
        once: bool,
        mut handler: EventHandler<Element>,
    ) -> FxResult<ListenerId> {
        let target: EventTarget = match target {
            ListenTarget::Document => self.document.clone().into(),
            ListenTarget::Element(element) => element.into(),
        };
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            handler(&to_dom_event(kind, &event));
        });
        let options = AddEventListenerOptions::new();
        options.set_once(once);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind.as_str(),
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(dom_error("add_event_listener"))?;

        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().insert(
            id,
            ListenerEntry {
                target,
                kind,
                closure,
            },
        );
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let Some(entry) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        if let Err(err) = entry.target.remove_event_listener_with_callback(
            entry.kind.as_str(),
            entry.closure.as_ref().unchecked_ref(),
        ) {
            tracing::debug!(error = %js_message(&err), "remove_event_listener failed");
        }
    }

    fn observe_intersection(
        &self,
        nodes: &[Element],
        threshold: f64,
        mut handler: IntersectionHandler<Element>,
    ) -> FxResult<ObserverId> {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |records: js_sys::Array, _observer: IntersectionObserver| {
                let entries: Vec<IntersectionEntry<Element>> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|record| IntersectionEntry {
                        target: record.target(),
                        ratio: record.intersection_ratio(),
                        is_intersecting: record.is_intersecting(),
                    })
                    .collect();
                handler(&entries);
            },
        );
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(threshold));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(dom_error("intersection_observer"))?;
        for node in nodes {
            observer.observe(node);
        }

        let id = ObserverId(self.next_id());
        self.observers.borrow_mut().insert(
            id,
            ObserverEntry {
                observer,
                _callback: callback,
            },
        );
        Ok(id)
    }

    fn unobserve(&self, observer: ObserverId, node: &Element) {
        if let Some(entry) = self.observers.borrow().get(&observer) {
            entry.observer.unobserve(node);
        }
    }

    fn disconnect(&self, observer: ObserverId) {
        if let Some(entry) = self.observers.borrow_mut().remove(&observer) {
            entry.observer.disconnect();
        }
    }
}
