//! Mock Host for Testing
//!
//! In-memory document with a deterministic frame queue and a virtual clock.
//! Effects run against it exactly as they would in a browser, and tests
//! drive time explicitly:
//!
//! - [`MockHost::advance_frame`] runs every frame callback queued so far;
//!   callbacks requested while running land in the next frame.
//! - [`MockHost::advance_time`] moves the virtual clock and fires due timers.
//! - [`MockHost::click`], [`MockHost::mouse_move`], ... dispatch events with
//!   bubbling to element and document listeners.
//! - [`MockHost::set_intersection`] feeds intersection observers.
//!
//! Selector support covers what the effects use: compound selectors made of
//! an optional tag, `#id`, `.class`, `[attr]` and `[attr=value]` parts, and
//! comma-separated lists. Combinators are not supported and match nothing.

use super::{
    DomEvent, EventHandler, EventKind, FrameCallback, FrameHandle, Host, IntersectionEntry,
    IntersectionHandler, ListenTarget, ListenerId, ObserverId, Rect, TimerCallback, TimerHandle,
};
use crate::result::{FxError, FxResult};
use crate::rng::DeterministicRng;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Handle of a mock DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node in the mock document
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    /// Element tag name (lowercase)
    pub tag: String,
    /// Whether the element lives in the SVG namespace
    pub svg: bool,
    /// Element attributes
    pub attributes: BTreeMap<String, String>,
    /// Inline style declarations, in insertion order
    pub styles: Vec<(String, String)>,
    /// Own text (set through `set_text_content`)
    pub text: String,
    /// Child elements
    pub children: Vec<NodeId>,
    /// Parent element
    pub parent: Option<NodeId>,
    /// Bounding box reported by `bounding_rect`
    pub rect: Rect,
}

impl MockNode {
    fn new(tag: &str, svg: bool) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            svg,
            attributes: BTreeMap::new(),
            styles: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            rect: Rect::default(),
        }
    }

    /// Checks if element has a class
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Gets an attribute value
    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Gets an inline style value
    #[must_use]
    pub fn get_style(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    fn set_style(&mut self, property: &str, value: &str) {
        if let Some(slot) = self.styles.iter_mut().find(|(p, _)| p == property) {
            slot.1 = value.to_string();
        } else {
            self.styles.push((property.to_string(), value.to_string()));
        }
    }
}

// ============================================================================
// Selectors
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, node: &MockNode) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.get_attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            None => node.attributes.contains_key(name),
            Some(expected) => node.get_attr(name) == Some(expected.as_str()),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn parse_compound(text: &str) -> Option<Compound> {
    let chars: Vec<char> = text.trim().chars().collect();
    if chars.is_empty() {
        return None;
    }
    let mut compound = Compound::default();
    let mut pos = 0;
    if is_ident_char(chars[0]) {
        compound.tag = Some(take_ident(&chars, &mut pos));
    } else if chars[0] == '*' {
        pos = 1;
    }
    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                pos += 1;
                compound.id = Some(take_ident(&chars, &mut pos));
            }
            '.' => {
                pos += 1;
                compound.classes.push(take_ident(&chars, &mut pos));
            }
            '[' => {
                let close = chars[pos..].iter().position(|&c| c == ']')? + pos;
                let inner: String = chars[pos + 1..close].iter().collect();
                let attribute = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim().to_string(),
                        Some(value.trim().trim_matches(&['"', '\''][..]).to_string()),
                    ),
                    None => (inner.trim().to_string(), None),
                };
                compound.attributes.push(attribute);
                pos = close + 1;
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn parse_selector(selector: &str) -> Vec<Compound> {
    selector.split(',').filter_map(parse_compound).collect()
}

// ============================================================================
// Scheduling state
// ============================================================================

struct PendingTimer {
    id: u64,
    due_ms: f64,
    callback: TimerCallback,
}

#[derive(Default)]
struct Scheduler {
    now_ms: f64,
    frames: Vec<(u64, FrameCallback)>,
    timers: Vec<PendingTimer>,
}

struct ListenerEntry {
    target: ListenTarget<NodeId>,
    kind: EventKind,
    once: bool,
    handler: Option<EventHandler<NodeId>>,
}

struct ObserverEntry {
    threshold: f64,
    observed: Vec<NodeId>,
    handler: Option<IntersectionHandler<NodeId>>,
}

// ============================================================================
// MockHost
// ============================================================================

/// In-memory host for driving effects in tests
pub struct MockHost {
    nodes: RefCell<Vec<MockNode>>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    scheduler: RefCell<Scheduler>,
    listeners: RefCell<BTreeMap<ListenerId, ListenerEntry>>,
    observers: RefCell<BTreeMap<ObserverId, ObserverEntry>>,
    media: RefCell<HashMap<String, bool>>,
    rng: RefCell<DeterministicRng>,
    hidden: Cell<bool>,
    ready: Cell<bool>,
    next_id: Cell<u64>,
    mutations: Cell<u64>,
    frames_run: Cell<u64>,
    insert_budget: Cell<Option<usize>>,
    styles_refused: Cell<bool>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHost")
            .field("nodes", &self.nodes.borrow().len())
            .field("pending_frames", &self.pending_frames())
            .field("pending_timers", &self.pending_timers())
            .field("listeners", &self.listener_count())
            .field("observers", &self.observer_count())
            .field("mutations", &self.mutations.get())
            .finish_non_exhaustive()
    }
}

impl MockHost {
    /// Creates a document with `<html>`, `<head>` and `<body>`, fully parsed
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    /// Same as [`MockHost::new`] with a specific random seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut html = MockNode::new("html", false);
        let mut head = MockNode::new("head", false);
        let mut body = MockNode::new("body", false);
        let (root, head_id, body_id) = (NodeId(0), NodeId(1), NodeId(2));
        head.parent = Some(root);
        body.parent = Some(root);
        html.children = vec![head_id, body_id];
        Self {
            nodes: RefCell::new(vec![html, head, body]),
            root,
            head: head_id,
            body: body_id,
            scheduler: RefCell::new(Scheduler::default()),
            listeners: RefCell::new(BTreeMap::new()),
            observers: RefCell::new(BTreeMap::new()),
            media: RefCell::new(HashMap::new()),
            rng: RefCell::new(DeterministicRng::new(seed)),
            hidden: Cell::new(false),
            ready: Cell::new(true),
            next_id: Cell::new(1),
            mutations: Cell::new(0),
            frames_run: Cell::new(0),
            insert_budget: Cell::new(None),
            styles_refused: Cell::new(false),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn mutated(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }

    // ------------------------------------------------------------------
    // Fixture building (not counted as mutations)
    // ------------------------------------------------------------------

    /// Adds an element under `parent` with the given attributes
    pub fn add_element(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut node = MockNode::new(tag, false);
        for (name, value) in attributes {
            node.attributes
                .insert((*name).to_string(), (*value).to_string());
        }
        node.parent = Some(parent);
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(node);
        nodes[parent.0].children.push(id);
        id
    }

    /// Adds an element under `<body>`
    pub fn add_to_body(&self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.add_element(self.body, tag, attributes)
    }

    /// Sets the bounding box reported for `node`
    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(node.0) {
            n.rect = rect;
        }
    }

    /// Sets the own text of `node` without counting a mutation
    pub fn set_fixture_text(&self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(node.0) {
            n.text = text.to_string();
        }
    }

    /// Answers a media query
    pub fn set_media(&self, query: &str, matches: bool) {
        self.media.borrow_mut().insert(query.to_string(), matches);
    }

    /// Marks the document as still loading
    pub fn set_loading(&self) {
        self.ready.set(false);
    }

    /// Lets `n` more appends or prepends succeed, then refuses every insert
    pub fn fail_inserts_after(&self, n: usize) {
        self.insert_budget.set(Some(n));
    }

    /// Makes every inline style write fail while `refused` is set
    pub fn refuse_styles(&self, refused: bool) {
        self.styles_refused.set(refused);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Snapshot of a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<MockNode> {
        self.nodes.borrow().get(id.0).cloned()
    }

    /// Child ids of a node
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(id.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Parent id of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(id.0).and_then(|n| n.parent)
    }

    /// Whether the node is reachable from the document root
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = nodes.get(node.0).and_then(|n| n.parent);
        }
        false
    }

    /// Number of DOM mutations (append, prepend, remove, attribute, style, text)
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations.get()
    }

    /// Number of queued frame callbacks
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.scheduler.borrow().frames.len()
    }

    /// Number of pending timers
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.borrow().timers.len()
    }

    /// Number of frames run so far
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frames_run.get()
    }

    /// Number of attached listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of attached listeners of one kind
    #[must_use]
    pub fn listener_count_of(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .values()
            .filter(|l| l.kind == kind)
            .count()
    }

    /// Number of live intersection observers
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Whether any observer still watches `node`
    #[must_use]
    pub fn is_observed(&self, node: NodeId) -> bool {
        self.observers
            .borrow()
            .values()
            .any(|o| o.observed.contains(&node))
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.scheduler.borrow().now_ms
    }

    // ------------------------------------------------------------------
    // Driving time
    // ------------------------------------------------------------------

    /// Runs every frame callback queued before this call; returns how many ran
    ///
    /// Frames do not move the virtual clock.
    pub fn advance_frame(&self) -> usize {
        let batch = std::mem::take(&mut self.scheduler.borrow_mut().frames);
        let now = self.now_ms();
        let count = batch.len();
        for (_, callback) in batch {
            callback(now);
        }
        self.frames_run.set(self.frames_run.get() + 1);
        count
    }

    /// Runs `n` frames
    pub fn advance_frames(&self, n: usize) {
        for _ in 0..n {
            self.advance_frame();
        }
    }

    /// Moves the clock forward, firing due timers in due order
    pub fn advance_time(&self, ms: f64) {
        let target = self.now_ms() + ms;
        loop {
            let next = {
                let mut scheduler = self.scheduler.borrow_mut();
                let due = scheduler
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= target)
                    .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)))
                    .map(|(index, _)| index);
                due.map(|index| {
                    let timer = scheduler.timers.remove(index);
                    scheduler.now_ms = timer.due_ms;
                    timer.callback
                })
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.scheduler.borrow_mut().now_ms = target;
    }

    // ------------------------------------------------------------------
    // Dispatching events
    // ------------------------------------------------------------------

    fn event_path(&self, event: &DomEvent<NodeId>) -> Vec<ListenTarget<NodeId>> {
        let mut path = Vec::new();
        if let Some(target) = event.target {
            path.push(ListenTarget::Element(target));
            if event.kind.bubbles() {
                let nodes = self.nodes.borrow();
                let mut current = nodes.get(target.0).and_then(|n| n.parent);
                while let Some(node) = current {
                    path.push(ListenTarget::Element(node));
                    current = nodes.get(node.0).and_then(|n| n.parent);
                }
            }
        }
        if event.target.is_none() || event.kind.bubbles() {
            path.push(ListenTarget::Document);
        }
        path
    }

    /// Dispatches an event to element listeners along the path, then the document
    pub fn dispatch(&self, event: &DomEvent<NodeId>) {
        for hop in self.event_path(event) {
            let ids: Vec<ListenerId> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, l)| l.kind == event.kind && l.target == hop)
                .map(|(id, _)| *id)
                .collect();
            for id in ids {
                let taken = self
                    .listeners
                    .borrow_mut()
                    .get_mut(&id)
                    .and_then(|l| l.handler.take().map(|h| (h, l.once)));
                let Some((mut handler, once)) = taken else {
                    continue;
                };
                handler(event);
                let mut listeners = self.listeners.borrow_mut();
                if once {
                    listeners.remove(&id);
                } else if let Some(entry) = listeners.get_mut(&id) {
                    entry.handler = Some(handler);
                }
            }
        }
    }

    /// Clicks `node` at client coordinates
    pub fn click(&self, node: NodeId, client_x: f64, client_y: f64) {
        self.dispatch(&DomEvent::new(EventKind::Click, Some(node)).at(client_x, client_y));
    }

    /// Pointer enters `node`
    pub fn mouse_enter(&self, node: NodeId, client_x: f64, client_y: f64) {
        self.dispatch(&DomEvent::new(EventKind::MouseEnter, Some(node)).at(client_x, client_y));
    }

    /// Pointer moves over `node`
    pub fn mouse_move(&self, node: NodeId, client_x: f64, client_y: f64) {
        self.dispatch(&DomEvent::new(EventKind::MouseMove, Some(node)).at(client_x, client_y));
    }

    /// Pointer leaves `node`
    pub fn mouse_leave(&self, node: NodeId) {
        self.dispatch(&DomEvent::new(EventKind::MouseLeave, Some(node)));
    }

    /// Touch starts on `node`
    pub fn touch_start(&self, node: NodeId) {
        self.dispatch(&DomEvent::new(EventKind::TouchStart, Some(node)));
    }

    /// Changes document visibility and fires `visibilitychange`
    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
        self.dispatch(&DomEvent::new(EventKind::VisibilityChange, None));
    }

    /// Finishes parsing and fires `DOMContentLoaded`
    pub fn finish_loading(&self) {
        self.ready.set(true);
        self.dispatch(&DomEvent::new(EventKind::DomContentLoaded, None));
    }

    /// Reports `node` as `ratio` visible to every observer watching it
    ///
    /// An entry is delivered on every call, whether or not the ratio changed.
    pub fn set_intersection(&self, node: NodeId, ratio: f64) {
        let ids: Vec<ObserverId> = self
            .observers
            .borrow()
            .iter()
            .filter(|(_, o)| o.observed.contains(&node))
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let taken = self
                .observers
                .borrow_mut()
                .get_mut(&id)
                .and_then(|o| o.handler.take());
            let Some(mut handler) = taken else {
                continue;
            };
            let entry = IntersectionEntry {
                target: node,
                ratio,
                is_intersecting: ratio > 0.0,
            };
            handler(&[entry]);
            if let Some(observer) = self.observers.borrow_mut().get_mut(&id) {
                observer.handler = Some(handler);
            }
        }
    }

    /// Threshold an observer was created with
    #[must_use]
    pub fn observer_threshold(&self, id: ObserverId) -> Option<f64> {
        self.observers.borrow().get(&id).map(|o| o.threshold)
    }

    // ------------------------------------------------------------------
    // Tree helpers
    // ------------------------------------------------------------------

    fn document_order(&self) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = nodes.get(id.0) {
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    fn matching(&self, selector: &str) -> Vec<NodeId> {
        let compounds = parse_selector(selector);
        if compounds.is_empty() {
            return Vec::new();
        }
        let order = self.document_order();
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .filter(|id| *id != self.root)
            .filter(|id| compounds.iter().any(|c| c.matches(&nodes[id.0])))
            .collect()
    }

    fn detach(nodes: &mut [MockNode], child: NodeId) {
        if let Some(parent) = nodes[child.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != child);
        }
    }

    fn insert(&self, parent: NodeId, child: NodeId, first: bool) -> FxResult<()> {
        match self.insert_budget.get() {
            Some(0) => return Err(FxError::dom("insert", "insert refused")),
            Some(left) => self.insert_budget.set(Some(left - 1)),
            None => {}
        }
        let mut nodes = self.nodes.borrow_mut();
        if parent.0 >= nodes.len() || child.0 >= nodes.len() {
            return Err(FxError::Detached);
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(FxError::dom("insert", "cannot insert a node into itself"));
            }
            ancestor = nodes[a.0].parent;
        }
        Self::detach(&mut nodes, child);
        nodes[child.0].parent = Some(parent);
        if first {
            nodes[parent.0].children.insert(0, child);
        } else {
            nodes[parent.0].children.push(child);
        }
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn collect_text(nodes: &[MockNode], id: NodeId, out: &mut String) {
        let node = &nodes[id.0];
        out.push_str(&node.text);
        for child in &node.children {
            Self::collect_text(nodes, *child, out);
        }
    }

    fn create(&self, tag: &str, svg: bool) -> FxResult<NodeId> {
        if tag.is_empty() || !tag.chars().all(is_ident_char) {
            return Err(FxError::dom("create_element", format!("invalid tag {tag:?}")));
        }
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(MockNode::new(tag, svg));
        Ok(id)
    }
}

impl Host for MockHost {
    type Node = NodeId;

    fn media_matches(&self, query: &str) -> bool {
        self.media.borrow().get(query).copied().unwrap_or(false)
    }

    fn random(&self) -> f64 {
        self.rng.borrow_mut().next_f64()
    }

    fn document_hidden(&self) -> bool {
        self.hidden.get()
    }

    fn document_ready(&self) -> bool {
        self.ready.get()
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.matching(selector).into_iter().next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.matching(selector)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let order = self.document_order();
        let nodes = self.nodes.borrow();
        order
            .into_iter()
            .find(|n| nodes[n.0].get_attr("id") == Some(id))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let compounds = parse_selector(selector);
        let nodes = self.nodes.borrow();
        let mut current = Some(*node);
        while let Some(id) = current {
            let n = nodes.get(id.0)?;
            if id != self.root && compounds.iter().any(|c| c.matches(n)) {
                return Some(id);
            }
            current = n.parent;
        }
        None
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn create_element(&self, tag: &str) -> FxResult<NodeId> {
        self.create(tag, false)
    }

    fn create_svg_element(&self, tag: &str) -> FxResult<NodeId> {
        self.create(tag, true)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> FxResult<()> {
        self.insert(*parent, *child, false)
    }

    fn prepend_child(&self, parent: &NodeId, child: &NodeId) -> FxResult<()> {
        self.insert(*parent, *child, true)
    }

    fn remove_node(&self, node: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if node.0 < nodes.len() && nodes[node.0].parent.is_some() {
            Self::detach(&mut nodes, *node);
            drop(nodes);
            self.mutated();
        }
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> FxResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        let n = nodes.get_mut(node.0).ok_or(FxError::Detached)?;
        n.attributes.insert(name.to_string(), value.to_string());
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(node.0)
            .and_then(|n| n.get_attr(name).map(str::to_string))
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) -> FxResult<()> {
        if self.styles_refused.get() {
            return Err(FxError::dom("set_style", "style write refused"));
        }
        let mut nodes = self.nodes.borrow_mut();
        let n = nodes.get_mut(node.0).ok_or(FxError::Detached)?;
        n.set_style(property, value);
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(node.0)
            .and_then(|n| n.get_style(property).map(str::to_string))
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.style(node, property).or_else(|| match property {
            "position" => Some("static".to_string()),
            "display" => Some("block".to_string()),
            "overflow" => Some("visible".to_string()),
            _ => None,
        })
    }

    fn text_content(&self, node: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if node.0 < nodes.len() {
            Self::collect_text(&nodes, *node, &mut out);
        }
        out
    }

    fn set_text_content(&self, node: &NodeId, text: &str) -> FxResult<()> {
        let mut nodes = self.nodes.borrow_mut();
        if node.0 >= nodes.len() {
            return Err(FxError::Detached);
        }
        let children = std::mem::take(&mut nodes[node.0].children);
        for child in children {
            nodes[child.0].parent = None;
        }
        nodes[node.0].text = text.to_string();
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.nodes
            .borrow()
            .get(node.0)
            .map(|n| n.rect)
            .unwrap_or_default()
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id();
        self.scheduler.borrow_mut().frames.push((id, callback));
        FrameHandle(id)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.scheduler
            .borrow_mut()
            .frames
            .retain(|(id, _)| *id != handle.0);
    }

    fn set_timeout(&self, callback: TimerCallback, delay_ms: u32) -> TimerHandle {
        let id = self.next_id();
        let mut scheduler = self.scheduler.borrow_mut();
        let due_ms = scheduler.now_ms + f64::from(delay_ms);
        scheduler.timers.push(PendingTimer {
            id,
            due_ms,
            callback,
        });
        TimerHandle(id)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.scheduler
            .borrow_mut()
            .timers
            .retain(|t| t.id != handle.0);
    }

    fn listen(
        &self,
        target: ListenTarget<NodeId>,
        kind: EventKind,
        once: bool,
        handler: EventHandler<NodeId>,
    ) -> FxResult<ListenerId> {
        if let ListenTarget::Element(node) = &target {
            if node.0 >= self.nodes.borrow().len() {
                return Err(FxError::Detached);
            }
        }
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().insert(
            id,
            ListenerEntry {
                target,
                kind,
                once,
                handler: Some(handler),
            },
        );
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }

    fn observe_intersection(
        &self,
        nodes: &[NodeId],
        threshold: f64,
        handler: IntersectionHandler<NodeId>,
    ) -> FxResult<ObserverId> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FxError::dom(
                "observe_intersection",
                format!("threshold {threshold} outside [0, 1]"),
            ));
        }
        let id = ObserverId(self.next_id());
        self.observers.borrow_mut().insert(
            id,
            ObserverEntry {
                threshold,
                observed: nodes.to_vec(),
                handler: Some(handler),
            },
        );
        Ok(id)
    }

    fn unobserve(&self, observer: ObserverId, node: &NodeId) {
        if let Some(entry) = self.observers.borrow_mut().get_mut(&observer) {
            entry.observed.retain(|n| n != node);
        }
    }

    fn disconnect(&self, observer: ObserverId) {
        self.observers.borrow_mut().remove(&observer);
    }
}
