//! # Glide DOM
//!
//! A headless document model for the Glide toolkit.
//!
//! ## Design Goals
//!
//! 1. **Host capabilities**: One document can impersonate a modern or a legacy host,
//!    which decides the listener mechanism, opacity setter and transition support
//! 2. **Arena-backed tree**: Nodes are `Rc<Element>` with weak parent links
//! 3. **Layout-free geometry**: Each element carries an offset box synced from
//!    its `left`/`top`/`width`/`height` inline styles
//! 4. **Event dispatch**: DOM Events with capture/bubble phases
//! 5. **Listener bookkeeping**: [`EventRegistry`] records every attachment for bulk teardown

pub mod events;
pub mod registry;
pub mod style;

pub use events::{
    cancel_bubble, closure, DomEvent, Event, EventDispatcher, EventHandler, EventId, EventPhase,
    EventTarget, HandlerId, HandlerRef, MouseEventData, TransitionEventData,
};
pub use registry::{EventRegistry, ListenerRecord};
pub use style::{set_opacity, ComputedStyleInspector, StyleInspector, StyleValue};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::trace;

use glide_css::{parse_length, Length};

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An element's offset box, relative to its offset parent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// How the host sets element opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpacitySupport {
    /// The `opacity` property.
    #[default]
    Standard,
    /// `-moz-opacity`.
    Moz,
    /// `-khtml-opacity`.
    Khtml,
    /// An `alpha(opacity=N)` filter.
    Filter,
    /// No opacity at all; setting it toggles visibility instead.
    None,
}

/// Low-level listener mechanism, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerApi {
    /// `addEventListener`/`removeEventListener`.
    Standard,
    /// `attachEvent`/`detachEvent`.
    Legacy,
    /// `on<type>` property assignment.
    Property,
}

/// What the simulated host supports.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCapabilities {
    pub standard_listeners: bool,
    pub legacy_listeners: bool,
    pub property_handlers: bool,
    /// Native CSS transitions with a completion event.
    pub native_transitions: bool,
    pub opacity: OpacitySupport,
    /// Touch events are delivered alongside mouse events.
    pub touch: bool,
}

impl HostCapabilities {
    /// A current browser with native transitions.
    pub fn modern() -> Self {
        Self {
            standard_listeners: true,
            legacy_listeners: false,
            property_handlers: true,
            native_transitions: true,
            opacity: OpacitySupport::Standard,
            touch: false,
        }
    }

    /// A modern host without native transitions, so every tween is stepped.
    pub fn stepped() -> Self {
        Self {
            native_transitions: false,
            ..Self::modern()
        }
    }

    /// An old host with `attachEvent` and filter opacity.
    pub fn legacy() -> Self {
        Self {
            standard_listeners: false,
            legacy_listeners: true,
            property_handlers: true,
            native_transitions: false,
            opacity: OpacitySupport::Filter,
            touch: false,
        }
    }

    /// A host that only supports `on<type>` properties.
    pub fn property_only() -> Self {
        Self {
            standard_listeners: false,
            legacy_listeners: false,
            property_handlers: true,
            native_transitions: false,
            opacity: OpacitySupport::None,
            touch: false,
        }
    }

    /// Enable touch events.
    pub fn with_touch(mut self) -> Self {
        self.touch = true;
        self
    }

    /// The preferred listener mechanism, if any is available.
    pub fn listener_api(&self) -> Option<ListenerApi> {
        if self.standard_listeners {
            Some(ListenerApi::Standard)
        } else if self.legacy_listeners {
            Some(ListenerApi::Legacy)
        } else if self.property_handlers {
            Some(ListenerApi::Property)
        } else {
            None
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::modern()
    }
}

/// An element node.
#[derive(Debug)]
pub struct Element {
    /// Unique ID for this node.
    pub id: NodeId,
    tag_name: String,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Element>>>,
    children: RefCell<Vec<Rc<Element>>>,
    attributes: RefCell<HashMap<String, String>>,
    classes: RefCell<Vec<String>>,
    /// Inline style declarations.
    style: RefCell<HashMap<String, String>>,
    /// Cascaded values that apply when no inline value is set.
    base_style: RefCell<HashMap<String, String>>,
    geometry: Cell<Rect>,
    /// Event target mixin for event handling.
    pub event_target: EventTarget,
}

impl Element {
    fn new(id: NodeId, tag_name: &str) -> Rc<Self> {
        Rc::new(Self {
            id,
            tag_name: tag_name.to_string(),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(HashMap::new()),
            classes: RefCell::new(Vec::new()),
            style: RefCell::new(HashMap::new()),
            base_style: RefCell::new(HashMap::new()),
            geometry: Cell::new(Rect::default()),
            event_target: EventTarget::new(),
        })
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Get the parent node.
    pub fn parent(&self) -> Option<Rc<Element>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Element>> {
        self.children.borrow().clone()
    }

    /// Append a child node, detaching it from any previous parent.
    pub fn append_child(self: &Rc<Self>, child: Rc<Element>) {
        if let Some(old_parent) = child.parent() {
            old_parent.children.borrow_mut().retain(|c| c.id != child.id);
        }
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child);
    }

    /// The element offsets are measured against. `body` and the document root have none.
    pub fn offset_parent(&self) -> Option<Rc<Element>> {
        match self.tag_name.as_str() {
            "body" | "#document" => None,
            _ => self.parent(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.classes.borrow_mut().push(class.to_string());
        }
    }

    pub fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }

    /// Flip a class; returns whether it is now present.
    pub fn toggle_class(&self, class: &str) -> bool {
        if self.has_class(class) {
            self.remove_class(class);
            false
        } else {
            self.add_class(class);
            true
        }
    }

    /// Space-separated class list.
    pub fn class_name(&self) -> String {
        self.classes.borrow().join(" ")
    }

    /// Inline style value.
    pub fn style(&self, property: &str) -> Option<String> {
        self.style
            .borrow()
            .get(property)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    /// Set an inline style value. Empty strings clear the declaration.
    ///
    /// Pixel values of `left`, `top`, `width` and `height` also move the offset box.
    pub fn set_style(&self, property: &str, value: &str) {
        trace!(node = self.id.raw(), property, value, "set style");
        if value.is_empty() {
            self.style.borrow_mut().remove(property);
        } else {
            self.style
                .borrow_mut()
                .insert(property.to_string(), value.to_string());
        }

        if let Some(Length::Px(n)) = parse_length(value) {
            let mut rect = self.geometry.get();
            match property {
                "left" => rect.left = n,
                "top" => rect.top = n,
                "width" => rect.width = n,
                "height" => rect.height = n,
                _ => return,
            }
            self.geometry.set(rect);
        }
    }

    /// Cascaded (non-inline) style value.
    pub fn base_style(&self, property: &str) -> Option<String> {
        self.base_style.borrow().get(property).cloned()
    }

    pub fn set_base_style(&self, property: &str, value: &str) {
        self.base_style
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }

    /// Effective value: inline first, then cascaded.
    pub fn resolved_style(&self, property: &str) -> Option<String> {
        self.style(property).or_else(|| self.base_style(property))
    }

    /// Whether `position` resolves to `absolute` or `relative`.
    pub fn is_positioned(&self) -> bool {
        matches!(
            self.resolved_style("position").as_deref(),
            Some("absolute") | Some("relative")
        )
    }

    pub fn geometry(&self) -> Rect {
        self.geometry.get()
    }

    /// Place the element without touching its styles.
    pub fn set_geometry(&self, rect: Rect) {
        self.geometry.set(rect);
    }

    pub fn offset_left(&self) -> f64 {
        self.geometry.get().left
    }

    pub fn offset_top(&self) -> f64 {
        self.geometry.get().top
    }

    pub fn offset_width(&self) -> f64 {
        self.geometry.get().width
    }

    pub fn offset_height(&self) -> f64 {
        self.geometry.get().height
    }
}

/// A document: the node arena, scroll position and host capabilities.
///
/// Every created element stays in the arena, attached or not, until
/// [`Document::remove`] frees it. IDs are never reused.
#[derive(Debug)]
pub struct Document {
    nodes: RefCell<Vec<Option<Rc<Element>>>>,
    root: Rc<Element>,
    body: Rc<Element>,
    scroll: Cell<Point>,
    capabilities: HostCapabilities,
}

impl Document {
    /// Create a document containing an empty `body`.
    pub fn new(capabilities: HostCapabilities) -> Rc<Self> {
        let root = Element::new(NodeId::new(0), "#document");
        let body = Element::new(NodeId::new(1), "body");
        root.append_child(body.clone());

        Rc::new(Self {
            nodes: RefCell::new(vec![Some(root.clone()), Some(body.clone())]),
            root,
            body,
            scroll: Cell::new(Point::default()),
            capabilities,
        })
    }

    pub fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    /// The document node. Listeners installed here see every bubbling event.
    pub fn root(&self) -> Rc<Element> {
        self.root.clone()
    }

    pub fn body(&self) -> Rc<Element> {
        self.body.clone()
    }

    /// Create a detached element.
    pub fn create_element(&self, tag_name: &str) -> Rc<Element> {
        let mut nodes = self.nodes.borrow_mut();
        let element = Element::new(NodeId::new(nodes.len()), tag_name);
        nodes.push(Some(element.clone()));
        element
    }

    /// Detach `element` from its parent and drop it and its subtree from the arena.
    ///
    /// Listeners the registry recorded on those nodes are not touched; call
    /// `EventRegistry::detach_all(Some(..))` first if there are any.
    pub fn remove(&self, element: &Rc<Element>) -> Result<(), DomError> {
        if element.id == self.root.id || element.id == self.body.id {
            return Err(DomError::InvalidOperation(format!(
                "node {} cannot be removed",
                element.id.raw()
            )));
        }
        if let Some(parent) = element.parent() {
            parent.children.borrow_mut().retain(|c| c.id != element.id);
        }
        *element.parent.borrow_mut() = None;

        let mut nodes = self.nodes.borrow_mut();
        let mut pending = vec![element.clone()];
        while let Some(node) = pending.pop() {
            pending.extend(node.children());
            if let Some(slot) = nodes.get_mut(node.id.raw()) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Number of elements still held by the arena, including root and body.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().iter().flatten().count()
    }

    /// Look up a node by ID.
    pub fn get(&self, id: NodeId) -> Option<Rc<Element>> {
        self.nodes.borrow().get(id.raw()).cloned().flatten()
    }

    /// Look up a node by ID, failing if it does not exist.
    pub fn element(&self, id: NodeId) -> Result<Rc<Element>, DomError> {
        self.get(id).ok_or(DomError::NodeNotFound(id))
    }

    /// Find the first element carrying an `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Element>> {
        self.nodes
            .borrow()
            .iter()
            .flatten()
            .find(|n| n.get_attribute("id").as_deref() == Some(id))
            .cloned()
    }

    /// Append `child` under `parent`, refusing to create a cycle.
    pub fn append_child(&self, parent: &Rc<Element>, child: Rc<Element>) -> Result<(), DomError> {
        if parent.id == child.id || is_child_of(parent, &child, self) {
            return Err(DomError::InvalidOperation(format!(
                "node {} cannot contain its own ancestor",
                parent.id.raw()
            )));
        }
        parent.append_child(child);
        Ok(())
    }

    /// Page scroll offsets.
    pub fn scroll(&self) -> Point {
        self.scroll.get()
    }

    pub fn set_scroll(&self, scroll: Point) {
        self.scroll.set(scroll);
    }

    /// Dispatch an event at `target`, walking from the document root down and back.
    ///
    /// Returns true if the default action was not prevented.
    pub fn dispatch(&self, target: &Rc<Element>, event: &DomEvent) -> bool {
        let mut ancestors = Vec::new();
        let mut current = target.parent();
        while let Some(node) = current {
            current = node.parent();
            ancestors.push(node);
        }
        ancestors.reverse();

        trace!(
            event = %event.event().event_type,
            target = target.id.raw(),
            depth = ancestors.len(),
            "dispatch"
        );
        EventDispatcher::dispatch(event, target, &ancestors)
    }
}

/// Whether `ancestor` is `child` or one of its ancestors.
///
/// The walk stops at `body`, so nothing above the body counts as an ancestor.
pub fn is_child_of(child: &Rc<Element>, ancestor: &Rc<Element>, document: &Document) -> bool {
    let body = document.body();
    let mut current = Some(child.clone());
    while let Some(node) = current {
        if node.id == ancestor.id {
            return true;
        }
        if node.id == body.id {
            return false;
        }
        current = node.parent();
    }
    false
}

/// Sum offsets up the offset-parent chain.
///
/// With `relative`, stop before the first positioned ancestor.
pub fn total_offset(element: &Rc<Element>, relative: bool) -> Point {
    let mut total = Point::new(element.offset_left(), element.offset_top());
    let mut current = element.offset_parent();
    while let Some(node) = current {
        if relative && node.is_positioned() {
            break;
        }
        total.x += node.offset_left();
        total.y += node.offset_top();
        current = node.offset_parent();
    }
    total
}

/// Page scroll offsets of a document.
pub fn find_scroll(document: &Document) -> Point {
    document.scroll()
}

/// The element an event was dispatched at.
pub fn event_target(event: &DomEvent, document: &Document) -> Option<Rc<Element>> {
    event.event().target().and_then(|id| document.get(id))
}
