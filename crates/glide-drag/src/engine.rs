//! Binding drags to elements.

use std::cell::RefCell;
use std::rc::Rc;

use glide_common::DragDefaults;
use glide_dom::{
    ComputedStyleInspector, Element, EventRegistry, HandlerRef, Point, StyleInspector,
};
use tracing::debug;

use crate::session::{DragSession, EventNames, Shared};
use crate::{raise_z_index_floor, DragError};

/// Lifecycle callback, run once per gesture.
pub type Callback = Box<dyn FnMut()>;

type DropCallback = Box<dyn Fn(&Rc<Element>)>;

/// An element the dragged element may be released onto.
pub struct DropZone {
    pub element: Rc<Element>,
    on_drop: Option<DropCallback>,
}

impl DropZone {
    pub fn new(element: Rc<Element>) -> Self {
        Self {
            element,
            on_drop: None,
        }
    }

    /// Run `f` with the dragged element when it is released over this zone.
    pub fn on_drop(mut self, f: impl Fn(&Rc<Element>) + 'static) -> Self {
        self.on_drop = Some(Box::new(f));
        self
    }

    pub(crate) fn drop_onto(&self, dragged: &Rc<Element>) {
        if let Some(on_drop) = &self.on_drop {
            on_drop(dragged);
        }
    }
}

impl std::fmt::Debug for DropZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropZone")
            .field("element", &self.element.id)
            .field("on_drop", &self.on_drop.is_some())
            .finish()
    }
}

/// What to drag and how.
pub struct DragOptions {
    pub element: Rc<Element>,
    /// The element that receives the press. Defaults to `element`.
    pub handle: Option<Rc<Element>>,
    /// Keep the element inside its parent.
    pub restrict: bool,
    pub drop_zones: Vec<DropZone>,
    on_start: Option<Callback>,
    on_tween: Option<Callback>,
    on_complete: Option<Callback>,
}

impl DragOptions {
    pub fn new(element: Rc<Element>) -> Self {
        Self {
            element,
            handle: None,
            restrict: false,
            drop_zones: Vec::new(),
            on_start: None,
            on_tween: None,
            on_complete: None,
        }
    }

    pub fn handle(mut self, handle: Rc<Element>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn restrict(mut self) -> Self {
        self.restrict = true;
        self
    }

    pub fn drop_zone(mut self, zone: DropZone) -> Self {
        self.drop_zones.push(zone);
        self
    }

    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called after every move.
    pub fn on_tween(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_tween = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

/// Makes elements draggable within one document.
pub struct DragEngine {
    registry: Rc<EventRegistry>,
    inspector: Box<dyn StyleInspector>,
    defaults: DragDefaults,
}

impl DragEngine {
    pub fn new(registry: Rc<EventRegistry>) -> Self {
        let opacity = registry.document().capabilities().opacity;
        Self {
            registry,
            inspector: Box::new(ComputedStyleInspector::new(opacity)),
            defaults: DragDefaults::default(),
        }
    }

    /// Use configured tolerances and raise the z-index counter to the configured base.
    pub fn with_defaults(registry: Rc<EventRegistry>, defaults: DragDefaults) -> Self {
        raise_z_index_floor(defaults.z_index_base);
        Self {
            defaults,
            ..Self::new(registry)
        }
    }

    /// Replace the style inspector used to read parent borders.
    pub fn with_inspector(mut self, inspector: impl StyleInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn registry(&self) -> &Rc<EventRegistry> {
        &self.registry
    }

    /// Install the press listener on the handle.
    ///
    /// Fails if the element has no parent, since positions are relative to it.
    pub fn bind(&self, options: DragOptions) -> Result<DragBinding, DragError> {
        let element = options.element;
        let parent = element.parent().ok_or(DragError::Detached(element.id))?;
        let handle = options.handle.unwrap_or_else(|| element.clone());

        let border = |side: &str| {
            self.inspector
                .read(&parent, &format!("border-{}-width", side))
                .as_number()
                .unwrap_or(0.0)
        };
        let borders = Point::new(
            border("left") + border("right"),
            border("top") + border("bottom"),
        );

        let names = EventNames::for_host(self.registry.document().capabilities().touch);
        let shared = Rc::new(Shared {
            element: element.clone(),
            restrict: options.restrict,
            borders,
            zones: options.drop_zones,
            tolerance_lead: self.defaults.tolerance_lead,
            tolerance_tail: self.defaults.tolerance_tail,
            names,
            registry: Rc::downgrade(&self.registry),
            session: RefCell::new(None),
            listeners: RefCell::new(None),
            on_start: RefCell::new(options.on_start),
            on_tween: RefCell::new(options.on_tween),
            on_complete: RefCell::new(options.on_complete),
        });

        let press = {
            let shared = shared.clone();
            HandlerRef::new(move |e| shared.press(e))
        };
        let press = self.registry.attach(&handle, names.press, press, false);

        debug!(
            element = element.id.raw(),
            handle = handle.id.raw(),
            restrict = shared.restrict,
            zones = shared.zones.len(),
            "drag bound"
        );

        Ok(DragBinding {
            shared,
            handle,
            press,
            registry: self.registry.clone(),
        })
    }
}

impl std::fmt::Debug for DragEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragEngine")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// A drag installed on an element.
///
/// Dropping the binding leaves the drag working; call [`unbind`](Self::unbind)
/// or tear down the registry to remove it.
pub struct DragBinding {
    shared: Rc<Shared>,
    handle: Rc<Element>,
    press: Option<HandlerRef>,
    registry: Rc<EventRegistry>,
}

impl DragBinding {
    pub fn element(&self) -> &Rc<Element> {
        &self.shared.element
    }

    pub fn handle(&self) -> &Rc<Element> {
        &self.handle
    }

    /// The current or most recent gesture.
    pub fn session(&self) -> Option<DragSession> {
        self.shared.session.borrow().clone()
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.shared.element.has_class(crate::ACTIVE_CLASS)
    }

    /// Remove the press listener and any listeners of a gesture in progress.
    pub fn unbind(self) {
        if let Some(press) = &self.press {
            self.registry
                .detach(&self.handle, self.shared.names.press, press, false);
        }
        self.shared.detach_listeners(&self.registry);
        debug!(element = self.shared.element.id.raw(), "drag unbound");
    }
}

impl std::fmt::Debug for DragBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragBinding")
            .field("element", &self.shared.element.id)
            .field("handle", &self.handle.id)
            .field("session", &self.session())
            .finish()
    }
}
