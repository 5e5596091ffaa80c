//! Document seam
//!
//! The controller never touches a concrete browser API. Everything it needs
//! from the page's element tree goes through the [`Document`] trait, which
//! addresses elements by opaque [`ElementId`] handles. [`MemoryDocument`] is
//! the in-crate implementation used by tests and headless drivers.

pub mod markup;
pub mod memory;
pub mod query;

pub use memory::MemoryDocument;
pub use query::DocumentExt;

use thiserror::Error;

/// Opaque handle to an element owned by a [`Document`]
///
/// Handles are never reused within one document, so a handle to a removed
/// element stays dead instead of silently pointing at newer content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A rendered box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the box has no area worth rendering (at most 1px either way)
    pub fn is_negligible(&self) -> bool {
        self.width <= 1.0 || self.height <= 1.0
    }

    /// True when no part of this box lies inside `viewport`
    pub fn is_outside(&self, viewport: &Rect) -> bool {
        self.x + self.width <= viewport.x
            || self.y + self.height <= viewport.y
            || self.x >= viewport.x + viewport.width
            || self.y >= viewport.y + viewport.height
    }
}

/// Layout information for one element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    /// Box of the element (zero when not displayed)
    pub rect: Rect,

    /// Whether the element participates in layout at all
    pub displayed: bool,
}

/// Errors raised by document operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    #[error("element {0} is not attached to the document")]
    Detached(ElementId),

    #[error("cannot move {element} inside its own subtree")]
    Cycle { element: ElementId },

    #[error("malformed markup: {0}")]
    Markup(String),
}

/// Operations the controller needs from a live element tree
///
/// Live state (`value`, `checked`) is kept apart from attributes the way a
/// browser keeps properties apart from markup.
pub trait Document {
    /// The document body; every managed element lives below it
    fn root(&self) -> ElementId;

    /// Look an element up by its `id` attribute
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// Whether the handle still points at an attached element
    fn contains(&self, el: ElementId) -> bool;

    /// Lower-cased tag name
    fn tag_name(&self, el: ElementId) -> Option<&str>;

    fn attribute(&self, el: ElementId, name: &str) -> Option<&str>;

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str)
    -> Result<(), DocumentError>;

    fn remove_attribute(&mut self, el: ElementId, name: &str) -> Result<(), DocumentError>;

    fn parent(&self, el: ElementId) -> Option<ElementId>;

    fn children(&self, el: ElementId) -> Vec<ElementId>;

    /// Current value of a form control (`None` for non-controls)
    fn value(&self, el: ElementId) -> Option<&str>;

    fn set_value(&mut self, el: ElementId, value: &str) -> Result<(), DocumentError>;

    fn is_checked(&self, el: ElementId) -> bool;

    fn set_checked(&mut self, el: ElementId, checked: bool) -> Result<(), DocumentError>;

    /// Text content of the element and its descendants
    fn text(&self, el: ElementId) -> String;

    /// Replace all children with a single run of text
    fn set_text(&mut self, el: ElementId, text: &str) -> Result<(), DocumentError>;

    fn layout(&self, el: ElementId) -> Layout;

    fn viewport(&self) -> Rect;

    fn focus(&mut self, el: ElementId) -> Result<(), DocumentError>;

    fn focused(&self) -> Option<ElementId>;

    /// Parse `markup` and append the resulting top-level elements to `parent`
    fn insert_markup(
        &mut self,
        parent: ElementId,
        markup: &str,
    ) -> Result<Vec<ElementId>, DocumentError>;

    /// Create an empty element under `parent`, before `before` when given
    fn create_element(
        &mut self,
        tag: &str,
        parent: ElementId,
        before: Option<ElementId>,
    ) -> Result<ElementId, DocumentError>;

    /// Re-parent an existing element
    fn move_element(
        &mut self,
        el: ElementId,
        parent: ElementId,
        before: Option<ElementId>,
    ) -> Result<(), DocumentError>;

    /// Detach an element and its whole subtree
    fn remove_element(&mut self, el: ElementId) -> Result<(), DocumentError>;

    /// Remove every child of `el`
    fn clear_children(&mut self, el: ElementId) -> Result<(), DocumentError> {
        for child in self.children(el) {
            self.remove_element(child)?;
        }
        Ok(())
    }
}
