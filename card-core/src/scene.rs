//! The card document: ordered elements, selection, background and payload.

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId, ElementKind};

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: u32 = 400;

/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: u32 = 240;

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Reference to a rendered image (data URI or URL). Never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The QR payload shared by every QR element.
///
/// `text` and `bitmap` only ever change together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Encoded text.
    pub text: String,
    /// Rendered bitmap for `text`; `None` until a generation succeeds.
    pub bitmap: Option<ImageRef>,
}

/// A card document.
///
/// Element order is z-order: later elements are drawn on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    elements: Vec<Element>,
    selected: Option<ElementId>,
    /// Solid color or CSS gradient descriptor.
    pub background: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Shared QR payload.
    pub payload: QrPayload,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Document {
    /// Create an empty document with a white background.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            elements: Vec::new(),
            selected: None,
            background: DEFAULT_BACKGROUND.to_string(),
            width,
            height,
            payload: QrPayload::default(),
        }
    }

    /// All elements, bottom to top.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == *id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == *id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.get(id).is_some()
    }

    /// The selected element id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    /// The selected element, if the selection resolves.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element on top. Does not check id uniqueness.
    pub(crate) fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Remove an element, clearing the selection if it pointed at it.
    pub(crate) fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == *id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(index))
    }

    /// Replace the selection.
    pub(crate) fn set_selected(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    /// Replace all elements and clear the selection.
    pub(crate) fn replace_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        self.selected = None;
    }

    /// Remove every element and clear the selection.
    pub(crate) fn clear_elements(&mut self) {
        self.elements.clear();
        self.selected = None;
    }

    /// Commit a payload and copy its text into every QR element.
    pub(crate) fn commit_payload(&mut self, payload: QrPayload) {
        for element in &mut self.elements {
            if let ElementKind::Qr(qr) = &mut element.kind {
                qr.qr_data.clone_from(&payload.text);
            }
        }
        self.payload = payload;
    }

    /// Whether the selection references an existing element (or is empty).
    #[must_use]
    pub fn selection_is_consistent(&self) -> bool {
        self.selected.as_ref().is_none_or(|id| self.contains(id))
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::CardResult<String> {
        serde_json::to_string(self).map_err(crate::CardError::Serialization)
    }
}
