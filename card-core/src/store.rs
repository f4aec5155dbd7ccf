//! Authoritative document storage.
//!
//! [`SceneStore`] is a cheap cloneable handle: the interaction controller,
//! the template loader and an in-flight payload generation all hold clones
//! that point at the same document. Every operation is synchronous and
//! atomic except [`SceneStore::set_payload`], which awaits the external QR
//! generator without holding the lock, so the document stays editable while
//! a bitmap is being produced.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::PayloadOrdering;
use crate::element::{Element, ElementId, ElementPatch, ElementType, IdAllocator};
use crate::scene::{Document, QrPayload};
use crate::service::QrGenerator;
use crate::template::Template;
use crate::{CardError, CardResult};

/// What happened to a payload update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// Text and bitmap were committed and QR elements were synced.
    Applied,
    /// The bitmap arrived after a newer request was made and was dropped.
    Superseded,
    /// The generator failed; the document is unchanged.
    Failed,
}

#[derive(Debug)]
struct StoreState {
    document: Document,
    revision: u64,
    payload_requests: u64,
    payloads_in_flight: usize,
    ids: IdAllocator,
}

impl StoreState {
    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Counts a running `set_payload` until it settles or is dropped.
struct InFlight<'a>(&'a SceneStore);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.0.write();
        state.payloads_in_flight = state.payloads_in_flight.saturating_sub(1);
    }
}

/// Shared handle to the card document.
///
/// # Example
///
/// ```
/// use card_core::{Document, Element, ElementKind, ElementPatch, QrProps, SceneStore};
///
/// let store = SceneStore::new(Document::new(400, 240));
/// let qr = Element::new("qr-1", 10.0, 10.0, ElementKind::Qr(QrProps {
///     size: 120,
///     qr_data: String::new(),
/// }));
/// store.add_element(qr).unwrap();
/// store.update_element(&"qr-1".into(), &ElementPatch::position(40.0, 20.0));
/// assert_eq!(store.element(&"qr-1".into()).unwrap().position(), (40.0, 20.0));
/// ```
#[derive(Debug, Clone)]
pub struct SceneStore {
    state: Arc<RwLock<StoreState>>,
    ordering: PayloadOrdering,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl SceneStore {
    /// Create a store owning `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                document,
                revision: 0,
                payload_requests: 0,
                payloads_in_flight: 0,
                ids: IdAllocator::new(),
            })),
            ordering: PayloadOrdering::default(),
        }
    }

    /// Set the ordering policy for overlapping payload updates.
    #[must_use]
    pub fn with_payload_ordering(mut self, ordering: PayloadOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// A copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.read().document.clone()
    }

    /// Run a closure against the current document without cloning it.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.read().document)
    }

    /// Counter bumped by every mutation that changed the document.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// A copy of the element with this id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<Element> {
        self.read().document.get(id).cloned()
    }

    /// The selected element id.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.read().document.selected().cloned()
    }

    /// Canvas `(width, height)`.
    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        let state = self.read();
        (state.document.width, state.document.height)
    }

    /// The committed QR payload.
    #[must_use]
    pub fn payload(&self) -> QrPayload {
        self.read().document.payload.clone()
    }

    /// Whether a payload update is waiting on the generator.
    #[must_use]
    pub fn payload_pending(&self) -> bool {
        self.read().payloads_in_flight > 0
    }

    /// Allocate a fresh id for a new element of `kind`.
    #[must_use]
    pub fn next_id(&self, kind: ElementType) -> ElementId {
        let mut state = self.write();
        let StoreState { document, ids, .. } = &mut *state;
        ids.allocate(kind, |candidate| document.contains(candidate))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append an element on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::DuplicateElement`] if the id is already present;
    /// the document is left unchanged.
    pub fn add_element(&self, element: Element) -> CardResult<()> {
        let mut state = self.write();
        if state.document.contains(&element.id) {
            tracing::warn!(id = %element.id, "Rejected element with duplicate id");
            return Err(CardError::DuplicateElement(element.id));
        }
        tracing::debug!(id = %element.id, kind = %element.element_type(), "Added element");
        state.document.push(element);
        state.touch();
        Ok(())
    }

    /// Merge `patch` into the element with this id. No-op if it is missing.
    pub fn update_element(&self, id: &ElementId, patch: &ElementPatch) {
        let mut state = self.write();
        let changed = match state.document.get_mut(id) {
            Some(element) => element.apply(patch),
            None => {
                tracing::trace!(%id, "Update ignored, element not found");
                false
            }
        };
        if changed {
            state.touch();
        }
    }

    /// Remove the element with this id. No-op if it is missing.
    ///
    /// Clears the selection when it pointed at the removed element.
    pub fn delete_element(&self, id: &ElementId) {
        let mut state = self.write();
        if state.document.remove(id).is_some() {
            tracing::debug!(%id, "Deleted element");
            state.touch();
        } else {
            tracing::trace!(%id, "Delete ignored, element not found");
        }
    }

    /// Set the selection. Existence is not checked.
    pub fn select_element(&self, id: Option<ElementId>) {
        let mut state = self.write();
        if state.document.selected() != id.as_ref() {
            state.document.set_selected(id);
            state.touch();
        }
    }

    /// Replace the background.
    pub fn set_background(&self, background: impl Into<String>) {
        let background = background.into();
        let mut state = self.write();
        if state.document.background != background {
            state.document.background = background;
            state.touch();
        }
    }

    /// Replace elements, background and canvas size with the template's.
    ///
    /// The selection is cleared in the same step so it can never point at an
    /// element of the new template that happens to reuse an old id. The
    /// payload is left alone.
    pub fn load_template(&self, template: &Template) {
        let mut state = self.write();
        let document = &mut state.document;
        document.replace_elements(template.elements.clone());
        document.background.clone_from(&template.background);
        document.width = template.width;
        document.height = template.height;
        state.touch();
        tracing::info!(template = %template.id, "Loaded template");
    }

    /// Remove every element and clear the selection.
    pub fn clear(&self) {
        let mut state = self.write();
        state.document.clear_elements();
        state.touch();
    }

    /// Generate a bitmap for `text` and commit text and bitmap together.
    ///
    /// On success every QR element's payload copy is rewritten to `text`.
    /// On failure the document is untouched and the error is logged. With
    /// [`PayloadOrdering::LatestRequest`] a result whose request has been
    /// overtaken by a newer call is dropped.
    pub async fn set_payload(
        &self,
        text: impl Into<String>,
        generator: &dyn QrGenerator,
    ) -> PayloadOutcome {
        let text = text.into();
        let ticket = {
            let mut state = self.write();
            state.payload_requests += 1;
            state.payloads_in_flight += 1;
            state.payload_requests
        };
        let _in_flight = InFlight(self);

        let bitmap = match generator.generate(&text).await {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::error!(error = %e, "Failed to update QR payload");
                return PayloadOutcome::Failed;
            }
        };

        let mut state = self.write();
        if self.ordering == PayloadOrdering::LatestRequest && ticket != state.payload_requests {
            tracing::debug!(
                ticket,
                latest = state.payload_requests,
                "Dropped stale QR payload"
            );
            return PayloadOutcome::Superseded;
        }

        state.document.commit_payload(QrPayload {
            text,
            bitmap: Some(bitmap),
        });
        state.touch();
        PayloadOutcome::Applied
    }
}
