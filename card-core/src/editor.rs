//! The editor facade.
//!
//! [`CardEditor`] wires a [`SceneStore`], an [`InteractionController`] and a
//! [`TemplateCatalog`] together and exposes the toolbar and panel actions a
//! host UI needs: add, duplicate and delete elements, switch templates,
//! submit the QR payload, edit properties, export and print.

use std::rc::Rc;

use crate::config::EditorConfig;
use crate::element::{
    Element, ElementId, ElementKind, ElementType, FontWeight, QrProps, ShapeProps, TextProps,
};
use crate::event::InputEvent;
use crate::interaction::{InteractionController, ListenerHost};
use crate::projection::{project, RenderTree};
use crate::property::{apply_property_edit, PropertyField};
use crate::scene::Document;
use crate::service::{Exporter, Printer, QrGenerator};
use crate::store::{PayloadOutcome, SceneStore};
use crate::template::{TemplateCatalog, TemplateLoader};
use crate::{CardError, CardResult};

/// Default text of a newly added text element.
pub const DEFAULT_TEXT: &str = "Sample text";

/// Default font family of a newly added text element.
pub const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";

/// Default edge length of a newly added QR element.
pub const DEFAULT_QR_SIZE: i32 = 120;

/// Build the element the toolbar inserts for `kind`.
///
/// Elements are roughly centred on the canvas. QR elements pick up the
/// current payload text.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn default_element(
    id: ElementId,
    kind: ElementType,
    canvas: (u32, u32),
    payload_text: &str,
) -> Element {
    let (cx, cy) = (canvas.0 as f32 / 2.0, canvas.1 as f32 / 2.0);
    let shape = |width, height, color: &str| ShapeProps {
        width,
        height,
        color: color.to_string(),
        border_width: Some(0),
        border_color: Some("#000000".to_string()),
    };

    let (kind, x, y) = match kind {
        ElementType::Text => (
            ElementKind::Text(TextProps {
                content: DEFAULT_TEXT.to_string(),
                font_size: 16,
                font_weight: FontWeight::Normal,
                color: "#000000".to_string(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
            }),
            cx - 50.0,
            cy - 30.0,
        ),
        ElementType::Rectangle => (
            ElementKind::Rectangle(shape(100, 60, "#3b82f6")),
            cx - 50.0,
            cy - 30.0,
        ),
        ElementType::Circle => (
            ElementKind::Circle(shape(80, 80, "#10b981")),
            cx - 50.0,
            cy - 30.0,
        ),
        ElementType::Triangle => (
            ElementKind::Triangle(shape(60, 60, "#f59e0b")),
            cx - 50.0,
            cy - 30.0,
        ),
        ElementType::Qr => (
            ElementKind::Qr(QrProps {
                size: DEFAULT_QR_SIZE,
                qr_data: payload_text.to_string(),
            }),
            cx - 60.0,
            cy - 60.0,
        ),
    };
    Element::new(id, x, y, kind)
}

/// Hand `tree` to `exporter` and log the outcome.
pub(crate) async fn export_tree(
    exporter: &dyn Exporter,
    tree: &RenderTree,
    filename: &str,
) -> CardResult<()> {
    let result = exporter.export(tree, filename).await;
    match &result {
        Ok(()) => tracing::info!(filename, "Exported card"),
        Err(e) => tracing::error!(error = %e, filename, "Failed to export card"),
    }
    result
}

/// A card editor session.
pub struct CardEditor {
    config: EditorConfig,
    catalog: TemplateCatalog,
    store: SceneStore,
    controller: InteractionController,
}

impl std::fmt::Debug for CardEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardEditor")
            .field("config", &self.config)
            .field("templates", &self.catalog.len())
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl CardEditor {
    /// Start a session on the catalog's default template with an empty
    /// payload.
    #[must_use]
    pub fn new(config: EditorConfig, catalog: TemplateCatalog) -> Self {
        let store = SceneStore::new(Document::default())
            .with_payload_ordering(config.payload_ordering);
        store.load_template(catalog.default_template());
        let controller = InteractionController::new(store.clone(), &config);
        Self {
            config,
            catalog,
            store,
            controller,
        }
    }

    /// Route listener attach/detach requests to `host`.
    #[must_use]
    pub fn with_listener_host(mut self, host: Rc<dyn ListenerHost>) -> Self {
        self.controller = self.controller.with_listener_host(host);
        self
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// The interaction controller.
    #[must_use]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The template catalog.
    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Feed an input event to the interaction controller.
    pub fn handle(&mut self, event: &InputEvent) {
        self.controller.handle(event);
    }

    /// Commit a coalesced drag move, if any.
    pub fn animation_frame(&mut self) {
        self.controller.animation_frame();
    }

    /// Abandon any drag or text edit in progress.
    pub fn reset_interaction(&mut self) {
        self.controller.reset();
    }

    /// Insert a default element of `kind`. The new element is not selected.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::DuplicateElement`] if the allocated id collides,
    /// which only happens when ids are added concurrently from elsewhere.
    pub fn add_element(&self, kind: ElementType) -> CardResult<ElementId> {
        let id = self.store.next_id(kind);
        let element = default_element(
            id.clone(),
            kind,
            self.store.canvas_size(),
            &self.store.payload().text,
        );
        self.store.add_element(element)?;
        Ok(id)
    }

    /// Copy an element under a fresh id, offset down and right, on top of
    /// the stack. Returns the new id, or `None` if `id` is unknown.
    pub fn duplicate_element(&self, id: &ElementId) -> Option<ElementId> {
        let source = self.store.element(id)?;
        let new_id = self.store.next_id(source.element_type());
        let offset = self.config.duplicate_offset;
        let copy = Element::new(
            new_id.clone(),
            source.x + offset,
            source.y + offset,
            source.kind,
        );
        match self.store.add_element(copy) {
            Ok(()) => Some(new_id),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to duplicate element");
                None
            }
        }
    }

    /// Delete the selected element, if any.
    pub fn delete_selected(&self) {
        if let Some(id) = self.store.selected() {
            self.store.delete_element(&id);
        }
    }

    /// Remove every element. Any drag or text edit in progress is abandoned
    /// first; background, canvas size and payload are kept.
    pub fn clear(&mut self) {
        self.reset_interaction();
        self.store.clear();
        tracing::info!("Cleared card");
    }

    /// Replace the background with a solid color or gradient.
    pub fn set_background(&self, background: impl Into<String>) {
        self.store.set_background(background);
    }

    /// Apply a raw property panel edit. See [`apply_property_edit`].
    pub fn edit_property(&self, id: &ElementId, field: PropertyField, raw: &str) -> bool {
        apply_property_edit(&self.store, id, field, raw)
    }

    /// Switch to the template with this id and regenerate the QR bitmap.
    ///
    /// Any drag or text edit in progress is abandoned first.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::TemplateNotFound`] if the catalog has no such
    /// template; the document is left unchanged.
    pub async fn select_template(
        &mut self,
        id: &str,
        generator: &dyn QrGenerator,
    ) -> CardResult<Option<PayloadOutcome>> {
        let template = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| CardError::TemplateNotFound(id.to_string()))?;
        self.reset_interaction();
        Ok(TemplateLoader::new(self.store.clone())
            .apply(&template, generator)
            .await)
    }

    /// Submit the QR payload from the input box.
    ///
    /// Surrounding whitespace is trimmed; empty input is ignored.
    pub async fn submit_payload(
        &self,
        raw: &str,
        generator: &dyn QrGenerator,
    ) -> Option<PayloadOutcome> {
        let text = raw.trim();
        if text.is_empty() {
            tracing::debug!("Ignored empty QR payload");
            return None;
        }
        Some(self.store.set_payload(text, generator).await)
    }

    /// The current visual tree.
    #[must_use]
    pub fn render(&self) -> RenderTree {
        let view = self.controller.view();
        self.store.with_document(|document| project(document, &view))
    }

    /// Export the current card under `filename`.
    ///
    /// # Errors
    ///
    /// Returns the exporter's error after logging it.
    pub async fn export(&self, exporter: &dyn Exporter, filename: &str) -> CardResult<()> {
        export_tree(exporter, &self.render(), filename).await
    }

    /// Hand the card to the host print flow.
    ///
    /// # Errors
    ///
    /// Returns the printer's error after logging it.
    pub fn print(&self, printer: &dyn Printer) -> CardResult<()> {
        printer.print().inspect_err(|e| {
            tracing::error!(error = %e, "Failed to print card");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputEvent;
    use crate::interaction::InteractionState;
    use crate::scene::ImageRef;
    use async_trait::async_trait;
    use std::cell::RefCell;

    struct EchoGenerator;

    #[async_trait(?Send)]
    impl QrGenerator for EchoGenerator {
        async fn generate(&self, text: &str) -> CardResult<ImageRef> {
            Ok(ImageRef::new(format!("qr:{text}")))
        }
    }

    #[derive(Default)]
    struct RecordingExporter {
        calls: RefCell<Vec<(String, usize)>>,
    }

    #[async_trait(?Send)]
    impl Exporter for RecordingExporter {
        async fn export(&self, tree: &RenderTree, filename: &str) -> CardResult<()> {
            self.calls
                .borrow_mut()
                .push((filename.to_string(), tree.nodes.len()));
            Ok(())
        }
    }

    struct BrokenPrinter;

    impl Printer for BrokenPrinter {
        fn print(&self) -> CardResult<()> {
            Err(CardError::Print("no printer".to_string()))
        }
    }

    fn editor() -> CardEditor {
        CardEditor::new(EditorConfig::default(), TemplateCatalog::builtin())
    }

    #[test]
    fn test_starts_on_default_template() {
        let editor = editor();
        let doc = editor.store().snapshot();
        assert_eq!(
            doc.elements(),
            editor.catalog().default_template().elements.as_slice()
        );
        assert!(doc.payload.text.is_empty());
        assert!(doc.selected().is_none());
    }

    #[test]
    fn test_add_element_defaults() {
        let editor = editor();
        let id = editor.add_element(ElementType::Rectangle).expect("add");
        let element = editor.store().element(&id).expect("added");

        assert!(id.as_str().starts_with("rectangle-"));
        assert_eq!(element.position(), (150.0, 90.0));
        match element.kind {
            ElementKind::Rectangle(shape) => {
                assert_eq!((shape.width, shape.height), (100, 60));
                assert_eq!(shape.color, "#3b82f6");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        assert!(editor.store().selected().is_none());
    }

    #[tokio::test]
    async fn test_added_qr_uses_current_payload() {
        let editor = editor();
        editor.submit_payload("  hello  ", &EchoGenerator).await;
        let id = editor.add_element(ElementType::Qr).expect("add");
        let element = editor.store().element(&id).expect("added");

        assert_eq!(element.position(), (140.0, 60.0));
        match element.kind {
            ElementKind::Qr(qr) => assert_eq!(qr.qr_data, "hello"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_is_ignored() {
        let editor = editor();
        let revision = editor.store().revision();
        assert!(editor.submit_payload("   ", &EchoGenerator).await.is_none());
        assert_eq!(editor.store().revision(), revision);
    }

    #[test]
    fn test_duplicate_offsets_copy() {
        let editor = editor();
        let copy = editor
            .duplicate_element(&"qr-main".into())
            .expect("duplicated");
        let element = editor.store().element(&copy).expect("copy exists");

        assert_ne!(copy.as_str(), "qr-main");
        assert_eq!(element.position(), (270.0, 80.0));
        assert_eq!(
            editor.store().snapshot().elements().last().map(|e| &e.id),
            Some(&copy)
        );
        assert!(editor.duplicate_element(&"ghost".into()).is_none());
    }

    #[test]
    fn test_delete_selected() {
        let mut editor = editor();
        editor.handle(&InputEvent::click_on("qr-main"));
        editor.delete_selected();

        assert!(editor.store().element(&"qr-main".into()).is_none());
        assert!(editor.store().selected().is_none());
        editor.delete_selected();
    }

    #[test]
    fn test_clear_during_text_edit() {
        let mut editor = editor();
        editor.set_background("#10b981");
        editor.handle(&InputEvent::double_click_on("text-title"));
        assert_eq!(
            editor.controller().state(),
            InteractionState::EditingText("text-title".into())
        );

        editor.clear();

        assert!(editor.controller().is_idle());
        let doc = editor.store().snapshot();
        assert!(doc.is_empty());
        assert!(doc.selected().is_none());
        assert_eq!(doc.background, "#10b981");

        // Typing after the clear must not resurrect the edited element.
        editor.handle(&InputEvent::TextInput {
            value: "late".to_string(),
        });
        assert!(editor.store().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_select_template_resets_interaction() {
        let mut editor = editor();
        editor.submit_payload("hello", &EchoGenerator).await;
        editor.handle(&InputEvent::pointer_down_on("qr-main", 260.0, 70.0));
        assert!(matches!(
            editor.controller().state(),
            InteractionState::Dragging(_)
        ));

        let outcome = editor
            .select_template("ocean-gradient", &EchoGenerator)
            .await
            .expect("known template");
        assert_eq!(outcome, Some(PayloadOutcome::Applied));
        assert!(editor.controller().is_idle());

        let doc = editor.store().snapshot();
        assert!(doc.background.starts_with("linear-gradient"));
        match &doc.get(&"qr-main".into()).expect("qr").kind {
            ElementKind::Qr(qr) => assert_eq!(qr.qr_data, "hello"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_template_is_an_error() {
        let mut editor = editor();
        let before = editor.store().snapshot();
        let result = editor.select_template("nope", &EchoGenerator).await;
        assert!(matches!(result, Err(CardError::TemplateNotFound(_))));
        assert_eq!(editor.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_export_receives_current_tree() {
        let editor = editor();
        let exporter = RecordingExporter::default();
        editor
            .export(&exporter, "qr-card-design")
            .await
            .expect("export");
        assert_eq!(
            exporter.calls.borrow().as_slice(),
            [("qr-card-design".to_string(), 3)]
        );
    }

    #[test]
    fn test_print_failure_is_reported() {
        assert!(editor().print(&BrokenPrinter).is_err());
    }
}
