//! WebAssembly bindings for card-core.
//!
//! The browser host owns the DOM. It forwards input events as JSON, re-renders
//! from [`WasmEditor::render`] whenever [`WasmEditor::revision`] changes and
//! supplies a promise-returning function that produces QR bitmaps.
//!
//! Export goes through [`WasmEditor::export`]: the editor projects the card
//! without selection chrome and hands the render tree JSON to a host
//! function, which rasterizes it (for example with an offscreen canvas) and
//! triggers the download.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::editor::export_tree;
use crate::interaction::{ListenerChannel, ListenerHost};
use crate::{
    CardEditor, CardError, CardResult, EditorConfig, ElementId, ElementType, Exporter,
    ImageRef, InputEvent, PayloadOutcome, Printer, PropertyField, QrGenerator, RenderTree,
    TemplateCatalog, TemplateLoader,
};

/// Initialize the card WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// QR generator backed by a JS function `(text) => Promise<string>`.
#[derive(Clone)]
struct JsQrGenerator {
    generate: Function,
}

#[async_trait(?Send)]
impl QrGenerator for JsQrGenerator {
    async fn generate(&self, text: &str) -> CardResult<ImageRef> {
        let value = self
            .generate
            .call1(&JsValue::NULL, &JsValue::from_str(text))
            .map_err(|e| CardError::Generation(format!("{e:?}")))?;
        let resolved = JsFuture::from(Promise::resolve(&value))
            .await
            .map_err(|e| CardError::Generation(format!("{e:?}")))?;
        resolved
            .as_string()
            .map(ImageRef::new)
            .ok_or_else(|| CardError::Generation("generator did not return a string".into()))
    }
}

/// Exporter backed by a JS function `(treeJson, filename) => Promise<void>`.
struct JsExporter {
    export: Function,
}

#[async_trait(?Send)]
impl Exporter for JsExporter {
    async fn export(&self, tree: &RenderTree, filename: &str) -> CardResult<()> {
        let json = serde_json::to_string(tree)?;
        let value = self
            .export
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(&json),
                &JsValue::from_str(filename),
            )
            .map_err(|e| CardError::Export(format!("{e:?}")))?;
        JsFuture::from(Promise::resolve(&value))
            .await
            .map_err(|e| CardError::Export(format!("{e:?}")))?;
        Ok(())
    }
}

/// Forwards listener attach/detach to a JS callback `(channel, attached)`.
struct JsListenerHost {
    callback: Function,
}

impl JsListenerHost {
    fn notify(&self, channel: ListenerChannel, attached: bool) {
        let name = match channel {
            ListenerChannel::Pointer => "pointer",
            ListenerChannel::Keyboard => "keyboard",
        };
        if let Err(e) = self.callback.call2(
            &JsValue::NULL,
            &JsValue::from_str(name),
            &JsValue::from_bool(attached),
        ) {
            tracing::warn!(error = ?e, channel = name, "Listener callback failed");
        }
    }
}

impl ListenerHost for JsListenerHost {
    fn attach(&self, channel: ListenerChannel) {
        self.notify(channel, true);
    }

    fn detach(&self, channel: ListenerChannel) {
        self.notify(channel, false);
    }
}

/// Opens the browser's print dialog.
struct WindowPrinter;

impl Printer for WindowPrinter {
    fn print(&self) -> CardResult<()> {
        let window = web_sys::window().ok_or_else(|| CardError::Print("no window".into()))?;
        window
            .print()
            .map_err(|e| CardError::Print(format!("{e:?}")))
    }
}

fn outcome_name(outcome: Option<PayloadOutcome>) -> &'static str {
    match outcome {
        Some(PayloadOutcome::Applied) => "applied",
        Some(PayloadOutcome::Superseded) => "superseded",
        Some(PayloadOutcome::Failed) => "failed",
        None => "skipped",
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Card editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    editor: CardEditor,
    generator: JsQrGenerator,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor.
    ///
    /// `generator` is called as `generator(text)` and must return a string
    /// or a promise of one. `config_json` and `templates_json` fall back to
    /// the defaults when absent. `listener_callback`, if given, is called as
    /// `callback(channel, attached)` when global listeners should be added
    /// or removed.
    ///
    /// # Errors
    ///
    /// Returns an error string if the config or template JSON is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(
        generator: Function,
        config_json: Option<String>,
        templates_json: Option<String>,
        listener_callback: Option<Function>,
    ) -> Result<WasmEditor, JsValue> {
        let config = config_json
            .as_deref()
            .map(EditorConfig::from_json)
            .transpose()
            .map_err(to_js_error)?
            .unwrap_or_default();
        let catalog = templates_json
            .as_deref()
            .map(TemplateCatalog::from_json)
            .transpose()
            .map_err(to_js_error)?
            .unwrap_or_default();

        let mut editor = CardEditor::new(config, catalog);
        if let Some(callback) = listener_callback {
            let host: Rc<dyn ListenerHost> = Rc::new(JsListenerHost { callback });
            editor = editor.with_listener_host(host);
        }

        Ok(Self {
            editor,
            generator: JsQrGenerator {
                generate: generator,
            },
        })
    }

    /// Feed one input event, serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event JSON is invalid.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, json: &str) -> Result<(), JsValue> {
        let event: InputEvent = serde_json::from_str(json).map_err(to_js_error)?;
        self.editor.handle(&event);
        Ok(())
    }

    /// Commit a coalesced drag move. Call from `requestAnimationFrame`.
    #[wasm_bindgen(js_name = animationFrame)]
    pub fn animation_frame(&mut self) {
        self.editor.animation_frame();
    }

    /// Document revision; re-render when it changes.
    #[wasm_bindgen]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn revision(&self) -> f64 {
        self.editor.store().revision() as f64
    }

    /// The current render tree as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen]
    pub fn render(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.editor.render()).map_err(to_js_error)
    }

    /// The current document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getDocumentJson)]
    pub fn get_document_json(&self) -> Result<String, JsValue> {
        self.editor.store().snapshot().to_json().map_err(to_js_error)
    }

    /// The template catalog as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = getTemplatesJson)]
    pub fn get_templates_json(&self) -> Result<String, JsValue> {
        let templates: Vec<_> = self.editor.catalog().iter().collect();
        serde_json::to_string(&templates).map_err(to_js_error)
    }

    /// Insert a default element (`text`, `rectangle`, `circle`, `triangle`
    /// or `qr`) and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown kind.
    #[wasm_bindgen(js_name = addElement)]
    pub fn add_element(&self, kind: &str) -> Result<String, JsValue> {
        let kind: ElementType = kind.parse().map_err(to_js_error)?;
        let id = self.editor.add_element(kind).map_err(to_js_error)?;
        Ok(id.to_string())
    }

    /// Duplicate an element; returns the new id, if the source existed.
    #[wasm_bindgen(js_name = duplicateElement)]
    #[must_use]
    pub fn duplicate_element(&self, id: &str) -> Option<String> {
        self.editor
            .duplicate_element(&ElementId::from(id))
            .map(|id| id.to_string())
    }

    /// Delete the selected element.
    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&self) {
        self.editor.delete_selected();
    }

    /// Remove every element, abandoning any drag or text edit.
    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.editor.clear();
    }

    /// Replace the background.
    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&self, background: &str) {
        self.editor.set_background(background);
    }

    /// Apply a raw property panel edit. Returns whether the input parsed.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown field name.
    #[wasm_bindgen(js_name = editProperty)]
    pub fn edit_property(&self, id: &str, field: &str, raw: &str) -> Result<bool, JsValue> {
        let field: PropertyField = field.parse().map_err(to_js_error)?;
        Ok(self.editor.edit_property(&ElementId::from(id), field, raw))
    }

    /// Submit the QR payload. Resolves to `applied`, `superseded`, `failed`
    /// or `skipped`.
    #[wasm_bindgen(js_name = submitPayload)]
    #[must_use]
    pub fn submit_payload(&self, raw: &str) -> Promise {
        let text = raw.trim().to_string();
        let store = self.editor.store().clone();
        let generator = self.generator.clone();
        future_to_promise(async move {
            if text.is_empty() {
                tracing::debug!("Ignored empty QR payload");
                return Ok(JsValue::from_str(outcome_name(None)));
            }
            let outcome = store.set_payload(text, &generator).await;
            Ok(JsValue::from_str(outcome_name(Some(outcome))))
        })
    }

    /// Switch template. The swap happens immediately; the returned promise
    /// resolves once the QR bitmap has been regenerated.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown template id.
    #[wasm_bindgen(js_name = selectTemplate)]
    pub fn select_template(&mut self, id: &str) -> Result<Promise, JsValue> {
        let template = self
            .editor
            .catalog()
            .get(id)
            .cloned()
            .ok_or_else(|| to_js_error(CardError::TemplateNotFound(id.to_string())))?;
        self.editor.reset_interaction();

        let loader = TemplateLoader::new(self.editor.store().clone());
        let generator = self.generator.clone();
        Ok(future_to_promise(async move {
            let outcome = loader.apply(&template, &generator).await;
            Ok(JsValue::from_str(outcome_name(outcome)))
        }))
    }

    /// Export the current card. `exporter` is called as
    /// `exporter(treeJson, filename)` and may return a promise; the returned
    /// promise rejects with the error if it throws or rejects.
    #[wasm_bindgen]
    #[must_use]
    pub fn export(&self, exporter: Function, filename: String) -> Promise {
        let tree = self.editor.render();
        future_to_promise(async move {
            let exporter = JsExporter { export: exporter };
            export_tree(&exporter, &tree, &filename)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(to_js_error)
        })
    }

    /// Open the browser print dialog.
    ///
    /// # Errors
    ///
    /// Returns an error string if the dialog cannot be opened.
    #[wasm_bindgen]
    pub fn print(&self) -> Result<(), JsValue> {
        self.editor.print(&WindowPrinter).map_err(to_js_error)
    }
}
