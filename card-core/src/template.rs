//! Predefined starting documents and the loader that applies them.

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementKind, FontWeight, QrProps, ShapeProps, TextProps};
use crate::service::QrGenerator;
use crate::store::{PayloadOutcome, SceneStore};
use crate::{CardError, CardResult};

/// A predefined card layout. Read-only input to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Thumbnail reference for pickers.
    #[serde(default)]
    pub thumbnail: String,
    /// Elements, bottom to top.
    pub elements: Vec<Element>,
    /// Solid color or CSS gradient descriptor.
    pub background: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// The list of templates offered to the user. The first one is the startup
/// layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// Build a catalog from a list of templates.
    ///
    /// Returns `None` when the list is empty, since the editor needs a
    /// startup template.
    #[must_use]
    pub fn new(templates: Vec<Template>) -> Option<Self> {
        (!templates.is_empty()).then_some(Self { templates })
    }

    /// Parse a JSON array of templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the array is empty.
    pub fn from_json(json: &str) -> CardResult<Self> {
        let templates: Vec<Template> = serde_json::from_str(json)?;
        Self::new(templates).ok_or_else(|| CardError::TemplateNotFound("<empty catalog>".into()))
    }

    /// The templates shipped with the editor.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            templates: vec![
                minimalist_white(),
                ocean_gradient(),
                sunset_event(),
                forest_business(),
            ],
        }
    }

    /// The startup template.
    #[must_use]
    pub fn default_template(&self) -> &Template {
        &self.templates[0]
    }

    /// Look up a template by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Iterate over all templates in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false: a catalog holds at least one template.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Applies templates to a store.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    store: SceneStore,
}

impl TemplateLoader {
    /// Create a loader for `store`.
    #[must_use]
    pub fn new(store: SceneStore) -> Self {
        Self { store }
    }

    /// Swap in `template`, then regenerate the QR bitmap for the current
    /// payload so freshly loaded QR elements pick it up.
    ///
    /// The swap is synchronous; the regeneration only starts after it. It is
    /// skipped when the payload text is empty, and when a payload update is
    /// already in flight: that update is newer than the committed text and
    /// syncs the new QR elements when it lands. Returns the regeneration
    /// outcome, if one ran.
    pub async fn apply(
        &self,
        template: &Template,
        generator: &dyn QrGenerator,
    ) -> Option<PayloadOutcome> {
        self.store.load_template(template);

        if self.store.payload_pending() {
            tracing::debug!(
                template = %template.id,
                "Payload update in flight, skipping regeneration"
            );
            return None;
        }
        let text = self.store.payload().text;
        if text.is_empty() {
            return None;
        }
        Some(self.store.set_payload(text, generator).await)
    }
}

fn text(
    id: &str,
    (x, y): (f32, f32),
    content: &str,
    font_size: i32,
    font_weight: FontWeight,
    color: &str,
) -> Element {
    Element::new(
        id,
        x,
        y,
        ElementKind::Text(TextProps {
            content: content.to_string(),
            font_size,
            font_weight,
            color: color.to_string(),
            font_family: "Inter, sans-serif".to_string(),
        }),
    )
}

fn qr(id: &str, (x, y): (f32, f32), size: i32) -> Element {
    Element::new(
        id,
        x,
        y,
        ElementKind::Qr(QrProps {
            size,
            qr_data: String::new(),
        }),
    )
}

fn shape(width: i32, height: i32, color: &str) -> ShapeProps {
    ShapeProps {
        width,
        height,
        color: color.to_string(),
        border_width: Some(0),
        border_color: Some("#000000".to_string()),
    }
}

fn minimalist_white() -> Template {
    Template {
        id: "minimalist-white".to_string(),
        name: "Minimalist White".to_string(),
        thumbnail: String::new(),
        elements: vec![
            text(
                "text-title",
                (30.0, 40.0),
                "Scan me",
                28,
                FontWeight::Bold,
                "#111827",
            ),
            text(
                "text-subtitle",
                (30.0, 85.0),
                "Point your camera at the code",
                14,
                FontWeight::Normal,
                "#6b7280",
            ),
            qr("qr-main", (250.0, 60.0), 120),
        ],
        background: "#ffffff".to_string(),
        width: 400,
        height: 240,
    }
}

fn ocean_gradient() -> Template {
    Template {
        id: "ocean-gradient".to_string(),
        name: "Ocean".to_string(),
        thumbnail: String::new(),
        elements: vec![
            Element::new(
                "rectangle-panel",
                20.0,
                20.0,
                ElementKind::Rectangle(shape(200, 200, "#ffffff")),
            ),
            text(
                "text-title",
                (40.0, 50.0),
                "Free Wi-Fi",
                26,
                FontWeight::Bold,
                "#0f172a",
            ),
            qr("qr-main", (260.0, 70.0), 110),
        ],
        background: "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)".to_string(),
        width: 400,
        height: 240,
    }
}

fn sunset_event() -> Template {
    Template {
        id: "sunset-event".to_string(),
        name: "Sunset Event".to_string(),
        thumbnail: String::new(),
        elements: vec![
            Element::new(
                "circle-accent",
                300.0,
                -20.0,
                ElementKind::Circle(shape(120, 120, "#fee140")),
            ),
            text(
                "text-title",
                (24.0, 30.0),
                "Join the party",
                30,
                FontWeight::Bold,
                "#ffffff",
            ),
            qr("qr-main", (24.0, 100.0), 110),
        ],
        background: "linear-gradient(135deg, #fa709a 0%, #fee140 100%)".to_string(),
        width: 400,
        height: 240,
    }
}

fn forest_business() -> Template {
    Template {
        id: "forest-business".to_string(),
        name: "Business Card".to_string(),
        thumbnail: String::new(),
        elements: vec![
            Element::new(
                "triangle-mark",
                24.0,
                24.0,
                ElementKind::Triangle(shape(40, 40, "#10b981")),
            ),
            text(
                "text-name",
                (80.0, 28.0),
                "Jane Doe",
                24,
                FontWeight::Bold,
                "#064e3b",
            ),
            text(
                "text-role",
                (80.0, 62.0),
                "Product Designer",
                14,
                FontWeight::Normal,
                "#065f46",
            ),
            qr("qr-main", (280.0, 120.0), 100),
        ],
        background: "#ecfdf5".to_string(),
        width: 400,
        height: 240,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Document;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_templates_have_unique_element_ids() {
        for template in TemplateCatalog::builtin().iter() {
            let ids: HashSet<_> = template.elements.iter().map(|e| &e.id).collect();
            assert_eq!(ids.len(), template.elements.len(), "{}", template.id);
        }
    }

    #[test]
    fn test_default_template_is_first() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.default_template().id, "minimalist-white");
        assert!(catalog.get("ocean-gradient").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r##"[{
            "id": "plain",
            "name": "Plain",
            "elements": [
                {"id": "qr-1", "type": "qr", "x": 10, "y": 10, "size": 80}
            ],
            "background": "#000000",
            "width": 300,
            "height": 200
        }]"##;
        let catalog = TemplateCatalog::from_json(json).expect("valid catalog");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.default_template().elements[0].id.as_str(), "qr-1");
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        assert!(TemplateCatalog::from_json("[]").is_err());
        assert!(TemplateCatalog::new(Vec::new()).is_none());
    }

    #[test]
    fn test_load_template_replaces_document() {
        let store = SceneStore::new(Document::new(300, 200));
        store
            .add_element(qr("old", (0.0, 0.0), 80))
            .expect("add old");
        store.select_element(Some("old".into()));

        let template = ocean_gradient();
        store.load_template(&template);

        let doc = store.snapshot();
        assert_eq!(doc.elements(), template.elements.as_slice());
        assert_eq!(doc.background, template.background);
        assert_eq!((doc.width, doc.height), (400, 240));
        assert!(doc.selected().is_none());
    }
}
