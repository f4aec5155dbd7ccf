//! Card elements - the positioned primitives of a document.
//!
//! Every element shares the base shape `{id, type, x, y}` and carries the
//! fields of exactly one kind. Field ranges are **not** enforced here: the
//! constants below are hints for input widgets, and the model stores whatever
//! it is given (a negative width renders degenerately, it is not rejected).

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Practical font size range offered by property inputs.
pub const FONT_SIZE_RANGE: RangeInclusive<i32> = 8..=72;

/// Practical width/height range for shapes.
pub const SHAPE_DIMENSION_RANGE: RangeInclusive<i32> = 10..=400;

/// Practical border width range for shapes.
pub const BORDER_WIDTH_RANGE: RangeInclusive<i32> = 0..=10;

/// Practical edge length range for QR elements.
pub const QR_SIZE_RANGE: RangeInclusive<i32> = 50..=300;

/// Unique identifier for an element.
///
/// Identifiers are opaque strings; ids created by the editor look like
/// `rectangle-1718000000000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Single-line text run.
    Text,
    /// Filled rectangle.
    Rectangle,
    /// Filled ellipse inscribed in its box.
    Circle,
    /// Upward-pointing isosceles triangle.
    Triangle,
    /// QR code image.
    Qr,
}

impl ElementType {
    /// All kinds, in toolbar order.
    pub const ALL: [Self; 5] = [
        Self::Text,
        Self::Rectangle,
        Self::Circle,
        Self::Triangle,
        Self::Qr,
    ];

    /// Wire name of the kind, also used as the id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Qr => "qr",
        }
    }

    /// Whether this kind carries [`ShapeProps`].
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(self, Self::Rectangle | Self::Circle | Self::Triangle)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown element type: {s}"))
    }
}

/// Font weight of a text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

impl FontWeight {
    /// CSS keyword for this weight.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "bold" => Ok(Self::Bold),
            other => Err(format!("unknown font weight: {other}")),
        }
    }
}

/// Fields of a text element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// Text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: i32,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Text color as hex.
    pub color: String,
    /// CSS font family list.
    pub font_family: String,
}

/// Fields shared by rectangles, circles and triangles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Fill color as hex.
    pub color: String,
    /// Border width in pixels; no border when absent or zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<i32>,
    /// Border color as hex, only meaningful with a positive border width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

impl ShapeProps {
    /// The border to draw, if any: `(width, color)`.
    #[must_use]
    pub fn border(&self) -> Option<(i32, &str)> {
        match self.border_width {
            Some(width) if width > 0 => {
                Some((width, self.border_color.as_deref().unwrap_or("#000000")))
            }
            _ => None,
        }
    }
}

/// Fields of a QR element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrProps {
    /// Edge length in pixels (QR codes are square).
    pub size: i32,
    /// Copy of the document's payload text.
    #[serde(default)]
    pub qr_data: String,
}

/// Kind-specific content of an element, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text run.
    Text(TextProps),
    /// A rectangle.
    Rectangle(ShapeProps),
    /// A circle (ellipse inscribed in `width × height`).
    Circle(ShapeProps),
    /// A triangle pointing up, base at the bottom edge.
    Triangle(ShapeProps),
    /// A QR code.
    Qr(QrProps),
}

impl ElementKind {
    /// The kind tag.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Rectangle(_) => ElementType::Rectangle,
            Self::Circle(_) => ElementType::Circle,
            Self::Triangle(_) => ElementType::Triangle,
            Self::Qr(_) => ElementType::Qr,
        }
    }
}

/// A positioned element of a card document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier, immutable for the element's lifetime.
    pub id: ElementId,
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Top edge in canvas pixels.
    pub y: f32,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element at the given position.
    #[must_use]
    pub fn new(id: impl Into<ElementId>, x: f32, y: f32, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            kind,
        }
    }

    /// The kind tag.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Top-left position.
    #[must_use]
    pub const fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Whether this is a text element.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    /// Whether this is a QR element.
    #[must_use]
    pub const fn is_qr(&self) -> bool {
        matches!(self.kind, ElementKind::Qr(_))
    }

    /// Merge a patch into this element.
    ///
    /// Fields that do not apply to the element's kind are ignored. The kind
    /// itself and the QR payload copy are never touched. Returns whether any
    /// field actually changed.
    pub fn apply(&mut self, patch: &ElementPatch) -> bool {
        let mut changed = assign(&mut self.x, patch.x);
        changed |= assign(&mut self.y, patch.y);

        match &mut self.kind {
            ElementKind::Text(text) => {
                changed |= assign(&mut text.content, patch.content.clone());
                changed |= assign(&mut text.font_size, patch.font_size);
                changed |= assign(&mut text.font_weight, patch.font_weight);
                changed |= assign(&mut text.color, patch.color.clone());
                changed |= assign(&mut text.font_family, patch.font_family.clone());
            }
            ElementKind::Rectangle(shape)
            | ElementKind::Circle(shape)
            | ElementKind::Triangle(shape) => {
                changed |= assign(&mut shape.width, patch.width);
                changed |= assign(&mut shape.height, patch.height);
                changed |= assign(&mut shape.color, patch.color.clone());
                changed |= assign(&mut shape.border_width, patch.border_width.map(Some));
                changed |= assign(&mut shape.border_color, patch.border_color.clone().map(Some));
            }
            ElementKind::Qr(qr) => {
                changed |= assign(&mut qr.size, patch.size);
            }
        }

        changed
    }
}

fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// Partial update for an element. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// New left edge.
    pub x: Option<f32>,
    /// New top edge.
    pub y: Option<f32>,
    /// New text content.
    pub content: Option<String>,
    /// New font size.
    pub font_size: Option<i32>,
    /// New font weight.
    pub font_weight: Option<FontWeight>,
    /// New text or fill color.
    pub color: Option<String>,
    /// New font family.
    pub font_family: Option<String>,
    /// New shape width.
    pub width: Option<i32>,
    /// New shape height.
    pub height: Option<i32>,
    /// New shape border width.
    pub border_width: Option<i32>,
    /// New shape border color.
    pub border_color: Option<String>,
    /// New QR edge length.
    pub size: Option<i32>,
}

impl ElementPatch {
    /// Patch that moves an element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that replaces text content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Whether the patch sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Allocates `"{kind}-{millis}"` identifiers.
///
/// The millisecond stamp is strictly increasing across calls and is bumped
/// further while the candidate collides with an existing id.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    last_stamp: u64,
}

impl IdAllocator {
    /// Create an allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for `kind` that `taken` does not report as in use.
    pub fn allocate(&mut self, kind: ElementType, taken: impl Fn(&ElementId) -> bool) -> ElementId {
        self.allocate_at(now_millis(), kind, taken)
    }

    fn allocate_at(
        &mut self,
        now: u64,
        kind: ElementType,
        taken: impl Fn(&ElementId) -> bool,
    ) -> ElementId {
        let mut stamp = now.max(self.last_stamp.saturating_add(1));
        loop {
            let id = ElementId::new(format!("{kind}-{stamp}"));
            if !taken(&id) {
                self.last_stamp = stamp;
                return id;
            }
            stamp = stamp.saturating_add(1);
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Timestamps won't exceed u64 for billions of years
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current wall-clock time in milliseconds since the Unix epoch, from the
/// browser clock. `std::time::SystemTime` panics on `wasm32-unknown-unknown`.
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn now_millis() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

/// Without a host clock the stamp is 0; [`IdAllocator`] still counts up.
#[cfg(all(target_arch = "wasm32", not(feature = "wasm")))]
#[must_use]
pub fn now_millis() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle() -> Element {
        Element::new(
            "rectangle-1",
            10.0,
            20.0,
            ElementKind::Rectangle(ShapeProps {
                width: 100,
                height: 60,
                color: "#3b82f6".to_string(),
                border_width: Some(0),
                border_color: Some("#000000".to_string()),
            }),
        )
    }

    #[test]
    fn test_patch_ignores_fields_of_other_kinds() {
        let mut element = rectangle();
        let patch = ElementPatch {
            content: Some("ignored".to_string()),
            size: Some(200),
            width: Some(120),
            ..ElementPatch::default()
        };

        assert!(element.apply(&patch));
        assert_eq!(element.element_type(), ElementType::Rectangle);
        match &element.kind {
            ElementKind::Rectangle(shape) => assert_eq!(shape.width, 120),
            other => panic!("kind changed: {other:?}"),
        }
    }

    #[test]
    fn test_patch_reports_unchanged() {
        let mut element = rectangle();
        assert!(!element.apply(&ElementPatch::position(10.0, 20.0)));
        assert!(!element.apply(&ElementPatch::default()));
    }

    #[test]
    fn test_out_of_range_values_are_stored() {
        let mut element = rectangle();
        let patch = ElementPatch {
            width: Some(-5),
            ..ElementPatch::default()
        };
        element.apply(&patch);
        match &element.kind {
            ElementKind::Rectangle(shape) => assert_eq!(shape.width, -5),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_border_requires_positive_width() {
        let mut shape = ShapeProps {
            width: 10,
            height: 10,
            color: "#fff".to_string(),
            border_width: Some(0),
            border_color: Some("#ff0000".to_string()),
        };
        assert!(shape.border().is_none());
        shape.border_width = Some(2);
        assert_eq!(shape.border(), Some((2, "#ff0000")));
        shape.border_color = None;
        assert_eq!(shape.border(), Some((2, "#000000")));
    }

    #[test]
    fn test_wire_format_uses_type_tag() {
        let json = serde_json::json!({
            "id": "qr-1",
            "type": "qr",
            "x": 200.0,
            "y": 60.0,
            "size": 120,
            "qrData": ""
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        assert!(element.is_qr());
        assert_eq!(element.id.as_str(), "qr-1");

        let text: Element = serde_json::from_value(serde_json::json!({
            "id": "text-1",
            "type": "text",
            "x": 1.0,
            "y": 2.0,
            "content": "Hi",
            "fontSize": 24,
            "fontWeight": "bold",
            "color": "#111111",
            "fontFamily": "Inter"
        }))
        .expect("deserialize text");
        match text.kind {
            ElementKind::Text(props) => assert_eq!(props.font_weight, FontWeight::Bold),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_allocator_never_repeats() {
        let mut allocator = IdAllocator::new();
        let first = allocator.allocate(ElementType::Text, |_| false);
        let second = allocator.allocate(ElementType::Text, |_| false);
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("text-"));
    }

    #[test]
    fn test_allocator_skips_taken_ids() {
        let mut allocator = IdAllocator::new();
        let probe = allocator.allocate(ElementType::Qr, |_| false);
        let next_stamp: u64 = probe.as_str()["qr-".len()..]
            .parse::<u64>()
            .expect("stamp")
            + 1;
        let blocked = ElementId::new(format!("qr-{next_stamp}"));
        let id = allocator.allocate(ElementType::Qr, |candidate| *candidate == blocked);
        assert_ne!(id, blocked);
    }

    #[test]
    fn test_allocator_counts_up_on_a_frozen_clock() {
        let mut allocator = IdAllocator::new();
        let ids: Vec<_> = (0..3)
            .map(|_| allocator.allocate_at(0, ElementType::Rectangle, |_| false))
            .collect();
        assert_eq!(
            ids,
            ["rectangle-1", "rectangle-2", "rectangle-3"].map(ElementId::from)
        );
    }

    #[test]
    fn test_allocator_never_goes_backwards() {
        let mut allocator = IdAllocator::new();
        let first = allocator.allocate_at(1_000, ElementType::Qr, |_| false);
        let second = allocator.allocate_at(500, ElementType::Qr, |_| false);
        assert_eq!(first.as_str(), "qr-1000");
        assert_eq!(second.as_str(), "qr-1001");
    }

    #[test]
    fn test_element_type_parse() {
        assert_eq!("circle".parse::<ElementType>(), Ok(ElementType::Circle));
        assert!("hexagon".parse::<ElementType>().is_err());
        assert!(ElementType::Triangle.is_shape());
        assert!(!ElementType::Qr.is_shape());
    }
}
