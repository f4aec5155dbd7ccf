//! Render projection: document snapshot → visual tree.
//!
//! The projection is pure. Hosts re-run it whenever the store revision
//! changes and hand the result to whatever draws it (DOM, SVG exporter).
//! Selection lift happens here, as a stacking level on the node, and never
//! reorders the document.

use serde::Serialize;

use crate::element::{Element, ElementId, ElementKind, FontWeight};
use crate::event::Target;
use crate::scene::{Document, ImageRef};

/// Stacking level of the selected element.
pub const SELECTED_STACKING: u8 = 10;

/// Stacking level of every other element.
pub const BASE_STACKING: u8 = 1;

/// Minimum hit/outline width of a text run.
const MIN_TEXT_WIDTH: f32 = 50.0;

/// Transient controller state the projection needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionView {
    /// Element currently being dragged.
    pub dragging: Option<ElementId>,
    /// Text element currently being edited inline.
    pub editing: Option<ElementId>,
}

/// Axis-aligned box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width (never negative).
    pub width: f32,
    /// Height (never negative).
    pub height: f32,
}

impl Bounds {
    /// Whether the point lies inside (edges included).
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// A shape outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stroke {
    /// Width in pixels.
    pub width: i32,
    /// Color as hex.
    pub color: String,
}

/// Drawable primitive for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "primitive", rename_all = "snake_case")]
pub enum Primitive {
    /// A single-line text run, top-left anchored.
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels.
        font_size: i32,
        /// Font weight.
        font_weight: FontWeight,
        /// Color as hex.
        color: String,
        /// CSS font family list.
        font_family: String,
    },
    /// A filled rectangle.
    Rectangle {
        /// Fill color.
        fill: String,
        /// Optional outline.
        stroke: Option<Stroke>,
    },
    /// A filled ellipse inscribed in the bounds.
    Ellipse {
        /// Fill color.
        fill: String,
        /// Optional outline.
        stroke: Option<Stroke>,
    },
    /// A filled triangle: apex at top centre, base along the bottom edge.
    Triangle {
        /// Fill color.
        fill: String,
    },
    /// The rendered QR bitmap.
    QrImage {
        /// Image reference from the generator.
        bitmap: ImageRef,
    },
    /// Empty-state box shown until a QR bitmap has been generated.
    QrPlaceholder,
}

/// Cursor hint for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    /// Clickable.
    Pointer,
    /// Being dragged.
    Grabbing,
    /// Inline text editing.
    Text,
}

/// One positioned element of the visual tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    /// Element id.
    pub id: ElementId,
    /// What to draw.
    pub primitive: Primitive,
    /// Where to draw it.
    pub bounds: Bounds,
    /// Highlighted as the selection.
    pub selected: bool,
    /// Currently being dragged.
    pub dragging: bool,
    /// Showing the inline text editor.
    pub editing: bool,
    /// Cursor hint.
    pub cursor: Cursor,
    /// Stacking level; higher is drawn later.
    pub stacking: u8,
}

/// Parsed document background.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "fill", rename_all = "snake_case")]
pub enum BackgroundFill {
    /// A single color.
    Solid {
        /// Color value.
        color: String,
    },
    /// A CSS `linear-gradient(...)`.
    LinearGradient {
        /// Direction in degrees (CSS convention, 180 = top to bottom).
        angle: f32,
        /// Color stops with offsets in `0.0..=1.0`.
        stops: Vec<(String, f32)>,
    },
}

impl BackgroundFill {
    /// Parse a background value. Anything that is not a well-formed
    /// `linear-gradient(...)` is treated as a solid color.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        parse_linear_gradient(value).unwrap_or_else(|| Self::Solid {
            color: value.trim().to_string(),
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn parse_linear_gradient(value: &str) -> Option<BackgroundFill> {
    let inner = value
        .trim()
        .strip_prefix("linear-gradient(")?
        .strip_suffix(')')?;
    let parts = split_top_level(inner)?;
    let mut parts = parts.into_iter().peekable();

    let angle = match parts.peek() {
        Some(first) if first.ends_with("deg") => {
            let angle = first.trim_end_matches("deg").trim().parse().ok()?;
            parts.next();
            angle
        }
        _ => 180.0,
    };

    let mut raw: Vec<(String, Option<f32>)> = Vec::new();
    for stop in parts {
        let (color, rest) = split_stop(stop)?;
        if color.is_empty() {
            return None;
        }
        let offset = rest
            .strip_suffix('%')
            .and_then(|t| t.trim().parse::<f32>().ok())
            .map(|p| p / 100.0);
        raw.push((color.to_string(), offset));
    }

    if raw.len() < 2 {
        return None;
    }

    let last = (raw.len() - 1) as f32;
    let stops = raw
        .into_iter()
        .enumerate()
        .map(|(i, (color, offset))| (color, offset.unwrap_or(i as f32 / last)))
        .collect();

    Some(BackgroundFill::LinearGradient { angle, stops })
}

/// Split on commas outside parentheses. `None` if the parentheses do not
/// balance.
fn split_top_level(input: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    (depth == 0).then(|| {
        parts.push(input[start..].trim());
        parts
    })
}

/// Split a color stop into its color and the remainder (the offset).
/// Functional colors such as `rgba(0, 0, 0, 0.5)` stay in one piece.
fn split_stop(stop: &str) -> Option<(&str, &str)> {
    let end = match stop.find('(') {
        Some(open) => open + stop[open..].find(')')? + 1,
        None => stop.find(char::is_whitespace).unwrap_or(stop.len()),
    };
    Some((stop[..end].trim(), stop[end..].trim()))
}

/// The visual tree for one document snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Parsed background.
    pub background: BackgroundFill,
    /// Nodes in document order.
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    /// Nodes in the order they should be painted: by stacking level, then
    /// document order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&RenderNode> {
        let mut nodes: Vec<_> = self.nodes.iter().collect();
        nodes.sort_by_key(|node| node.stacking);
        nodes
    }

    /// The topmost node under the point, or the background.
    #[must_use]
    pub fn hit_test(&self, x: f32, y: f32) -> Target {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|node| node.bounds.contains(x, y))
            .map_or(Target::Background, |node| Target::Element(node.id.clone()))
    }

    /// Find a node by element id.
    #[must_use]
    pub fn node(&self, id: &ElementId) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == *id)
    }
}

/// Project a document into a visual tree.
#[must_use]
pub fn project(document: &Document, view: &InteractionView) -> RenderTree {
    let selected = document.selected();
    let nodes = document
        .elements()
        .iter()
        .map(|element| {
            let is_selected = selected == Some(&element.id);
            let dragging = view.dragging.as_ref() == Some(&element.id);
            let editing = view.editing.as_ref() == Some(&element.id);
            let cursor = if dragging {
                Cursor::Grabbing
            } else if editing {
                Cursor::Text
            } else {
                Cursor::Pointer
            };

            RenderNode {
                id: element.id.clone(),
                primitive: primitive(element, document.payload.bitmap.as_ref()),
                bounds: bounds(element),
                selected: is_selected,
                dragging,
                editing,
                cursor,
                stacking: if is_selected {
                    SELECTED_STACKING
                } else {
                    BASE_STACKING
                },
            }
        })
        .collect();

    RenderTree {
        width: document.width,
        height: document.height,
        background: BackgroundFill::parse(&document.background),
        nodes,
    }
}

fn primitive(element: &Element, bitmap: Option<&ImageRef>) -> Primitive {
    match &element.kind {
        ElementKind::Text(text) => Primitive::Text {
            content: text.content.clone(),
            font_size: text.font_size,
            font_weight: text.font_weight,
            color: text.color.clone(),
            font_family: text.font_family.clone(),
        },
        ElementKind::Rectangle(shape) => Primitive::Rectangle {
            fill: shape.color.clone(),
            stroke: stroke(shape),
        },
        ElementKind::Circle(shape) => Primitive::Ellipse {
            fill: shape.color.clone(),
            stroke: stroke(shape),
        },
        ElementKind::Triangle(shape) => Primitive::Triangle {
            fill: shape.color.clone(),
        },
        ElementKind::Qr(_) => bitmap.map_or(Primitive::QrPlaceholder, |bitmap| {
            Primitive::QrImage {
                bitmap: bitmap.clone(),
            }
        }),
    }
}

fn stroke(shape: &crate::element::ShapeProps) -> Option<Stroke> {
    shape.border().map(|(width, color)| Stroke {
        width,
        color: color.to_string(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn bounds(element: &Element) -> Bounds {
    let (width, height) = match &element.kind {
        ElementKind::Text(text) => {
            let size = text.font_size.max(0) as f32;
            let chars = text.content.chars().count() as f32;
            ((0.6 * size * chars).max(MIN_TEXT_WIDTH), 1.2 * size)
        }
        ElementKind::Rectangle(shape)
        | ElementKind::Circle(shape)
        | ElementKind::Triangle(shape) => (shape.width as f32, shape.height as f32),
        ElementKind::Qr(qr) => (qr.size as f32, qr.size as f32),
    };
    Bounds {
        x: element.x,
        y: element.y,
        width: width.max(0.0),
        height: height.max(0.0),
    }
}
