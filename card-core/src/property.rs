//! Property panel edits.
//!
//! The panel hands over raw text from its inputs. Numeric fields are parsed
//! leniently (leading integer, trailing garbage ignored); input that has no
//! leading integer is dropped and the element keeps its previous value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementPatch, FontWeight};
use crate::store::SceneStore;

/// An editable element property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyField {
    /// Text content.
    Content,
    /// Text font size.
    FontSize,
    /// Text font weight (`normal` or `bold`).
    FontWeight,
    /// Text or fill color.
    Color,
    /// Text font family.
    FontFamily,
    /// Shape width.
    Width,
    /// Shape height.
    Height,
    /// Shape border width.
    BorderWidth,
    /// Shape border color.
    BorderColor,
    /// QR edge length.
    Size,
    /// Left position.
    X,
    /// Top position.
    Y,
}

impl PropertyField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::FontSize => "fontSize",
            Self::FontWeight => "fontWeight",
            Self::Color => "color",
            Self::FontFamily => "fontFamily",
            Self::Width => "width",
            Self::Height => "height",
            Self::BorderWidth => "borderWidth",
            Self::BorderColor => "borderColor",
            Self::Size => "size",
            Self::X => "x",
            Self::Y => "y",
        }
    }
}

impl fmt::Display for PropertyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "content" => Self::Content,
            "fontSize" => Self::FontSize,
            "fontWeight" => Self::FontWeight,
            "color" => Self::Color,
            "fontFamily" => Self::FontFamily,
            "width" => Self::Width,
            "height" => Self::Height,
            "borderWidth" => Self::BorderWidth,
            "borderColor" => Self::BorderColor,
            "size" => Self::Size,
            "x" => Self::X,
            "y" => Self::Y,
            other => return Err(format!("Unknown property: {other}")),
        })
    }
}

/// Parse the leading integer of `raw`: optional whitespace, optional sign,
/// then at least one digit. Anything after the digits is ignored.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = rest[..end].parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

/// Build the patch for one property edit, or `None` if the raw input does
/// not parse.
#[must_use]
pub fn property_patch(field: PropertyField, raw: &str) -> Option<ElementPatch> {
    let mut patch = ElementPatch::default();
    match field {
        PropertyField::Content => patch.content = Some(raw.to_string()),
        PropertyField::Color => patch.color = Some(raw.to_string()),
        PropertyField::FontFamily => patch.font_family = Some(raw.to_string()),
        PropertyField::BorderColor => patch.border_color = Some(raw.to_string()),
        PropertyField::FontWeight => patch.font_weight = Some(raw.parse::<FontWeight>().ok()?),
        PropertyField::FontSize => patch.font_size = Some(parse_leading_int(raw)?),
        PropertyField::Width => patch.width = Some(parse_leading_int(raw)?),
        PropertyField::Height => patch.height = Some(parse_leading_int(raw)?),
        PropertyField::BorderWidth => patch.border_width = Some(parse_leading_int(raw)?),
        PropertyField::Size => patch.size = Some(parse_leading_int(raw)?),
        #[allow(clippy::cast_precision_loss)]
        PropertyField::X => patch.x = Some(parse_leading_int(raw)? as f32),
        #[allow(clippy::cast_precision_loss)]
        PropertyField::Y => patch.y = Some(parse_leading_int(raw)? as f32),
    }
    Some(patch)
}

/// Apply a raw property edit to the element with this id.
///
/// Returns whether a patch was produced. Unparseable input is logged and
/// dropped; unknown ids are a silent no-op in the store.
pub fn apply_property_edit(
    store: &SceneStore,
    id: &ElementId,
    field: PropertyField,
    raw: &str,
) -> bool {
    match property_patch(field, raw) {
        Some(patch) => {
            store.update_element(id, &patch);
            true
        }
        None => {
            tracing::debug!(%id, %field, raw, "Ignored unparseable property edit");
            false
        }
    }
}
