//! Input events for canvas interaction.
//!
//! Hosts resolve each pointer event to a single [`Target`] before handing it
//! over, so one physical click is never seen by both an element and the
//! canvas background.

use serde::{Deserialize, Serialize};

use crate::ElementId;

/// What a pointer event landed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Target {
    /// The canvas container itself.
    Background,
    /// An element.
    Element(ElementId),
}

impl Target {
    /// The element id, if the target is an element.
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::Element(id) => Some(id),
            Self::Background => None,
        }
    }
}

/// A pointer position in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl PointerPosition {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum Key {
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
    /// Any other key, by name.
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

/// All input events the canvas can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown {
        /// Pointer position.
        position: PointerPosition,
        /// What was pressed.
        target: Target,
    },
    /// Pointer moved (delivered through the global channel while dragging).
    PointerMove {
        /// Pointer position.
        position: PointerPosition,
    },
    /// Primary button released.
    PointerUp {
        /// Pointer position.
        position: PointerPosition,
    },
    /// Press and release on the same target.
    Click {
        /// What was clicked.
        target: Target,
    },
    /// Double click.
    DoubleClick {
        /// What was double-clicked.
        target: Target,
    },
    /// Key pressed while the text editor has focus.
    Key {
        /// The key.
        key: Key,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },
    /// The inline text editor's value changed.
    TextInput {
        /// Full editor value after the change.
        value: String,
    },
    /// The inline text editor lost focus.
    Blur,
}

impl InputEvent {
    /// Pointer-down on an element.
    #[must_use]
    pub fn pointer_down_on(id: impl Into<ElementId>, x: f32, y: f32) -> Self {
        Self::PointerDown {
            position: PointerPosition::new(x, y),
            target: Target::Element(id.into()),
        }
    }

    /// Pointer move.
    #[must_use]
    pub const fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            position: PointerPosition::new(x, y),
        }
    }

    /// Pointer up.
    #[must_use]
    pub const fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            position: PointerPosition::new(x, y),
        }
    }

    /// Click on an element.
    #[must_use]
    pub fn click_on(id: impl Into<ElementId>) -> Self {
        Self::Click {
            target: Target::Element(id.into()),
        }
    }

    /// Click on the canvas background.
    #[must_use]
    pub const fn click_background() -> Self {
        Self::Click {
            target: Target::Background,
        }
    }

    /// Double click on an element.
    #[must_use]
    pub fn double_click_on(id: impl Into<ElementId>) -> Self {
        Self::DoubleClick {
            target: Target::Element(id.into()),
        }
    }

    /// Key press without modifiers.
    #[must_use]
    pub const fn key(key: Key) -> Self {
        Self::Key {
            key,
            modifiers: KeyModifiers {
                shift: false,
                ctrl: false,
                alt: false,
                meta: false,
            },
        }
    }

    /// The pointer target, for events that have one.
    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::PointerDown { target, .. }
            | Self::Click { target }
            | Self::DoubleClick { target } => Some(target),
            _ => None,
        }
    }
}
