//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::CardResult;

/// Which of several overlapping payload generations may commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadOrdering {
    /// Only the most recently requested generation commits; earlier requests
    /// that resolve later are dropped.
    #[default]
    LatestRequest,
    /// Every successful generation commits when it resolves, so the slowest
    /// one wins.
    LatestResolution,
}

/// Tunables for the editor core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Fixed size used to keep dragged elements on the canvas. Applied to
    /// every kind regardless of its real size.
    pub drag_floor: f32,
    /// Ordering policy for overlapping payload updates.
    pub payload_ordering: PayloadOrdering,
    /// Commit drag moves once per animation frame instead of per event.
    pub coalesce_pointer_moves: bool,
    /// Offset applied to duplicated elements, on both axes.
    pub duplicate_offset: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_floor: 50.0,
            payload_ordering: PayloadOrdering::LatestRequest,
            coalesce_pointer_moves: false,
            duplicate_offset: 20.0,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> CardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
