//! Swatches and QR quick-insert presets offered by the editor.

use serde::{Deserialize, Serialize};

/// Solid background swatches.
pub const BACKGROUND_COLORS: [&str; 12] = [
    "#ffffff", "#f8f9fa", "#e9ecef", "#dee2e6", "#3b82f6", "#10b981", "#f59e0b", "#ef4444",
    "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

/// Gradient background swatches.
pub const BACKGROUND_GRADIENTS: [&str; 6] = [
    "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
    "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)",
    "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)",
    "linear-gradient(135deg, #43e97b 0%, #38f9d7 100%)",
    "linear-gradient(135deg, #fa709a 0%, #fee140 100%)",
    "linear-gradient(135deg, #a8edea 0%, #fed6e3 100%)",
];

/// Kind of content the user wants to encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Free text.
    #[default]
    Text,
    /// A web address.
    Url,
    /// An e-mail address.
    Email,
    /// A phone number.
    Phone,
    /// Wi-Fi credentials in the `WIFI:` scheme.
    Wifi,
}

impl PayloadKind {
    /// All kinds in display order.
    pub const ALL: [Self; 5] = [Self::Text, Self::Url, Self::Email, Self::Phone, Self::Wifi];

    /// Input hint for this kind.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Text => "Enter any text...",
            Self::Url => "https://example.com",
            Self::Email => "name@example.com",
            Self::Phone => "+1234567890",
            Self::Wifi => "WIFI:S:NetworkName;T:WPA;P:password;;",
        }
    }
}
