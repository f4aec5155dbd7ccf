//! # QR Card Core
//!
//! Scene model and direct-manipulation engine for a QR card designer.
//! Compiles to WASM so the same state machine drives the browser editor and
//! the command-line renderer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Scene Store      │  Interaction Controller │
//! │  - Elements       │  - Select / drag        │
//! │  - Selection      │  - Inline text edit     │
//! │  - QR payload     │  - Listener lifecycle   │
//! ├─────────────────────────────────────────────┤
//! │  Templates        │  Render Projection      │
//! │  - Catalog        │  - Render tree          │
//! │  - Loader         │  - Hit testing          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod interaction;
pub mod palette;
pub mod projection;
pub mod property;
pub mod scene;
pub mod service;
pub mod store;
pub mod template;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{EditorConfig, PayloadOrdering};
pub use editor::{default_element, CardEditor};
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, ElementType, FontWeight, IdAllocator, QrProps,
    ShapeProps, TextProps,
};
pub use error::{CardError, CardResult};
pub use event::{InputEvent, Key, KeyModifiers, PointerPosition, Target};
pub use interaction::{
    clamp_drag_target, DragSession, InteractionController, InteractionState, ListenerChannel,
    ListenerHost, NoopListenerHost,
};
pub use palette::{PayloadKind, BACKGROUND_COLORS, BACKGROUND_GRADIENTS};
pub use projection::{
    project, BackgroundFill, Bounds, Cursor, InteractionView, Primitive, RenderNode, RenderTree,
    Stroke,
};
pub use property::{apply_property_edit, parse_leading_int, PropertyField};
pub use scene::{Document, ImageRef, QrPayload};
pub use service::{Exporter, Printer, QrGenerator};
pub use store::{PayloadOutcome, SceneStore};
pub use template::{Template, TemplateCatalog, TemplateLoader};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
