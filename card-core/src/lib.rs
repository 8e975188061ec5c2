//! # Card Core
//!
//! Core designer logic for the Cardpost greeting-card designer: the
//! versioned document model, the shared layer attribute resolver, and the
//! interactive editing session.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Document Model   │  Attribute Resolver     │
//! │  - 3 fixed faces  │  - base/text/image      │
//! │  - layer stacks   │  - one styling source   │
//! │  - version gate   │    for both renderers   │
//! ├─────────────────────────────────────────────┤
//! │  Editing Session                            │
//! │  - active face / selection                  │
//! │  - layer CRUD + stacking reorder            │
//! │  - value-replacement mutations              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure and synchronous. Rasterization lives in
//! `card-renderer`; persistence and delivery live in `card-server`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attrs;
pub mod document;
pub mod error;
pub mod layer;
pub mod session;

pub use attrs::{
    base_attrs, image_attrs, text_attrs, BaseAttrs, ImageAttrs, ShadowAttrs, StrokeAttrs,
    TextAttrs,
};
pub use document::{
    DesignerDocument, DocumentMeta, Face, FaceId, Faces, CARD_HEIGHT_PX, CARD_WIDTH_PX,
    DESIGNER_VERSION,
};
pub use error::{DesignError, DesignResult};
pub use layer::{
    BaseLayer, CropRect, ImageLayer, Layer, LayerId, LayerPatch, StoragePath, TextAlign, TextLayer,
};
pub use session::{DesignerSession, ReorderDirection};

/// Card core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
