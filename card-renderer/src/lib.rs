//! # Card Renderer
//!
//! Headless rasterization for the Cardpost designer.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Face + resolved attrs (card-core)          │
//! ├─────────────────────────────────────────────┤
//! │  SVG intermediate                           │
//! │  - white background, layers in array order  │
//! ├─────────────────────────────────────────────┤
//! │  resvg / tiny-skia pixmap  →  lossless PNG  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The rasterizer is pure and synchronous: callers fetch and decode asset
//! bytes themselves and bind them through a [`PixelSource`]. Interactive
//! surfaces keep their decoded pixels in an [`AssetCache`] instead; export
//! never reads that cache.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset_cache;
pub mod error;
pub mod image;
pub mod raster;

pub use asset_cache::{AssetCache, AssetCacheConfig, CacheStats};
pub use error::{RenderError, RenderResult};
pub use image::{decode_pixels, ImageFormat, PixelData};
pub use raster::{FaceRasterizer, PixelSource};

/// Card renderer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
