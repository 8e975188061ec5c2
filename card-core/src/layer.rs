//! Card layers - the building blocks of a face.
//!
//! `Layer` is a closed tagged union over text and image variants. The wire
//! shape (camelCase field names, `"type"` discriminator) is the version-1
//! persisted contract and must stay stable; breaking changes require a new
//! document version.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer, stable for the layer's lifetime.
///
/// Opaque on the wire: newly created layers get a UUID string, but any
/// string unique within the document is legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stable storage reference for an uploaded asset.
///
/// Never a signed URL: signed URLs expire and would leak access tokens into
/// saved state. They are minted from this path at render time instead.
pub type StoragePath = String;

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor text at its origin.
    Left,
    /// Center text on its origin.
    Center,
    /// Anchor the right edge at the origin.
    Right,
}

/// Crop window in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge in source pixels.
    pub x: f32,
    /// Top edge in source pixels.
    pub y: f32,
    /// Window width in source pixels.
    pub width: f32,
    /// Window height in source pixels.
    pub height: f32,
}

/// Fields shared by every layer variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayer {
    /// Unique identifier.
    pub id: LayerId,
    /// X position in canvas pixels.
    pub x: f32,
    /// Y position in canvas pixels.
    pub y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Horizontal scale, 1.0 = natural size.
    pub scale_x: f32,
    /// Vertical scale, 1.0 = natural size.
    pub scale_y: f32,
    /// Opacity 0..1; absent means fully opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Suppresses interactive dragging only; no effect on export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl BaseLayer {
    /// Create a base at the given position with identity transform.
    #[must_use]
    pub fn at(id: LayerId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: None,
            locked: None,
        }
    }

    /// Opacity with the documented default applied.
    #[must_use]
    pub fn effective_opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0)
    }

    /// Whether interactive dragging is suppressed.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false)
    }
}

/// A text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    /// Common layer fields.
    #[serde(flatten)]
    pub base: BaseLayer,
    /// Text content. Newlines start new lines.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas pixels.
    pub font_size: f32,
    /// Fill color, hex or rgba string.
    pub color: String,
    /// Horizontal alignment relative to the layer origin.
    pub align: TextAlign,

    // Optional typography controls. All must stay optional: version-1
    // readers that predate them ignore unknown fields on read.
    /// Font weight, e.g. 400 or 700.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    /// Line height as a multiple of the font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    /// Additional letter spacing in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,

    /// Shadow color; a shadow is drawn only when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    /// Shadow blur radius in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,
    /// Shadow X offset in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_x: Option<f32>,
    /// Shadow Y offset in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_y: Option<f32>,

    /// Outline color; an outline is drawn only when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Outline width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

/// An image layer referencing an uploaded asset by stable path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Common layer fields.
    #[serde(flatten)]
    pub base: BaseLayer,
    /// Stable storage reference, e.g. `cards/<user>/<card>/assets/<id>.png`.
    pub src: StoragePath,
    /// Width override in canvas pixels; absent uses the natural size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Height override in canvas pixels; absent uses the natural size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Crop window in source-image pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

/// A layer on a card face.
///
/// The variant set is closed; renderers match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    /// A positioned run of text.
    Text(TextLayer),
    /// A positioned image.
    Image(ImageLayer),
}

impl Layer {
    /// The layer's unique identifier.
    #[must_use]
    pub fn id(&self) -> &LayerId {
        &self.base().id
    }

    /// Common fields shared by every variant.
    #[must_use]
    pub fn base(&self) -> &BaseLayer {
        match self {
            Self::Text(t) => &t.base,
            Self::Image(i) => &i.base,
        }
    }

    /// Mutable access to the common fields.
    pub fn base_mut(&mut self) -> &mut BaseLayer {
        match self {
            Self::Text(t) => &mut t.base,
            Self::Image(i) => &mut i.base,
        }
    }

    /// Merge a partial update into this layer.
    ///
    /// Common fields apply to any variant; variant-specific fields are
    /// ignored when they do not match the target.
    pub fn apply(&mut self, patch: &LayerPatch) {
        let base = self.base_mut();
        if let Some(x) = patch.x {
            base.x = x;
        }
        if let Some(y) = patch.y {
            base.y = y;
        }
        if let Some(rotation) = patch.rotation {
            base.rotation = rotation;
        }
        if let Some(scale_x) = patch.scale_x {
            base.scale_x = scale_x;
        }
        if let Some(scale_y) = patch.scale_y {
            base.scale_y = scale_y;
        }
        if let Some(opacity) = patch.opacity {
            base.opacity = Some(opacity);
        }
        if let Some(locked) = patch.locked {
            base.locked = Some(locked);
        }

        match self {
            Self::Text(t) => {
                if let Some(text) = &patch.text {
                    t.text.clone_from(text);
                }
                if let Some(font_family) = &patch.font_family {
                    t.font_family.clone_from(font_family);
                }
                if let Some(font_size) = patch.font_size {
                    t.font_size = font_size;
                }
                if let Some(color) = &patch.color {
                    t.color.clone_from(color);
                }
                if let Some(align) = patch.align {
                    t.align = align;
                }
                if let Some(font_weight) = patch.font_weight {
                    t.font_weight = Some(font_weight);
                }
                if let Some(line_height) = patch.line_height {
                    t.line_height = Some(line_height);
                }
                if let Some(letter_spacing) = patch.letter_spacing {
                    t.letter_spacing = Some(letter_spacing);
                }
            }
            Self::Image(i) => {
                if let Some(src) = &patch.src {
                    i.src.clone_from(src);
                }
                if let Some(width) = patch.width {
                    i.width = Some(width);
                }
                if let Some(height) = patch.height {
                    i.height = Some(height);
                }
                if let Some(crop) = patch.crop {
                    i.crop = Some(crop);
                }
            }
        }
    }
}

/// A partial update merged into an existing layer by
/// [`apply`](Layer::apply).
///
/// Every field is optional; the interactive surface sends only what a
/// gesture changed (e.g. `x, y, rotation, scaleX, scaleY` on transform
/// release).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    /// New X position.
    pub x: Option<f32>,
    /// New Y position.
    pub y: Option<f32>,
    /// New rotation in degrees.
    pub rotation: Option<f32>,
    /// New horizontal scale.
    pub scale_x: Option<f32>,
    /// New vertical scale.
    pub scale_y: Option<f32>,
    /// New opacity.
    pub opacity: Option<f32>,
    /// New locked flag.
    pub locked: Option<bool>,

    /// New text content (text layers only).
    pub text: Option<String>,
    /// New font family (text layers only).
    pub font_family: Option<String>,
    /// New font size (text layers only).
    pub font_size: Option<f32>,
    /// New fill color (text layers only).
    pub color: Option<String>,
    /// New alignment (text layers only).
    pub align: Option<TextAlign>,
    /// New font weight (text layers only).
    pub font_weight: Option<u16>,
    /// New line height (text layers only).
    pub line_height: Option<f32>,
    /// New letter spacing (text layers only).
    pub letter_spacing: Option<f32>,

    /// New storage reference (image layers only).
    pub src: Option<StoragePath>,
    /// New width override (image layers only).
    pub width: Option<f32>,
    /// New height override (image layers only).
    pub height: Option<f32>,
    /// New crop window (image layers only).
    pub crop: Option<CropRect>,
}
