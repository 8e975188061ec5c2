//! Renderer-agnostic layer attribute resolution.
//!
//! Both the interactive surface and the headless exporter resolve layers
//! through these functions, so styling logic exists in exactly one place.
//! That shared path is what guarantees WYSIWYG parity between the live
//! canvas and the exported bitmaps.
//!
//! Image attributes deliberately exclude decoded pixel data: the two
//! render paths bind pixels from different sources (a live texture cache
//! on screen, a fresh decode off screen).

use crate::{CropRect, ImageLayer, Layer, LayerId, TextAlign, TextLayer};

/// Attributes common to every layer, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseAttrs {
    /// Layer identifier.
    pub id: LayerId,
    /// X position in canvas pixels.
    pub x: f32,
    /// Y position in canvas pixels.
    pub y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Horizontal scale.
    pub scale_x: f32,
    /// Vertical scale.
    pub scale_y: f32,
    /// Opacity with the default applied (1.0 when unset).
    pub opacity: f32,
    /// Whether interactive manipulation is allowed (`!locked`).
    /// Advisory: headless consumers ignore it.
    pub editable: bool,
}

/// Resolved drop-shadow styling for a text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowAttrs {
    /// Shadow color.
    pub color: String,
    /// Blur radius in pixels.
    pub blur: f32,
    /// X offset in pixels.
    pub offset_x: f32,
    /// Y offset in pixels.
    pub offset_y: f32,
}

/// Resolved outline styling for a text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeAttrs {
    /// Outline color.
    pub color: String,
    /// Outline width in pixels.
    pub width: f32,
}

/// Everything a renderer needs to draw a text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttrs {
    /// Common attributes.
    pub base: BaseAttrs,
    /// Text content.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas pixels.
    pub font_size: f32,
    /// Fill color.
    pub fill_color: String,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Font weight when specified.
    pub font_weight: Option<u16>,
    /// Line height as a multiple of font size (1.0 when unset).
    pub line_height: f32,
    /// Letter spacing in pixels (0.0 when unset).
    pub letter_spacing: f32,
    /// Drop shadow, present only when the layer sets a shadow color.
    pub shadow: Option<ShadowAttrs>,
    /// Outline, present only when the layer sets a stroke color.
    pub stroke: Option<StrokeAttrs>,
}

/// Everything a renderer needs to draw an image layer, minus the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttrs {
    /// Common attributes.
    pub base: BaseAttrs,
    /// Width override in canvas pixels.
    pub width: Option<f32>,
    /// Height override in canvas pixels.
    pub height: Option<f32>,
    /// Crop window in source-image pixels.
    pub crop: Option<CropRect>,
}

fn resolve_base(base: &crate::BaseLayer) -> BaseAttrs {
    BaseAttrs {
        id: base.id.clone(),
        x: base.x,
        y: base.y,
        rotation: base.rotation,
        scale_x: base.scale_x,
        scale_y: base.scale_y,
        opacity: base.effective_opacity(),
        editable: !base.is_locked(),
    }
}

/// Resolve the attributes common to any layer variant.
#[must_use]
pub fn base_attrs(layer: &Layer) -> BaseAttrs {
    resolve_base(layer.base())
}

/// Resolve drawing attributes for a text layer.
#[must_use]
pub fn text_attrs(layer: &TextLayer) -> TextAttrs {
    let shadow = layer.shadow_color.as_ref().map(|color| ShadowAttrs {
        color: color.clone(),
        blur: layer.shadow_blur.unwrap_or(0.0),
        offset_x: layer.shadow_offset_x.unwrap_or(0.0),
        offset_y: layer.shadow_offset_y.unwrap_or(0.0),
    });
    let stroke = layer.stroke_color.as_ref().map(|color| StrokeAttrs {
        color: color.clone(),
        width: layer.stroke_width.unwrap_or(1.0),
    });

    TextAttrs {
        base: resolve_base(&layer.base),
        text: layer.text.clone(),
        font_family: layer.font_family.clone(),
        font_size: layer.font_size,
        fill_color: layer.color.clone(),
        align: layer.align,
        font_weight: layer.font_weight,
        line_height: layer.line_height.unwrap_or(1.0),
        letter_spacing: layer.letter_spacing.unwrap_or(0.0),
        shadow,
        stroke,
    }
}

/// Resolve drawing attributes for an image layer.
#[must_use]
pub fn image_attrs(layer: &ImageLayer) -> ImageAttrs {
    ImageAttrs {
        base: resolve_base(&layer.base),
        width: layer.width,
        height: layer.height,
        crop: layer.crop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BaseLayer;

    fn sample_text() -> TextLayer {
        TextLayer {
            base: BaseLayer {
                id: LayerId::from("t1"),
                x: 10.0,
                y: 20.0,
                rotation: 15.0,
                scale_x: 2.0,
                scale_y: 0.5,
                opacity: None,
                locked: Some(true),
            },
            text: "Hi".to_string(),
            font_family: "serif".to_string(),
            font_size: 40.0,
            color: "#112233".to_string(),
            align: TextAlign::Right,
            font_weight: Some(700),
            line_height: None,
            letter_spacing: None,
            shadow_color: Some("rgba(0,0,0,0.4)".to_string()),
            shadow_blur: Some(8.0),
            shadow_offset_x: None,
            shadow_offset_y: Some(4.0),
            stroke_color: None,
            stroke_width: Some(3.0),
        }
    }

    #[test]
    fn test_base_defaults_and_editable() {
        let attrs = base_attrs(&Layer::Text(sample_text()));
        assert!((attrs.opacity - 1.0).abs() < f32::EPSILON);
        // locked layers are not editable; export ignores this flag.
        assert!(!attrs.editable);
    }

    #[test]
    fn test_text_attrs_resolution() {
        let attrs = text_attrs(&sample_text());
        assert_eq!(attrs.fill_color, "#112233");
        assert_eq!(attrs.align, TextAlign::Right);
        assert_eq!(attrs.font_weight, Some(700));
        assert!((attrs.line_height - 1.0).abs() < f32::EPSILON);

        let shadow = attrs.shadow.expect("shadow color set");
        assert!((shadow.blur - 8.0).abs() < f32::EPSILON);
        assert!((shadow.offset_x).abs() < f32::EPSILON);
        assert!((shadow.offset_y - 4.0).abs() < f32::EPSILON);

        // A stroke width without a stroke color draws nothing.
        assert!(attrs.stroke.is_none());
    }

    #[test]
    fn test_resolution_is_pure() {
        let layer = sample_text();
        assert_eq!(text_attrs(&layer), text_attrs(&layer));
    }

    #[test]
    fn test_image_attrs_exclude_pixels() {
        let layer = ImageLayer {
            base: BaseLayer::at(LayerId::from("i1"), 0.0, 0.0),
            src: "cards/u/c/assets/a.png".to_string(),
            width: Some(640.0),
            height: None,
            crop: Some(CropRect {
                x: 0.0,
                y: 0.0,
                width: 32.0,
                height: 32.0,
            }),
        };
        let attrs = image_attrs(&layer);
        assert_eq!(attrs.width, Some(640.0));
        assert_eq!(attrs.height, None);
        assert!(attrs.crop.is_some());
    }
}
