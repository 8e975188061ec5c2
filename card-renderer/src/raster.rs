//! Headless face rasterization.
//!
//! Reproduces a card face off-screen, independent of any interactive
//! canvas state: layers are painted strictly in array order through the
//! shared attribute resolver, onto an SVG intermediate that resvg
//! rasterizes into a tiny-skia pixmap, which is then encoded as lossless
//! PNG.
//!
//! Image layers draw only when their storage reference has decoded pixels
//! bound in the [`PixelSource`]; an unbound or unusable reference skips
//! that layer and nothing else.

use std::collections::HashMap;
use std::fmt::Write;

use card_core::{
    image_attrs, text_attrs, Face, Layer, TextAlign, CARD_HEIGHT_PX, CARD_WIDTH_PX,
};

use crate::error::{RenderError, RenderResult};
use crate::image::{crop_pixels, to_png_data_uri, PixelData};

/// Decoded pixels bound per storage reference for one render pass.
///
/// Export builds a fresh one from newly fetched bytes; interactive
/// surfaces fill one from their live asset cache. Either way the
/// rasterizer itself never does I/O.
#[derive(Debug, Default)]
pub struct PixelSource {
    pixels: HashMap<String, PixelData>,
}

impl PixelSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind decoded pixels to a storage reference.
    pub fn insert(&mut self, src: impl Into<String>, pixels: PixelData) {
        self.pixels.insert(src.into(), pixels);
    }

    /// Look up decoded pixels for a storage reference.
    #[must_use]
    pub fn get(&self, src: &str) -> Option<&PixelData> {
        self.pixels.get(src)
    }

    /// Number of bound references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether no references are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Rasterizes one face to a fixed-size bitmap.
pub struct FaceRasterizer {
    width: u32,
    height: u32,
}

impl FaceRasterizer {
    /// Create a rasterizer at the canonical card dimensions (1536x2048).
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(CARD_WIDTH_PX, CARD_HEIGHT_PX)
    }

    /// Create a rasterizer with explicit surface dimensions.
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Render a face to the SVG intermediate.
    ///
    /// An opaque white background is painted first so layers that leave
    /// transparent regions still composite correctly downstream, then
    /// layers in array order (index 0 furthest back).
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be assembled.
    pub fn render_svg(&self, face: &Face, pixels: &PixelSource) -> RenderResult<String> {
        let (w, h) = (self.width, self.height);
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );

        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");

        for layer in &face.layers {
            render_layer_svg(&mut svg, layer, pixels);
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Render a face to lossless PNG bytes.
    ///
    /// The backing pixmap surface is released when this returns,
    /// regardless of success or failure.
    ///
    /// # Errors
    ///
    /// Returns an error if SVG assembly, rasterization, or PNG encoding
    /// fails.
    pub fn render_png(&self, face: &Face, pixels: &PixelSource) -> RenderResult<Vec<u8>> {
        let svg = self.render_svg(face, pixels)?;
        let pixmap = self.rasterize(&svg)?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Rasterize an SVG string onto a fresh pixmap surface.
    fn rasterize(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(self.width, self.height)
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl Default for FaceRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a single layer to SVG, resolving styling through the shared
/// attribute functions.
fn render_layer_svg(svg: &mut String, layer: &Layer, pixels: &PixelSource) {
    match layer {
        Layer::Text(text) => render_text_svg(svg, text),
        Layer::Image(image) => render_image_svg(svg, image, pixels),
    }
}

fn render_text_svg(svg: &mut String, layer: &card_core::TextLayer) {
    let attrs = text_attrs(layer);
    let base = &attrs.base;

    let filter_ref = if let Some(shadow) = &attrs.shadow {
        let id = escape_xml(base.id.as_str());
        let color = escape_xml(&shadow.color);
        // Canvas shadowBlur corresponds to twice the Gaussian deviation.
        let deviation = shadow.blur / 2.0;
        let _ = write!(
            svg,
            "<defs><filter id=\"shadow-{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
             <feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{deviation}\" flood-color=\"{color}\"/>\
             </filter></defs>",
            shadow.offset_x, shadow.offset_y,
        );
        format!(" filter=\"url(#shadow-{id})\"")
    } else {
        String::new()
    };

    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({}) scale({} {})\"",
        base.x, base.y, base.rotation, base.scale_x, base.scale_y,
    );
    if base.opacity < 1.0 {
        let _ = write!(svg, " opacity=\"{}\"", base.opacity);
    }
    svg.push('>');

    let anchor = match attrs.align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    };
    let fill = escape_xml(&attrs.fill_color);
    let family = escape_xml(&attrs.font_family);
    let _ = write!(
        svg,
        "<text font-family=\"{family}\" font-size=\"{}\" fill=\"{fill}\" text-anchor=\"{anchor}\"",
        attrs.font_size,
    );
    if let Some(weight) = attrs.font_weight {
        let _ = write!(svg, " font-weight=\"{weight}\"");
    }
    if attrs.letter_spacing.abs() > f32::EPSILON {
        let _ = write!(svg, " letter-spacing=\"{}\"", attrs.letter_spacing);
    }
    if let Some(stroke) = &attrs.stroke {
        let stroke_color = escape_xml(&stroke.color);
        let _ = write!(
            svg,
            " stroke=\"{stroke_color}\" stroke-width=\"{}\"",
            stroke.width,
        );
    }
    if !filter_ref.is_empty() {
        svg.push_str(&filter_ref);
    }
    svg.push('>');

    // The layer origin is the top-left corner; SVG positions text by
    // baseline, so the first line sits one font-size down.
    let line_advance = attrs.line_height * attrs.font_size;
    for (index, line) in attrs.text.lines().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = attrs.font_size + line_advance * index as f32;
        let escaped = escape_xml(line);
        let _ = write!(svg, "<tspan x=\"0\" y=\"{y}\">{escaped}</tspan>");
    }

    svg.push_str("</text></g>");
}

fn render_image_svg(svg: &mut String, layer: &card_core::ImageLayer, pixels: &PixelSource) {
    let attrs = image_attrs(layer);
    let base = &attrs.base;

    let Some(source) = pixels.get(&layer.src) else {
        // No pixels bound for this reference: the layer simply does not
        // paint. Export logs the cause when fetching/decoding.
        tracing::debug!("no pixel data bound for {}, skipping layer {}", layer.src, base.id);
        return;
    };

    let bound = if let Some(crop) = &attrs.crop {
        match crop_pixels(source, crop) {
            Ok(cropped) => cropped,
            Err(e) => {
                tracing::warn!("unusable crop on layer {}: {e}, skipping", base.id);
                return;
            }
        }
    } else {
        source.clone()
    };

    let href = match to_png_data_uri(&bound) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!("failed to embed pixels for layer {}: {e}, skipping", base.id);
            return;
        }
    };

    #[allow(clippy::cast_precision_loss)]
    let width = attrs.width.unwrap_or(bound.width as f32);
    #[allow(clippy::cast_precision_loss)]
    let height = attrs.height.unwrap_or(bound.height as f32);

    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({}) scale({} {})\"",
        base.x, base.y, base.rotation, base.scale_x, base.scale_y,
    );
    if base.opacity < 1.0 {
        let _ = write!(svg, " opacity=\"{}\"", base.opacity);
    }
    svg.push('>');

    let _ = write!(
        svg,
        "<image x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" href=\"{href}\"/>",
    );

    svg.push_str("</g>");
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::create_solid_color;
    use card_core::{BaseLayer, ImageLayer, LayerId, TextLayer};

    fn text_layer(id: &str, content: &str) -> Layer {
        Layer::Text(TextLayer {
            base: BaseLayer::at(LayerId::from(id), 10.0, 20.0),
            text: content.to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            color: "#000000".to_string(),
            align: TextAlign::Left,
            font_weight: None,
            line_height: None,
            letter_spacing: None,
            shadow_color: None,
            shadow_blur: None,
            shadow_offset_x: None,
            shadow_offset_y: None,
            stroke_color: None,
            stroke_width: None,
        })
    }

    fn image_layer(id: &str, src: &str) -> Layer {
        Layer::Image(ImageLayer {
            base: BaseLayer::at(LayerId::from(id), 0.0, 0.0),
            src: src.to_string(),
            width: None,
            height: None,
            crop: None,
        })
    }

    fn full_cover_source(srcs_and_colors: &[(&str, [u8; 4])]) -> PixelSource {
        let mut pixels = PixelSource::new();
        for (src, c) in srcs_and_colors {
            pixels.insert(*src, create_solid_color(16, 16, c[0], c[1], c[2], c[3]));
        }
        pixels
    }

    fn center_pixel(png: &[u8]) -> [u8; 4] {
        let img = image::load_from_memory(png).expect("valid png").to_rgba8();
        let p = img.get_pixel(img.width() / 2, img.height() / 2);
        p.0
    }

    #[test]
    fn test_svg_empty_face_has_white_background() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let svg = rasterizer
            .render_svg(&Face::default(), &PixelSource::new())
            .expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_canonical_dimensions() {
        let rasterizer = FaceRasterizer::new();
        let png = rasterizer
            .render_png(&Face::default(), &PixelSource::new())
            .expect("png");
        let img = image::load_from_memory(&png).expect("valid png");
        assert_eq!(img.width(), 1536);
        assert_eq!(img.height(), 2048);
    }

    #[test]
    fn test_text_rendered_into_svg() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let face = Face {
            layers: vec![text_layer("t1", "Hello World")],
        };
        let svg = rasterizer
            .render_svg(&face, &PixelSource::new())
            .expect("svg");
        assert!(svg.contains("Hello World"));
        assert!(svg.contains("font-size=\"16\""));
        assert!(svg.contains("text-anchor=\"start\""));
    }

    #[test]
    fn test_multiline_text_spans_lines() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let face = Face {
            layers: vec![text_layer("t1", "one\ntwo")],
        };
        let svg = rasterizer
            .render_svg(&face, &PixelSource::new())
            .expect("svg");
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn test_xml_escaping() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let face = Face {
            layers: vec![text_layer("t1", "A < B & C > D")],
        };
        let svg = rasterizer
            .render_svg(&face, &PixelSource::new())
            .expect("svg");
        assert!(svg.contains("A &lt; B &amp; C &gt; D"));
    }

    #[test]
    fn test_layers_paint_in_array_order() {
        let rasterizer = FaceRasterizer::with_size(16, 16);
        let pixels = full_cover_source(&[
            ("cards/u/c/assets/red.png", [255, 0, 0, 255]),
            ("cards/u/c/assets/blue.png", [0, 0, 255, 255]),
        ]);

        let face = Face {
            layers: vec![
                image_layer("a", "cards/u/c/assets/red.png"),
                image_layer("b", "cards/u/c/assets/blue.png"),
            ],
        };
        let png = rasterizer.render_png(&face, &pixels).expect("png");
        // The last layer paints on top.
        assert_eq!(center_pixel(&png), [0, 0, 255, 255]);

        let swapped = Face {
            layers: vec![
                image_layer("b", "cards/u/c/assets/blue.png"),
                image_layer("a", "cards/u/c/assets/red.png"),
            ],
        };
        let png = rasterizer.render_png(&swapped, &pixels).expect("png");
        assert_eq!(center_pixel(&png), [255, 0, 0, 255]);
    }

    #[test]
    fn test_unbound_image_reference_skips_layer_only() {
        let rasterizer = FaceRasterizer::with_size(16, 16);
        let pixels = full_cover_source(&[("cards/u/c/assets/red.png", [255, 0, 0, 255])]);

        let face = Face {
            layers: vec![
                image_layer("a", "cards/u/c/assets/red.png"),
                image_layer("missing", "cards/u/c/assets/gone.png"),
            ],
        };
        let svg = rasterizer.render_svg(&face, &pixels).expect("svg");
        // One image painted, the unresolved one skipped.
        assert_eq!(svg.matches("<image").count(), 1);

        let png = rasterizer.render_png(&face, &pixels).expect("png");
        assert_eq!(center_pixel(&png), [255, 0, 0, 255]);
    }

    #[test]
    fn test_image_only_render_is_deterministic() {
        let rasterizer = FaceRasterizer::with_size(16, 16);
        let pixels = full_cover_source(&[("cards/u/c/assets/red.png", [255, 0, 0, 255])]);
        let face = Face {
            layers: vec![image_layer("a", "cards/u/c/assets/red.png")],
        };

        let first = rasterizer.render_png(&face, &pixels).expect("png");
        let second = rasterizer.render_png(&face, &pixels).expect("png");
        assert_eq!(first, second);
    }

    #[test]
    fn test_opacity_and_transform_emitted() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let mut layer = text_layer("t1", "Hi");
        {
            let base = layer.base_mut();
            base.rotation = 45.0;
            base.opacity = Some(0.25);
        }
        let face = Face {
            layers: vec![layer],
        };
        let svg = rasterizer
            .render_svg(&face, &PixelSource::new())
            .expect("svg");
        assert!(svg.contains("rotate(45)"));
        assert!(svg.contains("opacity=\"0.25\""));
    }

    #[test]
    fn test_shadow_emits_filter() {
        let rasterizer = FaceRasterizer::with_size(64, 64);
        let Layer::Text(mut text) = text_layer("t1", "Hi") else {
            unreachable!()
        };
        text.shadow_color = Some("#333333".to_string());
        text.shadow_blur = Some(6.0);
        let face = Face {
            layers: vec![Layer::Text(text)],
        };
        let svg = rasterizer
            .render_svg(&face, &PixelSource::new())
            .expect("svg");
        assert!(svg.contains("feDropShadow"));
        assert!(svg.contains("stdDeviation=\"3\""));
        assert!(svg.contains("filter=\"url(#shadow-t1)\""));
    }
}
