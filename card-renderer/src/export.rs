//! Card export to image formats.
//!
//! Renders a [`RenderTree`] to SVG, then rasterizes to PNG or JPEG through the
//! resvg/tiny-skia pipeline (behind the `export` feature). Selection and drag
//! state are editor chrome and never appear in the output.

use std::fmt::{self, Write};
use std::str::FromStr;
#[cfg(feature = "export")]
use std::sync::{Arc, OnceLock};

use card_core::projection::{BackgroundFill, Primitive, RenderNode, RenderTree, Stroke};
#[cfg(feature = "export")]
use image::ImageEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Fill and outline of the empty-state QR box.
const PLACEHOLDER_FILL: &str = "#f3f4f6";
const PLACEHOLDER_STROKE: &str = "#9ca3af";

/// System fonts, loaded on first rasterization and shared by every
/// exporter. Without them usvg drops every `<text>` node.
#[cfg(feature = "export")]
fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut fonts = usvg::fontdb::Database::new();
        fonts.load_system_fonts();
        tracing::debug!(faces = fonts.len(), "Loaded system fonts");
        Arc::new(fonts)
    }))
}

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG vector graphics (the SVG XML string as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Configuration for card export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Scale factor applied to the canvas size (2.0 gives a retina-sized
    /// image).
    pub scale: f32,
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    /// RGB used to flatten transparency for JPEG.
    pub matte: [u8; 3],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 85,
            matte: [255, 255, 255],
        }
    }
}

/// Exports a [`RenderTree`] to image formats.
#[derive(Debug, Clone, Default)]
pub struct CardExporter {
    config: ExportConfig,
}

impl CardExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a card to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if the card cannot be rendered or encoded, or if the
    /// format needs the `export` feature and it is disabled.
    pub fn export(&self, tree: &RenderTree, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Svg => Ok(self.render_to_svg(tree).into_bytes()),
            #[cfg(feature = "export")]
            ExportFormat::Png => self.render_to_png(tree),
            #[cfg(feature = "export")]
            ExportFormat::Jpeg => self.render_to_jpeg(tree),
            #[cfg(not(feature = "export"))]
            ExportFormat::Png | ExportFormat::Jpeg => {
                Err(RenderError::UnsupportedFormat(format.to_string()))
            }
        }
    }

    /// Output size `(width, height)` in pixels.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn output_dimensions(&self, tree: &RenderTree) -> (u32, u32) {
        let scale = if self.config.scale > 0.0 {
            self.config.scale
        } else {
            1.0
        };
        let out_w = (tree.width.max(1) as f32 * scale).round() as u32;
        let out_h = (tree.height.max(1) as f32 * scale).round() as u32;
        (out_w.max(1), out_h.max(1))
    }

    /// Render the card to an SVG string.
    #[must_use]
    pub fn render_to_svg(&self, tree: &RenderTree) -> String {
        let (out_w, out_h) = self.output_dimensions(tree);
        let (view_w, view_h) = (tree.width.max(1), tree.height.max(1));

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );

        render_background_svg(&mut svg, &tree.background);

        for node in tree.paint_order() {
            render_node_svg(&mut svg, node);
        }

        svg.push_str("</svg>");
        svg
    }

    /// Export the card to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[cfg(feature = "export")]
    pub fn render_to_png(&self, tree: &RenderTree) -> RenderResult<Vec<u8>> {
        let pixmap = Self::rasterize_svg(&self.render_to_svg(tree))?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Export the card to JPEG bytes, flattening transparency onto the
    /// configured matte.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[cfg(feature = "export")]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, tree: &RenderTree) -> RenderResult<Vec<u8>> {
        let pixmap = Self::rasterize_svg(&self.render_to_svg(tree))?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let matte = &self.config.matte;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        // tiny-skia pixels are premultiplied.
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for channel in 0..3 {
                let value = f32::from(matte[channel]).mul_add(inv, f32::from(pixel[channel]));
                rgb_data.push(value.min(255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf,
            self.config.jpeg_quality.clamp(1, 100),
        );
        encoder
            .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[cfg(feature = "export")]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: system_fonts(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

/// Fill the canvas with the background color or gradient.
fn render_background_svg(svg: &mut String, background: &BackgroundFill) {
    match background {
        BackgroundFill::Solid { color } => {
            let _ = write!(
                svg,
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(color),
            );
        }
        BackgroundFill::LinearGradient { angle, stops } => {
            // CSS angles run clockwise from "to top".
            let radians = angle.to_radians();
            let (dx, dy) = (radians.sin() / 2.0, -radians.cos() / 2.0);
            let _ = write!(
                svg,
                "<defs><linearGradient id=\"background\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                0.5 - dx,
                0.5 - dy,
                0.5 + dx,
                0.5 + dy,
            );
            for (color, offset) in stops {
                let _ = write!(
                    svg,
                    "<stop offset=\"{offset}\" stop-color=\"{}\"/>",
                    escape_xml(color),
                );
            }
            svg.push_str("</linearGradient></defs>");
            svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"url(#background)\"/>");
        }
    }
}

/// Render a single node to SVG.
fn render_node_svg(svg: &mut String, node: &RenderNode) {
    let b = &node.bounds;

    match &node.primitive {
        Primitive::Text {
            content,
            font_size,
            font_weight,
            color,
            font_family,
        } => {
            // Anchor the baseline one em below the top edge.
            #[allow(clippy::cast_precision_loss)]
            let text_y = b.y + *font_size as f32;
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{text_y}\" font-size=\"{font_size}\" font-weight=\"{}\" fill=\"{}\" font-family=\"{}\">{}</text>",
                b.x,
                font_weight.as_str(),
                escape_xml(color),
                escape_xml(font_family),
                escape_xml(content),
            );
        }

        Primitive::Rectangle { fill, stroke } => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>",
                b.x,
                b.y,
                b.width,
                b.height,
                escape_xml(fill),
                stroke_attrs(stroke.as_ref()),
            );
        }

        Primitive::Ellipse { fill, stroke } => {
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"{}\"{}/>",
                b.x + b.width / 2.0,
                b.y + b.height / 2.0,
                b.width / 2.0,
                b.height / 2.0,
                escape_xml(fill),
                stroke_attrs(stroke.as_ref()),
            );
        }

        Primitive::Triangle { fill } => {
            let _ = write!(
                svg,
                "<polygon points=\"{},{} {},{} {},{}\" fill=\"{}\"/>",
                b.x + b.width / 2.0,
                b.y,
                b.x + b.width,
                b.y + b.height,
                b.x,
                b.y + b.height,
                escape_xml(fill),
            );
        }

        Primitive::QrImage { bitmap } => {
            let _ = write!(
                svg,
                "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" href=\"{}\"/>",
                b.x,
                b.y,
                b.width,
                b.height,
                escape_xml(bitmap.as_str()),
            );
        }

        Primitive::QrPlaceholder => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{PLACEHOLDER_FILL}\" stroke=\"{PLACEHOLDER_STROKE}\" stroke-width=\"2\" stroke-dasharray=\"6 4\"/>",
                b.x, b.y, b.width, b.height,
            );
        }
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    stroke.map_or_else(String::new, |s| {
        format!(
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape_xml(&s.color),
            s.width
        )
    })
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
    use card_core::{
        project, Document, Element, ElementKind, InteractionView, SceneStore, ShapeProps,
        TextProps,
    };

    fn tree_with(elements: Vec<Element>, background: &str) -> RenderTree {
        let store = SceneStore::new(Document::new(200, 100));
        for element in elements {
            store.add_element(element).expect("add");
        }
        store.set_background(background);
        project(&store.snapshot(), &InteractionView::default())
    }

    fn text(content: &str) -> Element {
        Element::new(
            "text-1",
            10.0,
            20.0,
            ElementKind::Text(TextProps {
                content: content.to_string(),
                font_size: 16,
                font_weight: card_core::FontWeight::Bold,
                color: "#111827".to_string(),
                font_family: "Inter, sans-serif".to_string(),
            }),
        )
    }

    fn shape(id: &str, kind: fn(ShapeProps) -> ElementKind, border: i32) -> Element {
        Element::new(
            id,
            5.0,
            5.0,
            kind(ShapeProps {
                width: 40,
                height: 20,
                color: "#3b82f6".to_string(),
                border_width: Some(border),
                border_color: Some("#000000".to_string()),
            }),
        )
    }

    #[test]
    fn test_svg_export_empty_card() {
        let tree = tree_with(Vec::new(), "#ffffff");
        let exporter = CardExporter::new(ExportConfig {
            scale: 1.0,
            ..ExportConfig::default()
        });
        let svg = exporter.render_to_svg(&tree);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"200\""));
        assert!(svg.contains("height=\"100\""));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_default_scale_doubles_output() {
        let tree = tree_with(Vec::new(), "#ffffff");
        let svg = CardExporter::default().render_to_svg(&tree);
        assert!(svg.contains("width=\"400\""));
        assert!(svg.contains("height=\"200\""));
        assert!(svg.contains("viewBox=\"0 0 200 100\""));
    }

    #[test]
    fn test_text_attributes() {
        let tree = tree_with(vec![text("A < B & C")], "#ffffff");
        let svg = CardExporter::default().render_to_svg(&tree);
        assert!(svg.contains("A &lt; B &amp; C"));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains("y=\"36\""));
    }

    #[test]
    fn test_shapes() {
        let tree = tree_with(
            vec![
                shape("rectangle-1", ElementKind::Rectangle, 2),
                shape("circle-1", ElementKind::Circle, 0),
                shape("triangle-1", ElementKind::Triangle, 3),
            ],
            "#ffffff",
        );
        let svg = CardExporter::default().render_to_svg(&tree);
        assert!(svg.contains("<rect x=\"5\" y=\"5\" width=\"40\" height=\"20\" fill=\"#3b82f6\" stroke=\"#000000\" stroke-width=\"2\"/>"));
        assert!(svg.contains("<ellipse cx=\"25\" cy=\"15\" rx=\"20\" ry=\"10\" fill=\"#3b82f6\"/>"));
        assert!(svg.contains("<polygon points=\"25,5 45,25 5,25\""));
    }

    #[test]
    fn test_gradient_background() {
        let tree = tree_with(
            Vec::new(),
            "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
        );
        let svg = CardExporter::default().render_to_svg(&tree);
        assert!(svg.contains("<linearGradient id=\"background\""));
        assert!(svg.contains("stop-color=\"#667eea\""));
        assert!(svg.contains("fill=\"url(#background)\""));
    }

    #[test]
    fn test_qr_placeholder_without_bitmap() {
        let qr = Element::new(
            "qr-1",
            10.0,
            10.0,
            ElementKind::Qr(card_core::QrProps {
                size: 60,
                qr_data: String::new(),
            }),
        );
        let svg = CardExporter::default().render_to_svg(&tree_with(vec![qr], "#ffffff"));
        assert!(svg.contains(PLACEHOLDER_FILL));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>().expect("png"), ExportFormat::Png);
        assert_eq!("jpg".parse::<ExportFormat>().expect("jpg"), ExportFormat::Jpeg);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[cfg(feature = "export")]
    #[test]
    fn test_png_export_produces_valid_bytes() {
        let tree = tree_with(vec![shape("rectangle-1", ElementKind::Rectangle, 1)], "#ffffff");
        let png = CardExporter::default()
            .export(&tree, ExportFormat::Png)
            .expect("png export");

        // PNG magic bytes: \x89PNG
        assert!(png.len() > 8);
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[cfg(feature = "export")]
    #[test]
    fn test_png_export_draws_text() {
        let mut element = text("HELLO WORLD");
        if let ElementKind::Text(props) = &mut element.kind {
            props.font_size = 40;
            props.color = "#000000".to_string();
        }
        let tree = tree_with(vec![element], "#ffffff");
        let png = CardExporter::new(ExportConfig {
            scale: 1.0,
            ..ExportConfig::default()
        })
        .export(&tree, ExportFormat::Png)
        .expect("png export");

        let image = image::load_from_memory(&png).expect("decode").to_rgba8();
        let dark = image
            .pixels()
            .filter(|pixel| pixel.0[..3].iter().all(|&channel| channel < 128))
            .count();
        assert!(dark > 0, "text left no dark pixels");
    }

    #[cfg(feature = "export")]
    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let tree = tree_with(Vec::new(), "linear-gradient(135deg, #43e97b 0%, #38f9d7 100%)");
        let jpeg = CardExporter::default()
            .export(&tree, ExportFormat::Jpeg)
            .expect("jpeg export");

        // JPEG magic bytes: FFD8
        assert!(jpeg.len() > 2);
        assert_eq!(jpeg[0], 0xFF);
        assert_eq!(jpeg[1], 0xD8);
    }
}
