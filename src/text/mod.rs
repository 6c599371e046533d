//! Label text geometry.
//!
//! The text is laid out by an external tool: an SVG containing a `<text>`
//! element goes in, an SVG with the glyphs converted to paths comes out.
//! The outlined paths are flattened, unioned and centred on the origin.

mod inkscape;
mod svg;

use tracing::info;

pub use inkscape::Inkscape;
pub use svg::text_svg;

use crate::config::LabelOptions;
use crate::error::{LabelError, LabelResult};
use crate::geometry::{Bounds, FillRule, Outline, Point2, Region};

/// Converts the `<text>` elements of an SVG document into paths
pub trait TextOutliner {
    fn outline(&self, text_svg: &str) -> LabelResult<String>;
}

/// Text outlines centred on the origin, in mm with y pointing up
#[derive(Debug, Clone)]
pub struct TextGeometry {
    pub region: Region,
    pub bounds: Bounds,
}

impl TextGeometry {
    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }

    pub fn area(&self) -> f64 {
        self.region.area()
    }

    /// Text width plus the padding on both sides
    pub fn label_width(&self, options: &LabelOptions) -> f64 {
        self.width() + options.padding
    }

    /// Parse an outlined SVG sized in mm into centred text geometry
    pub fn from_outlined_svg(svg_data: &str, text: &str, tolerance: f64) -> LabelResult<Self> {
        // At 25.4 dpi a document sized in mm has one pixel per millimetre
        let parse_options = usvg::Options {
            dpi: 25.4,
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg_data, &parse_options)
            .map_err(|e| LabelError::InvalidOutline(e.to_string()))?;

        let outline = Outline::from_usvg_group(tree.root(), tolerance, true);
        let no_shapes = || LabelError::NoTextShapes {
            text: text.to_string(),
        };
        let raw = outline.bounds().ok_or_else(no_shapes)?;
        let center = raw.center();

        // SVG y points down
        let centred = outline.map(|p| Point2::new(p.x - center.x, center.y - p.y));
        let region = Region::fill(&centred, FillRule::NonZero)?;
        let bounds = region.bounds().ok_or_else(no_shapes)?;

        Ok(Self { region, bounds })
    }
}

/// One line of label text
#[derive(Debug, Clone)]
pub struct LabelText {
    text: String,
    geometry: Option<TextGeometry>,
}

impl LabelText {
    pub fn new(text: &str) -> LabelResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LabelError::EmptyText);
        }
        Ok(Self {
            text: text.to_string(),
            geometry: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Outline the text with `outliner` and keep the resulting geometry
    pub fn create_text(
        &mut self,
        outliner: &dyn TextOutliner,
        options: &LabelOptions,
    ) -> LabelResult<&TextGeometry> {
        if let Some(font) = &options.font_file {
            if !font.exists() {
                return Err(LabelError::FontNotFound { path: font.clone() });
            }
        }

        let input = text_svg(&self.text, options)?;
        let outlined = outliner.outline(&input)?;
        let geometry = TextGeometry::from_outlined_svg(&outlined, &self.text, options.tolerance)?;

        info!(
            text = %self.text,
            width = geometry.width(),
            height = geometry.height(),
            "text outlined"
        );

        Ok(self.geometry.insert(geometry))
    }

    pub fn geometry(&self) -> Option<&TextGeometry> {
        self.geometry.as_ref()
    }

    /// Text width plus padding; `None` before [`LabelText::create_text`]
    pub fn label_width(&self, options: &LabelOptions) -> Option<f64> {
        self.geometry.as_ref().map(|g| g.label_width(options))
    }
}
