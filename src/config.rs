use std::path::PathBuf;

use crate::error::{LabelError, LabelResult};

/// Dimensions and tunables for one label.
///
/// Defaults describe the stock toolbox clip: an SVG cross-section scaled to
/// 37.7mm deep by 28.86mm high whose front face is the 27.5mm edge.
#[derive(Debug, Clone)]
pub struct LabelOptions {
    /// Depth (extent of the SVG X axis) of the scaled profile, in mm
    pub profile_depth: f64,
    /// Height (extent of the SVG Y axis) of the scaled profile, in mm
    pub profile_height: f64,
    /// Length of the profile edge that carries the text
    pub front_face_length: f64,
    /// Allowed deviation when matching `front_face_length`
    pub front_face_tolerance: f64,
    /// Font size in mm
    pub font_size: f64,
    /// Font family passed to the outlining tool
    pub font_family: String,
    /// Optional font file, referenced through `@font-face`
    pub font_file: Option<PathBuf>,
    /// Extra label width around the text (total, both sides)
    pub padding: f64,
    /// Depth of the text insert
    pub text_depth: f64,
    /// Recess depth beyond the insert
    pub recess_clearance: f64,
    /// Curve flattening tolerance in mm
    pub tolerance: f64,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            profile_depth: 37.7,
            profile_height: 28.86,
            front_face_length: 27.5,
            front_face_tolerance: 1.0,
            font_size: 16.0,
            font_family: "sans-serif".to_string(),
            font_file: None,
            padding: 20.0,
            text_depth: 0.8,
            recess_clearance: 0.1,
            tolerance: 0.02,
        }
    }
}

impl LabelOptions {
    /// Total depth of the recess cut into the body.
    pub fn recess_depth(&self) -> f64 {
        self.text_depth + self.recess_clearance
    }

    /// Reject sizes that would give an empty or inside-out label
    pub fn validate(&self) -> LabelResult<()> {
        let positive = [
            ("font size", self.font_size),
            ("text depth", self.text_depth),
            ("padding", self.padding),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in positive {
            // NaN fails this too
            if !(value > 0.0) {
                return Err(LabelError::InvalidOption { name, value });
            }
        }
        if !(self.recess_clearance >= 0.0) {
            return Err(LabelError::InvalidOption {
                name: "recess clearance",
                value: self.recess_clearance,
            });
        }
        Ok(())
    }
}
