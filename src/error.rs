//! Error types for label generation.
//!
//! Every failure is terminal: the CLI prints the error, its cause chain and
//! the [`LabelError::hint`] text, then exits with status 1.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for label operations.
pub type LabelResult<T> = Result<T, LabelError>;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label text is empty")]
    EmptyText,

    #[error("profile file not found: {path}")]
    ProfileNotFound { path: PathBuf },

    #[error("invalid profile {path}: {details}")]
    InvalidProfile { path: PathBuf, details: String },

    #[error("font file not found: {path}")]
    FontNotFound { path: PathBuf },

    #[error("external tool not found: {program}")]
    ToolNotFound { program: String },

    #[error("external tool {program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to build text SVG: {0}")]
    TextSvg(String),

    #[error("outlined SVG is not valid: {0}")]
    InvalidOutline(String),

    #[error("no shapes produced for text \"{text}\"")]
    NoTextShapes { text: String },

    #[error("could not find planar front face with edge length ~{length}mm (±{tolerance}mm)")]
    FrontFaceNotFound { length: f64, tolerance: f64 },

    #[error(
        "text is {text_width:.2} x {text_height:.2}mm but the front face is only {face_width:.2} x {face_length:.2}mm"
    )]
    TextDoesNotFit {
        text_width: f64,
        text_height: f64,
        face_width: f64,
        face_length: f64,
    },

    #[error("recess is {depth:.2}mm deep but the front wall is only {wall:.2}mm thick")]
    RecessTooDeep { depth: f64, wall: f64 },

    #[error("{name} must be positive, got {value}")]
    InvalidOption { name: &'static str, value: f64 },

    #[error("tessellation failed: {0}")]
    Tessellation(String),

    #[error("STEP export failed: {0}")]
    StepExport(String),

    #[error("batch file {path} contains no labels")]
    EmptyBatch { path: PathBuf },

    #[error("failed to read {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LabelError {
    /// A short, actionable suggestion for the user.
    pub fn hint(&self) -> &'static str {
        match self {
            LabelError::EmptyText => "Pass non-empty label text, or remove blank labels",
            LabelError::ProfileNotFound { .. } => {
                "Pass --profile with the path to the cross-section SVG"
            }
            LabelError::InvalidProfile { .. } => {
                "The profile must be an SVG whose first path is a closed, filled shape"
            }
            LabelError::FontNotFound { .. } => {
                "Check the --font path, or drop it to use a system font via --font-family"
            }
            LabelError::ToolNotFound { .. } => {
                "Install Inkscape (https://inkscape.org/) or pass --inkscape <path>"
            }
            LabelError::ToolFailed { .. } => {
                "Run the Inkscape command by hand to see whether the font is available"
            }
            LabelError::TextSvg(_) | LabelError::InvalidOutline(_) => {
                "Check that Inkscape converted the text to paths (--export-text-to-path)"
            }
            LabelError::NoTextShapes { .. } => {
                "The font may not contain glyphs for this text; try another --font-family"
            }
            LabelError::FrontFaceNotFound { .. } => {
                "The profile needs a straight edge matching the front face length"
            }
            LabelError::TextDoesNotFit { .. } => {
                "Use a smaller --font-size or shorter text, and keep --padding above zero"
            }
            LabelError::RecessTooDeep { .. } => "Use a smaller --text-depth",
            LabelError::InvalidOption { .. } => "Pass a value greater than zero",
            LabelError::Tessellation(_) => "Simplify the profile or text outlines",
            LabelError::StepExport(_) => "Try --format stl",
            LabelError::EmptyBatch { .. } => "Put one label per line in the batch file",
            LabelError::IoRead { .. } => "Check that the file exists and is readable",
            LabelError::IoWrite { .. } => "Check that the output directory exists and is writable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_message() {
        let err = LabelError::ToolNotFound {
            program: "inkscape".to_string(),
        };
        assert_eq!(err.to_string(), "external tool not found: inkscape");
        assert!(err.hint().contains("--inkscape"));
    }

    #[test]
    fn test_text_does_not_fit_reports_both_sides() {
        let err = LabelError::TextDoesNotFit {
            text_width: 42.0,
            text_height: 11.5,
            face_width: 42.0,
            face_length: 27.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("42.00 x 11.50mm"));
        assert!(msg.contains("42.00 x 27.50mm"));
        assert!(err.hint().contains("--padding"));
    }

    #[test]
    fn test_front_face_message() {
        let err = LabelError::FrontFaceNotFound {
            length: 27.5,
            tolerance: 1.0,
        };
        assert!(err.to_string().contains("27.5mm"));
    }
}
