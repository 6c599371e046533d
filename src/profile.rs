//! SVG cross-section import and scaling.
//!
//! The first path of the profile SVG is the clip cross-section. Its SVG X
//! extent becomes the label depth and its SVG Y extent the label height.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::LabelOptions;
use crate::error::{LabelError, LabelResult};
use crate::geometry::{Bounds, FillRule, Outline, Point2, Region, path_outlines};

/// Raw cross-section as read from the SVG
#[derive(Debug, Clone)]
pub struct ClipProfile {
    pub svg_path: PathBuf,
    pub outline: Outline,
    pub bounds: Bounds,
}

/// Cross-section in millimetres: x is depth, y is height
#[derive(Debug, Clone)]
pub struct ScaledProfile {
    pub region: Region,
    pub bounds: Bounds,
}

/// The profile edge that becomes the text-carrying face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontFace {
    pub loop_index: usize,
    pub edge_index: usize,
    pub start: Point2,
    pub end: Point2,
}

impl FrontFace {
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Unit normal pointing out of the material
    pub fn outward(&self) -> Point2 {
        let d = self.end - self.start;
        let len = d.length();
        Point2::new(d.y / len, -d.x / len)
    }
}

impl ClipProfile {
    pub fn load(path: impl AsRef<Path>, tolerance: f64) -> LabelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LabelError::ProfileNotFound {
                path: path.to_path_buf(),
            });
        }
        let svg_data = std::fs::read_to_string(path).map_err(|e| LabelError::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_svg_str(&svg_data, path, tolerance)
    }

    pub fn from_svg_str(svg_data: &str, path: &Path, tolerance: f64) -> LabelResult<Self> {
        let invalid = |details: String| LabelError::InvalidProfile {
            path: path.to_path_buf(),
            details,
        };

        let tree = usvg::Tree::from_str(svg_data, &usvg::Options::default())
            .map_err(|e| invalid(format!("failed to parse SVG: {}", e)))?;

        let outline = path_outlines(tree.root(), tolerance)
            .into_iter()
            .find(|o| !o.is_empty())
            .ok_or_else(|| invalid("no shapes found".to_string()))?;

        let bounds = outline
            .bounds()
            .filter(|b| b.width() > 0.0 && b.height() > 0.0)
            .ok_or_else(|| invalid("shape has zero width or height".to_string()))?;

        debug!(
            contours = outline.contours.len(),
            width = bounds.width(),
            height = bounds.height(),
            "loaded profile outline"
        );

        Ok(Self {
            svg_path: path.to_path_buf(),
            outline,
            bounds,
        })
    }

    /// Scale from SVG units to millimetres with height pointing up
    pub fn scale_to_dimensions(&self, options: &LabelOptions) -> LabelResult<ScaledProfile> {
        let b = self.bounds;
        let sx = options.profile_depth / b.width();
        let sy = options.profile_height / b.height();

        let scaled = self
            .outline
            .map(|p| Point2::new((p.x - b.min_x) * sx, (b.max_y - p.y) * sy));

        let region = Region::fill(&scaled, FillRule::NonZero)?.simplified()?;
        if region.is_empty() {
            return Err(LabelError::InvalidProfile {
                path: self.svg_path.clone(),
                details: "profile encloses no area".to_string(),
            });
        }

        let bounds = region.bounds().unwrap_or(Bounds::new(
            0.0,
            0.0,
            options.profile_depth,
            options.profile_height,
        ));

        info!(
            depth = bounds.width(),
            height = bounds.height(),
            area = region.area(),
            "profile scaled"
        );

        Ok(ScaledProfile { region, bounds })
    }
}

impl ScaledProfile {
    pub fn area(&self) -> f64 {
        self.region.area()
    }

    /// Find the planar side face whose profile edge matches the front face
    /// length; the largest such face wins.
    pub fn find_front_face(&self, label_width: f64, options: &LabelOptions) -> LabelResult<FrontFace> {
        let mut best: Option<(f64, FrontFace)> = None;

        for (loop_index, lp) in self.region.loops.iter().enumerate() {
            for edge_index in 0..lp.len() {
                let face = FrontFace {
                    loop_index,
                    edge_index,
                    start: self.region.vertices[lp[edge_index]],
                    end: self.region.vertices[lp[(edge_index + 1) % lp.len()]],
                };
                let length = face.length();
                if (length - options.front_face_length).abs() >= options.front_face_tolerance {
                    continue;
                }
                let area = length * label_width;
                if best.as_ref().is_none_or(|(a, _)| area > *a) {
                    best = Some((area, face));
                }
            }
        }

        best.map(|(_, face)| face)
            .ok_or(LabelError::FrontFaceNotFound {
                length: options.front_face_length,
                tolerance: options.front_face_tolerance,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
        <rect x="10" y="10" width="20" height="80" fill="black"/>
    </svg>"#;

    fn options() -> LabelOptions {
        LabelOptions {
            profile_depth: 4.0,
            profile_height: 27.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_scale_to_dimensions() {
        let profile = ClipProfile::from_svg_str(PLATE, Path::new("plate.svg"), 0.01).unwrap();
        let scaled = profile.scale_to_dimensions(&options()).unwrap();
        assert!((scaled.bounds.width() - 4.0).abs() < 1e-6);
        assert!((scaled.bounds.height() - 27.5).abs() < 1e-6);
        assert!((scaled.area() - 110.0).abs() < 1e-4);
    }

    #[test]
    fn test_front_face_is_largest_candidate() {
        let profile = ClipProfile::from_svg_str(PLATE, Path::new("plate.svg"), 0.01).unwrap();
        let scaled = profile.scale_to_dimensions(&options()).unwrap();
        let face = scaled.find_front_face(50.0, &options()).unwrap();
        assert!((face.length() - 27.5).abs() < 1e-6);
        // One of the two long vertical edges
        assert!(face.start.x.abs() < 1e-6 || (face.start.x - 4.0).abs() < 1e-6);
        let n = face.outward();
        assert!(n.y.abs() < 1e-9);
        if face.start.x.abs() < 1e-6 {
            assert!(n.x < 0.0);
        } else {
            assert!(n.x > 0.0);
        }
    }

    #[test]
    fn test_front_face_missing() {
        let profile = ClipProfile::from_svg_str(PLATE, Path::new("plate.svg"), 0.01).unwrap();
        let opts = LabelOptions {
            profile_depth: 4.0,
            profile_height: 10.0,
            ..Default::default()
        };
        let scaled = profile.scale_to_dimensions(&opts).unwrap();
        assert!(matches!(
            scaled.find_front_face(50.0, &opts),
            Err(LabelError::FrontFaceNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ClipProfile::load("/nonexistent/profile.svg", 0.01).unwrap_err();
        assert!(matches!(err, LabelError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_malformed_svg() {
        let err = ClipProfile::from_svg_str("<svg", Path::new("bad.svg"), 0.01).unwrap_err();
        assert!(matches!(err, LabelError::InvalidProfile { .. }));
    }

    #[test]
    fn test_svg_without_shapes() {
        let empty = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"></svg>"#;
        let err = ClipProfile::from_svg_str(empty, Path::new("empty.svg"), 0.01).unwrap_err();
        assert!(err.to_string().contains("no shapes"));
    }
}
