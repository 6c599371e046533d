use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path as LyonPath, PathEvent};
use usvg::tiny_skia_path::PathSegment;

use super::{Bounds, Point2};

/// A closed polygon; the last point connects back to the first
pub type Contour = Vec<Point2>;

/// A set of closed polygon contours describing one filled shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn new(contours: Vec<Contour>) -> Self {
        let contours = contours.into_iter().filter_map(clean_contour).collect();
        Self { contours }
    }

    /// Flatten a usvg path, with its absolute transform applied
    pub fn from_usvg_path(path: &usvg::Path, tolerance: f64) -> Self {
        let data = path.data().clone();
        let data = data
            .clone()
            .transform(path.abs_transform())
            .unwrap_or(data);

        let mut builder = LyonPath::builder();
        let mut open = false;
        for seg in data.segments() {
            match seg {
                PathSegment::MoveTo(p) => {
                    if open {
                        builder.end(true);
                    }
                    builder.begin(point(p.x, p.y));
                    open = true;
                }
                PathSegment::LineTo(p) => {
                    if open {
                        builder.line_to(point(p.x, p.y));
                    }
                }
                PathSegment::QuadTo(c, p) => {
                    if open {
                        builder.quadratic_bezier_to(point(c.x, c.y), point(p.x, p.y));
                    }
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    if open {
                        builder.cubic_bezier_to(
                            point(c1.x, c1.y),
                            point(c2.x, c2.y),
                            point(p.x, p.y),
                        );
                    }
                }
                PathSegment::Close => {
                    if open {
                        builder.end(true);
                        open = false;
                    }
                }
            }
        }
        if open {
            builder.end(true);
        }

        Self::flatten(&builder.build(), tolerance)
    }

    fn flatten(path: &LyonPath, tolerance: f64) -> Self {
        let mut contours = Vec::new();
        let mut current: Contour = Vec::new();

        for event in path.iter().flattened(tolerance as f32) {
            match event {
                PathEvent::Begin { at } => {
                    current = vec![Point2::new(at.x as f64, at.y as f64)];
                }
                PathEvent::Line { to, .. } => {
                    current.push(Point2::new(to.x as f64, to.y as f64));
                }
                PathEvent::End { .. } => {
                    contours.push(std::mem::take(&mut current));
                }
                _ => {}
            }
        }

        Self::new(contours)
    }

    /// Outline of every visible path under `group`
    pub fn from_usvg_group(group: &usvg::Group, tolerance: f64, filled_only: bool) -> Self {
        let mut paths = Vec::new();
        collect_paths(group, &mut paths);

        let mut outline = Outline::default();
        for path in paths {
            if filled_only && path.fill().is_none() {
                continue;
            }
            outline.extend(Outline::from_usvg_path(path, tolerance));
        }
        outline
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn extend(&mut self, other: Outline) {
        self.contours.extend(other.contours);
    }

    pub fn points(&self) -> impl Iterator<Item = &Point2> {
        self.contours.iter().flatten()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points())
    }

    /// Apply `f` to every point
    pub fn map<F>(&self, f: F) -> Outline
    where
        F: Fn(Point2) -> Point2,
    {
        Outline::new(
            self.contours
                .iter()
                .map(|c| c.iter().map(|p| f(*p)).collect())
                .collect(),
        )
    }
}

/// One outline per visible path under `group`, in document order
pub fn path_outlines(group: &usvg::Group, tolerance: f64) -> Vec<Outline> {
    let mut paths = Vec::new();
    collect_paths(group, &mut paths);
    paths
        .into_iter()
        .map(|path| Outline::from_usvg_path(path, tolerance))
        .collect()
}

/// Walk a usvg group depth-first, collecting visible paths in document order
fn collect_paths<'a>(group: &'a usvg::Group, paths: &mut Vec<&'a usvg::Path>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => collect_paths(g, paths),
            usvg::Node::Path(path) => {
                if path.is_visible() {
                    paths.push(path);
                }
            }
            usvg::Node::Image(_) => {}
            usvg::Node::Text(_) => {}
        }
    }
}

/// Drop repeated points and the closing duplicate; reject degenerate contours
fn clean_contour(contour: Contour) -> Option<Contour> {
    let mut cleaned: Contour = Vec::with_capacity(contour.len());
    for p in contour {
        if cleaned.last().is_some_and(|last| last.distance(&p) < 1e-9) {
            continue;
        }
        cleaned.push(p);
    }
    while cleaned.len() > 1 && cleaned[0].distance(&cleaned[cleaned.len() - 1]) < 1e-9 {
        cleaned.pop();
    }
    (cleaned.len() >= 3).then_some(cleaned)
}
