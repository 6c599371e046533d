//! Label body and text insert construction.
//!
//! The scaled profile lies in the YZ plane (profile x is depth along Z,
//! profile y is height along Y) and is extruded along +X by the label
//! width. The front face is rebuilt with the text cut out of it: recess
//! walls run down from the face to a floor, and the insert is the text
//! region extruded to the text depth so that it fills the recess flush.

use tracing::{debug, info};

use crate::config::LabelOptions;
use crate::error::{LabelError, LabelResult};
use crate::geometry::{Bounds, FillRule, Outline, Point2, Region, TriMesh, Vec3};
use crate::profile::{FrontFace, ScaledProfile};
use crate::text::TextGeometry;

/// The two bodies of a finished label
#[derive(Debug, Clone)]
pub struct LabelAssembly {
    pub body: TriMesh,
    pub insert: TriMesh,
}

/// Orthonormal frame on the front face.
///
/// `u` runs along the text baseline, `v` is text "up" and `n` points out of
/// the body; `u × v = n`, so text drawn in (u, v) reads correctly from
/// outside.
#[derive(Debug, Clone, Copy)]
pub struct FaceFrame {
    pub origin: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub n: Vec3,
}

impl FaceFrame {
    fn new(face: &FrontFace, label_width: f64) -> Self {
        let mid = Point2::new(
            (face.start.x + face.end.x) / 2.0,
            (face.start.y + face.end.y) / 2.0,
        );
        let origin = lift(label_width / 2.0, mid);
        let n = lift_direction(face.outward());
        let mut u = Vec3::X;
        let mut v = n.cross(&u);
        if v.y < 0.0 {
            u = -u;
            v = -v;
        }
        Self { origin, u, v, n }
    }

    /// World position of face coordinates `p` at `depth` along the normal
    /// (negative depth is inside the body)
    pub fn point(&self, p: Point2, depth: f64) -> Vec3 {
        self.origin + self.u * p.x + self.v * p.y + self.n * depth
    }

    /// World direction of a face-plane vector
    pub fn direction(&self, d: Point2) -> Vec3 {
        self.u * d.x + self.v * d.y
    }
}

/// Profile point at extrusion distance `x`
fn lift(x: f64, p: Point2) -> Vec3 {
    Vec3::new(x, p.y, p.x)
}

fn lift_direction(d: Point2) -> Vec3 {
    Vec3::new(0.0, d.y, d.x)
}

/// Samples across the text height when measuring the front wall
const WALL_SAMPLES: usize = 16;

/// Thinnest material behind the part of the face covered by `text`.
///
/// Rays are cast from the face into the profile along the inward normal;
/// the nearest other profile edge each ray meets bounds the wall there.
fn front_wall_thickness(
    profile: &ScaledProfile,
    face: &FrontFace,
    frame: &FaceFrame,
    text: &Bounds,
) -> f64 {
    let mid = Point2::new(
        (face.start.x + face.end.x) / 2.0,
        (face.start.y + face.end.y) / 2.0,
    );
    // Text "up" expressed in profile coordinates
    let up = Point2::new(frame.v.z, frame.v.y);
    let outward = face.outward();
    let inward = Point2::new(-outward.x, -outward.y);

    let mut wall = f64::INFINITY;
    for i in 0..=WALL_SAMPLES {
        let t = i as f64 / WALL_SAMPLES as f64;
        let along = text.min_y + (text.max_y - text.min_y) * t;
        let origin = Point2::new(mid.x + up.x * along, mid.y + up.y * along);

        for (loop_index, lp) in profile.region.loops.iter().enumerate() {
            for edge_index in 0..lp.len() {
                if loop_index == face.loop_index && edge_index == face.edge_index {
                    continue;
                }
                let a = profile.region.vertices[lp[edge_index]];
                let b = profile.region.vertices[lp[(edge_index + 1) % lp.len()]];
                if let Some(distance) = ray_hit(origin, inward, a, b) {
                    wall = wall.min(distance);
                }
            }
        }
    }
    wall
}

/// Distance along unit `dir` from `origin` to segment `a b`
fn ray_hit(origin: Point2, dir: Point2, a: Point2, b: Point2) -> Option<f64> {
    let edge = b - a;
    let denom = dir.cross(&edge);
    if denom.abs() < 1e-12 {
        return None;
    }
    let to_a = a - origin;
    let distance = to_a.cross(&edge) / denom;
    let s = to_a.cross(&dir) / denom;
    (distance > 1e-9 && (0.0..=1.0).contains(&s)).then_some(distance)
}

pub struct LabelBuilder<'a> {
    profile: &'a ScaledProfile,
    text: &'a TextGeometry,
    label_width: f64,
    options: &'a LabelOptions,
    face: FrontFace,
    frame: FaceFrame,
}

impl<'a> LabelBuilder<'a> {
    /// Locate the front face and check that the text fits on it
    pub fn new(
        profile: &'a ScaledProfile,
        text: &'a TextGeometry,
        label_width: f64,
        options: &'a LabelOptions,
    ) -> LabelResult<Self> {
        options.validate()?;
        let face = profile.find_front_face(label_width, options)?;
        let frame = FaceFrame::new(&face, label_width);

        let face_length = face.length();
        let face_bounds = Bounds::new(
            -label_width / 2.0,
            -face_length / 2.0,
            label_width / 2.0,
            face_length / 2.0,
        );
        if !face_bounds.contains_strictly(&text.bounds) {
            return Err(LabelError::TextDoesNotFit {
                text_width: text.width(),
                text_height: text.height(),
                face_width: label_width,
                face_length,
            });
        }

        let wall = front_wall_thickness(profile, &face, &frame, &text.bounds);
        if options.recess_depth() >= wall {
            return Err(LabelError::RecessTooDeep {
                depth: options.recess_depth(),
                wall,
            });
        }

        info!(
            face_length,
            label_width,
            wall,
            normal = ?(frame.n.x, frame.n.y, frame.n.z),
            "front face located"
        );

        Ok(Self {
            profile,
            text,
            label_width,
            options,
            face,
            frame,
        })
    }

    pub fn face(&self) -> &FrontFace {
        &self.face
    }

    pub fn frame(&self) -> &FaceFrame {
        &self.frame
    }

    pub fn build(&self) -> LabelResult<LabelAssembly> {
        Ok(LabelAssembly {
            body: self.build_body()?,
            insert: self.create_text_insert(),
        })
    }

    /// Extruded profile with the text recessed into the front face
    pub fn build_body(&self) -> LabelResult<TriMesh> {
        let mut mesh = TriMesh::new("label_body");
        let region = &self.profile.region;
        let w = self.label_width;

        for [a, b, c] in region.triangle_points() {
            mesh.push_triangle(lift(0.0, a), lift(0.0, b), lift(0.0, c), -Vec3::X);
            mesh.push_triangle(lift(w, a), lift(w, b), lift(w, c), Vec3::X);
        }

        for (loop_index, lp) in region.loops.iter().enumerate() {
            for edge_index in 0..lp.len() {
                if loop_index == self.face.loop_index && edge_index == self.face.edge_index {
                    continue;
                }
                let a = region.vertices[lp[edge_index]];
                let b = region.vertices[lp[(edge_index + 1) % lp.len()]];
                let d = b - a;
                let outward = lift_direction(Point2::new(d.y, -d.x));
                mesh.push_quad(lift(0.0, a), lift(0.0, b), lift(w, b), lift(w, a), outward);
            }
        }

        self.push_front_face(&mut mesh)?;
        self.push_recess(&mut mesh);

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            closed = mesh.is_closed(),
            "body built"
        );
        Ok(mesh)
    }

    /// Face rectangle minus the text outline
    fn push_front_face(&self, mesh: &mut TriMesh) -> LabelResult<()> {
        let hw = self.label_width / 2.0;
        let hl = self.face.length() / 2.0;
        let mut contours = vec![vec![
            Point2::new(-hw, -hl),
            Point2::new(hw, -hl),
            Point2::new(hw, hl),
            Point2::new(-hw, hl),
        ]];
        for mut contour in self.text.region.boundary().contours {
            contour.reverse();
            contours.push(contour);
        }

        let face = Region::fill(&Outline::new(contours), FillRule::NonZero)?;
        for [a, b, c] in face.triangle_points() {
            mesh.push_triangle(
                self.frame.point(a, 0.0),
                self.frame.point(b, 0.0),
                self.frame.point(c, 0.0),
                self.frame.n,
            );
        }
        Ok(())
    }

    fn push_recess(&self, mesh: &mut TriMesh) {
        let depth = -self.options.recess_depth();
        let frame = &self.frame;

        for (a, b) in self.text.region.boundary_edges() {
            let d = b - a;
            // Walls face into the recess, towards the text
            let inward = frame.direction(Point2::new(-d.y, d.x));
            mesh.push_quad(
                frame.point(a, 0.0),
                frame.point(b, 0.0),
                frame.point(b, depth),
                frame.point(a, depth),
                inward,
            );
        }

        for [a, b, c] in self.text.region.triangle_points() {
            mesh.push_triangle(
                frame.point(a, depth),
                frame.point(b, depth),
                frame.point(c, depth),
                frame.n,
            );
        }
    }

    /// Text region extruded from the face plane down to the text depth
    pub fn create_text_insert(&self) -> TriMesh {
        let mut mesh = TriMesh::new("text_insert");
        let depth = -self.options.text_depth;
        let frame = &self.frame;

        for [a, b, c] in self.text.region.triangle_points() {
            mesh.push_triangle(frame.point(a, 0.0), frame.point(b, 0.0), frame.point(c, 0.0), frame.n);
            mesh.push_triangle(
                frame.point(a, depth),
                frame.point(b, depth),
                frame.point(c, depth),
                -frame.n,
            );
        }

        for (a, b) in self.text.region.boundary_edges() {
            let d = b - a;
            let outward = frame.direction(Point2::new(d.y, -d.x));
            mesh.push_quad(
                frame.point(a, 0.0),
                frame.point(b, 0.0),
                frame.point(b, depth),
                frame.point(a, depth),
                outward,
            );
        }

        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            closed = mesh.is_closed(),
            "text insert built"
        );
        mesh
    }
}
