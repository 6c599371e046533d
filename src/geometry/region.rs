use std::collections::{HashMap, HashSet};

use lyon::math::point;
use lyon::path::Path as LyonPath;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};

use super::{orient2d, Bounds, Contour, Outline, Point2};
use crate::error::{LabelError, LabelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl From<FillRule> for lyon::tessellation::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => lyon::tessellation::FillRule::NonZero,
            FillRule::EvenOdd => lyon::tessellation::FillRule::EvenOdd,
        }
    }
}

/// The filled area of an outline.
///
/// Triangles are CCW. Boundary loops keep the filled area on their left:
/// outer boundaries run CCW, holes run CW. Overlapping input contours are
/// merged, so loops never cross each other.
#[derive(Debug, Clone, Default)]
pub struct Region {
    pub vertices: Vec<Point2>,
    pub triangles: Vec<[usize; 3]>,
    pub loops: Vec<Vec<usize>>,
}

impl Region {
    /// Tessellate `outline` under `rule`
    pub fn fill(outline: &Outline, rule: FillRule) -> LabelResult<Region> {
        let mut builder = LyonPath::builder();
        for contour in &outline.contours {
            let Some((first, rest)) = contour.split_first() else {
                continue;
            };
            builder.begin(point(first.x as f32, first.y as f32));
            for p in rest {
                builder.line_to(point(p.x as f32, p.y as f32));
            }
            builder.end(true);
        }
        let path = builder.build();

        let mut buffers: VertexBuffers<lyon::math::Point, u32> = VertexBuffers::new();
        let options = FillOptions::default().with_fill_rule(rule.into());
        FillTessellator::new()
            .tessellate_path(
                &path,
                &options,
                &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position()),
            )
            .map_err(|e| LabelError::Tessellation(format!("{:?}", e)))?;

        // Input vertices come back at f32 precision; restore the exact values
        // so regions built from the same points weld together.
        let exact: HashMap<(u32, u32), Point2> = outline
            .points()
            .map(|p| (f32_key(p.x as f32, p.y as f32), *p))
            .collect();

        let mut canonical: HashMap<(u32, u32), usize> = HashMap::new();
        let mut vertices: Vec<Point2> = Vec::new();
        let remap: Vec<usize> = buffers
            .vertices
            .iter()
            .map(|v| {
                let key = f32_key(v.x, v.y);
                *canonical.entry(key).or_insert_with(|| {
                    let p = exact
                        .get(&key)
                        .copied()
                        .unwrap_or_else(|| Point2::new(v.x as f64, v.y as f64));
                    vertices.push(p);
                    vertices.len() - 1
                })
            })
            .collect();

        let mut triangles = Vec::with_capacity(buffers.indices.len() / 3);
        let mut pinched = Vec::new();
        for tri in buffers.indices.chunks_exact(3) {
            let a = remap[tri[0] as usize];
            let b = remap[tri[1] as usize];
            let c = remap[tri[2] as usize];
            if a == b || b == c || c == a {
                continue;
            }
            if let Some(middle) = sliver_middle(&vertices, [a, b, c]) {
                pinched.push(middle);
                continue;
            }
            if orient2d(vertices[a], vertices[b], vertices[c]) < 0.0 {
                triangles.push([a, c, b]);
            } else {
                triangles.push([a, b, c]);
            }
        }
        let slivers = pinched.len();
        split_at_pinched(&vertices, &mut triangles, &pinched);

        let loops = boundary_loops(&triangles);
        tracing::debug!(
            vertices = vertices.len(),
            triangles = triangles.len(),
            slivers,
            loops = loops.len(),
            "tessellated region"
        );

        Ok(Region {
            vertices,
            triangles,
            loops,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_points(&self) -> impl Iterator<Item = [Point2; 3]> + '_ {
        self.triangles
            .iter()
            .map(|t| [self.vertices[t[0]], self.vertices[t[1]], self.vertices[t[2]]])
    }

    /// Every boundary edge, oriented with the filled area on its left
    pub fn boundary_edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.loops.iter().flat_map(move |lp| {
            (0..lp.len()).map(move |i| {
                (
                    self.vertices[lp[i]],
                    self.vertices[lp[(i + 1) % lp.len()]],
                )
            })
        })
    }

    /// Boundary loops as an outline (outer CCW, holes CW)
    pub fn boundary(&self) -> Outline {
        Outline::new(
            self.loops
                .iter()
                .map(|lp| lp.iter().map(|&i| self.vertices[i]).collect())
                .collect(),
        )
    }

    pub fn area(&self) -> f64 {
        self.triangle_points()
            .map(|[a, b, c]| orient2d(a, b, c) / 2.0)
            .sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.triangles.iter().flatten().map(|&i| &self.vertices[i]))
    }

    /// Same area with collinear boundary vertices removed
    pub fn simplified(&self) -> LabelResult<Region> {
        let loops: Vec<Contour> = self
            .boundary()
            .contours
            .into_iter()
            .map(drop_collinear)
            .collect();
        Region::fill(&Outline::new(loops), FillRule::EvenOdd)
    }
}

/// Triangles thinner than this (in mm) are treated as collinear
const SLIVER_HEIGHT: f64 = 1e-5;

/// The vertex opposite the longest edge, if the triangle is a sliver.
///
/// lyon emits zero-area triangles where input vertices are collinear, for
/// example along the shared baseline of two glyphs. Their orientation is
/// arbitrary, so they are dropped and the neighbour across the long edge
/// is split at the middle vertex instead.
fn sliver_middle(vertices: &[Point2], [a, b, c]: [usize; 3]) -> Option<usize> {
    let (pa, pb, pc) = (vertices[a], vertices[b], vertices[c]);
    let longest = [(pa.distance(&pb), c), (pb.distance(&pc), a), (pc.distance(&pa), b)]
        .into_iter()
        .max_by(|x, y| x.0.total_cmp(&y.0))?;
    let height = orient2d(pa, pb, pc).abs() / longest.0.max(f64::MIN_POSITIVE);
    (height <= SLIVER_HEIGHT).then_some(longest.1)
}

/// Whether `p` lies on segment `a b`, away from both ends
fn splits_edge(p: Point2, a: Point2, b: Point2) -> bool {
    let d = b - a;
    let len = d.length();
    if len <= 2.0 * SLIVER_HEIGHT {
        return false;
    }
    let along = (p - a).dot(&d) / len;
    let off = d.cross(&(p - a)).abs() / len;
    off <= 2.0 * SLIVER_HEIGHT && along > SLIVER_HEIGHT && along < len - SLIVER_HEIGHT
}

/// Split every triangle edge that runs through a pinched vertex
fn split_at_pinched(vertices: &[Point2], triangles: &mut Vec<[usize; 3]>, pinched: &[usize]) {
    if pinched.is_empty() {
        return;
    }
    let mut i = 0;
    while i < triangles.len() {
        let t = triangles[i];
        let split = (0..3).find_map(|k| {
            let (a, b, c) = (t[k], t[(k + 1) % 3], t[(k + 2) % 3]);
            pinched
                .iter()
                .copied()
                .find(|&p| p != a && p != b && p != c && splits_edge(vertices[p], vertices[a], vertices[b]))
                .map(|p| (a, b, c, p))
        });
        match split {
            // Re-check the same slot: the new halves may need further splits
            Some((a, b, c, p)) => {
                triangles[i] = [a, p, c];
                triangles.push([p, b, c]);
            }
            None => i += 1,
        }
    }
}

fn f32_key(x: f32, y: f32) -> (u32, u32) {
    // Fold -0.0 into 0.0
    ((x + 0.0).to_bits(), (y + 0.0).to_bits())
}

/// Chain the directed edges whose reverse is absent into closed loops
fn boundary_loops(triangles: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut directed: HashSet<(usize, usize)> = HashSet::new();
    for t in triangles {
        directed.insert((t[0], t[1]));
        directed.insert((t[1], t[2]));
        directed.insert((t[2], t[0]));
    }

    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(a, b) in &directed {
        if !directed.contains(&(b, a)) {
            outgoing.entry(a).or_default().push(b);
        }
    }
    for targets in outgoing.values_mut() {
        targets.sort_unstable();
    }

    let mut starts: Vec<usize> = outgoing.keys().copied().collect();
    starts.sort_unstable();

    let mut loops = Vec::new();
    for start in starts {
        while let Some(first) = take_edge(&mut outgoing, start) {
            let mut lp = vec![start];
            let mut current = first;
            let mut closed = true;
            while current != start {
                lp.push(current);
                match take_edge(&mut outgoing, current) {
                    Some(next) => current = next,
                    None => {
                        closed = false;
                        break;
                    }
                }
            }
            if closed && lp.len() >= 3 {
                loops.push(lp);
            } else {
                tracing::warn!(len = lp.len(), "discarding open boundary chain");
            }
        }
    }
    loops
}

fn take_edge(outgoing: &mut HashMap<usize, Vec<usize>>, from: usize) -> Option<usize> {
    let targets = outgoing.get_mut(&from)?;
    if targets.is_empty() {
        None
    } else {
        Some(targets.remove(0))
    }
}

fn drop_collinear(contour: Contour) -> Contour {
    let mut points = contour;
    loop {
        let n = points.len();
        if n <= 3 {
            return points;
        }
        let redundant = (0..n).find(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let d0 = points[i] - prev;
            let d1 = next - points[i];
            let scale = d0.length() * d1.length();
            d0.cross(&d1).abs() <= 1e-9 * scale.max(1e-12) && d0.dot(&d1) > 0.0
        });
        match redundant {
            Some(i) => {
                points.remove(i);
            }
            None => return points,
        }
    }
}
