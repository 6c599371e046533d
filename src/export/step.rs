//! STEP encoding of label meshes as faceted B-reps.
//!
//! Each triangle becomes a planar face bounded by three line edges. Edges
//! and vertices are shared between neighbouring triangles, so a closed mesh
//! yields a closed shell and is written as a solid.

use std::collections::HashMap;

use tracing::{debug, warn};
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Face, Shell, Solid, Vertex, Wire};
use truck_modeling::Point3;
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModels};

use crate::error::{LabelError, LabelResult};
use crate::geometry::TriMesh;

const ORGANIZATION: &str = "toolbox-labels";

/// Top-level body entities, one per pushed model
const BODY_ENTITIES: [&str; 2] = ["MANIFOLD_SOLID_BREP", "SHELL_BASED_SURFACE_MODEL"];
const PRODUCT_ENTITY: &str = "= PRODUCT('','',''";

/// Encode all `meshes` into one STEP document for `product`.
///
/// Every connected part of a mesh becomes its own body, named after the
/// mesh (`text_insert_2` for the second part of `text_insert`). Closed
/// parts are written as solids, anything else as a surface model.
pub fn step_string(product: &str, meshes: &[&TriMesh]) -> LabelResult<String> {
    let mut solids = Vec::new();
    let mut shells = Vec::new();

    for mesh in meshes {
        let parts = mesh_to_shell(mesh)?.connected_components();
        let numbered = parts.len() > 1;
        for (i, part) in parts.into_iter().enumerate() {
            let name = if numbered {
                format!("{}_{}", mesh.name, i + 1)
            } else {
                mesh.name.clone()
            };
            match Solid::try_new(vec![part.clone()]) {
                Ok(solid) => solids.push((name, solid.compress())),
                Err(reason) => {
                    warn!(body = %name, %reason, "writing body as an open shell");
                    shells.push((name, part.compress()));
                }
            }
        }
    }

    debug!(solids = solids.len(), shells = shells.len(), "STEP bodies");

    // Models are written in push order: solids first, then shells
    let mut models = StepModels::default();
    for (_, solid) in &solids {
        models.push_solid(solid);
    }
    for (_, shell) in &shells {
        models.push_shell(shell);
    }
    let names: Vec<&str> = solids
        .iter()
        .map(|(name, _)| name.as_str())
        .chain(shells.iter().map(|(name, _)| name.as_str()))
        .collect();

    let header = StepHeaderDescriptor {
        organization_system: ORGANIZATION.to_string(),
        ..Default::default()
    };
    let step = CompleteStepDisplay::new(models, header).to_string();
    Ok(name_entities(&step, product, &names))
}

/// Fill in the product name and the body names left empty by the writer
fn name_entities(step: &str, product: &str, bodies: &[&str]) -> String {
    let product = step_text(product);
    let mut out = String::with_capacity(step.len() + 64);
    let mut bodies = bodies.iter();

    for line in step.split_inclusive('\n') {
        let entity = BODY_ENTITIES
            .into_iter()
            .find(|entity| line.contains(&format!("= {entity}('',")));
        if let Some(entity) = entity {
            if let Some(name) = bodies.next() {
                let named = format!("{entity}('{}'", step_text(name));
                out.push_str(&line.replacen(&format!("{entity}(''"), &named, 1));
                continue;
            }
        }
        if line.contains(PRODUCT_ENTITY) {
            let named = format!("= PRODUCT('{0}','{0}',''", product);
            out.push_str(&line.replacen(PRODUCT_ENTITY, &named, 1));
            continue;
        }
        out.push_str(line);
    }
    out
}

/// Printable ASCII with quotes doubled, as STEP string literals require
fn step_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect::<String>()
        .replace('\'', "''")
}

fn mesh_to_shell(mesh: &TriMesh) -> LabelResult<Shell> {
    let vertices: Vec<Vertex> = mesh
        .vertices
        .iter()
        .map(|v| builder::vertex(Point3::new(v.x, v.y, v.z)))
        .collect();

    // Keyed by (low, high) vertex index, stored running low -> high
    let mut edges: HashMap<(u32, u32), Edge> = HashMap::new();
    let mut edge = |a: u32, b: u32| -> Edge {
        let key = (a.min(b), a.max(b));
        let stored = edges
            .entry(key)
            .or_insert_with(|| builder::line(&vertices[key.0 as usize], &vertices[key.1 as usize]));
        if a < b { stored.clone() } else { stored.inverse() }
    };

    let mut faces: Vec<Face> = Vec::with_capacity(mesh.faces.len());
    for f in &mesh.faces {
        let [p0, p1, p2] = mesh.triangle(f);
        let normal = (p1 - p0).cross(&(p2 - p0));
        if normal.length() < 1e-12 {
            continue;
        }

        let wire = Wire::from(vec![edge(f[0], f[1]), edge(f[1], f[2]), edge(f[2], f[0])]);
        match builder::try_attach_plane(&[wire]) {
            Ok(face) => faces.push(face),
            Err(e) => debug!(error = %e, "skipping degenerate facet"),
        }
    }

    if faces.is_empty() {
        return Err(LabelError::StepExport(format!(
            "{} has no usable faces",
            mesh.name
        )));
    }

    Ok(Shell::from(faces))
}
