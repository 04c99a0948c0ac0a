//! Navmesh file loading.
//!
//! `.json` files hold a serialized [`NavGeometry`]; `.obj` files are read for
//! their `v` and `f` records only (polygons are fan-triangulated).

use std::path::Path;

use anyhow::{bail, Context, Result};
use navwalk::{NavGeometry, Vec3};

pub fn load_geometry(path: &Path) -> Result<NavGeometry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read navmesh from {}", path.display()))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let geometry = match ext.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(anyhow::Error::from),
        Some("obj") => parse_obj(&content),
        _ => bail!("unsupported navmesh format: {}", path.display()),
    }
    .with_context(|| format!("Failed to parse navmesh from {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        triangles = geometry.triangle_count(),
        "navmesh loaded"
    );
    Ok(geometry)
}

pub fn parse_obj(content: &str) -> Result<NavGeometry> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut xyz = [0.0f32; 3];
                for slot in &mut xyz {
                    let field = fields
                        .next()
                        .with_context(|| format!("line {}: vertex needs 3 coordinates", line_no + 1))?;
                    *slot = field
                        .parse()
                        .with_context(|| format!("line {}: bad coordinate {field:?}", line_no + 1))?;
                }
                positions.push(Vec3::from_array(xyz));
            }
            Some("f") => {
                let face = fields
                    .map(|f| obj_index(f, positions.len()))
                    .collect::<Option<Vec<u32>>>()
                    .with_context(|| format!("line {}: bad face index", line_no + 1))?;
                if face.len() < 3 {
                    bail!("line {}: face needs at least 3 vertices", line_no + 1);
                }
                for i in 1..face.len() - 1 {
                    indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(NavGeometry::indexed(positions, indices))
}

/// `v`, `v/vt` or `v/vt/vn`, 1-based or negative (relative to the end).
fn obj_index(field: &str, vertex_count: usize) -> Option<u32> {
    let raw: i64 = field.split('/').next()?.parse().ok()?;
    let index = match raw {
        0 => return None,
        i if i > 0 => i - 1,
        i => vertex_count as i64 + i,
    };
    u32::try_from(index).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_quads_are_fan_triangulated() {
        let geometry = parse_obj(
            "# plane\n\
             v 0 0 0\n\
             v 4 0 0\n\
             v 4 0 4\n\
             v 0 0 4\n\
             vn 0 1 0\n\
             f 1//1 2//1 3//1 4//1\n",
        )
        .expect("obj");

        assert_eq!(geometry.positions.len(), 4);
        assert_eq!(geometry.indices, Some(vec![0, 1, 2, 0, 2, 3]));
        assert_eq!(geometry.triangles().expect("valid").len(), 2);
    }

    #[test]
    fn obj_negative_indices_count_from_the_end() {
        let geometry = parse_obj("v 0 0 0\nv 1 0 0\nv 0 0 1\nf -3 -2 -1\n").expect("obj");
        assert_eq!(geometry.indices, Some(vec![0, 1, 2]));
    }

    #[test]
    fn obj_rejects_malformed_records() {
        assert!(parse_obj("v 0 0\n").is_err());
        assert!(parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
        assert!(parse_obj("v 0 0 0\nf 0 1 1\n").is_err());
    }
}
