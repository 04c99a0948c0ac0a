use crate::{NavError, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw walkable-surface geometry as handed over by the asset loader.
///
/// Either a plain triangle list (`indices == None`, every three positions form a
/// triangle) or an indexed mesh.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavGeometry {
    pub positions: Vec<Vec3>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub indices: Option<Vec<u32>>,
}

impl NavGeometry {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            indices: None,
        }
    }

    pub fn indexed(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
        }
    }

    pub fn from_triangles(tris: impl IntoIterator<Item = [Vec3; 3]>) -> Self {
        Self::new(tris.into_iter().flatten().collect())
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Validated triangle list as indices into `positions`.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>, NavError> {
        if let Some(i) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(NavError::NonFiniteVertex(i));
        }

        let tris: Vec<[u32; 3]> = match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(NavError::UnalignedIndices(indices.len()));
                }
                let vertex_count = self.positions.len();
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(NavError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
                indices
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect()
            }
            None => {
                if self.positions.len() % 3 != 0 {
                    return Err(NavError::UnalignedPositions(self.positions.len()));
                }
                (0..self.positions.len() as u32 / 3)
                    .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
                    .collect()
            }
        };

        if tris.is_empty() {
            return Err(NavError::EmptyGeometry);
        }
        Ok(tris)
    }
}
