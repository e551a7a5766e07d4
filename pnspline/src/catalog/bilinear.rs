//! Bilinear fallback families.
use super::{PatchFamily, PatchTemplate};
use crate::{mesh::MeshTopology, Error, Mask, PatchBuilder, Result};
use std::sync::Arc;

/// Any quad, as the bilinear patch through its four vertices.
#[derive(Debug, Clone)]
pub struct IrregularQuadTemplate {
    label: Arc<str>,
}

impl Default for IrregularQuadTemplate {
    fn default() -> Self {
        Self {
            label: PatchFamily::Irregular.label(),
        }
    }
}

impl PatchTemplate for IrregularQuadTemplate {
    fn family(&self) -> &str {
        &self.label
    }

    fn matches(&self, topology: &MeshTopology, face: usize) -> bool {
        topology.face(face).len() == 4
    }

    fn patch_count(&self, _topology: &MeshTopology, _face: usize) -> usize {
        1
    }

    fn builder(&self, topology: &MeshTopology, face: usize) -> Result<PatchBuilder> {
        let stencil = topology.face(face).to_vec();
        if stencil.len() != 4 {
            return Err(Error::MalformedMesh(format!("Face {face} is not a quad.")));
        }

        // Control point (i, j) is face corner 0, 3, 1, 2.
        const CORNERS: [usize; 4] = [0, 3, 1, 2];
        let point_mask = Mask::from_fn(4, 4, |row, column| {
            if CORNERS[row] == column {
                1.0
            } else {
                0.0
            }
        });

        PatchBuilder::from_point_mask(self.label.clone(), stencil, &point_mask, (1, 1), 1)
    }
}

/// A face with `n != 4` sides, split into `n` bilinear quads around its
/// centroid.
///
/// Sub-patch `k` has corners at vertex `k`, the midpoint of the edge to
/// vertex `k + 1`, the centroid and the midpoint of the edge from vertex
/// `k - 1`.
#[derive(Debug, Clone)]
pub struct PolygonTemplate {
    label: Arc<str>,
}

impl Default for PolygonTemplate {
    fn default() -> Self {
        Self {
            label: PatchFamily::Polygon.label(),
        }
    }
}

impl PatchTemplate for PolygonTemplate {
    fn family(&self) -> &str {
        &self.label
    }

    fn matches(&self, topology: &MeshTopology, face: usize) -> bool {
        topology.face(face).len() != 4
    }

    fn patch_count(&self, topology: &MeshTopology, face: usize) -> usize {
        topology.face(face).len()
    }

    fn builder(&self, topology: &MeshTopology, face: usize) -> Result<PatchBuilder> {
        let stencil = topology.face(face).to_vec();
        let n = stencil.len();
        let centroid = 1.0 / n as f64;

        let mut point_mask = Mask::new(4 * n, n);
        for k in 0..n {
            let (prev, next) = ((k + n - 1) % n, (k + 1) % n);
            let base = 4 * k;
            // (0, 0)
            point_mask[(base, k)] = 1.0;
            // (0, 1)
            point_mask[(base + 1, prev)] += 0.5;
            point_mask[(base + 1, k)] += 0.5;
            // (1, 0)
            point_mask[(base + 2, k)] += 0.5;
            point_mask[(base + 2, next)] += 0.5;
            // (1, 1)
            for column in 0..n {
                point_mask[(base + 3, column)] = centroid;
            }
        }

        PatchBuilder::from_point_mask(self.label.clone(), stencil, &point_mask, (1, 1), n)
    }
}
