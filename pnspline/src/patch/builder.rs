use super::{elevation, Patch};
use crate::{mesh::MeshId, ControlMesh, Error, Grid, Index, Mask, Result};
use std::sync::Arc;

/// A classified mesh neighborhood: a vertex stencil plus the mask that maps
/// the stencil's positions to Bézier control points.
///
/// The stencil and mask never change once classified. Evaluating a builder
/// with [`build_patches()`](Self::build_patches) reads the *current*
/// positions of the stencil vertices, so a builder can be evaluated again
/// after vertices were moved without classifying the mesh again.
///
/// Cloning is cheap: the stencil and mask are shared.
///
/// # Mask layout
///
/// With `n = (deg_u + 1) · (deg_v + 1)` control points per patch, the mask
/// has `3 · patch_count() · n` rows and `3 · stencil_len()` columns.
///
/// * Column `3 · s + k` is coordinate `k` of stencil vertex `s`.
/// * Row `3 · (p · n + i · (deg_v + 1) + j) + k` is coordinate `k` of control
///   point `(i, j)` of sub-patch `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchBuilder {
    family: Arc<str>,
    stencil: Arc<[Index]>,
    mask: Arc<Mask>,
    degree: (usize, usize),
    patch_count: usize,
    source: Option<MeshId>,
}

impl PatchBuilder {
    /// Create a builder.
    ///
    /// Fails with [`Error::InvalidMask`] if the mask shape does not match
    /// the stencil, degree and patch count.
    pub fn new(
        family: impl Into<Arc<str>>,
        stencil: Vec<Index>,
        mask: Mask,
        degree: (usize, usize),
        patch_count: usize,
    ) -> Result<Self> {
        let expected = (mask_rows(degree, patch_count), 3 * stencil.len());
        if mask.shape() != expected {
            return Err(Error::InvalidMask {
                expected,
                actual: mask.shape(),
            });
        }

        Ok(Self {
            family: family.into(),
            stencil: stencil.into(),
            mask: Arc::new(mask),
            degree,
            patch_count,
            source: None,
        })
    }

    /// Create a builder from a mask acting on whole points (one column per
    /// stencil vertex, one row per control point).
    pub fn from_point_mask(
        family: impl Into<Arc<str>>,
        stencil: Vec<Index>,
        point_mask: &Mask,
        degree: (usize, usize),
        patch_count: usize,
    ) -> Result<Self> {
        Self::new(family, stencil, point_mask.expand_xyz(), degree, patch_count)
    }

    pub(crate) fn with_source(mut self, mesh: &ControlMesh) -> Self {
        self.source = Some(mesh.id());
        self
    }

    /// The vertex indices the mask reads from, in column order.
    #[inline]
    pub fn stencil(&self) -> &[Index] {
        &self.stencil
    }

    #[inline]
    pub fn stencil_len(&self) -> usize {
        self.stencil.len()
    }

    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Number of patches one evaluation yields.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    /// `(deg_u, deg_v)` of the patches this builder yields.
    #[inline]
    pub fn degree(&self) -> (usize, usize) {
        self.degree
    }

    #[inline]
    pub fn deg_u(&self) -> usize {
        self.degree.0
    }

    #[inline]
    pub fn deg_v(&self) -> usize {
        self.degree.1
    }

    /// Name of the patch family, used as the group label of every patch.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// `true` if this builder references `vertex`.
    pub fn references(&self, vertex: Index) -> bool {
        self.stencil.contains(&vertex)
    }

    /// `true` if `mesh` has every vertex the stencil references.
    pub fn is_compatible(&self, mesh: &ControlMesh) -> bool {
        self.first_missing(mesh).is_none()
    }

    /// Evaluate the mask against the current positions of `mesh`.
    ///
    /// Patches come back in sub-patch order. Fails with
    /// [`Error::StaleBuilder`] if `mesh` is the mesh this builder was
    /// classified against but no longer covers the stencil, and with
    /// [`Error::IncompatibleTopology`] for any other mesh that does not.
    pub fn build_patches(&self, mesh: &ControlMesh) -> Result<Vec<Patch>> {
        if let Some(index) = self.first_missing(mesh) {
            let vertex_count = mesh.vertex_count();
            return Err(if self.source == Some(mesh.id()) {
                Error::StaleBuilder {
                    index,
                    vertex_count,
                }
            } else {
                Error::IncompatibleTopology {
                    index,
                    vertex_count,
                }
            });
        }

        let output = self.mask.apply(&mesh.gather(&self.stencil));

        let (du, dv) = self.degree;
        let cols = dv + 1;
        let point_count = (du + 1) * cols;

        Ok(output
            .chunks_exact(3 * point_count)
            .map(|chunk| {
                let points = Grid::from_fn(du + 1, cols, |i, j| {
                    let offset = 3 * (i * cols + j);
                    [chunk[offset], chunk[offset + 1], chunk[offset + 2]]
                });
                Patch::new(self.family.clone(), points)
            })
            .collect())
    }

    /// Raise the target degree of every axis below
    /// [`MAX_DEGREE`](super::MAX_DEGREE) by one.
    pub fn degree_raise(&mut self) {
        let target = elevation::next_step(self.degree);
        self.elevate(target);
    }

    /// Elevate the target degree to `(deg_u, deg_v)`, with the same rules as
    /// [`Patch::elevate_to()`].
    pub fn elevate_to(&mut self, deg_u: usize, deg_v: usize) -> Result<()> {
        let target = (deg_u, deg_v);
        elevation::check_target(self.degree, target)?;
        self.elevate(target);
        Ok(())
    }

    fn elevate(&mut self, target: (usize, usize)) {
        if target == self.degree {
            return;
        }
        let mask = elevation::elevate_rows(&self.mask, self.patch_count, self.degree, target);
        self.mask = Arc::new(mask);
        self.degree = target;
    }

    fn first_missing(&self, mesh: &ControlMesh) -> Option<usize> {
        self.stencil
            .iter()
            .map(|index| index.get())
            .find(|&index| index >= mesh.vertex_count())
    }
}

/// Row count of the mask of a builder yielding `patch_count` patches of
/// `degree`.
pub(crate) fn mask_rows((du, dv): (usize, usize), patch_count: usize) -> usize {
    3 * patch_count * (du + 1) * (dv + 1)
}

/// Evaluate every builder against `mesh`, concatenating the patches in
/// builder order.
///
/// With the `rayon` feature builders are evaluated in parallel; the order of
/// the result is the same.
pub fn build_all_patches(builders: &[PatchBuilder], mesh: &ControlMesh) -> Result<Vec<Patch>> {
    #[cfg(feature = "rayon")]
    let per_builder = {
        use rayon::prelude::*;
        builders
            .par_iter()
            .map(|builder| builder.build_patches(mesh))
            .collect::<Result<Vec<_>>>()?
    };

    #[cfg(not(feature = "rayon"))]
    let per_builder = builders
        .iter()
        .map(|builder| builder.build_patches(mesh))
        .collect::<Result<Vec<_>>>()?;

    Ok(per_builder.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> ControlMesh {
        ControlMesh::from_data(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0u32, 1, 2]],
        )
        .unwrap()
    }

    /// A degree (1, 1) builder over `stencil` whose control points are the
    /// stencil vertices.
    fn identity_builder(stencil: Vec<Index>) -> PatchBuilder {
        let n = stencil.len();
        let point_mask = Mask::from_fn(4, n, |r, c| if r % n == c { 1.0 } else { 0.0 });
        PatchBuilder::from_point_mask("identity", stencil, &point_mask, (1, 1), 1).unwrap()
    }

    #[test]
    fn rejects_mismatched_mask() {
        let result = PatchBuilder::new("bad", vec![Index(0)], Mask::new(12, 2), (1, 1), 1);
        assert!(matches!(
            result,
            Err(Error::InvalidMask {
                expected: (12, 3),
                ..
            })
        ));
    }

    #[test]
    fn stale_versus_incompatible() {
        let mesh = triangle_mesh();
        let builder =
            identity_builder(vec![Index(0), Index(1), Index(2), Index(3)]).with_source(&mesh);

        // Same lineage, stencil no longer covered.
        let shrunk = ControlMesh::from_data(&[[0.0; 3]; 3], &[] as &[[u32; 3]])
            .unwrap()
            .with_id_of(&mesh);
        assert!(matches!(
            builder.build_patches(&shrunk),
            Err(Error::StaleBuilder { index: 3, .. })
        ));

        assert!(matches!(
            builder.build_patches(&ControlMesh::new()),
            Err(Error::IncompatibleTopology { index: 0, .. })
        ));
    }

    #[test]
    fn evaluation_is_mask_times_positions() {
        let mesh = triangle_mesh();
        let builder = identity_builder(vec![Index(0), Index(1), Index(2), Index(0)]);
        let patches = builder.build_patches(&mesh).unwrap();
        assert_eq!(patches.len(), 1);
        let points = patches[0].control_points().unwrap();
        assert_eq!(points[(0, 0)], [0.0, 0.0, 0.0]);
        assert_eq!(points[(0, 1)], [1.0, 0.0, 0.0]);
        assert_eq!(points[(1, 0)], [0.0, 1.0, 0.0]);
    }
}
