//! Incremental re-evaluation of a mesh's patches.
use crate::{
    catalog::{BuiltinCatalog, PatchCatalog},
    patch::build_all_patches,
    process, ControlMesh, Error, Index, Patch, PatchBuilder, Point, Result,
};
use std::collections::BTreeSet;

/// A control mesh together with its builders and the current patches.
///
/// Vertex edits go through [`update_control_mesh()`](Self::update_control_mesh),
/// which rebuilds only the builders whose stencil references an edited
/// vertex.
///
/// ```
/// use pnspline::{ControlMesh, Index, Surface};
///
/// let mesh = ControlMesh::from_data(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0u32, 1, 2, 3]],
/// )?;
/// let mut surface = Surface::new(mesh)?;
///
/// let changed = surface.update_control_mesh(&[(Index(2), [1.0, 1.0, 0.5])])?;
/// assert_eq!(changed, vec![0]);
/// # Ok::<(), pnspline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Surface {
    mesh: ControlMesh,
    builders: Vec<PatchBuilder>,
    patches: Vec<Patch>,
    /// Index of the first patch of every builder.
    offsets: Vec<usize>,
    /// Builders referencing each vertex.
    vertex_builders: Vec<Vec<usize>>,
}

impl Surface {
    /// Classify `mesh` with the [`BuiltinCatalog`] and build all patches.
    pub fn new(mesh: ControlMesh) -> Result<Self> {
        Self::with_catalog(mesh, &BuiltinCatalog::default())
    }

    /// Classify `mesh` with `catalog` and build all patches.
    pub fn with_catalog(mesh: ControlMesh, catalog: &impl PatchCatalog) -> Result<Self> {
        let builders = process::get_patch_builders_with(&mesh, catalog)?;
        let patches = build_all_patches(&builders, &mesh)?;

        let offsets = builders
            .iter()
            .scan(0, |offset, builder| {
                let first = *offset;
                *offset += builder.patch_count();
                Some(first)
            })
            .collect();

        let mut vertex_builders = vec![Vec::new(); mesh.vertex_count()];
        for (index, builder) in builders.iter().enumerate() {
            let referenced = builder.stencil().iter().collect::<BTreeSet<_>>();
            for vertex in referenced {
                vertex_builders[vertex.get()].push(index);
            }
        }

        Ok(Self {
            mesh,
            builders,
            patches,
            offsets,
            vertex_builders,
        })
    }

    /// Move vertices and rebuild the affected patches.
    ///
    /// Returns the sorted indices of the rebuilt patches. Fails with
    /// [`Error::IndexOutOfRange`] before any vertex is moved if an index is
    /// out of bounds.
    pub fn update_control_mesh(&mut self, edits: &[(Index, Point)]) -> Result<Vec<usize>> {
        let vertex_count = self.mesh.vertex_count();
        if let Some((index, _)) = edits.iter().find(|(index, _)| index.get() >= vertex_count) {
            return Err(Error::IndexOutOfRange {
                index: index.get(),
                len: vertex_count,
            });
        }

        let mut affected = BTreeSet::new();
        for &(index, position) in edits {
            self.mesh.set_vertex(index.get(), position)?;
            affected.extend(self.vertex_builders[index.get()].iter().copied());
        }
        let affected = affected.into_iter().collect::<Vec<_>>();

        #[cfg(feature = "rayon")]
        let rebuilt = {
            use rayon::prelude::*;
            affected
                .par_iter()
                .map(|&builder| self.builders[builder].build_patches(&self.mesh))
                .collect::<Result<Vec<_>>>()?
        };

        #[cfg(not(feature = "rayon"))]
        let rebuilt = affected
            .iter()
            .map(|&builder| self.builders[builder].build_patches(&self.mesh))
            .collect::<Result<Vec<_>>>()?;

        let mut changed = Vec::new();
        for (builder, patches) in affected.into_iter().zip(rebuilt) {
            let offset = self.offsets[builder];
            for (k, patch) in patches.into_iter().enumerate() {
                self.patches[offset + k] = patch;
                changed.push(offset + k);
            }
        }

        log::debug!(
            "Moved {} vertices, rebuilt {} patches",
            edits.len(),
            changed.len()
        );
        Ok(changed)
    }

    /// Raise the degree of every builder by one step (capped at
    /// [`MAX_DEGREE`](crate::MAX_DEGREE)) and rebuild all patches.
    pub fn degree_raise(&mut self) -> Result<()> {
        for builder in &mut self.builders {
            builder.degree_raise();
        }
        self.patches = build_all_patches(&self.builders, &self.mesh)?;
        Ok(())
    }

    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[inline]
    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    #[inline]
    pub fn builders(&self) -> &[PatchBuilder] {
        &self.builders
    }

    #[inline]
    pub fn mesh(&self) -> &ControlMesh {
        &self.mesh
    }

    /// Give up the surface, keeping the edited mesh.
    pub fn into_mesh(self) -> ControlMesh {
        self.mesh
    }
}
