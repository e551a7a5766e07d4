//! Classification of mesh neighborhoods into patch families.
//!
//! A [`PatchCatalog`] turns a whole mesh into [`PatchBuilder`]s. The
//! [`BuiltinCatalog`] does this face by face: every face is offered to a
//! list of [`PatchTemplate`]s and the first one that matches produces the
//! builder for that face. Each face is covered by exactly one builder.
//!
//! Geometry kernels with their own mask tables plug in either as a whole
//! catalog or as additional templates.
use crate::{mesh::MeshTopology, ControlMesh, Error, PatchBuilder, Result};
use derive_more::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::{collections::BTreeMap, sync::Arc};

mod bilinear;
mod regular;

pub use bilinear::{IrregularQuadTemplate, PolygonTemplate};
pub use regular::RegularTemplate;

/// The patch families known to the [`BuiltinCatalog`].
///
/// The display form is the group label written to patch files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum PatchFamily {
    /// Quad in a regular quad grid. Bicubic, one patch.
    #[display("Group 0 Regular")]
    Regular = 0,
    /// Any other quad. Bilinear, one patch.
    #[display("Group 1 Irregular")]
    Irregular = 1,
    /// Non-quad face with `n` sides. Bilinear, `n` patches.
    #[display("Group 2 Polygon")]
    Polygon = 2,
}

impl PatchFamily {
    /// The label as a shared string, for builders.
    pub fn label(self) -> Arc<str> {
        self.to_string().into()
    }
}

/// Maps a mesh to the builders covering it.
pub trait PatchCatalog {
    /// Classify `mesh` into builders. The patches of all builders cover
    /// every face exactly once.
    fn classify(&self, mesh: &ControlMesh) -> Result<Vec<PatchBuilder>>;

    /// Number of patches the builders returned by [`classify()`] yield in
    /// total, computed without building masks.
    ///
    /// [`classify()`]: Self::classify
    fn expected_patch_count(&self, mesh: &ControlMesh) -> Result<usize>;
}

/// One patch family of a face-centred catalog.
pub trait PatchTemplate: Send + Sync {
    /// Group label of the patches this template produces.
    fn family(&self) -> &str;

    /// `true` if the neighborhood of `face` has the shape of this family.
    fn matches(&self, topology: &MeshTopology, face: usize) -> bool;

    /// Number of patches a matching `face` yields.
    fn patch_count(&self, topology: &MeshTopology, face: usize) -> usize;

    /// Build the stencil and mask for a matching `face`.
    fn builder(&self, topology: &MeshTopology, face: usize) -> Result<PatchBuilder>;
}

/// Face-centred catalog trying its templates in order.
///
/// The default template list is [`RegularTemplate`], [`PolygonTemplate`],
/// [`IrregularQuadTemplate`], which together match every face.
pub struct BuiltinCatalog {
    templates: Vec<Box<dyn PatchTemplate>>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self {
            templates: vec![
                Box::new(RegularTemplate::default()),
                Box::new(PolygonTemplate::default()),
                Box::new(IrregularQuadTemplate::default()),
            ],
        }
    }
}

impl std::fmt::Debug for BuiltinCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.templates.iter().map(|template| template.family()))
            .finish()
    }
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog without templates. Every face fails to classify until
    /// templates are added.
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Try `template` before all templates already in the catalog.
    pub fn with_template(mut self, template: impl PatchTemplate + 'static) -> Self {
        self.templates.insert(0, Box::new(template));
        self
    }

    fn template_for(&self, topology: &MeshTopology, face: usize) -> Result<&dyn PatchTemplate> {
        self.templates
            .iter()
            .map(Box::as_ref)
            .find(|template| template.matches(topology, face))
            .ok_or_else(|| {
                Error::MalformedMesh(format!(
                    "No patch template matches face {} ({} vertices).",
                    face,
                    topology.face(face).len()
                ))
            })
    }
}

impl PatchCatalog for BuiltinCatalog {
    fn classify(&self, mesh: &ControlMesh) -> Result<Vec<PatchBuilder>> {
        let topology = MeshTopology::new(mesh)?;

        let builders = (0..topology.face_count())
            .map(|face| self.template_for(&topology, face)?.builder(&topology, face))
            .collect::<Result<Vec<_>>>()?;

        if log::log_enabled!(log::Level::Debug) {
            let mut per_family = BTreeMap::<&str, (usize, usize)>::new();
            for builder in &builders {
                let entry = per_family.entry(builder.family()).or_default();
                entry.0 += 1;
                entry.1 += builder.patch_count();
            }
            for (family, (builders, patches)) in per_family {
                log::debug!("{family}: {builders} builders, {patches} patches");
            }
        }

        Ok(builders)
    }

    fn expected_patch_count(&self, mesh: &ControlMesh) -> Result<usize> {
        let topology = MeshTopology::new(mesh)?;
        (0..topology.face_count())
            .map(|face| Ok(self.template_for(&topology, face)?.patch_count(&topology, face)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_labels() {
        assert_eq!(PatchFamily::Regular.to_string(), "Group 0 Regular");
        assert_eq!(u8::from(PatchFamily::Polygon), 2);
        assert_eq!(PatchFamily::try_from(1u8).unwrap(), PatchFamily::Irregular);
        assert!(PatchFamily::try_from(7u8).is_err());
    }

    #[test]
    fn empty_catalog_rejects_faces() {
        let mesh = ControlMesh::from_data(&[[0.0; 3]; 3], &[[0u32, 1, 2]]).unwrap();
        assert!(matches!(
            BuiltinCatalog::empty().classify(&mesh),
            Err(Error::MalformedMesh(_))
        ));
    }
}
