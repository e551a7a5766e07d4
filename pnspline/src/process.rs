//! Mesh to patch file pipeline.
//!
//! Two ways of driving it:
//!
//! * One-shot: [`process_mesh()`] classifies, builds and streams every patch
//!   into a consumer the caller has started. The `create_*()` functions and
//!   [`export()`] additionally open, start and stop a file writer.
//!
//! * Decomposed: [`get_patch_builders()`] once, then [`build_patches()`] as
//!   often as needed, e.g. after editing vertices with
//!   [`ControlMesh::set_vertex()`]. Classification is not repeated.
use crate::{
    catalog::{BuiltinCatalog, PatchCatalog},
    consumer::{BvWriter, ExportFormat, IgesWriter, PatchConsumer, StepWriter},
    ControlMesh, Patch, PatchBuilder, Result,
};
use std::path::Path;

/// Options for [`process_mesh()`] and the export functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessOptions {
    /// Raise the degree of every patch by one step before it is consumed,
    /// as [`Patch::degree_raise()`] does. Bilinear patches become
    /// biquadratic; bicubic patches are left alone.
    pub degree_raise: bool,
}

/// What a [`process_mesh()`] run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessStats {
    pub builders: usize,
    /// Patches handed to the consumer.
    pub patches: usize,
    /// Invalid patches left out.
    pub skipped: usize,
}

/// Classify `mesh` with the [`BuiltinCatalog`].
///
/// A mesh without faces yields no builders.
pub fn get_patch_builders(mesh: &ControlMesh) -> Result<Vec<PatchBuilder>> {
    get_patch_builders_with(mesh, &BuiltinCatalog::default())
}

/// Classify `mesh` with `catalog`.
///
/// The builders remember `mesh` (and its clones) as their source so that
/// evaluating them after its topology changed reports
/// [`Error::StaleBuilder`](crate::Error::StaleBuilder).
pub fn get_patch_builders_with(
    mesh: &ControlMesh,
    catalog: &impl PatchCatalog,
) -> Result<Vec<PatchBuilder>> {
    let builders = catalog
        .classify(mesh)?
        .into_iter()
        .map(|builder| builder.with_source(mesh))
        .collect::<Vec<_>>();

    log::debug!(
        "Classified {} faces into {} builders",
        mesh.face_count(),
        builders.len()
    );
    Ok(builders)
}

/// Evaluate `builder` against the current vertex positions of `mesh`.
///
/// This is the same as [`PatchBuilder::build_patches()`].
#[inline]
pub fn build_patches(builder: &PatchBuilder, mesh: &ControlMesh) -> Result<Vec<Patch>> {
    builder.build_patches(mesh)
}

/// Classify `mesh`, build every patch and feed it to `consumer` in builder
/// order.
///
/// The consumer must already be started and is left started. Invalid
/// patches are skipped with a warning. With
/// [`degree_raise`](ProcessOptions::degree_raise) every patch is raised by
/// one degree, capped at [`MAX_DEGREE`](crate::MAX_DEGREE), first.
pub fn process_mesh(
    mesh: &ControlMesh,
    mut consumer: impl PatchConsumer,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    let builders = get_patch_builders(mesh)?;
    let mut stats = ProcessStats {
        builders: builders.len(),
        ..Default::default()
    };

    for (index, builder) in builders.iter().enumerate() {
        for mut patch in builder.build_patches(mesh)? {
            if !patch.is_valid() {
                log::warn!(
                    "Skipping invalid {} patch of builder {index}",
                    builder.family()
                );
                stats.skipped += 1;
                continue;
            }
            if options.degree_raise {
                patch.degree_raise();
            }
            consumer.consume(&patch)?;
            stats.patches += 1;
        }
    }

    log::info!(
        "Processed {} builders: {} patches, {} skipped",
        stats.builders,
        stats.patches,
        stats.skipped
    );
    Ok(stats)
}

/// Run [`process_mesh()`] between `start()` and `stop()` of `consumer`.
fn run(
    mesh: &ControlMesh,
    mut consumer: impl PatchConsumer,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    consumer.start()?;
    let stats = process_mesh(mesh, &mut consumer, options)?;
    consumer.stop()?;
    Ok(stats)
}

/// Write all patches of `mesh` to `path` in `format`.
pub fn export(
    mesh: &ControlMesh,
    format: ExportFormat,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    run(mesh, format.create(path)?, options)
}

/// Write all patches of `mesh` to a BV file.
pub fn create_bv(
    mesh: &ControlMesh,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    run(mesh, BvWriter::create(path)?, options)
}

/// Write all patches of `mesh` to an IGES file.
pub fn create_igs(
    mesh: &ControlMesh,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    run(mesh, IgesWriter::create(path)?, options)
}

/// Write all patches of `mesh` to a STEP file.
pub fn create_step(
    mesh: &ControlMesh,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    run(mesh, StepWriter::create(path)?, options)
}

/// Load the mesh at `mesh_path` and write its patches to a BV file.
pub fn create_bv_from_file(
    mesh_path: impl AsRef<Path>,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    create_bv(&ControlMesh::from_file(mesh_path)?, path, options)
}

/// Load the mesh at `mesh_path` and write its patches to an IGES file.
pub fn create_igs_from_file(
    mesh_path: impl AsRef<Path>,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    create_igs(&ControlMesh::from_file(mesh_path)?, path, options)
}

/// Load the mesh at `mesh_path` and write its patches to a STEP file.
pub fn create_step_from_file(
    mesh_path: impl AsRef<Path>,
    path: impl AsRef<Path>,
    options: &ProcessOptions,
) -> Result<ProcessStats> {
    create_step(&ControlMesh::from_file(mesh_path)?, path, options)
}
