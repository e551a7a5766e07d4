//#![warn(missing_docs)]
//! # Polyhedral-Net Spline Patches
//!
//! Converts polygonal control meshes into smooth Bernstein–Bézier surface
//! patches and streams those patches to surface-file writers (BV, IGES,
//! STEP).
//!
//! The crate separates a one-time topological step from a cheap, repeatable
//! numeric step:
//!
//! 1. A [`PatchCatalog`](catalog::PatchCatalog) classifies the neighborhood
//!    of every face of a [`ControlMesh`] into a known patch family and
//!    returns one [`PatchBuilder`] per neighborhood.
//! 2. A builder holds a vertex stencil and a [`Mask`]. Evaluating it against
//!    the current vertex positions is a single matrix product
//!    (`mask · positions`) that yields one or more [`Patch`]es.
//! 3. Patches are fed to a [`PatchConsumer`](consumer::PatchConsumer).
//!
//! Editing vertex positions only requires step 2 to be repeated. See
//! [`Surface`] for a container that does this incrementally.
//!
//! ```
//! use pnspline::{process, ControlMesh};
//!
//! let mesh = ControlMesh::from_data(
//!     &[
//!         [0.0, 0.0, 0.0],
//!         [1.0, 0.0, 0.0],
//!         [1.0, 1.0, 0.0],
//!         [0.0, 1.0, 0.0],
//!     ],
//!     &[[0u32, 1, 2, 3]],
//! )?;
//!
//! let builders = process::get_patch_builders(&mesh)?;
//! assert_eq!(builders.len(), 1);
//!
//! let patches = process::build_patches(&builders[0], &mesh)?;
//! assert!(patches[0].is_valid());
//! assert_eq!(patches[0].corners()?[0], [0.0, 0.0, 0.0]);
//! # Ok::<(), pnspline::Error>(())
//! ```
//!
//! ## Cargo Features
#![doc = document_features::document_features!()]
//!
//! ## Naming
//!
//! * Counts use `_count()`/`len()`, never `num_`.
//! * Option structs use the [init struct
//!   pattern](https://xaeroxe.github.io/init-struct-pattern/), e.g.
//!   [`ProcessOptions`].
//! * Indices are unsigned. Vertex indices are wrapped in [`Index`].

pub mod catalog;
pub mod consumer;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod patch;
pub mod process;
pub mod surface;

#[cfg(feature = "tri_mesh_buffers")]
pub mod tri_mesh_buffers;

pub use error::{Error, Result};
pub use grid::{Grid, Mask};
pub use mesh::ControlMesh;
pub use patch::{Patch, PatchBuilder, MAX_DEGREE};
pub use process::{ProcessOptions, ProcessStats};
pub use surface::Surface;

use derive_more::{Display, From, Into};

/// A 3-D position.
pub type Point = [f64; 3];

/// A vertex index into a [`ControlMesh`].
///
/// # Examples
///
/// ```
/// use pnspline::Index;
///
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
///
/// let idx = Index::from(100usize);
/// let as_usize: usize = idx.into();
/// assert_eq!(as_usize, 100);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, From, Into,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}

impl Index {
    /// The index as a `usize`, for slice access.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}
