//! Error types for the pnspline crate.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pnspline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A mesh file could not be read or decoded.
    #[error("Failed to load mesh from {}: {reason}", path.display())]
    MeshLoad { path: PathBuf, reason: String },

    /// Raw mesh data violates the mesh invariants.
    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),

    /// Vertex index outside `[0, len)`.
    #[error("Vertex index {index} out of range (vertex count: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The mesh a builder was classified against no longer covers its
    /// stencil. The mesh must be reclassified.
    #[error(
        "Stale patch builder: stencil references vertex {index} but the mesh has {vertex_count} \
         vertices"
    )]
    StaleBuilder { index: usize, vertex_count: usize },

    /// A builder was evaluated against a mesh that does not share its
    /// topology.
    #[error(
        "Incompatible topology: stencil references vertex {index} but the mesh has \
         {vertex_count} vertices"
    )]
    IncompatibleTopology { index: usize, vertex_count: usize },

    /// A patch failed geometric validity.
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    /// Degree elevation outside what is supported.
    #[error(
        "Unsupported degree ({}, {}) requested for a patch of degree ({}, {}); maximum is {max}",
        requested.0, requested.1, current.0, current.1
    )]
    UnsupportedDegree {
        requested: (usize, usize),
        current: (usize, usize),
        max: usize,
    },

    /// A consumer was used outside of its `start`/`stop` bracket.
    #[error("Cannot {operation} a consumer in state {state}")]
    ConsumerState {
        operation: &'static str,
        state: crate::consumer::ConsumerState,
    },

    /// A catalog produced a mask whose shape violates the builder
    /// invariants.
    #[error("Invalid mask shape: expected {expected:?}, got {actual:?}")]
    InvalidMask {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// IO error for file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Format error for export operations.
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),

    /// A file header timestamp could not be formatted.
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
