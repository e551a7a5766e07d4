//! The editable polygon control mesh.
//!
//! A [`ControlMesh`] owns vertex positions and face connectivity. Vertex
//! positions are the only thing that changes after construction; faces and
//! vertex ordering are fixed for the lifetime of the mesh. Builders derived
//! from a mesh keep referring to vertices by [`Index`].
use crate::{Error, Index, Point, Result};
use std::{
    io::Write,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

pub mod io;
mod topology;

pub use io::MeshFormat;
pub use topology::MeshTopology;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies the lineage of a mesh. Clones share the id of their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A polygon mesh whose vertices act as control points.
#[derive(Debug, Clone)]
pub struct ControlMesh {
    id: MeshId,
    vertices: Vec<Point>,
    faces: Vec<Vec<Index>>,
}

impl Default for ControlMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ControlMesh {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices && self.faces == other.faces
    }
}

impl ControlMesh {
    /// Create an empty mesh. It classifies into zero builders.
    pub fn new() -> Self {
        Self {
            id: MeshId::next(),
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertex positions and a list of variable-size faces.
    ///
    /// Fails with [`Error::MalformedMesh`] if a face has fewer than three
    /// vertices or references a vertex that does not exist.
    pub fn from_data<F: AsRef<[u32]>>(vertices: &[Point], faces: &[F]) -> Result<Self> {
        let vertex_count = vertices.len();

        let faces = faces
            .iter()
            .enumerate()
            .map(|(face_index, face)| {
                let face = face.as_ref();
                if face.len() < 3 {
                    return Err(Error::MalformedMesh(format!(
                        "Face {} has {} vertices (should be >= 3).",
                        face_index,
                        face.len()
                    )));
                }
                face.iter()
                    .map(|&vertex| {
                        if vertex as usize >= vertex_count {
                            Err(Error::MalformedMesh(format!(
                                "Vertex index {} of face {} is out of range (should be < {}).",
                                vertex, face_index, vertex_count
                            )))
                        } else {
                            Ok(Index(vertex))
                        }
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: MeshId::next(),
            vertices: vertices.to_vec(),
            faces,
        })
    }

    /// Create a mesh from flattened buffers: three coordinates per vertex,
    /// the arity of every face and the concatenated face vertex indices.
    pub fn from_flat(
        positions: &[f64],
        face_arities: &[u32],
        face_indices: &[u32],
    ) -> Result<Self> {
        let vertices: &[Point] = bytemuck::try_cast_slice(positions).map_err(|_| {
            Error::MalformedMesh(format!(
                "Position buffer length {} is not a multiple of 3.",
                positions.len()
            ))
        })?;

        let expected: usize = face_arities.iter().map(|&arity| arity as usize).sum();
        if expected != face_indices.len() {
            return Err(Error::MalformedMesh(format!(
                "Face arities sum to {} but {} face indices were given.",
                expected,
                face_indices.len()
            )));
        }

        let mut offset = 0;
        let faces = face_arities
            .iter()
            .map(|&arity| {
                let face = &face_indices[offset..offset + arity as usize];
                offset += arity as usize;
                face
            })
            .collect::<Vec<_>>();

        Self::from_data(vertices, &faces)
    }

    /// Load a mesh from a file. The format is picked from the extension, see
    /// [`MeshFormat`].
    ///
    /// Fails with [`Error::MeshLoad`] if the file cannot be read or decoded,
    /// or contains no vertices.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        io::read_file(path.as_ref())
    }

    /// Decode a mesh from a reader.
    pub fn read(reader: impl std::io::BufRead, format: MeshFormat) -> Result<Self> {
        io::read(reader, format, Path::new("<stream>"))
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Position of the vertex at `index`.
    pub fn vertex(&self, index: usize) -> Result<Point> {
        self.vertices
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.vertices.len(),
            })
    }

    /// Move the vertex at `index`.
    ///
    /// Patches built before this call are not affected. Builders that
    /// reference the vertex produce different patches on their next
    /// evaluation.
    pub fn set_vertex(&mut self, index: usize, position: Point) -> Result<()> {
        let len = self.vertices.len();
        let vertex = self
            .vertices
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        *vertex = position;
        Ok(())
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Vertex positions as a flat `xyz` buffer.
    #[inline]
    pub fn flat_vertices(&self) -> &[f64] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// All faces. Each face keeps its own arity.
    #[inline]
    pub fn faces(&self) -> &[Vec<Index>] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, index: usize) -> Option<&[Index]> {
        self.faces.get(index).map(Vec::as_slice)
    }

    /// Write the mesh as Wavefront OBJ.
    pub fn write_obj(&self, mut writer: impl Write) -> Result<()> {
        writeln!(writer, "# Wavefront OBJ exported by pnspline")?;
        writeln!(
            writer,
            "# {} vertices, {} faces",
            self.vertex_count(),
            self.face_count()
        )?;
        for [x, y, z] in &self.vertices {
            writeln!(writer, "v {x} {y} {z}")?;
        }
        for face in &self.faces {
            write!(writer, "f")?;
            for index in face {
                write!(writer, " {}", index.0 + 1)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn id(&self) -> MeshId {
        self.id
    }

    /// Gather the positions of `stencil` as a flat `xyz` buffer.
    ///
    /// Callers check the stencil against [`vertex_count()`](Self::vertex_count)
    /// first.
    pub(crate) fn gather(&self, stencil: &[Index]) -> Vec<f64> {
        stencil
            .iter()
            .flat_map(|index| self.vertices[index.get()])
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn with_id_of(mut self, other: &ControlMesh) -> Self {
        self.id = other.id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_lineage() {
        let mesh = ControlMesh::new();
        let copy = mesh.clone();
        assert_eq!(mesh.id(), copy.id());
        assert_ne!(mesh.id(), ControlMesh::new().id());
    }

    #[test]
    fn gather_flattens_in_stencil_order() {
        let mesh =
            ControlMesh::from_data(&[[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]], &[] as &[[u32; 3]])
                .unwrap();
        assert_eq!(
            mesh.gather(&[Index(1), Index(0)]),
            vec![3.0, 4.0, 5.0, 0.0, 1.0, 2.0]
        );
    }
}
