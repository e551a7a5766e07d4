use super::ControlMesh;
use crate::{Error, Index, Result};
use std::collections::HashMap;

/// Read-only adjacency queries over a [`ControlMesh`].
///
/// Built once per classification. Faces are expected to be consistently
/// oriented; an edge is interior when both of its directed halves belong to
/// a face.
#[derive(Debug)]
pub struct MeshTopology<'a> {
    mesh: &'a ControlMesh,
    edge_faces: HashMap<(Index, Index), usize>,
    vertex_faces: Vec<Vec<usize>>,
}

impl<'a> MeshTopology<'a> {
    /// With the `topology_validation` feature this fails with
    /// [`Error::MalformedMesh`] on faces that repeat a vertex and on directed
    /// edges used by more than one face.
    pub fn new(mesh: &'a ControlMesh) -> Result<Self> {
        let mut edge_faces = HashMap::with_capacity(mesh.faces().iter().map(Vec::len).sum());
        let mut vertex_faces = vec![Vec::new(); mesh.vertex_count()];

        for (face_index, face) in mesh.faces().iter().enumerate() {
            for (corner, &vertex) in face.iter().enumerate() {
                let next = face[(corner + 1) % face.len()];

                #[cfg(feature = "topology_validation")]
                if face[corner + 1..].contains(&vertex) {
                    return Err(Error::MalformedMesh(format!(
                        "Face {face_index} references vertex {vertex} more than once."
                    )));
                }

                let previous = edge_faces.insert((vertex, next), face_index);

                #[cfg(feature = "topology_validation")]
                if let Some(other) = previous {
                    return Err(Error::MalformedMesh(format!(
                        "Edge {vertex} -> {next} is shared by faces {other} and {face_index} \
                         (non-manifold or inconsistently oriented)."
                    )));
                }
                #[cfg(not(feature = "topology_validation"))]
                let _ = previous;

                vertex_faces[vertex.get()].push(face_index);
            }
        }

        Ok(Self {
            mesh,
            edge_faces,
            vertex_faces,
        })
    }

    #[inline]
    pub fn mesh(&self) -> &'a ControlMesh {
        self.mesh
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    /// The vertices of `face`.
    ///
    /// # Panics
    ///
    /// If `face >= face_count()`.
    #[inline]
    pub fn face(&self, face: usize) -> &'a [Index] {
        &self.mesh.faces()[face]
    }

    /// The face containing the directed edge `from -> to`.
    #[inline]
    pub fn edge_face(&self, from: Index, to: Index) -> Option<usize> {
        self.edge_faces.get(&(from, to)).copied()
    }

    /// The face across the edge `from -> to`, i.e. the one containing `to ->
    /// from`.
    #[inline]
    pub fn opposite_face(&self, from: Index, to: Index) -> Option<usize> {
        self.edge_face(to, from)
    }

    /// Faces incident to `vertex`.
    #[inline]
    pub fn vertex_faces(&self, vertex: Index) -> &[usize] {
        self.vertex_faces
            .get(vertex.get())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct edges incident to `vertex`.
    pub fn valence(&self, vertex: Index) -> usize {
        let mut neighbors = self
            .vertex_faces(vertex)
            .iter()
            .flat_map(|&face| {
                let (prev, next) = self.corner_neighbors(face, vertex);
                [prev, next]
            })
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.len()
    }

    /// `true` if `from -> to` has no face on its other side.
    #[inline]
    pub fn is_boundary_edge(&self, from: Index, to: Index) -> bool {
        self.opposite_face(from, to).is_none()
    }

    /// `true` if `vertex` lies on a boundary edge or has no faces at all.
    pub fn is_boundary_vertex(&self, vertex: Index) -> bool {
        let faces = self.vertex_faces(vertex);
        faces.is_empty()
            || faces.iter().any(|&face| {
                let (prev, next) = self.corner_neighbors(face, vertex);
                self.is_boundary_edge(vertex, next) || self.is_boundary_edge(prev, vertex)
            })
    }

    /// Position of `vertex` within `face`.
    pub fn corner_of(&self, face: usize, vertex: Index) -> Option<usize> {
        self.face(face).iter().position(|&v| v == vertex)
    }

    /// The vertices before and after `vertex` in `face`.
    fn corner_neighbors(&self, face: usize, vertex: Index) -> (Index, Index) {
        let vertices = self.face(face);
        let n = vertices.len();
        let corner = self.corner_of(face, vertex).unwrap_or_default();
        (vertices[(corner + n - 1) % n], vertices[(corner + 1) % n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2×2 quad grid, vertex 4 in the middle.
    fn grid_mesh() -> ControlMesh {
        let vertices = (0..9)
            .map(|i| [(i % 3) as f64, (i / 3) as f64, 0.0])
            .collect::<Vec<_>>();
        ControlMesh::from_data(
            &vertices,
            &[[0u32, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]],
        )
        .unwrap()
    }

    #[test]
    fn adjacency() {
        let mesh = grid_mesh();
        let topology = MeshTopology::new(&mesh).unwrap();

        assert_eq!(topology.opposite_face(Index(1), Index(4)), Some(1));
        assert!(topology.is_boundary_edge(Index(0), Index(1)));
        assert_eq!(topology.vertex_faces(Index(4)).len(), 4);
        assert_eq!(topology.valence(Index(4)), 4);
        assert_eq!(topology.valence(Index(0)), 2);
        assert!(!topology.is_boundary_vertex(Index(4)));
        assert!(topology.is_boundary_vertex(Index(1)));
    }

    #[cfg(feature = "topology_validation")]
    #[test]
    fn rejects_flipped_neighbor() {
        let vertices = [[0.0; 3]; 6];
        let mesh = ControlMesh::from_data(&vertices, &[[0u32, 1, 4, 3], [1, 4, 5, 2]]).unwrap();
        assert!(matches!(
            MeshTopology::new(&mesh),
            Err(Error::MalformedMesh(_))
        ));
    }
}
