//! Quads inside a regular quad grid, as bicubic uniform B-spline patches.
//!
//! The 4×4 grid of B-spline control points around the face is gathered from
//! the face itself, its four edge neighbors and the four diagonal neighbors.
//! Where the grid runs off a mesh boundary the missing row or column is
//! extrapolated with the phantom-point rule `P₀ = 2·P₁ − P₂`, which makes the
//! surface interpolate the boundary. The mask is the B-spline to Bézier basis
//! change applied to that grid.
//!
//! Grid cell `(i, j)` has `i` along U and `j` along V. The face occupies the
//! centre cells; its vertices `v0..v3` sit at `(1, 1)`, `(2, 1)`, `(2, 2)`,
//! `(1, 2)`.
use super::{PatchFamily, PatchTemplate};
use crate::{mesh::MeshTopology, Index, Mask, PatchBuilder, Result};
use std::sync::Arc;

/// Uniform cubic B-spline to Bézier control points, per axis.
const BSPLINE_TO_BEZIER: [[f64; 4]; 4] = [
    [1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0, 0.0],
    [0.0, 4.0 / 6.0, 2.0 / 6.0, 0.0],
    [0.0, 2.0 / 6.0, 4.0 / 6.0, 0.0],
    [0.0, 1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0],
];

/// Every mask coefficient is a multiple of this.
const COEFFICIENT_DENOMINATOR: f64 = 36.0;

/// Face corner `k` as a grid cell.
const CORNER_CELLS: [(usize, usize); 4] = [(1, 1), (2, 1), (2, 2), (1, 2)];

/// Outward step across face edge `k` (from corner `k` to corner `k + 1`).
const EDGE_OUTWARD: [(isize, isize); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Diagonal cell beyond face corner `k`.
const DIAGONAL_CELLS: [(usize, usize); 4] = [(0, 0), (3, 0), (3, 3), (0, 3)];

type Cells = [[Option<Index>; 4]; 4];

/// Matches quads whose one-ring is a regular quad grid, possibly cut by the
/// mesh boundary.
#[derive(Debug, Clone)]
pub struct RegularTemplate {
    label: Arc<str>,
}

impl Default for RegularTemplate {
    fn default() -> Self {
        Self {
            label: PatchFamily::Regular.label(),
        }
    }
}

impl PatchTemplate for RegularTemplate {
    fn family(&self) -> &str {
        &self.label
    }

    fn matches(&self, topology: &MeshTopology, face: usize) -> bool {
        gather(topology, face).is_some()
    }

    fn patch_count(&self, _topology: &MeshTopology, _face: usize) -> usize {
        1
    }

    fn builder(&self, topology: &MeshTopology, face: usize) -> Result<PatchBuilder> {
        let cells = gather(topology, face).ok_or_else(|| {
            crate::Error::MalformedMesh(format!("Face {face} is not a regular quad."))
        })?;

        let (stencil, weights) = cell_weights(topology.face(face), &cells);
        let point_mask = bezier_mask(&weights, stencil.len());

        PatchBuilder::from_point_mask(self.label.clone(), stencil, &point_mask, (3, 3), 1)
    }
}

fn offset((i, j): (usize, usize), (di, dj): (isize, isize)) -> (usize, usize) {
    (i.wrapping_add_signed(di), j.wrapping_add_signed(dj))
}

/// Collect the real mesh vertices of the 4×4 grid around `face`. Cells past
/// a boundary stay `None`. Returns `None` if the neighborhood is not
/// regular.
fn gather(topology: &MeshTopology, face: usize) -> Option<Cells> {
    let vertices = topology.face(face);
    if vertices.len() != 4 {
        return None;
    }

    let mut cells: Cells = [[None; 4]; 4];
    for (k, &(i, j)) in CORNER_CELLS.iter().enumerate() {
        cells[i][j] = Some(vertices[k]);
    }

    // Edge neighbors.
    let mut across = [None; 4];
    for k in 0..4 {
        let (a, b) = (vertices[k], vertices[(k + 1) % 4]);
        let Some(other) = topology.opposite_face(a, b) else {
            continue;
        };
        let other_vertices = topology.face(other);
        if other_vertices.len() != 4 {
            return None;
        }
        // `other` runs b, a, x, y: x is next to a, y is next to b.
        let c = topology.corner_of(other, b)?;
        let x = other_vertices[(c + 2) % 4];
        let y = other_vertices[(c + 3) % 4];

        let (ai, aj) = offset(CORNER_CELLS[k], EDGE_OUTWARD[k]);
        let (bi, bj) = offset(CORNER_CELLS[(k + 1) % 4], EDGE_OUTWARD[k]);
        cells[ai][aj] = Some(x);
        cells[bi][bj] = Some(y);
        across[k] = Some(other);
    }

    // Corner rings.
    for k in 0..4 {
        let vertex = vertices[k];
        let incoming = across[(k + 3) % 4];
        let outgoing = across[k];
        let ring = topology.vertex_faces(vertex);

        match (incoming, outgoing) {
            (Some(incoming), Some(outgoing)) => {
                if ring.len() != 4 || topology.is_boundary_vertex(vertex) {
                    return None;
                }
                let &diagonal = ring
                    .iter()
                    .find(|&&f| f != face && f != incoming && f != outgoing)?;
                let diagonal_vertices = topology.face(diagonal);
                if diagonal_vertices.len() != 4 {
                    return None;
                }
                let c = topology.corner_of(diagonal, vertex)?;

                // The diagonal face must close the ring between the two edge
                // neighbors.
                let side_u = offset(CORNER_CELLS[k], EDGE_OUTWARD[k]);
                let side_v = offset(CORNER_CELLS[k], EDGE_OUTWARD[(k + 3) % 4]);
                let mut expected = [cells[side_u.0][side_u.1], cells[side_v.0][side_v.1]];
                let mut found = [
                    Some(diagonal_vertices[(c + 1) % 4]),
                    Some(diagonal_vertices[(c + 3) % 4]),
                ];
                expected.sort();
                found.sort();
                if expected != found {
                    return None;
                }

                let (di, dj) = DIAGONAL_CELLS[k];
                cells[di][dj] = Some(diagonal_vertices[(c + 2) % 4]);
            }
            (Some(_), None) | (None, Some(_)) => {
                if ring.len() != 2 || !topology.is_boundary_vertex(vertex) {
                    return None;
                }
            }
            (None, None) => {
                if ring.len() != 1 {
                    return None;
                }
            }
        }
    }

    Some(cells)
}

/// Express every grid cell as weights over a stencil of real vertices. The
/// stencil starts with the face vertices.
fn cell_weights(face: &[Index], cells: &Cells) -> (Vec<Index>, Vec<Vec<f64>>) {
    let mut stencil = face.to_vec();
    for index in cells.iter().flatten().flatten() {
        if !stencil.contains(index) {
            stencil.push(*index);
        }
    }
    let n = stencil.len();

    let mut weights: Vec<Vec<f64>> = vec![Vec::new(); 16];
    let at = |i: usize, j: usize| i * 4 + j;

    for (i, row) in cells.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if let Some(index) = cell {
                let mut w = vec![0.0; n];
                if let Some(column) = stencil.iter().position(|s| s == index) {
                    w[column] = 1.0;
                }
                weights[at(i, j)] = w;
            }
        }
    }

    let extrapolate = |weights: &[Vec<f64>], near: usize, far: usize| -> Vec<f64> {
        weights[near]
            .iter()
            .zip(&weights[far])
            .map(|(p1, p2)| 2.0 * p1 - p2)
            .collect()
    };

    // Phantom columns and rows next to the face.
    for j in 1..3 {
        if cells[0][j].is_none() {
            weights[at(0, j)] = extrapolate(&weights, at(1, j), at(2, j));
        }
        if cells[3][j].is_none() {
            weights[at(3, j)] = extrapolate(&weights, at(2, j), at(1, j));
        }
    }
    for i in 1..3 {
        if cells[i][0].is_none() {
            weights[at(i, 0)] = extrapolate(&weights, at(i, 1), at(i, 2));
        }
        if cells[i][3].is_none() {
            weights[at(i, 3)] = extrapolate(&weights, at(i, 2), at(i, 1));
        }
    }

    // Phantom corners extrapolate along the boundary they lie on.
    for (ci, cj) in DIAGONAL_CELLS {
        if cells[ci][cj].is_some() {
            continue;
        }
        let (near_i, far_i) = if ci == 0 { (1, 2) } else { (2, 1) };
        let (near_j, far_j) = if cj == 0 { (1, 2) } else { (2, 1) };
        weights[at(ci, cj)] = if cells[ci][near_j].is_none() {
            extrapolate(&weights, at(near_i, cj), at(far_i, cj))
        } else {
            extrapolate(&weights, at(ci, near_j), at(ci, far_j))
        };
    }

    (stencil, weights)
}

/// Point mask (16 × `stencil_len`) taking the stencil to the 16 Bézier
/// control points.
fn bezier_mask(weights: &[Vec<f64>], stencil_len: usize) -> Mask {
    let mut mask = Mask::new(16, stencil_len);
    for bi in 0..4 {
        for bj in 0..4 {
            let row = bi * 4 + bj;
            for a in 0..4 {
                for b in 0..4 {
                    let basis = BSPLINE_TO_BEZIER[bi][a] * BSPLINE_TO_BEZIER[bj][b];
                    if basis == 0.0 {
                        continue;
                    }
                    for (column, w) in weights[a * 4 + b].iter().enumerate() {
                        mask[(row, column)] += basis * w;
                    }
                }
            }
        }
    }

    // Remove rounding noise so that e.g. interpolated corners are exact.
    Mask::from_fn(16, stencil_len, |i, j| {
        (mask[(i, j)] * COEFFICIENT_DENOMINATOR).round() / COEFFICIENT_DENOMINATOR
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlMesh;

    /// `n × n` quads on the unit lattice.
    fn lattice(n: u32) -> ControlMesh {
        let side = n + 1;
        let vertices = (0..side * side)
            .map(|v| [(v % side) as f64, (v / side) as f64, 0.0])
            .collect::<Vec<_>>();
        let faces = (0..n * n)
            .map(|f| {
                let base = (f / n) * side + f % n;
                [base, base + 1, base + side + 1, base + side]
            })
            .collect::<Vec<_>>();
        ControlMesh::from_data(&vertices, &faces).unwrap()
    }

    #[test]
    fn interior_face_gathers_full_grid() {
        let mesh = lattice(3);
        let topology = MeshTopology::new(&mesh).unwrap();
        let cells = gather(&topology, 4).unwrap();
        assert!(cells.iter().flatten().all(Option::is_some));
        // Lattice vertex at (x, y) = (i, j).
        for (i, row) in cells.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                assert_eq!(cell.unwrap().0, (j * 4 + i) as u32);
            }
        }
    }

    #[test]
    fn corner_face_of_lattice() {
        let mesh = lattice(3);
        let topology = MeshTopology::new(&mesh).unwrap();
        let cells = gather(&topology, 0).unwrap();
        assert!(cells[0].iter().all(Option::is_none));
        assert!(cells.iter().all(|row| row[0].is_none()));
        assert_eq!(cells[3][3], Some(Index(10)));
    }

    #[test]
    fn rows_are_affine() {
        let mesh = lattice(2);
        let topology = MeshTopology::new(&mesh).unwrap();
        let cells = gather(&topology, 0).unwrap();
        let (stencil, weights) = cell_weights(topology.face(0), &cells);
        let mask = bezier_mask(&weights, stencil.len());
        for row in mask.iter_rows() {
            approx::assert_relative_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn valence_three_corner_is_not_regular() {
        // Three quads around vertex 0.
        let vertices = [[0.0; 3]; 7];
        let mesh = ControlMesh::from_data(
            &vertices,
            &[[0u32, 1, 2, 3], [0, 3, 4, 5], [0, 5, 6, 1]],
        )
        .unwrap();
        let topology = MeshTopology::new(&mesh).unwrap();
        assert!(gather(&topology, 0).is_none());
    }
}
