#![allow(dead_code)]
//! Meshes and paths shared by the integration tests.
use pnspline::{ControlMesh, Point};
use std::fs;
use std::path::PathBuf;

/// Get the path to the test output directory (in target)
pub fn test_output_dir() -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("test_output");

    // Create directory if it doesn't exist
    fs::create_dir_all(&path).expect("Failed to create test output directory");
    path
}

/// Get a path for a test output file
pub fn test_output_path(filename: &str) -> PathBuf {
    test_output_dir().join(filename)
}

/// The unit square as a single quad.
pub fn unit_quad() -> ControlMesh {
    ControlMesh::from_data(&unit_quad_vertices(), &[[0u32, 1, 2, 3]]).unwrap()
}

pub fn unit_quad_vertices() -> [Point; 4] {
    [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]
}

/// `n × n` quads over a wavy height field. Every face is regular.
pub fn lattice(n: u32) -> ControlMesh {
    let side = n + 1;
    let vertices = (0..side * side)
        .map(|v| {
            let (x, y) = ((v % side) as f64, (v / side) as f64);
            [x, y, 0.25 * (x * 0.7).sin() * (y * 1.3).cos()]
        })
        .collect::<Vec<_>>();
    let faces = (0..n * n)
        .map(|f| {
            let base = (f / n) * side + f % n;
            [base, base + 1, base + side + 1, base + side]
        })
        .collect::<Vec<_>>();
    ControlMesh::from_data(&vertices, &faces).unwrap()
}

/// The unit cube, outward facing. Every vertex has valence three.
pub fn cube() -> ControlMesh {
    let vertices = (0..8)
        .map(|v| [(v & 1) as f64, ((v >> 1) & 1) as f64, ((v >> 2) & 1) as f64])
        .collect::<Vec<_>>();
    let faces = [
        [0u32, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    ControlMesh::from_data(&vertices, &faces).unwrap()
}

/// A pentagon with a triangle and a quad attached to two of its edges.
pub fn mixed() -> ControlMesh {
    let mut vertices = (0..5)
        .map(|k| {
            let angle = k as f64 * std::f64::consts::TAU / 5.0;
            [angle.cos(), angle.sin(), 0.0]
        })
        .collect::<Vec<_>>();
    // Triangle apex beyond edge 0-1, quad beyond edge 2-3.
    vertices.push([1.2, 1.0, 0.3]);
    vertices.push([-1.3, 0.9, 0.2]);
    vertices.push([-1.5, -0.2, 0.1]);

    let faces: [&[u32]; 3] = [&[0, 1, 2, 3, 4], &[1, 0, 5], &[3, 2, 6, 7]];
    ControlMesh::from_data(&vertices, &faces).unwrap()
}

/// The cube as Wavefront OBJ text.
pub const CUBE_OBJ: &str = "\
# unit cube
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
v 0 0 1
v 1 0 1
v 0 1 1
v 1 1 1
f 1 3 4 2
f 5 6 8 7
f 1/1 2/2 6/3 5/4
f 3//1 7//1 8//1 4//1
f -8 -4 -2 -6
f 2 4 8 6
";
