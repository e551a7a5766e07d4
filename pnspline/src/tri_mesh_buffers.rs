//! # Triangle Buffer Conversion
//!
//! Helper for turning patches into triangle mesh buffers for use with
//! realtime rendering or previewing.
use crate::Patch;
use itertools::{iproduct, Itertools};
use slice_of_array::prelude::*;

static EPSILON: f32 = 0.00000001;

type Vector = ultraviolet::vec::Vec3;
type Point = Vector;

/// How densely patches are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationOptions {
    /// Segments along each parametric direction of a patch.
    pub resolution: usize,
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self { resolution: 16 }
    }
}

/// Returns a flat [`u32`] triangle index buffer and two matching point and
/// normal buffers.
///
/// Every patch is sampled on a regular `(resolution + 1)²` grid. Points are
/// shared within a patch but not across patches. Invalid patches are
/// skipped.
pub fn to_triangle_mesh_buffers<'a>(
    patches: impl IntoIterator<Item = &'a Patch>,
    options: &TessellationOptions,
) -> (Vec<u32>, Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let resolution = options.resolution.max(1);
    let side = resolution + 1;

    let mut indices = Vec::new();
    let mut points = Vec::new();
    let mut normals = Vec::new();

    for patch in patches.into_iter().filter(|patch| patch.is_valid()) {
        let base = points.len();
        let parameter = |k: usize| k as f64 / resolution as f64;

        let samples = iproduct!(0..side, 0..side)
            .map(|(i, j)| {
                let (u, v) = (parameter(i), parameter(j));
                (to_f32(patch.evaluate(u, v)), patch.normal(u, v).map(to_f32))
            })
            .collect_vec();

        let patch_points = samples.iter().map(|(point, _)| *point).collect_vec();

        // Split each sample quad along its shorter diagonal.
        let local = |i: usize, j: usize| i * side + j;
        let triangles = iproduct!(0..resolution, 0..resolution)
            .flat_map(|(i, j)| {
                let quad = [
                    local(i, j),
                    local(i + 1, j),
                    local(i + 1, j + 1),
                    local(i, j + 1),
                ];
                let p = index_as_points(&quad, &patch_points);
                if (p[0] - p[2]).mag_sq() < (p[1] - p[3]).mag_sq() {
                    [quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]
                } else {
                    [quad[1], quad[2], quad[3], quad[1], quad[3], quad[0]]
                }
            })
            .collect_vec();

        let fallback = accumulated_normals(&triangles, &patch_points);
        normals.extend(
            samples
                .iter()
                .zip(fallback)
                .map(|((_, normal), fallback)| normal.unwrap_or(fallback)),
        );
        points.extend(patch_points);
        indices.extend(triangles.into_iter().map(|index| (base + index) as u32));
    }

    (indices, points, normals)
}

/// Like [`to_triangle_mesh_buffers()`] with the point and normal buffers
/// flattened to `[x0, y0, z0, x1, ..]`.
pub fn to_flat_triangle_mesh_buffers<'a>(
    patches: impl IntoIterator<Item = &'a Patch>,
    options: &TessellationOptions,
) -> (Vec<u32>, Vec<f32>, Vec<f32>) {
    let (indices, points, normals) = to_triangle_mesh_buffers(patches, options);
    (indices, points.flat().to_vec(), normals.flat().to_vec())
}

#[inline]
fn to_f32([x, y, z]: crate::Point) -> [f32; 3] {
    [x as f32, y as f32, z as f32]
}

#[inline]
fn orthogonal(v0: &Point, v1: &Point, v2: &Point) -> Vector {
    (*v1 - *v0).cross(*v2 - *v1)
}

#[inline]
fn index_as_points(face: &[usize], points: &[[f32; 3]]) -> Vec<Point> {
    face.iter()
        .map(|&index| Point::from(points[index]))
        .collect()
}

/// Area-weighted vertex normals from the triangles around each point.
/// Used where the surface normal is undefined.
fn accumulated_normals(triangles: &[usize], points: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector::zero(); points.len()];
    for triangle in triangles.chunks_exact(3) {
        let p = index_as_points(triangle, points);
        let normal = orthogonal(&p[0], &p[1], &p[2]);
        for &index in triangle {
            normals[index] += normal;
        }
    }
    normals
        .into_iter()
        .map(|normal| {
            let mag_sq = normal.mag_sq();
            // Degenerate neighbourhood.
            if mag_sq < EPSILON {
                [0.0; 3]
            } else {
                (normal / mag_sq.sqrt()).into()
            }
        })
        .collect()
}
