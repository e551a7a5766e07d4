//! Bézier patches and the builders that produce them.
use crate::{Error, Grid, Point, Result};
use std::sync::Arc;

mod builder;
pub(crate) mod elevation;

pub use builder::{build_all_patches, PatchBuilder};

/// Highest degree per axis that patches are elevated to.
pub const MAX_DEGREE: usize = 3;

/// A tensor-product Bernstein–Bézier patch.
///
/// The control grid has `deg_u + 1` rows and `deg_v + 1` columns; element
/// `(i, j)` is the control point with index `i` along U and `j` along V.
///
/// A patch is a snapshot: it does not change when the mesh it was built
/// from is edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    group: Arc<str>,
    control_points: Grid<Point>,
    valid: bool,
}

impl Patch {
    pub(crate) fn new(group: Arc<str>, control_points: Grid<Point>) -> Self {
        let valid = is_usable(&control_points);
        Self {
            group,
            control_points,
            valid,
        }
    }

    /// `(deg_u, deg_v)`.
    #[inline]
    pub fn degree(&self) -> (usize, usize) {
        (self.deg_u(), self.deg_v())
    }

    #[inline]
    pub fn deg_u(&self) -> usize {
        self.control_points.rows() - 1
    }

    #[inline]
    pub fn deg_v(&self) -> usize {
        self.control_points.cols() - 1
    }

    /// Name of the patch family that produced this patch.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// `false` if the control grid contains non-finite coordinates or
    /// collapses to a single point.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The control grid. Fails with [`Error::InvalidPatch`] on invalid
    /// patches.
    pub fn control_points(&self) -> Result<&Grid<Point>> {
        if self.valid {
            Ok(&self.control_points)
        } else {
            Err(Error::InvalidPatch(format!(
                "{} patch of degree ({}, {}) has a degenerate control grid",
                self.group,
                self.deg_u(),
                self.deg_v()
            )))
        }
    }

    /// Control point `(i, j)`.
    pub fn control_point(&self, i: usize, j: usize) -> Result<Point> {
        let points = self.control_points()?;
        points.get(i, j).copied().ok_or(Error::IndexOutOfRange {
            index: i * points.cols() + j,
            len: points.len(),
        })
    }

    /// The corner control points in the order `(0, 0)`, `(deg_u, 0)`,
    /// `(deg_u, deg_v)`, `(0, deg_v)`.
    pub fn corners(&self) -> Result<[Point; 4]> {
        let points = self.control_points()?;
        let (du, dv) = self.degree();
        Ok([
            points[(0, 0)],
            points[(du, 0)],
            points[(du, dv)],
            points[(0, dv)],
        ])
    }

    /// Raise the degree of every axis below [`MAX_DEGREE`] by one. Axes at
    /// the cap are left alone, so this is a no-op on bicubic patches.
    pub fn degree_raise(&mut self) {
        let target = elevation::next_step(self.degree());
        if target != self.degree() {
            self.replace_points(elevation::elevate_points(&self.control_points, target));
        }
    }

    /// Elevate to `(deg_u, deg_v)`.
    ///
    /// Requesting the current degree is a no-op. Lowering a degree or raising
    /// one past [`MAX_DEGREE`] fails with [`Error::UnsupportedDegree`].
    pub fn elevate_to(&mut self, deg_u: usize, deg_v: usize) -> Result<()> {
        let target = (deg_u, deg_v);
        elevation::check_target(self.degree(), target)?;
        if target != self.degree() {
            self.replace_points(elevation::elevate_points(&self.control_points, target));
        }
        Ok(())
    }

    /// Surface point at `(u, v)` in `[0, 1]²`.
    pub fn evaluate(&self, u: f64, v: f64) -> Point {
        evaluate_grid(
            self.control_points.as_slice(),
            self.control_points.cols(),
            u,
            v,
        )
    }

    /// Unit surface normal at `(u, v)`.
    ///
    /// Where the partial derivatives are parallel (collapsed edges) the
    /// normal is taken slightly inside the patch. Returns `None` if it is
    /// still undefined there.
    pub fn normal(&self, u: f64, v: f64) -> Option<Point> {
        [0.0, 1e-4, 1e-2]
            .into_iter()
            .map(|t| (u + (0.5 - u) * t, v + (0.5 - v) * t))
            .find_map(|(u, v)| {
                let (du, dv) = self.partials(u, v);
                normalize(cross(du, dv))
            })
    }

    /// `(∂S/∂u, ∂S/∂v)` at `(u, v)`.
    pub fn partials(&self, u: f64, v: f64) -> (Point, Point) {
        let (deg_u, deg_v) = self.degree();
        let points = &self.control_points;
        let cols = deg_v + 1;

        let d_u = if deg_u == 0 {
            [0.0; 3]
        } else {
            let differences = (0..deg_u)
                .flat_map(|i| (0..cols).map(move |j| (i, j)))
                .map(|(i, j)| scale(sub(points[(i + 1, j)], points[(i, j)]), deg_u as f64))
                .collect::<Vec<_>>();
            evaluate_grid(&differences, cols, u, v)
        };

        let d_v = if deg_v == 0 {
            [0.0; 3]
        } else {
            let differences = (0..=deg_u)
                .flat_map(|i| (0..deg_v).map(move |j| (i, j)))
                .map(|(i, j)| scale(sub(points[(i, j + 1)], points[(i, j)]), deg_v as f64))
                .collect::<Vec<_>>();
            evaluate_grid(&differences, deg_v, u, v)
        };

        (d_u, d_v)
    }

    fn replace_points(&mut self, control_points: Grid<Point>) {
        self.valid = is_usable(&control_points);
        self.control_points = control_points;
    }
}

fn is_usable(points: &Grid<Point>) -> bool {
    let Some(first) = points.as_slice().first() else {
        return false;
    };
    if !points.as_slice().iter().flatten().all(|c| c.is_finite()) {
        return false;
    }
    let magnitude = points
        .as_slice()
        .iter()
        .flatten()
        .fold(1.0_f64, |m, c| m.max(c.abs()));
    points.as_slice().iter().any(|p| {
        p.iter()
            .zip(first)
            .any(|(a, b)| (a - b).abs() > 1e-12 * magnitude)
    })
}

/// De Casteljau on a row-major grid with `cols` columns.
fn evaluate_grid(points: &[Point], cols: usize, u: f64, v: f64) -> Point {
    let mut rows = points
        .chunks_exact(cols)
        .map(|row| de_casteljau(&mut row.to_vec(), v))
        .collect::<Vec<_>>();
    de_casteljau(&mut rows, u)
}

fn de_casteljau(points: &mut [Point], t: f64) -> Point {
    for level in (1..points.len()).rev() {
        for i in 0..level {
            points[i] = lerp(points[i], points[i + 1], t);
        }
    }
    points.first().copied().unwrap_or_default()
}

#[inline]
fn lerp(a: Point, b: Point, t: f64) -> Point {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[inline]
fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn scale(a: Point, s: f64) -> Point {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(a: Point) -> Option<Point> {
    let length = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    (length > 1e-12 && length.is_finite()).then(|| scale(a, 1.0 / length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bilinear() -> Patch {
        let points = Grid::from_vec(
            2,
            2,
            vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
        )
        .unwrap();
        Patch::new("test".into(), points)
    }

    #[test]
    fn evaluate_corners_and_center() {
        let patch = bilinear();
        assert_eq!(patch.evaluate(0.0, 0.0), [0.0, 0.0, 0.0]);
        assert_eq!(patch.evaluate(1.0, 0.0), [1.0, 0.0, 0.0]);
        assert_eq!(patch.evaluate(0.0, 1.0), [0.0, 1.0, 0.0]);
        let center = patch.evaluate(0.5, 0.5);
        assert_relative_eq!(center[2], 0.25);
    }

    #[test]
    fn elevation_keeps_surface() {
        let patch = bilinear();
        let mut raised = patch.clone();
        raised.elevate_to(3, 2).unwrap();
        assert_eq!(raised.degree(), (3, 2));
        for (u, v) in [(0.1, 0.7), (0.5, 0.5), (0.9, 0.2)] {
            let a = patch.evaluate(u, v);
            let b = raised.evaluate(u, v);
            for k in 0..3 {
                assert_relative_eq!(a[k], b[k], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn normal_of_flat_patch() {
        let points = Grid::from_fn(2, 2, |i, j| [i as f64, j as f64, 0.0]);
        let patch = Patch::new("flat".into(), points);
        let normal = patch.normal(0.3, 0.6).unwrap();
        assert_relative_eq!(normal[2], 1.0);
    }

    #[test]
    fn collapsed_patch_is_invalid() {
        let patch = Patch::new("point".into(), Grid::from_fn(2, 2, |_, _| [1.0, 2.0, 3.0]));
        assert!(!patch.is_valid());
        assert!(matches!(patch.control_points(), Err(Error::InvalidPatch(_))));
    }
}
