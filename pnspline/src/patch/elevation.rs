//! Bézier degree elevation.
//!
//! Raising a degree-`n` curve to `n + 1` maps control points as
//!
//! ```text
//! Q_i = i / (n + 1) · P_{i-1} + (1 - i / (n + 1)) · P_i,   i = 0..=n+1
//! ```
//!
//! Tensor-product grids are raised one axis at a time. Everything here works
//! on the flattened row-major control-point index `i * (deg_v + 1) + j`.
use super::MAX_DEGREE;
use crate::{Error, Grid, Mask, Point, Result};

/// Check that `target` is reachable from `current` by elevation.
pub(crate) fn check_target(current: (usize, usize), target: (usize, usize)) -> Result<()> {
    let reachable = |from: usize, to: usize| to == from || (from < to && to <= MAX_DEGREE);
    if reachable(current.0, target.0) && reachable(current.1, target.1) {
        Ok(())
    } else {
        Err(Error::UnsupportedDegree {
            requested: target,
            current,
            max: MAX_DEGREE,
        })
    }
}

/// The degree one elevation step reaches from `current`.
pub(crate) fn next_step(current: (usize, usize)) -> (usize, usize) {
    let raise = |d: usize| if d < MAX_DEGREE { d + 1 } else { d };
    (raise(current.0), raise(current.1))
}

fn raise_u((du, dv): (usize, usize)) -> Mask {
    let cols = dv + 1;
    let mut e = Mask::new((du + 2) * cols, (du + 1) * cols);
    let n = (du + 1) as f64;
    for i in 0..=du + 1 {
        for j in 0..cols {
            let row = i * cols + j;
            if i > 0 {
                e[(row, (i - 1) * cols + j)] = i as f64 / n;
            }
            if i <= du {
                e[(row, i * cols + j)] = (du + 1 - i) as f64 / n;
            }
        }
    }
    e
}

fn raise_v((du, dv): (usize, usize)) -> Mask {
    let (old_cols, new_cols) = (dv + 1, dv + 2);
    let mut e = Mask::new((du + 1) * new_cols, (du + 1) * old_cols);
    let n = (dv + 1) as f64;
    for i in 0..=du {
        for j in 0..new_cols {
            let row = i * new_cols + j;
            if j > 0 {
                e[(row, i * old_cols + j - 1)] = j as f64 / n;
            }
            if j <= dv {
                e[(row, i * old_cols + j)] = (dv + 1 - j) as f64 / n;
            }
        }
    }
    e
}

/// Matrix mapping the control points of a `from` grid to the control points
/// of the equivalent `to` grid. `to` must not be below `from` on either axis.
pub(crate) fn matrix(from: (usize, usize), to: (usize, usize)) -> Mask {
    let count = (from.0 + 1) * (from.1 + 1);
    let mut e = Mask::from_fn(count, count, |i, j| if i == j { 1.0 } else { 0.0 });
    let mut degree = from;
    while degree.0 < to.0 {
        e = raise_u(degree).mul(&e);
        degree.0 += 1;
    }
    while degree.1 < to.1 {
        e = raise_v(degree).mul(&e);
        degree.1 += 1;
    }
    e
}

/// Elevate a single control grid to `to`.
pub(crate) fn elevate_points(points: &Grid<Point>, to: (usize, usize)) -> Grid<Point> {
    let from = (points.rows() - 1, points.cols() - 1);
    let e = matrix(from, to);
    let flat = points.as_slice();
    Grid::from_fn(to.0 + 1, to.1 + 1, |i, j| {
        e.row(i * (to.1 + 1) + j)
            .iter()
            .zip(flat)
            .filter(|(w, _)| **w != 0.0)
            .fold([0.0; 3], |acc, (w, p)| {
                [acc[0] + w * p[0], acc[1] + w * p[1], acc[2] + w * p[2]]
            })
    })
}

/// Elevate the rows of a builder mask that produces `patch_count` grids of
/// degree `from`, so it produces grids of degree `to` instead.
pub(crate) fn elevate_rows(
    mask: &Mask,
    patch_count: usize,
    from: (usize, usize),
    to: (usize, usize),
) -> Mask {
    let e = matrix(from, to);
    let (new_count, old_count) = e.shape();
    let cols = mask.cols();
    let mut out = Mask::new(3 * patch_count * new_count, cols);

    for patch in 0..patch_count {
        for r in 0..new_count {
            for c in 0..old_count {
                let w = e[(r, c)];
                if w == 0.0 {
                    continue;
                }
                for k in 0..3 {
                    let src = 3 * (patch * old_count + c) + k;
                    let dst = 3 * (patch * new_count + r) + k;
                    for col in 0..cols {
                        out[(dst, col)] += w * mask[(src, col)];
                    }
                }
            }
        }
    }
    out
}
