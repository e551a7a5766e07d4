//! [BezierView](https://www.cise.ufl.edu/research/SurfLab/bview/) writer.
//!
//! Each patch is written as
//!
//! ```text
//! Group 0 Regular
//! 5
//! 3 3
//! x y z        <- (deg_u + 1) · (deg_v + 1) lines, V varies fastest
//! ```
use super::{create_file, ConsumerState, Destination, PatchConsumer};
use crate::{Patch, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Digits after the decimal point for coordinates.
const PRECISION: usize = 15;

/// BezierView kind of a tensor-product patch with independent degrees.
const TENSOR_PRODUCT: u8 = 5;

/// Streams patches to a BV file as they arrive.
pub struct BvWriter<W: Write> {
    destination: Destination<W>,
    patch_count: usize,
}

impl BvWriter<BufWriter<File>> {
    /// Create (truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(create_file(path.as_ref())?))
    }
}

impl<W: Write> BvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            destination: Destination::new(writer, "BV"),
            patch_count: 0,
        }
    }

    /// Patches written so far.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }
}

impl<W: Write> PatchConsumer for BvWriter<W> {
    fn start(&mut self) -> Result<()> {
        self.destination.start()?;
        Ok(())
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        let writer = self.destination.writer_for("consume with")?;
        let points = patch.control_points()?;

        writeln!(writer, "{}", patch.group())?;
        writeln!(writer, "{}", TENSOR_PRODUCT)?;
        writeln!(writer, "{} {}", patch.deg_u(), patch.deg_v())?;
        for [x, y, z] in points.as_slice() {
            writeln!(
                writer,
                "{x:.prec$} {y:.prec$} {z:.prec$}",
                prec = PRECISION
            )?;
        }

        self.patch_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut writer) = self.destination.finish()? {
            writer.flush()?;
            log::debug!("Wrote {} BV patches", self.patch_count);
        }
        Ok(())
    }

    fn state(&self) -> ConsumerState {
        self.destination.state()
    }
}
