//! Streaming patch sinks.
//!
//! Every consumer follows the same lifecycle:
//!
//! ```text
//! Created --start--> Started --stop--> Stopped
//!                    |     ^
//!                    consume
//! ```
//!
//! [`consume()`](PatchConsumer::consume) is only valid while started and
//! rejects invalid patches. [`stop()`](PatchConsumer::stop) flushes and
//! releases the destination and may be called again without effect.
//!
//! File writers own their destination. Dropping a writer that was never
//! stopped still releases the destination, but the output may be incomplete.
use crate::{Error, Patch, Result};
use derive_more::Display;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};
use time::{macros::format_description, OffsetDateTime, UtcOffset};

mod bv;
mod iges;
#[cfg(feature = "tri_mesh_buffers")]
mod obj;
mod step;

pub use bv::BvWriter;
pub use iges::IgesWriter;
#[cfg(feature = "tri_mesh_buffers")]
pub use obj::ObjWriter;
pub use step::StepWriter;

/// A sink for patches.
pub trait PatchConsumer {
    /// Begin consuming. Fails with [`Error::ConsumerState`] unless the
    /// consumer was just created.
    fn start(&mut self) -> Result<()>;

    /// Write one patch. Fails with [`Error::ConsumerState`] unless started
    /// and with [`Error::InvalidPatch`] if `patch` is not valid.
    fn consume(&mut self, patch: &Patch) -> Result<()>;

    /// Flush and release the destination.
    fn stop(&mut self) -> Result<()>;

    fn state(&self) -> ConsumerState;
}

impl<C: PatchConsumer + ?Sized> PatchConsumer for &mut C {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        (**self).consume(patch)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn state(&self) -> ConsumerState {
        (**self).state()
    }
}

impl<C: PatchConsumer + ?Sized> PatchConsumer for Box<C> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        (**self).consume(patch)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn state(&self) -> ConsumerState {
        (**self).state()
    }
}

/// Lifecycle state of a [`PatchConsumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ConsumerState {
    #[default]
    Created,
    Started,
    Stopped,
}

impl ConsumerState {
    /// `Created -> Started`.
    pub fn start(&mut self) -> Result<()> {
        match self {
            ConsumerState::Created => {
                *self = ConsumerState::Started;
                Ok(())
            }
            state => Err(Error::ConsumerState {
                operation: "start",
                state: *state,
            }),
        }
    }

    /// Fails unless started.
    pub fn ensure_started(&self, operation: &'static str) -> Result<()> {
        match self {
            ConsumerState::Started => Ok(()),
            state => Err(Error::ConsumerState {
                operation,
                state: *state,
            }),
        }
    }

    /// `Started -> Stopped`. Returns `false` if already stopped.
    pub fn stop(&mut self) -> Result<bool> {
        match self {
            ConsumerState::Started => {
                *self = ConsumerState::Stopped;
                Ok(true)
            }
            ConsumerState::Stopped => Ok(false),
            ConsumerState::Created => Err(Error::ConsumerState {
                operation: "stop",
                state: ConsumerState::Created,
            }),
        }
    }
}

/// An owned writer destination tied to a consumer state.
///
/// The destination is released exactly once: on a successful
/// [`finish()`](Self::finish) or when dropped.
pub(crate) struct Destination<W: Write> {
    writer: Option<W>,
    state: ConsumerState,
    kind: &'static str,
}

impl<W: Write> Destination<W> {
    pub(crate) fn new(writer: W, kind: &'static str) -> Self {
        Self {
            writer: Some(writer),
            state: ConsumerState::Created,
            kind,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ConsumerState {
        self.state
    }

    /// Start and hand out the writer for a header.
    pub(crate) fn start(&mut self) -> Result<&mut W> {
        self.state.start()?;
        log::trace!("{} writer started", self.kind);
        self.writer_for("write to")
    }

    /// The writer, if started.
    pub(crate) fn writer_for(&mut self, operation: &'static str) -> Result<&mut W> {
        self.state.ensure_started(operation)?;
        self.writer.as_mut().ok_or(Error::ConsumerState {
            operation,
            state: ConsumerState::Stopped,
        })
    }

    /// Stop and take the writer so the caller can write a trailer before it
    /// is dropped. `None` if already stopped.
    pub(crate) fn finish(&mut self) -> Result<Option<W>> {
        if !self.state.stop()? {
            return Ok(None);
        }
        log::trace!("{} writer stopped", self.kind);
        Ok(self.writer.take())
    }
}

impl<W: Write> Drop for Destination<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if self.state == ConsumerState::Started {
                log::warn!("{} writer dropped without stop; output is incomplete", self.kind);
            }
            let _ = writer.flush();
        }
    }
}

/// Collects patches in memory.
#[derive(Debug, Clone, Default)]
pub struct PatchCollector {
    patches: Vec<Patch>,
    state: ConsumerState,
}

impl PatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn into_patches(self) -> Vec<Patch> {
        self.patches
    }
}

impl PatchConsumer for PatchCollector {
    fn start(&mut self) -> Result<()> {
        self.state.start()
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        self.state.ensure_started("consume with")?;
        patch.control_points()?;
        self.patches.push(patch.clone());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.state.stop().map(|_| ())
    }

    fn state(&self) -> ConsumerState {
        self.state
    }
}

/// The patch file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ExportFormat {
    /// [BezierView](https://www.cise.ufl.edu/research/SurfLab/bview/) patches.
    #[default]
    #[display("bv")]
    Bv,
    /// IGES 5.3, entity 128.
    #[display("igs")]
    Iges,
    /// ISO 10303-21, AP214.
    #[display("step")]
    Step,
}

impl ExportFormat {
    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Bv => "bv",
            ExportFormat::Iges => "igs",
            ExportFormat::Step => "step",
        }
    }

    /// Open a writer for this format at `path`.
    pub fn create(self, path: impl AsRef<Path>) -> Result<Box<dyn PatchConsumer>> {
        Ok(match self {
            ExportFormat::Bv => Box::new(BvWriter::create(path)?),
            ExportFormat::Iges => Box::new(IgesWriter::create(path)?),
            ExportFormat::Step => Box::new(StepWriter::create(path)?),
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bv" => Ok(ExportFormat::Bv),
            "igs" | "iges" => Ok(ExportFormat::Iges),
            "step" | "stp" => Ok(ExportFormat::Step),
            other => Err(format!("unknown export format '{other}' (expected bv, igs or step)")),
        }
    }
}

/// `YYYYMMDD.HHNNSS` in UTC, for IGES global parameters.
pub(crate) fn iges_timestamp(timestamp: OffsetDateTime) -> Result<String> {
    Ok(timestamp.to_offset(UtcOffset::UTC).format(format_description!(
        "[year][month][day].[hour][minute][second]"
    ))?)
}

/// `YYYY-MM-DDTHH:NN:SS` in UTC, for STEP headers.
pub(crate) fn step_timestamp(timestamp: OffsetDateTime) -> Result<String> {
    Ok(timestamp.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))?)
}

/// A real that always carries a decimal point, as IGES and STEP require.
pub(crate) fn real(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains('e') {
        format!("{value:.15E}")
    } else {
        text
    }
}

pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Name of the file at `path`, for format headers.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine() {
        let mut state = ConsumerState::default();
        assert!(state.ensure_started("consume with").is_err());
        assert!(state.stop().is_err());
        state.start().unwrap();
        assert!(state.start().is_err());
        assert!(state.stop().unwrap());
        assert!(!state.stop().unwrap());
        assert!(matches!(
            state.start(),
            Err(Error::ConsumerState {
                state: ConsumerState::Stopped,
                ..
            })
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!("IGES".parse::<ExportFormat>(), Ok(ExportFormat::Iges));
        assert_eq!("stp".parse::<ExportFormat>(), Ok(ExportFormat::Step));
        assert!("obj".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Step.to_string(), "step");
    }

    #[test]
    fn reals() {
        assert_eq!(real(1.0), "1.0");
        assert_eq!(real(0.0), "0.0");
        assert_eq!(real(-0.25), "-0.25");
        assert!(real(1e-20).contains('.'));
        assert!(real(1e-20).contains("E-20"));
        assert!(real(1e20).contains('.'));
    }

    #[test]
    fn timestamps() {
        use time::macros::datetime;

        assert_eq!(
            step_timestamp(OffsetDateTime::UNIX_EPOCH).unwrap(),
            "1970-01-01T00:00:00"
        );
        assert_eq!(
            iges_timestamp(datetime!(2000-02-29 0:00 UTC)).unwrap(),
            "20000229.000000"
        );
        // Written in UTC whatever the offset.
        assert_eq!(
            step_timestamp(datetime!(2023-11-15 0:13:20 +2)).unwrap(),
            "2023-11-14T22:13:20"
        );
    }

    #[test]
    fn destination_releases_once() {
        let mut out = Vec::new();
        {
            let mut destination = Destination::new(&mut out, "test");
            destination.start().unwrap().write_all(b"a").unwrap();
            let writer = destination.finish().unwrap();
            assert!(writer.is_some());
            assert!(destination.finish().unwrap().is_none());
        }
        assert_eq!(out, b"a");
    }
}
