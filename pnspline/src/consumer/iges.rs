//! IGES (Initial Graphics Exchange Specification) 5.3 writer.
//!
//! Every patch becomes a polynomial B-spline surface (entity 128) with
//! clamped Bézier knots. IGES needs the directory section before the
//! parameter data, so entities are buffered and the file is written on
//! [`stop()`](PatchConsumer::stop).
use super::{
    create_file, file_name, iges_timestamp, real, ConsumerState, Destination, PatchConsumer,
};
use crate::{Patch, Result};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};
use time::OffsetDateTime;

/// Usable columns of a parameter data line.
const PARAMETER_WIDTH: usize = 64;
/// Usable columns of a start/global line.
const GLOBAL_WIDTH: usize = 72;

/// Streams patches to an IGES file.
pub struct IgesWriter<W: Write> {
    destination: Destination<W>,
    file_name: String,
    timestamp: OffsetDateTime,
    entities: Vec<Vec<String>>,
    max_coordinate: f64,
}

impl IgesWriter<BufWriter<File>> {
    /// Create (truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(create_file(path)?).with_file_name(file_name(path)))
    }
}

impl<W: Write> IgesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            destination: Destination::new(writer, "IGES"),
            file_name: "pnspline.igs".to_string(),
            timestamp: OffsetDateTime::now_utc(),
            entities: Vec::new(),
            max_coordinate: 0.0,
        }
    }

    /// File name recorded in the global section.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Date recorded in the global section.
    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Patches buffered so far.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.entities.len()
    }

    fn global_parameters(&self, timestamp: &str) -> Vec<String> {
        let product = hollerith("pnspline");
        let timestamp = hollerith(timestamp);
        vec![
            hollerith(","),
            hollerith(";"),
            product.clone(),
            hollerith(&self.file_name),
            product.clone(),
            hollerith(env!("CARGO_PKG_VERSION")),
            // Integer bits, single precision exponent and digits, double
            // precision exponent and digits.
            "32".into(),
            "38".into(),
            "6".into(),
            "308".into(),
            "15".into(),
            product,
            // Model space scale, unit flag (millimetres), unit name.
            "1.0".into(),
            "2".into(),
            hollerith("MM"),
            // Line weight gradations and maximum width.
            "1".into(),
            "0.1".into(),
            timestamp.clone(),
            // Minimum resolution, maximum coordinate.
            "1.0E-6".into(),
            real(self.max_coordinate.max(1.0)),
            hollerith(""),
            hollerith(""),
            // IGES 5.3, no drafting standard.
            "11".into(),
            "0".into(),
            timestamp,
        ]
    }

    fn write_file(&self, writer: &mut W, timestamp: &str) -> io::Result<()> {
        let mut sections = Sections::new(writer);

        sections.write_start_line("pnspline polyhedral-net spline patches")?;

        for line in wrap(&self.global_parameters(timestamp), ',', ';', GLOBAL_WIDTH) {
            sections.write_global_line(&line)?;
        }

        let mut parameter_pointer = 1;
        for (index, lines) in self.entities.iter().enumerate() {
            sections.write_directory_entry(&DirectoryEntry::bezier_surface(
                parameter_pointer,
                lines.len(),
                index + 1,
            ))?;
            parameter_pointer += lines.len();
        }

        for (index, lines) in self.entities.iter().enumerate() {
            let directory_pointer = 2 * index + 1;
            for line in lines {
                sections.write_parameter_line(directory_pointer, line)?;
            }
        }

        sections.write_terminate()
    }
}

impl<W: Write> PatchConsumer for IgesWriter<W> {
    fn start(&mut self) -> Result<()> {
        self.destination.start()?;
        Ok(())
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        self.destination.writer_for("consume with")?;
        let points = patch.control_points()?;
        let (du, dv) = patch.degree();

        // The first parametric direction is V: control points are listed
        // with j varying fastest.
        let mut parameters = vec![
            "128".to_string(),
            dv.to_string(),
            du.to_string(),
            dv.to_string(),
            du.to_string(),
            // Open, open, polynomial, non-periodic, non-periodic.
            "0".into(),
            "0".into(),
            "1".into(),
            "0".into(),
            "0".into(),
        ];
        for degree in [dv, du] {
            parameters.extend((0..=degree).map(|_| "0.0".to_string()));
            parameters.extend((0..=degree).map(|_| "1.0".to_string()));
        }
        parameters.extend((0..points.len()).map(|_| "1.0".to_string()));
        for point in points.as_slice() {
            for coordinate in point {
                self.max_coordinate = self.max_coordinate.max(coordinate.abs());
                parameters.push(real(*coordinate));
            }
        }
        parameters.extend(["0.0", "1.0", "0.0", "1.0"].map(String::from));

        self.entities.push(wrap(&parameters, ',', ';', PARAMETER_WIDTH));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut writer) = self.destination.finish()? {
            let timestamp = iges_timestamp(self.timestamp)?;
            self.write_file(&mut writer, &timestamp)?;
            writer.flush()?;
            log::debug!("Wrote {} IGES surfaces", self.entities.len());
        }
        Ok(())
    }

    fn state(&self) -> ConsumerState {
        self.destination.state()
    }
}

/// A Hollerith string. Characters outside printable ASCII become `_` so
/// that byte and column counts agree.
fn hollerith(text: &str) -> String {
    let text = text
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect::<String>();
    format!("{}H{}", text.len(), text)
}

/// Join `fields` with `delimiter`, end with `terminator` and break into lines
/// of at most `width` columns. Fields only continue on the next line when
/// they are wider than a line of their own.
fn wrap(fields: &[String], delimiter: char, terminator: char, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for (index, field) in fields.iter().enumerate() {
        let separator = if index + 1 == fields.len() {
            terminator
        } else {
            delimiter
        };
        let mut text = format!("{field}{separator}");
        if !line.is_empty() && line.len() + text.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        while line.len() + text.len() > width {
            let rest = text.split_off(width - line.len());
            line.push_str(&text);
            lines.push(std::mem::take(&mut line));
            text = rest;
        }
        line.push_str(&text);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Fixed-column section writer. Every section numbers its lines from 1.
struct Sections<'a, W: Write> {
    writer: &'a mut W,
    start: usize,
    global: usize,
    directory: usize,
    parameter: usize,
}

impl<'a, W: Write> Sections<'a, W> {
    fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            start: 0,
            global: 0,
            directory: 0,
            parameter: 0,
        }
    }

    /// Write a line to the Start section (S)
    fn write_start_line(&mut self, line: &str) -> io::Result<()> {
        self.start += 1;
        writeln!(self.writer, "{line:<72}S{:>7}", self.start)
    }

    /// Write a line to the Global section (G)
    fn write_global_line(&mut self, line: &str) -> io::Result<()> {
        self.global += 1;
        writeln!(self.writer, "{line:<72}G{:>7}", self.global)
    }

    /// Write a Directory Entry (D) - takes two lines
    fn write_directory_entry(&mut self, entry: &DirectoryEntry) -> io::Result<()> {
        self.directory += 1;
        writeln!(
            self.writer,
            "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:>7}",
            entry.entity_type,
            entry.parameter_pointer,
            0, // structure
            0, // line font pattern
            0, // level
            0, // view
            0, // transformation matrix
            0, // label display
            entry.status,
            self.directory
        )?;

        self.directory += 1;
        writeln!(
            self.writer,
            "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}D{:>7}",
            entry.entity_type,
            0, // line weight
            0, // color
            entry.parameter_line_count,
            entry.form,
            "",
            "",
            entry.label,
            entry.subscript,
            self.directory
        )
    }

    /// Write a Parameter Data (P) line: 64 columns of data, a blank, the
    /// directory pointer in 7 columns.
    fn write_parameter_line(&mut self, directory_pointer: usize, line: &str) -> io::Result<()> {
        self.parameter += 1;
        writeln!(
            self.writer,
            "{line:<64} {directory_pointer:>7}P{:>7}",
            self.parameter
        )
    }

    /// Write the Terminate section (T)
    fn write_terminate(&mut self) -> io::Result<()> {
        writeln!(
            self.writer,
            "S{:>7}G{:>7}D{:>7}P{:>7}{:>40}T{:>7}",
            self.start, self.global, self.directory, self.parameter, "", 1
        )
    }
}

/// IGES Directory Entry
struct DirectoryEntry {
    entity_type: u32,
    parameter_pointer: usize,
    status: &'static str,
    parameter_line_count: usize,
    form: u32,
    label: &'static str,
    subscript: usize,
}

impl DirectoryEntry {
    /// A polynomial B-spline surface (entity 128, form 0). Visible,
    /// independent geometry.
    fn bezier_surface(parameter_pointer: usize, parameter_line_count: usize, subscript: usize) -> Self {
        Self {
            entity_type: 128,
            parameter_pointer,
            status: "00000000",
            parameter_line_count,
            form: 0,
            label: "PATCH",
            subscript,
        }
    }
}
