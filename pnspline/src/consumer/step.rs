//! ISO 10303-21 (STEP) writer.
//!
//! The header is written on [`start()`](PatchConsumer::start), every patch
//! is streamed as its control points plus one `B_SPLINE_SURFACE_WITH_KNOTS`
//! and [`stop()`](PatchConsumer::stop) closes the file with a geometric set,
//! its shape representation, the representation context and a product
//! owning the shape. Without patches the data section stays empty.
use super::{
    create_file, file_name, real, step_timestamp, ConsumerState, Destination, PatchConsumer,
};
use crate::{Patch, Result};
use itertools::Itertools;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use time::OffsetDateTime;

/// Streams patches to a STEP file.
pub struct StepWriter<W: Write> {
    destination: Destination<W>,
    file_name: String,
    timestamp: OffsetDateTime,
    next_id: usize,
    surfaces: Vec<usize>,
}

impl StepWriter<BufWriter<File>> {
    /// Create (truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(create_file(path)?).with_file_name(file_name(path)))
    }
}

impl<W: Write> StepWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            destination: Destination::new(writer, "STEP"),
            file_name: "pnspline.step".to_string(),
            timestamp: OffsetDateTime::now_utc(),
            next_id: 1,
            surfaces: Vec::new(),
        }
    }

    /// File name recorded in the header.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Date recorded in the header.
    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Surfaces written so far.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.surfaces.len()
    }
}

fn next(id: &mut usize) -> usize {
    let current = *id;
    *id += 1;
    current
}

impl<W: Write> PatchConsumer for StepWriter<W> {
    fn start(&mut self) -> Result<()> {
        let file_name = self.file_name.replace('\'', "''");
        let timestamp = step_timestamp(self.timestamp)?;
        let writer = self.destination.start()?;

        writeln!(writer, "ISO-10303-21;")?;
        writeln!(writer, "HEADER;")?;
        writeln!(
            writer,
            "FILE_DESCRIPTION(('Polyhedral-net spline patches'),'2;1');"
        )?;
        writeln!(
            writer,
            "FILE_NAME('{file_name}','{timestamp}',(''),(''),'pnspline {}','pnspline','');",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(writer, "FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));")?;
        writeln!(writer, "ENDSEC;")?;
        writeln!(writer, "DATA;")?;
        Ok(())
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        let writer = self.destination.writer_for("consume with")?;
        let points = patch.control_points()?;
        let (du, dv) = patch.degree();
        let id = &mut self.next_id;

        let mut rows = Vec::with_capacity(points.rows());
        for row in points.iter_rows() {
            let mut ids = Vec::with_capacity(row.len());
            for [x, y, z] in row {
                let point = next(id);
                writeln!(
                    writer,
                    "#{point} = CARTESIAN_POINT('',({},{},{}));",
                    real(*x),
                    real(*y),
                    real(*z)
                )?;
                ids.push(point);
            }
            rows.push(format!("({})", ids.iter().map(|id| format!("#{id}")).join(",")));
        }

        let surface = next(id);
        writeln!(
            writer,
            "#{surface} = B_SPLINE_SURFACE_WITH_KNOTS('{}',{du},{dv},({}),.UNSPECIFIED.,.F.,.F.,.F.,({},{}),({},{}),(0.,1.),(0.,1.),.UNSPECIFIED.);",
            patch.group().replace('\'', "''"),
            rows.join(","),
            du + 1,
            du + 1,
            dv + 1,
            dv + 1,
        )?;
        self.surfaces.push(surface);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(mut writer) = self.destination.finish()? else {
            return Ok(());
        };
        if self.surfaces.is_empty() {
            // A geometric set needs at least one element.
            writeln!(writer, "ENDSEC;")?;
            writeln!(writer, "END-ISO-10303-21;")?;
            writer.flush()?;
            log::debug!("Wrote an empty STEP file");
            return Ok(());
        }
        let id = &mut self.next_id;

        let set = next(id);
        let representation = next(id);
        let context = next(id);
        let uncertainty = next(id);
        let length = next(id);
        let angle = next(id);
        let solid_angle = next(id);
        let application = next(id);
        let protocol = next(id);
        let product_context = next(id);
        let product = next(id);
        let formation = next(id);
        let definition_context = next(id);
        let definition = next(id);
        let definition_shape = next(id);
        let shape_representation = next(id);

        writeln!(
            writer,
            "#{set} = GEOMETRIC_SET('',({}));",
            self.surfaces.iter().map(|id| format!("#{id}")).join(",")
        )?;
        writeln!(
            writer,
            "#{representation} = GEOMETRICALLY_BOUNDED_SURFACE_SHAPE_REPRESENTATION('',(#{set}),#{context});"
        )?;
        writeln!(
            writer,
            "#{context} = (GEOMETRIC_REPRESENTATION_CONTEXT(3) GLOBAL_UNCERTAINTY_ASSIGNED_CONTEXT((#{uncertainty})) GLOBAL_UNIT_ASSIGNED_CONTEXT((#{length},#{angle},#{solid_angle})) REPRESENTATION_CONTEXT('ID1','3D'));"
        )?;
        writeln!(
            writer,
            "#{uncertainty} = UNCERTAINTY_MEASURE_WITH_UNIT(LENGTH_MEASURE(1.E-06),#{length},'distance accuracy','');"
        )?;
        writeln!(
            writer,
            "#{length} = (LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.));"
        )?;
        writeln!(
            writer,
            "#{angle} = (NAMED_UNIT(*) PLANE_ANGLE_UNIT() SI_UNIT($,.RADIAN.));"
        )?;
        writeln!(
            writer,
            "#{solid_angle} = (NAMED_UNIT(*) SI_UNIT($,.STERADIAN.) SOLID_ANGLE_UNIT());"
        )?;

        // Product structure owning the surfaces.
        writeln!(writer, "#{application} = APPLICATION_CONTEXT('automotive design');")?;
        writeln!(
            writer,
            "#{protocol} = APPLICATION_PROTOCOL_DEFINITION('international standard','automotive_design',2000,#{application});"
        )?;
        writeln!(
            writer,
            "#{product_context} = PRODUCT_CONTEXT('',#{application},'mechanical');"
        )?;
        writeln!(
            writer,
            "#{product} = PRODUCT('pnspline','pnspline','',(#{product_context}));"
        )?;
        writeln!(
            writer,
            "#{formation} = PRODUCT_DEFINITION_FORMATION('','',#{product});"
        )?;
        writeln!(
            writer,
            "#{definition_context} = PRODUCT_DEFINITION_CONTEXT('part definition',#{application},'design');"
        )?;
        writeln!(
            writer,
            "#{definition} = PRODUCT_DEFINITION('design','',#{formation},#{definition_context});"
        )?;
        writeln!(
            writer,
            "#{definition_shape} = PRODUCT_DEFINITION_SHAPE('','',#{definition});"
        )?;
        writeln!(
            writer,
            "#{shape_representation} = SHAPE_DEFINITION_REPRESENTATION(#{definition_shape},#{representation});"
        )?;
        writeln!(writer, "ENDSEC;")?;
        writeln!(writer, "END-ISO-10303-21;")?;
        writer.flush()?;

        log::debug!("Wrote {} STEP surfaces", self.surfaces.len());
        Ok(())
    }

    fn state(&self) -> ConsumerState {
        self.destination.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_has_no_data() {
        let mut out = Vec::new();
        {
            let mut writer = StepWriter::new(&mut out).with_timestamp(OffsetDateTime::UNIX_EPOCH);
            writer.start().unwrap();
            writer.stop().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ISO-10303-21;\nHEADER;\n"));
        assert!(text.contains("'1970-01-01T00:00:00'"));
        assert!(!text.contains("GEOMETRIC_SET"));
        assert!(!text.contains('#'));
        assert!(text.ends_with("DATA;\nENDSEC;\nEND-ISO-10303-21;\n"));
    }
}
