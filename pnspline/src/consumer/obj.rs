//! Wavefront OBJ writer for tessellated patches.
use super::{create_file, ConsumerState, Destination, PatchConsumer};
use crate::{
    tri_mesh_buffers::{to_triangle_mesh_buffers, TessellationOptions},
    Patch, Result,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Tessellates every patch and streams the triangles to an OBJ file, one
/// group per patch.
pub struct ObjWriter<W: Write> {
    destination: Destination<W>,
    options: TessellationOptions,
    patch_count: usize,
    vertex_count: usize,
}

impl ObjWriter<BufWriter<File>> {
    /// Create (truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(create_file(path.as_ref())?))
    }
}

impl<W: Write> ObjWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            destination: Destination::new(writer, "OBJ"),
            options: TessellationOptions::default(),
            patch_count: 0,
            vertex_count: 0,
        }
    }

    pub fn with_options(mut self, options: TessellationOptions) -> Self {
        self.options = options;
        self
    }

    /// Patches written so far.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }
}

impl<W: Write> PatchConsumer for ObjWriter<W> {
    fn start(&mut self) -> Result<()> {
        let writer = self.destination.start()?;
        writeln!(writer, "# Wavefront OBJ exported by pnspline")?;
        Ok(())
    }

    fn consume(&mut self, patch: &Patch) -> Result<()> {
        let writer = self.destination.writer_for("consume with")?;
        patch.control_points()?;

        let (indices, points, normals) = to_triangle_mesh_buffers([patch], &self.options);

        writeln!(writer, "g patch{} {}", self.patch_count, patch.group().replace(' ', "_"))?;
        for [x, y, z] in &points {
            writeln!(writer, "v {x:.6} {y:.6} {z:.6}")?;
        }
        for [x, y, z] in &normals {
            writeln!(writer, "vn {x:.6} {y:.6} {z:.6}")?;
        }
        // OBJ indices are 1-based and global.
        let offset = self.vertex_count + 1;
        for triangle in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| triangle[k] as usize + offset);
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }

        self.vertex_count += points.len();
        self.patch_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut writer) = self.destination.finish()? {
            writer.flush()?;
            log::debug!(
                "Wrote {} tessellated patches ({} vertices) to OBJ",
                self.patch_count,
                self.vertex_count
            );
        }
        Ok(())
    }

    fn state(&self) -> ConsumerState {
        self.destination.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{patch::build_all_patches, process, ControlMesh};

    #[test]
    fn face_indices_are_global() {
        let mesh = ControlMesh::from_data(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 1.0, 0.0],
            ],
            &[[0u32, 1, 4, 3], [1, 2, 5, 4]],
        )
        .unwrap();
        let builders = process::get_patch_builders(&mesh).unwrap();
        let patches = build_all_patches(&builders, &mesh).unwrap();

        let mut out = Vec::new();
        {
            let mut writer =
                ObjWriter::new(&mut out).with_options(TessellationOptions { resolution: 2 });
            writer.start().unwrap();
            for patch in &patches {
                writer.consume(patch).unwrap();
            }
            writer.stop().unwrap();
        }
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|line| line.starts_with("g ")).count(), 2);
        assert_eq!(text.lines().filter(|line| line.starts_with("v ")).count(), 18);
        assert_eq!(text.lines().filter(|line| line.starts_with("vn ")).count(), 18);

        let faces = text
            .lines()
            .filter_map(|line| line.strip_prefix("f "))
            .collect::<Vec<_>>();
        assert_eq!(faces.len(), 16);
        let max = |face: &str| {
            face.split(' ')
                .map(|corner| corner.split("//").next().unwrap().parse::<usize>().unwrap())
                .max()
                .unwrap()
        };
        assert!(faces[..8].iter().all(|face| max(face) <= 9));
        assert!(faces[8..].iter().all(|face| max(face) > 9 && max(face) <= 18));
    }
}
