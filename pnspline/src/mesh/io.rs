//! Decoding of control meshes from Wavefront OBJ and OFF files.
use super::ControlMesh;
use crate::{Error, Point, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// Mesh file formats understood by [`ControlMesh::from_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Wavefront OBJ. Only `v` and `f` statements are read.
    Obj,
    /// Object File Format.
    Off,
}

impl MeshFormat {
    /// Guess the format from a file extension (case insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        extension.parse().ok()
    }
}

impl FromStr for MeshFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "obj" => Ok(MeshFormat::Obj),
            "off" => Ok(MeshFormat::Off),
            other => Err(format!("unsupported mesh format '{other}'")),
        }
    }
}

type Faces = Vec<Vec<u32>>;
type Parsed = std::result::Result<(Vec<Point>, Faces), String>;

pub(crate) fn read_file(path: &Path) -> Result<ControlMesh> {
    let load_error = |reason: String| Error::MeshLoad {
        path: path.to_path_buf(),
        reason,
    };

    let format = MeshFormat::from_path(path).ok_or_else(|| {
        load_error(format!(
            "unsupported file extension '{}'",
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default()
        ))
    })?;
    let file = File::open(path).map_err(|e| load_error(e.to_string()))?;

    read(BufReader::new(file), format, path)
}

pub(crate) fn read(reader: impl BufRead, format: MeshFormat, path: &Path) -> Result<ControlMesh> {
    let load_error = |reason: String| Error::MeshLoad {
        path: path.to_path_buf(),
        reason,
    };

    let (vertices, faces) = match format {
        MeshFormat::Obj => parse_obj(reader),
        MeshFormat::Off => parse_off(reader),
    }
    .map_err(load_error)?;

    if vertices.is_empty() {
        return Err(load_error("no vertices".to_string()));
    }

    log::debug!(
        "Loaded {} vertices and {} faces from {}",
        vertices.len(),
        faces.len(),
        path.display()
    );

    ControlMesh::from_data(&vertices, &faces).map_err(|e| load_error(e.to_string()))
}

fn parse_coordinates<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line_number: usize,
) -> std::result::Result<Point, String> {
    let mut point = [0.0; 3];
    for coordinate in point.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| format!("line {line_number}: vertex needs three coordinates"))?;
        *coordinate = token
            .parse()
            .map_err(|_| format!("line {line_number}: invalid coordinate '{token}'"))?;
    }
    Ok(point)
}

fn parse_obj(reader: impl BufRead) -> Parsed {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line_number = number + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => vertices.push(parse_coordinates(tokens, line_number)?),
            Some("f") => {
                let face = tokens
                    .map(|token| {
                        // `v`, `v/vt`, `v//vn` or `v/vt/vn`.
                        let vertex = token.split('/').next().unwrap_or_default();
                        let index: i64 = vertex.parse().map_err(|_| {
                            format!("line {line_number}: invalid face index '{token}'")
                        })?;
                        let resolved = match index {
                            0 => None,
                            i if i > 0 => Some(i - 1),
                            i => Some(vertices.len() as i64 + i),
                        };
                        resolved
                            .filter(|&i| i >= 0 && i <= u32::MAX as i64)
                            .map(|i| i as u32)
                            .ok_or_else(|| {
                                format!("line {line_number}: face index {index} is out of range")
                            })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                faces.push(face);
            }
            _ => {}
        }
    }

    Ok((vertices, faces))
}

fn parse_off(reader: impl BufRead) -> Parsed {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(number, line)| line.map(|line| (number + 1, line)))
        .filter(|line| match line {
            Ok((_, text)) => {
                let text = text.trim();
                !text.is_empty() && !text.starts_with('#')
            }
            Err(_) => true,
        });

    let mut next_line = || -> std::result::Result<(usize, String), String> {
        lines
            .next()
            .ok_or_else(|| "unexpected end of file".to_string())?
            .map_err(|e| e.to_string())
    };

    let (mut line_number, mut line) = next_line()?;
    let header_rest = line.trim_start().strip_prefix("OFF").map(str::to_string);
    if let Some(rest) = header_rest {
        if rest.trim().is_empty() {
            (line_number, line) = next_line()?;
        } else {
            line = rest;
        }
    }

    let counts = line
        .split_whitespace()
        .take(2)
        .map(|token| token.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| format!("line {line_number}: invalid element counts"))?;
    let [vertex_count, face_count] = counts[..] else {
        return Err(format!("line {line_number}: expected vertex and face counts"));
    };

    // The counts are untrusted, so nothing is reserved up front.
    let mut vertices = Vec::new();
    for _ in 0..vertex_count {
        let (line_number, line) = next_line()?;
        vertices.push(parse_coordinates(line.split_whitespace(), line_number)?);
    }

    let mut faces = Vec::new();
    for _ in 0..face_count {
        let (line_number, line) = next_line()?;
        let mut tokens = line.split_whitespace();
        let arity: usize = tokens
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| format!("line {line_number}: invalid face arity"))?;
        let face = tokens
            .take(arity)
            .map(|token| {
                token
                    .parse::<u32>()
                    .map_err(|_| format!("line {line_number}: invalid face index '{token}'"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if face.len() != arity {
            return Err(format!(
                "line {line_number}: face declares {arity} vertices but lists {}",
                face.len()
            ));
        }
        faces.push(face);
    }

    Ok((vertices, faces))
}
