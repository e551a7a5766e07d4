//! Convert a polygon mesh into a patch file.
//!
//! ```text
//! pns [-d|--degree-raise] [-f|--format bv|igs|step] [-o|--output PATH] [-v] INPUT
//! ```
use log::{LevelFilter, Metadata, Record};
use pnspline::{consumer::ExportFormat, process, ControlMesh, ProcessOptions};
use std::{env, path::PathBuf, process::ExitCode};

const USAGE: &str =
    "usage: pns [-d|--degree-raise] [-f|--format bv|igs|step] [-o|--output PATH] [-v] INPUT";

/// Writes log records to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

struct Arguments {
    input: PathBuf,
    output: Option<PathBuf>,
    format: ExportFormat,
    options: ProcessOptions,
    verbose: bool,
}

fn parse_arguments(mut arguments: impl Iterator<Item = String>) -> Result<Arguments, String> {
    let mut input = None;
    let mut output = None;
    let mut format = ExportFormat::default();
    let mut options = ProcessOptions::default();
    let mut verbose = false;

    while let Some(argument) = arguments.next() {
        match argument.as_str() {
            "-d" | "--degree-raise" => options.degree_raise = true,
            "-v" | "--verbose" => verbose = true,
            "-f" | "--format" => {
                let value = arguments
                    .next()
                    .ok_or_else(|| format!("{argument} needs a value"))?;
                format = value.parse()?;
            }
            "-o" | "--output" => {
                let value = arguments
                    .next()
                    .ok_or_else(|| format!("{argument} needs a value"))?;
                output = Some(PathBuf::from(value));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            path => {
                if input.replace(PathBuf::from(path)).is_some() {
                    return Err("more than one input mesh given".to_string());
                }
            }
        }
    }

    Ok(Arguments {
        input: input.ok_or_else(|| "no input mesh given".to_string())?,
        output,
        format,
        options,
        verbose,
    })
}

fn main() -> ExitCode {
    let arguments = match parse_arguments(env::args().skip(1)) {
        Ok(arguments) => arguments,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if arguments.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        });
    }

    let output = arguments
        .output
        .unwrap_or_else(|| PathBuf::from(format!("output.{}", arguments.format.extension())));

    let result = ControlMesh::from_file(&arguments.input).and_then(|mesh| {
        println!(
            "Loaded {}: {} vertices, {} faces",
            arguments.input.display(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        process::export(&mesh, arguments.format, &output, &arguments.options)
    });

    match result {
        Ok(stats) => {
            println!(
                "Wrote {} patches from {} builders to {}",
                stats.patches,
                stats.builders,
                output.display()
            );
            if stats.skipped > 0 {
                println!("Skipped {} invalid patches", stats.skipped);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(arguments: &[&str]) -> Result<Arguments, String> {
        parse_arguments(arguments.iter().map(|argument| argument.to_string()))
    }

    #[test]
    fn flags() {
        let arguments = parse(&["-d", "--format", "step", "cube.obj"]).unwrap();
        assert!(arguments.options.degree_raise);
        assert_eq!(arguments.format, ExportFormat::Step);
        assert_eq!(arguments.input, PathBuf::from("cube.obj"));
        assert!(arguments.output.is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a.obj", "b.obj"]).is_err());
        assert!(parse(&["-f"]).is_err());
        assert!(parse(&["-f", "dxf", "a.obj"]).is_err());
        assert!(parse(&["--frobnicate", "a.obj"]).is_err());
    }
}
