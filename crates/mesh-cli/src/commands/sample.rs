//! partquote sample command - write reference shapes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use mesh_quote::{shapes, stl};
use serde::Serialize;

use crate::{Cli, OutputFormat, ShapeArg, output};

#[derive(Serialize)]
struct SampleResult {
    shape: String,
    output: String,
    size: f64,
    ascii: bool,
    faces: usize,
}

pub fn run(shape: ShapeArg, output_path: &Path, size: f64, ascii: bool, cli: &Cli) -> Result<()> {
    if !size.is_finite() || size <= 0.0 {
        bail!("size must be a positive number of millimeters, got {}", size);
    }

    let Some(mesh) = shapes::by_name(shape.name(), size) else {
        bail!("unknown shape {}", shape.name());
    };

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {:?}", output_path))?;
    let mut writer = BufWriter::new(file);
    let written = if ascii {
        stl::write_ascii_stl(&mesh, shape.name(), &mut writer)
    } else {
        stl::write_binary_stl(&mesh, &mut writer)
    };
    written
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    let result = SampleResult {
        shape: shape.name().to_string(),
        output: output_path.display().to_string(),
        size,
        ascii,
        faces: mesh.face_count(),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                output::success(
                    &format!("Wrote {} to {}", result.shape, output_path.display()),
                    cli.format,
                    cli.quiet,
                );
                println!(
                    "  {}: {} STL, {} faces",
                    "Format".cyan(),
                    if ascii { "ASCII" } else { "binary" },
                    result.faces
                );
            }
        }
    }

    Ok(())
}
