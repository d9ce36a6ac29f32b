//! partquote analyze command - geometry report.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use mesh_quote::pipeline::PartSummary;

use crate::commands::{load, open_cache};
use crate::{Cli, OutputFormat, output};

pub fn run(input: &Path, cache_dir: Option<&Path>, cli: &Cli) -> Result<()> {
    let cache = open_cache(cache_dir)?;
    let part = load(input, cache.as_ref())?;
    let summary: PartSummary = part.summary();

    if let Some(cache) = cache {
        cache.close();
    }

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let a = &summary.analysis;
                let size = a.bounding_box.size;

                println!("{}", "Part Geometry".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {}", "Digest".cyan(), summary.digest);
                println!("  {}: {}", "Triangles".cyan(), a.triangle_count);
                println!(
                    "  {}: {:.2} x {:.2} x {:.2} mm",
                    "Dimensions".cyan(),
                    size.x,
                    size.y,
                    size.z
                );
                println!("  {}: {:.2} mm³", "Volume".cyan(), a.volume);
                println!("  {}: {:.2} mm²", "Surface area".cyan(), a.surface_area);
                println!(
                    "  {}: {:.4} mm⁻¹",
                    "Surface/volume".cyan(),
                    a.surface_to_volume_ratio
                );
                println!(
                    "  {}: {} ({:.1})",
                    "Complexity".cyan(),
                    a.complexity,
                    a.complexity_score
                );
                if summary.from_cache {
                    println!("  {}: {}", "Source".cyan(), "cache".green());
                }
            }
        }
    }

    Ok(())
}
