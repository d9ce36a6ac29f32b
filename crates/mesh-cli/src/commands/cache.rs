//! partquote cache command - inspect or clear the geometry cache.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mesh_quote::cache::{CacheConfig, CacheStats, GeometryCache};
use serde::Serialize;

use crate::{CacheAction, Cli, OutputFormat, output};

#[derive(Serialize)]
struct CacheReport {
    path: String,
    #[serde(flatten)]
    stats: CacheStats,
    cleared: bool,
}

pub fn run(action: &CacheAction, cli: &Cli) -> Result<()> {
    let (dir, clear) = match action {
        CacheAction::Stats { cache_dir } => (cache_dir.as_path(), false),
        CacheAction::Clear { cache_dir } => (cache_dir.as_path(), true),
    };

    let cache = open(dir)?;
    if clear {
        cache.clear()?;
    }
    let report = CacheReport {
        path: dir.display().to_string(),
        stats: cache.stats(),
        cleared: clear,
    };
    cache.close();

    match cli.format {
        OutputFormat::Json => {
            output::print(&report, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                if clear {
                    output::success(
                        &format!("Cleared cache at {}", dir.display()),
                        cli.format,
                        cli.quiet,
                    );
                }
                println!("{}", "Geometry Cache".bold().underline());
                println!("  {}: {}", "Path".cyan(), report.path);
                println!("  {}: {}", "Entries".cyan(), report.stats.count);
                println!(
                    "  {}: {:.2} / {:.2} MiB",
                    "Size".cyan(),
                    mib(report.stats.total_size),
                    mib(report.stats.capacity)
                );
                if let Some(oldest) = report.stats.oldest_timestamp {
                    println!("  {}: {} (unix ms)", "Oldest access".cyan(), oldest);
                }
            }
        }
    }

    Ok(())
}

fn open(dir: &Path) -> Result<GeometryCache> {
    GeometryCache::open_dir(dir, CacheConfig::default())
        .with_context(|| format!("Failed to open geometry cache at {:?}", dir))
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
