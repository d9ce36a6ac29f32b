//! partquote: Command-line part analysis and instant quoting.
//!
//! This tool exposes the mesh-quote pipeline from the command line, suitable
//! for scripting, batch quoting and checking catalog changes.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mesh_quote=info` - Basic operation logging
//! - `RUST_LOG=mesh_quote=debug` - Detailed progress logging
//! - `RUST_LOG=mesh_quote::timing=info` - Performance timing
//! - `RUST_LOG=mesh_quote::cache=debug` - Cache hits, misses and evictions
//!
//! # Example
//!
//! ```bash
//! # Quote 25 anodized aluminum parts
//! partquote quote bracket.stl --material aluminum-6061 --finish anodized --quantity 25
//!
//! # Reuse parsed geometry across runs
//! partquote quote bracket.stl --cache-dir ~/.cache/partquote
//!
//! # JSON for scripting
//! partquote --format json dfm bracket.stl --min-wall 1.5
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{analyze, cache, dfm, materials, quote, sample};

/// partquote - Geometry, manufacturability and cost for CNC parts.
///
/// Analyze STL files and price them against a material and rate catalog.
#[derive(Parser)]
#[command(name = "partquote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure volume, surface area, bounds and complexity
    Analyze {
        /// Input STL file
        input: PathBuf,

        /// Geometry cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Check a part for CNC manufacturability
    Dfm {
        /// Input STL file
        input: PathBuf,

        /// Faces steeper than this from vertical count as overhangs (degrees)
        #[arg(long, default_value = "45")]
        overhang_angle: f64,

        /// Minimum acceptable wall thickness (mm)
        #[arg(long, default_value = "2.0")]
        min_wall: f64,

        /// Skip wall thickness and surface classification
        #[arg(long)]
        fast: bool,

        /// Include per-face tag counts
        #[arg(long)]
        tags: bool,
    },

    /// Price a part
    Quote {
        /// Input STL file
        input: PathBuf,

        /// Catalog material identifier
        #[arg(long, short, default_value = "aluminum-6061")]
        material: String,

        /// Catalog finish identifier
        #[arg(long, default_value = "as-machined")]
        finish: String,

        /// Number of units
        #[arg(long, short = 'n', default_value = "1")]
        quantity: u32,

        /// Tolerance class
        #[arg(long, default_value = "standard")]
        tolerance: ToleranceArg,

        /// Delivery urgency
        #[arg(long, default_value = "standard")]
        urgency: UrgencyArg,

        /// Catalog file (TOML or JSON) replacing the built-in table
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Geometry cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Skip wall thickness and surface classification
        #[arg(long)]
        fast: bool,
    },

    /// Write a reference shape as STL
    Sample {
        /// Shape to generate
        shape: ShapeArg,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Characteristic size in mm (edge length or diameter)
        #[arg(long, default_value = "20.0")]
        size: f64,

        /// Write ASCII STL instead of binary
        #[arg(long)]
        ascii: bool,
    },

    /// Inspect or empty the geometry cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// List catalog materials and finishes
    Materials {
        /// Catalog file (TOML or JSON) replacing the built-in table
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry count, size and age
    Stats {
        /// Geometry cache directory
        #[arg(long)]
        cache_dir: PathBuf,
    },
    /// Remove every entry
    Clear {
        /// Geometry cache directory
        #[arg(long)]
        cache_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ToleranceArg {
    /// ±0.125 mm
    Standard,
    /// ±0.05 mm
    Precision,
    /// ±0.025 mm
    Tight,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UrgencyArg {
    /// Normal scheduling
    Standard,
    /// Expedited, shorter lead time
    Express,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ShapeArg {
    /// Cube with the given edge length
    Cube,
    /// Square plate one hundredth as thick as it is wide
    Plate,
    /// UV sphere with the given diameter
    Sphere,
    /// Cylinder as tall as its diameter
    Cylinder,
}

impl ShapeArg {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeArg::Cube => "cube",
            ShapeArg::Plate => "plate",
            ShapeArg::Sphere => "sphere",
            ShapeArg::Cylinder => "cylinder",
        }
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mesh_quote=info,partquote=info",
            2 => "mesh_quote=debug,partquote=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Analyze { input, cache_dir } => analyze::run(input, cache_dir.as_deref(), &cli),
        Commands::Dfm {
            input,
            overhang_angle,
            min_wall,
            fast,
            tags,
        } => dfm::run(input, *overhang_angle, *min_wall, *fast, *tags, &cli),
        Commands::Quote {
            input,
            material,
            finish,
            quantity,
            tolerance,
            urgency,
            catalog,
            cache_dir,
            fast,
        } => quote::run(
            input,
            quote::QuoteArgs {
                material,
                finish,
                quantity: *quantity,
                tolerance: *tolerance,
                urgency: *urgency,
                catalog: catalog.as_deref(),
                cache_dir: cache_dir.as_deref(),
                fast: *fast,
            },
            &cli,
        ),
        Commands::Sample {
            shape,
            output,
            size,
            ascii,
        } => sample::run(*shape, output, *size, *ascii, &cli),
        Commands::Cache { action } => cache::run(action, &cli),
        Commands::Materials { catalog } => materials::run(catalog.as_deref(), &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(quote_err) = e.downcast_ref::<mesh_quote::QuoteError>() {
                eprintln!("{}: {}", "Error".red().bold(), e);
                eprintln!("  {}: {}", "Code".cyan(), quote_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    quote_err.recovery_suggestion()
                );
                if quote_err.is_transient() {
                    eprintln!("  {}: {}", "Note".yellow(), "retrying may succeed");
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {}", "Caused by".yellow(), cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
