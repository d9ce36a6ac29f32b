//! partquote quote command - price a part.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use mesh_quote::cost::{CostBreakdown, QuoteConfig, ToleranceClass, Urgency};
use mesh_quote::dfm::DfmConfig;
use mesh_quote::pipeline::{PartQuote, analyze_dfm, estimate_price};

use crate::commands::{catalog, load, open_cache};
use crate::{Cli, OutputFormat, ToleranceArg, UrgencyArg, output};

/// Options collected from the command line.
pub struct QuoteArgs<'a> {
    pub material: &'a str,
    pub finish: &'a str,
    pub quantity: u32,
    pub tolerance: ToleranceArg,
    pub urgency: UrgencyArg,
    pub catalog: Option<&'a Path>,
    pub cache_dir: Option<&'a Path>,
    pub fast: bool,
}

pub fn run(input: &Path, args: QuoteArgs<'_>, cli: &Cli) -> Result<()> {
    let catalog = catalog(args.catalog)?;
    let config = QuoteConfig::new(args.material, args.finish, args.quantity)
        .with_tolerance(match args.tolerance {
            ToleranceArg::Standard => ToleranceClass::Standard,
            ToleranceArg::Precision => ToleranceClass::Precision,
            ToleranceArg::Tight => ToleranceClass::Tight,
        })
        .with_urgency(match args.urgency {
            UrgencyArg::Standard => Urgency::Standard,
            UrgencyArg::Express => Urgency::Express,
        });

    // Reject a bad request before spending time on the mesh
    config.validate()?;
    catalog.material(&config.material)?;
    catalog.finish(&config.finish)?;

    let dfm_config = if args.fast {
        DfmConfig::fast()
    } else {
        DfmConfig::default()
    };

    let cache = open_cache(args.cache_dir)?;
    let part = load(input, cache.as_ref())?;
    if let Some(cache) = cache {
        cache.close();
    }

    let dfm = analyze_dfm(&part.mesh, &part.analysis, &dfm_config)?;
    let estimate = estimate_price(&part.analysis, Some(&dfm), &config, &catalog)?;
    let quote = PartQuote {
        part: part.summary(),
        dfm,
        estimate,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&quote, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(input, &quote);
            }
        }
    }

    Ok(())
}

fn print_text(input: &Path, quote: &PartQuote) {
    let e = &quote.estimate;
    println!("{}", "Quote".bold().underline());
    println!("  {}: {}", "File".cyan(), input.display());
    println!(
        "  {}: {} x {} ({})",
        "Part".cyan(),
        e.quantity,
        e.material,
        e.finish
    );
    println!(
        "  {}: {} complexity, {} machine, {} setup",
        "Process".cyan(),
        quote.part.analysis.complexity,
        e.machine_class,
        e.setup_tier.as_str()
    );
    println!(
        "  {}: {:.3} kg stock, {:.1} min machining per unit",
        "Effort".cyan(),
        e.stock_mass_kg,
        e.machining_minutes
    );
    println!(
        "  {}: {:.0}/100",
        "Manufacturability".cyan(),
        quote.dfm.manufacturability_score
    );

    println!();
    println!(
        "  {:<12} {:>14} {:>14}",
        "".bold(),
        "Per unit".bold(),
        format!("Batch of {}", e.quantity).bold()
    );
    print_rows(&e.per_unit, &e.batch);

    println!();
    println!(
        "  {}: {}-{} working days",
        "Lead time".cyan(),
        e.lead_time.min_days,
        e.lead_time.max_days
    );
    println!("  {}: {}", "Confidence".cyan(), e.confidence.as_str());

    for warning in &quote.dfm.warnings {
        println!("  {} {}", "!".yellow().bold(), warning);
    }
    for note in &e.notes {
        println!("  {} {}", "•".blue(), note);
    }
}

fn print_rows(unit: &CostBreakdown, batch: &CostBreakdown) {
    let rows = [
        ("Material", unit.material, batch.material),
        ("Machining", unit.machining, batch.machining),
        ("Setup", unit.setup, batch.setup),
        ("Finishing", unit.finishing, batch.finishing),
        ("Subtotal", unit.subtotal, batch.subtotal),
        ("Margin", unit.margin, batch.margin),
    ];
    for (label, u, b) in rows {
        println!(
            "  {:<12} {:>14} {:>14}",
            label,
            output::money(u),
            output::money(b)
        );
    }
    println!(
        "  {:<12} {:>14} {:>14}",
        "Total".bold(),
        output::money(unit.total).green().bold(),
        output::money(batch.total).green().bold()
    );
}
