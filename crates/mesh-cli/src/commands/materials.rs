//! partquote materials command - list the catalog.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::commands::catalog;
use crate::{Cli, OutputFormat, output};

pub fn run(path: Option<&Path>, cli: &Cli) -> Result<()> {
    let catalog = catalog(path)?;

    match cli.format {
        OutputFormat::Json => {
            output::print(&catalog, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Materials".bold().underline());
                println!(
                    "  {:<18} {:<24} {:>8} {:>9} {:>6} {:>6}",
                    "id".dimmed(),
                    "name".dimmed(),
                    "g/cm³".dimmed(),
                    "USD/kg".dimmed(),
                    "waste".dimmed(),
                    "mach.".dimmed()
                );
                for (id, m) in &catalog.materials {
                    println!(
                        "  {:<18} {:<24} {:>8.2} {:>9.2} {:>6.2} {:>6.2}",
                        id.cyan(),
                        m.name,
                        m.density_g_cm3,
                        m.price_per_kg,
                        m.waste_factor,
                        m.machinability
                    );
                }

                println!();
                println!("{}", "Finishes".bold().underline());
                for (id, f) in &catalog.finishes {
                    println!(
                        "  {:<18} {:<24} {:>8.3} USD/cm²",
                        id.cyan(),
                        f.name,
                        f.cost_per_cm2
                    );
                }

                println!();
                println!("{}", "Machine rates (USD/h)".bold().underline());
                let r = &catalog.machine_rates;
                println!(
                    "  3-axis {:.0}, 4-axis {:.0}, 5-axis {:.0}",
                    r.three_axis, r.four_axis, r.five_axis
                );
                let s = &catalog.setup_fees;
                println!(
                    "  {}: simple {}, medium {}, complex {}",
                    "Setup fees".cyan(),
                    output::money(s.simple),
                    output::money(s.medium),
                    output::money(s.complex)
                );
            }
        }
    }

    Ok(())
}
