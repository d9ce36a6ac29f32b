//! partquote dfm command - manufacturability report.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use mesh_quote::dfm::{DfmAnalysisResult, DfmConfig, FaceTag, face_tags};
use mesh_quote::pipeline::analyze_dfm;
use serde::Serialize;

use crate::commands::load;
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct DfmReport {
    path: String,
    #[serde(flatten)]
    result: DfmAnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_counts: Option<BTreeMap<String, usize>>,
}

pub fn run(
    input: &Path,
    overhang_angle: f64,
    min_wall: f64,
    fast: bool,
    tags: bool,
    cli: &Cli,
) -> Result<()> {
    let base = if fast {
        DfmConfig::fast()
    } else {
        DfmConfig::default()
    };
    let config = DfmConfig {
        overhang_angle_deg: overhang_angle,
        min_wall_thickness: min_wall,
        ..base
    };
    config.validate()?;

    let part = load(input, None)?;
    output::info(
        &format!("Analyzing {} triangles...", part.mesh.face_count()),
        cli.format,
        cli.quiet,
    );
    let result = analyze_dfm(&part.mesh, &part.analysis, &config)?;

    let tag_counts = tags.then(|| {
        let mut counts = BTreeMap::new();
        for tag in face_tags(&result, part.mesh.face_count()) {
            let key = match tag {
                FaceTag::Clear => "clear".to_string(),
                FaceTag::Overhang(severity) => format!("overhang-{}", severity),
                FaceTag::ThinWall => "thin-wall".to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    });

    let report = DfmReport {
        path: input.display().to_string(),
        result,
        tag_counts,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&report, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&report, &config);
            }
        }
    }

    Ok(())
}

fn print_text(report: &DfmReport, config: &DfmConfig) {
    let r = &report.result;

    println!("{}", "Manufacturability".bold().underline());
    println!("  {}: {}", "File".cyan(), report.path);

    let score = format!("{:.0}/100", r.manufacturability_score);
    let score = if r.manufacturability_score >= 80.0 {
        score.green()
    } else if r.manufacturability_score >= 60.0 {
        score.yellow()
    } else {
        score.red()
    };
    println!("  {}: {}", "Score".cyan(), score);

    println!(
        "  {}: {:.1}% of surface (threshold {:.0}°)",
        "Overhangs".cyan(),
        r.overhang_percentage,
        config.overhang_angle_deg
    );
    for zone in &r.overhang_zones {
        println!(
            "    {} faces, {:.1} mm², mean {:.1}°, max {:.1}°, {}",
            zone.faces.len(),
            zone.area,
            zone.average_angle,
            zone.max_angle,
            zone.severity
        );
    }
    println!(
        "  {}: {}",
        "Needs support".cyan(),
        if r.requires_support { "yes" } else { "no" }
    );
    println!(
        "  {}: {}",
        "Needs 5-axis".cyan(),
        if r.requires_5_axis { "yes" } else { "no" }
    );

    if let Some(wall) = &r.wall_thickness {
        println!("  {}: {}", "Wall thickness".cyan(), wall);
    }
    if let Some(features) = &r.features {
        println!(
            "  {}: {:.0}% up, {:.0}% down, {:.0}% vertical, {:.0}% inclined{}",
            "Surfaces".cyan(),
            features.upward_flat * 100.0,
            features.downward_flat * 100.0,
            features.vertical * 100.0,
            features.inclined * 100.0,
            if features.is_freeform() { " (freeform)" } else { "" }
        );
    }
    if let Some(counts) = &report.tag_counts {
        println!("  {}:", "Face tags".cyan());
        for (tag, count) in counts {
            println!("    {}: {}", tag, count);
        }
    }

    for warning in &r.warnings {
        println!("  {} {}", "!".yellow().bold(), warning);
    }
    for recommendation in &r.recommendations {
        println!("  {} {}", "•".blue(), recommendation);
    }
}
