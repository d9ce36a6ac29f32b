//! CNC cost and lead-time estimation.
//!
//! [`estimate`] prices a part from its [`GeometryAnalysis`], an optional
//! [`DfmAnalysisResult`] and a [`QuoteConfig`], using rates from a
//! [`Catalog`].
//!
//! # Cost model
//!
//! | Component | Basis |
//! |-----------|-------|
//! | Material  | bounding-box stock mass × price/kg × waste factor |
//! | Machining | 1 min per 100 mm² of surface, × (1 + complexity/100) ÷ machinability × tolerance, at the machine class rate |
//! | Setup     | fixed fee by complexity tier, amortized over the batch |
//! | Finishing | surface area × finish rate |
//! | Margin    | 25% of the subtotal |
//!
//! # Example
//!
//! ```
//! use mesh_quote::cost::{Catalog, QuoteConfig, estimate};
//! use mesh_quote::{geometry, shapes};
//!
//! let analysis = geometry::analyze(&shapes::cube(50.0)).unwrap();
//! let config = QuoteConfig::new("aluminum-6061", "anodized", 10);
//! let price = estimate(&analysis, None, &config, &Catalog::standard()).unwrap();
//!
//! assert_eq!(price.currency, "USD");
//! assert!(price.per_unit.total < price.batch.total);
//! ```

pub mod catalog;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dfm::DfmAnalysisResult;
use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{ComplexityLevel, GeometryAnalysis};

pub use catalog::{Catalog, Finish, MachineRates, Material, SetupFees};

/// Markup applied to the subtotal.
pub const MARGIN_RATE: f64 = 0.25;

/// Currency of every amount in a [`PriceEstimate`].
pub const CURRENCY: &str = "USD";

/// Machining minutes per mm² of surface at reference complexity.
const MINUTES_PER_MM2: f64 = 1.0 / 100.0;

const BASE_LEAD_DAYS: u32 = 5;
const COMPLEX_LEAD_DAYS: u32 = 3;
const DAYS_PER_EXTRA_BATCH: u32 = 2;
const BATCH_SIZE: u32 = 10;
/// Express lead time is 3/5 of standard, rounded up.
const EXPRESS_FACTOR: (u32, u32) = (3, 5);
/// The slow end of the range is 7/5 of the fast end, rounded up.
const LEAD_SPREAD: (u32, u32) = (7, 5);

/// Tolerance class requested by the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceClass {
    /// ±0.125 mm.
    #[default]
    Standard,
    /// ±0.05 mm.
    Precision,
    /// ±0.025 mm.
    Tight,
}

impl ToleranceClass {
    /// Machining time multiplier.
    pub fn time_multiplier(&self) -> f64 {
        match self {
            ToleranceClass::Standard => 1.0,
            ToleranceClass::Precision => 1.25,
            ToleranceClass::Tight => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToleranceClass::Standard => "standard",
            ToleranceClass::Precision => "precision",
            ToleranceClass::Tight => "tight",
        }
    }
}

impl std::str::FromStr for ToleranceClass {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ToleranceClass::Standard),
            "precision" => Ok(ToleranceClass::Precision),
            "tight" => Ok(ToleranceClass::Tight),
            other => Err(QuoteError::invalid_config(format!(
                "unknown tolerance class '{}' (expected standard, precision or tight)",
                other
            ))),
        }
    }
}

/// Delivery urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Standard,
    Express,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Standard => "standard",
            Urgency::Express => "express",
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Urgency::Standard),
            "express" => Ok(Urgency::Express),
            other => Err(QuoteError::invalid_config(format!(
                "unknown urgency '{}' (expected standard or express)",
                other
            ))),
        }
    }
}

/// What the customer is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Catalog material identifier.
    pub material: String,
    /// Catalog finish identifier.
    pub finish: String,
    /// Units in the batch, at least 1.
    pub quantity: u32,
    pub tolerance: ToleranceClass,
    pub urgency: Urgency,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            material: "aluminum-6061".to_string(),
            finish: "as-machined".to_string(),
            quantity: 1,
            tolerance: ToleranceClass::Standard,
            urgency: Urgency::Standard,
        }
    }
}

impl QuoteConfig {
    /// Standard tolerance and urgency.
    pub fn new(material: impl Into<String>, finish: impl Into<String>, quantity: u32) -> Self {
        Self {
            material: material.into(),
            finish: finish.into(),
            quantity,
            ..Default::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: ToleranceClass) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Check the quantity.
    pub fn validate(&self) -> QuoteResult<()> {
        if self.quantity == 0 {
            return Err(QuoteError::invalid_config("quantity must be at least 1"));
        }
        Ok(())
    }
}

/// Machine class, chosen from DFM signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineClass {
    #[serde(rename = "3-axis")]
    ThreeAxis,
    #[serde(rename = "4-axis")]
    FourAxis,
    #[serde(rename = "5-axis")]
    FiveAxis,
}

impl MachineClass {
    /// 5-axis for severe overhangs, 4-axis when support is needed, else 3-axis.
    pub fn select(dfm: Option<&DfmAnalysisResult>) -> Self {
        match dfm {
            Some(d) if d.requires_5_axis => MachineClass::FiveAxis,
            Some(d) if d.requires_support => MachineClass::FourAxis,
            _ => MachineClass::ThreeAxis,
        }
    }

    /// Hourly rate for this class.
    pub fn rate(&self, rates: &MachineRates) -> f64 {
        match self {
            MachineClass::ThreeAxis => rates.three_axis,
            MachineClass::FourAxis => rates.four_axis,
            MachineClass::FiveAxis => rates.five_axis,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineClass::ThreeAxis => "3-axis",
            MachineClass::FourAxis => "4-axis",
            MachineClass::FiveAxis => "5-axis",
        }
    }
}

impl std::fmt::Display for MachineClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Setup fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupTier {
    Simple,
    Medium,
    Complex,
}

impl SetupTier {
    pub fn for_complexity(level: ComplexityLevel) -> Self {
        match level {
            ComplexityLevel::Low => SetupTier::Simple,
            ComplexityLevel::Medium => SetupTier::Medium,
            ComplexityLevel::High | ComplexityLevel::VeryHigh => SetupTier::Complex,
        }
    }

    pub fn fee(&self, fees: &SetupFees) -> f64 {
        match self {
            SetupTier::Simple => fees.simple,
            SetupTier::Medium => fees.medium,
            SetupTier::Complex => fees.complex,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SetupTier::Simple => "simple",
            SetupTier::Medium => "medium",
            SetupTier::Complex => "complex",
        }
    }
}

/// Itemized cost (USD).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material: f64,
    pub machining: f64,
    pub setup: f64,
    pub finishing: f64,
    pub subtotal: f64,
    pub margin: f64,
    pub total: f64,
}

impl CostBreakdown {
    fn new(material: f64, machining: f64, setup: f64, finishing: f64) -> Self {
        let subtotal = material + machining + setup + finishing;
        let margin = subtotal * MARGIN_RATE;
        Self {
            material,
            machining,
            setup,
            finishing,
            subtotal,
            margin,
            total: subtotal + margin,
        }
    }
}

/// Working days until shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadTime {
    pub min_days: u32,
    pub max_days: u32,
}

/// How far the estimate can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// A priced quote for one part and batch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub currency: String,
    pub quantity: u32,
    pub material: String,
    pub finish: String,
    pub machine_class: MachineClass,
    pub setup_tier: SetupTier,
    /// Stock mass per unit (kg).
    pub stock_mass_kg: f64,
    /// Machining time per unit.
    pub machining_minutes: f64,
    /// One unit, with setup amortized over the batch.
    pub per_unit: CostBreakdown,
    /// The whole batch, with setup charged once.
    pub batch: CostBreakdown,
    pub lead_time: LeadTime,
    pub confidence: Confidence,
    pub notes: Vec<String>,
}

/// Price a part.
///
/// Fails with `UnknownMaterial`/`UnknownFinish` when the config names
/// identifiers missing from `catalog`, and `InvalidConfig` for a zero
/// quantity.
pub fn estimate(
    analysis: &GeometryAnalysis,
    dfm: Option<&DfmAnalysisResult>,
    config: &QuoteConfig,
    catalog: &Catalog,
) -> QuoteResult<PriceEstimate> {
    config.validate()?;
    let material = catalog.material(&config.material)?;
    let finish = catalog.finish(&config.finish)?;
    let quantity = config.quantity;
    let qty = quantity as f64;

    // Stock is bought by envelope, not by net part volume
    let stock_volume_mm3 = analysis.bounding_box.volume();
    let stock_mass_kg = stock_volume_mm3 * material.density_g_cm3 * 1e-6;
    let material_cost = stock_mass_kg * material.price_per_kg * material.waste_factor;

    let machine_class = MachineClass::select(dfm);
    let machining_minutes = analysis.surface_area * MINUTES_PER_MM2
        * (1.0 + analysis.complexity_score / 100.0)
        / material.machinability
        * config.tolerance.time_multiplier();
    let machining_cost = machining_minutes / 60.0 * machine_class.rate(&catalog.machine_rates);

    let setup_tier = SetupTier::for_complexity(analysis.complexity);
    let setup_fee = setup_tier.fee(&catalog.setup_fees);

    let surface_cm2 = analysis.surface_area / 100.0;
    let finishing_cost = surface_cm2 * finish.cost_per_cm2;

    let per_unit = CostBreakdown::new(
        material_cost,
        machining_cost,
        setup_fee / qty,
        finishing_cost,
    );
    let batch = CostBreakdown::new(
        material_cost * qty,
        machining_cost * qty,
        setup_fee,
        finishing_cost * qty,
    );

    let lead_time = lead_time(analysis.complexity, quantity, config.urgency);
    let confidence = confidence(analysis.complexity, dfm);

    debug!(
        stock_mass_kg,
        machining_minutes,
        machine = %machine_class,
        "Cost components computed"
    );

    let mut notes = vec![
        format!(
            "Material priced on bounding-box stock of {:.1} cm³ ({:.3} kg) with a {:.2}× waste factor",
            stock_volume_mm3 / 1000.0,
            stock_mass_kg,
            material.waste_factor
        ),
        format!(
            "{} machining at ${:.2}/h, {:.1} min per unit",
            machine_class,
            machine_class.rate(&catalog.machine_rates),
            machining_minutes
        ),
    ];
    if quantity > 1 {
        notes.push(format!(
            "Setup fee of ${:.2} is spread across {} units",
            setup_fee, quantity
        ));
    } else {
        notes.push(format!("Setup fee of ${:.2} applies to the single unit", setup_fee));
    }
    if config.tolerance != ToleranceClass::Standard {
        notes.push(format!(
            "{} tolerance adds {:.0}% machining time",
            config.tolerance.as_str(),
            (config.tolerance.time_multiplier() - 1.0) * 100.0
        ));
    }
    if config.urgency == Urgency::Express {
        notes.push("Express delivery shortens lead time by 40%".to_string());
    }
    if dfm.is_none() {
        notes.push("No manufacturability analysis was supplied; machine class assumed 3-axis".to_string());
    }

    info!(
        material = %config.material,
        quantity,
        unit_total = format!("{:.2}", per_unit.total),
        batch_total = format!("{:.2}", batch.total),
        lead_days = lead_time.min_days,
        confidence = confidence.as_str(),
        "Price estimated"
    );

    Ok(PriceEstimate {
        currency: CURRENCY.to_string(),
        quantity,
        material: config.material.clone(),
        finish: config.finish.clone(),
        machine_class,
        setup_tier,
        stock_mass_kg,
        machining_minutes,
        per_unit,
        batch,
        lead_time,
        confidence,
        notes,
    })
}

/// Lead-time range in working days.
pub fn lead_time(complexity: ComplexityLevel, quantity: u32, urgency: Urgency) -> LeadTime {
    // u64 keeps the spread multiplication exact for any u32 quantity
    let mut days = u64::from(BASE_LEAD_DAYS);
    if complexity >= ComplexityLevel::High {
        days += u64::from(COMPLEX_LEAD_DAYS);
    }
    if quantity > BATCH_SIZE {
        let extra_batches = (quantity - BATCH_SIZE).div_ceil(BATCH_SIZE);
        days += u64::from(DAYS_PER_EXTRA_BATCH) * u64::from(extra_batches);
    }
    if urgency == Urgency::Express {
        days = (days * u64::from(EXPRESS_FACTOR.0)).div_ceil(u64::from(EXPRESS_FACTOR.1));
    }
    let max_days = (days * u64::from(LEAD_SPREAD.0)).div_ceil(u64::from(LEAD_SPREAD.1));
    LeadTime {
        min_days: u32::try_from(days).unwrap_or(u32::MAX),
        max_days: u32::try_from(max_days).unwrap_or(u32::MAX),
    }
}

/// Confidence from complexity and the DFM verdict.
pub fn confidence(complexity: ComplexityLevel, dfm: Option<&DfmAnalysisResult>) -> Confidence {
    let Some(dfm) = dfm else {
        return Confidence::Low;
    };
    match complexity {
        ComplexityLevel::Low if !dfm.requires_support => Confidence::High,
        ComplexityLevel::Medium if dfm.manufacturability_score > 70.0 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfm::{self, DfmConfig};
    use crate::geometry;
    use crate::shapes;
    use approx::assert_relative_eq;

    fn cube_analysis() -> GeometryAnalysis {
        geometry::analyze(&shapes::cube(50.0)).unwrap()
    }

    fn dfm_with(requires_support: bool, requires_5_axis: bool, score: f64) -> DfmAnalysisResult {
        DfmAnalysisResult {
            overhang_zones: Vec::new(),
            overhang_percentage: 0.0,
            requires_support,
            requires_5_axis,
            min_wall_thickness: None,
            wall_thickness: None,
            features: None,
            manufacturability_score: score,
            recommendations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_cube_breakdown() {
        let analysis = cube_analysis();
        let config = QuoteConfig::new("aluminum-6061", "anodized", 1);
        let price = estimate(&analysis, None, &config, &Catalog::standard()).unwrap();

        // 125 cm³ of 2.70 g/cm³ stock at $8/kg with 1.3 waste
        assert_relative_eq!(price.stock_mass_kg, 0.3375, epsilon = 1e-9);
        assert_relative_eq!(price.per_unit.material, 0.3375 * 8.0 * 1.3, epsilon = 1e-9);

        // 15000 mm² of surface
        let minutes = 150.0 * (1.0 + analysis.complexity_score / 100.0);
        assert_relative_eq!(price.machining_minutes, minutes, epsilon = 1e-9);
        assert_relative_eq!(price.per_unit.machining, minutes / 60.0 * 75.0, epsilon = 1e-9);

        assert_eq!(price.setup_tier, SetupTier::Simple);
        assert_relative_eq!(price.per_unit.setup, 50.0);
        assert_relative_eq!(price.per_unit.finishing, 150.0 * 0.05, epsilon = 1e-9);
        assert_relative_eq!(price.per_unit.margin, price.per_unit.subtotal * 0.25, epsilon = 1e-9);
        assert_relative_eq!(price.per_unit.total, price.per_unit.subtotal * 1.25, epsilon = 1e-9);
        assert_eq!(price.machine_class, MachineClass::ThreeAxis);
        assert_eq!(price.confidence, Confidence::Low);
        assert_eq!(price.currency, "USD");
    }

    #[test]
    fn test_batch_charges_setup_once() {
        let analysis = cube_analysis();
        let config = QuoteConfig::new("aluminum-6061", "as-machined", 4);
        let price = estimate(&analysis, None, &config, &Catalog::standard()).unwrap();
        assert_relative_eq!(price.per_unit.setup, 12.5);
        assert_relative_eq!(price.batch.setup, 50.0);
        assert_relative_eq!(price.batch.material, price.per_unit.material * 4.0, epsilon = 1e-9);
        assert_relative_eq!(price.batch.total, price.per_unit.total * 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_per_unit_setup_decreases_with_quantity() {
        let analysis = cube_analysis();
        let catalog = Catalog::standard();
        let mut previous = f64::INFINITY;
        for quantity in [1, 2, 5, 10, 50, 100] {
            let config = QuoteConfig::new("aluminum-6061", "as-machined", quantity);
            let price = estimate(&analysis, None, &config, &catalog).unwrap();
            assert!(price.per_unit.setup < previous);
            previous = price.per_unit.setup;
        }
    }

    #[test]
    fn test_harder_material_costs_more_to_machine() {
        let analysis = cube_analysis();
        let catalog = Catalog::standard();
        let easy = estimate(
            &analysis,
            None,
            &QuoteConfig::new("aluminum-6061", "as-machined", 1),
            &catalog,
        )
        .unwrap();
        let hard = estimate(
            &analysis,
            None,
            &QuoteConfig::new("titanium-ti6al4v", "as-machined", 1),
            &catalog,
        )
        .unwrap();
        assert!(hard.per_unit.machining > easy.per_unit.machining);
    }

    #[test]
    fn test_machine_class_selection() {
        let analysis = cube_analysis();
        let catalog = Catalog::standard();
        let config = QuoteConfig::default();

        let five = dfm_with(true, true, 40.0);
        let price = estimate(&analysis, Some(&five), &config, &catalog).unwrap();
        assert_eq!(price.machine_class, MachineClass::FiveAxis);

        let four = dfm_with(true, false, 80.0);
        assert_eq!(MachineClass::select(Some(&four)), MachineClass::FourAxis);
        assert_eq!(MachineClass::select(None), MachineClass::ThreeAxis);

        let three = estimate(&analysis, Some(&dfm_with(false, false, 100.0)), &config, &catalog)
            .unwrap();
        assert!(price.per_unit.machining > three.per_unit.machining);
        assert_relative_eq!(
            price.per_unit.machining / three.per_unit.machining,
            125.0 / 75.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_unknown_catalog_ids() {
        let analysis = cube_analysis();
        let catalog = Catalog::standard();
        let err = estimate(&analysis, None, &QuoteConfig::new("gold", "as-machined", 1), &catalog)
            .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::UnknownMaterial);
        let err = estimate(&analysis, None, &QuoteConfig::new("delrin", "chrome", 1), &catalog)
            .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::UnknownFinish);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = estimate(
            &cube_analysis(),
            None,
            &QuoteConfig::new("delrin", "as-machined", 0),
            &Catalog::standard(),
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_tolerance_scales_machining() {
        let analysis = cube_analysis();
        let catalog = Catalog::standard();
        let standard = estimate(&analysis, None, &QuoteConfig::default(), &catalog).unwrap();
        let tight = estimate(
            &analysis,
            None,
            &QuoteConfig::default().with_tolerance(ToleranceClass::Tight),
            &catalog,
        )
        .unwrap();
        assert_relative_eq!(
            tight.machining_minutes,
            standard.machining_minutes * 1.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_lead_time() {
        let lt = lead_time(ComplexityLevel::Low, 1, Urgency::Standard);
        assert_eq!(lt, LeadTime { min_days: 5, max_days: 7 });

        assert_eq!(lead_time(ComplexityLevel::High, 1, Urgency::Standard).min_days, 8);
        assert_eq!(lead_time(ComplexityLevel::VeryHigh, 1, Urgency::Standard).min_days, 8);
        assert_eq!(lead_time(ComplexityLevel::Low, 10, Urgency::Standard).min_days, 5);
        assert_eq!(lead_time(ComplexityLevel::Low, 11, Urgency::Standard).min_days, 7);
        assert_eq!(lead_time(ComplexityLevel::Low, 25, Urgency::Standard).min_days, 9);

        // ceil(8 * 0.6) = 5
        assert_eq!(lead_time(ComplexityLevel::High, 1, Urgency::Express).min_days, 5);
        // ceil(5 * 0.6) = 3
        let express = lead_time(ComplexityLevel::Low, 1, Urgency::Express);
        assert_eq!(express, LeadTime { min_days: 3, max_days: 5 });
    }

    #[test]
    fn test_lead_time_at_max_quantity() {
        let lt = lead_time(ComplexityLevel::Low, u32::MAX, Urgency::Standard);
        assert_eq!(lt, LeadTime { min_days: 858_993_463, max_days: 1_202_590_849 });

        let express = lead_time(ComplexityLevel::Low, u32::MAX, Urgency::Express);
        assert_eq!(express, LeadTime { min_days: 515_396_078, max_days: 721_554_510 });

        let estimate = estimate(
            &cube_analysis(),
            None,
            &QuoteConfig::new("delrin", "as-machined", u32::MAX),
            &Catalog::standard(),
        )
        .unwrap();
        assert!(estimate.lead_time.max_days >= estimate.lead_time.min_days);
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(ComplexityLevel::Low, None), Confidence::Low);
        let clean = dfm_with(false, false, 100.0);
        assert_eq!(confidence(ComplexityLevel::Low, Some(&clean)), Confidence::High);
        assert_eq!(confidence(ComplexityLevel::Medium, Some(&clean)), Confidence::Medium);
        let rough = dfm_with(true, false, 60.0);
        assert_eq!(confidence(ComplexityLevel::Low, Some(&rough)), Confidence::Low);
        assert_eq!(confidence(ComplexityLevel::Medium, Some(&rough)), Confidence::Low);
        assert_eq!(confidence(ComplexityLevel::High, Some(&clean)), Confidence::Low);
    }

    #[test]
    fn test_real_dfm_result_drives_estimate() {
        let mesh = shapes::cube(50.0);
        let analysis = geometry::analyze(&mesh).unwrap();
        let dfm = dfm::analyze(&mesh, &analysis, &DfmConfig::default()).unwrap();
        let price = estimate(&analysis, Some(&dfm), &QuoteConfig::default(), &Catalog::standard())
            .unwrap();
        assert_eq!(price.confidence, Confidence::High);
        assert_eq!(price.machine_class, MachineClass::ThreeAxis);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Tight".parse::<ToleranceClass>().unwrap(), ToleranceClass::Tight);
        assert_eq!("express".parse::<Urgency>().unwrap(), Urgency::Express);
        assert!("overnight".parse::<Urgency>().is_err());
    }
}
