//! Material, finish and machine rate tables.
//!
//! The catalog is plain data. [`Catalog::standard`] is the built-in table;
//! shops override it with a TOML or JSON file:
//!
//! ```toml
//! [materials.aluminum-6061]
//! name = "Aluminum 6061-T6"
//! density_g_cm3 = 2.70
//! price_per_kg = 8.0
//! waste_factor = 1.3
//! machinability = 1.0
//!
//! [finishes.anodized]
//! name = "Anodized (Type II)"
//! cost_per_cm2 = 0.05
//!
//! [machine_rates]
//! three_axis = 75.0
//! four_axis = 95.0
//! five_axis = 125.0
//!
//! [setup_fees]
//! simple = 50.0
//! medium = 100.0
//! complex = 200.0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{QuoteError, QuoteResult};

/// A stock material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Density (g/cm³).
    pub density_g_cm3: f64,
    /// Stock price (USD/kg).
    pub price_per_kg: f64,
    /// Stock bought per unit of envelope, at least 1.
    pub waste_factor: f64,
    /// Relative ease of cutting; 1.0 is 6061 aluminum, lower is slower.
    pub machinability: f64,
}

/// A surface finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finish {
    pub name: String,
    /// USD per cm² of surface.
    pub cost_per_cm2: f64,
}

/// Hourly rates by machine class (USD/h).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRates {
    pub three_axis: f64,
    pub four_axis: f64,
    pub five_axis: f64,
}

/// One-time setup fees by tier (USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupFees {
    pub simple: f64,
    pub medium: f64,
    pub complex: f64,
}

/// Everything the estimator needs to price a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub materials: BTreeMap<String, Material>,
    pub finishes: BTreeMap<String, Finish>,
    pub machine_rates: MachineRates,
    pub setup_fees: SetupFees,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The built-in table.
    pub fn standard() -> Self {
        let materials = [
            ("aluminum-6061", "Aluminum 6061-T6", 2.70, 8.0, 1.3, 1.0),
            ("aluminum-7075", "Aluminum 7075-T6", 2.81, 12.0, 1.3, 0.8),
            ("steel-1018", "Mild Steel 1018", 7.87, 4.0, 1.4, 0.6),
            ("stainless-304", "Stainless Steel 304", 8.00, 9.0, 1.4, 0.45),
            ("titanium-ti6al4v", "Titanium Ti-6Al-4V", 4.43, 45.0, 1.5, 0.25),
            ("brass-360", "Brass C360", 8.50, 10.0, 1.3, 1.2),
            ("delrin", "Delrin (POM)", 1.41, 15.0, 1.2, 1.5),
            ("peek", "PEEK", 1.30, 120.0, 1.2, 0.9),
        ]
        .into_iter()
        .map(|(id, name, density, price, waste, machinability)| {
            (
                id.to_string(),
                Material {
                    name: name.to_string(),
                    density_g_cm3: density,
                    price_per_kg: price,
                    waste_factor: waste,
                    machinability,
                },
            )
        })
        .collect();

        let finishes = [
            ("as-machined", "As Machined", 0.0),
            ("bead-blasted", "Bead Blasted", 0.02),
            ("anodized", "Anodized (Type II)", 0.05),
            ("hard-anodized", "Hard Anodized (Type III)", 0.08),
            ("powder-coated", "Powder Coated", 0.06),
            ("polished", "Polished", 0.10),
        ]
        .into_iter()
        .map(|(id, name, cost)| {
            (
                id.to_string(),
                Finish {
                    name: name.to_string(),
                    cost_per_cm2: cost,
                },
            )
        })
        .collect();

        Self {
            materials,
            finishes,
            machine_rates: MachineRates {
                three_axis: 75.0,
                four_axis: 95.0,
                five_axis: 125.0,
            },
            setup_fees: SetupFees {
                simple: 50.0,
                medium: 100.0,
                complex: 200.0,
            },
        }
    }

    /// Parse a TOML catalog.
    pub fn from_toml_str(s: &str) -> QuoteResult<Self> {
        let catalog: Catalog =
            toml::from_str(s).map_err(|e| QuoteError::catalog_parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a JSON catalog.
    pub fn from_json_str(s: &str) -> QuoteResult<Self> {
        let catalog: Catalog =
            serde_json::from_str(s).map_err(|e| QuoteError::catalog_parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file, choosing the parser by extension (`.toml` or `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> QuoteResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let parse: fn(&str) -> QuoteResult<Catalog> = match extension.as_deref() {
            Some("toml") => Catalog::from_toml_str,
            Some("json") => Catalog::from_json_str,
            _ => return Err(QuoteError::UnsupportedFormat { extension }),
        };

        let contents =
            std::fs::read_to_string(path).map_err(|e| QuoteError::io_read(path, e))?;
        let catalog = parse(&contents)?;
        info!(
            path = %path.display(),
            materials = catalog.materials.len(),
            finishes = catalog.finishes.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> QuoteResult<String> {
        toml::to_string_pretty(self).map_err(|e| QuoteError::catalog_parse(e.to_string()))
    }

    /// Look up a material, listing the alternatives on failure.
    pub fn material(&self, id: &str) -> QuoteResult<&Material> {
        self.materials
            .get(id)
            .ok_or_else(|| QuoteError::UnknownMaterial {
                id: id.to_string(),
                available: self.material_ids(),
            })
    }

    /// Look up a finish, listing the alternatives on failure.
    pub fn finish(&self, id: &str) -> QuoteResult<&Finish> {
        self.finishes.get(id).ok_or_else(|| QuoteError::UnknownFinish {
            id: id.to_string(),
            available: self.finish_ids(),
        })
    }

    /// Material identifiers in sorted order.
    pub fn material_ids(&self) -> Vec<String> {
        self.materials.keys().cloned().collect()
    }

    /// Finish identifiers in sorted order.
    pub fn finish_ids(&self) -> Vec<String> {
        self.finishes.keys().cloned().collect()
    }

    /// Reject values that would make prices meaningless.
    pub fn validate(&self) -> QuoteResult<()> {
        if self.materials.is_empty() {
            return Err(QuoteError::catalog_parse("catalog defines no materials"));
        }
        for (id, m) in &self.materials {
            let ok = positive(m.density_g_cm3)
                && non_negative(m.price_per_kg)
                && m.waste_factor.is_finite()
                && m.waste_factor >= 1.0
                && positive(m.machinability);
            if !ok {
                return Err(QuoteError::catalog_parse(format!(
                    "material '{}' needs positive density and machinability, a non-negative price and a waste factor of at least 1",
                    id
                )));
            }
        }
        for (id, f) in &self.finishes {
            if !non_negative(f.cost_per_cm2) {
                return Err(QuoteError::catalog_parse(format!(
                    "finish '{}' has a negative or non-finite cost",
                    id
                )));
            }
        }
        let rates = &self.machine_rates;
        let fees = &self.setup_fees;
        let all_non_negative = [
            rates.three_axis,
            rates.four_axis,
            rates.five_axis,
            fees.simple,
            fees.medium,
            fees.complex,
        ]
        .into_iter()
        .all(non_negative);
        if !all_non_negative {
            return Err(QuoteError::catalog_parse(
                "machine rates and setup fees must be non-negative",
            ));
        }
        Ok(())
    }
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_standard_catalog() {
        let catalog = Catalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.materials.len(), 8);
        assert_eq!(catalog.finishes.len(), 6);
        assert_eq!(catalog.material("aluminum-6061").unwrap().machinability, 1.0);
        assert_eq!(catalog.finish("as-machined").unwrap().cost_per_cm2, 0.0);
    }

    #[test]
    fn test_unknown_ids_list_alternatives() {
        let catalog = Catalog::standard();
        match catalog.material("unobtainium").unwrap_err() {
            QuoteError::UnknownMaterial { id, available } => {
                assert_eq!(id, "unobtainium");
                assert!(available.contains(&"peek".to_string()));
            }
            other => panic!("Expected UnknownMaterial, got {:?}", other),
        }
        assert_eq!(
            catalog.finish("chrome").unwrap_err().code(),
            crate::ErrorCode::UnknownFinish
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let catalog = Catalog::standard();
        let toml_str = catalog.to_toml().unwrap();
        let parsed = Catalog::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_json_catalog() {
        let json = r#"{
            "materials": {
                "copper-110": {
                    "name": "Copper 110",
                    "density_g_cm3": 8.96,
                    "price_per_kg": 14.0,
                    "waste_factor": 1.3,
                    "machinability": 0.7
                }
            },
            "finishes": {
                "as-machined": { "name": "As Machined", "cost_per_cm2": 0.0 }
            },
            "machine_rates": { "three_axis": 80.0, "four_axis": 100.0, "five_axis": 140.0 },
            "setup_fees": { "simple": 60.0, "medium": 120.0, "complex": 240.0 }
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.material_ids(), vec!["copper-110".to_string()]);
        assert_eq!(catalog.machine_rates.five_axis, 140.0);
    }

    #[test]
    fn test_malformed_catalog() {
        let err = Catalog::from_toml_str("materials = 3").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::CatalogParse);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut catalog = Catalog::standard();
        if let Some(m) = catalog.materials.get_mut("delrin") {
            m.waste_factor = 0.5;
        }
        let toml_str = catalog.to_toml().unwrap();
        let err = Catalog::from_toml_str(&toml_str).unwrap_err();
        assert!(err.to_string().contains("delrin"));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("shop.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        file.write_all(Catalog::standard().to_toml().unwrap().as_bytes())
            .unwrap();
        assert!(Catalog::from_file(&toml_path).is_ok());

        let yaml_path = dir.path().join("shop.yaml");
        std::fs::write(&yaml_path, "materials: {}").unwrap();
        assert_eq!(
            Catalog::from_file(&yaml_path).unwrap_err().code(),
            crate::ErrorCode::UnsupportedFormat
        );

        let missing = dir.path().join("missing.json");
        assert_eq!(
            Catalog::from_file(&missing).unwrap_err().code(),
            crate::ErrorCode::IoRead
        );
    }
}
