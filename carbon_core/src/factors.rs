//! # Emission Factors
//!
//! Static emission factor table, in kg CO2-equivalent per canonical unit of
//! each activity category.
//!
//! ## Categories and canonical units
//!
//! | Category  | Canonical unit | Fallback when subcategory is unknown |
//! |-----------|----------------|--------------------------------------|
//! | energy    | kWh            | `grid_brazil` factor                 |
//! | transport | km             | `gasoline_car` factor                |
//! | materials | kg             | literal 2.0                          |
//! | waste     | kg             | `landfill` factor                    |
//! | water     | m³             | `treatment` factor                   |
//!
//! Any category name outside this list is a pass-through: the converted
//! quantity is taken to already be kg CO2e (factor 1.0).
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::factors::{Category, EMISSION_FACTORS};
//!
//! assert_eq!(EMISSION_FACTORS.factor(Category::Transport, "bus"), Some(0.089));
//!
//! let resolved = EMISSION_FACTORS.resolve("energy", Some("no_such_source"));
//! assert_eq!(resolved.value, 0.082); // grid_brazil
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Factor applied to categories the table does not know.
pub const PASS_THROUGH_FACTOR: f64 = 1.0;

/// Activity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Electricity and fuel energy use (kWh)
    Energy,
    /// Distance travelled (km)
    Transport,
    /// Material mass (kg)
    Materials,
    /// Waste mass (kg)
    Waste,
    /// Water volume (m³)
    Water,
}

impl Category {
    /// All categories, in table order
    pub const ALL: [Category; 5] = [
        Category::Energy,
        Category::Transport,
        Category::Materials,
        Category::Waste,
        Category::Water,
    ];

    /// Wire name of the category (e.g., "energy")
    pub fn name(&self) -> &'static str {
        match self {
            Category::Energy => "energy",
            Category::Transport => "transport",
            Category::Materials => "materials",
            Category::Waste => "waste",
            Category::Water => "water",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    ///
    /// Returns `None` for anything else; callers treat that as the
    /// pass-through category rather than an error.
    pub fn parse(name: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Unit the category's factors are expressed in
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            Category::Energy => "kwh",
            Category::Transport => "km",
            Category::Materials | Category::Waste => "kg",
            Category::Water => "m3",
        }
    }

    /// Default applied when the subcategory is absent or unknown.
    pub fn fallback(&self) -> FallbackFactor {
        match self {
            Category::Energy => FallbackFactor::Subcategory("grid_brazil"),
            Category::Transport => FallbackFactor::Subcategory("gasoline_car"),
            // Not drawn from the table, unlike every other category.
            Category::Materials => FallbackFactor::Literal(2.0),
            Category::Waste => FallbackFactor::Subcategory("landfill"),
            Category::Water => FallbackFactor::Subcategory("treatment"),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-category default for unknown subcategories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FallbackFactor {
    /// Use the factor of another subcategory in the same category
    Subcategory(&'static str),
    /// Use a fixed factor that is not part of the table
    Literal(f64),
}

/// A single subcategory entry in the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubcategoryFactor {
    /// Subcategory name (e.g., "solar")
    pub name: &'static str,
    /// kg CO2e per canonical unit; negative for avoided emissions
    pub kg_co2e_per_unit: f64,
}

/// Where a resolved factor came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FactorSource {
    /// The requested subcategory was found in the table
    Table { subcategory: String },
    /// The requested subcategory was missing; another table entry was used
    Fallback { subcategory: &'static str },
    /// The requested subcategory was missing; the category's literal default was used
    LiteralDefault,
    /// The category is not in the table
    PassThrough,
}

/// Factor chosen for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFactor {
    /// kg CO2e per canonical unit
    pub value: f64,
    /// How the factor was chosen
    #[serde(flatten)]
    pub source: FactorSource,
}

impl ResolvedFactor {
    /// True when the requested subcategory was not used as-is.
    pub fn is_default(&self) -> bool {
        !matches!(self.source, FactorSource::Table { .. })
    }
}

const STANDARD_FACTORS: [(Category, &[(&str, f64)]); 5] = [
    (
        Category::Energy,
        &[
            ("grid_brazil", 0.082),
            ("grid_world", 0.475),
            ("coal", 0.950),
            ("natural_gas", 0.469),
            ("solar", 0.045),
            ("wind", 0.011),
            ("hydro", 0.024),
        ],
    ),
    (
        Category::Transport,
        &[
            ("gasoline_car", 0.192),
            ("diesel_car", 0.171),
            ("electric_car", 0.053),
            ("bus", 0.089),
            ("truck", 0.215),
            ("airplane", 0.285),
        ],
    ),
    (
        Category::Materials,
        &[
            ("steel", 2.30),
            ("aluminum", 8.10),
            ("cement", 0.93),
            ("plastic", 2.53),
            ("paper", 1.07),
            ("wood", 0.45),
        ],
    ),
    (
        Category::Waste,
        &[
            ("landfill", 0.350),
            ("incineration", 0.850),
            ("recycling", -0.500),
            ("composting", 0.120),
        ],
    ),
    (
        Category::Water,
        &[
            ("treatment", 0.320),
            ("distribution", 0.180),
            ("wastewater", 0.450),
        ],
    ),
];

/// Process-wide factor table, built on first use and never mutated.
pub static EMISSION_FACTORS: Lazy<EmissionFactorTable> = Lazy::new(EmissionFactorTable::standard);

/// Immutable category → subcategory → factor mapping.
#[derive(Debug, Clone)]
pub struct EmissionFactorTable {
    categories: HashMap<Category, Vec<SubcategoryFactor>>,
}

impl EmissionFactorTable {
    /// Build the standard table.
    pub fn standard() -> Self {
        let categories = STANDARD_FACTORS
            .iter()
            .map(|(category, entries)| {
                let factors = entries
                    .iter()
                    .map(|&(name, kg_co2e_per_unit)| SubcategoryFactor {
                        name,
                        kg_co2e_per_unit,
                    })
                    .collect();
                (*category, factors)
            })
            .collect();
        EmissionFactorTable { categories }
    }

    /// Exact lookup of a subcategory factor.
    pub fn factor(&self, category: Category, subcategory: &str) -> Option<f64> {
        self.subcategories(category)
            .iter()
            .find(|entry| entry.name == subcategory)
            .map(|entry| entry.kg_co2e_per_unit)
    }

    /// Entries of one category, in table order.
    pub fn subcategories(&self, category: Category) -> &[SubcategoryFactor] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every entry of the table, grouped by category in table order.
    pub fn entries(&self) -> impl Iterator<Item = (Category, &SubcategoryFactor)> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.subcategories(category).iter().map(move |entry| (category, entry)))
    }

    /// Pick the factor for a free-form category/subcategory pair.
    ///
    /// Never fails: unknown subcategories use the category's fallback and
    /// unknown categories use [`PASS_THROUGH_FACTOR`].
    pub fn resolve(&self, category: &str, subcategory: Option<&str>) -> ResolvedFactor {
        let Some(category) = Category::parse(category) else {
            return ResolvedFactor {
                value: PASS_THROUGH_FACTOR,
                source: FactorSource::PassThrough,
            };
        };

        if let Some(name) = subcategory {
            if let Some(value) = self.factor(category, name) {
                return ResolvedFactor {
                    value,
                    source: FactorSource::Table {
                        subcategory: name.to_string(),
                    },
                };
            }
        }

        match category.fallback() {
            FallbackFactor::Subcategory(name) => ResolvedFactor {
                // Every fallback name is a table entry of its own category.
                value: self.factor(category, name).unwrap_or(PASS_THROUGH_FACTOR),
                source: FactorSource::Fallback { subcategory: name },
            },
            FallbackFactor::Literal(value) => ResolvedFactor {
                value,
                source: FactorSource::LiteralDefault,
            },
        }
    }
}

impl Default for EmissionFactorTable {
    fn default() -> Self {
        EmissionFactorTable::standard()
    }
}
