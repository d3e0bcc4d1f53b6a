//! # Units
//!
//! Unit normalization for activity quantities, plus lightweight wrappers for
//! emission magnitudes.
//!
//! ## Canonical units
//!
//! Each category's factors are expressed per one canonical unit. Inputs in
//! other known units are scaled before the factor is applied:
//!
//! - energy: `kwh`
//! - transport: `km`
//! - materials, waste: `kg` (`ton` = 1000 kg)
//! - water: `m3` (`liter` = 0.001 m³)
//!
//! Unit names are matched exactly. An unknown unit, or any unit of an unknown
//! category, passes through with multiplier 1.0; it is never rejected.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::units::{normalize, KgCo2e, TonnesCo2e};
//!
//! assert_eq!(normalize("waste", 2.0, "ton"), 2000.0);
//! assert_eq!(normalize("water", 500.0, "liter"), 0.5);
//! assert_eq!(normalize("energy", 5.0, "bogus_unit"), 5.0);
//!
//! let tonnes: TonnesCo2e = KgCo2e(1500.0).into();
//! assert_eq!(tonnes.0, 1.5);
//! ```

use std::collections::HashMap;
use std::ops::Add;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::factors::Category;

/// Multiplier used when a unit is not in the conversion table.
pub const PASS_THROUGH_MULTIPLIER: f64 = 1.0;

const STANDARD_CONVERSIONS: [(Category, &[(&str, f64)]); 5] = [
    (Category::Energy, &[("kwh", 1.0)]),
    (Category::Transport, &[("km", 1.0)]),
    (Category::Materials, &[("kg", 1.0), ("ton", 1000.0)]),
    (Category::Waste, &[("kg", 1.0), ("ton", 1000.0)]),
    (Category::Water, &[("m3", 1.0), ("liter", 0.001)]),
];

/// Process-wide category → unit → multiplier table.
pub static UNIT_CONVERSIONS: Lazy<UnitConversionTable> = Lazy::new(UnitConversionTable::standard);

/// Immutable conversion table to each category's canonical unit.
#[derive(Debug, Clone)]
pub struct UnitConversionTable {
    multipliers: HashMap<Category, HashMap<&'static str, f64>>,
}

impl UnitConversionTable {
    /// Build the standard table.
    pub fn standard() -> Self {
        let multipliers = STANDARD_CONVERSIONS
            .iter()
            .map(|(category, units)| (*category, units.iter().copied().collect()))
            .collect();
        UnitConversionTable { multipliers }
    }

    /// Multiplier for a known category/unit pair.
    pub fn lookup(&self, category: Category, unit: &str) -> Option<f64> {
        self.multipliers.get(&category)?.get(unit).copied()
    }

    /// Units accepted for a category, sorted by name.
    pub fn units(&self, category: Category) -> Vec<(&'static str, f64)> {
        let mut units: Vec<_> = self
            .multipliers
            .get(&category)
            .map(|m| m.iter().map(|(name, value)| (*name, *value)).collect())
            .unwrap_or_default();
        units.sort_by(|a, b| a.0.cmp(b.0));
        units
    }

    /// Multiplier for free-form category and unit names; 1.0 when either is unknown.
    pub fn multiplier(&self, category: &str, unit: &str) -> f64 {
        Category::parse(category)
            .and_then(|category| self.lookup(category, unit))
            .unwrap_or(PASS_THROUGH_MULTIPLIER)
    }
}

impl Default for UnitConversionTable {
    fn default() -> Self {
        UnitConversionTable::standard()
    }
}

/// Multiplier that converts `unit` to the canonical unit of `category`.
pub fn conversion_multiplier(category: &str, unit: &str) -> f64 {
    UNIT_CONVERSIONS.multiplier(category, unit)
}

/// Quantity expressed in the canonical unit of `category`.
pub fn normalize(category: &str, quantity: f64, unit: &str) -> f64 {
    quantity * conversion_multiplier(category, unit)
}

// ============================================================================
// Emission Magnitudes
// ============================================================================

/// Emissions in kilograms of CO2-equivalent
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgCo2e(pub f64);

/// Emissions in metric tonnes of CO2-equivalent (1 t = 1000 kg)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TonnesCo2e(pub f64);

impl From<KgCo2e> for TonnesCo2e {
    fn from(kg: KgCo2e) -> Self {
        TonnesCo2e(kg.0 / 1000.0)
    }
}

impl From<TonnesCo2e> for KgCo2e {
    fn from(t: TonnesCo2e) -> Self {
        KgCo2e(t.0 * 1000.0)
    }
}

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), |acc, x| acc + x)
            }
        }
    };
}

impl_arithmetic!(KgCo2e);
impl_arithmetic!(TonnesCo2e);
