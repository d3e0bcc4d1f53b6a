//! # Carbon Calculator
//!
//! Converts one activity quantity into estimated CO2-equivalent emissions.
//!
//! ## Algorithm
//!
//! 1. Normalize the quantity to the category's canonical unit
//!    (unknown units pass through with multiplier 1.0).
//! 2. Resolve the emission factor for the category/subcategory, falling back
//!    to the category default (see [`crate::factors`]).
//! 3. Apply the scope multiplier (direct 1.0, indirect 0.85, other 0.75,
//!    anything else 1.0).
//! 4. Round: `emissions_kg` to 2 decimals, `emissions_tons` to 4 decimals.
//!
//! `calculate` never fails. Unknown category, subcategory, unit and scope
//! strings all degrade to defaults; rejecting bad quantities is the job of
//! [`crate::request`].
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::calculator::calculate;
//!
//! let result = calculate("transport", 10.0, "km", Some("gasoline_car"), "indirect");
//! assert_eq!(result.emissions_kg, 1.63);
//! assert_eq!(result.emissions_tons, 0.0016);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::factors::EMISSION_FACTORS;
use crate::request::EmissionRequest;
use crate::scope::scope_multiplier;
use crate::units::conversion_multiplier;

/// Decimal places kept in `emissions_kg`
pub const KG_DECIMALS: usize = 2;

/// Decimal places kept in `emissions_tons`
pub const TONS_DECIMALS: usize = 4;

/// Outcome of one calculation.
///
/// Echoes the inputs unchanged alongside the computed fields. The caller owns
/// it outright; the persistence layer gives it a row id when stored.
///
/// ## JSON Example
///
/// ```json
/// {
///   "category": "materials",
///   "subcategory": "steel",
///   "quantity": 2.0,
///   "unit": "ton",
///   "scope": "direct",
///   "emissions_kg": 4600.0,
///   "emissions_tons": 4.6,
///   "timestamp": "2025-11-10T09:30:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    pub category: String,
    pub subcategory: Option<String>,
    /// Quantity as supplied, before unit conversion
    pub quantity: f64,
    pub unit: String,
    pub scope: String,
    /// kg CO2e, rounded to 2 decimals
    pub emissions_kg: f64,
    /// Tonnes CO2e, `round(emissions_kg / 1000, 4)`
    pub emissions_tons: f64,
    /// When the calculation ran
    pub timestamp: DateTime<Utc>,
}

/// Stateless emissions engine; the only thing it holds is its clock.
#[derive(Debug, Clone, Default)]
pub struct CarbonCalculator<C: Clock = SystemClock> {
    clock: C,
}

impl CarbonCalculator<SystemClock> {
    /// Calculator stamped with wall-clock time.
    pub fn new() -> Self {
        CarbonCalculator { clock: SystemClock }
    }
}

impl<C: Clock> CarbonCalculator<C> {
    /// Calculator stamped with the given clock.
    ///
    /// ```rust
    /// use carbon_core::calculator::CarbonCalculator;
    /// use carbon_core::clock::FixedClock;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let at = Utc.with_ymd_and_hms(2025, 11, 10, 9, 30, 0).unwrap();
    /// let calculator = CarbonCalculator::with_clock(FixedClock::new(at));
    /// let result = calculator.calculate("water", 500.0, "liter", None, "direct");
    /// assert_eq!(result.emissions_kg, 0.16);
    /// assert_eq!(result.timestamp, at);
    /// ```
    pub fn with_clock(clock: C) -> Self {
        CarbonCalculator { clock }
    }

    /// Estimate emissions for one activity quantity.
    pub fn calculate(
        &self,
        category: &str,
        quantity: f64,
        unit: &str,
        subcategory: Option<&str>,
        scope: &str,
    ) -> EmissionResult {
        let unit_multiplier = conversion_multiplier(category, unit);
        let converted = quantity * unit_multiplier;

        let factor = EMISSION_FACTORS.resolve(category, subcategory);
        let raw = converted * factor.value;

        let scope_multiplier = scope_multiplier(scope);
        let adjusted = raw * scope_multiplier;

        let emissions_kg = round_to(adjusted, KG_DECIMALS);
        let emissions_tons = round_to(emissions_kg / 1000.0, TONS_DECIMALS);

        debug!(
            category,
            subcategory,
            unit,
            scope,
            unit_multiplier,
            factor = factor.value,
            default_factor = factor.is_default(),
            scope_multiplier,
            emissions_kg,
            "calculated emissions"
        );

        EmissionResult {
            category: category.to_string(),
            subcategory: subcategory.map(str::to_string),
            quantity,
            unit: unit.to_string(),
            scope: scope.to_string(),
            emissions_kg,
            emissions_tons,
            timestamp: self.clock.now(),
        }
    }

    /// Estimate emissions for an already-validated request.
    pub fn calculate_request(&self, request: &EmissionRequest) -> EmissionResult {
        self.calculate(
            &request.category,
            request.quantity,
            &request.unit,
            request.subcategory.as_deref(),
            &request.scope,
        )
    }
}

/// Estimate emissions using wall-clock time for the timestamp.
pub fn calculate(
    category: &str,
    quantity: f64,
    unit: &str,
    subcategory: Option<&str>,
    scope: &str,
) -> EmissionResult {
    CarbonCalculator::new().calculate(category, quantity, unit, subcategory, scope)
}

/// Round to `digits` decimal places.
///
/// Works on the exact decimal expansion of the double with ties to even, so
/// `0.285` (stored as 0.28499999…) rounds to `0.28`. Scaling by a power of
/// ten first can push such values across the tie and round the wrong way.
/// Non-finite values are returned unchanged.
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", digits, value).parse().unwrap_or(value)
}
