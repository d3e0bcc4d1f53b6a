//! # carbon_core - Carbon Emissions Calculation Engine
//!
//! `carbon_core` turns activity quantities (energy use, distance travelled,
//! material and waste mass, water volume) into estimated CO2-equivalent
//! emissions using fixed emission factors, and keeps the results in a
//! per-user ledger. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: the calculator holds no mutable state and never fails;
//!   unknown inputs fall back to documented defaults
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types for validation and persistence
//! - **Testable**: timestamps come from an injectable clock
//!
//! ## Quick Start
//!
//! ```rust
//! use carbon_core::calculator::calculate;
//!
//! let result = calculate("materials", 2.0, "ton", Some("steel"), "direct");
//! assert_eq!(result.emissions_kg, 4600.0);
//! assert_eq!(result.emissions_tons, 4.6);
//!
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`calculator`] - The emissions engine and its result type
//! - [`factors`] - Emission factor table and per-category fallbacks
//! - [`units`] - Unit normalization and emission magnitude wrappers
//! - [`scope`] - Scope multipliers
//! - [`clock`] - Injectable time source
//! - [`request`] - Request validation and response envelope
//! - [`ledger`] - Per-user store of results
//! - [`file_io`] - Ledger files with atomic saves and locking
//! - [`errors`] - Structured error types

pub mod calculator;
pub mod clock;
pub mod errors;
pub mod factors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod ledger;
pub mod request;
pub mod scope;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculator::{calculate, CarbonCalculator, EmissionResult};
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{CarbonError, CarbonResult};
pub use factors::{Category, EMISSION_FACTORS};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_ledger, load_or_create_ledger, save_ledger, LedgerLock};
pub use ledger::{EmissionLedger, EmissionSummary, StoredEmission};
pub use request::{ApiResponse, EmissionRequest};
pub use scope::Scope;
