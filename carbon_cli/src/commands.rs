//! Command handlers.
//!
//! Each handler returns the JSON document to print. Errors are left as
//! [`CarbonError`] so `main` can pick the exit code and error envelope.

use std::path::PathBuf;

use serde_json::{json, Value};
use tracing::info;

use carbon_core::calculator::CarbonCalculator;
use carbon_core::clock::{Clock, SystemClock};
use carbon_core::errors::{CarbonError, CarbonResult};
use carbon_core::factors::{Category, EMISSION_FACTORS};
use carbon_core::file_io::{load_or_create_ledger, save_ledger, LedgerLock};
use carbon_core::request::{ApiResponse, EmissionRequest};
use carbon_core::units::UNIT_CONVERSIONS;
use carbon_core::EmissionLedger;

use crate::cli::Commands;

/// Everything a command needs: who it runs for, where results go, and the engine.
pub struct App<C: Clock = SystemClock> {
    pub calculator: CarbonCalculator<C>,
    pub ledger_path: PathBuf,
    pub user: String,
    pub default_scope: String,
}

impl<C: Clock> App<C> {
    pub fn dispatch(&self, command: Commands) -> CarbonResult<Value> {
        match command {
            Commands::Calculate {
                category,
                quantity,
                unit,
                subcategory,
                scope,
                no_save,
            } => {
                let body = json!({
                    "category": category,
                    "quantity": quantity,
                    "unit": unit,
                    "subcategory": subcategory,
                    "scope": scope.unwrap_or_else(|| self.default_scope.clone()),
                });
                self.calculate(&body, !no_save)
            }
            Commands::Request { body, no_save } => {
                let body = read_body(&body)?;
                let body: Value = serde_json::from_str(&body)
                    .map_err(|e| CarbonError::invalid_request(format!("Invalid JSON body: {e}")))?;
                self.calculate(&body, !no_save)
            }
            Commands::History => self.history(),
            Commands::Summary => self.summary(),
            Commands::Reset => self.reset(),
            Commands::Factors { category } => factors(category.as_deref()),
        }
    }

    /// Validate, calculate, optionally record; returns the success envelope.
    pub fn calculate(&self, body: &Value, save: bool) -> CarbonResult<Value> {
        let request = EmissionRequest::from_json(body)?;
        let result = self.calculator.calculate_request(&request);

        if save {
            let id = self.with_ledger(|ledger| Ok(ledger.insert(self.user.clone(), result.clone())))?;
            info!(id, user = %self.user, emissions_kg = result.emissions_kg, "recorded emission");
        }

        Ok(serde_json::to_value(ApiResponse::ok(result))?)
    }

    pub fn history(&self) -> CarbonResult<Value> {
        let ledger = load_or_create_ledger(&self.ledger_path)?;
        let rows = ledger.for_user(&self.user);
        Ok(json!({
            "success": true,
            "emissions": rows,
            "total": rows.len(),
        }))
    }

    pub fn summary(&self) -> CarbonResult<Value> {
        let ledger = load_or_create_ledger(&self.ledger_path)?;
        Ok(serde_json::to_value(ApiResponse::ok(ledger.summary_for_user(&self.user)))?)
    }

    pub fn reset(&self) -> CarbonResult<Value> {
        let removed = self.with_ledger(|ledger| Ok(ledger.reset_user(&self.user)))?;
        info!(user = %self.user, removed, "reset user emissions");
        Ok(json!({
            "success": true,
            "message": format!("Removed {removed} emission record(s) for {}", self.user),
            "removed": removed,
        }))
    }

    /// Locked read-modify-write of the ledger file.
    fn with_ledger<T>(&self, update: impl FnOnce(&mut EmissionLedger) -> CarbonResult<T>) -> CarbonResult<T> {
        let _lock = LedgerLock::acquire(&self.ledger_path, self.user.clone())?;
        let mut ledger = load_or_create_ledger(&self.ledger_path)?;
        let value = update(&mut ledger)?;
        save_ledger(&ledger, &self.ledger_path)?;
        Ok(value)
    }
}

/// Factor table listing; unknown category names are a validation error here
/// because there is nothing to list.
pub fn factors(category: Option<&str>) -> CarbonResult<Value> {
    let categories = match category {
        Some(name) => vec![Category::parse(name).ok_or_else(|| {
            CarbonError::invalid_input("category", name, "Unknown category")
        })?],
        None => Category::ALL.to_vec(),
    };

    let listing: Vec<Value> = categories
        .into_iter()
        .map(|category| {
            json!({
                "category": category,
                "canonical_unit": category.canonical_unit(),
                "units": UNIT_CONVERSIONS
                    .units(category)
                    .into_iter()
                    .map(|(unit, multiplier)| json!({ "unit": unit, "multiplier": multiplier }))
                    .collect::<Vec<_>>(),
                "fallback": category.fallback(),
                "subcategories": EMISSION_FACTORS.subcategories(category),
            })
        })
        .collect();

    Ok(serde_json::to_value(ApiResponse::ok(listing))?)
}

fn read_body(arg: &str) -> CarbonResult<String> {
    if arg == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| CarbonError::file_error("read", "<stdin>", e.to_string()))
    } else {
        Ok(arg.to_string())
    }
}
