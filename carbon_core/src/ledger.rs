//! # Emission Ledger
//!
//! The `EmissionLedger` is the per-user store of calculation results. Each
//! stored row gets an auto-incrementing id and is owned by exactly one user.
//! Ledgers serialize to human-readable JSON (see [`crate::file_io`]).
//!
//! ## Structure
//!
//! ```text
//! EmissionLedger
//! ├── meta: LedgerMetadata (schema version, timestamps)
//! ├── next_id: u64 (next row id to hand out)
//! └── records: Vec<StoredEmission> (insertion order)
//!     └── StoredEmission { id, user_id, <EmissionResult fields>, created_at }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::calculator::calculate;
//! use carbon_core::ledger::EmissionLedger;
//!
//! let mut ledger = EmissionLedger::new();
//! let result = calculate("energy", 120.0, "kwh", Some("grid_world"), "direct");
//! let id = ledger.insert("ana@example.com", result);
//!
//! assert_eq!(id, 1);
//! assert_eq!(ledger.count_for_user("ana@example.com"), 1);
//! assert_eq!(ledger.count_for_user("someone-else"), 0);
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculator::{round_to, EmissionResult, KG_DECIMALS, TONS_DECIMALS};
use crate::units::{KgCo2e, TonnesCo2e};

/// Current schema version for ledger files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root ledger container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionLedger {
    /// Ledger metadata (schema version, timestamps)
    pub meta: LedgerMetadata,

    /// Next row id; ids are never reused, even after a reset
    pub next_id: u64,

    /// All stored rows, in insertion order
    pub records: Vec<StoredEmission>,
}

impl EmissionLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        let now = Utc::now();
        EmissionLedger {
            meta: LedgerMetadata {
                version: SCHEMA_VERSION.to_string(),
                created: now,
                modified: now,
            },
            next_id: 1,
            records: Vec::new(),
        }
    }

    /// Store a result for a user.
    ///
    /// Returns the row id assigned to it.
    pub fn insert(&mut self, user_id: impl Into<String>, result: EmissionResult) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(StoredEmission {
            id,
            user_id: user_id.into(),
            result,
            created_at: Utc::now(),
        });
        self.touch();
        id
    }

    /// Get a stored row by id.
    pub fn get(&self, id: u64) -> Option<&StoredEmission> {
        self.records.iter().find(|r| r.id == id)
    }

    /// A user's rows, newest first.
    ///
    /// Ordered by `created_at` descending, ties broken by id descending.
    pub fn for_user(&self, user_id: &str) -> Vec<&StoredEmission> {
        let mut rows: Vec<_> = self.records.iter().filter(|r| r.user_id == user_id).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    pub fn count_for_user(&self, user_id: &str) -> usize {
        self.records.iter().filter(|r| r.user_id == user_id).count()
    }

    /// Delete every row belonging to `user_id`.
    ///
    /// Returns the number of rows removed. Other users' rows are untouched.
    pub fn reset_user(&mut self, user_id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.user_id != user_id);
        let removed = before - self.records.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Totals over a user's rows.
    pub fn summary_for_user(&self, user_id: &str) -> EmissionSummary {
        let mut by_category: BTreeMap<String, KgCo2e> = BTreeMap::new();
        let mut by_scope: BTreeMap<String, KgCo2e> = BTreeMap::new();
        let rows: Vec<_> = self.records.iter().filter(|r| r.user_id == user_id).collect();
        let total: KgCo2e = rows.iter().map(|r| KgCo2e(r.result.emissions_kg)).sum();

        for row in &rows {
            let kg = KgCo2e(row.result.emissions_kg);
            let category = by_category.entry(row.result.category.clone()).or_default();
            *category = *category + kg;
            let scope = by_scope.entry(row.result.scope.clone()).or_default();
            *scope = *scope + kg;
        }

        let round_kg = |kg: KgCo2e| KgCo2e(round_to(kg.0, KG_DECIMALS));
        let total_kg = round_kg(total);
        let total_tons = TonnesCo2e(round_to(TonnesCo2e::from(total_kg).0, TONS_DECIMALS));

        EmissionSummary {
            user_id: user_id.to_string(),
            count: rows.len(),
            total_kg,
            total_tons,
            by_category: by_category.into_iter().map(|(k, v)| (k, round_kg(v))).collect(),
            by_scope: by_scope.into_iter().map(|(k, v)| (k, round_kg(v))).collect(),
        }
    }

    /// Total number of rows across all users.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for EmissionLedger {
    fn default() -> Self {
        EmissionLedger::new()
    }
}

/// Ledger metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// When the ledger was created
    pub created: DateTime<Utc>,

    /// When the ledger was last modified
    pub modified: DateTime<Utc>,
}

/// One persisted calculation result.
///
/// The result fields are flattened, so a row reads like the result itself
/// plus `id`, `user_id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmission {
    /// Row id, unique within the ledger
    pub id: u64,

    /// Owner of the row
    pub user_id: String,

    #[serde(flatten)]
    pub result: EmissionResult,

    /// When the row was stored
    pub created_at: DateTime<Utc>,
}

/// Aggregated emissions for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionSummary {
    pub user_id: String,
    /// Number of rows summed
    pub count: usize,
    pub total_kg: KgCo2e,
    pub total_tons: TonnesCo2e,
    /// kg CO2e per category name
    pub by_category: BTreeMap<String, KgCo2e>,
    /// kg CO2e per scope name
    pub by_scope: BTreeMap<String, KgCo2e>,
}
