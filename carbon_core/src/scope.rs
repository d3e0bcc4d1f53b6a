//! Emission scope classification and its fixed discount multipliers.

use serde::{Deserialize, Serialize};

/// Scope string used when the caller does not provide one.
pub const DEFAULT_SCOPE: &str = "direct";

/// Multiplier for scope strings outside [`Scope::ALL`].
pub const UNKNOWN_SCOPE_MULTIPLIER: f64 = 1.0;

/// Emission source classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Direct,
    Indirect,
    Other,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Direct, Scope::Indirect, Scope::Other];

    pub fn name(&self) -> &'static str {
        match self {
            Scope::Direct => "direct",
            Scope::Indirect => "indirect",
            Scope::Other => "other",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Scope::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Scope::Direct => 1.0,
            Scope::Indirect => 0.85,
            Scope::Other => 0.75,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Multiplier for a free-form scope string; unrecognized scopes count as 1.0.
pub fn scope_multiplier(scope: &str) -> f64 {
    Scope::parse(scope)
        .map(|s| s.multiplier())
        .unwrap_or(UNKNOWN_SCOPE_MULTIPLIER)
}
