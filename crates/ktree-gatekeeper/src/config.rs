//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
///
/// Dangling references, self-loops and cycles are always rejected; the
/// flags here only control the record-level consistency rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject axioms whose complexity level is not 0
    #[serde(default = "default_true")]
    pub enforce_axiom_level: bool,

    /// Reject prerequisite edges out of a concept flagged as an axiom
    #[serde(default = "default_true")]
    pub enforce_axiom_flag: bool,

    /// Maximum number of concepts the cycle search may visit
    ///
    /// `None` searches the whole graph. When the budget runs out the edge is
    /// rejected, since acyclicity could not be proven.
    #[serde(default)]
    pub max_cycle_search: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enforce_axiom_level: true,
            enforce_axiom_flag: true,
            max_cycle_search: None,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (structural checks only)
    pub fn permissive() -> Self {
        Self {
            enforce_axiom_level: false,
            enforce_axiom_flag: false,
            max_cycle_search: None,
        }
    }

    /// Create a strict configuration (all rules, bounded search)
    pub fn strict() -> Self {
        Self {
            enforce_axiom_level: true,
            enforce_axiom_flag: true,
            max_cycle_search: Some(100_000),
        }
    }
}
