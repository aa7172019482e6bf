//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Configuration for MVG queries
///
/// # Examples
///
/// ```
/// use ktree_resolver::ResolverConfig;
///
/// let config: ResolverConfig = toml::from_str("verified_only = true").unwrap();
/// assert!(config.verified_only);
/// assert_eq!(config.max_closure_size, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fail queries whose path contains unverified concepts
    ///
    /// A request may turn this on per query; it cannot turn it off.
    pub verified_only: bool,

    /// Abort a query whose prerequisite closure grows past this many concepts
    pub max_closure_size: Option<usize>,
}

impl ResolverConfig {
    /// Only serve paths made of verified concepts
    pub fn verified() -> Self {
        Self {
            verified_only: true,
            ..Self::default()
        }
    }
}
