//! Domain module - the closed set of knowledge areas

use serde::{Deserialize, Serialize};
use std::fmt;

/// Knowledge area a concept belongs to
///
/// The set is closed; new areas require a schema change, not new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Domain {
    /// Mathematics
    Math,

    /// Physics
    Physics,

    /// Chemistry
    Chemistry,

    /// Biology
    Biology,

    /// Computer science
    Cs,
}

impl Domain {
    /// Every domain, in declaration order
    pub const ALL: [Domain; 5] = [
        Domain::Math,
        Domain::Physics,
        Domain::Chemistry,
        Domain::Biology,
        Domain::Cs,
    ];

    /// Get the canonical (upper-case) name of the domain
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Math => "MATH",
            Domain::Physics => "PHYSICS",
            Domain::Chemistry => "CHEMISTRY",
            Domain::Biology => "BIOLOGY",
            Domain::Cs => "CS",
        }
    }

    /// Parse a domain name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MATH" => Some(Domain::Math),
            "PHYSICS" => Some(Domain::Physics),
            "CHEMISTRY" => Some(Domain::Chemistry),
            "BIOLOGY" => Some(Domain::Biology),
            "CS" => Some(Domain::Cs),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid domain: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Domain::parse("math"), Some(Domain::Math));
        assert_eq!(Domain::parse("Physics"), Some(Domain::Physics));
        assert_eq!(Domain::parse(" cs "), Some(Domain::Cs));
        assert_eq!(Domain::parse("astrology"), None);
    }

    #[test]
    fn test_as_str_parses_back() {
        for domain in Domain::ALL {
            assert_eq!(Domain::parse(domain.as_str()), Some(domain));
        }
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Domain::Chemistry).unwrap();
        assert_eq!(json, "\"CHEMISTRY\"");

        let parsed: Domain = serde_json::from_str("\"CS\"").unwrap();
        assert_eq!(parsed, Domain::Cs);
    }
}
