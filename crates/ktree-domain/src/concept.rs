//! Concept module - the atomic unit of knowledge

use crate::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable, opaque identifier of a concept
///
/// Ids are compared lexicographically; that ordering is the final tie-break
/// of every deterministic listing in the system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an identifier following the `<domain>-<subfield>-<slug>-<suffix>`
    /// naming convention
    ///
    /// The slug is the lower-cased name with spaces replaced by dashes,
    /// truncated to 20 characters. The suffix is 8 hex digits taken from the
    /// random part of a UUIDv7.
    ///
    /// # Examples
    ///
    /// ```
    /// use ktree_domain::{ConceptId, Domain};
    ///
    /// let id = ConceptId::generate(Domain::Math, "set-theory", "Empty Set");
    /// assert!(id.as_str().starts_with("math-set-theory-empty-set-"));
    /// ```
    pub fn generate(domain: Domain, subfield: &str, name: &str) -> Self {
        let slug: String = name
            .to_lowercase()
            .replace(' ', "-")
            .chars()
            .take(20)
            .collect();
        let uuid = uuid::Uuid::now_v7().simple().to_string();
        let suffix = &uuid[uuid.len() - 8..];

        Self(format!(
            "{}-{}-{}-{}",
            domain.as_str().to_lowercase(),
            subfield,
            slug,
            suffix
        ))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConceptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConceptId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A concept - one node of the prerequisite graph
///
/// `is_axiom` is authoritative: an axiom has no outgoing requires edges.
/// `complexity_level` is descriptive metadata and only used as an ordering
/// hint. `related_concepts` are "see also" links and are never traversed
/// during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Unique identifier
    pub id: ConceptId,

    /// Human-readable title (not guaranteed unique)
    pub name: String,

    /// Markdown definition with embedded math, opaque to the core
    #[serde(default, alias = "definition_md")]
    pub definition: String,

    /// Knowledge area
    pub domain: Domain,

    /// Free-text classification within the domain
    #[serde(default)]
    pub subfield: String,

    /// 0 for axioms, higher for concepts building on others
    #[serde(default)]
    pub complexity_level: u32,

    /// True iff the concept has no prerequisites
    #[serde(default)]
    pub is_axiom: bool,

    /// Provenance flag
    #[serde(default)]
    pub is_verified: bool,

    /// Book references
    #[serde(default)]
    pub books: Vec<String>,

    /// Paper references
    #[serde(default)]
    pub papers: Vec<String>,

    /// Article references
    #[serde(default)]
    pub articles: Vec<String>,

    /// Symmetric "see also" links (not prerequisites)
    #[serde(default)]
    pub related_concepts: BTreeSet<ConceptId>,

    /// Short generated summary, passed through untouched
    #[serde(default)]
    pub llm_summary: String,
}

impl Concept {
    /// Create a non-axiom concept with empty text fields
    pub fn new(
        id: impl Into<ConceptId>,
        name: impl Into<String>,
        domain: Domain,
        subfield: impl Into<String>,
        complexity_level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            definition: String::new(),
            domain,
            subfield: subfield.into(),
            complexity_level,
            is_axiom: false,
            is_verified: false,
            books: Vec::new(),
            papers: Vec::new(),
            articles: Vec::new(),
            related_concepts: BTreeSet::new(),
            llm_summary: String::new(),
        }
    }

    /// Create an axiom (level 0, no prerequisites)
    pub fn axiom(
        id: impl Into<ConceptId>,
        name: impl Into<String>,
        domain: Domain,
        subfield: impl Into<String>,
    ) -> Self {
        let mut concept = Self::new(id, name, domain, subfield, 0);
        concept.is_axiom = true;
        concept
    }

    /// Set the definition text
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    /// Mark the concept as verified
    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    /// Add a "see also" link
    pub fn with_related(mut self, related: impl Into<ConceptId>) -> Self {
        self.related_concepts.insert(related.into());
        self
    }
}
