//! MVG Query Facade

use crate::closure::resolve_closure;
use crate::orderer::order_concepts;
use crate::reducer::reduce;
use crate::{ResolveError, ResolverConfig};
use ktree_domain::traits::ConceptStore;
use ktree_domain::{Concept, ConceptId, Domain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

/// How the caller names the target concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRef {
    /// Concept id
    Id(ConceptId),

    /// Concept name, matched case-insensitively
    Name {
        /// Name to look up
        name: String,
        /// Restrict the lookup to one domain
        domain: Option<Domain>,
    },
}

impl From<ConceptId> for TargetRef {
    fn from(id: ConceptId) -> Self {
        TargetRef::Id(id)
    }
}

impl From<&str> for TargetRef {
    fn from(id: &str) -> Self {
        TargetRef::Id(id.into())
    }
}

/// One MVG query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvgRequest {
    /// Concept to learn
    pub target: TargetRef,

    /// Concepts the learner already understands
    pub known: BTreeSet<ConceptId>,

    /// Fail instead of returning unverified concepts
    pub verified_only: bool,
}

impl MvgRequest {
    /// Query a target with nothing known
    pub fn new(target: impl Into<TargetRef>) -> Self {
        Self {
            target: target.into(),
            known: BTreeSet::new(),
            verified_only: false,
        }
    }

    /// Set the known concepts
    pub fn with_known<I, K>(mut self, known: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ConceptId>,
    {
        self.known = known.into_iter().map(Into::into).collect();
        self
    }

    /// Request a verified-only path
    pub fn verified_only(mut self) -> Self {
        self.verified_only = true;
        self
    }
}

/// A minimum viable graph, ready for the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvgResult {
    /// The target concept
    pub target: Concept,

    /// Concepts to learn first, in learning order (target excluded)
    pub prerequisites: Vec<Concept>,

    /// Ids in learning order, ending with the target
    pub path: Vec<ConceptId>,
}

/// Composes closure, reduction and ordering into one query
///
/// The engine is stateless apart from its configuration. A query reads the
/// store only, so one engine can serve any number of concurrent queries.
/// Pass a single consistent view of the store so the whole query sees one
/// version of the graph.
///
/// # Examples
///
/// ```
/// use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
/// use ktree_domain::traits::MutableConceptStore;
/// use ktree_resolver::{MvgEngine, MvgRequest};
/// use ktree_store::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.add_concept(Concept::axiom("ext", "Extensionality", Domain::Math, "set-theory")).unwrap();
/// store.add_concept(Concept::new("empty", "Empty Set", Domain::Math, "set-theory", 1)).unwrap();
/// store.add_prerequisite(PrerequisiteEdge::new("empty", "ext")).unwrap();
///
/// let engine = MvgEngine::default();
/// let mvg = engine.generate(&store.snapshot().unwrap(), &MvgRequest::new("empty")).unwrap();
/// assert_eq!(mvg.path, vec![ConceptId::from("ext"), ConceptId::from("empty")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MvgEngine {
    config: ResolverConfig,
}

impl MvgEngine {
    /// Create an engine with the given configuration
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Answer a query that cannot be cancelled
    pub fn generate<S>(&self, store: &S, request: &MvgRequest) -> Result<MvgResult, ResolveError>
    where
        S: ConceptStore + ?Sized,
        S::Error: std::fmt::Display,
    {
        self.generate_with_cancel(store, request, &CancellationToken::new())
    }

    /// Answer a query, aborting with `Cancelled` once `cancel` fires
    pub fn generate_with_cancel<S>(
        &self,
        store: &S,
        request: &MvgRequest,
        cancel: &CancellationToken,
    ) -> Result<MvgResult, ResolveError>
    where
        S: ConceptStore + ?Sized,
        S::Error: std::fmt::Display,
    {
        let target_id = self.resolve_target(store, &request.target)?;

        let closure = resolve_closure(store, &target_id, self.config.max_closure_size, cancel)?;
        let selected = reduce(store, &target_id, &closure, &request.known, cancel)?;
        let mut concepts = order_concepts(store, &target_id, &selected, cancel)?;

        if self.config.verified_only || request.verified_only {
            let unverified: Vec<ConceptId> = concepts
                .iter()
                .filter(|c| !c.is_verified)
                .map(|c| c.id.clone())
                .collect();
            if !unverified.is_empty() {
                return Err(ResolveError::Unverified(unverified));
            }
        }

        let path: Vec<ConceptId> = concepts.iter().map(|c| c.id.clone()).collect();
        let target = concepts
            .pop()
            .filter(|c| c.id == target_id)
            .ok_or_else(|| ResolveError::Unreachable {
                remaining: vec![target_id.clone()],
            })?;

        tracing::info!(
            "MVG for {}: {} prerequisites (closure {}, known {})",
            target_id,
            concepts.len(),
            closure.len(),
            request.known.len()
        );

        Ok(MvgResult {
            target,
            prerequisites: concepts,
            path,
        })
    }

    fn resolve_target<S>(&self, store: &S, target: &TargetRef) -> Result<ConceptId, ResolveError>
    where
        S: ConceptStore + ?Sized,
        S::Error: std::fmt::Display,
    {
        match target {
            TargetRef::Id(id) => Ok(id.clone()),
            TargetRef::Name { name, domain } => store
                .find_by_name(name, *domain)
                .map_err(|e| ResolveError::store(format!("Failed to find {:?}", name), e))?
                .map(|c| c.id)
                .ok_or_else(|| ResolveError::NotFound(name.clone())),
        }
    }
}

/// Answer `generate_mvg(target, known)` with the default configuration
pub fn generate_mvg<S>(
    store: &S,
    target: &ConceptId,
    known: &BTreeSet<ConceptId>,
) -> Result<MvgResult, ResolveError>
where
    S: ConceptStore + ?Sized,
    S::Error: std::fmt::Display,
{
    let request = MvgRequest {
        target: TargetRef::Id(target.clone()),
        known: known.clone(),
        verified_only: false,
    };
    MvgEngine::default().generate(store, &request)
}
