//! Graph mutation validation logic

use crate::{GatekeeperError, ValidationConfig};
use ktree_domain::traits::ConceptStore;
use ktree_domain::{Concept, ConceptId, PrerequisiteEdge};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Result of validating a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the mutation passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    fn from_reasons(reasons: Vec<RejectionReason>) -> Self {
        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        Self { status, reasons }
    }

    /// True if the mutation may be committed
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }

    /// Convert into a `Result`, surfacing the first rejection reason
    pub fn into_result(self) -> Result<(), RejectionReason> {
        match self.reasons.into_iter().next() {
            None => Ok(()),
            Some(reason) => Err(reason),
        }
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Mutation accepted
    Accepted,

    /// Mutation rejected
    Rejected,
}

/// Reasons for rejecting a mutation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// An edge endpoint does not reference an existing concept
    #[error("Dangling reference: concept {0} does not exist")]
    DanglingReference(ConceptId),

    /// A concept would require itself
    #[error("Self-loop: {0} cannot require itself")]
    SelfLoop(ConceptId),

    /// The edge would close a cycle
    #[error("Cycle detected: {}", format_path(.path))]
    CycleDetected {
        /// The cycle, starting and ending at the dependent concept
        path: Vec<ConceptId>,
    },

    /// The cycle search ran out of budget before proving acyclicity
    #[error("Cycle check inconclusive after visiting {visited} concepts")]
    CycleCheckInconclusive {
        /// Concepts visited before giving up
        visited: usize,
    },

    /// A concept with this id already exists
    #[error("Duplicate concept: {0}")]
    DuplicateConcept(ConceptId),

    /// The concept id is empty
    #[error("Concept id must not be empty")]
    EmptyId,

    /// The concept name is empty
    #[error("Concept {0} has an empty name")]
    EmptyName(ConceptId),

    /// An axiom with a non-zero complexity level
    #[error("Axiom {id} must have complexity level 0, found {level}")]
    AxiomLevelMismatch {
        /// The offending concept
        id: ConceptId,
        /// Its complexity level
        level: u32,
    },

    /// A prerequisite edge out of an axiom
    #[error("Axiom {0} cannot have prerequisites")]
    AxiomHasPrerequisite(ConceptId),
}

fn format_path(path: &[ConceptId]) -> String {
    path.iter()
        .map(ConceptId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The Gatekeeper validates graph mutations before storage
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a concept record before it is added
    pub fn validate_concept<S: ConceptStore>(
        &self,
        store: &S,
        concept: &Concept,
    ) -> Result<ValidationResult, GatekeeperError>
    where
        S::Error: std::fmt::Display,
    {
        let mut reasons = Vec::new();

        if concept.id.is_blank() {
            return Ok(ValidationResult::from_reasons(vec![RejectionReason::EmptyId]));
        }

        if concept.name.trim().is_empty() {
            reasons.push(RejectionReason::EmptyName(concept.id.clone()));
        }

        if self.config.enforce_axiom_level && concept.is_axiom && concept.complexity_level != 0 {
            reasons.push(RejectionReason::AxiomLevelMismatch {
                id: concept.id.clone(),
                level: concept.complexity_level,
            });
        }

        if exists(store, &concept.id)? {
            reasons.push(RejectionReason::DuplicateConcept(concept.id.clone()));
        }

        Ok(ValidationResult::from_reasons(reasons))
    }

    /// Validate `edge.concept requires edge.prerequisite` before it is added
    ///
    /// Both endpoints must exist and differ, and the prerequisite must not
    /// already (transitively) require the dependent concept.
    pub fn validate_edge<S: ConceptStore>(
        &self,
        store: &S,
        edge: &PrerequisiteEdge,
    ) -> Result<ValidationResult, GatekeeperError>
    where
        S::Error: std::fmt::Display,
    {
        let mut reasons = Vec::new();

        let dependent = get(store, &edge.concept)?;
        if dependent.is_none() {
            reasons.push(RejectionReason::DanglingReference(edge.concept.clone()));
        }
        if !edge.is_self_loop() && !exists(store, &edge.prerequisite)? {
            reasons.push(RejectionReason::DanglingReference(edge.prerequisite.clone()));
        }
        if edge.is_self_loop() {
            reasons.push(RejectionReason::SelfLoop(edge.concept.clone()));
        }

        // Reachability is meaningless once an endpoint is missing
        if !reasons.is_empty() {
            return Ok(ValidationResult::from_reasons(reasons));
        }

        if self.config.enforce_axiom_flag && dependent.map(|c| c.is_axiom).unwrap_or(false) {
            reasons.push(RejectionReason::AxiomHasPrerequisite(edge.concept.clone()));
        }

        match self.find_path(store, &edge.prerequisite, &edge.concept)? {
            PathSearch::Found(path) => {
                let mut cycle = Vec::with_capacity(path.len() + 1);
                cycle.push(edge.concept.clone());
                cycle.extend(path);
                reasons.push(RejectionReason::CycleDetected { path: cycle });
            }
            PathSearch::Exhausted { visited } => {
                reasons.push(RejectionReason::CycleCheckInconclusive { visited });
            }
            PathSearch::NotFound => {}
        }

        let result = ValidationResult::from_reasons(reasons);
        if !result.is_accepted() {
            tracing::debug!("Rejected edge {}: {:?}", edge, result.reasons);
        }
        Ok(result)
    }

    /// Breadth-first search along requires edges from `start` to `goal`
    ///
    /// Returns the path `start -> ... -> goal` when one exists.
    fn find_path<S: ConceptStore>(
        &self,
        store: &S,
        start: &ConceptId,
        goal: &ConceptId,
    ) -> Result<PathSearch, GatekeeperError>
    where
        S::Error: std::fmt::Display,
    {
        // child -> parent on the BFS tree; also serves as the visited set
        let mut parents: HashMap<ConceptId, Option<ConceptId>> = HashMap::new();
        let mut queue = VecDeque::new();
        parents.insert(start.clone(), None);
        queue.push_back(start.clone());

        while let Some(current) = queue.pop_front() {
            if &current == goal {
                let mut path = vec![current.clone()];
                let mut cursor = current;
                while let Some(Some(parent)) = parents.get(&cursor) {
                    path.push(parent.clone());
                    cursor = parent.clone();
                }
                path.reverse();
                return Ok(PathSearch::Found(path));
            }

            if let Some(budget) = self.config.max_cycle_search {
                if parents.len() > budget {
                    return Ok(PathSearch::Exhausted {
                        visited: parents.len(),
                    });
                }
            }

            let next = store.prerequisites_of(&current).map_err(|e| {
                GatekeeperError::Store(format!("Failed to read prerequisites of {}: {}", current, e))
            })?;
            for prerequisite in next {
                if !parents.contains_key(&prerequisite) {
                    parents.insert(prerequisite.clone(), Some(current.clone()));
                    queue.push_back(prerequisite);
                }
            }
        }

        Ok(PathSearch::NotFound)
    }
}

enum PathSearch {
    Found(Vec<ConceptId>),
    NotFound,
    Exhausted { visited: usize },
}

fn get<S: ConceptStore>(store: &S, id: &ConceptId) -> Result<Option<Concept>, GatekeeperError>
where
    S::Error: std::fmt::Display,
{
    store
        .get_concept(id)
        .map_err(|e| GatekeeperError::Store(format!("Failed to get concept {}: {}", id, e)))
}

fn exists<S: ConceptStore>(store: &S, id: &ConceptId) -> Result<bool, GatekeeperError>
where
    S::Error: std::fmt::Display,
{
    store
        .exists(id)
        .map_err(|e| GatekeeperError::Store(format!("Failed to look up concept {}: {}", id, e)))
}
