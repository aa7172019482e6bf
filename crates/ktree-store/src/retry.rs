//! Bounded retry of idempotent reads
//!
//! Only reads are retried. Mutations fail fast so a caller never has to
//! guess whether a timed-out write was applied.

use crate::{ReadView, StoreError};
use ktree_domain::traits::{ConceptFilter, ConceptStore, GraphCounts, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default number of attempts (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff settings for transient store failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts before giving up, first try included
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_backoff_ms: u64,

    /// Upper bound on any single delay
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: 20,
            max_backoff_ms: 500,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        Duration::from_millis(millis.min(self.max_backoff_ms as f64) as u64)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Result<T, StoreError>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempts < self.max_attempts => {
                    let delay = self.delay_for(attempts);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempts,
                        self.max_attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Store wrapper retrying reads that hit a busy or locked database
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    /// Wrap a store
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

/// Views keep the retry policy, so reads inside one snapshot are retried
/// against that same snapshot
impl<S> ReadView for RetryingStore<S>
where
    S: ReadView + ConceptStore<Error = StoreError>,
{
    type View<'a>
        = RetryingStore<S::View<'a>>
    where
        Self: 'a;

    fn read_view(&self) -> Result<Self::View<'_>, StoreError> {
        let view = self.policy.run("read_view", || self.inner.read_view())?;
        Ok(RetryingStore::new(view, self.policy.clone()))
    }
}

impl<S> ConceptStore for RetryingStore<S>
where
    S: ConceptStore<Error = StoreError>,
{
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        self.policy.run("get_concept", || self.inner.get_concept(id))
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.policy
            .run("prerequisites_of", || self.inner.prerequisites_of(id))
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.policy.run("dependents_of", || self.inner.dependents_of(id))
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        self.policy.run("exists", || self.inner.exists(id))
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        self.policy
            .run("find_by_name", || self.inner.find_by_name(name, domain))
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        self.policy.run("list", || self.inner.list(filter))
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        self.policy.run("counts", || self.inner.counts())
    }
}

impl<S> MutableConceptStore for RetryingStore<S>
where
    S: MutableConceptStore<Error = StoreError>,
{
    fn add_concept(&self, concept: Concept) -> Result<ConceptId, Self::Error> {
        self.inner.add_concept(concept)
    }

    fn add_prerequisite(&self, edge: PrerequisiteEdge) -> Result<(), Self::Error> {
        self.inner.add_prerequisite(edge)
    }
}
