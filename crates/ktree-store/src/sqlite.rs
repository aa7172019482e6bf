//! SQLite-backed concept store

use crate::{GraphDocument, ReadView, StoreError};
use ktree_domain::traits::{ConceptFilter, ConceptStore, GraphCounts, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain, PrerequisiteEdge};
use ktree_gatekeeper::Gatekeeper;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Default time a statement waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const CONCEPT_COLUMNS: &str = "id, name, definition, domain, subfield, complexity_level, \
     is_axiom, is_verified, books, papers, articles, llm_summary";

/// SQLite-based implementation of the concept store
///
/// The connection sits behind a mutex, so the store can be shared between
/// threads. Every mutation runs in its own immediate transaction:
/// validate, insert, commit. Any failure drops the transaction, which rolls
/// it back.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    gatekeeper: Gatekeeper,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ktree_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("knowledge-tree.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_options(
            path,
            Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            Gatekeeper::default_config(),
        )
    }

    /// Create a store with an explicit busy timeout and Gatekeeper
    pub fn with_options<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
        gatekeeper: Gatekeeper,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(include_str!("schema.sql"))?;

        Ok(Self {
            conn: Mutex::new(conn),
            gatekeeper,
        })
    }

    /// Export every concept and edge from one read snapshot
    pub fn export_document(&self) -> Result<GraphDocument, StoreError> {
        GraphDocument::from_store(&self.read_view()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite connection".to_string()))
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&SqliteReader<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.lock()?;
        f(&SqliteReader { conn: &conn })
    }
}

impl ReadView for SqliteStore {
    type View<'a> = SqliteSnapshot<'a>;

    fn read_view(&self) -> Result<Self::View<'_>, StoreError> {
        SqliteSnapshot::begin(self.lock()?)
    }
}

/// A read transaction held open for the life of one query
///
/// Owns the connection lock and a deferred transaction, so every read
/// through it sees the same committed state. Another connection cannot
/// commit a write until the snapshot is dropped; dropping it rolls the
/// transaction back.
pub struct SqliteSnapshot<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteSnapshot<'a> {
    fn begin(conn: MutexGuard<'a, Connection>) -> Result<Self, StoreError> {
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(Self { conn })
    }

    fn reader(&self) -> SqliteReader<'_> {
        SqliteReader { conn: &self.conn }
    }
}

impl Drop for SqliteSnapshot<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!("Failed to close read snapshot: {}", e);
        }
    }
}

impl ConceptStore for SqliteSnapshot<'_> {
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        self.reader().get_concept(id)
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.reader().prerequisites_of(id)
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.reader().dependents_of(id)
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        self.reader().exists(id)
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        self.reader().find_by_name(name, domain)
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        self.reader().list(filter)
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        self.reader().counts()
    }
}

impl ConceptStore for SqliteStore {
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        self.read(|r| r.get_concept(id))
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.read(|r| r.prerequisites_of(id))
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.read(|r| r.dependents_of(id))
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        self.read(|r| r.exists(id))
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        self.read(|r| r.find_by_name(name, domain))
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        self.read(|r| r.list(filter))
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        self.read(|r| r.counts())
    }
}

impl MutableConceptStore for SqliteStore {
    fn add_concept(&self, concept: Concept) -> Result<ConceptId, Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let reader = SqliteReader { conn: &tx };
            if let Err(e) = self
                .gatekeeper
                .validate_concept(&reader, &concept)?
                .into_result()
            {
                tracing::warn!("Rejected concept {}: {}", concept.id, e);
                return Err(e.into());
            }
            reader.insert_concept(&concept)?;
        }
        tx.commit()?;

        tracing::debug!("Added concept {}", concept.id);
        Ok(concept.id)
    }

    fn add_prerequisite(&self, edge: PrerequisiteEdge) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let reader = SqliteReader { conn: &tx };
            // Re-adding an existing edge is a no-op
            if reader.has_edge(&edge)? {
                return Ok(());
            }
            if let Err(e) = self.gatekeeper.validate_edge(&reader, &edge)?.into_result() {
                tracing::warn!("Rejected edge {}: {}", edge, e);
                return Err(e.into());
            }
            tx.execute(
                "INSERT INTO requires (concept_id, prerequisite_id) VALUES (?1, ?2)",
                params![edge.concept.as_str(), edge.prerequisite.as_str()],
            )?;
        }
        tx.commit()?;

        tracing::debug!("Added edge: {}", edge);
        Ok(())
    }
}

/// Query helpers over a connection or an open transaction
struct SqliteReader<'c> {
    conn: &'c Connection,
}

impl SqliteReader<'_> {
    fn has_edge(&self, edge: &PrerequisiteEdge) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM requires WHERE concept_id = ?1 AND prerequisite_id = ?2",
                params![edge.concept.as_str(), edge.prerequisite.as_str()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    fn insert_concept(&self, concept: &Concept) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO concepts (id, name, definition, domain, subfield, complexity_level,
                                   is_axiom, is_verified, books, papers, articles, llm_summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                concept.id.as_str(),
                &concept.name,
                &concept.definition,
                concept.domain.as_str(),
                &concept.subfield,
                concept.complexity_level as i64,
                concept.is_axiom,
                concept.is_verified,
                serde_json::to_string(&concept.books)?,
                serde_json::to_string(&concept.papers)?,
                serde_json::to_string(&concept.articles)?,
                &concept.llm_summary,
            ],
        )?;

        for related in &concept.related_concepts {
            self.conn.execute(
                "INSERT OR IGNORE INTO related_concepts (concept_id, related_id) VALUES (?1, ?2)",
                params![concept.id.as_str(), related.as_str()],
            )?;
        }
        Ok(())
    }

    fn id_set(&self, sql: &str, id: &ConceptId) -> Result<BTreeSet<ConceptId>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![id.as_str()], |row| row.get::<_, String>(0))?
            .map(|r| r.map(ConceptId::from))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    fn hydrate(&self, mut concept: Concept) -> Result<Concept, StoreError> {
        concept.related_concepts = self.id_set(
            "SELECT related_id FROM related_concepts WHERE concept_id = ?1",
            &concept.id,
        )?;
        Ok(concept)
    }
}

impl ConceptStore for SqliteReader<'_> {
    type Error = StoreError;

    fn get_concept(&self, id: &ConceptId) -> Result<Option<Concept>, Self::Error> {
        let concept = self
            .conn
            .query_row(
                &format!("SELECT {} FROM concepts WHERE id = ?1", CONCEPT_COLUMNS),
                params![id.as_str()],
                row_to_concept,
            )
            .optional()?;
        concept.map(|c| self.hydrate(c)).transpose()
    }

    fn prerequisites_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.id_set(
            "SELECT prerequisite_id FROM requires WHERE concept_id = ?1",
            id,
        )
    }

    fn dependents_of(&self, id: &ConceptId) -> Result<BTreeSet<ConceptId>, Self::Error> {
        self.id_set(
            "SELECT concept_id FROM requires WHERE prerequisite_id = ?1",
            id,
        )
    }

    fn exists(&self, id: &ConceptId) -> Result<bool, Self::Error> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM concepts WHERE id = ?1",
                params![id.as_str()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    fn find_by_name(
        &self,
        name: &str,
        domain: Option<Domain>,
    ) -> Result<Option<Concept>, Self::Error> {
        let concept = match domain {
            Some(domain) => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM concepts WHERE name = ?1 COLLATE NOCASE AND domain = ?2
                         ORDER BY id LIMIT 1",
                        CONCEPT_COLUMNS
                    ),
                    params![name, domain.as_str()],
                    row_to_concept,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM concepts WHERE name = ?1 COLLATE NOCASE
                         ORDER BY id LIMIT 1",
                        CONCEPT_COLUMNS
                    ),
                    params![name],
                    row_to_concept,
                )
                .optional()?,
        };
        concept.map(|c| self.hydrate(c)).transpose()
    }

    fn list(&self, filter: &ConceptFilter) -> Result<Vec<Concept>, Self::Error> {
        let mut sql = format!("SELECT {} FROM concepts WHERE 1=1", CONCEPT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(domain) = filter.domain {
            sql.push_str(" AND domain = ?");
            params.push(Box::new(domain.as_str()));
        }

        if let Some(subfield) = &filter.subfield {
            sql.push_str(" AND subfield = ?");
            params.push(Box::new(subfield.clone()));
        }

        if filter.axioms_only {
            sql.push_str(" AND is_axiom = 1");
        }

        if let Some(max) = filter.max_complexity {
            sql.push_str(" AND complexity_level <= ?");
            params.push(Box::new(max as i64));
        }

        sql.push_str(" ORDER BY complexity_level, id");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let concepts = stmt
            .query_map(&param_refs[..], row_to_concept)?
            .collect::<Result<Vec<_>, _>>()?;

        concepts.into_iter().map(|c| self.hydrate(c)).collect()
    }

    fn counts(&self) -> Result<GraphCounts, Self::Error> {
        let concepts: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))?;
        let edges: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM requires", [], |row| row.get(0))?;
        Ok(GraphCounts {
            concepts: concepts as usize,
            edges: edges as usize,
        })
    }
}

fn conversion_error(idx: usize, ty: rusqlite::types::Type, e: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| conversion_error(idx, rusqlite::types::Type::Text, e.into()))
}

/// Map a `CONCEPT_COLUMNS` row; related links are loaded separately
fn row_to_concept(row: &Row<'_>) -> rusqlite::Result<Concept> {
    let domain_str: String = row.get(3)?;
    let domain = Domain::parse(&domain_str).ok_or_else(|| {
        conversion_error(
            3,
            rusqlite::types::Type::Text,
            StoreError::InvalidData(format!("Unknown domain: {}", domain_str)),
        )
    })?;

    let level: i64 = row.get(5)?;
    let complexity_level = u32::try_from(level).map_err(|_| {
        conversion_error(
            5,
            rusqlite::types::Type::Integer,
            StoreError::InvalidData(format!("Invalid complexity level: {}", level)),
        )
    })?;

    Ok(Concept {
        id: ConceptId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        definition: row.get(2)?,
        domain,
        subfield: row.get(4)?,
        complexity_level,
        is_axiom: row.get(6)?,
        is_verified: row.get(7)?,
        books: json_list(row, 8)?,
        papers: json_list(row, 9)?,
        articles: json_list(row, 10)?,
        related_concepts: BTreeSet::new(),
        llm_summary: row.get(11)?,
    })
}
