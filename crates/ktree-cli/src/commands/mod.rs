//! Command implementations.
//!
//! Each command returns its rendered output; the binary prints it.

pub mod add;
pub mod export;
pub mod list;
pub mod mvg;
pub mod require;
pub mod show;
pub mod tree;

pub use self::add::execute_add;
pub use self::export::execute_export;
pub use self::list::execute_list;
pub use self::mvg::execute_mvg;
pub use self::require::execute_require;
pub use self::show::execute_show;
pub use self::tree::execute_tree;

use crate::cli::Command;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ktree_domain::traits::{ConceptStore, MutableConceptStore};
use ktree_domain::{Concept, ConceptId, Domain};
use ktree_resolver::MvgEngine;
use ktree_store::{ReadView, StoreError};

/// Stores the commands can run against
pub trait GraphStore: MutableConceptStore<Error = StoreError> + ReadView {}

impl<T> GraphStore for T where T: MutableConceptStore<Error = StoreError> + ReadView {}

/// Run one command and return what it prints.
pub fn execute<S: GraphStore>(
    command: Command,
    store: &S,
    config: &Config,
    formatter: &Formatter,
) -> Result<String> {
    match command {
        Command::Add(args) => execute_add(args, store, formatter),
        Command::Require(args) => execute_require(args, store, formatter),
        Command::Mvg(args) => {
            let engine = MvgEngine::new(config.resolver.clone());
            execute_mvg(args, store, &engine, formatter)
        }
        Command::Show(args) => execute_show(args, store, formatter),
        Command::List(args) => execute_list(args, store, formatter),
        Command::Tree(args) => execute_tree(args, store, formatter),
        Command::Export(args) => execute_export(args, store, formatter),
    }
}

/// Parse a domain argument, ignoring case.
pub(crate) fn parse_domain(input: &str) -> Result<Domain> {
    Domain::parse(input).ok_or_else(|| {
        let valid: Vec<&str> = Domain::ALL.iter().map(Domain::as_str).collect();
        CliError::InvalidInput(format!(
            "Unknown domain '{}'. Expected one of {}",
            input,
            valid.join(", ")
        ))
    })
}

/// Load the records behind a set of ids, skipping any that vanished.
pub(crate) fn hydrate<S>(
    store: &S,
    ids: impl IntoIterator<Item = ConceptId>,
) -> std::result::Result<Vec<Concept>, S::Error>
where
    S: ConceptStore + ?Sized,
{
    let mut concepts = Vec::new();
    for id in ids {
        if let Some(concept) = store.get_concept(&id)? {
            concepts.push(concept);
        }
    }
    Ok(concepts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        assert_eq!(parse_domain("math").unwrap(), Domain::Math);
        assert_eq!(parse_domain(" CS ").unwrap(), Domain::Cs);

        let err = parse_domain("alchemy").unwrap_err();
        assert!(err.to_string().contains("MATH, PHYSICS, CHEMISTRY, BIOLOGY, CS"));
    }
}
