//! Require command implementation.

use super::GraphStore;
use crate::cli::RequireArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ktree_domain::PrerequisiteEdge;

/// Execute the require command.
pub fn execute_require<S: GraphStore>(
    args: RequireArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let concept = args.concept.trim();
    let prerequisite = args.prerequisite.trim();
    if concept.is_empty() || prerequisite.is_empty() {
        return Err(CliError::InvalidInput(
            "Concept and prerequisite ids must not be empty".to_string(),
        ));
    }

    let edge = PrerequisiteEdge::new(concept, prerequisite);
    store.add_prerequisite(edge.clone())?;
    Ok(formatter.prerequisite_added(&edge))
}
