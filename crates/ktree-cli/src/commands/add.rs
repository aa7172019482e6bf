//! Add command implementation.

use super::GraphStore;
use crate::cli::AddArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ktree_domain::{Concept, ConceptId};
use std::io::Read;
use std::path::Path;

/// Execute the add command.
///
/// Records are added one by one; those accepted before a rejected record
/// stay in the graph.
pub fn execute_add<S: GraphStore>(
    args: AddArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let contents = if args.file == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(&args.file)?
    };

    let concepts = parse_concepts(&contents)?;
    let ids = add_concepts(store, concepts)?;
    Ok(formatter.concepts_added(&ids))
}

/// Add records, generating an id for any record whose id is blank.
pub fn add_concepts<S: GraphStore>(store: &S, concepts: Vec<Concept>) -> Result<Vec<ConceptId>> {
    let mut ids = Vec::with_capacity(concepts.len());
    for mut concept in concepts {
        if concept.id.is_blank() {
            concept.id = ConceptId::generate(concept.domain, &concept.subfield, &concept.name);
        }
        let id = store.add_concept(concept)?;
        tracing::info!("Added concept {}", id);
        ids.push(id);
    }
    Ok(ids)
}

/// Parse one concept object or an array of them.
fn parse_concepts(contents: &str) -> Result<Vec<Concept>> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let concepts = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => {
            return Err(CliError::InvalidInput(
                "Expected a concept object or an array of concepts".to_string(),
            ))
        }
    };
    Ok(concepts)
}
