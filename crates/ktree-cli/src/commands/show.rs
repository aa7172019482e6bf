//! Show command implementation.

use super::{hydrate, GraphStore};
use crate::cli::ShowArgs;
use crate::error::{CliError, Result};
use crate::output::{ConceptDetail, Formatter};
use ktree_domain::traits::ConceptStore;
use ktree_domain::ConceptId;

/// Execute the show command.
pub fn execute_show<S: GraphStore>(
    args: ShowArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let view = store.read_view()?;
    let id = ConceptId::from(args.id);

    let concept = view
        .get_concept(&id)?
        .ok_or_else(|| CliError::NotFound(id.to_string()))?;
    let prerequisites = hydrate(&view, view.prerequisites_of(&id)?)?;
    let dependents = hydrate(&view, view.dependents_of(&id)?)?;

    formatter.format_concept_detail(&ConceptDetail {
        concept: &concept,
        prerequisites: &prerequisites,
        dependents: &dependents,
    })
}
