//! List command implementation.

use super::{parse_domain, GraphStore};
use crate::cli::ListArgs;
use crate::error::Result;
use crate::output::Formatter;
use ktree_domain::traits::{ConceptFilter, ConceptStore};

/// Execute the list command.
pub fn execute_list<S: GraphStore>(
    args: ListArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let filter = ConceptFilter {
        domain: args.domain.as_deref().map(parse_domain).transpose()?,
        subfield: args.subfield,
        axioms_only: args.axioms,
        max_complexity: args.max_complexity,
        limit: args.limit,
    };

    let concepts = store.list(&filter)?;
    formatter.format_concepts(&concepts)
}
