//! Tree command implementation.

use super::{parse_domain, GraphStore};
use crate::cli::TreeArgs;
use crate::error::Result;
use crate::output::Formatter;
use ktree_resolver::DomainTree;
use tokio_util::sync::CancellationToken;

/// Execute the tree command.
pub fn execute_tree<S: GraphStore>(
    args: TreeArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let domain = parse_domain(&args.domain)?;
    let view = store.read_view()?;
    let tree = DomainTree::build(&view, domain, &CancellationToken::new())?;
    formatter.format_tree(&tree)
}
