//! MVG command implementation.

use super::{parse_domain, GraphStore};
use crate::cli::MvgArgs;
use crate::error::Result;
use crate::output::Formatter;
use ktree_domain::ConceptId;
use ktree_resolver::{MvgEngine, MvgRequest, TargetRef};

/// Execute the mvg command.
pub fn execute_mvg<S: GraphStore>(
    args: MvgArgs,
    store: &S,
    engine: &MvgEngine,
    formatter: &Formatter,
) -> Result<String> {
    let request = build_request(args)?;
    let view = store.read_view()?;
    let mvg = engine.generate(&view, &request)?;
    tracing::debug!("MVG for {}: {} step(s)", mvg.target.id, mvg.path.len());
    formatter.format_mvg(&mvg)
}

fn build_request(args: MvgArgs) -> Result<MvgRequest> {
    let target = if args.by_name {
        TargetRef::Name {
            name: args.target,
            domain: args.domain.as_deref().map(parse_domain).transpose()?,
        }
    } else {
        TargetRef::Id(ConceptId::from(args.target))
    };

    let known = args
        .known
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty());

    let mut request = MvgRequest::new(target).with_known(known);
    if args.verified_only {
        request = request.verified_only();
    }
    Ok(request)
}
