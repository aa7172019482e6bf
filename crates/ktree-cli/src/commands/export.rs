//! Export command implementation.

use super::GraphStore;
use crate::cli::ExportArgs;
use crate::error::Result;
use crate::output::Formatter;
use ktree_store::GraphDocument;

/// Execute the export command.
///
/// The document is always JSON; `--format` only affects the confirmation
/// printed when writing to a file.
pub fn execute_export<S: GraphStore>(
    args: ExportArgs,
    store: &S,
    formatter: &Formatter,
) -> Result<String> {
    let view = store.read_view()?;
    let document = GraphDocument::from_store(&view)?;
    let json = serde_json::to_string_pretty(&document)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            tracing::info!("Exported graph to {}", path.display());
            Ok(match formatter.format() {
                crate::config::OutputFormat::Quiet => String::new(),
                _ => formatter.success(&format!(
                    "Exported {} concepts and {} edges to {}",
                    document.concepts.len(),
                    document.edges.len(),
                    path.display()
                )),
            })
        }
        None => Ok(json),
    }
}
