//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use ktree_domain::{Concept, ConceptId, PrerequisiteEdge};
use ktree_resolver::{DomainTree, MvgResult};
use serde::Serialize;
use std::collections::BTreeSet;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

/// A concept with its one-hop neighbourhood, as printed by `show`.
#[derive(Debug, Serialize)]
pub struct ConceptDetail<'a> {
    /// The concept itself
    #[serde(flatten)]
    pub concept: &'a Concept,
    /// Direct prerequisites
    pub prerequisites: &'a [Concept],
    /// Direct dependents
    pub dependents: &'a [Concept],
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a list of concepts.
    pub fn format_concepts(&self, concepts: &[Concept]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(&concepts),
            OutputFormat::Quiet => Ok(quiet(concepts.iter().map(|c| &c.id))),
            OutputFormat::Table => {
                if concepts.is_empty() {
                    return Ok(self.colorize("No concepts found.", "yellow"));
                }
                Ok(self.concept_table(concepts))
            }
        }
    }

    /// Format one concept with its direct prerequisites and dependents.
    pub fn format_concept_detail(&self, detail: &ConceptDetail<'_>) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(detail),
            OutputFormat::Quiet => Ok(detail.concept.id.to_string()),
            OutputFormat::Table => {
                let c = detail.concept;
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["ID", c.id.as_str()]);
                builder.push_record(["Name", &c.name]);
                builder.push_record(["Domain", c.domain.as_str()]);
                builder.push_record(["Subfield", &c.subfield]);
                builder.push_record(["Level", &c.complexity_level.to_string()]);
                builder.push_record(["Axiom", yes_no(c.is_axiom)]);
                builder.push_record(["Verified", yes_no(c.is_verified)]);
                builder.push_record(["Prerequisites", &join_ids(detail.prerequisites)]);
                builder.push_record(["Dependents", &join_ids(detail.dependents)]);
                if !c.related_concepts.is_empty() {
                    let related: Vec<&str> =
                        c.related_concepts.iter().map(ConceptId::as_str).collect();
                    builder.push_record(["Related", &related.join(", ")]);
                }
                for (label, refs) in [("Books", &c.books), ("Papers", &c.papers), ("Articles", &c.articles)] {
                    if !refs.is_empty() {
                        builder.push_record([label, &refs.join("\n")]);
                    }
                }

                let mut out = style(builder).to_string();
                if !c.definition.is_empty() {
                    out.push_str("\n\n");
                    out.push_str(&c.definition);
                }
                Ok(out)
            }
        }
    }

    /// Format a minimum viable graph as a numbered learning path.
    pub fn format_mvg(&self, mvg: &MvgResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(mvg),
            OutputFormat::Quiet => Ok(quiet(mvg.path.iter())),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Step", "ID", "Name", "Level", "Verified"]);
                for (step, c) in mvg
                    .prerequisites
                    .iter()
                    .chain(std::iter::once(&mvg.target))
                    .enumerate()
                {
                    builder.push_record([
                        (step + 1).to_string().as_str(),
                        c.id.as_str(),
                        &c.name,
                        &c.complexity_level.to_string(),
                        yes_no(c.is_verified),
                    ]);
                }

                let summary = if mvg.prerequisites.is_empty() {
                    format!("{} has nothing left to learn first", mvg.target.name)
                } else {
                    format!(
                        "{} concept(s) to learn before {}",
                        mvg.prerequisites.len(),
                        mvg.target.name
                    )
                };
                Ok(format!("{}\n{}", style(builder), self.info(&summary)))
            }
        }
    }

    /// Format a domain tree.
    ///
    /// The table form draws each root's dependents beneath it. A concept
    /// reachable from several parents is expanded once and referenced after.
    pub fn format_tree(&self, tree: &DomainTree) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(tree),
            OutputFormat::Quiet => Ok(quiet(tree.nodes.keys())),
            OutputFormat::Table => {
                if tree.nodes.is_empty() {
                    return Ok(self.colorize(&format!("No concepts in {}.", tree.domain), "yellow"));
                }
                let mut out = self.colorize(
                    &format!("{} ({} concepts)", tree.domain, tree.total_nodes),
                    "cyan",
                );
                let mut expanded = BTreeSet::new();
                for (i, root) in tree.roots.iter().enumerate() {
                    let last = i + 1 == tree.roots.len();
                    self.tree_branch(tree, root, "", last, &mut expanded, &mut out);
                }
                Ok(out)
            }
        }
    }

    fn tree_branch(
        &self,
        tree: &DomainTree,
        id: &ConceptId,
        prefix: &str,
        last: bool,
        expanded: &mut BTreeSet<ConceptId>,
        out: &mut String,
    ) {
        let Some(node) = tree.nodes.get(id) else {
            return;
        };
        let connector = if last { "└── " } else { "├── " };
        let mut label = format!("{} [{}] L{}", node.name, node.id, node.complexity_level);
        if node.is_axiom {
            label.push_str(" axiom");
        }

        out.push('\n');
        out.push_str(prefix);
        out.push_str(connector);

        if !expanded.insert(id.clone()) {
            out.push_str(&self.colorize(&format!("{} (see above)", label), "magenta"));
            return;
        }
        out.push_str(&label);

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        for (i, child) in node.children.iter().enumerate() {
            let last_child = i + 1 == node.children.len();
            self.tree_branch(tree, child, &child_prefix, last_child, expanded, out);
        }
    }

    /// Format created concept ids.
    pub fn concepts_added(&self, ids: &[ConceptId]) -> String {
        match self.format {
            OutputFormat::Quiet => quiet(ids.iter()),
            _ => ids
                .iter()
                .map(|id| self.success(&format!("Concept added: {}", id)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Format an accepted prerequisite edge.
    pub fn prerequisite_added(&self, edge: &PrerequisiteEdge) -> String {
        match self.format {
            OutputFormat::Quiet => String::new(),
            _ => self.success(&format!("Prerequisite added: {}", edge)),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn concept_table(&self, concepts: &[Concept]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Domain", "Subfield", "Level", "Axiom", "Verified"]);
        for c in concepts {
            builder.push_record([
                c.id.as_str(),
                &c.name,
                c.domain.as_str(),
                &c.subfield,
                &c.complexity_level.to_string(),
                yes_no(c.is_axiom),
                yes_no(c.is_verified),
            ]);
        }
        style(builder).to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn style(builder: Builder) -> tabled::Table {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn quiet<'a>(ids: impl Iterator<Item = &'a ConceptId>) -> String {
    ids.map(ConceptId::as_str).collect::<Vec<_>>().join("\n")
}

fn join_ids(concepts: &[Concept]) -> String {
    if concepts.is_empty() {
        return "-".to_string();
    }
    concepts
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktree_domain::Domain;
    use ktree_resolver::TreeNode;
    use std::collections::BTreeMap;

    fn concepts() -> Vec<Concept> {
        vec![
            Concept::axiom("ext", "Extensionality", Domain::Math, "set-theory").verified(),
            Concept::new("empty", "Empty Set", Domain::Math, "set-theory", 1),
        ]
    }

    fn mvg() -> MvgResult {
        let mut all = concepts();
        let target = all.remove(1);
        MvgResult {
            path: vec![ConceptId::from("ext"), ConceptId::from("empty")],
            target,
            prerequisites: all,
        }
    }

    fn node(id: &str, level: u32, children: &[&str]) -> (ConceptId, TreeNode) {
        (
            ConceptId::from(id),
            TreeNode {
                id: id.into(),
                name: id.to_uppercase(),
                subfield: "s".into(),
                complexity_level: level,
                is_axiom: level == 0,
                children: children.iter().map(|c| ConceptId::from(*c)).collect(),
            },
        )
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_concepts(&concepts()).unwrap();
        let parsed: Vec<Concept> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, concepts());
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.format_concepts(&concepts()).unwrap(), "ext\nempty");
        assert_eq!(formatter.format_mvg(&mvg()).unwrap(), "ext\nempty");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_concepts(&concepts()).unwrap();
        assert!(output.contains("Subfield"));
        assert!(output.contains("Extensionality"));
    }

    #[test]
    fn test_empty_concepts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_concepts(&[]).unwrap();
        assert!(output.contains("No concepts found"));
    }

    #[test]
    fn test_mvg_table_numbers_steps() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_mvg(&mvg()).unwrap();
        assert!(output.contains("Step"));
        assert!(output.contains("1 concept(s) to learn before Empty Set"));
    }

    #[test]
    fn test_detail_json_flattens_concept() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let all = concepts();
        let detail = ConceptDetail {
            concept: &all[1],
            prerequisites: &all[..1],
            dependents: &[],
        };
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_concept_detail(&detail).unwrap()).unwrap();
        assert_eq!(value["id"], "empty");
        assert_eq!(value["prerequisites"][0]["id"], "ext");
        assert!(value["dependents"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_tree_expands_shared_node_once() {
        // a diamond: base -> left, right -> top
        let nodes: BTreeMap<_, _> = [
            node("base", 0, &["left", "right"]),
            node("left", 1, &["top"]),
            node("right", 1, &["top"]),
            node("top", 2, &[]),
        ]
        .into_iter()
        .collect();
        let tree = DomainTree {
            domain: Domain::Math,
            roots: vec!["base".into()],
            total_nodes: nodes.len(),
            nodes,
        };

        let output = Formatter::new(OutputFormat::Table, false)
            .format_tree(&tree)
            .unwrap();
        assert!(output.starts_with("MATH (4 concepts)"));
        assert_eq!(output.matches("TOP [top] L2").count(), 2);
        assert_eq!(output.matches("(see above)").count(), 1);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }
}
