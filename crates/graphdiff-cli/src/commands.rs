use std::fs;
use std::path::Path as FsPath;

use anyhow::Context;
use colored::{ColoredString, Colorize};
use tracing::debug;

use graphdiff_core::{
    ChangeRecord, DiffConfig, DiffTree, NodeRef, ObjectDiffer, ReturnableVisitor, State,
    StateSummary, Visit,
};
use graphdiff_model::{Path, Value};

use crate::cli::{Cli, OutputFormat};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let differ = build_differ(&cli)?;
    let working = load_document(&cli.working)?;
    let base = load_document(&cli.base)?;

    let tree = differ
        .compare(working.as_ref(), base.as_ref())
        .context("comparison failed")?;

    match cli.format {
        OutputFormat::Text => {
            print!("{}", render_text(&tree, cli.all));
            if cli.summary {
                println!("{}", render_summary(&tree.summary()));
            }
        }
        OutputFormat::Json => println!("{}", render_json(&tree, cli.all)?),
    }
    Ok(())
}

fn build_differ(cli: &Cli) -> anyhow::Result<ObjectDiffer> {
    let config = match &cli.config {
        Some(path) => DiffConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DiffConfig::new(),
    };
    let mut builder = ObjectDiffer::builder().with_config(config);
    for raw in &cli.ignore {
        let path = Path::parse(raw).with_context(|| format!("invalid --ignore path {raw:?}"))?;
        builder = builder.ignore_path(path);
    }
    Ok(builder.build())
}

/// Read a JSON document. A document that is just `null` is absent.
pub fn load_document(path: &FsPath) -> anyhow::Result<Option<Value>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), bytes = text.len(), "document loaded");
    Ok(Value::from_json(&json))
}

fn paint(state: State) -> ColoredString {
    let label = format!("{:<9}", state.to_string());
    match state {
        State::Added => label.green(),
        State::Removed => label.red(),
        State::Changed => label.yellow(),
        State::Circular => label.magenta(),
        State::Untouched | State::Ignored => label.dimmed(),
    }
}

fn text_line(node: NodeRef<'_>) -> String {
    let indent = "  ".repeat(node.path().len());
    let mut line = format!("{indent}{} {}", paint(node.state()), node.path());
    if let Some(value_type) = node.value_type() {
        line.push_str(&format!(" ({value_type})"));
    }
    if let Some(start) = node.circle_start_path() {
        line.push_str(&format!(" -> {start}"));
    }
    line
}

/// One indented line per node, parents first. Without `all`, hidden nodes
/// and everything below them are skipped.
pub fn render_text(tree: &DiffTree, all: bool) -> String {
    let mut out = String::new();
    let mut line = |node: NodeRef<'_>, _: &mut Visit| {
        out.push_str(&text_line(node));
        out.push('\n');
    };
    if all {
        tree.visit(&mut line);
    } else {
        tree.visit(&mut ReturnableVisitor::new(&mut line));
    }
    out
}

pub fn render_json(tree: &DiffTree, all: bool) -> anyhow::Result<String> {
    let records: Vec<ChangeRecord> = if all {
        let mut records = Vec::new();
        tree.visit(&mut |node: NodeRef<'_>, _: &mut Visit| {
            records.push(ChangeRecord::from(node));
        });
        records
    } else {
        tree.changes()
    };
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn render_summary(summary: &StateSummary) -> String {
    let parts: Vec<String> = State::ALL
        .iter()
        .filter(|state| summary.count(**state) > 0)
        .map(|state| format!("{} {}", summary.count(*state), state.as_str()))
        .collect();
    if summary.has_changes() {
        format!("{} ({})", "differences found".bold(), parts.join(", "))
    } else {
        format!("{} ({})", "no differences".green(), parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tree_of(working: &str, base: &str) -> DiffTree {
        let working = Value::from_json(&serde_json::from_str(working).unwrap());
        let base = Value::from_json(&serde_json::from_str(base).unwrap());
        ObjectDiffer::new()
            .compare(working.as_ref(), base.as_ref())
            .unwrap()
    }

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn text_lists_visible_nodes_indented() {
        plain();
        let tree = tree_of(r#"{"name": "ann", "age": 31}"#, r#"{"name": "ann", "age": 30}"#);
        let text = render_text(&tree, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("CHANGED"));
        assert!(lines[0].ends_with("/ (map)"));
        assert!(lines[1].starts_with("  CHANGED"));
        assert!(lines[1].contains(r#"/["age"] (int)"#));
    }

    #[test]
    fn all_includes_untouched_nodes() {
        plain();
        let tree = tree_of(r#"{"name": "ann", "age": 31}"#, r#"{"name": "ann", "age": 30}"#);
        let text = render_text(&tree, true);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("UNTOUCHED"));
    }

    #[test]
    fn json_output_is_a_record_list() {
        let tree = tree_of(r#"{"tags": ["a"]}"#, r#"{"tags": ["a", "b"]}"#);
        let json: serde_json::Value = serde_json::from_str(&render_json(&tree, false).unwrap()).unwrap();
        let records = json.as_array().unwrap();
        let removed = records
            .iter()
            .find(|r| r["state"] == "removed")
            .unwrap();
        assert_eq!(removed["path"], r#"/["tags"]["b"]"#);
        assert_eq!(removed["value_type"], "text");
    }

    #[test]
    fn summary_mentions_counts() {
        plain();
        let tree = tree_of(r#"{"a": 1}"#, r#"{"a": 1}"#);
        assert_eq!(render_summary(&tree.summary()), "no differences (1 untouched)");
        let tree = tree_of(r#"{"a": 1, "b": 2}"#, r#"{"a": 1}"#);
        let summary = render_summary(&tree.summary());
        assert!(summary.starts_with("differences found"));
        assert!(summary.contains("1 added"));
    }

    #[test]
    fn documents_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"x": [1, 2]}}"#).unwrap();
        let value = load_document(file.path()).unwrap().unwrap();
        assert_eq!(value, Value::map([("x", Value::seq([1, 2]))]));

        let mut null = tempfile::NamedTempFile::new().unwrap();
        write!(null, "null").unwrap();
        assert!(load_document(null.path()).unwrap().is_none());
    }

    #[test]
    fn config_file_and_ignore_flags_apply() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "[[paths]]\npath = \"/[age]\"\nignore = true").unwrap();
        let cli = Cli {
            working: "w.json".into(),
            base: "b.json".into(),
            config: Some(config.path().to_path_buf()),
            ignore: vec!["/[name]".into()],
            all: false,
            summary: false,
            format: OutputFormat::Text,
            verbose: false,
        };
        let differ = build_differ(&cli).unwrap();
        let working = Value::from_json(&serde_json::json!({"name": "x", "age": 1}));
        let base = Value::from_json(&serde_json::json!({"name": "y", "age": 2}));
        let tree = differ.compare(working.as_ref(), base.as_ref()).unwrap();
        assert!(tree.root().is_untouched());

        let bad = Cli { ignore: vec!["no-slash".into()], config: None, ..cli };
        assert!(build_differ(&bad).is_err());
    }

    #[test]
    fn numeric_looking_keys_can_be_ignored() {
        let cli = Cli {
            working: "w.json".into(),
            base: "b.json".into(),
            config: None,
            ignore: vec![r#"/["1"]"#.into()],
            all: false,
            summary: false,
            format: OutputFormat::Text,
            verbose: false,
        };
        let differ = build_differ(&cli).unwrap();
        let working = Value::from_json(&serde_json::json!({"1": 1, "a": 1}));
        let base = Value::from_json(&serde_json::json!({"1": 2, "a": 1}));
        let tree = differ.compare(working.as_ref(), base.as_ref()).unwrap();

        let key = Path::builder().item("1").build();
        assert_eq!(tree.get(&key).unwrap().state(), State::Ignored);
        assert!(tree.root().is_untouched());

        // A bare `[1]` names the integer 1, which no JSON object key equals.
        let int_only = build_differ(&Cli { ignore: vec!["/[1]".into()], ..cli }).unwrap();
        let tree = int_only.compare(working.as_ref(), base.as_ref()).unwrap();
        assert!(tree.get(&key).unwrap().is_changed());
    }
}
