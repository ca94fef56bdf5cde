//! Text reports for reference queries.

use crate::model::{ConstructRef, UsageEdge};
use crate::outline::ChunkSet;
use crate::project::ProjectWalker;
use crate::resolver::DefinitionResolver;
use crate::store::DefinitionStore;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Summaries of the constructs that use a definition, grouped by file.
pub fn render_references(
    store: &dyn DefinitionStore,
    walker: &ProjectWalker,
    edges: &[UsageEdge],
) -> String {
    let sites = edges
        .iter()
        .filter(|e| !e.is_dependency)
        .map(UsageEdge::using);
    let mut out = String::from("# The following code uses the definition\n\n");
    write_summaries(store, walker, sites, &mut out);
    out
}

/// What a construct uses: project definitions by file, then dependency
/// symbols by package.
pub fn render_uses(store: &dyn DefinitionStore, walker: &ProjectWalker, edges: &[UsageEdge]) -> String {
    let targets = edges.iter().filter_map(UsageEdge::target);
    let mut out = String::from("# Definitions used from the codebase\n\n");
    write_summaries(store, walker, targets, &mut out);

    let mut by_package: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for edge in edges.iter().filter(|e| e.is_dependency) {
        let package = edge.dependency_path.as_deref().unwrap_or_default();
        by_package
            .entry(package)
            .or_default()
            .push(describe_dependency(&edge.target_keywords));
    }
    out.push_str("# Definitions used from dependencies\n\n");
    for (package, symbols) in by_package {
        let _ = writeln!(out, "- Use pkg {}", package);
        let _ = writeln!(out, "{}\n", symbols.join(", "));
    }
    out
}

/// `type T`, `var v T`, `function f`, `method T.m`.
pub fn describe_dependency(keywords: &[String]) -> String {
    let kw = |i: usize| keywords.get(i).map(String::as_str).unwrap_or_default();
    match kw(0) {
        "method" if keywords.len() > 2 => format!("method {}.{}", kw(2), kw(1)),
        "var" if keywords.len() > 2 => format!("var {} {}", kw(1), kw(2)),
        kind => format!("{} {}", kind, kw(1)),
    }
}

fn write_summaries(
    store: &dyn DefinitionStore,
    walker: &ProjectWalker,
    constructs: impl Iterator<Item = ConstructRef>,
    out: &mut String,
) {
    let resolver = DefinitionResolver::new(store);
    let mut by_file: BTreeMap<String, ChunkSet> = BTreeMap::new();
    for construct in constructs {
        match resolver.resolve(&construct).into_result(&construct) {
            Ok(def) => by_file.entry(def.rel_file).or_default().add(&def.summary),
            Err(e) => tracing::warn!("Skipping construct in report: {}", e),
        }
    }
    for (file, chunks) in by_file {
        let _ = writeln!(out, "- {}\n", file);
        match std::fs::read_to_string(walker.abs_path(&file)) {
            Ok(source) => chunks.render(&source, out),
            Err(e) => tracing::error!("Failed to read {}: {}", file, e),
        }
        out.push('\n');
    }
}
