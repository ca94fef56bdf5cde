//! Top-level construct extraction.

use super::utils::{
    children_by_field, field_text, header_range, is_grouped, named_children, node_text,
    range_from_ts, receiver_type_text, spec_nodes,
};
use defscope_core::identity::{DefKind, tag};
use defscope_core::model::{ContentRange, Definition};
use tree_sitter::{Node, Tree};

/// Walks the root's children only; bodies are never searched.
pub fn extract_definitions(tree: &Tree, rel_file: &str, source: &str) -> Vec<Definition> {
    let mut out = Vec::new();
    for node in named_children(tree.root_node()) {
        if node.is_error() {
            // keep what the parser could recover inside a broken region
            for inner in named_children(node) {
                visit_top_level(inner, rel_file, source, &mut out);
            }
        } else {
            visit_top_level(node, rel_file, source, &mut out);
        }
    }
    out
}

fn visit_top_level(node: Node, rel_file: &str, source: &str, out: &mut Vec<Definition>) {
    let mut push = |name: &str, keywords: Vec<String>, summary: ContentRange, content: ContentRange| {
        out.push(Definition::new(rel_file, name, keywords, summary, content));
    };

    match node.kind() {
        "package_clause" => {
            let name = named_children(node)
                .into_iter()
                .find(|n| n.kind() == "package_identifier")
                .map(|n| node_text(n, source))
                .unwrap_or_default();
            let range = range_from_ts(node);
            push("", tag(DefKind::Package, name, None), range, range);
        }
        "import_declaration" => {
            let range = range_from_ts(node);
            push("", tag(DefKind::Import, "", None), range, range);
        }
        "function_declaration" => {
            let Some(name) = field_text(node, "name", source) else {
                return;
            };
            let (summary, content) = body_split(node);
            push(name, tag(DefKind::Function, name, None), summary, content);
        }
        "method_declaration" => {
            let Some(name) = field_text(node, "name", source) else {
                return;
            };
            let receiver = receiver_type_text(node, source);
            let (summary, content) = body_split(node);
            push(name, tag(DefKind::Method, name, receiver), summary, content);
        }
        "type_declaration" => {
            let grouped = is_grouped(node);
            for spec in spec_nodes(node, &["type_spec", "type_alias"]) {
                let Some(name) = field_text(spec, "name", source) else {
                    continue;
                };
                let range = range_from_ts(if grouped { spec } else { node });
                push(name, tag(DefKind::Type, name, None), range, range);
            }
        }
        "var_declaration" => {
            let grouped = is_grouped(node);
            for spec in spec_nodes(node, &["var_spec"]) {
                let declared = field_text(spec, "type", source);
                let range = range_from_ts(if grouped { spec } else { node });
                for name in children_by_field(spec, "name") {
                    let name = node_text(name, source);
                    push(name, tag(DefKind::Var, name, declared), range, range);
                }
            }
        }
        "short_var_declaration" => {
            let Some(left) = node.child_by_field_name("left") else {
                return;
            };
            let range = range_from_ts(node);
            for ident in named_children(left)
                .into_iter()
                .filter(|n| n.kind() == "identifier")
            {
                let name = node_text(ident, source);
                push(name, tag(DefKind::Var, name, None), range, range);
            }
        }
        _ => {}
    }
}

/// `(summary, content)`; the summary stops where the body block starts.
fn body_split(node: Node) -> (ContentRange, ContentRange) {
    let content = range_from_ts(node);
    match node.child_by_field_name("body") {
        Some(body) => (header_range(node, body), content),
        None => (content, content),
    }
}
