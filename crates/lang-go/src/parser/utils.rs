use defscope_core::model::ContentRange;
use tree_sitter::Node;

/// Whole-node range. Lines are 1-based with an exclusive end.
pub fn range_from_ts(node: Node) -> ContentRange {
    ContentRange::new(
        node.start_position().row + 1,
        node.end_position().row + 2,
        node.start_byte(),
        node.end_byte(),
    )
}

/// From the start of `node` up to (not including) `body`.
///
/// The line holding the opening brace is kept so a signature always renders
/// at least one line.
pub fn header_range(node: Node, body: Node) -> ContentRange {
    ContentRange::new(
        node.start_position().row + 1,
        body.start_position().row + 2,
        node.start_byte(),
        body.start_byte(),
    )
}

pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

pub fn field_text<'s>(node: Node, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub fn children_by_field<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// `type_spec`/`var_spec`/... nodes of a declaration, whether written alone
/// or as a parenthesized group. Grammar versions differ on whether groups get
/// their own `*_list` wrapper node, so both shapes are accepted.
pub fn spec_nodes<'t>(decl: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for child in named_children(decl) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_list") {
            out.extend(
                named_children(child)
                    .into_iter()
                    .filter(|n| kinds.contains(&n.kind())),
            );
        }
    }
    out
}

/// True for `type ( ... )` style declarations.
pub fn is_grouped(decl: Node) -> bool {
    let mut cursor = decl.walk();
    let grouped = decl.children(&mut cursor).any(|c| c.kind() == "(")
        || named_children(decl).iter().any(|c| c.kind().ends_with("_list"));
    grouped
}

/// Written type of a method receiver, e.g. `*Reader` or `Box[T]`.
pub fn receiver_type_text<'s>(method: Node, source: &'s str) -> Option<&'s str> {
    let receiver = method.child_by_field_name("receiver")?;
    named_children(receiver)
        .into_iter()
        .find(|n| n.kind() == "parameter_declaration")
        .and_then(|p| field_text(p, "type", source))
}

/// Type parameter names a generic receiver introduces, `T` and `U` in
/// `func (m *Map[T, U]) Get()`.
pub fn receiver_type_params(method: Node) -> Vec<Node> {
    let Some(param) = method.child_by_field_name("receiver").and_then(|r| {
        named_children(r)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")
    }) else {
        return Vec::new();
    };
    let mut node = param.child_by_field_name("type");
    while let Some(n) = node.filter(|n| matches!(n.kind(), "pointer_type" | "parenthesized_type")) {
        node = named_children(n).into_iter().next();
    }
    let Some(args) = node
        .filter(|n| n.kind() == "generic_type")
        .and_then(|g| g.child_by_field_name("type_arguments"))
    else {
        return Vec::new();
    };
    named_children(args)
        .into_iter()
        .filter_map(|arg| match arg.kind() {
            "type_identifier" => Some(arg),
            "type_elem" => match named_children(arg).as_slice() {
                [only] if only.kind() == "type_identifier" => Some(*only),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Strips pointer, parenthesis and type-argument wrappers down to the named
/// type node (`type_identifier` or `qualified_type`).
pub fn base_type_node(mut node: Node) -> Option<Node> {
    loop {
        match node.kind() {
            "type_identifier" | "qualified_type" => return Some(node),
            "pointer_type" | "parenthesized_type" => {
                node = named_children(node).into_iter().next()?;
            }
            "generic_type" => node = node.child_by_field_name("type")?,
            _ => return None,
        }
    }
}

pub fn is_test_file(rel_path: &str) -> bool {
    rel_path.ends_with("_test.go")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GoParser;

    #[test]
    fn test_grouped_and_single_specs() {
        let src = "package p\n\ntype A int\n\ntype (\n\tB int\n\tC = B\n)\n";
        let tree = GoParser::new().unwrap().parse(src).unwrap();
        let decls: Vec<_> = named_children(tree.root_node())
            .into_iter()
            .filter(|n| n.kind() == "type_declaration")
            .collect();
        assert_eq!(decls.len(), 2);
        assert!(!is_grouped(decls[0]));
        assert!(is_grouped(decls[1]));
        let specs = spec_nodes(decls[1], &["type_spec", "type_alias"]);
        assert_eq!(specs.len(), 2);
        assert_eq!(field_text(specs[1], "name", src), Some("C"));
    }

    #[test]
    fn test_receiver_and_base_type() {
        let src = "package p\n\nfunc (b *Box[T]) Get() T { return b.v }\n";
        let tree = GoParser::new().unwrap().parse(src).unwrap();
        let method = named_children(tree.root_node())
            .into_iter()
            .find(|n| n.kind() == "method_declaration")
            .unwrap();
        assert_eq!(receiver_type_text(method, src), Some("*Box[T]"));

        let receiver = method.child_by_field_name("receiver").unwrap();
        let param = named_children(receiver)[0];
        let base = base_type_node(param.child_by_field_name("type").unwrap()).unwrap();
        assert_eq!(node_text(base, src), "Box");

        let params: Vec<&str> = receiver_type_params(method)
            .into_iter()
            .map(|n| node_text(n, src))
            .collect();
        assert_eq!(params, ["T"]);
    }

    #[test]
    fn test_plain_receiver_has_no_type_params() {
        let src = "package p\n\nfunc (r *Reader) Close() {}\n";
        let tree = GoParser::new().unwrap().parse(src).unwrap();
        let method = named_children(tree.root_node())
            .into_iter()
            .find(|n| n.kind() == "method_declaration")
            .unwrap();
        assert!(receiver_type_params(method).is_empty());
    }
}
