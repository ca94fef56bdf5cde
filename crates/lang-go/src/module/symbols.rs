//! Package-level symbol tables.

use super::imports::FileImports;
use crate::parser::utils::{
    base_type_node, children_by_field, field_text, named_children, node_text, receiver_type_params,
    spec_nodes,
};
use defscope_core::model::{ObjectKind, SemanticObject, SourcePosition};
use std::collections::HashMap;
use tree_sitter::Node;

/// A named type, identified by its declaring package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub package: String,
    pub name: String,
}

impl TypeRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Func,
    Type,
    /// `type_text` is the declared type as written, if any.
    Var { type_text: Option<String> },
    Const,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub position: SourcePosition,
    /// Static type of a var, or the single result type of a func.
    pub ty: Option<TypeRef>,
}

impl Member {
    pub fn object(&self, name: &str, package_path: &str) -> SemanticObject {
        let kind = match &self.kind {
            MemberKind::Func => ObjectKind::Func,
            MemberKind::Type => ObjectKind::TypeName,
            MemberKind::Var { type_text } => ObjectKind::Var {
                type_text: type_text.clone(),
            },
            MemberKind::Const => ObjectKind::Const,
        };
        SemanticObject::new(name, kind, package_path)
    }
}

#[derive(Debug, Clone)]
pub struct MethodEntry {
    /// Receiver type as written, e.g. `*Reader`.
    pub receiver: String,
    pub result: Option<TypeRef>,
    pub position: SourcePosition,
}

#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub ty: Option<TypeRef>,
    pub position: SourcePosition,
}

/// Declarations of one package, merged across its files.
#[derive(Debug, Clone, Default)]
pub struct PackageTable {
    pub import_path: String,
    pub name: String,
    members: HashMap<String, Member>,
    methods: HashMap<(String, String), MethodEntry>,
    fields: HashMap<(String, String), FieldEntry>,
    embedded: HashMap<String, Vec<TypeRef>>,
}

impl PackageTable {
    pub fn new(import_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn method(&self, type_name: &str, name: &str) -> Option<&MethodEntry> {
        self.methods.get(&(type_name.to_string(), name.to_string()))
    }

    pub fn field(&self, type_name: &str, name: &str) -> Option<&FieldEntry> {
        self.fields.get(&(type_name.to_string(), name.to_string()))
    }

    /// Embedded types (and alias targets) whose members are promoted.
    pub fn embedded(&self, type_name: &str) -> &[TypeRef] {
        self.embedded.get(type_name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Records the package-level declarations of one file. Earlier files win
    /// on duplicate names.
    pub fn add_file(&mut self, rel_file: &str, root: Node, source: &str, imports: &FileImports) {
        let package = self.import_path.clone();
        let ctx = DeclContext {
            rel_file,
            source,
            package: &package,
            imports,
        };
        for node in named_children(root) {
            if node.is_error() {
                for inner in named_children(node) {
                    self.add_decl(&ctx, inner);
                }
            } else {
                self.add_decl(&ctx, node);
            }
        }
    }

    fn add_decl(&mut self, ctx: &DeclContext, node: Node) {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return;
                };
                let member = Member {
                    kind: MemberKind::Func,
                    position: position(ctx.rel_file, name),
                    ty: single_result(node).and_then(|t| ctx.type_ref(t)),
                };
                self.add_member(node_text(name, ctx.source), member);
            }
            "method_declaration" => self.add_method(ctx, node),
            "type_declaration" => {
                for spec in spec_nodes(node, &["type_spec", "type_alias"]) {
                    self.add_type(ctx, spec);
                }
            }
            "var_declaration" => {
                for spec in spec_nodes(node, &["var_spec"]) {
                    let declared = spec.child_by_field_name("type");
                    let type_text = declared.map(|t| node_text(t, ctx.source).to_string());
                    let values = spec
                        .child_by_field_name("value")
                        .map(named_children)
                        .unwrap_or_default();
                    for (i, name) in children_by_field(spec, "name").into_iter().enumerate() {
                        let ty = match declared {
                            Some(t) => ctx.type_ref(t),
                            None => values.get(i).and_then(|v| ctx.literal_type(*v)),
                        };
                        let member = Member {
                            kind: MemberKind::Var {
                                type_text: type_text.clone(),
                            },
                            position: position(ctx.rel_file, name),
                            ty,
                        };
                        self.add_member(node_text(name, ctx.source), member);
                    }
                }
            }
            "const_declaration" => {
                for spec in spec_nodes(node, &["const_spec"]) {
                    for name in children_by_field(spec, "name") {
                        let member = Member {
                            kind: MemberKind::Const,
                            position: position(ctx.rel_file, name),
                            ty: None,
                        };
                        self.add_member(node_text(name, ctx.source), member);
                    }
                }
            }
            _ => {}
        }
    }

    fn add_member(&mut self, name: &str, member: Member) {
        if name == "_" || name.is_empty() {
            return;
        }
        self.members.entry(name.to_string()).or_insert(member);
    }

    fn add_method(&mut self, ctx: &DeclContext, node: Node) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let Some(receiver_type) = node
            .child_by_field_name("receiver")
            .and_then(|r| {
                named_children(r)
                    .into_iter()
                    .find(|p| p.kind() == "parameter_declaration")
            })
            .and_then(|p| p.child_by_field_name("type"))
        else {
            return;
        };
        let Some(base) = base_type_node(receiver_type).filter(|b| b.kind() == "type_identifier")
        else {
            return;
        };
        let type_params: Vec<&str> = receiver_type_params(node)
            .into_iter()
            .map(|n| node_text(n, ctx.source))
            .collect();
        let result = single_result(node)
            .and_then(|t| ctx.type_ref(t))
            .filter(|ty| ty.package != ctx.package || !type_params.contains(&ty.name.as_str()));
        let entry = MethodEntry {
            receiver: node_text(receiver_type, ctx.source).to_string(),
            result,
            position: position(ctx.rel_file, name),
        };
        self.methods
            .entry((
                node_text(base, ctx.source).to_string(),
                node_text(name, ctx.source).to_string(),
            ))
            .or_insert(entry);
    }

    fn add_type(&mut self, ctx: &DeclContext, spec: Node) {
        let Some(name) = spec.child_by_field_name("name") else {
            return;
        };
        let type_name = node_text(name, ctx.source).to_string();
        let member = Member {
            kind: MemberKind::Type,
            position: position(ctx.rel_file, name),
            ty: None,
        };
        self.add_member(&type_name, member);

        let Some(underlying) = spec.child_by_field_name("type") else {
            return;
        };
        if spec.kind() == "type_alias" {
            if let Some(target) = ctx.type_ref(underlying) {
                self.embedded.entry(type_name).or_default().push(target);
            }
            return;
        }
        if underlying.kind() != "struct_type" {
            return;
        }
        let type_params: Vec<&str> = spec
            .child_by_field_name("type_parameters")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|decl| children_by_field(decl, "name"))
            .map(|n| node_text(n, ctx.source))
            .collect();
        let declarations = named_children(underlying)
            .into_iter()
            .filter(|n| n.kind() == "field_declaration_list")
            .flat_map(named_children)
            .filter(|n| n.kind() == "field_declaration");
        for decl in declarations {
            let field_type = decl.child_by_field_name("type");
            let ty = field_type
                .and_then(|t| ctx.type_ref(t))
                .filter(|ty| ty.package != ctx.package || !type_params.contains(&ty.name.as_str()));
            let names = children_by_field(decl, "name");
            if names.is_empty() {
                // embedded field: named after its type, members promoted
                let Some(ty) = ty else {
                    continue;
                };
                let key = (type_name.clone(), ty.name.clone());
                self.fields.entry(key).or_insert(FieldEntry {
                    ty: Some(ty.clone()),
                    position: position(ctx.rel_file, decl),
                });
                self.embedded.entry(type_name.clone()).or_default().push(ty);
                continue;
            }
            for field in names {
                let key = (type_name.clone(), node_text(field, ctx.source).to_string());
                self.fields.entry(key).or_insert(FieldEntry {
                    ty: ty.clone(),
                    position: position(ctx.rel_file, field),
                });
            }
        }
    }
}

struct DeclContext<'a> {
    rel_file: &'a str,
    source: &'a str,
    package: &'a str,
    imports: &'a FileImports,
}

impl DeclContext<'_> {
    fn type_ref(&self, node: Node) -> Option<TypeRef> {
        type_ref(node, self.source, self.package, self.imports)
    }

    /// Type of `T{...}` or `&T{...}`.
    fn literal_type(&self, node: Node) -> Option<TypeRef> {
        match node.kind() {
            "composite_literal" => self.type_ref(node.child_by_field_name("type")?),
            "unary_expression" => self.literal_type(node.child_by_field_name("operand")?),
            "parenthesized_expression" => self.literal_type(named_children(node).into_iter().next()?),
            _ => None,
        }
    }
}

/// Named type denoted by a type expression, looking through pointers and
/// type arguments. Predeclared types have no declaring package.
pub fn type_ref(node: Node, source: &str, package: &str, imports: &FileImports) -> Option<TypeRef> {
    let base = base_type_node(node)?;
    match base.kind() {
        "type_identifier" => {
            let name = node_text(base, source);
            (!is_predeclared_type(name)).then(|| TypeRef::new(package, name))
        }
        "qualified_type" => {
            let qualifier = field_text(base, "package", source)?;
            let name = field_text(base, "name", source)?;
            Some(TypeRef::new(imports.package(qualifier)?, name))
        }
        _ => None,
    }
}

/// The result type of a function with exactly one unnamed or named result.
fn single_result(node: Node) -> Option<Node> {
    let result = node.child_by_field_name("result")?;
    if result.kind() != "parameter_list" {
        return Some(result);
    }
    let params: Vec<Node> = named_children(result)
        .into_iter()
        .filter(|p| p.kind() == "parameter_declaration")
        .collect();
    match params.as_slice() {
        [only] if children_by_field(*only, "name").len() <= 1 => only.child_by_field_name("type"),
        _ => None,
    }
}

pub fn position(rel_file: &str, node: Node) -> SourcePosition {
    let start = node.start_position();
    SourcePosition {
        file: rel_file.to_string(),
        line: start.row + 1,
        column: start.column + 1,
    }
}

pub fn is_predeclared_type(name: &str) -> bool {
    matches!(
        name,
        "any"
            | "bool"
            | "byte"
            | "comparable"
            | "complex64"
            | "complex128"
            | "error"
            | "float32"
            | "float64"
            | "int"
            | "int8"
            | "int16"
            | "int32"
            | "int64"
            | "rune"
            | "string"
            | "uint"
            | "uint8"
            | "uint16"
            | "uint32"
            | "uint64"
            | "uintptr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::imports::{collect_imports, default_package_name};
    use crate::parser::GoParser;

    const SRC: &str = r#"package store

import "sync"

type Base struct{}

func (b *Base) Ping() {}

type Reader struct {
	Base
	mu   sync.Mutex
	next *Reader
}

type Alias = Reader

var Default = &Reader{}

var count, limit int

const Max = 3

func (r *Reader) Close() error { return nil }

func Open(name string) (*Reader, error) { return nil, nil }

func New() *Reader { return &Reader{} }

type Box[T any] struct {
	v T
}

func (b *Box[T]) Get() T { return b.v }
"#;

    fn table() -> PackageTable {
        let tree = GoParser::new().unwrap().parse(SRC).unwrap();
        let root = tree.root_node();
        let imports = FileImports::new(&collect_imports(root, SRC), default_package_name);
        let mut table = PackageTable::new("example.com/app/store", "store");
        table.add_file("store/reader.go", root, SRC, &imports);
        table
    }

    #[test]
    fn test_members_and_positions() {
        let t = table();
        let reader = t.member("Reader").unwrap();
        assert_eq!(reader.kind, MemberKind::Type);
        assert_eq!(reader.position.file, "store/reader.go");
        assert_eq!((reader.position.line, reader.position.column), (9, 6));

        let default = t.member("Default").unwrap();
        assert_eq!(default.kind, MemberKind::Var { type_text: None });
        assert_eq!(default.ty, Some(TypeRef::new("example.com/app/store", "Reader")));

        assert_eq!(
            t.member("limit").unwrap().kind,
            MemberKind::Var {
                type_text: Some("int".into())
            }
        );
        assert_eq!(t.member("limit").unwrap().ty, None);
        assert_eq!(t.member("Max").unwrap().kind, MemberKind::Const);
        assert_eq!(
            t.member("New").unwrap().ty,
            Some(TypeRef::new("example.com/app/store", "Reader"))
        );
        // two results, no single type
        assert_eq!(t.member("Open").unwrap().ty, None);
    }

    #[test]
    fn test_methods_fields_and_embedding() {
        let t = table();
        assert_eq!(t.method("Reader", "Close").unwrap().receiver, "*Reader");
        assert_eq!(t.method("Base", "Ping").unwrap().receiver, "*Base");
        assert!(t.method("Reader", "Ping").is_none());

        assert_eq!(
            t.field("Reader", "mu").unwrap().ty,
            Some(TypeRef::new("sync", "Mutex"))
        );
        assert!(t.field("Reader", "Base").is_some());
        assert_eq!(
            t.embedded("Reader"),
            [TypeRef::new("example.com/app/store", "Base")]
        );
        assert_eq!(
            t.embedded("Alias"),
            [TypeRef::new("example.com/app/store", "Reader")]
        );
    }

    #[test]
    fn test_receiver_type_parameters_are_not_result_types() {
        let t = table();
        let get = t.method("Box", "Get").unwrap();
        assert_eq!(get.receiver, "*Box[T]");
        assert_eq!(get.result, None);
        assert_eq!(t.field("Box", "v").unwrap().ty, None);
    }
}
