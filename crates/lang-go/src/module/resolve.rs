//! Reference resolution inside one file's top-level constructs.

use super::ModuleTable;
use super::imports::FileImports;
use super::scope::{LocalBinding, ScopeStack};
use super::symbols::{self, Member, MemberKind, PackageTable, TypeRef};
use crate::parser::utils::{
    base_type_node, children_by_field, field_text, named_children, node_text, receiver_type_params,
    receiver_type_text, spec_nodes,
};
use defscope_core::classify::is_internal_package;
use defscope_core::identity::{DefKind, tag};
use defscope_core::model::{ConstructRef, ObjectKind, ResolvedUse, SemanticObject, SourcePosition};
use std::collections::HashSet;
use tree_sitter::Node;

/// Syntactic knowledge about what an expression evaluates to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Typed {
    Value(TypeRef),
    /// Function or method, with its single result type if known.
    Callable(Option<TypeRef>),
    TypeName(TypeRef),
    Package(String),
}

/// Where a qualified `pkg.Name` appears; decides the guessed kind of
/// objects outside the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UsePosition {
    Type,
    Call,
    Value,
}

pub struct FileResolver<'a> {
    table: &'a ModuleTable,
    package: &'a PackageTable,
    imports: &'a FileImports,
    rel_file: &'a str,
    source: &'a str,
    scopes: ScopeStack,
    site: Option<ConstructRef>,
    seen: HashSet<SemanticObject>,
    out: Vec<ResolvedUse>,
}

impl<'a> FileResolver<'a> {
    pub fn new(
        table: &'a ModuleTable,
        package: &'a PackageTable,
        imports: &'a FileImports,
        rel_file: &'a str,
        source: &'a str,
    ) -> Self {
        Self {
            table,
            package,
            imports,
            rel_file,
            source,
            scopes: ScopeStack::default(),
            site: None,
            seen: HashSet::new(),
            out: Vec::new(),
        }
    }

    /// Uses of other files' objects, de-duplicated per top-level construct.
    pub fn resolve(mut self, root: Node) -> Vec<ResolvedUse> {
        for node in named_children(root) {
            if node.is_error() {
                for inner in named_children(node) {
                    self.resolve_top_level(inner);
                }
            } else {
                self.resolve_top_level(node);
            }
        }
        self.out
    }

    fn resolve_top_level(&mut self, node: Node) {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = field_text(node, "name", self.source) else {
                    return;
                };
                self.begin_site(name, tag(DefKind::Function, name, None));
                self.visit_function(node);
            }
            "method_declaration" => {
                let Some(name) = field_text(node, "name", self.source) else {
                    return;
                };
                let receiver = receiver_type_text(node, self.source);
                self.begin_site(name, tag(DefKind::Method, name, receiver));
                self.visit_function(node);
            }
            "type_declaration" => {
                for spec in spec_nodes(node, &["type_spec", "type_alias"]) {
                    let Some(name) = field_text(spec, "name", self.source) else {
                        continue;
                    };
                    self.begin_site(name, tag(DefKind::Type, name, None));
                    self.visit_type_spec(spec);
                }
            }
            "var_declaration" => {
                for spec in spec_nodes(node, &["var_spec"]) {
                    // a multi-name spec is attributed to its first name
                    let Some(first) = children_by_field(spec, "name").into_iter().next() else {
                        continue;
                    };
                    let name = node_text(first, self.source);
                    let declared = field_text(spec, "type", self.source);
                    self.begin_site(name, tag(DefKind::Var, name, declared));
                    for field in ["type", "value"] {
                        if let Some(child) = spec.child_by_field_name(field) {
                            self.visit(child);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn begin_site(&mut self, name: &str, keywords: Vec<String>) {
        self.site = Some(ConstructRef::new(self.rel_file, name, keywords));
        self.seen.clear();
        self.scopes.clear();
        self.scopes.push();
    }

    fn emit(&mut self, object: SemanticObject, position: Option<SourcePosition>) {
        if position.as_ref().is_some_and(|p| p.file == self.rel_file) {
            return;
        }
        let Some(site) = &self.site else {
            return;
        };
        if self.seen.insert(object.clone()) {
            self.out.push(ResolvedUse {
                site: site.clone(),
                target: object,
                position,
            });
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node_text(node, self.source)
    }

    fn visit_children(&mut self, node: Node) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn scoped_children(&mut self, node: Node) {
        self.scopes.push();
        self.visit_children(node);
        self.scopes.pop();
    }

    fn visit(&mut self, node: Node) -> Option<Typed> {
        match node.kind() {
            "identifier" => self.lookup_value(node),
            "type_identifier" => self.lookup_type(node),
            "qualified_type" => {
                let qualifier = field_text(node, "package", self.source)?;
                let name = field_text(node, "name", self.source)?;
                let imports: &'a FileImports = self.imports;
                let path = imports.package(qualifier)?;
                self.qualified(path, name, UsePosition::Type)
            }
            "selector_expression" => self.visit_selector(node),
            "call_expression" => {
                let callee = node
                    .child_by_field_name("function")
                    .and_then(|f| self.visit(f));
                for field in ["type_arguments", "arguments"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.visit(child);
                    }
                }
                match callee? {
                    Typed::Callable(result) => result.map(Typed::Value),
                    // conversion
                    Typed::TypeName(ty) => Some(Typed::Value(ty)),
                    _ => None,
                }
            }
            "composite_literal" => {
                let ty = node.child_by_field_name("type");
                if let Some(ty) = ty {
                    self.visit(ty);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_literal_value(body, ty);
                }
                ty.and_then(|t| self.type_ref(t)).map(Typed::Value)
            }
            "unary_expression" => match self.visit(node.child_by_field_name("operand")?) {
                Some(Typed::Value(ty)) => Some(Typed::Value(ty)),
                // `(*T).M`
                Some(Typed::TypeName(ty))
                    if field_text(node, "operator", self.source) == Some("*") =>
                {
                    Some(Typed::TypeName(ty))
                }
                _ => None,
            },
            "parenthesized_expression" => {
                let mut last = None;
                for child in named_children(node) {
                    last = self.visit(child);
                }
                last
            }
            "type_assertion_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.visit(operand);
                }
                let ty = node.child_by_field_name("type")?;
                self.visit(ty);
                self.type_ref(ty).map(Typed::Value)
            }
            "func_literal" => {
                self.visit_function(node);
                None
            }
            "block" | "for_statement" | "if_statement" | "expression_switch_statement"
            | "select_statement" | "expression_case" | "default_case" | "communication_case"
            | "type_case" => {
                self.scoped_children(node);
                None
            }
            "type_switch_statement" => {
                self.visit_type_switch(node);
                None
            }
            "short_var_declaration" => {
                self.visit_short_var(node);
                None
            }
            "range_clause" | "receive_statement" => {
                self.visit_binding_clause(node);
                None
            }
            "var_declaration" | "const_declaration" => {
                self.visit_local_values(node);
                None
            }
            "type_declaration" => {
                self.visit_local_types(node);
                None
            }
            "parameter_declaration" | "variadic_parameter_declaration" | "type_parameter_declaration" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty);
                }
                None
            }
            "field_identifier" | "package_identifier" | "label_name" | "comment"
            | "blank_identifier" | "dot" => None,
            _ => {
                self.visit_children(node);
                None
            }
        }
    }

    fn visit_function(&mut self, node: Node) {
        self.scopes.push();
        self.bind_type_params(node.child_by_field_name("type_parameters"));
        if node.kind() == "method_declaration" {
            for param in receiver_type_params(node) {
                let name = self.text(param);
                self.scopes.bind(name, LocalBinding::Type);
            }
        }
        for field in ["receiver", "parameters"] {
            if let Some(list) = node.child_by_field_name(field) {
                self.bind_params(list);
            }
        }
        if let Some(result) = node.child_by_field_name("result") {
            if result.kind() == "parameter_list" {
                self.bind_params(result);
            } else {
                self.visit(result);
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
        self.scopes.pop();
    }

    fn visit_type_spec(&mut self, spec: Node) {
        self.scopes.push();
        self.bind_type_params(spec.child_by_field_name("type_parameters"));
        if let Some(ty) = spec.child_by_field_name("type") {
            self.visit(ty);
        }
        self.scopes.pop();
    }

    /// Type parameter names bind before constraints are visited, since
    /// constraints may mention them.
    fn bind_type_params(&mut self, list: Option<Node>) {
        let Some(list) = list else {
            return;
        };
        let decls: Vec<Node> = named_children(list)
            .into_iter()
            .filter(|n| n.kind() == "type_parameter_declaration")
            .collect();
        for decl in &decls {
            for name in children_by_field(*decl, "name") {
                let name = self.text(name);
                self.scopes.bind(name, LocalBinding::Type);
            }
        }
        for decl in decls {
            if let Some(constraint) = decl.child_by_field_name("type") {
                self.visit(constraint);
            }
        }
    }

    fn bind_params(&mut self, list: Node) {
        for param in named_children(list) {
            let variadic = match param.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let ty = param.child_by_field_name("type");
            if let Some(ty) = ty {
                self.visit(ty);
            }
            let type_ref = ty.filter(|_| !variadic).and_then(|t| self.type_ref(t));
            for name in children_by_field(param, "name") {
                let name = self.text(name);
                self.scopes.bind(name, LocalBinding::Value(type_ref.clone()));
            }
        }
    }

    fn visit_short_var(&mut self, node: Node) {
        let types: Vec<Option<TypeRef>> = node
            .child_by_field_name("right")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .map(|expr| match self.visit(expr) {
                Some(Typed::Value(ty)) => Some(ty),
                _ => None,
            })
            .collect();
        let names: Vec<Node> = node
            .child_by_field_name("left")
            .map(named_children)
            .unwrap_or_default();
        let paired = names.len() == types.len();
        for (i, name) in names.into_iter().enumerate() {
            if name.kind() != "identifier" {
                continue;
            }
            let ty = if paired { types[i].clone() } else { None };
            let name = self.text(name);
            self.scopes.bind(name, LocalBinding::Value(ty));
        }
    }

    /// `range` clauses and `case v := <-ch` either declare or assign their
    /// left-hand side.
    fn visit_binding_clause(&mut self, node: Node) {
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right);
        }
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let mut cursor = node.walk();
        let declares = node.children(&mut cursor).any(|c| c.kind() == ":=");
        if !declares {
            self.visit(left);
            return;
        }
        for name in named_children(left) {
            if name.kind() == "identifier" {
                let name = self.text(name);
                self.scopes.bind(name, LocalBinding::Value(None));
            }
        }
    }

    fn visit_local_values(&mut self, node: Node) {
        for spec in spec_nodes(node, &["var_spec", "const_spec"]) {
            let declared = spec.child_by_field_name("type");
            if let Some(ty) = declared {
                self.visit(ty);
            }
            let declared = declared.and_then(|t| self.type_ref(t));
            let values: Vec<Option<TypeRef>> = spec
                .child_by_field_name("value")
                .map(named_children)
                .unwrap_or_default()
                .into_iter()
                .map(|expr| match self.visit(expr) {
                    Some(Typed::Value(ty)) => Some(ty),
                    _ => None,
                })
                .collect();
            for (i, name) in children_by_field(spec, "name").into_iter().enumerate() {
                let ty = declared
                    .clone()
                    .or_else(|| values.get(i).cloned().flatten());
                let name = self.text(name);
                self.scopes.bind(name, LocalBinding::Value(ty));
            }
        }
    }

    fn visit_local_types(&mut self, node: Node) {
        for spec in spec_nodes(node, &["type_spec", "type_alias"]) {
            if let Some(name) = spec.child_by_field_name("name") {
                let name = self.text(name);
                self.scopes.bind(name, LocalBinding::Type);
            }
            self.visit_type_spec(spec);
        }
    }

    fn visit_type_switch(&mut self, node: Node) {
        self.scopes.push();
        for field in ["initializer", "value"] {
            if let Some(child) = node.child_by_field_name(field) {
                self.visit(child);
            }
        }
        let aliases: Vec<&'a str> = node
            .child_by_field_name("alias")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .map(|n| self.text(n))
            .collect();
        for case in named_children(node)
            .into_iter()
            .filter(|n| matches!(n.kind(), "type_case" | "default_case"))
        {
            self.scopes.push();
            let types = children_by_field(case, "type");
            for ty in &types {
                self.visit(*ty);
            }
            // the alias takes the case's type only when it lists exactly one
            let bound = match types.as_slice() {
                [only] => self.type_ref(*only),
                _ => None,
            };
            for alias in &aliases {
                self.scopes.bind(alias, LocalBinding::Value(bound.clone()));
            }
            for child in named_children(case) {
                if !types.contains(&child) {
                    self.visit(child);
                }
            }
            self.scopes.pop();
        }
        self.scopes.pop();
    }

    /// Elements of `{...}` given the literal's type, when written. Bare
    /// `Name:` keys name struct fields unless the literal is a map, where keys
    /// are ordinary expressions. Elided inner literals take the element type.
    fn visit_literal_value(&mut self, body: Node, ty: Option<Node>) {
        let shape = ty.and_then(unwrap_type);
        let map = shape.filter(|t| t.kind() == "map_type");
        let key_type = map.and_then(|m| m.child_by_field_name("key"));
        let element_type = shape.and_then(|t| match t.kind() {
            "map_type" => t.child_by_field_name("value"),
            "slice_type" | "array_type" | "implicit_length_array_type" => {
                t.child_by_field_name("element")
            }
            _ => None,
        });
        for child in named_children(body) {
            match child.kind() {
                "keyed_element" => {
                    for (i, part) in named_children(child).into_iter().enumerate() {
                        if i == 0 {
                            if map.is_none() && is_bare_identifier(part) {
                                continue;
                            }
                            self.visit_literal_element(part, key_type);
                        } else {
                            self.visit_literal_element(part, element_type);
                        }
                    }
                }
                "literal_element" | "literal_value" => {
                    self.visit_literal_element(child, element_type)
                }
                _ => {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_literal_element(&mut self, node: Node, ty: Option<Node>) {
        match node.kind() {
            "literal_value" => self.visit_literal_value(node, ty),
            "literal_element" => {
                for child in named_children(node) {
                    self.visit_literal_element(child, ty);
                }
            }
            _ => {
                self.visit(node);
            }
        }
    }

    fn visit_selector(&mut self, node: Node) -> Option<Typed> {
        let operand = node.child_by_field_name("operand")?;
        let base = self.visit(operand);
        let field = self.text(node.child_by_field_name("field")?);
        let in_call = is_callee(node);
        match base? {
            Typed::Package(path) => {
                let position = if in_call {
                    UsePosition::Call
                } else {
                    UsePosition::Value
                };
                self.qualified(&path, field, position)
            }
            Typed::Value(ty) => self.select(&ty, field, in_call),
            // method expression `T.M`
            Typed::TypeName(ty) => self.select(&ty, field, true),
            Typed::Callable(_) => None,
        }
    }

    fn select(&mut self, owner: &TypeRef, name: &str, in_call: bool) -> Option<Typed> {
        let selection = self.table.select(owner, name, in_call)?;
        self.emit(selection.object, selection.position);
        if selection.callable {
            Some(Typed::Callable(selection.ty))
        } else {
            selection.ty.map(Typed::Value)
        }
    }

    fn qualified(&mut self, path: &str, name: &str, position: UsePosition) -> Option<Typed> {
        let table: &'a ModuleTable = self.table;
        if let Some(package) = table.package(path) {
            let member = package.member(name)?;
            let object = member.object(name, &package.import_path);
            self.emit(object, Some(member.position.clone()));
            return typed_member(member, &package.import_path, name);
        }
        if is_internal_package(path, table.module_path()) {
            return None;
        }
        let (kind, typed) = match position {
            UsePosition::Type => (
                ObjectKind::TypeName,
                Some(Typed::TypeName(TypeRef::new(path, name))),
            ),
            UsePosition::Call => (ObjectKind::Func, Some(Typed::Callable(None))),
            UsePosition::Value => (ObjectKind::Var { type_text: None }, None),
        };
        self.emit(SemanticObject::new(name, kind, path), None);
        typed
    }

    fn lookup_value(&mut self, node: Node) -> Option<Typed> {
        let name = self.text(node);
        if let Some(local) = self.scopes.lookup(name) {
            return match local {
                LocalBinding::Value(ty) => ty.clone().map(Typed::Value),
                LocalBinding::Type => None,
            };
        }
        if let Some((package, member)) = self.package_member(name) {
            let object = member.object(name, &package.import_path);
            self.emit(object, Some(member.position.clone()));
            return typed_member(member, &package.import_path, name);
        }
        self.imports
            .package(name)
            .map(|path| Typed::Package(path.to_string()))
    }

    fn lookup_type(&mut self, node: Node) -> Option<Typed> {
        let name = self.text(node);
        if self.scopes.lookup(name).is_some() {
            return None;
        }
        let (package, member) = self.package_member(name)?;
        if member.kind != MemberKind::Type {
            return None;
        }
        let object = member.object(name, &package.import_path);
        self.emit(object, Some(member.position.clone()));
        Some(Typed::TypeName(TypeRef::new(&package.import_path, name)))
    }

    /// Package scope first, then exported names of dot-imported project
    /// packages.
    fn package_member(&self, name: &str) -> Option<(&'a PackageTable, &'a Member)> {
        let own: &'a PackageTable = self.package;
        if let Some(member) = own.member(name) {
            return Some((own, member));
        }
        if !is_exported(name) {
            return None;
        }
        let table: &'a ModuleTable = self.table;
        self.imports.dot_imports().iter().find_map(|path| {
            let package = table.package(path)?;
            package.member(name).map(|m| (package, m))
        })
    }

    /// Named type of a type expression as seen from this point; local types
    /// have none.
    fn type_ref(&self, node: Node) -> Option<TypeRef> {
        let base = base_type_node(node)?;
        if base.kind() == "type_identifier" {
            let name = self.text(base);
            if self.scopes.lookup(name).is_some() {
                return None;
            }
            if self.package.member(name).is_none() {
                if let Some((package, _)) = self.package_member(name) {
                    return Some(TypeRef::new(&package.import_path, name));
                }
            }
        }
        symbols::type_ref(base, self.source, &self.package.import_path, self.imports)
    }
}

fn typed_member(member: &Member, package_path: &str, name: &str) -> Option<Typed> {
    match &member.kind {
        MemberKind::Func => Some(Typed::Callable(member.ty.clone())),
        MemberKind::Type => Some(Typed::TypeName(TypeRef::new(package_path, name))),
        MemberKind::Var { .. } => member.ty.clone().map(Typed::Value),
        MemberKind::Const => None,
    }
}

/// Looks through pointers and parentheses of an element type, so `[]*T{{...}}`
/// elements are literals of `T`.
fn unwrap_type(mut node: Node) -> Option<Node> {
    while matches!(node.kind(), "pointer_type" | "parenthesized_type") {
        node = named_children(node).into_iter().next()?;
    }
    Some(node)
}

fn is_callee(node: Node) -> bool {
    node.parent().is_some_and(|p| {
        p.kind() == "call_expression" && p.child_by_field_name("function") == Some(node)
    })
}

fn is_bare_identifier(node: Node) -> bool {
    match node.kind() {
        "identifier" | "field_identifier" => true,
        "literal_element" => matches!(
            named_children(node).as_slice(),
            [only] if only.kind() == "identifier"
        ),
        _ => false,
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
