//! Per-file import tables.

use crate::parser::utils::{field_text, named_children, spec_nodes};
use std::collections::HashMap;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// No explicit name; the package's own name applies.
    Default,
    Alias(String),
    Dot,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: ImportName,
    pub path: String,
}

/// Every import spec of a file, in source order.
pub fn collect_imports(root: Node, source: &str) -> Vec<ImportSpec> {
    let mut out = Vec::new();
    for decl in named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "import_declaration")
    {
        for spec in spec_nodes(decl, &["import_spec"]) {
            let Some(path) = field_text(spec, "path", source) else {
                continue;
            };
            let path = path.trim_matches(|c| c == '"' || c == '`').to_string();
            let name = match field_text(spec, "name", source) {
                None => ImportName::Default,
                Some(".") => ImportName::Dot,
                Some("_") => ImportName::Blank,
                Some(alias) => ImportName::Alias(alias.to_string()),
            };
            out.push(ImportSpec { name, path });
        }
    }
    out
}

/// Name-to-path bindings visible in one file.
#[derive(Debug, Clone, Default)]
pub struct FileImports {
    by_name: HashMap<String, String>,
    dot: Vec<String>,
}

impl FileImports {
    /// `package_name` gives the declared name of an import path; project
    /// packages know theirs, external ones fall back to a guess.
    pub fn new(specs: &[ImportSpec], package_name: impl Fn(&str) -> String) -> Self {
        let mut imports = Self::default();
        for spec in specs {
            match &spec.name {
                ImportName::Default => {
                    imports
                        .by_name
                        .insert(package_name(&spec.path), spec.path.clone());
                }
                ImportName::Alias(alias) => {
                    imports.by_name.insert(alias.clone(), spec.path.clone());
                }
                ImportName::Dot => imports.dot.push(spec.path.clone()),
                ImportName::Blank => {}
            }
        }
        imports
    }

    pub fn package(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn dot_imports(&self) -> &[String] {
        &self.dot
    }
}

/// Conventional package name for an import path outside the project.
///
/// `github.com/x/go-yaml/v3` → `yaml`, `gopkg.in/yaml.v3` → `yaml`,
/// `github.com/x/foo-bar` → `foo_bar`.
pub fn default_package_name(import_path: &str) -> String {
    let mut segments: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| is_major_version(s)) {
        segments.pop();
    }
    let mut name = segments.last().copied().unwrap_or(import_path);
    if let Some((head, version)) = name.rsplit_once('.') {
        if is_major_version(version) {
            name = head;
        }
    }
    let name = name.strip_prefix("go-").unwrap_or(name);
    name.replace(['-', '.'], "_")
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
