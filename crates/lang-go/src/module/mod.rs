//! Whole-module semantic pass.
//!
//! Every file is parsed once, package tables are built from all of them, and
//! only then are references resolved, since a use in one file may target a
//! declaration in any other.

pub mod gomod;
pub mod imports;
pub mod resolve;
pub mod scope;
pub mod symbols;

use crate::parser::utils::{is_test_file, named_children, node_text};
use crate::parser::{GoParser, parse_with};
use defscope_core::classify::is_internal_package;
use defscope_core::lang::{ModuleInfo, ResolveOptions, SourceText};
use defscope_core::model::{ObjectKind, ResolvedUse, SemanticObject, SourcePosition};
use defscope_core::{Result, path};
use imports::{FileImports, ImportSpec, collect_imports, default_package_name};
use rayon::prelude::*;
use resolve::FileResolver;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use symbols::{PackageTable, TypeRef};
use tree_sitter::Tree;

/// Promotion through embedded fields stops after this many levels.
const MAX_EMBED_DEPTH: usize = 4;

struct ParsedFile {
    rel_path: String,
    dir: String,
    source: Arc<str>,
    tree: Tree,
    package_name: String,
    imports: Vec<ImportSpec>,
}

struct PackageUnit {
    table: PackageTable,
    files: Vec<usize>,
}

/// What a selector on a value of a known type denotes.
#[derive(Debug, Clone)]
pub struct Selection {
    pub object: SemanticObject,
    pub position: Option<SourcePosition>,
    /// Field type, or method result type.
    pub ty: Option<TypeRef>,
    pub callable: bool,
}

/// Symbol tables of every package in the module.
pub struct ModuleTable {
    module_path: String,
    units: Vec<PackageUnit>,
    by_path: HashMap<String, usize>,
}

impl ModuleTable {
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Importable package at `import_path`. External test packages are not
    /// importable and never returned here.
    pub fn package(&self, import_path: &str) -> Option<&PackageTable> {
        self.by_path.get(import_path).map(|&i| &self.units[i].table)
    }

    pub fn package_count(&self) -> usize {
        self.units.len()
    }

    /// Method or field `name` on `owner`, searching embedded types.
    ///
    /// Outside the project only method calls are reported, with the receiver
    /// taken from the owner's name.
    pub fn select(&self, owner: &TypeRef, name: &str, in_call: bool) -> Option<Selection> {
        self.select_at_depth(owner, name, in_call, 0)
    }

    fn select_at_depth(
        &self,
        owner: &TypeRef,
        name: &str,
        in_call: bool,
        depth: usize,
    ) -> Option<Selection> {
        let Some(package) = self.package(&owner.package) else {
            if !in_call || is_internal_package(&owner.package, &self.module_path) {
                return None;
            }
            return Some(Selection {
                object: SemanticObject::new(
                    name,
                    ObjectKind::Method {
                        receiver: owner.name.clone(),
                    },
                    &owner.package,
                ),
                position: None,
                ty: None,
                callable: true,
            });
        };

        if let Some(method) = package.method(&owner.name, name) {
            return Some(Selection {
                object: SemanticObject::new(
                    name,
                    ObjectKind::Method {
                        receiver: method.receiver.clone(),
                    },
                    &package.import_path,
                ),
                position: Some(method.position.clone()),
                ty: method.result.clone(),
                callable: true,
            });
        }
        if let Some(field) = package.field(&owner.name, name) {
            return Some(Selection {
                object: SemanticObject::new(
                    name,
                    ObjectKind::Field {
                        owner: owner.name.clone(),
                    },
                    &package.import_path,
                ),
                position: Some(field.position.clone()),
                ty: field.ty.clone(),
                callable: false,
            });
        }
        if depth >= MAX_EMBED_DEPTH {
            return None;
        }
        package
            .embedded(&owner.name)
            .iter()
            .find_map(|inner| self.select_at_depth(inner, name, in_call, depth + 1))
    }
}

/// Resolves every cross-file use in the module.
pub fn resolve_module(
    parser: &GoParser,
    module: &ModuleInfo,
    files: &[SourceText],
    options: ResolveOptions,
) -> Result<Vec<ResolvedUse>> {
    let started = Instant::now();
    let parsed = parse_files(parser, files, options);
    let table = build_table(&module.module_path, &parsed);
    let imports: Vec<FileImports> = parsed
        .par_iter()
        .map(|file| file_imports(&table, file))
        .collect();
    tracing::info!(
        "Built symbol tables for {} packages from {} files in {:?}",
        table.package_count(),
        parsed.len(),
        started.elapsed()
    );

    let (table, parsed, imports) = (&table, &parsed, &imports);
    let resolved: Vec<ResolvedUse> = table
        .units
        .par_iter()
        .flat_map_iter(move |unit| {
            unit.files.iter().flat_map(move |&i| {
                let file = &parsed[i];
                FileResolver::new(table, &unit.table, &imports[i], &file.rel_path, &file.source)
                    .resolve(file.tree.root_node())
            })
        })
        .collect();
    tracing::info!(
        "Resolved {} uses in {:?}",
        resolved.len(),
        started.elapsed()
    );
    Ok(resolved)
}

fn parse_files(parser: &GoParser, files: &[SourceText], options: ResolveOptions) -> Vec<ParsedFile> {
    let mut parsed: Vec<ParsedFile> = files
        .par_iter()
        .filter(|f| f.rel_path.ends_with(".go") && !in_ignored_dir(&f.rel_path))
        .filter(|f| options.include_tests || !is_test_file(&f.rel_path))
        .map_init(
            || parser.parser(),
            |ts_parser, file| {
                let ts_parser = match ts_parser {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!("No parser for {}: {}", file.rel_path, e);
                        return None;
                    }
                };
                let tree = match parse_with(ts_parser, &file.text) {
                    Ok(tree) => tree,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", file.rel_path, e);
                        return None;
                    }
                };
                let root = tree.root_node();
                let Some(package_name) = package_name(root, &file.text) else {
                    tracing::debug!("{} has no package clause, skipping", file.rel_path);
                    return None;
                };
                let imports = collect_imports(root, &file.text);
                Some(ParsedFile {
                    rel_path: file.rel_path.clone(),
                    dir: path::parent(&file.rel_path),
                    source: file.text.clone(),
                    tree,
                    package_name,
                    imports,
                })
            },
        )
        .flatten()
        .collect();
    parsed.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    parsed
}

/// Groups files into packages by directory. Test files declaring `<name>_test`
/// form their own, non-importable package.
fn build_table(module_path: &str, parsed: &[ParsedFile]) -> ModuleTable {
    let mut groups: BTreeMap<(String, bool), Vec<usize>> = BTreeMap::new();
    for (i, file) in parsed.iter().enumerate() {
        let external_test =
            is_test_file(&file.rel_path) && file.package_name.ends_with("_test");
        groups
            .entry((import_path(module_path, &file.dir), external_test))
            .or_default()
            .push(i);
    }

    let names: HashMap<String, String> = groups
        .iter()
        .filter(|((_, external_test), _)| !external_test)
        .map(|((path, _), files)| (path.clone(), parsed[files[0]].package_name.clone()))
        .collect();

    let units: Vec<PackageUnit> = groups
        .into_par_iter()
        .map(|((path, _), files)| {
            let mut table = PackageTable::new(path, parsed[files[0]].package_name.clone());
            for &i in &files {
                let file = &parsed[i];
                if file.package_name != table.name {
                    tracing::debug!(
                        "{} declares package {}, expected {}",
                        file.rel_path,
                        file.package_name,
                        table.name
                    );
                }
                let imports = FileImports::new(&file.imports, |p| package_name_of(&names, p));
                table.add_file(&file.rel_path, file.tree.root_node(), &file.source, &imports);
            }
            PackageUnit { table, files }
        })
        .collect();

    let mut by_path = HashMap::new();
    for (i, unit) in units.iter().enumerate() {
        let external_test = unit
            .files
            .first()
            .is_some_and(|&f| is_test_file(&parsed[f].rel_path) && unit.table.name.ends_with("_test"));
        if !external_test {
            by_path.insert(unit.table.import_path.clone(), i);
        }
    }

    ModuleTable {
        module_path: module_path.to_string(),
        units,
        by_path,
    }
}

fn file_imports(table: &ModuleTable, file: &ParsedFile) -> FileImports {
    FileImports::new(&file.imports, |p| match table.package(p) {
        Some(package) => package.name.clone(),
        None => default_package_name(p),
    })
}

fn package_name_of(names: &HashMap<String, String>, import_path: &str) -> String {
    names
        .get(import_path)
        .cloned()
        .unwrap_or_else(|| default_package_name(import_path))
}

fn package_name(root: tree_sitter::Node, source: &str) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .and_then(|clause| {
            named_children(clause)
                .into_iter()
                .find(|n| n.kind() == "package_identifier")
        })
        .map(|n| node_text(n, source).to_string())
}

pub fn import_path(module_path: &str, dir: &str) -> String {
    if dir == path::ROOT || dir.is_empty() {
        module_path.to_string()
    } else {
        format!("{}/{}", module_path, dir)
    }
}

/// Directories the go tool never treats as packages of this module.
fn in_ignored_dir(rel_path: &str) -> bool {
    let segments = path::segments(rel_path);
    let dirs = &segments[..segments.len().saturating_sub(1)];
    dirs.iter()
        .any(|s| *s == "testdata" || *s == "vendor" || s.starts_with('.') || s.starts_with('_'))
}
