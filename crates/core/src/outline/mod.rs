//! Hierarchical outline of what each file or directory exposes to the rest
//! of the project.

pub mod render;
pub mod tree;

pub use render::ChunkSet;
pub use tree::{FileTreeNode, NodeState};

use crate::error::Result;
use crate::lang::DefinitionExtractor;
use crate::path;
use crate::project::ProjectWalker;
use crate::store::DefinitionStore;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Rendered in place of an empty outline entry.
pub const NOTHING_ESCAPES: &str = "No definitions used outside this path";

pub const OVERVIEW_HEADER: &str = "## CODEBASE OVERVIEW ##";
pub const OVERVIEW_FOOTER: &str = "## END OF CODEBASE OVERVIEW ##";
pub const FILE_TREE_HEADER: &str = "## CODEBASE FILE TREE ##";
pub const FILE_TREE_FOOTER: &str = "## END OF CODEBASE FILE TREE ##";

/// Renders outline entries over a lazily opened file tree.
///
/// The overview shows one entry per unopened node, so its granularity follows
/// how far the caller has drilled in.
pub struct OutlineBuilder<'a> {
    store: &'a dyn DefinitionStore,
    walker: &'a ProjectWalker,
    extractor: &'a dyn DefinitionExtractor,
    root: FileTreeNode,
}

impl<'a> OutlineBuilder<'a> {
    pub fn new(
        store: &'a dyn DefinitionStore,
        walker: &'a ProjectWalker,
        extractor: &'a dyn DefinitionExtractor,
    ) -> Self {
        Self {
            store,
            walker,
            extractor,
            root: FileTreeNode::root(),
        }
    }

    pub fn tree(&self) -> &FileTreeNode {
        &self.root
    }

    /// Opens `rel` and every ancestor leading to it.
    pub fn open(&mut self, rel: &str) -> Result<()> {
        self.root.find_mut(rel, self.walker)?.open(self.walker)
    }

    /// Makes `rel` itself a leaf of the overview by opening its parent.
    pub fn focus(&mut self, rel: &str) -> Result<()> {
        self.open(&path::parent(rel))
    }

    pub fn close(&mut self, rel: &str) -> Result<()> {
        self.root.find_mut(rel, self.walker)?.close();
        Ok(())
    }

    pub fn leaves(&self) -> Vec<&FileTreeNode> {
        self.root.leaves()
    }

    /// One outline entry: definitions declared under `rel` and used outside it.
    pub fn render_node(&self, rel: &str, is_dir: bool) -> String {
        let rel = path::normalize(rel);
        let mut by_file: BTreeMap<String, ChunkSet> = BTreeMap::new();
        for def in self.store.defs_escaping(&rel) {
            by_file
                .entry(def.rel_file.clone())
                .or_default()
                .add(&def.summary);
        }

        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", rel);
        if by_file.is_empty() {
            let _ = writeln!(out, "{}\n", NOTHING_ESCAPES);
            return out;
        }
        if !is_dir && by_file.len() > 1 {
            tracing::warn!("File outline for {} spans {} files", rel, by_file.len());
        }
        for (file, chunks) in &by_file {
            if is_dir {
                let _ = writeln!(out, "- {}", file);
            }
            match std::fs::read_to_string(self.walker.abs_path(file)) {
                Ok(source) => chunks.render(&source, &mut out),
                Err(e) => tracing::error!("Failed to read {} for outline: {}", file, e),
            }
            out.push('\n');
        }
        out
    }

    /// Entries for every leaf that is a directory or a supported source file.
    pub fn render_overview(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", OVERVIEW_HEADER);
        out.push_str("```\n");
        for leaf in self.leaves() {
            if !leaf.is_dir && !self.extractor.supports_path(&self.walker.abs_path(&leaf.path)) {
                continue;
            }
            out.push_str(&self.render_node(&leaf.path, leaf.is_dir));
        }
        out.push_str("```\n");
        let _ = writeln!(out, "{}\n", OVERVIEW_FOOTER);
        out
    }
}

/// Every directory with its direct entries, as `- dir name` / `- file name`.
pub fn render_file_tree(walker: &ProjectWalker) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", FILE_TREE_HEADER);
    out.push_str("```\n");
    let dirs = std::iter::once(path::ROOT.to_string()).chain(
        walker
            .walk()
            .into_iter()
            .filter(|e| e.is_dir)
            .map(|e| e.rel_path),
    );
    for dir in dirs {
        let _ = writeln!(out, "# {}", dir);
        for entry in walker.list_dir(&dir)? {
            let kind = if entry.is_dir { "dir" } else { "file" };
            let _ = writeln!(out, "- {} {}", kind, entry.name());
        }
        out.push('\n');
    }
    out.push_str("```\n");
    let _ = writeln!(out, "{}\n", FILE_TREE_FOOTER);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DefKind, tag};
    use crate::model::{ContentRange, Definition};
    use crate::store::MemoryStore;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct GoFiles;

    impl DefinitionExtractor for GoFiles {
        fn language(&self) -> &'static str {
            "go"
        }

        fn supports_path(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "go")
        }

        fn extract(&self, _rel_file: &str, _source: &str) -> Result<Vec<Definition>> {
            Ok(Vec::new())
        }
    }

    const X_GO: &str = "package a\n\nfunc Foo() {\n\treturn\n}\n\nfunc bar() {}\n";

    fn setup() -> (tempfile::TempDir, ProjectWalker, MemoryStore) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/x.go"), X_GO).unwrap();
        fs::write(dir.path().join("b/y.go"), "package b\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();
        let walker = ProjectWalker::new(dir.path()).unwrap();

        let store = MemoryStore::new();
        let mut foo = Definition::new(
            "a/x.go",
            "Foo",
            tag(DefKind::Function, "Foo", None),
            ContentRange::new(3, 4, 11, 23),
            ContentRange::new(3, 6, 11, 33),
        );
        foo.min_prefix = ".".into();
        let bar = Definition::new(
            "a/x.go",
            "bar",
            tag(DefKind::Function, "bar", None),
            ContentRange::new(7, 8, 35, 47),
            ContentRange::new(7, 8, 35, 49),
        );
        store.insert_defs(vec![foo, bar]);
        (dir, walker, store)
    }

    #[test]
    fn test_directory_entry_lists_escaping_defs_per_file() {
        let (_dir, walker, store) = setup();
        let builder = OutlineBuilder::new(&store, &walker, &GoFiles);
        let out = builder.render_node("a", true);
        assert_eq!(out, "# a\n\n- a/x.go\n  3| func Foo() {\n\n");
    }

    #[test]
    fn test_nothing_escaping_renders_marker() {
        let (_dir, walker, store) = setup();
        let builder = OutlineBuilder::new(&store, &walker, &GoFiles);
        assert!(builder.render_node("b", true).contains(NOTHING_ESCAPES));
        // Foo is used from the root, so nothing escapes the root itself
        assert!(builder.render_node(".", true).contains(NOTHING_ESCAPES));
    }

    #[test]
    fn test_file_entry_has_no_file_header() {
        let (_dir, walker, store) = setup();
        let builder = OutlineBuilder::new(&store, &walker, &GoFiles);
        assert_eq!(
            builder.render_node("a/x.go", false),
            "# a/x.go\n\n  3| func Foo() {\n\n"
        );
    }

    #[test]
    fn test_overview_follows_opened_nodes() {
        let (_dir, walker, store) = setup();
        let mut builder = OutlineBuilder::new(&store, &walker, &GoFiles);
        let closed = builder.render_overview();
        assert!(closed.starts_with(OVERVIEW_HEADER));
        assert!(closed.contains("# .\n"));

        builder.open(".").unwrap();
        let opened = builder.render_overview();
        assert!(opened.contains("# a\n"));
        assert!(opened.contains("# b\n"));
        assert!(!opened.contains("notes.txt"));

        builder.focus("a/x.go").unwrap();
        let focused = builder.render_overview();
        assert!(focused.contains("# a/x.go\n"));
        assert!(!focused.contains("# a\n"));

        builder.close("a").unwrap();
        assert_eq!(builder.render_overview(), opened);
    }

    #[test]
    fn test_file_tree_lists_dirs_and_files() {
        let (_dir, walker, _store) = setup();
        let out = render_file_tree(&walker).unwrap();
        assert!(out.contains("# .\n- dir a\n- dir b\n- file notes.txt\n"));
        assert!(out.contains("# a\n- file x.go\n"));
    }
}
