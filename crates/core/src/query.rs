//! Read-side facade handed to tool layers.

use crate::error::LookupError;
use crate::model::{ConstructRef, Definition, UsageEdge};
use crate::project::{ProjectWalker, TreeEntry};
use crate::resolver::{DefinitionResolver, Resolution};
use crate::store::{DefFilter, DefinitionStore, UseFilter};

/// Queries over an indexed project. "No match" is always an empty result or
/// a typed [`LookupError`], never a panic.
pub struct QueryService<'a> {
    store: &'a dyn DefinitionStore,
    walker: &'a ProjectWalker,
}

impl<'a> QueryService<'a> {
    pub fn new(store: &'a dyn DefinitionStore, walker: &'a ProjectWalker) -> Self {
        Self { store, walker }
    }

    pub fn find_defs(&self, filter: &DefFilter) -> Vec<Definition> {
        self.store.find_defs(filter)
    }

    /// Edges matched against their target identity.
    pub fn find_used_defs(&self, filter: &UseFilter) -> Vec<UsageEdge> {
        self.store.find_uses(filter)
    }

    pub fn find_one_def(&self, partial: &ConstructRef) -> Result<Definition, LookupError> {
        DefinitionResolver::new(self.store)
            .resolve(partial)
            .into_result(partial)
    }

    pub fn find_used_def_outline(&self, path: &str) -> Vec<Definition> {
        self.store.defs_escaping(&crate::path::normalize(path))
    }

    pub fn walk_project_file_tree(&self) -> Vec<TreeEntry> {
        self.walker.walk()
    }

    /// The definition whose content starts at `line`.
    pub fn def_at(&self, file: &str, identifier: &str, line: usize) -> Result<Definition, LookupError> {
        let mut matches = self.store.find_defs(
            &DefFilter::new()
                .file(file)
                .identifier(identifier)
                .start_line(line),
        );
        let resolution = if matches.len() > 1 {
            Resolution::Ambiguous(matches)
        } else {
            matches.pop().map_or(Resolution::NotFound, Resolution::Found)
        };
        resolution.into_result(&ConstructRef::new(file, identifier, Vec::new()))
    }

    /// Every edge whose target is the definition at `line`.
    pub fn find_references(
        &self,
        file: &str,
        identifier: &str,
        line: usize,
    ) -> Result<Vec<UsageEdge>, LookupError> {
        let def = self.def_at(file, identifier, line)?;
        Ok(self.store.find_uses(
            &UseFilter::target()
                .file(def.rel_file)
                .identifier(def.identifier)
                .keywords(def.keywords)
                .dependency(false),
        ))
    }

    /// Every edge whose using construct is the definition at `line`.
    pub fn find_uses(
        &self,
        file: &str,
        identifier: &str,
        line: usize,
    ) -> Result<Vec<UsageEdge>, LookupError> {
        let def = self.def_at(file, identifier, line)?;
        Ok(self.store.find_uses(
            &UseFilter::using()
                .file(def.rel_file)
                .identifier(def.identifier)
                .keywords(def.keywords),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DefKind, tag};
    use crate::model::ContentRange;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    fn def(file: &str, kind: DefKind, name: &str, q: Option<&str>, line: usize) -> Definition {
        Definition::new(
            file,
            name,
            tag(kind, name, q),
            ContentRange::new(line, line + 1, 0, 0),
            ContentRange::new(line, line + 3, 0, 0),
        )
    }

    fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_defs(vec![
            def("a/x.go", DefKind::Method, "Close", Some("*Reader"), 3),
            def("a/x.go", DefKind::Method, "Close", Some("*Writer"), 8),
            def("b/y.go", DefKind::Function, "Run", None, 5),
        ]);
        let run = ConstructRef::new("b/y.go", "Run", tag(DefKind::Function, "Run", None));
        store.insert_uses(vec![
            UsageEdge::internal(
                run.clone(),
                ConstructRef::new("a/x.go", "Close", tag(DefKind::Method, "Close", Some("Reader"))),
            ),
            UsageEdge::dependency(run, "os", "Exit", tag(DefKind::Function, "Exit", None)),
        ]);
        store
    }

    #[test]
    fn test_find_one_def_disambiguates_or_reports() {
        let dir = tempdir().unwrap();
        let walker = ProjectWalker::new(dir.path()).unwrap();
        let store = fixture();
        let q = QueryService::new(&store, &walker);

        let reader = q
            .find_one_def(&ConstructRef::new(
                "a/x.go",
                "Close",
                vec!["method".into(), "Close".into(), "Reader".into()],
            ))
            .unwrap();
        assert_eq!(reader.content.start_line, 3);

        let err = q
            .find_one_def(&ConstructRef::new(
                "a/x.go",
                "Close",
                vec!["method".into(), "Close".into()],
            ))
            .unwrap_err();
        match err {
            LookupError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_references_and_uses_by_line() {
        let dir = tempdir().unwrap();
        let walker = ProjectWalker::new(dir.path()).unwrap();
        let store = fixture();
        let q = QueryService::new(&store, &walker);

        let refs = q.find_references("a/x.go", "Close", 3).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].using_identifier, "Run");
        assert!(q.find_references("a/x.go", "Close", 8).unwrap().is_empty());

        let uses = q.find_uses("b/y.go", "Run", 5).unwrap();
        assert_eq!(uses.len(), 2);
        assert!(matches!(
            q.find_uses("b/y.go", "Run", 6),
            Err(LookupError::NotFound { .. })
        ));
    }
}
