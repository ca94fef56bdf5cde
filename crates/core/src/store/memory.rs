use super::{DefFilter, DefinitionStore, UseFilter, sort_defs};
use crate::error::{DefscopeError, Result};
use crate::model::{DefId, Definition, UsageEdge};
use crate::path;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// In-process store backed by `DashMap`.
///
/// `widen_min_prefix` mutates through `get_mut`, which holds the shard write
/// lock for the entry, so concurrent folds on one definition are serialized.
#[derive(Debug)]
pub struct MemoryStore {
    defs: DashMap<DefId, Definition>,
    by_file: DashMap<String, Vec<DefId>>,
    uses: RwLock<Vec<UsageEdge>>,
    next_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            defs: DashMap::new(),
            by_file: DashMap::new(),
            uses: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Rebuilds a store from persisted collections, keeping the stored ids.
    pub fn from_parts(defs: Vec<Definition>, uses: Vec<UsageEdge>) -> Self {
        let store = Self::new();
        let mut max_id = 0;
        for def in defs {
            max_id = max_id.max(def.id);
            store
                .by_file
                .entry(def.rel_file.clone())
                .or_default()
                .push(def.id);
            store.defs.insert(def.id, def);
        }
        store.next_id.store(max_id + 1, Ordering::SeqCst);
        *store.uses.write().unwrap_or_else(PoisonError::into_inner) = uses;
        store
    }

    fn collect(&self, filter: &DefFilter) -> Vec<Definition> {
        let mut out: Vec<Definition> = match &filter.rel_file {
            Some(file) => self
                .by_file
                .get(file)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| self.defs.get(id).map(|d| d.clone()))
                        .filter(|d| filter.matches(d))
                        .collect()
                })
                .unwrap_or_default(),
            None => self
                .defs
                .iter()
                .filter(|d| filter.matches(d.value()))
                .map(|d| d.value().clone())
                .collect(),
        };
        sort_defs(&mut out);
        out
    }
}

impl DefinitionStore for MemoryStore {
    fn insert_defs(&self, defs: Vec<Definition>) -> Vec<DefId> {
        let mut ids = Vec::with_capacity(defs.len());
        for mut def in defs {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            def.id = id;
            self.by_file
                .entry(def.rel_file.clone())
                .or_default()
                .push(id);
            self.defs.insert(id, def);
            ids.push(id);
        }
        ids
    }

    fn insert_uses(&self, uses: Vec<UsageEdge>) {
        self.uses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(uses);
    }

    fn find_defs(&self, filter: &DefFilter) -> Vec<Definition> {
        self.collect(filter)
    }

    fn find_uses(&self, filter: &UseFilter) -> Vec<UsageEdge> {
        self.uses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    fn get(&self, id: DefId) -> Option<Definition> {
        self.defs.get(&id).map(|d| d.clone())
    }

    fn widen_min_prefix(&self, id: DefId, using_dir: &str) -> Result<bool> {
        let mut entry = self
            .defs
            .get_mut(&id)
            .ok_or_else(|| DefscopeError::Storage(format!("unknown definition id {id}")))?;
        let widened = path::common_ancestor(&entry.min_prefix, using_dir);
        if widened == entry.min_prefix {
            return Ok(false);
        }
        entry.min_prefix = widened;
        Ok(true)
    }

    fn defs_escaping(&self, node: &str) -> Vec<Definition> {
        let mut out: Vec<Definition> = self
            .defs
            .iter()
            .filter(|d| d.value().escapes(node))
            .map(|d| d.value().clone())
            .collect();
        sort_defs(&mut out);
        out
    }

    fn all_uses(&self) -> Vec<UsageEdge> {
        self.uses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn def_count(&self) -> usize {
        self.defs.len()
    }

    fn use_count(&self) -> usize {
        self.uses.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.defs.clear();
        self.by_file.clear();
        self.uses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DefKind, tag};
    use crate::model::ContentRange;
    use rayon::prelude::*;

    fn func(file: &str, name: &str, line: usize) -> Definition {
        Definition::new(
            file,
            name,
            tag(DefKind::Function, name, None),
            ContentRange::new(line, line + 1, line * 10, line * 10 + 5),
            ContentRange::new(line, line + 3, line * 10, line * 10 + 25),
        )
    }

    #[test]
    fn test_insert_assigns_ids_and_indexes_by_file() {
        let store = MemoryStore::new();
        let ids = store.insert_defs(vec![func("a/x.go", "Foo", 1), func("a/y.go", "Bar", 1)]);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let found = store.find_defs(&DefFilter::new().file("a/x.go"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier, "Foo");
        assert_eq!(store.get(ids[1]).map(|d| d.identifier), Some("Bar".into()));
    }

    #[test]
    fn test_results_are_sorted() {
        let store = MemoryStore::new();
        store.insert_defs(vec![
            func("b/y.go", "B", 1),
            func("a/x.go", "Late", 9),
            func("a/x.go", "Early", 2),
        ]);
        let names: Vec<_> = store.all_defs().into_iter().map(|d| d.identifier).collect();
        assert_eq!(names, vec!["Early", "Late", "B"]);
    }

    #[test]
    fn test_widen_is_monotonic() {
        let store = MemoryStore::new();
        let id = store.insert_defs(vec![func("a/b/x.go", "Foo", 1)])[0];

        assert!(store.widen_min_prefix(id, "a/b").unwrap());
        assert!(!store.widen_min_prefix(id, "a/b").unwrap());
        assert!(store.widen_min_prefix(id, "a/c").unwrap());
        assert_eq!(store.get(id).unwrap().min_prefix, "a");
        // a deeper directory cannot narrow it back
        assert!(!store.widen_min_prefix(id, "a/b/deep").unwrap());
        assert_eq!(store.get(id).unwrap().min_prefix, "a");
    }

    #[test]
    fn test_widen_unknown_id_is_error() {
        let store = MemoryStore::new();
        assert!(store.widen_min_prefix(42, "a").is_err());
    }

    #[test]
    fn test_concurrent_widening_converges() {
        let store = MemoryStore::new();
        let id = store.insert_defs(vec![func("a/x.go", "Foo", 1)])[0];
        let dirs: Vec<String> = (0..64)
            .map(|i| if i % 2 == 0 { "a".into() } else { format!("a/sub{i}") })
            .chain(std::iter::once("b".to_string()))
            .collect();
        dirs.par_iter().for_each(|d| {
            store.widen_min_prefix(id, d).unwrap();
        });
        assert_eq!(store.get(id).unwrap().min_prefix, ".");
    }

    #[test]
    fn test_from_parts_keeps_ids_and_continues_numbering() {
        let mut def = func("a/x.go", "Foo", 1);
        def.id = 7;
        let store = MemoryStore::from_parts(vec![def], Vec::new());
        assert!(store.get(7).is_some());
        let ids = store.insert_defs(vec![func("a/x.go", "Bar", 5)]);
        assert_eq!(ids, vec![8]);
        assert_eq!(store.find_defs(&DefFilter::new().file("a/x.go")).len(), 2);
    }

    #[test]
    fn test_clear_empties_everything() {
        let store = MemoryStore::new();
        store.insert_defs(vec![func("a/x.go", "Foo", 1)]);
        store.clear();
        assert_eq!(store.def_count(), 0);
        assert_eq!(store.use_count(), 0);
        assert!(store.find_defs(&DefFilter::new().file("a/x.go")).is_empty());
    }
}
