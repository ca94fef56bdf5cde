//! Storage contract for definitions and usage edges.

pub mod filter;
pub mod memory;
pub mod snapshot;

pub use filter::{DefFilter, UseFilter, UseSide};
pub use memory::MemoryStore;
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};

use crate::error::Result;
use crate::model::{DefId, Definition, UsageEdge};

/// Shared definition/edge store.
///
/// Readers never observe a torn `min_prefix`: implementations serialize
/// [`widen_min_prefix`](DefinitionStore::widen_min_prefix) per definition id.
/// Query results are sorted by file, then position.
pub trait DefinitionStore: Send + Sync {
    /// Inserts definitions, assigning fresh ids. Returns the ids in input order.
    fn insert_defs(&self, defs: Vec<Definition>) -> Vec<DefId>;

    fn insert_uses(&self, uses: Vec<UsageEdge>);

    fn find_defs(&self, filter: &DefFilter) -> Vec<Definition>;

    fn find_uses(&self, filter: &UseFilter) -> Vec<UsageEdge>;

    fn get(&self, id: DefId) -> Option<Definition>;

    /// Folds `using_dir` into the definition's scope. Returns whether the
    /// stored prefix changed.
    fn widen_min_prefix(&self, id: DefId, using_dir: &str) -> Result<bool>;

    /// Definitions declared under `path` whose scope reaches outside it.
    fn defs_escaping(&self, path: &str) -> Vec<Definition>;

    fn all_defs(&self) -> Vec<Definition> {
        self.find_defs(&DefFilter::default())
    }

    fn all_uses(&self) -> Vec<UsageEdge>;

    fn def_count(&self) -> usize;

    fn use_count(&self) -> usize;

    fn clear(&self);
}

pub(crate) fn sort_defs(defs: &mut [Definition]) {
    defs.sort_by(|a, b| {
        a.rel_file
            .cmp(&b.rel_file)
            .then(a.content.start_byte.cmp(&b.content.start_byte))
            .then(a.id.cmp(&b.id))
    });
}
