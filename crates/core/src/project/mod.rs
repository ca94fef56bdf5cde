pub mod walker;

pub use walker::{ProjectFile, ProjectWalker, TreeEntry, read_source};
