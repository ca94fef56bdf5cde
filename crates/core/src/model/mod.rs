pub mod definition;
pub mod resolution;
pub mod usage;

pub use definition::{ContentRange, DefId, Definition};
pub use resolution::{ObjectKind, ResolvedUse, SemanticObject, SourcePosition};
pub use usage::{ConstructRef, UsageEdge};
