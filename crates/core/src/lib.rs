pub mod callgraph;
pub mod classify;
pub mod config;
pub mod error;
pub mod identity;
pub mod lang;
pub mod logging;
pub mod model;
pub mod outline;
pub mod path;
pub mod pipeline;
pub mod project;
pub mod query;
pub mod resolver;
pub mod scope;
pub mod store;

pub use error::{DefscopeError, LookupError, Result};
