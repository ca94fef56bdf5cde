//! Seams between the language-neutral pipeline and language support crates.

use crate::error::Result;
use crate::model::{Definition, ResolvedUse};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One project file's text, keyed by its root-relative path.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub rel_path: String,
    pub text: Arc<str>,
}

impl SourceText {
    pub fn new(rel_path: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            text: text.into(),
        }
    }
}

/// Per-file syntactic pass. Implementations are pure and run on many
/// threads at once.
pub trait DefinitionExtractor: Send + Sync {
    fn language(&self) -> &'static str;

    fn supports_path(&self, path: &Path) -> bool;

    /// Top-level definitions of one file, with `rel_file` set and scopes at
    /// their file-local default.
    fn extract(&self, rel_file: &str, source: &str) -> Result<Vec<Definition>>;
}

/// Identity of the module being indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub root: PathBuf,
    /// Import path prefix owned by the project.
    pub module_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Treat test sources as reference sites.
    pub include_tests: bool,
}

/// Whole-module semantic pass.
///
/// Resolution needs every file's symbols at once, so it cannot be split per
/// file. A failure here is fatal for the pass only.
pub trait ModuleAnalyzer: Send + Sync {
    fn load_module(&self, root: &Path) -> Result<ModuleInfo>;

    /// Cross-file uses, de-duplicated per using construct.
    fn resolve_module(
        &self,
        module: &ModuleInfo,
        files: &[SourceText],
        options: ResolveOptions,
    ) -> Result<Vec<ResolvedUse>>;
}
