//! End-to-end indexing run.
//!
//! Walk → parallel extraction (bounded queue into the store) → whole-module
//! resolution → classification → scope fold.

use crate::classify::ReferenceClassifier;
use crate::config::IndexConfig;
use crate::error::{DefscopeError, Result};
use crate::lang::{DefinitionExtractor, ModuleAnalyzer, ModuleInfo, ResolveOptions, SourceText};
use crate::model::{Definition, ResolvedUse};
use crate::project::{ProjectFile, ProjectWalker, read_source};
use crate::scope::{ScopeEngine, ScopeReport};
use crate::store::DefinitionStore;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files: usize,
    pub definitions: usize,
    pub resolved_uses: usize,
    pub edges: usize,
    pub module_path: Option<String>,
    /// Set when the module pass failed; definitions are then file-scoped.
    pub module_error: Option<String>,
    pub scope: ScopeReport,
}

pub struct Indexer {
    root: PathBuf,
    config: IndexConfig,
    extractor: Arc<dyn DefinitionExtractor>,
    analyzer: Arc<dyn ModuleAnalyzer>,
    store: Arc<dyn DefinitionStore>,
}

impl Indexer {
    pub fn new(
        root: &Path,
        config: IndexConfig,
        extractor: Arc<dyn DefinitionExtractor>,
        analyzer: Arc<dyn ModuleAnalyzer>,
        store: Arc<dyn DefinitionStore>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            extractor,
            analyzer,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn DefinitionStore> {
        &self.store
    }

    /// Rebuilds the store from scratch.
    ///
    /// A module-load failure is logged and recorded in the report; the
    /// extracted definitions stay queryable at their file-local scopes.
    pub async fn run(&self) -> Result<IndexReport> {
        let started = Instant::now();
        self.store.clear();
        let walker = ProjectWalker::new(&self.root)?;

        let extractor = self.extractor.clone();
        let files = tokio::task::spawn_blocking(move || {
            walker.source_files(|p| extractor.supports_path(p))
        })
        .await
        .map_err(|e| DefscopeError::Internal(e.to_string()))?;
        tracing::info!("Found {} {} files", files.len(), self.extractor.language());

        let mut report = IndexReport {
            files: files.len(),
            ..IndexReport::default()
        };

        let sources = self.extract_all(files, &mut report).await?;
        tracing::info!(
            "Extracted {} definitions in {:?}",
            report.definitions,
            started.elapsed()
        );

        let resolve_started = Instant::now();
        let (module, resolved) = match self.resolve_module(sources).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    "Module resolution failed, definitions keep file-local scopes: {}",
                    e
                );
                report.module_error = Some(e.to_string());
                return Ok(report);
            }
        };
        report.module_path = Some(module.module_path.clone());
        report.resolved_uses = resolved.len();
        tracing::info!(
            "Resolved {} cross-file uses in {:?}",
            resolved.len(),
            resolve_started.elapsed()
        );

        let edges = ReferenceClassifier::new(module.module_path).classify_all(&resolved);
        report.edges = edges.len();
        self.store.insert_uses(edges.clone());

        let store = self.store.clone();
        report.scope =
            tokio::task::spawn_blocking(move || ScopeEngine::new(store.as_ref()).apply(&edges))
                .await
                .map_err(|e| DefscopeError::Internal(e.to_string()))?;

        tracing::info!("Indexing finished in {:?}", started.elapsed());
        Ok(report)
    }

    /// Parses files on the rayon pool and funnels their definitions through a
    /// bounded channel into the store. Returns the sources that were read.
    async fn extract_all(
        &self,
        files: Vec<ProjectFile>,
        report: &mut IndexReport,
    ) -> Result<Vec<SourceText>> {
        let (tx, mut rx) = mpsc::channel::<Vec<Definition>>(self.config.channel_capacity.max(1));
        let extractor = self.extractor.clone();

        let producer = tokio::task::spawn_blocking(move || {
            files
                .par_iter()
                .filter_map(|file| {
                    let source = read_source(file)?;
                    match extractor.extract(&source.rel_path, &source.text) {
                        Ok(defs) => {
                            if tx.blocking_send(defs).is_err() {
                                tracing::warn!("Definition queue closed early");
                            }
                        }
                        Err(e) => tracing::warn!("Failed to extract {}: {}", source.rel_path, e),
                    }
                    Some(source)
                })
                .collect::<Vec<SourceText>>()
        });

        let store = self.store.clone();
        let consumer = async move {
            let mut count = 0;
            while let Some(defs) = rx.recv().await {
                count += defs.len();
                store.insert_defs(defs);
            }
            count
        };

        let (sources, definitions) = tokio::join!(producer, consumer);
        report.definitions = definitions;
        sources.map_err(|e| DefscopeError::Internal(e.to_string()))
    }

    async fn resolve_module(&self, sources: Vec<SourceText>) -> Result<(ModuleInfo, Vec<ResolvedUse>)> {
        let analyzer = self.analyzer.clone();
        let root = self.root.clone();
        let options = ResolveOptions {
            include_tests: self.config.include_tests,
        };
        tokio::task::spawn_blocking(move || -> Result<(ModuleInfo, Vec<ResolvedUse>)> {
            let module = analyzer.load_module(&root)?;
            let resolved = analyzer.resolve_module(&module, &sources, options)?;
            Ok((module, resolved))
        })
        .await
        .map_err(|e| DefscopeError::Internal(e.to_string()))?
    }
}
