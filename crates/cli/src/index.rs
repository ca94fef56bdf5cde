use anyhow::Context;
use defscope_core::config::IndexConfig;
use defscope_core::pipeline::{IndexReport, Indexer};
use defscope_core::store::{DefinitionStore, MemoryStore, Snapshot};
use defscope_go::GoPlugin;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const DEBUG_DUMP: &str = "defscope_debug.json";

/// A ready-to-query index for one project.
pub struct LoadedIndex {
    pub root: PathBuf,
    pub store: Arc<MemoryStore>,
    pub plugin: Arc<GoPlugin>,
}

pub async fn run(path: PathBuf, debug: bool) -> anyhow::Result<()> {
    let root = canonical_root(&path)?;
    let config = IndexConfig::load(&root)?;
    let plugin = Arc::new(GoPlugin::new()?);

    info!("Indexing project at: {}...", root.display());
    let (store, report) = build(&root, &config, plugin).await?;
    let snapshot = Snapshot::capture(store.as_ref(), report.module_path.clone());
    snapshot.save(&config.index_path(&root))?;
    if debug {
        let dump = root.join(DEBUG_DUMP);
        snapshot.save_to_json(&dump)?;
        info!("Wrote debug dump to {}", dump.display());
    }

    println!("Indexed {}", root.display());
    println!("  module:      {}", report.module_path.as_deref().unwrap_or("-"));
    println!("  files:       {}", report.files);
    println!("  definitions: {}", report.definitions);
    println!("  uses:        {} ({} resolved)", report.edges, report.resolved_uses);
    println!(
        "  scopes:      {} widened, {} unresolved, {} ambiguous",
        report.scope.widened, report.scope.not_found, report.scope.ambiguous
    );
    if let Some(error) = &report.module_error {
        println!("  warning: module pass failed, scopes are file-local: {}", error);
    }
    Ok(())
}

/// Loads the saved snapshot, building and saving one when none is usable.
pub async fn load_or_build(path: &Path) -> anyhow::Result<LoadedIndex> {
    let root = canonical_root(path)?;
    let config = IndexConfig::load(&root)?;
    let plugin = Arc::new(GoPlugin::new()?);
    let index_path = config.index_path(&root);

    let store = match Snapshot::load(&index_path)? {
        Some(snapshot) => Arc::new(snapshot.into_store()),
        None => {
            info!("No usable index for {}, building one", root.display());
            let (store, report) = build(&root, &config, plugin.clone()).await?;
            Snapshot::capture(store.as_ref(), report.module_path).save(&index_path)?;
            store
        }
    };
    info!(
        "Index ready: {} definitions, {} uses",
        store.def_count(),
        store.use_count()
    );
    Ok(LoadedIndex {
        root,
        store,
        plugin,
    })
}

async fn build(
    root: &Path,
    config: &IndexConfig,
    plugin: Arc<GoPlugin>,
) -> anyhow::Result<(Arc<MemoryStore>, IndexReport)> {
    let store = Arc::new(MemoryStore::new());
    let indexer = Indexer::new(
        root,
        config.clone(),
        plugin.clone(),
        plugin,
        store.clone(),
    );
    let report = indexer.run().await?;
    Ok((store, report))
}

pub fn canonical_root(path: &Path) -> anyhow::Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Project path {} is not accessible", path.display()))
}
