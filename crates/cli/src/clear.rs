use crate::index::canonical_root;
use defscope_core::config::{IndexConfig, base_index_dir};
use std::path::PathBuf;
use tracing::info;

pub fn run(path: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = path {
        let root = canonical_root(&path)?;
        let index_path = IndexConfig::load(&root)?.index_path(&root);
        info!("Clearing index for project at: {}...", root.display());
        if index_path.exists() {
            std::fs::remove_file(&index_path)?;
            println!("Removed {}", index_path.display());
        } else {
            println!("No index for {}", root.display());
        }
    } else {
        let dir = base_index_dir();
        info!("Clearing all indices at: {}...", dir.display());
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        println!("All indices cleared.");
    }
    Ok(())
}
