use crate::index::{canonical_root, load_or_build};
use anyhow::Context;
use defscope_core::outline::{OutlineBuilder, render_file_tree};
use defscope_core::project::ProjectWalker;
use std::path::PathBuf;

pub async fn run(path: PathBuf, open: Vec<String>, focus: Vec<String>) -> anyhow::Result<()> {
    let index = load_or_build(&path).await?;
    let walker = ProjectWalker::new(&index.root)?;
    let mut builder = OutlineBuilder::new(index.store.as_ref(), &walker, index.plugin.as_ref());
    for dir in &open {
        builder
            .open(dir)
            .with_context(|| format!("Cannot open {}", dir))?;
    }
    for rel in &focus {
        builder
            .focus(rel)
            .with_context(|| format!("Cannot focus {}", rel))?;
    }
    print!("{}", builder.render_overview());
    Ok(())
}

pub fn tree(path: PathBuf) -> anyhow::Result<()> {
    let walker = ProjectWalker::new(&canonical_root(&path)?)?;
    print!("{}", render_file_tree(&walker)?);
    Ok(())
}
