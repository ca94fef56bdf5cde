use crate::index::load_or_build;
use defscope_core::LookupError;
use defscope_core::callgraph::{render_references, render_uses};
use defscope_core::model::ConstructRef;
use defscope_core::project::ProjectWalker;
use defscope_core::query::QueryService;
use defscope_core::store::DefFilter;
use std::path::PathBuf;

/// Identifies a definition by where its content starts.
#[derive(clap::Args, Debug, Clone)]
pub struct DefLocation {
    #[arg(long)]
    pub file: String,

    #[arg(long)]
    pub identifier: String,

    /// 1-based line the definition starts on
    #[arg(long)]
    pub line: usize,
}

pub async fn find(
    path: PathBuf,
    file: Option<String>,
    identifier: Option<String>,
    keywords: Vec<String>,
) -> anyhow::Result<()> {
    let index = load_or_build(&path).await?;
    let walker = ProjectWalker::new(&index.root)?;
    let mut filter = DefFilter::new().keywords(keywords);
    if let Some(file) = file {
        filter = filter.file(file);
    }
    if let Some(identifier) = identifier {
        filter = filter.identifier(identifier);
    }
    let defs = QueryService::new(index.store.as_ref(), &walker).find_defs(&filter);
    println!("{}", serde_json::to_string_pretty(&defs)?);
    Ok(())
}

pub async fn def(
    path: PathBuf,
    file: String,
    identifier: String,
    keywords: Vec<String>,
) -> anyhow::Result<()> {
    let index = load_or_build(&path).await?;
    let walker = ProjectWalker::new(&index.root)?;
    let partial = ConstructRef::new(file, identifier, keywords);
    let def = QueryService::new(index.store.as_ref(), &walker)
        .find_one_def(&partial)
        .inspect_err(|e| {
            if let LookupError::Ambiguous { candidates, .. } = e {
                for candidate in candidates {
                    eprintln!(
                        "  {}:{} {}",
                        candidate.rel_file,
                        candidate.content.start_line,
                        candidate.label()
                    );
                }
            }
        })?;
    println!("{}", serde_json::to_string_pretty(&def)?);
    Ok(())
}

pub async fn refs(path: PathBuf, target: DefLocation) -> anyhow::Result<()> {
    let index = load_or_build(&path).await?;
    let walker = ProjectWalker::new(&index.root)?;
    let edges = QueryService::new(index.store.as_ref(), &walker).find_references(
        &target.file,
        &target.identifier,
        target.line,
    )?;
    print!("{}", render_references(index.store.as_ref(), &walker, &edges));
    Ok(())
}

pub async fn uses(path: PathBuf, target: DefLocation) -> anyhow::Result<()> {
    let index = load_or_build(&path).await?;
    let walker = ProjectWalker::new(&index.root)?;
    let edges = QueryService::new(index.store.as_ref(), &walker).find_uses(
        &target.file,
        &target.identifier,
        target.line,
    )?;
    print!("{}", render_uses(index.store.as_ref(), &walker, &edges));
    Ok(())
}
