use crate::error::LookupError;
use crate::model::{ConstructRef, Definition};
use crate::store::{DefFilter, DefinitionStore};

/// Result of matching a partial identity against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Definition),
    NotFound,
    /// Every candidate sharing the best keyword score.
    Ambiguous(Vec<Definition>),
}

impl Resolution {
    pub fn found(self) -> Option<Definition> {
        match self {
            Resolution::Found(def) => Some(def),
            _ => None,
        }
    }

    pub fn into_result(self, target: &ConstructRef) -> Result<Definition, LookupError> {
        match self {
            Resolution::Found(def) => Ok(def),
            Resolution::NotFound => Err(LookupError::NotFound {
                file: target.file.clone(),
                identifier: target.identifier.clone(),
            }),
            Resolution::Ambiguous(candidates) => Err(LookupError::Ambiguous {
                file: target.file.clone(),
                identifier: target.identifier.clone(),
                keywords: target.keywords.clone(),
                candidates,
            }),
        }
    }
}

/// Finds the stored definition a `(file, identifier, keywords)` triple denotes.
pub struct DefinitionResolver<'a> {
    store: &'a dyn DefinitionStore,
}

impl<'a> DefinitionResolver<'a> {
    pub fn new(store: &'a dyn DefinitionStore) -> Self {
        Self { store }
    }

    /// Candidates are all definitions with the same file and identifier; a
    /// lone candidate wins outright, otherwise the one holding the most of
    /// `keywords` wins. Ties are reported, never broken.
    pub fn resolve(&self, target: &ConstructRef) -> Resolution {
        let candidates = self.store.find_defs(
            &DefFilter::new()
                .file(target.file.clone())
                .identifier(target.identifier.clone()),
        );
        pick_best(candidates, &target.keywords)
    }
}

fn pick_best(mut candidates: Vec<Definition>, keywords: &[String]) -> Resolution {
    match candidates.len() {
        0 => return Resolution::NotFound,
        1 => return candidates.pop().map_or(Resolution::NotFound, Resolution::Found),
        _ => {}
    }
    let best = candidates
        .iter()
        .map(|d| d.keyword_score(keywords))
        .max()
        .unwrap_or(0);
    let mut winners: Vec<Definition> = candidates
        .into_iter()
        .filter(|d| d.keyword_score(keywords) == best)
        .collect();
    if winners.len() == 1 {
        winners.pop().map_or(Resolution::NotFound, Resolution::Found)
    } else {
        Resolution::Ambiguous(winners)
    }
}
