//! Folds usage edges into each target definition's minimal scope.

use crate::model::UsageEdge;
use crate::path;
use crate::resolver::{DefinitionResolver, Resolution};
use crate::store::DefinitionStore;
use rayon::prelude::*;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Widened,
    Unchanged,
    /// External target; scopes are never touched.
    Dependency,
    /// Using construct lives in the target's own file.
    SameFile,
    NotFound,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeReport {
    pub widened: usize,
    pub unchanged: usize,
    pub dependencies: usize,
    pub same_file: usize,
    pub not_found: usize,
    pub ambiguous: usize,
}

impl ScopeReport {
    fn record(mut self, outcome: EdgeOutcome) -> Self {
        match outcome {
            EdgeOutcome::Widened => self.widened += 1,
            EdgeOutcome::Unchanged => self.unchanged += 1,
            EdgeOutcome::Dependency => self.dependencies += 1,
            EdgeOutcome::SameFile => self.same_file += 1,
            EdgeOutcome::NotFound => self.not_found += 1,
            EdgeOutcome::Ambiguous => self.ambiguous += 1,
        }
        self
    }

    pub fn total(&self) -> usize {
        self.widened
            + self.unchanged
            + self.dependencies
            + self.same_file
            + self.not_found
            + self.ambiguous
    }
}

impl Add for ScopeReport {
    type Output = ScopeReport;

    fn add(self, rhs: Self) -> Self {
        ScopeReport {
            widened: self.widened + rhs.widened,
            unchanged: self.unchanged + rhs.unchanged,
            dependencies: self.dependencies + rhs.dependencies,
            same_file: self.same_file + rhs.same_file,
            not_found: self.not_found + rhs.not_found,
            ambiguous: self.ambiguous + rhs.ambiguous,
        }
    }
}

/// Widens `min_prefix` to the segment-wise common ancestor of its current
/// value and each using file's directory.
///
/// The fold is monotonic, commutative and idempotent, so edges may be applied
/// in parallel and in any order; the store serializes writes per definition.
pub struct ScopeEngine<'a> {
    store: &'a dyn DefinitionStore,
}

impl<'a> ScopeEngine<'a> {
    pub fn new(store: &'a dyn DefinitionStore) -> Self {
        Self { store }
    }

    pub fn apply_edge(&self, edge: &UsageEdge) -> EdgeOutcome {
        let Some(target) = edge.target().filter(|_| !edge.is_dependency) else {
            return EdgeOutcome::Dependency;
        };
        if target.file == edge.using_file {
            return EdgeOutcome::SameFile;
        }
        let def = match DefinitionResolver::new(self.store).resolve(&target) {
            Resolution::Found(def) => def,
            Resolution::NotFound => {
                tracing::debug!(
                    "Usage target not found: {} {} {:?} (from {})",
                    target.file,
                    target.identifier,
                    target.keywords,
                    edge.using_file
                );
                return EdgeOutcome::NotFound;
            }
            Resolution::Ambiguous(candidates) => {
                tracing::debug!(
                    "Usage target ambiguous: {} {} {:?} matches {} definitions",
                    target.file,
                    target.identifier,
                    target.keywords,
                    candidates.len()
                );
                return EdgeOutcome::Ambiguous;
            }
        };
        let using_dir = path::parent(&edge.using_file);
        match self.store.widen_min_prefix(def.id, &using_dir) {
            Ok(true) => EdgeOutcome::Widened,
            Ok(false) => EdgeOutcome::Unchanged,
            Err(e) => {
                tracing::warn!("Failed to widen scope of {}: {}", def.identifier, e);
                EdgeOutcome::NotFound
            }
        }
    }

    pub fn apply(&self, edges: &[UsageEdge]) -> ScopeReport {
        let report = edges
            .par_iter()
            .fold(ScopeReport::default, |acc, edge| {
                acc.record(self.apply_edge(edge))
            })
            .reduce(ScopeReport::default, |a, b| a + b);
        tracing::info!(
            "Scope fold: {} edges, {} widened, {} dependencies, {} unresolved, {} ambiguous",
            report.total(),
            report.widened,
            report.dependencies,
            report.not_found,
            report.ambiguous
        );
        report
    }
}
