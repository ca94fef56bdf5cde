use crate::identity::{self, DefKind};
use crate::model::{ConstructRef, ObjectKind, ResolvedUse, UsageEdge};
use std::collections::HashSet;

/// True when `package_path` belongs to the module rooted at `module_path`.
///
/// Segment-aware: `example.com/app` does not own `example.com/apps`.
pub fn is_internal_package(package_path: &str, module_path: &str) -> bool {
    package_path == module_path
        || package_path
            .strip_prefix(module_path)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Turns raw resolutions into usage edges tagged with the shared identity
/// scheme.
#[derive(Debug, Clone)]
pub struct ReferenceClassifier {
    module_path: String,
}

impl ReferenceClassifier {
    pub fn new(module_path: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
        }
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// `None` for targets that are never indexed (fields, constants,
    /// package names) and for same-file targets.
    pub fn classify(&self, resolved: &ResolvedUse) -> Option<UsageEdge> {
        let target = &resolved.target;
        let keywords = match &target.kind {
            ObjectKind::Var { type_text } => {
                identity::tag(DefKind::Var, &target.name, type_text.as_deref())
            }
            ObjectKind::TypeName => identity::tag(DefKind::Type, &target.name, None),
            ObjectKind::Func => identity::tag(DefKind::Function, &target.name, None),
            ObjectKind::Method { receiver } => {
                identity::tag(DefKind::Method, &target.name, Some(receiver))
            }
            ObjectKind::Field { .. } | ObjectKind::Const | ObjectKind::PackageName => {
                return None;
            }
        };

        if !is_internal_package(&target.package_path, &self.module_path) {
            return Some(UsageEdge::dependency(
                resolved.site.clone(),
                target.package_path.clone(),
                target.name.clone(),
                keywords,
            ));
        }

        let Some(position) = &resolved.position else {
            tracing::debug!(
                "Internal target {}.{} has no declaration position, skipping",
                target.package_path,
                target.name
            );
            return None;
        };
        if position.file == resolved.site.file {
            return None;
        }
        Some(UsageEdge::internal(
            resolved.site.clone(),
            ConstructRef::new(position.file.clone(), target.name.clone(), keywords),
        ))
    }

    /// Classifies every resolution, keeping the first occurrence of each edge.
    pub fn classify_all(&self, resolved: &[ResolvedUse]) -> Vec<UsageEdge> {
        let mut seen = HashSet::new();
        resolved
            .iter()
            .filter_map(|r| self.classify(r))
            .filter(|edge| seen.insert(edge.clone()))
            .collect()
    }
}
