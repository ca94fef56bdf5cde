use serde::{Deserialize, Serialize};

/// Partial identity of a construct: enough to look it up, not necessarily
/// enough to pick it out uniquely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructRef {
    pub file: String,
    pub identifier: String,
    pub keywords: Vec<String>,
}

impl ConstructRef {
    pub fn new(file: impl Into<String>, identifier: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            file: file.into(),
            identifier: identifier.into(),
            keywords,
        }
    }
}

/// A cross-file reference from one top-level construct to another, or to a
/// package outside the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEdge {
    pub using_file: String,
    pub using_identifier: String,
    pub using_keywords: Vec<String>,
    /// Absent for dependency targets.
    pub target_file: Option<String>,
    pub target_identifier: String,
    pub target_keywords: Vec<String>,
    pub is_dependency: bool,
    /// Import path of the external package when `is_dependency` is set.
    pub dependency_path: Option<String>,
}

impl UsageEdge {
    pub fn internal(using: ConstructRef, target: ConstructRef) -> Self {
        Self {
            using_file: using.file,
            using_identifier: using.identifier,
            using_keywords: using.keywords,
            target_file: Some(target.file),
            target_identifier: target.identifier,
            target_keywords: target.keywords,
            is_dependency: false,
            dependency_path: None,
        }
    }

    pub fn dependency(
        using: ConstructRef,
        package_path: impl Into<String>,
        target_identifier: impl Into<String>,
        target_keywords: Vec<String>,
    ) -> Self {
        Self {
            using_file: using.file,
            using_identifier: using.identifier,
            using_keywords: using.keywords,
            target_file: None,
            target_identifier: target_identifier.into(),
            target_keywords,
            is_dependency: true,
            dependency_path: Some(package_path.into()),
        }
    }

    pub fn using(&self) -> ConstructRef {
        ConstructRef::new(
            self.using_file.clone(),
            self.using_identifier.clone(),
            self.using_keywords.clone(),
        )
    }

    /// Target identity, `None` for dependency edges.
    pub fn target(&self) -> Option<ConstructRef> {
        self.target_file.as_ref().map(|file| {
            ConstructRef::new(
                file.clone(),
                self.target_identifier.clone(),
                self.target_keywords.clone(),
            )
        })
    }
}
