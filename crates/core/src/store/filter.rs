use crate::model::{Definition, UsageEdge};
use serde::{Deserialize, Serialize};

/// Conjunction of optional predicates over stored definitions.
///
/// Keywords must all be present, in any order. An empty filter matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefFilter {
    pub rel_file: Option<String>,
    pub identifier: Option<String>,
    pub keywords: Vec<String>,
    /// Matches `content.start_line`.
    pub start_line: Option<usize>,
}

impl DefFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, rel_file: impl Into<String>) -> Self {
        self.rel_file = Some(rel_file.into());
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn start_line(mut self, line: usize) -> Self {
        self.start_line = Some(line);
        self
    }

    pub fn matches(&self, def: &Definition) -> bool {
        self.rel_file.as_ref().is_none_or(|f| *f == def.rel_file)
            && self.identifier.as_ref().is_none_or(|i| *i == def.identifier)
            && self.start_line.is_none_or(|l| l == def.content.start_line)
            && def.has_all_keywords(&self.keywords)
    }
}

/// Which end of an edge a [`UseFilter`] inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseSide {
    #[default]
    Target,
    Using,
}

/// Same shape as [`DefFilter`], applied to one side of each usage edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseFilter {
    pub side: UseSide,
    pub file: Option<String>,
    pub identifier: Option<String>,
    pub keywords: Vec<String>,
    pub is_dependency: Option<bool>,
}

impl UseFilter {
    pub fn target() -> Self {
        Self::default()
    }

    pub fn using() -> Self {
        Self {
            side: UseSide::Using,
            ..Self::default()
        }
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn dependency(mut self, is_dependency: bool) -> Self {
        self.is_dependency = Some(is_dependency);
        self
    }

    pub fn matches(&self, edge: &UsageEdge) -> bool {
        let (file, identifier, keywords) = match self.side {
            UseSide::Target => (
                edge.target_file.as_deref(),
                edge.target_identifier.as_str(),
                &edge.target_keywords,
            ),
            UseSide::Using => (
                Some(edge.using_file.as_str()),
                edge.using_identifier.as_str(),
                &edge.using_keywords,
            ),
        };
        self.file.as_deref().is_none_or(|f| Some(f) == file)
            && self.identifier.as_deref().is_none_or(|i| i == identifier)
            && self.is_dependency.is_none_or(|d| d == edge.is_dependency)
            && self.keywords.iter().all(|k| keywords.contains(k))
    }
}
