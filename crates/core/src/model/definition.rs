use crate::identity::DefKind;
use crate::path;
use serde::{Deserialize, Serialize};

pub type DefId = u64;

/// Span of source text.
///
/// Lines are 1-based with `end_line` exclusive, so two blocks are adjacent
/// when one's `end_line` equals the other's `start_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentRange {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl ContentRange {
    pub fn new(start_line: usize, end_line: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_byte,
            end_byte,
        }
    }

    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start_byte..self.end_byte)
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

/// One top-level construct declared in a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Assigned by the store on insert.
    pub id: DefId,
    pub rel_file: String,
    pub identifier: String,
    pub keywords: Vec<String>,
    pub summary: ContentRange,
    pub content: ContentRange,
    /// Smallest path containing the declaration and every external use.
    /// Starts as `rel_file` and only ever widens.
    pub min_prefix: String,
}

impl Definition {
    pub fn new(
        rel_file: impl Into<String>,
        identifier: impl Into<String>,
        keywords: Vec<String>,
        summary: ContentRange,
        content: ContentRange,
    ) -> Self {
        let rel_file = path::normalize(&rel_file.into());
        Self {
            id: 0,
            min_prefix: rel_file.clone(),
            rel_file,
            identifier: identifier.into(),
            keywords,
            summary,
            content,
        }
    }

    pub fn kind(&self) -> Option<DefKind> {
        self.keywords.first().and_then(|k| DefKind::parse(k))
    }

    /// Number of `wanted` keywords present in this definition's tags.
    pub fn keyword_score(&self, wanted: &[String]) -> usize {
        wanted.iter().filter(|k| self.keywords.contains(k)).count()
    }

    pub fn has_all_keywords(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|k| self.keywords.contains(k))
    }

    /// True when this definition is declared under `node` but used outside it.
    pub fn escapes(&self, node: &str) -> bool {
        path::is_within(&self.rel_file, node) && !path::is_within(&self.min_prefix, node)
    }

    /// Keyword tags after the discriminator, joined for display (`Close Reader`).
    pub fn label(&self) -> String {
        self.keywords
            .iter()
            .skip(1)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DefKind, tag};

    fn def(file: &str, name: &str) -> Definition {
        Definition::new(
            file,
            name,
            tag(DefKind::Function, name, None),
            ContentRange::new(1, 2, 0, 10),
            ContentRange::new(1, 4, 0, 30),
        )
    }

    #[test]
    fn test_new_definition_is_file_scoped() {
        let d = def("./a/x.go", "Foo");
        assert_eq!(d.rel_file, "a/x.go");
        assert_eq!(d.min_prefix, "a/x.go");
        assert_eq!(d.kind(), Some(DefKind::Function));
    }

    #[test]
    fn test_escapes_checks_both_ends() {
        let mut d = def("a/b/x.go", "Foo");
        assert!(!d.escapes("a"));
        assert!(!d.escapes("a/b/x.go"));

        d.min_prefix = "a/b".into();
        assert!(d.escapes("a/b/x.go"));
        assert!(!d.escapes("a/b"));
        assert!(!d.escapes("a"));

        d.min_prefix = ".".into();
        assert!(d.escapes("a"));
        assert!(!d.escapes("."));
        // not declared under the node at all
        assert!(!d.escapes("c"));
    }

    #[test]
    fn test_keyword_score_ignores_order() {
        let d = Definition::new(
            "a/x.go",
            "Close",
            tag(DefKind::Method, "Close", Some("*Reader")),
            ContentRange::default(),
            ContentRange::default(),
        );
        let wanted = vec!["Reader".to_string(), "method".to_string()];
        assert_eq!(d.keyword_score(&wanted), 2);
        assert!(d.has_all_keywords(&wanted));
        assert_eq!(d.label(), "Close Reader");
    }
}
