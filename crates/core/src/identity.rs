//! Canonical `(file, identifier, keywords)` tagging.
//!
//! Both the syntactic extractor and the semantic classifier build keyword
//! tags through [`tag`], which is what lets the definition resolver match a
//! resolved reference back to the stored definition it denotes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefKind {
    Package,
    Import,
    Type,
    Function,
    Method,
    Var,
}

impl DefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::Package => "package",
            DefKind::Import => "import",
            DefKind::Type => "type",
            DefKind::Function => "function",
            DefKind::Method => "method",
            DefKind::Var => "var",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "package" => Some(DefKind::Package),
            "import" => Some(DefKind::Import),
            "type" => Some(DefKind::Type),
            "function" => Some(DefKind::Function),
            "method" => Some(DefKind::Method),
            "var" => Some(DefKind::Var),
            _ => None,
        }
    }

    /// Function-like kinds have a body excluded from their summary.
    pub fn has_body(&self) -> bool {
        matches!(self, DefKind::Function | DefKind::Method)
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the keyword sequence for a construct.
///
/// The kind discriminator always comes first. Imports carry only the
/// discriminator; a package clause carries its package name when given.
/// `qualifier` is the receiver type for methods and the declared type for
/// vars; it is ignored for other kinds.
pub fn tag(kind: DefKind, name: &str, qualifier: Option<&str>) -> Vec<String> {
    let mut keywords = vec![kind.as_str().to_string()];
    match kind {
        DefKind::Import => {}
        DefKind::Package => {
            if !name.is_empty() {
                keywords.push(name.to_string());
            }
        }
        DefKind::Type | DefKind::Function => keywords.push(name.to_string()),
        DefKind::Method | DefKind::Var => {
            keywords.push(name.to_string());
            if let Some(q) = qualifier.and_then(short_type_name) {
                keywords.push(q);
            }
        }
    }
    keywords
}

/// Reduces a type expression to the bare name used as a disambiguating tag.
///
/// `*pkg.Foo` → `Foo`, `[]Bar` → `Bar`, `Box[T]` → `Box`, `map[string]int` → `int`.
pub fn short_type_name(type_text: &str) -> Option<String> {
    let mut text = type_text.trim();
    if text.ends_with(']') {
        if let Some(open) = matching_open_bracket(text) {
            let head = text[..open].trim_end();
            // `[]T` / `[N]T` put the brackets in front, so only strip a trailing
            // group that follows a name.
            if head.ends_with(is_ident_char) {
                text = head;
            }
        }
    }
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let name = &text[start..];
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name.to_string())
}

fn matching_open_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices().rev() {
        match c {
            ']' => depth += 1,
            '[' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
