use super::usage::ConstructRef;
use serde::{Deserialize, Serialize};

/// What a resolved identifier denotes, as far as the module pass can tell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Package-level variable, with its declared type text when written out.
    Var { type_text: Option<String> },
    Const,
    /// An imported package name used as a qualifier.
    PackageName,
    TypeName,
    Func,
    Method { receiver: String },
    /// Struct field; never indexed as a definition.
    Field { owner: String },
}

/// The object a reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticObject {
    pub name: String,
    pub kind: ObjectKind,
    /// Import path of the package that declares the object.
    pub package_path: String,
}

impl SemanticObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind, package_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            package_path: package_path.into(),
        }
    }
}

/// Declaration site of an object inside the project, relative to the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: String,
    /// 1-based.
    pub line: usize,
    pub column: usize,
}

/// Raw output of the module pass: which construct used what, and where the
/// target lives. `position` is `None` for objects outside the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUse {
    pub site: ConstructRef,
    pub target: SemanticObject,
    pub position: Option<SourcePosition>,
}
