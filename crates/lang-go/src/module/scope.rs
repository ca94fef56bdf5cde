use super::symbols::TypeRef;
use std::collections::HashMap;

/// What a local name denotes inside a function or type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalBinding {
    /// Parameter, result, receiver or block variable/constant, with its type
    /// when syntactically evident.
    Value(Option<TypeRef>),
    /// Type parameter or block-local type.
    Type,
}

/// Lexical scopes that shadow package-level names.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, LocalBinding>>,
}

impl ScopeStack {
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Binds in the innermost frame. `_` never binds.
    pub fn bind(&mut self, name: &str, binding: LocalBinding) {
        if name == "_" {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), binding);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&LocalBinding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
