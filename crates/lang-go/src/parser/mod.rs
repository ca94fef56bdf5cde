pub mod extract;
pub mod utils;

use defscope_core::{DefscopeError, Result};
use tree_sitter::{Language, Parser, Tree};

#[derive(Clone)]
pub struct GoParser {
    pub language: Language,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        // fail early on an ABI mismatch instead of once per file
        Parser::new()
            .set_language(&language)
            .map_err(|e| DefscopeError::Parsing(e.to_string()))?;
        Ok(Self { language })
    }

    /// A fresh parser. `tree_sitter::Parser` is not `Sync`, so each worker
    /// thread keeps its own.
    pub fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| DefscopeError::Parsing(e.to_string()))?;
        Ok(parser)
    }

    pub fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = self.parser()?;
        parse_with(&mut parser, source)
    }
}

pub fn parse_with(parser: &mut Parser, source: &str) -> Result<Tree> {
    parser
        .parse(source, None)
        .ok_or_else(|| DefscopeError::Parsing("tree-sitter returned no tree".into()))
}
