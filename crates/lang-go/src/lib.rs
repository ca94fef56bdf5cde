//! Go language support: a tree-sitter extractor for top-level constructs and
//! a whole-module reference resolver.

pub mod module;
pub mod parser;

use defscope_core::Result;
use defscope_core::lang::{
    DefinitionExtractor, ModuleAnalyzer, ModuleInfo, ResolveOptions, SourceText,
};
use defscope_core::model::{Definition, ResolvedUse};
use parser::GoParser;
use std::path::Path;

#[derive(Clone)]
pub struct GoPlugin {
    parser: GoParser,
}

impl GoPlugin {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: GoParser::new()?,
        })
    }

    pub fn parser(&self) -> &GoParser {
        &self.parser
    }
}

impl DefinitionExtractor for GoPlugin {
    fn language(&self) -> &'static str {
        "go"
    }

    fn supports_path(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "go")
    }

    fn extract(&self, rel_file: &str, source: &str) -> Result<Vec<Definition>> {
        let tree = self.parser.parse(source)?;
        if tree.root_node().has_error() {
            tracing::debug!("{} has syntax errors, keeping recovered nodes", rel_file);
        }
        Ok(parser::extract::extract_definitions(&tree, rel_file, source))
    }
}

impl ModuleAnalyzer for GoPlugin {
    fn load_module(&self, root: &Path) -> Result<ModuleInfo> {
        let module_path = module::gomod::read_module_path(root)?;
        tracing::info!("Loaded module {}", module_path);
        Ok(ModuleInfo {
            root: root.to_path_buf(),
            module_path,
        })
    }

    fn resolve_module(
        &self,
        module: &ModuleInfo,
        files: &[SourceText],
        options: ResolveOptions,
    ) -> Result<Vec<ResolvedUse>> {
        module::resolve_module(&self.parser, module, files, options)
    }
}
