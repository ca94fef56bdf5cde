use defscope_core::{DefscopeError, Result};
use std::path::Path;

pub const GO_MOD: &str = "go.mod";

/// Reads the `module` directive of `<root>/go.mod`.
pub fn read_module_path(root: &Path) -> Result<String> {
    let path = root.join(GO_MOD);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| DefscopeError::ModuleLoad(format!("{}: {}", path.display(), e)))?;
    parse_module_path(&text).ok_or_else(|| {
        DefscopeError::ModuleLoad(format!("{}: no module directive", path.display()))
    })
}

pub fn parse_module_path(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!module.is_empty()).then(|| module.to_string())
    })
}
