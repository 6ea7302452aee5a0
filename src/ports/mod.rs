use std::path::Path;

use crate::application::pipeline::SourceUnit;
use crate::domain::diagnostics::RewriteError;

/// Front end: turns a file on disk into a tree plus position map.
pub trait TreeLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<SourceUnit, RewriteError>;
}

/// Serializes a rewritten tree.
pub trait TreeEmitter: Send + Sync {
    /// Extension of emitted files, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, unit: &SourceUnit) -> std::io::Result<String>;

    /// Renders `unit` and writes it to `path`, creating parent directories.
    fn emit(&self, unit: &SourceUnit, path: &Path) -> Result<(), RewriteError> {
        let content = self
            .render(unit)
            .map_err(|e| RewriteError::write(path, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RewriteError::write(path, e))?;
        }
        std::fs::write(path, content).map_err(|e| RewriteError::write(path, e))
    }
}
