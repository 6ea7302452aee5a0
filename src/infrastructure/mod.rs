// Infrastructure adapters for virtime.

pub mod concurrency;
pub mod config;
pub mod printer;
pub mod project_loader;

use std::fs;
use std::path::Path;

use crate::application::pipeline::SourceUnit;
use crate::domain::diagnostics::RewriteError;
use crate::ports::{TreeEmitter, TreeLoader};

/// Reads a serialized [`SourceUnit`] as written by the external front end.
pub struct JsonTreeLoader;
impl TreeLoader for JsonTreeLoader {
    fn load(&self, path: &Path) -> Result<SourceUnit, RewriteError> {
        let content = fs::read_to_string(path).map_err(|e| RewriteError::parse(path, e))?;
        let mut unit: SourceUnit =
            serde_json::from_str(&content).map_err(|e| RewriteError::parse(path, e))?;
        if unit.source_map.filename.is_empty() {
            unit.source_map.filename = path.display().to_string();
        }
        if unit.source_map.lines.is_empty() {
            unit.source_map.lines.push(0);
        }
        if !unit.source_map.is_well_formed() {
            return Err(RewriteError::parse(
                path,
                "line table must start at 0 and be sorted",
            ));
        }
        Ok(unit)
    }
}

/// Writes the rewritten unit back in the interchange format.
pub struct JsonTreeEmitter;
impl TreeEmitter for JsonTreeEmitter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, unit: &SourceUnit) -> std::io::Result<String> {
        let mut out = serde_json::to_string_pretty(unit)?;
        out.push('\n');
        Ok(out)
    }
}

/// Prints the rewritten file as Go source.
pub struct GoSourceEmitter;
impl TreeEmitter for GoSourceEmitter {
    fn extension(&self) -> &'static str {
        "go"
    }

    fn render(&self, unit: &SourceUnit) -> std::io::Result<String> {
        Ok(printer::print_file(&unit.file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{Expr, File, Stmt};
    use crate::domain::source_map::SourceMap;
    use tempfile::tempdir;

    fn unit() -> SourceUnit {
        SourceUnit::new(
            SourceMap::new("main.go"),
            File::new("main").with_func("main", vec![Stmt::send(Expr::ident("ch"), Expr::int(1))]),
        )
    }

    #[test]
    fn test_json_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("main.json");
        JsonTreeEmitter.emit(&unit(), &path).unwrap();
        let loaded = JsonTreeLoader.load(&path).unwrap();
        assert_eq!(loaded, unit());
    }

    #[test]
    fn test_loader_reports_parse_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonTreeLoader.load(&path).unwrap_err();
        assert!(matches!(err, RewriteError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));

        let missing = JsonTreeLoader.load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, RewriteError::Parse { .. }));
    }

    #[test]
    fn test_loader_fills_missing_filename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anon.json");
        fs::write(
            &path,
            r#"{"source_map": {"filename": ""}, "file": {"package": {"name": "main"}}}"#,
        )
        .unwrap();
        let loaded = JsonTreeLoader.load(&path).unwrap();
        assert_eq!(loaded.source_map.filename, path.display().to_string());
    }

    #[test]
    fn test_loader_rejects_malformed_line_table() {
        let dir = tempdir().unwrap();
        for (name, lines) in [("late.json", "[10, 20]"), ("unsorted.json", "[0, 20, 10]")] {
            let path = dir.path().join(name);
            fs::write(
                &path,
                format!(
                    r#"{{"source_map": {{"filename": "main.go", "lines": {}}}, "file": {{"package": {{"name": "main"}}}}}}"#,
                    lines
                ),
            )
            .unwrap();
            let err = JsonTreeLoader.load(&path).unwrap_err();
            assert!(matches!(err, RewriteError::Parse { .. }), "{}", name);
            assert!(err.to_string().contains("line table"));
        }
    }

    #[test]
    fn test_go_emitter_writes_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.go");
        GoSourceEmitter.emit(&unit(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("package main\n"));
        assert!(text.contains("\tch <- 1\n"));
    }
}
