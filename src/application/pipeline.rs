//! Per-file composition of the rewriting passes.

use serde::{Deserialize, Serialize};

use crate::domain::ast::File;
use crate::domain::calls::rewrite_time_calls;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::hooks::Hooks;
use crate::domain::imports::{Facilities, ImportChanges, ImportManager, ImportUsage};
use crate::domain::rewrite::{rewrite_channel_ops, RewriteStats};
use crate::domain::source_map::SourceMap;

/// A parsed file together with its position map. This is the interchange
/// unit between the front end, the pipeline and the emitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub source_map: SourceMap,
    pub file: File,
}

impl SourceUnit {
    pub fn new(source_map: SourceMap, file: File) -> Self {
        Self { source_map, file }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOutcome {
    pub stats: RewriteStats,
    pub converted_calls: usize,
    /// Local name the virtual-time facility is bound to in this file.
    pub virtual_time: String,
    pub imports: ImportChanges,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub struct Pipeline {
    facilities: Facilities,
}

impl Pipeline {
    pub fn new(facilities: Facilities) -> Self {
        Self { facilities }
    }

    pub fn facilities(&self) -> &Facilities {
        &self.facilities
    }

    /// Plans local names, redirects time calls, instruments channel
    /// operations, then reconciles imports with what the tree references.
    pub fn rewrite(&self, unit: &mut SourceUnit) -> FileOutcome {
        let manager = ImportManager::new(&self.facilities);
        let plan = manager.plan(&unit.file);

        let calls = rewrite_time_calls(&mut unit.file, &plan.wall_clock, &plan.virtual_time);

        let hooks = Hooks::new(plan.virtual_time.clone());
        let channels = rewrite_channel_ops(&unit.source_map, &hooks, &mut unit.file);

        let usage = ImportUsage {
            needs_virtual_time: calls.converted > 0 || channels.stats.needs_virtual_time(),
            wall_clock_residual: calls.residual,
        };
        let imports = manager.apply(&mut unit.file, &plan, &usage);

        let diagnostics = match channels.diagnostics {
            Ok(()) => Vec::new(),
            Err(queue) => queue.into_iter().collect(),
        };

        FileOutcome {
            stats: channels.stats,
            converted_calls: calls.converted,
            virtual_time: plan.virtual_time,
            imports,
            diagnostics,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Facilities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{Expr, ImportSpec, Stmt};
    use crate::domain::imports::VIRTUAL_TIME_PATH;

    #[test]
    fn test_time_only_file_swaps_imports() {
        let file = File::new("main")
            .with_import(ImportSpec::new("time"))
            .with_func(
                "main",
                vec![Stmt::expr(Expr::qualified_call("time", "Sleep", vec![Expr::int(5)]))],
            );
        let mut unit = SourceUnit::new(SourceMap::new("main.go"), file);
        let outcome = Pipeline::default().rewrite(&mut unit);
        assert_eq!(outcome.converted_calls, 1);
        assert_eq!(outcome.stats.total(), 0);
        assert_eq!(unit.file.imports, vec![ImportSpec::new(VIRTUAL_TIME_PATH)]);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_untouched_file_keeps_imports() {
        let file = File::new("main")
            .with_import(ImportSpec::new("fmt"))
            .with_func(
                "main",
                vec![Stmt::expr(Expr::qualified_call("fmt", "Println", vec![]))],
            );
        let mut unit = SourceUnit::new(SourceMap::new("main.go"), file.clone());
        let outcome = Pipeline::default().rewrite(&mut unit);
        assert_eq!(unit.file, file);
        assert!(outcome.imports.is_empty());
    }
}
