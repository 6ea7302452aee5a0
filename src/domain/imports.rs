//! Import bookkeeping around a rewrite.
//!
//! [`ImportManager::plan`] runs before any tree mutation and decides which
//! local names the rewrite goes through. [`ImportManager::apply`] runs after
//! it and edits the import list to match what the tree now references.

use std::collections::BTreeSet;

use crate::domain::ast::{Decl, Expr, ExprKind, File, ImportSpec, Stmt, StmtKind, TypeExpr};
use crate::domain::visit::{walk_decl, walk_expr, walk_stmt, Visitor};

pub const VIRTUAL_TIME_PATH: &str = "github.com/petar/vitamix/vtime";
pub const WALL_CLOCK_PATH: &str = "time";

/// An importable module: its path and the local name it is bound to by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub path: String,
    pub name: String,
}

impl Facility {
    /// `name` falls back to the last segment of `path`.
    pub fn new(path: impl Into<String>, name: Option<String>) -> Self {
        let path = path.into();
        let name = name.unwrap_or_else(|| last_segment(&path).to_string());
        Self { path, name }
    }

    fn import_binds(&self, import: &ImportSpec) -> bool {
        import.path == self.path && import.binds_qualifier()
    }

    /// Qualifier an import of this facility binds: its alias, else the
    /// facility's package name.
    pub fn local_name<'s>(&'s self, import: &'s ImportSpec) -> &'s str {
        import.name.as_deref().unwrap_or(&self.name)
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facilities {
    pub virtual_time: Facility,
    pub wall_clock: Facility,
}

impl Default for Facilities {
    fn default() -> Self {
        Self {
            virtual_time: Facility::new(VIRTUAL_TIME_PATH, None),
            wall_clock: Facility::new(WALL_CLOCK_PATH, None),
        }
    }
}

/// Local names chosen before rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    /// Local names bound to the wall-clock facility.
    pub wall_clock: BTreeSet<String>,
    /// Local name the virtual-time facility is (or will be) bound to.
    pub virtual_time: String,
    /// Whether the file already imports the virtual-time facility.
    pub has_virtual_time: bool,
}

/// What the rewrite passes report back to [`ImportManager::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportUsage {
    pub needs_virtual_time: bool,
    /// Wall-clock qualifiers still referenced through selectors.
    pub wall_clock_residual: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportChanges {
    pub added: Option<ImportSpec>,
    pub removed: Vec<ImportSpec>,
}

impl ImportChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_none() && self.removed.is_empty()
    }
}

pub struct ImportManager<'a> {
    facilities: &'a Facilities,
}

impl<'a> ImportManager<'a> {
    pub fn new(facilities: &'a Facilities) -> Self {
        Self { facilities }
    }

    pub fn plan(&self, file: &File) -> ImportPlan {
        let wall_clock = file
            .imports
            .iter()
            .filter(|import| self.facilities.wall_clock.import_binds(import))
            .map(|import| self.facilities.wall_clock.local_name(import).to_string())
            .collect();

        let existing = file
            .imports
            .iter()
            .find(|import| self.facilities.virtual_time.import_binds(import));

        let (virtual_time, has_virtual_time) = match existing {
            Some(import) => (self.facilities.virtual_time.local_name(import).to_string(), true),
            None => (self.free_name(file), false),
        };

        ImportPlan {
            wall_clock,
            virtual_time,
            has_virtual_time,
        }
    }

    /// Default virtual-time name, or the first `nameN` no identifier in the file uses.
    fn free_name(&self, file: &File) -> String {
        let mut taken = declared_names(file);
        for import in &file.imports {
            for facility in [&self.facilities.wall_clock, &self.facilities.virtual_time] {
                if facility.import_binds(import) {
                    taken.insert(facility.local_name(import).to_string());
                }
            }
        }
        let base = &self.facilities.virtual_time.name;
        if !taken.contains(base) {
            return base.clone();
        }
        (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| base.clone())
    }

    pub fn apply(&self, file: &mut File, plan: &ImportPlan, usage: &ImportUsage) -> ImportChanges {
        let mut changes = ImportChanges::default();

        if usage.needs_virtual_time && !plan.has_virtual_time {
            let facility = &self.facilities.virtual_time;
            let path = &facility.path;
            let import = if plan.virtual_time == facility.name {
                ImportSpec::new(path.clone())
            } else {
                ImportSpec::aliased(plan.virtual_time.clone(), path.clone())
            };
            tracing::debug!("adding import {:?} as {}", import.path, plan.virtual_time);
            file.imports.push(import.clone());
            changes.added = Some(import);
        }

        let scan = QualifierScan::of(file);
        let facilities = self.facilities;
        let mut removed = Vec::new();
        file.imports.retain(|import| {
            let keep = if facilities.wall_clock.import_binds(import) {
                let qualifier = facilities.wall_clock.local_name(import);
                usage.wall_clock_residual.contains(qualifier) || scan.in_types(qualifier)
            } else if facilities.virtual_time.import_binds(import) {
                scan.references(facilities.virtual_time.local_name(import))
            } else {
                true
            };
            if !keep {
                removed.push(import.clone());
            }
            keep
        });
        for import in &removed {
            tracing::debug!("removing unused import {:?}", import.path);
        }
        changes.removed = removed;
        changes
    }
}

/// Qualifiers referenced in a file, through selector expressions or
/// qualified names inside type text.
#[derive(Debug, Default)]
pub struct QualifierScan {
    selectors: BTreeSet<String>,
    types: BTreeSet<String>,
}

impl QualifierScan {
    pub fn of(file: &File) -> Self {
        let mut scan = Self::default();
        scan.visit_file(file);
        scan
    }

    pub fn references(&self, qualifier: &str) -> bool {
        self.selectors.contains(qualifier) || self.in_types(qualifier)
    }

    pub fn in_types(&self, qualifier: &str) -> bool {
        self.types.contains(qualifier)
    }
}

impl Visitor for QualifierScan {
    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Selector { x, .. } = &expr.kind {
            if let ExprKind::Ident(name) = &x.kind {
                self.selectors.insert(name.clone());
            }
        }
        walk_expr(self, expr);
    }

    fn visit_type(&mut self, typ: &TypeExpr) {
        for word in type_words(&typ.0) {
            if let Some((qualifier, _)) = word.split_once('.') {
                self.types.insert(qualifier.to_string());
            }
        }
    }
}

/// Identifier-like runs of a type text, qualified names kept whole.
fn type_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .filter(|word| !word.is_empty())
}

/// Every name the file declares or mentions, import names included.
pub fn declared_names(file: &File) -> BTreeSet<String> {
    let mut collector = NameCollector::default();
    collector.names.insert(file.package.name.clone());
    for import in &file.imports {
        collector.names.insert(import.local_name().to_string());
    }
    collector.visit_file(file);
    collector.names
}

#[derive(Default)]
struct NameCollector {
    names: BTreeSet<String>,
}

impl Visitor for NameCollector {
    fn visit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => {
                self.names.insert(func.name.name.clone());
                let fields = func.recv.iter().chain(&func.sig.params).chain(&func.sig.results);
                for field in fields {
                    self.names.extend(field.names.iter().map(|n| n.name.clone()));
                }
            }
            Decl::Var(specs) | Decl::Const(specs) => {
                for spec in specs {
                    self.names.extend(spec.names.iter().map(|n| n.name.clone()));
                }
            }
            Decl::Type(spec) => {
                self.names.insert(spec.name.name.clone());
            }
        }
        walk_decl(self, decl);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var(specs) => {
                for spec in specs {
                    self.names.extend(spec.names.iter().map(|n| n.name.clone()));
                }
            }
            StmtKind::Labeled { label, .. } => {
                self.names.insert(label.name.clone());
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => {
                self.names.insert(name.clone());
            }
            ExprKind::FuncLit(lit) => {
                for field in lit.sig.params.iter().chain(&lit.sig.results) {
                    self.names.extend(field.names.iter().map(|n| n.name.clone()));
                }
            }
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_type(&mut self, typ: &TypeExpr) {
        for word in type_words(&typ.0) {
            self.names
                .extend(word.split('.').filter(|s| !s.is_empty()).map(str::to_string));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{Field, FuncDecl, Ident, Pos, Signature, ValueSpec};

    fn manager_plan(file: &File) -> ImportPlan {
        ImportManager::new(&Facilities::default()).plan(file)
    }

    fn paths(file: &File) -> Vec<&str> {
        file.imports.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_plan_collects_wall_clock_aliases() {
        let file = File::new("main")
            .with_import(ImportSpec::new("time"))
            .with_import(ImportSpec::aliased("clock", "time"))
            .with_import(ImportSpec::aliased("_", "time"));
        let plan = manager_plan(&file);
        let expected: BTreeSet<String> = ["clock", "time"].iter().map(|s| s.to_string()).collect();
        assert_eq!(plan.wall_clock, expected);
        assert_eq!(plan.virtual_time, "vtime");
        assert!(!plan.has_virtual_time);
    }

    #[test]
    fn test_plan_reuses_existing_virtual_time_import() {
        let file = File::new("main").with_import(ImportSpec::aliased("vt", VIRTUAL_TIME_PATH));
        let plan = manager_plan(&file);
        assert_eq!(plan.virtual_time, "vt");
        assert!(plan.has_virtual_time);
    }

    #[test]
    fn test_plan_avoids_clashing_names() {
        let file = File::new("main").with_func(
            "main",
            vec![Stmt::define(vec![Expr::ident("vtime")], vec![Expr::int(1)])],
        );
        assert_eq!(manager_plan(&file).virtual_time, "vtime1");

        let file = File::new("main")
            .with_import(ImportSpec::aliased("vtime", "example.com/other"))
            .with_func("vtime1", vec![]);
        assert_eq!(manager_plan(&file).virtual_time, "vtime2");
    }

    #[test]
    fn test_declared_names_cover_params_and_types() {
        let mut file = File::new("main");
        file.decls.push(Decl::Func(FuncDecl {
            pos: Pos::NONE,
            name: Ident::new("run"),
            recv: None,
            sig: Signature {
                params: vec![Field {
                    names: vec![Ident::new("limit")],
                    typ: TypeExpr::new("pkg.Duration"),
                }],
                results: vec![],
            },
            body: None,
        }));
        let names = declared_names(&file);
        for name in ["main", "run", "limit", "pkg", "Duration"] {
            assert!(names.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_apply_adds_import_and_drops_unused_wall_clock() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main")
            .with_import(ImportSpec::new("fmt"))
            .with_import(ImportSpec::new("time"))
            .with_func("main", vec![Stmt::expr(Expr::qualified_call("vtime", "Block", vec![]))]);
        let plan = manager.plan(&file);
        let usage = ImportUsage {
            needs_virtual_time: true,
            ..Default::default()
        };
        let changes = manager.apply(&mut file, &plan, &usage);
        assert_eq!(paths(&file), vec!["fmt", VIRTUAL_TIME_PATH]);
        assert_eq!(file.imports[1].name, None);
        assert_eq!(changes.added, Some(ImportSpec::new(VIRTUAL_TIME_PATH)));
        assert_eq!(changes.removed, vec![ImportSpec::new("time")]);
    }

    #[test]
    fn test_apply_aliases_clash_free_name() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main").with_func(
            "main",
            vec![
                Stmt::define(vec![Expr::ident("vtime")], vec![Expr::int(1)]),
                Stmt::expr(Expr::qualified_call("vtime1", "Go", vec![])),
            ],
        );
        let plan = ImportPlan {
            wall_clock: BTreeSet::new(),
            virtual_time: "vtime1".to_string(),
            has_virtual_time: false,
        };
        let usage = ImportUsage {
            needs_virtual_time: true,
            ..Default::default()
        };
        manager.apply(&mut file, &plan, &usage);
        assert_eq!(file.imports, vec![ImportSpec::aliased("vtime1", VIRTUAL_TIME_PATH)]);
    }

    #[test]
    fn test_apply_keeps_wall_clock_with_residual_or_type_references() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);

        let mut file = File::new("main").with_import(ImportSpec::new("time"));
        let plan = manager.plan(&file);
        let usage = ImportUsage {
            needs_virtual_time: false,
            wall_clock_residual: ["time".to_string()].into_iter().collect(),
        };
        assert!(manager.apply(&mut file, &plan, &usage).is_empty());
        assert_eq!(paths(&file), vec!["time"]);

        let mut file = File::new("main").with_import(ImportSpec::new("time"));
        file.decls.push(Decl::Var(vec![ValueSpec {
            pos: Pos::NONE,
            names: vec![Ident::new("timeout")],
            typ: Some(TypeExpr::new("time.Duration")),
            values: vec![],
        }]));
        let plan = manager.plan(&file);
        manager.apply(&mut file, &plan, &ImportUsage::default());
        assert_eq!(paths(&file), vec!["time"]);
    }

    #[test]
    fn test_apply_never_removes_dot_or_blank_imports() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main")
            .with_import(ImportSpec::aliased(".", "time"))
            .with_import(ImportSpec::aliased("_", VIRTUAL_TIME_PATH));
        let before = file.imports.clone();
        let plan = manager.plan(&file);
        manager.apply(&mut file, &plan, &ImportUsage::default());
        assert_eq!(file.imports, before);
    }

    #[test]
    fn test_apply_removes_unreferenced_virtual_time_import() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main").with_import(ImportSpec::new(VIRTUAL_TIME_PATH));
        let plan = manager.plan(&file);
        let changes = manager.apply(&mut file, &plan, &ImportUsage::default());
        assert!(file.imports.is_empty());
        assert_eq!(changes.removed.len(), 1);
    }

    #[test]
    fn test_apply_is_stable_on_instrumented_file() {
        let facilities = Facilities::default();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main")
            .with_import(ImportSpec::new("fmt"))
            .with_import(ImportSpec::new(VIRTUAL_TIME_PATH))
            .with_func("main", vec![Stmt::expr(Expr::qualified_call("vtime", "Block", vec![]))]);
        let before = file.imports.clone();
        let plan = manager.plan(&file);
        let usage = ImportUsage {
            needs_virtual_time: true,
            ..Default::default()
        };
        assert!(manager.apply(&mut file, &plan, &usage).is_empty());
        assert_eq!(file.imports, before);
    }

    fn custom_facilities() -> Facilities {
        Facilities {
            virtual_time: Facility::new("example.com/sim/clock", Some("simclock".into())),
            wall_clock: Facility::new("example.com/clock/v2", Some("clock".into())),
        }
    }

    #[test]
    fn test_custom_facility_name_binds_unaliased_import() {
        let facilities = custom_facilities();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main")
            .with_func("main", vec![Stmt::expr(Expr::qualified_call("simclock", "Go", vec![]))]);
        let plan = manager.plan(&file);
        assert_eq!(plan.virtual_time, "simclock");
        let usage = ImportUsage {
            needs_virtual_time: true,
            ..Default::default()
        };
        manager.apply(&mut file, &plan, &usage);
        assert_eq!(file.imports, vec![ImportSpec::new("example.com/sim/clock")]);

        // A clash-free fallback name still needs an alias.
        let mut file = File::new("main").with_func(
            "main",
            vec![
                Stmt::define(vec![Expr::ident("simclock")], vec![Expr::int(1)]),
                Stmt::expr(Expr::qualified_call("simclock1", "Go", vec![])),
            ],
        );
        let plan = manager.plan(&file);
        assert_eq!(plan.virtual_time, "simclock1");
        manager.apply(&mut file, &plan, &usage);
        assert_eq!(
            file.imports,
            vec![ImportSpec::aliased("simclock1", "example.com/sim/clock")]
        );
    }

    #[test]
    fn test_custom_wall_clock_name_is_planned_and_kept_while_referenced() {
        let facilities = custom_facilities();
        let manager = ImportManager::new(&facilities);
        let mut file = File::new("main")
            .with_import(ImportSpec::new("example.com/clock/v2"))
            .with_import(ImportSpec::aliased("wall", "example.com/clock/v2"));
        let plan = manager.plan(&file);
        let expected: BTreeSet<String> = ["clock", "wall"].iter().map(|s| s.to_string()).collect();
        assert_eq!(plan.wall_clock, expected);

        let usage = ImportUsage {
            needs_virtual_time: false,
            wall_clock_residual: ["clock".to_string()].into_iter().collect(),
        };
        let changes = manager.apply(&mut file, &plan, &usage);
        assert_eq!(file.imports, vec![ImportSpec::new("example.com/clock/v2")]);
        assert_eq!(
            changes.removed,
            vec![ImportSpec::aliased("wall", "example.com/clock/v2")]
        );
    }
}
