//! Redirects wall-clock time calls to the virtual-time facility.

use std::collections::BTreeSet;

use crate::domain::ast::{CallExpr, Expr, ExprKind, File};
use crate::domain::visit::{walk_expr_mut, VisitMut};

/// Wall-clock members that have a virtual-time counterpart.
pub const CONVERTED_MEMBERS: &[&str] = &["Now", "Sleep"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRewriteOutcome {
    pub converted: usize,
    /// Wall-clock qualifiers still referenced after conversion.
    pub residual: BTreeSet<String>,
}

impl CallRewriteOutcome {
    pub fn still_references(&self, qualifier: &str) -> bool {
        self.residual.contains(qualifier)
    }
}

/// Pre-order pass renaming `Q.Now()` and `Q.Sleep(d)` to go through the
/// virtual-time qualifier, where `Q` is a wall-clock local name. Any other
/// selector through `Q` is left alone and counted as a residual reference,
/// including function values such as `f := time.Now`.
pub struct CallRewriter<'a> {
    wall_clock: &'a BTreeSet<String>,
    virtual_time: &'a str,
    outcome: CallRewriteOutcome,
}

impl<'a> CallRewriter<'a> {
    pub fn new(wall_clock: &'a BTreeSet<String>, virtual_time: &'a str) -> Self {
        Self {
            wall_clock,
            virtual_time,
            outcome: CallRewriteOutcome::default(),
        }
    }

    pub fn run(mut self, file: &mut File) -> CallRewriteOutcome {
        if !self.wall_clock.is_empty() {
            self.visit_file_mut(file);
        }
        self.outcome
    }

    fn convert(&mut self, call: &mut CallExpr) -> bool {
        let ExprKind::Selector { x, sel } = &mut call.fun.kind else {
            return false;
        };
        if !CONVERTED_MEMBERS.contains(&sel.as_str()) {
            return false;
        }
        let ExprKind::Ident(qualifier) = &mut x.kind else {
            return false;
        };
        if !self.wall_clock.contains(qualifier.as_str()) {
            return false;
        }
        tracing::trace!("{}.{} -> {}.{}", qualifier, sel, self.virtual_time, sel);
        *qualifier = self.virtual_time.to_string();
        self.outcome.converted += 1;
        true
    }
}

impl VisitMut for CallRewriter<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let ExprKind::Call(call) = &mut expr.kind {
            if self.convert(call) {
                for arg in &mut call.args {
                    self.visit_expr_mut(arg);
                }
                return;
            }
        }
        if let ExprKind::Selector { x, .. } = &expr.kind {
            if let ExprKind::Ident(qualifier) = &x.kind {
                if self.wall_clock.contains(qualifier.as_str()) {
                    self.outcome.residual.insert(qualifier.clone());
                }
            }
        }
        walk_expr_mut(self, expr);
    }
}

/// Convenience over [`CallRewriter`].
pub fn rewrite_time_calls(file: &mut File, wall_clock: &BTreeSet<String>, virtual_time: &str) -> CallRewriteOutcome {
    CallRewriter::new(wall_clock, virtual_time).run(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::Stmt;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_now_and_sleep_are_redirected() {
        let mut file = File::new("main").with_func(
            "main",
            vec![
                Stmt::define(vec![Expr::ident("t")], vec![Expr::qualified_call("time", "Now", vec![])]),
                Stmt::expr(Expr::qualified_call("time", "Sleep", vec![Expr::int(10)])),
            ],
        );
        let outcome = rewrite_time_calls(&mut file, &names(&["time"]), "vtime");
        assert_eq!(outcome.converted, 2);
        assert!(outcome.residual.is_empty());
        let body = &file.func_body("main").unwrap().stmts;
        assert_eq!(
            body[0],
            Stmt::define(vec![Expr::ident("t")], vec![Expr::qualified_call("vtime", "Now", vec![])])
        );
        assert_eq!(
            body[1],
            Stmt::expr(Expr::qualified_call("vtime", "Sleep", vec![Expr::int(10)]))
        );
    }

    #[test]
    fn test_other_members_are_residual() {
        let sleep = Expr::qualified_call(
            "clock",
            "Sleep",
            vec![Expr::selector(Expr::ident("clock"), "Second")],
        );
        let mut file = File::new("main").with_func(
            "main",
            vec![
                Stmt::expr(sleep),
                Stmt::expr(Expr::qualified_call("clock", "Since", vec![Expr::ident("t0")])),
            ],
        );
        let outcome = rewrite_time_calls(&mut file, &names(&["clock"]), "vtime");
        assert_eq!(outcome.converted, 1);
        assert!(outcome.still_references("clock"));
        let body = &file.func_body("main").unwrap().stmts;
        assert_eq!(
            body[0],
            Stmt::expr(Expr::qualified_call(
                "vtime",
                "Sleep",
                vec![Expr::selector(Expr::ident("clock"), "Second")]
            ))
        );
    }

    #[test]
    fn test_function_value_is_not_converted() {
        let value = Expr::selector(Expr::ident("time"), "Now");
        let stmt = Stmt::define(vec![Expr::ident("f")], vec![value]);
        let mut file = File::new("main").with_func("main", vec![stmt.clone()]);
        let outcome = rewrite_time_calls(&mut file, &names(&["time"]), "vtime");
        assert_eq!(outcome.converted, 0);
        assert!(outcome.still_references("time"));
        assert_eq!(file.func_body("main").unwrap().stmts, vec![stmt]);
    }

    #[test]
    fn test_unrelated_qualifiers_are_ignored() {
        let mut file = File::new("main").with_func(
            "main",
            vec![Stmt::expr(Expr::qualified_call("fake", "Now", vec![]))],
        );
        let outcome = rewrite_time_calls(&mut file, &names(&["time"]), "vtime");
        assert_eq!(outcome, CallRewriteOutcome::default());
    }
}
