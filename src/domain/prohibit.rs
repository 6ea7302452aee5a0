//! Validator for subtrees where no concurrency primitive may appear.

use crate::domain::ast::{Expr, Pos, Stmt};
use crate::domain::classify::{classify_expr, classify_stmt, Primitive};
use crate::domain::diagnostics::MSG_NESTED_PRIMITIVE;
use crate::domain::frame::TraversalFrame;
use crate::domain::visit::{walk_expr, walk_stmt, Visitor};

/// Walks a subtree unconditionally, function literal bodies included, and
/// reports every primitive it meets. A matched node is not descended into, so
/// a primitive nested in another primitive is reported once.
pub struct ProhibitChecker<'a> {
    frame: TraversalFrame<'a>,
    found: usize,
}

impl<'a> ProhibitChecker<'a> {
    pub fn new(frame: TraversalFrame<'a>) -> Self {
        Self { frame, found: 0 }
    }

    pub fn found(&self) -> usize {
        self.found
    }

    fn report(&mut self, pos: Pos, primitive: Primitive) {
        self.found += 1;
        self.frame
            .trace(format_args!("prohibited {}", primitive.name()));
        self.frame.add_error(pos, MSG_NESTED_PRIMITIVE);
    }
}

impl Visitor for ProhibitChecker<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match classify_stmt(stmt) {
            Some(primitive) => self.report(stmt.pos, primitive),
            None => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match classify_expr(expr) {
            Some(primitive) => self.report(expr.pos, primitive),
            None => walk_expr(self, expr),
        }
    }
}

/// Checks `expr` in a child frame of `caller`; returns the number of violations.
pub fn prohibit_expr(caller: &mut TraversalFrame<'_>, expr: &Expr) -> usize {
    let mut checker = ProhibitChecker::new(caller.recurse());
    checker.visit_expr(expr);
    checker.found()
}

/// Checks `stmt` in a child frame of `caller`; returns the number of violations.
pub fn prohibit_stmt(caller: &mut TraversalFrame<'_>, stmt: &Stmt) -> usize {
    let mut checker = ProhibitChecker::new(caller.recurse());
    checker.visit_stmt(stmt);
    checker.found()
}
