//! Primitive classification, shared by the rewrite and prohibit passes so both
//! agree on what counts as a concurrency primitive.

use crate::domain::ast::{Expr, Stmt, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Send,
    Receive,
    Select,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Send => "send",
            Primitive::Receive => "receive",
            Primitive::Select => "select",
        }
    }
}

/// Classifies a statement. A receive only counts when it is the whole
/// expression of an expression statement or a top-level term of an
/// assignment's right-hand side.
pub fn classify_stmt(stmt: &Stmt) -> Option<Primitive> {
    match &stmt.kind {
        StmtKind::Select { .. } => Some(Primitive::Select),
        StmtKind::Send { .. } => Some(Primitive::Send),
        StmtKind::Expr(x) if x.is_recv() => Some(Primitive::Receive),
        StmtKind::Assign { rhs, .. } if rhs.iter().any(Expr::is_recv) => Some(Primitive::Receive),
        _ => None,
    }
}

/// Only a receive expression is a primitive in expression position.
pub fn classify_expr(expr: &Expr) -> Option<Primitive> {
    expr.is_recv().then_some(Primitive::Receive)
}
