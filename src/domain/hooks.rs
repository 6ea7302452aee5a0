//! Instrumentation calls understood by the virtual-time runtime.
//!
//! | Call      | Inserted at                                              |
//! |-----------|----------------------------------------------------------|
//! | `Block`   | before a send, receive or select statement               |
//! | `Unblock` | after a send or receive; first statement of every clause |
//! | `Go`      | before a spawn statement                                 |
//! | `Die`     | last statement of the wrapped spawned task               |

use crate::domain::ast::{Expr, ExprKind, Pos, Stmt, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Block,
    Unblock,
    Go,
    Die,
}

impl Hook {
    pub fn member(self) -> &'static str {
        match self {
            Hook::Block => "Block",
            Hook::Unblock => "Unblock",
            Hook::Go => "Go",
            Hook::Die => "Die",
        }
    }
}

/// Builds hook calls against the local name the virtual-time import is bound to.
#[derive(Debug, Clone)]
pub struct Hooks {
    qualifier: String,
}

impl Hooks {
    pub fn new(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
        }
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Zero-argument `qualifier.Hook()` statement tagged with `pos`.
    pub fn stmt(&self, hook: Hook, pos: Pos) -> Stmt {
        let fun = Expr::selector(Expr::ident(&self.qualifier).at(pos), hook.member()).at(pos);
        Stmt::expr(Expr::call(fun, vec![]).at(pos)).at(pos)
    }

    /// Whether `stmt` is exactly a call to `hook` through this qualifier.
    pub fn matches(&self, stmt: &Stmt, hook: Hook) -> bool {
        let StmtKind::Expr(expr) = &stmt.kind else {
            return false;
        };
        let ExprKind::Call(call) = &expr.kind else {
            return false;
        };
        let ExprKind::Selector { x, sel } = &call.fun.kind else {
            return false;
        };
        call.args.is_empty()
            && sel == hook.member()
            && matches!(&x.kind, ExprKind::Ident(name) if *name == self.qualifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_stmt_carries_position() {
        let hooks = Hooks::new("vtime");
        let stmt = hooks.stmt(Hook::Unblock, Pos(42));
        assert_eq!(stmt.pos, Pos(42));
        assert!(hooks.matches(&stmt, Hook::Unblock));
        assert!(!hooks.matches(&stmt, Hook::Block));
        assert!(!Hooks::new("vt").matches(&stmt, Hook::Unblock));
    }
}
