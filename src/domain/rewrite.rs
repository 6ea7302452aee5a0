//! Statement-level instrumentation of channel operations and task spawns.
//!
//! The engine works in two modes. While *searching* it descends through every
//! child of a node until it meets a [`Block`]. A block is then *rewritten*: its
//! direct statement list is rebuilt, with each primitive replaced by its
//! instrumented fragments, and the enclosing search does not descend into it
//! again. Every other statement of the block is searched by a child engine
//! running in a fresh [`TraversalFrame`], so nested bodies (loops,
//! conditionals, function literals) get rewritten the same way.
//!
//! Rules, applied in source order:
//!
//! - send `S`    => `Block(); S; Unblock()`
//! - receive `R` => `Block(); R; Unblock()`
//! - select `T`  => `Block(); T` with `Unblock()` heading every clause body
//! - spawn `G`   => `Go(); go func() { call; Die() }()`
//!
//! Operands of a rewritten primitive must not contain primitives themselves;
//! those, and primitives met while searching (e.g. in an `if` header), are
//! reported through the frame and left in place.

use crate::domain::ast::{
    Block, BranchTok, CallExpr, Expr, ExprKind, File, Ident, Pos, Stmt, StmtKind,
};
use crate::domain::classify::{classify_expr, classify_stmt, Primitive};
use crate::domain::diagnostics::{ErrorQueue, MSG_NESTED_PRIMITIVE, MSG_SELECT_FALLTHROUGH};
use crate::domain::frame::TraversalFrame;
use crate::domain::hooks::{Hook, Hooks};
use crate::domain::prohibit::{prohibit_expr, prohibit_stmt};
use crate::domain::source_map::SourceMap;
use crate::domain::visit::{walk_expr_mut, walk_stmt_mut, VisitMut};

/// Counts of instrumented statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub sends: usize,
    pub receives: usize,
    pub selects: usize,
    pub spawns: usize,
}

impl RewriteStats {
    pub fn total(&self) -> usize {
        self.sends + self.receives + self.selects + self.spawns
    }

    /// Any hook emitted means the file now references the virtual-time facility.
    pub fn needs_virtual_time(&self) -> bool {
        self.total() > 0
    }

    pub fn merge(&mut self, other: RewriteStats) {
        self.sends += other.sends;
        self.receives += other.receives;
        self.selects += other.selects;
        self.spawns += other.spawns;
    }
}

/// Result of instrumenting one file.
#[derive(Debug)]
pub struct ChannelRewrite {
    pub stats: RewriteStats,
    pub diagnostics: Result<(), ErrorQueue>,
}

/// Instruments every block reachable from `file` in place.
pub fn rewrite_channel_ops(source_map: &SourceMap, hooks: &Hooks, file: &mut File) -> ChannelRewrite {
    let mut errors = ErrorQueue::new();
    let stats = {
        let mut engine = RewriteEngine::new(TraversalFrame::root(source_map, &mut errors), hooks);
        engine.visit_file_mut(file);
        engine.stats
    };
    ChannelRewrite {
        stats,
        diagnostics: errors.into_result(),
    }
}

pub struct RewriteEngine<'a> {
    frame: TraversalFrame<'a>,
    hooks: &'a Hooks,
    stats: RewriteStats,
}

impl<'a> RewriteEngine<'a> {
    pub fn new(frame: TraversalFrame<'a>, hooks: &'a Hooks) -> Self {
        Self {
            frame,
            hooks,
            stats: RewriteStats::default(),
        }
    }

    pub fn stats(&self) -> RewriteStats {
        self.stats
    }

    fn recurse(&mut self) -> RewriteEngine<'_> {
        RewriteEngine {
            frame: self.frame.recurse(),
            hooks: self.hooks,
            stats: RewriteStats::default(),
        }
    }

    /// Runs `f` on a child engine and folds its counts back into this one.
    fn in_child(&mut self, f: impl FnOnce(&mut RewriteEngine<'_>)) {
        let stats = {
            let mut child = self.recurse();
            f(&mut child);
            child.stats
        };
        self.stats.merge(stats);
    }

    /// Rebuilds the direct statement list of `block`.
    pub fn rewrite_block(&mut self, block: &mut Block) {
        self.frame
            .trace(format_args!("block of {} statements", block.stmts.len()));
        let stmts = std::mem::take(&mut block.stmts);
        let mut list = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.rewrite_stmt(stmt, &mut list);
        }
        block.stmts = list;
    }

    fn rewrite_stmt(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        if let Some(primitive) = classify_stmt(&stmt) {
            match primitive {
                Primitive::Send => self.rewrite_send(stmt, out),
                Primitive::Receive => self.rewrite_recv(stmt, out),
                Primitive::Select => self.rewrite_select(stmt, out),
            }
            return;
        }
        let Stmt { pos, kind } = stmt;
        match kind {
            StmtKind::Go(call) => self.rewrite_go(pos, call, out),
            StmtKind::Labeled { label, stmt: inner } if is_instrumented(&inner) => {
                self.rewrite_labeled(pos, label, *inner, out)
            }
            kind => {
                let mut stmt = Stmt { pos, kind };
                self.in_child(|child| walk_stmt_mut(child, &mut stmt));
                out.push(stmt);
            }
        }
    }

    fn rewrite_send(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        self.frame.trace(format_args!("send"));
        self.prohibit_operands(&stmt);
        self.stats.sends += 1;
        self.surround(stmt, out);
    }

    fn rewrite_recv(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        self.frame.trace(format_args!("receive"));
        self.prohibit_operands(&stmt);
        self.stats.receives += 1;
        self.surround(stmt, out);
    }

    fn rewrite_select(&mut self, mut stmt: Stmt, out: &mut Vec<Stmt>) {
        self.frame.trace(format_args!("select"));
        if let StmtKind::Select { clauses } = &mut stmt.kind {
            for clause in clauses.iter_mut() {
                if let Some(comm) = &clause.comm {
                    self.prohibit_operands(comm);
                }
                self.check_fallthrough(&clause.body);
                self.in_child(|child| child.rewrite_block(&mut clause.body));
            }
            // Whichever clause fires, unblocking precedes its user code.
            for clause in clauses.iter_mut() {
                clause
                    .body
                    .stmts
                    .insert(0, self.hooks.stmt(Hook::Unblock, clause.pos));
            }
        }
        self.stats.selects += 1;
        out.push(self.hooks.stmt(Hook::Block, stmt.pos));
        out.push(stmt);
    }

    fn rewrite_go(&mut self, pos: Pos, mut call: CallExpr, out: &mut Vec<Stmt>) {
        self.frame.trace(format_args!("spawn"));
        self.in_child(|child| child.visit_expr_mut(&mut call.fun));
        for arg in &call.args {
            prohibit_expr(&mut self.frame, arg);
        }

        let call_pos = call.fun.pos;
        let task = Expr::func_lit(vec![
            Stmt::expr(Expr::new(ExprKind::Call(call)).at(call_pos)).at(call_pos),
            self.hooks.stmt(Hook::Die, call_pos),
        ])
        .at(pos);

        self.stats.spawns += 1;
        out.push(self.hooks.stmt(Hook::Go, pos));
        out.push(Stmt {
            pos,
            kind: StmtKind::Go(CallExpr::new(task, vec![])),
        });
    }

    /// `L: P` is rewritten as `P`. The label stays on a select so `break L`
    /// keeps targeting it; otherwise it moves to the first fragment so a
    /// `goto L` runs the leading hook.
    fn rewrite_labeled(&mut self, pos: Pos, label: Ident, inner: Stmt, out: &mut Vec<Stmt>) {
        let on_select = matches!(innermost(&inner).kind, StmtKind::Select { .. });
        let mut fragments = Vec::new();
        self.rewrite_stmt(inner, &mut fragments);
        let index = if on_select {
            fragments.len().saturating_sub(1)
        } else {
            0
        };
        if let Some(slot) = fragments.get_mut(index) {
            let target = std::mem::replace(slot, Stmt::new(StmtKind::Empty));
            *slot = Stmt {
                pos,
                kind: StmtKind::Labeled {
                    label,
                    stmt: Box::new(target),
                },
            };
        }
        out.extend(fragments);
    }

    fn surround(&self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let pos = stmt.pos;
        out.push(self.hooks.stmt(Hook::Block, pos));
        out.push(stmt);
        out.push(self.hooks.stmt(Hook::Unblock, pos));
    }

    /// Checks every operand of a send or receive statement, except the
    /// top-level receive expression itself whose channel operand is checked instead.
    fn prohibit_operands(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Send { chan, value } => {
                prohibit_expr(&mut self.frame, chan);
                prohibit_expr(&mut self.frame, value);
            }
            StmtKind::Expr(x) => self.prohibit_term(x),
            StmtKind::Assign { lhs, rhs, .. } => {
                for x in lhs {
                    prohibit_expr(&mut self.frame, x);
                }
                for x in rhs {
                    self.prohibit_term(x);
                }
            }
            _ => {
                prohibit_stmt(&mut self.frame, stmt);
            }
        }
    }

    fn prohibit_term(&mut self, x: &Expr) {
        match x.recv_operand() {
            Some(operand) => prohibit_expr(&mut self.frame, operand),
            None => prohibit_expr(&mut self.frame, x),
        };
    }

    fn check_fallthrough(&mut self, body: &Block) {
        for stmt in &body.stmts {
            if let StmtKind::Branch {
                tok: BranchTok::Fallthrough,
                ..
            } = &innermost(stmt).kind
            {
                self.frame.add_error(stmt.pos, MSG_SELECT_FALLTHROUGH);
            }
        }
    }
}

/// Searching mode: blocks are rewritten, stray primitives are reported.
impl VisitMut for RewriteEngine<'_> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        self.rewrite_block(block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        match classify_stmt(stmt) {
            Some(_) => self.frame.add_error(stmt.pos, MSG_NESTED_PRIMITIVE),
            None => walk_stmt_mut(self, stmt),
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        match classify_expr(expr) {
            Some(_) => self.frame.add_error(expr.pos, MSG_NESTED_PRIMITIVE),
            None => walk_expr_mut(self, expr),
        }
    }
}

fn innermost(stmt: &Stmt) -> &Stmt {
    match &stmt.kind {
        StmtKind::Labeled { stmt, .. } => innermost(stmt),
        _ => stmt,
    }
}

fn is_instrumented(stmt: &Stmt) -> bool {
    let inner = innermost(stmt);
    classify_stmt(inner).is_some() || matches!(inner.kind, StmtKind::Go(_))
}
