//! Tree walkers.
//!
//! - `Visitor` walks by shared reference (classification, prohibition, scans).
//! - `VisitMut` walks by mutable reference (in-place rewriting passes).
//!
//! Override the `visit_*` methods you care about and call the matching
//! `walk_*` function to keep the default recursion; omit the call to prune the
//! traversal at that node. Every walk matches its node kind exhaustively, so a
//! new statement or expression kind has to be handled here first.

use crate::domain::ast::*;

// ============================================================================
// Visitor (read-only)
// ============================================================================

pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    /// Type expressions are opaque text, so there is nothing to walk.
    fn visit_type(&mut self, _typ: &TypeExpr) {}
}

pub fn walk_file<V: Visitor>(v: &mut V, file: &File) {
    for decl in &file.decls {
        v.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Func(func) => {
            if let Some(recv) = &func.recv {
                v.visit_type(&recv.typ);
            }
            walk_signature(v, &func.sig);
            if let Some(body) = &func.body {
                v.visit_block(body);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => walk_value_specs(v, specs),
        Decl::Type(spec) => v.visit_type(&spec.typ),
    }
}

fn walk_signature<V: Visitor>(v: &mut V, sig: &Signature) {
    for field in sig.params.iter().chain(&sig.results) {
        v.visit_type(&field.typ);
    }
}

fn walk_value_specs<V: Visitor>(v: &mut V, specs: &[ValueSpec]) {
    for spec in specs {
        if let Some(typ) = &spec.typ {
            v.visit_type(typ);
        }
        for value in &spec.values {
            v.visit_expr(value);
        }
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expr(x) => v.visit_expr(x),
        StmtKind::Send { chan, value } => {
            v.visit_expr(chan);
            v.visit_expr(value);
        }
        StmtKind::Assign { lhs, rhs, .. } => {
            for x in lhs.iter().chain(rhs) {
                v.visit_expr(x);
            }
        }
        StmtKind::IncDec { x, .. } => v.visit_expr(x),
        StmtKind::Var(specs) => walk_value_specs(v, specs),
        StmtKind::Go(call) | StmtKind::Defer(call) => walk_call(v, call),
        StmtKind::Return(results) => {
            for x in results {
                v.visit_expr(x);
            }
        }
        StmtKind::Branch { .. } | StmtKind::Empty => {}
        StmtKind::Labeled { stmt, .. } => v.visit_stmt(stmt),
        StmtKind::Block(block) => v.visit_block(block),
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(els) = els {
                v.visit_stmt(els);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        StmtKind::Range {
            key,
            value,
            x,
            body,
            ..
        } => {
            for e in key.iter().chain(value.iter()) {
                v.visit_expr(e);
            }
            v.visit_expr(x);
            v.visit_block(body);
        }
        StmtKind::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_stmt(tag);
            }
            for clause in clauses {
                for x in clause.exprs.iter().flatten() {
                    v.visit_expr(x);
                }
                v.visit_block(&clause.body);
            }
        }
        StmtKind::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &clause.comm {
                    v.visit_stmt(comm);
                }
                v.visit_block(&clause.body);
            }
        }
    }
}

fn walk_call<V: Visitor>(v: &mut V, call: &CallExpr) {
    v.visit_expr(&call.fun);
    for arg in &call.args {
        v.visit_expr(arg);
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit { .. } => {}
        ExprKind::Type(typ) => v.visit_type(typ),
        ExprKind::Selector { x, .. } => v.visit_expr(x),
        ExprKind::Call(call) => walk_call(v, call),
        ExprKind::Unary { x, .. } | ExprKind::Paren(x) | ExprKind::Star(x) => v.visit_expr(x),
        ExprKind::TypeAssert { x, typ } => {
            v.visit_expr(x);
            if let Some(typ) = typ {
                v.visit_type(typ);
            }
        }
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr(x);
            v.visit_expr(y);
        }
        ExprKind::Index { x, index } => {
            v.visit_expr(x);
            v.visit_expr(index);
        }
        ExprKind::Slice { x, low, high, max } => {
            v.visit_expr(x);
            for bound in [low, high, max].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        ExprKind::FuncLit(lit) => {
            walk_signature(v, &lit.sig);
            v.visit_block(&lit.body);
        }
        ExprKind::CompositeLit { typ, elts } => {
            if let Some(typ) = typ {
                v.visit_type(typ);
            }
            for elt in elts {
                v.visit_expr(elt);
            }
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
    }
}

// ============================================================================
// VisitMut (in-place)
// ============================================================================

pub trait VisitMut: Sized {
    fn visit_file_mut(&mut self, file: &mut File) {
        walk_file_mut(self, file);
    }

    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_file_mut<V: VisitMut>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        v.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitMut>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Func(func) => {
            if let Some(body) = &mut func.body {
                v.visit_block_mut(body);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => walk_value_specs_mut(v, specs),
        Decl::Type(_) => {}
    }
}

fn walk_value_specs_mut<V: VisitMut>(v: &mut V, specs: &mut [ValueSpec]) {
    for spec in specs {
        for value in &mut spec.values {
            v.visit_expr_mut(value);
        }
    }
}

pub fn walk_block_mut<V: VisitMut>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(x) => v.visit_expr_mut(x),
        StmtKind::Send { chan, value } => {
            v.visit_expr_mut(chan);
            v.visit_expr_mut(value);
        }
        StmtKind::Assign { lhs, rhs, .. } => {
            for x in lhs.iter_mut().chain(rhs.iter_mut()) {
                v.visit_expr_mut(x);
            }
        }
        StmtKind::IncDec { x, .. } => v.visit_expr_mut(x),
        StmtKind::Var(specs) => walk_value_specs_mut(v, specs),
        StmtKind::Go(call) | StmtKind::Defer(call) => walk_call_mut(v, call),
        StmtKind::Return(results) => {
            for x in results {
                v.visit_expr_mut(x);
            }
        }
        StmtKind::Branch { .. } | StmtKind::Empty => {}
        StmtKind::Labeled { stmt, .. } => v.visit_stmt_mut(stmt),
        StmtKind::Block(block) => v.visit_block_mut(block),
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then);
            if let Some(els) = els {
                v.visit_stmt_mut(els);
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                v.visit_expr_mut(cond);
            }
            if let Some(post) = post {
                v.visit_stmt_mut(post);
            }
            v.visit_block_mut(body);
        }
        StmtKind::Range {
            key,
            value,
            x,
            body,
            ..
        } => {
            for e in key.iter_mut().chain(value.iter_mut()) {
                v.visit_expr_mut(e);
            }
            v.visit_expr_mut(x);
            v.visit_block_mut(body);
        }
        StmtKind::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(tag) = tag {
                v.visit_stmt_mut(tag);
            }
            for clause in clauses {
                for x in clause.exprs.iter_mut().flatten() {
                    v.visit_expr_mut(x);
                }
                v.visit_block_mut(&mut clause.body);
            }
        }
        StmtKind::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &mut clause.comm {
                    v.visit_stmt_mut(comm);
                }
                v.visit_block_mut(&mut clause.body);
            }
        }
    }
}

pub fn walk_call_mut<V: VisitMut>(v: &mut V, call: &mut CallExpr) {
    v.visit_expr_mut(&mut call.fun);
    for arg in &mut call.args {
        v.visit_expr_mut(arg);
    }
}

pub fn walk_expr_mut<V: VisitMut>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit { .. } | ExprKind::Type(_) => {}
        ExprKind::Selector { x, .. } => v.visit_expr_mut(x),
        ExprKind::Call(call) => walk_call_mut(v, call),
        ExprKind::Unary { x, .. } | ExprKind::Paren(x) | ExprKind::Star(x) => v.visit_expr_mut(x),
        ExprKind::TypeAssert { x, .. } => v.visit_expr_mut(x),
        ExprKind::Binary { x, y, .. } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(y);
        }
        ExprKind::Index { x, index } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(index);
        }
        ExprKind::Slice { x, low, high, max } => {
            v.visit_expr_mut(x);
            for bound in [low, high, max].into_iter().flatten() {
                v.visit_expr_mut(bound);
            }
        }
        ExprKind::FuncLit(lit) => v.visit_block_mut(&mut lit.body),
        ExprKind::CompositeLit { elts, .. } => {
            for elt in elts {
                v.visit_expr_mut(elt);
            }
        }
        ExprKind::KeyValue { key, value } => {
            v.visit_expr_mut(key);
            v.visit_expr_mut(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdentCollector(Vec<String>);

    impl Visitor for IdentCollector {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Ident(name) = &expr.kind {
                self.0.push(name.clone());
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_walk_reaches_func_literal_bodies_in_order() {
        let file = File::new("main").with_func(
            "main",
            vec![
                Stmt::send(Expr::ident("a"), Expr::ident("b")),
                Stmt::go(Expr::func_lit(vec![Stmt::expr(Expr::ident("c"))]), vec![]),
                Stmt::if_then(Expr::ident("d"), vec![Stmt::expr(Expr::ident("e"))]),
            ],
        );
        let mut collector = IdentCollector(Vec::new());
        collector.visit_file(&file);
        assert_eq!(collector.0, vec!["a", "b", "c", "d", "e"]);
    }

    struct Renamer;

    impl VisitMut for Renamer {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            if let ExprKind::Ident(name) = &mut expr.kind {
                name.make_ascii_uppercase();
            }
            walk_expr_mut(self, expr);
        }
    }

    #[test]
    fn test_walk_mut_rewrites_in_place() {
        let mut file = File::new("main").with_func(
            "main",
            vec![Stmt::select(vec![CommClause::case(
                Stmt::expr(Expr::recv(Expr::ident("ch"))),
                vec![Stmt::expr(Expr::ident("x"))],
            )])],
        );
        Renamer.visit_file_mut(&mut file);
        let body = file.func_body("main").unwrap();
        match &body.stmts[0].kind {
            StmtKind::Select { clauses } => {
                assert_eq!(
                    clauses[0].comm.as_deref(),
                    Some(&Stmt::expr(Expr::recv(Expr::ident("CH"))))
                );
                assert_eq!(clauses[0].body.stmts[0], Stmt::expr(Expr::ident("X")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
