//! Go-syntax printer for rewritten trees.
//!
//! Output uses tab indentation and the layout `gofmt` would produce for the
//! common cases; it is meant to be fed to `gofmt` for exact formatting.

use crate::domain::ast::*;

pub fn print_file(file: &File) -> String {
    let mut printer = Printer::new(0);
    printer.file(file);
    printer.out
}

pub fn print_stmt(stmt: &Stmt) -> String {
    let mut printer = Printer::new(0);
    printer.stmt(stmt);
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    Printer::new(0).expr(expr)
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    fn line(&mut self, text: &str) {
        self.line_at(self.indent, text);
    }

    fn line_at(&mut self, indent: usize, text: &str) {
        if !text.is_empty() {
            for _ in 0..indent {
                self.out.push('\t');
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn file(&mut self, file: &File) {
        self.line(&format!("package {}", file.package.name));
        match file.imports.as_slice() {
            [] => {}
            [single] => {
                self.line("");
                self.line(&format!("import {}", import_spec(single)));
            }
            many => {
                self.line("");
                self.line("import (");
                for import in many {
                    self.line_at(self.indent + 1, &import_spec(import));
                }
                self.line(")");
            }
        }
        for decl in &file.decls {
            self.line("");
            self.decl(decl);
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => {
                let recv = func
                    .recv
                    .as_ref()
                    .map(|r| format!("({}) ", field(r)))
                    .unwrap_or_default();
                let header = format!("func {}{}{}", recv, func.name.name, signature(&func.sig));
                match &func.body {
                    Some(body) => self.braced(&header, body),
                    None => self.line(&header),
                }
            }
            Decl::Var(specs) => self.value_specs("var", specs),
            Decl::Const(specs) => self.value_specs("const", specs),
            Decl::Type(spec) => self.line(&format!("type {} {}", spec.name.name, spec.typ.0)),
        }
    }

    fn value_specs(&mut self, keyword: &str, specs: &[ValueSpec]) {
        match specs {
            [single] => {
                let spec = self.value_spec(single);
                self.line(&format!("{} {}", keyword, spec));
            }
            many => {
                self.line(&format!("{} (", keyword));
                self.indent += 1;
                for spec in many {
                    let spec = self.value_spec(spec);
                    self.line(&spec);
                }
                self.indent -= 1;
                self.line(")");
            }
        }
    }

    fn value_spec(&self, spec: &ValueSpec) -> String {
        let mut text = idents(&spec.names);
        if let Some(typ) = &spec.typ {
            text.push(' ');
            text.push_str(&typ.0);
        }
        if !spec.values.is_empty() {
            text.push_str(" = ");
            text.push_str(&self.exprs(&spec.values));
        }
        text
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `header {`, the block's statements one level deeper, then `}`.
    fn braced(&mut self, header: &str, block: &Block) {
        self.line(&format!("{} {{", header));
        self.body(block);
        self.line("}");
    }

    fn body(&mut self, block: &Block) {
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Labeled { label, stmt } => {
                self.line_at(self.indent.saturating_sub(1), &format!("{}:", label.name));
                self.stmt(stmt);
            }
            StmtKind::Block(block) => {
                self.line("{");
                self.body(block);
                self.line("}");
            }
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => self.if_chain("", init.as_deref(), cond, then, els.as_deref()),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                let header = match (init, cond, post) {
                    (None, None, None) => "for".to_string(),
                    (None, Some(cond), None) => format!("for {}", self.expr(cond)),
                    _ => format!(
                        "for {}; {}; {}",
                        init.as_deref().map(|s| self.simple(s)).unwrap_or_default(),
                        cond.as_ref().map(|c| self.expr(c)).unwrap_or_default(),
                        post.as_deref().map(|s| self.simple(s)).unwrap_or_default(),
                    ),
                };
                self.braced(&header, body);
            }
            StmtKind::Range {
                key,
                value,
                define,
                x,
                body,
            } => {
                let vars: Vec<String> = key.iter().chain(value.iter()).map(|e| self.expr(e)).collect();
                let header = if vars.is_empty() {
                    format!("for range {}", self.expr(x))
                } else {
                    let op = if *define { ":=" } else { "=" };
                    format!("for {} {} range {}", vars.join(", "), op, self.expr(x))
                };
                self.braced(&header, body);
            }
            StmtKind::Switch { init, tag, clauses } => {
                let mut header = "switch".to_string();
                if let Some(init) = init {
                    header.push(' ');
                    header.push_str(&self.simple(init));
                    header.push(';');
                }
                if let Some(tag) = tag {
                    header.push(' ');
                    header.push_str(&self.simple(tag));
                }
                self.line(&format!("{} {{", header));
                for clause in clauses {
                    match &clause.exprs {
                        Some(exprs) => self.line(&format!("case {}:", self.exprs(exprs))),
                        None => self.line("default:"),
                    }
                    self.body(&clause.body);
                }
                self.line("}");
            }
            StmtKind::Select { clauses } => {
                self.line("select {");
                for clause in clauses {
                    match &clause.comm {
                        Some(comm) => self.line(&format!("case {}:", self.simple(comm))),
                        None => self.line("default:"),
                    }
                    self.body(&clause.body);
                }
                self.line("}");
            }
            _ => {
                let text = self.simple(stmt);
                self.line(&text);
            }
        }
    }

    fn if_chain(&mut self, prefix: &str, init: Option<&Stmt>, cond: &Expr, then: &Block, els: Option<&Stmt>) {
        let init = init.map(|s| format!("{}; ", self.simple(s))).unwrap_or_default();
        self.line(&format!("{}if {}{} {{", prefix, init, self.expr(cond)));
        self.body(then);
        match els.map(|s| &s.kind) {
            None => self.line("}"),
            Some(StmtKind::If {
                init,
                cond,
                then,
                els,
            }) => self.if_chain("} else ", init.as_deref(), cond, then, els.as_deref()),
            Some(StmtKind::Block(block)) => {
                self.line("} else {");
                self.body(block);
                self.line("}");
            }
            Some(_) => {
                self.line("} else {");
                self.indent += 1;
                if let Some(other) = els {
                    self.stmt(other);
                }
                self.indent -= 1;
                self.line("}");
            }
        }
    }

    /// Single-line statement text, as used in headers and clause guards.
    fn simple(&self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Expr(x) => self.expr(x),
            StmtKind::Send { chan, value } => format!("{} <- {}", self.expr(chan), self.expr(value)),
            StmtKind::Assign { lhs, op, rhs } => {
                format!("{} {} {}", self.exprs(lhs), op.as_str(), self.exprs(rhs))
            }
            StmtKind::IncDec { x, inc } => format!("{}{}", self.expr(x), if *inc { "++" } else { "--" }),
            StmtKind::Var(specs) => {
                let specs: Vec<String> = specs.iter().map(|s| self.value_spec(s)).collect();
                format!("var {}", specs.join("; "))
            }
            StmtKind::Go(call) => format!("go {}", self.call(call)),
            StmtKind::Defer(call) => format!("defer {}", self.call(call)),
            StmtKind::Return(results) if results.is_empty() => "return".to_string(),
            StmtKind::Return(results) => format!("return {}", self.exprs(results)),
            StmtKind::Branch { tok, label } => match label {
                Some(label) => format!("{} {}", tok.as_str(), label.name),
                None => tok.as_str().to_string(),
            },
            StmtKind::Empty => String::new(),
            _ => {
                let mut nested = Printer::new(self.indent);
                nested.stmt(stmt);
                nested.out.trim().to_string()
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn exprs(&self, list: &[Expr]) -> String {
        list.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ")
    }

    fn expr(&self, expr: &Expr) -> String {
        self.expr_prec(expr, 0)
    }

    /// Prints `expr`, parenthesized when it binds looser than `parent`.
    fn expr_prec(&self, expr: &Expr, parent: u8) -> String {
        let text = match &expr.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::BasicLit { value, .. } => value.clone(),
            ExprKind::Type(typ) => typ.0.clone(),
            ExprKind::Selector { x, sel } => format!("{}.{}", self.expr_prec(x, PRIMARY), sel),
            ExprKind::Call(call) => self.call(call),
            ExprKind::Unary { op, x } => {
                let operand = self.expr_prec(x, UNARY);
                let sym = op.as_str();
                // keep `- -x` from lexing as a decrement
                if operand.starts_with(sym) && matches!(op, UnaryOp::Neg | UnaryOp::Plus) {
                    format!("{} {}", sym, operand)
                } else {
                    format!("{}{}", sym, operand)
                }
            }
            ExprKind::Binary { op, x, y } => {
                let prec = precedence(*op);
                format!(
                    "{} {} {}",
                    self.expr_prec(x, prec),
                    op.as_str(),
                    self.expr_prec(y, prec + 1)
                )
            }
            ExprKind::Paren(x) => format!("({})", self.expr(x)),
            ExprKind::Index { x, index } => {
                format!("{}[{}]", self.expr_prec(x, PRIMARY), self.expr(index))
            }
            ExprKind::Slice { x, low, high, max } => {
                let bound = |b: &Option<Box<Expr>>| b.as_deref().map(|e| self.expr(e)).unwrap_or_default();
                let mut text = format!("{}[{}:{}", self.expr_prec(x, PRIMARY), bound(low), bound(high));
                if max.is_some() {
                    text.push(':');
                    text.push_str(&bound(max));
                }
                text.push(']');
                text
            }
            ExprKind::Star(x) => format!("*{}", self.expr_prec(x, UNARY)),
            ExprKind::TypeAssert { x, typ } => format!(
                "{}.({})",
                self.expr_prec(x, PRIMARY),
                typ.as_ref().map_or("type", |t| t.0.as_str())
            ),
            ExprKind::FuncLit(lit) => self.func_lit(lit),
            ExprKind::CompositeLit { typ, elts } => format!(
                "{}{{{}}}",
                typ.as_ref().map_or("", |t| t.0.as_str()),
                self.exprs(elts)
            ),
            ExprKind::KeyValue { key, value } => format!("{}: {}", self.expr(key), self.expr(value)),
        };
        if level(expr) < parent {
            format!("({})", text)
        } else {
            text
        }
    }

    fn call(&self, call: &CallExpr) -> String {
        format!(
            "{}({}{})",
            self.expr_prec(&call.fun, PRIMARY),
            self.exprs(&call.args),
            if call.ellipsis { "..." } else { "" }
        )
    }

    fn func_lit(&self, lit: &FuncLit) -> String {
        let header = format!("func{}", signature(&lit.sig));
        if lit.body.stmts.is_empty() {
            return format!("{} {{}}", header);
        }
        let mut nested = Printer::new(self.indent);
        nested.body(&lit.body);
        let mut text = format!("{} {{\n{}", header, nested.out);
        for _ in 0..self.indent {
            text.push('\t');
        }
        text.push('}');
        text
    }
}

const UNARY: u8 = 6;
const PRIMARY: u8 = 7;

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mul
        | BinaryOp::Quo
        | BinaryOp::Rem
        | BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::And
        | BinaryOp::AndNot => 5,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
        BinaryOp::Eql
        | BinaryOp::Neq
        | BinaryOp::Lss
        | BinaryOp::Leq
        | BinaryOp::Gtr
        | BinaryOp::Geq => 3,
        BinaryOp::LAnd => 2,
        BinaryOp::LOr => 1,
    }
}

fn level(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Binary { op, .. } => precedence(*op),
        ExprKind::Unary { .. } | ExprKind::Star(_) => UNARY,
        _ => PRIMARY,
    }
}

fn import_spec(import: &ImportSpec) -> String {
    match &import.name {
        Some(name) => format!("{} {:?}", name, import.path),
        None => format!("{:?}", import.path),
    }
}

fn idents(names: &[Ident]) -> String {
    names.iter().map(|n| n.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn field(field: &Field) -> String {
    if field.names.is_empty() {
        field.typ.0.clone()
    } else {
        format!("{} {}", idents(&field.names), field.typ.0)
    }
}

fn fields(list: &[Field]) -> String {
    list.iter().map(field).collect::<Vec<_>>().join(", ")
}

fn signature(sig: &Signature) -> String {
    let params = format!("({})", fields(&sig.params));
    match sig.results.as_slice() {
        [] => params,
        [single] if single.names.is_empty() => format!("{} {}", params, single.typ.0),
        many => format!("{} ({})", params, fields(many)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prints_file_with_imports_and_func() {
        let file = File::new("main")
            .with_import(ImportSpec::new("fmt"))
            .with_import(ImportSpec::aliased("vt", "github.com/petar/vitamix/vtime"))
            .with_func(
                "main",
                vec![
                    Stmt::define(vec![Expr::ident("ch")], vec![Expr::call(
                        Expr::ident("make"),
                        vec![Expr::typ("chan int")],
                    )]),
                    Stmt::send(Expr::ident("ch"), Expr::int(1)),
                    Stmt::expr(Expr::qualified_call("fmt", "Println", vec![Expr::recv(Expr::ident("ch"))])),
                ],
            );
        let expected = "package main

import (
\t\"fmt\"
\tvt \"github.com/petar/vitamix/vtime\"
)

func main() {
\tch := make(chan int)
\tch <- 1
\tfmt.Println(<-ch)
}
";
        assert_eq!(print_file(&file), expected);
    }

    #[test]
    fn test_prints_select_and_spawn_closure() {
        let stmts = vec![
            Stmt::go(
                Expr::func_lit(vec![Stmt::expr(Expr::call(Expr::ident("work"), vec![]))]),
                vec![],
            ),
            Stmt::select(vec![
                CommClause::case(
                    Stmt::define(vec![Expr::ident("v")], vec![Expr::recv(Expr::ident("in"))]),
                    vec![Stmt::expr(Expr::call(Expr::ident("use"), vec![Expr::ident("v")]))],
                ),
                CommClause::default_case(vec![]),
            ]),
        ];
        let file = File::new("main").with_func("run", stmts);
        let expected = "package main

func run() {
\tgo func() {
\t\twork()
\t}()
\tselect {
\tcase v := <-in:
\t\tuse(v)
\tdefault:
\t}
}
";
        assert_eq!(print_file(&file), expected);
    }

    #[test]
    fn test_prints_control_flow() {
        let els = Stmt::block(vec![Stmt::branch(BranchTok::Break, Some("outer"))]);
        let stmt = Stmt::labeled(
            "outer",
            Stmt::for_ever(vec![Stmt::new(StmtKind::If {
                init: Some(Box::new(Stmt::define(vec![Expr::ident("n")], vec![Expr::ident("next")]))),
                cond: Expr::binary(BinaryOp::Gtr, Expr::ident("n"), Expr::int(0)),
                then: Block::new(vec![Stmt::new(StmtKind::IncDec {
                    x: Expr::ident("total"),
                    inc: true,
                })]),
                els: Some(Box::new(els)),
            })]),
        );
        let file = File::new("main").with_func("main", vec![stmt]);
        let expected = "package main

func main() {
outer:
\tfor {
\t\tif n := next; n > 0 {
\t\t\ttotal++
\t\t} else {
\t\t\tbreak outer
\t\t}
\t}
}
";
        assert_eq!(print_file(&file), expected);
    }

    #[test]
    fn test_parenthesizes_by_precedence() {
        let sum = Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::ident("b"));
        let product = Expr::binary(BinaryOp::Mul, sum.clone(), Expr::ident("c"));
        assert_eq!(print_expr(&product), "(a + b) * c");
        let nested = Expr::binary(BinaryOp::Sub, Expr::ident("a"), sum);
        assert_eq!(print_expr(&nested), "a - (a + b)");
        let neg = Expr::unary(UnaryOp::Neg, Expr::unary(UnaryOp::Neg, Expr::ident("x")));
        assert_eq!(print_expr(&neg), "- -x");
        let field = Expr::selector(Expr::unary(UnaryOp::Recv, Expr::ident("ch")), "Name");
        assert_eq!(print_expr(&field), "(<-ch).Name");
    }

    #[test]
    fn test_prints_simple_statements() {
        assert_eq!(print_stmt(&Stmt::ret(vec![])), "return\n");
        assert_eq!(
            print_stmt(&Stmt::ret(vec![Expr::ident("a"), Expr::string("b")])),
            "return a, \"b\"\n"
        );
        assert_eq!(
            print_stmt(&Stmt::defer(Expr::selector(Expr::ident("mu"), "Unlock"), vec![])),
            "defer mu.Unlock()\n"
        );
    }
}
