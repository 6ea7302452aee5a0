//! Syntax tree for the channel-based source language.
//!
//! The tree is produced by an external front end and handed to virtime as a
//! serialized unit. Only the node kinds the rewriter reasons about are modeled
//! structurally: statements, expressions and blocks. Type expressions are kept
//! as opaque text, which is enough for the printer to reproduce them.
//!
//! Every statement and expression carries a [`Pos`], which a
//! [`SourceMap`](crate::domain::source_map::SourceMap) resolves to
//! `file:line:column`.

use serde::{Deserialize, Serialize};

/// Byte offset plus one into the source file. `Pos(0)` means "no position".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pos(pub u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// A declared name (function, parameter, label, package).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    #[serde(default)]
    pub pos: Pos,
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pos: Pos::NONE,
            name: name.into(),
        }
    }
}

/// Opaque type expression, e.g. `chan int` or `map[string]*T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeExpr(pub String);

impl TypeExpr {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// File level
// ═══════════════════════════════════════════════════════════════════════════

/// One source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub package: Ident,
    #[serde(default)]
    pub imports: Vec<ImportSpec>,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

impl File {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: Ident::new(package),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn with_import(mut self, import: ImportSpec) -> Self {
        self.imports.push(import);
        self
    }

    /// Appends a parameterless function declaration with the given body.
    pub fn with_func(mut self, name: &str, stmts: Vec<Stmt>) -> Self {
        self.decls.push(Decl::Func(FuncDecl {
            pos: Pos::NONE,
            name: Ident::new(name),
            recv: None,
            sig: Signature::default(),
            body: Some(Block::new(stmts)),
        }));
        self
    }

    /// Body of the named top-level function, if it has one.
    pub fn func_body(&self, name: &str) -> Option<&Block> {
        self.decls.iter().find_map(|decl| match decl {
            Decl::Func(func) if func.name.name == name => func.body.as_ref(),
            _ => None,
        })
    }
}

/// Import declaration: module identity plus optional local alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    #[serde(default)]
    pub pos: Pos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            pos: Pos::NONE,
            name: None,
            path: path.into(),
        }
    }

    pub fn aliased(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            pos: Pos::NONE,
            name: Some(name.into()),
            path: path.into(),
        }
    }

    /// Qualifier this import binds in the file: the alias, or the last path segment.
    pub fn local_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    /// Dot and blank imports bind no qualifier.
    pub fn binds_qualifier(&self) -> bool {
        !matches!(self.name.as_deref(), Some(".") | Some("_"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Func(FuncDecl),
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    #[serde(default)]
    pub pos: Pos,
    pub name: Ident,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<Field>,
    #[serde(default)]
    pub sig: Signature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
}

/// Parameter, result or receiver. `names` is empty for anonymous fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    pub typ: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    #[serde(default)]
    pub pos: Pos,
    pub names: Vec<Ident>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<TypeExpr>,
    #[serde(default)]
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    #[serde(default)]
    pub pos: Pos,
    pub name: Ident,
    pub typ: TypeExpr,
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// Ordered statement list owned by a function body, literal, loop,
/// conditional, case clause or comm clause.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub pos: Pos,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            pos: Pos::NONE,
            stmts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub pos: Pos,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    IncDec {
        x: Expr,
        inc: bool,
    },
    Var(Vec<ValueSpec>),
    Go(CallExpr),
    Defer(CallExpr),
    Return(Vec<Expr>),
    Branch {
        tok: BranchTok,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<Ident>,
    },
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    Block(Block),
    If {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        els: Option<Box<Stmt>>,
    },
    For {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cond: Option<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
        #[serde(default)]
        define: bool,
        x: Expr,
        body: Block,
    },
    /// Expression switch (`tag` is an expression statement) or type switch
    /// (`tag` is an assignment from a `.(type)` assertion).
    Switch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<Box<Stmt>>,
        clauses: Vec<CaseClause>,
    },
    Select {
        clauses: Vec<CommClause>,
    },
    Empty,
}

/// One `switch` arm; `exprs` is `None` for `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    #[serde(default)]
    pub pos: Pos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exprs: Option<Vec<Expr>>,
    pub body: Block,
}

/// One `select` arm; `comm` is `None` for `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommClause {
    #[serde(default)]
    pub pos: Pos,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comm: Option<Box<Stmt>>,
    pub body: Block,
}

impl CommClause {
    pub fn case(comm: Stmt, stmts: Vec<Stmt>) -> Self {
        Self {
            pos: Pos::NONE,
            comm: Some(Box::new(comm)),
            body: Block::new(stmts),
        }
    }

    pub fn default_case(stmts: Vec<Stmt>) -> Self {
        Self {
            pos: Pos::NONE,
            comm: None,
            body: Block::new(stmts),
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = ":=")]
    Define,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Quo,
    #[serde(rename = "%=")]
    Rem,
    #[serde(rename = "&=")]
    And,
    #[serde(rename = "|=")]
    Or,
    #[serde(rename = "^=")]
    Xor,
    #[serde(rename = "<<=")]
    Shl,
    #[serde(rename = ">>=")]
    Shr,
    #[serde(rename = "&^=")]
    AndNot,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Quo => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchTok {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchTok {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchTok::Break => "break",
            BranchTok::Continue => "continue",
            BranchTok::Goto => "goto",
            BranchTok::Fallthrough => "fallthrough",
        }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            pos: Pos::NONE,
            kind,
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    pub fn expr(x: Expr) -> Self {
        Self::new(StmtKind::Expr(x))
    }

    pub fn send(chan: Expr, value: Expr) -> Self {
        Self::new(StmtKind::Send { chan, value })
    }

    pub fn assign(lhs: Vec<Expr>, op: AssignOp, rhs: Vec<Expr>) -> Self {
        Self::new(StmtKind::Assign { lhs, op, rhs })
    }

    pub fn define(lhs: Vec<Expr>, rhs: Vec<Expr>) -> Self {
        Self::assign(lhs, AssignOp::Define, rhs)
    }

    pub fn go(fun: Expr, args: Vec<Expr>) -> Self {
        Self::new(StmtKind::Go(CallExpr::new(fun, args)))
    }

    pub fn defer(fun: Expr, args: Vec<Expr>) -> Self {
        Self::new(StmtKind::Defer(CallExpr::new(fun, args)))
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(Block::new(stmts)))
    }

    pub fn if_then(cond: Expr, stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::If {
            init: None,
            cond,
            then: Block::new(stmts),
            els: None,
        })
    }

    pub fn for_ever(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::For {
            init: None,
            cond: None,
            post: None,
            body: Block::new(stmts),
        })
    }

    pub fn select(clauses: Vec<CommClause>) -> Self {
        Self::new(StmtKind::Select { clauses })
    }

    pub fn labeled(label: &str, stmt: Stmt) -> Self {
        Self::new(StmtKind::Labeled {
            label: Ident::new(label),
            stmt: Box::new(stmt),
        })
    }

    pub fn branch(tok: BranchTok, label: Option<&str>) -> Self {
        Self::new(StmtKind::Branch {
            tok,
            label: label.map(Ident::new),
        })
    }

    pub fn ret(results: Vec<Expr>) -> Self {
        Self::new(StmtKind::Return(results))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub pos: Pos,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Ident(String),
    BasicLit {
        kind: LitKind,
        value: String,
    },
    Selector {
        x: Box<Expr>,
        sel: String,
    },
    Call(CallExpr),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Paren(Box<Expr>),
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        x: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        low: Option<Box<Expr>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        high: Option<Box<Expr>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<Box<Expr>>,
    },
    Star(Box<Expr>),
    /// `x.(T)`, or `x.(type)` inside a type switch when `typ` is `None`.
    TypeAssert {
        x: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        typ: Option<TypeExpr>,
    },
    FuncLit(FuncLit),
    CompositeLit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        typ: Option<TypeExpr>,
        #[serde(default)]
        elts: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    Type(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub ellipsis: bool,
}

impl CallExpr {
    pub fn new(fun: Expr, args: Vec<Expr>) -> Self {
        Self {
            fun: Box::new(fun),
            args,
            ellipsis: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncLit {
    #[serde(default)]
    pub sig: Signature,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "^")]
    Xor,
    #[serde(rename = "&")]
    Addr,
    #[serde(rename = "<-")]
    Recv,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Quo,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "&")]
    And,
    #[serde(rename = "|")]
    Or,
    #[serde(rename = "^")]
    Xor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "&^")]
    AndNot,
    #[serde(rename = "&&")]
    LAnd,
    #[serde(rename = "||")]
    LOr,
    #[serde(rename = "==")]
    Eql,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lss,
    #[serde(rename = "<=")]
    Leq,
    #[serde(rename = ">")]
    Gtr,
    #[serde(rename = ">=")]
    Geq,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
            BinaryOp::Eql => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            pos: Pos::NONE,
            kind,
        }
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::BasicLit {
            kind: LitKind::Int,
            value: value.to_string(),
        })
    }

    /// String literal; `value` is the unquoted content.
    pub fn string(value: &str) -> Self {
        Self::new(ExprKind::BasicLit {
            kind: LitKind::String,
            value: format!("{:?}", value),
        })
    }

    pub fn selector(x: Expr, sel: impl Into<String>) -> Self {
        Self::new(ExprKind::Selector {
            x: Box::new(x),
            sel: sel.into(),
        })
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(CallExpr::new(fun, args)))
    }

    /// `qualifier.member(args...)`
    pub fn qualified_call(qualifier: &str, member: &str, args: Vec<Expr>) -> Self {
        Self::call(Self::selector(Self::ident(qualifier), member), args)
    }

    pub fn recv(chan: Expr) -> Self {
        Self::unary(UnaryOp::Recv, chan)
    }

    pub fn unary(op: UnaryOp, x: Expr) -> Self {
        Self::new(ExprKind::Unary { op, x: Box::new(x) })
    }

    pub fn binary(op: BinaryOp, x: Expr, y: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            x: Box::new(x),
            y: Box::new(y),
        })
    }

    pub fn paren(x: Expr) -> Self {
        Self::new(ExprKind::Paren(Box::new(x)))
    }

    pub fn func_lit(stmts: Vec<Stmt>) -> Self {
        Self::new(ExprKind::FuncLit(FuncLit {
            sig: Signature::default(),
            body: Block::new(stmts),
        }))
    }

    pub fn typ(text: &str) -> Self {
        Self::new(ExprKind::Type(TypeExpr::new(text)))
    }

    /// Channel operand when this expression is a receive `<-x`.
    pub fn recv_operand(&self) -> Option<&Expr> {
        match &self.kind {
            ExprKind::Unary {
                op: UnaryOp::Recv,
                x,
            } => Some(x),
            _ => None,
        }
    }

    pub fn is_recv(&self) -> bool {
        self.recv_operand().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_local_name() {
        assert_eq!(ImportSpec::new("time").local_name(), "time");
        assert_eq!(
            ImportSpec::new("github.com/petar/vitamix/vtime").local_name(),
            "vtime"
        );
        assert_eq!(ImportSpec::aliased("clock", "time").local_name(), "clock");
        assert!(!ImportSpec::aliased("_", "time").binds_qualifier());
        assert!(!ImportSpec::aliased(".", "time").binds_qualifier());
    }

    #[test]
    fn test_recv_operand() {
        let recv = Expr::recv(Expr::ident("ch"));
        assert_eq!(recv.recv_operand(), Some(&Expr::ident("ch")));
        assert!(!Expr::paren(recv).is_recv());
    }

    #[test]
    fn test_json_shape_uses_operator_tokens() {
        let stmt = Stmt::define(vec![Expr::ident("v")], vec![Expr::recv(Expr::ident("ch"))]);
        let json = serde_json::to_string(&stmt).unwrap();
        assert!(json.contains("\":=\""), "{}", json);
        assert!(json.contains("\"<-\""), "{}", json);
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }
}
