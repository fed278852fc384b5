//! Abstract syntax tree for the checked subset of C.
//!
//! The checker does not need full C semantics: it needs every control
//! construct, function calls, and enough expression structure to render a
//! condition back to a canonical string. Everything the front-end cannot
//! (or need not) model folds into [`Expr::Verbatim`], which carries the
//! normalized source text and is treated as an opaque leaf.
//!
//! Statements and expressions are owned trees; the analysis borrows them
//! immutably for the whole walk, so node identity (`&Stmt` pointer equality)
//! is stable and is used for source-order queries such as backward-goto
//! classification.

mod printer;

pub use printer::expr_key;

/// A parsed translation unit: the function definitions of one file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationUnit {
    pub functions: Vec<FuncDef>,
}

/// One function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    /// Function name, from the innermost declarator.
    pub name: String,
    /// 1-indexed line of the definition.
    pub line: u32,
    /// 1-indexed line of the closing brace.
    pub end_line: u32,
    /// The body compound statement.
    pub body: Stmt,
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `{ ... }`
    Compound(Vec<Stmt>),
    /// Expression statement.
    Expr(Expr),
    /// A declaration; only the initializer expressions matter to the
    /// analysis (calls inside them count).
    Decl(Vec<Expr>),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Switch {
        cond: Expr,
        body: Box<Stmt>,
    },
    /// `case expr:` (guard present) or `default:` (guard absent), together
    /// with the statements that belong to the label.
    Case {
        guard: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Goto(String),
    Label {
        name: String,
        stmt: Box<Stmt>,
    },
    Empty,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    /// Integer, character, or string literal, kept as written.
    Constant(String),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
        /// `x++` vs `++x`.
        postfix: bool,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        field: String,
        /// `->` rather than `.`.
        arrow: bool,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Cast {
        ty: String,
        operand: Box<Expr>,
    },
    Comma(Vec<Expr>),
    /// Opaque source text the front-end does not model further.
    Verbatim(String),
}

impl Expr {
    /// The callee name, if this is a call through a bare identifier.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { callee, .. } => match callee.as_ref() {
                Expr::Ident(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Integer value of a constant, if it is one (`1`, `0x1`, `01`, `1UL`).
    pub fn int_value(&self) -> Option<i64> {
        let Expr::Constant(text) = self else {
            return None;
        };
        let t = text.trim_end_matches(['u', 'U', 'l', 'L']);
        if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16).ok();
        }
        if t.len() > 1 && t.starts_with('0') {
            return i64::from_str_radix(&t[1..], 8).ok();
        }
        t.parse().ok()
    }

    /// True for a constant condition that can never be false, as in
    /// `while (1)`.
    pub fn is_nonzero_constant(&self) -> bool {
        matches!(self.int_value(), Some(v) if v != 0)
    }
}
