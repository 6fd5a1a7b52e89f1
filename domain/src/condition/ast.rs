//! Condition expression AST

/// Comparison operators supported by the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(&self) -> &str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal string value
    Str(String),
    /// Literal number
    Num(f64),
    /// Literal boolean
    Bool(bool),
    /// Literal null
    Null,
    /// Dotted-path reference into the evaluation context
    Path(Vec<String>),
    /// Logical negation
    Not(Box<Expr>),
    /// Conjunction; both sides evaluate strictly
    And(Box<Expr>, Box<Expr>),
    /// Disjunction; both sides evaluate strictly
    Or(Box<Expr>, Box<Expr>),
    /// Comparison between two operands
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}
