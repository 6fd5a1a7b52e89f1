//! Condition grammar: a small boolean-expression language for action guards.
//!
//! The grammar is fixed (comparisons, boolean connectives, dotted-path
//! references, literals) and is parsed by a recursive-descent parser to an
//! AST evaluated against a read-only JSON context. It is deliberately not a
//! general-purpose evaluator: side effects are impossible and failures are
//! absorbed.
//!
//! [`evaluate`] is fail-closed: any parse error or unresolved reference
//! yields `false`, never an error to the caller. A malformed condition
//! therefore skips its action instead of aborting the chain.

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{CmpOp, Expr};
pub use eval::evaluate;
pub use parser::{parse, ConditionParseError};
