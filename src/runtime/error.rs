use miette::Diagnostic;
use thiserror::Error;

use crate::language::ast::BinaryOp;
use crate::language::types::Type;

pub type ScopeResult<T> = Result<T, ScopeError>;

#[derive(Clone, Debug, PartialEq, Eq, Error, Diagnostic)]
pub enum ScopeError {
    #[error("Symbol `{name}` is already declared in scope `{scope}`")]
    #[diagnostic(
        code(yap::scope::redeclaration),
        help("shadow the name in a nested scope or assign to the existing binding")
    )]
    Redeclaration { name: String, scope: String },
}

/// Evaluation never aborts; these are collected by the interpreter as it
/// degrades to a zero value and carries on.
#[derive(Clone, Debug, PartialEq, Eq, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("Division by zero")]
    #[diagnostic(code(yap::runtime::division_by_zero))]
    DivisionByZero { ty: Type },
    #[error("Operator `{op}` is not defined for {ty}")]
    #[diagnostic(code(yap::runtime::unsupported_operand))]
    UnsupportedOperand { op: BinaryOp, ty: Type },
}
