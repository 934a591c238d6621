//! Error kinds shared by the parser, the tree primitives, the evaluator,
//! the differentiator and the optimizer.
use std::fmt;

/// Every failure of the expression engine.
///
/// Recursive routines stop at the first error and hand it upwards unchanged,
/// there is no aggregation and no retry: all of these are deterministic
/// consequences of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// malformed bracket structure or a missing token; `position` is a byte offset into the source text
    SyntaxError { position: usize, message: String },
    /// insertion into an occupied branch, deletion of an empty one, use of an empty tree
    TreeError(String),
    /// a symbol resolves neither to an operator nor to a bound variable
    InvalidInput(String),
    /// the operator is known but the requested rule is not implemented for this shape
    UnsupportedOperation(String),
    /// an operator node does not carry the children its arity requires
    StructuralError(String),
}

pub type ExprResult<T> = Result<T, ExprError>;

impl ExprError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        ExprError::SyntaxError {
            position,
            message: message.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, ExprError::SyntaxError { .. })
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprError::SyntaxError { position, message } => {
                write!(f, "Syntax error at byte {}: {}", position, message)
            }
            ExprError::TreeError(msg) => write!(f, "Tree error: {}", msg),
            ExprError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ExprError::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
            ExprError::StructuralError(msg) => write!(f, "Structural error: {}", msg),
        }
    }
}

impl std::error::Error for ExprError {}
