//! Targeting expression language.
//!
//! An expression such as `ifThen(match("i", "^beta", property("email")), "B", "A")` goes through
//! three stages:
//! - the [`tokenizer`] scans it into literals, operator names and call punctuation;
//! - the [`node`] builder flattens the calls into an operand/operator sequence where every
//!   operator follows its arguments;
//! - the [`Evaluator`] runs the sequence on a fresh [`OperandStack`], looking operators up in the
//!   [`OperatorRegistry`].
//!
//! The language is not Turing-complete: there are no loops or user-defined functions, so every
//! evaluation terminates after a single pass over the nodes.
mod evaluator;
pub mod extensions;
pub mod node;
pub mod operators;
mod stack;
pub mod tokenizer;
mod value;

pub use evaluator::Evaluator;
pub use node::Node;
pub use operators::{Arguments, Arity, Operator, OperatorRegistry};
pub use stack::OperandStack;
pub use value::ExpressionValue;

use self::tokenizer::Token;

/// Syntax errors in an expression. They never reach flag callers: the evaluator turns them into
/// [`ExpressionValue::Undefined`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    /// A character that cannot start a token.
    #[error("unexpected character {ch:?} at {position}")]
    UnexpectedCharacter {
        /// Offending character.
        ch: char,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A string literal without a closing quote.
    #[error("unterminated string starting at {position}")]
    UnterminatedString {
        /// Byte offset in the expression.
        position: usize,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number {literal:?} at {position}")]
    InvalidNumber {
        /// Literal as written.
        literal: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A token that is not valid at its position.
    #[error("unexpected token {token:?} at {position}")]
    UnexpectedToken {
        /// Offending token.
        token: Token,
        /// Byte offset in the expression.
        position: usize,
    },

    /// The expression ended in the middle of a call.
    #[error("unexpected end of expression at {position}")]
    UnexpectedEnd {
        /// Byte offset in the expression.
        position: usize,
    },

    /// Input left after a complete expression.
    #[error("unexpected trailing input at {position}")]
    TrailingTokens {
        /// Byte offset in the expression.
        position: usize,
    },

    /// Calls nested too deeply.
    #[error("calls nested too deeply at {position}")]
    MaxDepthExceeded {
        /// Byte offset in the expression.
        position: usize,
    },
}
