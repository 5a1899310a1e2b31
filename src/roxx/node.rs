//! Turns tokens into a flat node sequence that a single left-to-right stack pass can evaluate.
//!
//! Every operator node is emitted right after the nodes of its arguments. Arguments are emitted
//! last-to-first, so when the operator runs, its first argument sits on top of the stack and
//! popping yields the arguments in call order.

use super::{
    tokenizer::{Spanned, Token, Tokenizer},
    ExpressionValue, ParseError,
};

/// Calls nested deeper than this are rejected.
pub const MAX_DEPTH: usize = 64;

/// Node of the flattened expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal pushed onto the stack.
    Operand(ExpressionValue),
    /// Call of `name` with the `arity` values on top of the stack.
    Operator {
        /// Registered operator name.
        name: String,
        /// Number of operands to pop.
        arity: usize,
    },
}

/// Parse `expression` into evaluation order.
pub fn build(expression: &str) -> Result<Vec<Node>, ParseError> {
    let tokens = Tokenizer::new(expression).tokenize_all()?;
    let mut builder = NodeBuilder {
        tokens: tokens.into_iter().peekable(),
        end: expression.len(),
    };

    let nodes = builder.expression(0)?;
    if let Some(extra) = builder.tokens.next() {
        return Err(ParseError::TrailingTokens {
            position: extra.position,
        });
    }
    Ok(nodes)
}

struct NodeBuilder {
    tokens: std::iter::Peekable<std::vec::IntoIter<Spanned>>,
    end: usize,
}

impl NodeBuilder {
    fn expression(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        let Some(Spanned { token, position }) = self.tokens.next() else {
            return Err(ParseError::UnexpectedEnd { position: self.end });
        };

        let operand = match token {
            Token::String(s) => ExpressionValue::String(s),
            Token::Number(n) => ExpressionValue::Number(n),
            Token::Boolean(b) => ExpressionValue::Boolean(b),
            Token::Undefined => ExpressionValue::Undefined,
            Token::Identifier(name) => return self.call(name, position, depth),
            token => return Err(ParseError::UnexpectedToken { token, position }),
        };
        Ok(vec![Node::Operand(operand)])
    }

    /// Operator name has already been consumed. A bare name without parentheses is a call with
    /// no arguments.
    fn call(
        &mut self,
        name: String,
        position: usize,
        depth: usize,
    ) -> Result<Vec<Node>, ParseError> {
        if depth >= MAX_DEPTH {
            return Err(ParseError::MaxDepthExceeded { position });
        }

        let mut arguments = Vec::new();
        if self.eat(&Token::LeftParen) {
            if !self.eat(&Token::RightParen) {
                loop {
                    arguments.push(self.expression(depth + 1)?);
                    match self.tokens.next() {
                        Some(Spanned {
                            token: Token::Comma,
                            ..
                        }) => continue,
                        Some(Spanned {
                            token: Token::RightParen,
                            ..
                        }) => break,
                        Some(Spanned { token, position }) => {
                            return Err(ParseError::UnexpectedToken { token, position })
                        }
                        None => return Err(ParseError::UnexpectedEnd { position: self.end }),
                    }
                }
            }
        }

        let arity = arguments.len();
        let mut nodes: Vec<Node> = arguments.into_iter().rev().flatten().collect();
        nodes.push(Node::Operator { name, arity });
        Ok(nodes)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        self.tokens
            .next_if(|spanned| &spanned.token == expected)
            .is_some()
    }
}
