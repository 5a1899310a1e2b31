use std::sync::{Arc, PoisonError, RwLock};

use super::{node, Node, OperandStack, Operator, OperatorRegistry};
use crate::{Context, ExpressionValue};

/// Stack-machine evaluator for targeting expressions.
///
/// Holds the operator registry and the global (ambient) context. The global context is set once
/// at construction and merged under the per-call context by [`Variant`](crate::Variant).
///
/// Evaluation never fails: malformed expressions, unknown operators, mistyped operands and
/// unbalanced stacks all produce [`ExpressionValue::Undefined`].
#[derive(Debug)]
pub struct Evaluator {
    registry: RwLock<OperatorRegistry>,
    global_context: Arc<Context>,
}

impl Evaluator {
    /// Create an evaluator with the built-in operators.
    pub fn new(global_context: Context) -> Evaluator {
        Evaluator::with_registry(OperatorRegistry::with_builtins(), global_context)
    }

    /// Create an evaluator with a prepared registry.
    pub fn with_registry(registry: OperatorRegistry, global_context: Context) -> Evaluator {
        Evaluator {
            registry: RwLock::new(registry),
            global_context: Arc::new(global_context),
        }
    }

    /// Context merged under every per-call context.
    pub fn global_context(&self) -> &Arc<Context> {
        &self.global_context
    }

    /// Register an additional operator. An existing operator with the same name is replaced.
    pub fn register_operator(&self, name: impl Into<String>, operator: Operator) {
        let name = name.into();
        let previous = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name.clone(), operator);
        if previous.is_some() {
            log::warn!(target: "rox", operator:display = name; "replaced existing operator");
        }
    }

    /// Apply `f` to the registry while holding the write lock.
    pub fn update_registry(&self, f: impl FnOnce(&mut OperatorRegistry)) {
        f(&mut self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner));
    }

    /// Evaluate `expression` against `context`. `context` is used as-is: merging with the global
    /// context is the caller's job.
    pub fn evaluate_expression(&self, expression: &str, context: &Context) -> ExpressionValue {
        let nodes = match node::build(expression) {
            Ok(nodes) => nodes,
            Err(err) => {
                log::debug!(target: "rox", expression; "failed to parse expression: {err}");
                return ExpressionValue::Undefined;
            }
        };

        let mut stack = OperandStack::new();
        for node in nodes {
            match node {
                Node::Operand(value) => stack.push(value),
                Node::Operator { name, arity } => {
                    let Some(arguments) = stack.pop_arguments(arity) else {
                        log::debug!(target: "rox", expression; "operand stack underflow");
                        return ExpressionValue::Undefined;
                    };
                    let value = match self.lookup(&name) {
                        Some(operator) => operator.call(arguments, context),
                        None => {
                            log::debug!(target: "rox", expression, operator:display = name; "unknown operator");
                            ExpressionValue::Undefined
                        }
                    };
                    stack.push(value);
                }
            }
        }

        let depth = stack.len();
        stack.into_result().unwrap_or_else(|| {
            log::debug!(target: "rox", expression, depth; "expression left an unbalanced stack");
            ExpressionValue::Undefined
        })
    }

    /// Operators are cloned out of the registry, so the lock is not held while user-provided
    /// operators (e.g., custom property generators) run.
    fn lookup(&self, name: &str) -> Option<Operator> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(Context::default())
    }
}
