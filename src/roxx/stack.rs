use super::{operators::Arguments, ExpressionValue};

/// LIFO operand container. Every evaluation gets its own instance.
#[derive(Debug, Default)]
pub struct OperandStack {
    values: Vec<ExpressionValue>,
}

impl OperandStack {
    /// Create an empty instance.
    pub fn new() -> OperandStack {
        OperandStack::default()
    }

    /// Push a value.
    pub fn push(&mut self, value: ExpressionValue) {
        self.values.push(value);
    }

    /// Pop the most recently pushed value.
    pub fn pop(&mut self) -> Option<ExpressionValue> {
        self.values.pop()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pop `count` values, most recently pushed first. Returns `None` on underflow, leaving the
    /// stack untouched.
    pub fn pop_arguments(&mut self, count: usize) -> Option<Arguments> {
        let split_at = self.values.len().checked_sub(count)?;
        let mut values = self.values.split_off(split_at);
        values.reverse();
        Some(Arguments::new(values))
    }

    /// The evaluation result: the only remaining value. Any other stack size means the expression
    /// was malformed.
    pub fn into_result(mut self) -> Option<ExpressionValue> {
        if self.values.len() == 1 {
            self.values.pop()
        } else {
            None
        }
    }
}
