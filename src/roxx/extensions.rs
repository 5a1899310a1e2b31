//! Operators that are not part of the core grammar and get registered on top of the built-ins.

use std::sync::Arc;

use regex::Regex;

use super::{Arity, Operator, OperatorRegistry};
use crate::{CustomPropertyProvider, ExpressionValue};

/// Register `match` and `property` into `registry`.
pub fn register_extensions(
    registry: &mut OperatorRegistry,
    custom_properties: Arc<dyn CustomPropertyProvider + Send + Sync>,
) {
    registry.register("match", regex_match());
    registry.register("property", property(custom_properties));
}

/// `match(flags, pattern, value)`: regular-expression match of `value` against `pattern`.
///
/// Non-empty `flags` are applied as an inline group (`(?i)`), so `"i"` makes the match
/// case-insensitive. Non-string operands and invalid patterns yield `false`.
pub fn regex_match() -> Operator {
    Operator::new(Arity::Exactly(3), |args, _| {
        let (flags, pattern, value) = (args.pop(), args.pop(), args.pop());
        let (
            ExpressionValue::String(flags),
            ExpressionValue::String(pattern),
            ExpressionValue::String(value),
        ) = (flags, pattern, value)
        else {
            return false.into();
        };

        let pattern = if flags.is_empty() {
            pattern
        } else {
            format!("(?{flags}){pattern}")
        };

        match Regex::new(&pattern) {
            Ok(regex) => regex.is_match(&value).into(),
            Err(err) => {
                log::debug!(target: "rox", pattern:display = pattern; "invalid regular expression: {err}");
                false.into()
            }
        }
    })
}

/// `property(name)`: value of the custom property `name` for the current context, or
/// `Undefined` if the property is unknown or has no value.
pub fn property(custom_properties: Arc<dyn CustomPropertyProvider + Send + Sync>) -> Operator {
    Operator::new(Arity::Exactly(1), move |args, context| {
        let ExpressionValue::String(name) = args.pop() else {
            return ExpressionValue::Undefined;
        };
        custom_properties
            .get_custom_property(&name)
            .map(|property| property.value(context))
            .unwrap_or_default()
    })
}
