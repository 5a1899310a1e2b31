use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ExpressionValue;

/// Key-value environment (request or user attributes) that expressions are evaluated against.
///
/// Looking up a missing key yields [`ExpressionValue::Undefined`].
///
/// # Examples
/// ```
/// # use rox::{Context, ExpressionValue};
/// let context = Context::new()
///     .with("age", 30.0)
///     .with("is_premium_member", true)
///     .with("username", "john_doe");
///
/// assert_eq!(context.get("age"), ExpressionValue::Number(30.0));
/// assert_eq!(context.get("country"), ExpressionValue::Undefined);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: HashMap<String, ExpressionValue>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Context {
        Context::default()
    }

    /// Value stored under `key`, or [`ExpressionValue::Undefined`] if there is none.
    pub fn get(&self, key: &str) -> ExpressionValue {
        self.values.get(key).cloned().unwrap_or_default()
    }

    /// Set `key` to `value`, replacing the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExpressionValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`Context::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ExpressionValue>) -> Context {
        self.insert(key, value);
        self
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `local` over `self`. Keys present in `local` shadow the same keys in `self`.
    pub fn merged_with(&self, local: Option<&Context>) -> Context {
        let Some(local) = local else {
            return self.clone();
        };
        let mut values = self.values.clone();
        values.extend(
            local
                .values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Context { values }
    }
}

impl<K: Into<String>, V: Into<ExpressionValue>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Context {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::ExpressionValue;

    #[test]
    fn local_shadows_global() {
        let global: Context = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        let local: Context = [("a", 3.0), ("c", 4.0)].into_iter().collect();

        let merged = global.merged_with(Some(&local));

        assert_eq!(merged.get("a"), ExpressionValue::Number(3.0));
        assert_eq!(merged.get("b"), ExpressionValue::Number(2.0));
        assert_eq!(merged.get("c"), ExpressionValue::Number(4.0));
        assert_eq!(merged.get("d"), ExpressionValue::Undefined);
    }

    #[test]
    fn merge_does_not_touch_global() {
        let global = Context::new().with("a", "global");
        let local = Context::new().with("a", "local");

        let _ = global.merged_with(Some(&local));

        assert_eq!(global.get("a"), ExpressionValue::from("global"));
        assert_eq!(global.merged_with(None), global);
    }
}
