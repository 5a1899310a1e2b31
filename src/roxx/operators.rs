//! Operator registry and built-in operators.
//!
//! Every operator receives its operands in call order and must push exactly one value back. An
//! operator never fails: operands of the wrong type produce a safe local result (`false` or
//! `Undefined`) instead.

use std::{collections::HashMap, fmt, sync::Arc};

use base64::Engine;
use chrono::Utc;
use semver::Version;

use crate::{Context, ExpressionValue};

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` operands.
    Exactly(usize),
    /// At least `n` operands.
    AtLeast(usize),
}

impl Arity {
    /// Whether a call with `count` operands is valid.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// Operands of a single operator call, in call order.
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<ExpressionValue>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<ExpressionValue>) -> Arguments {
        Arguments {
            values: values.into_iter(),
        }
    }

    /// Next operand, or `Undefined` once all operands have been consumed.
    pub fn pop(&mut self) -> ExpressionValue {
        self.values.next().unwrap_or_default()
    }

    /// Number of operands not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl Iterator for Arguments {
    type Item = ExpressionValue;

    fn next(&mut self) -> Option<ExpressionValue> {
        self.values.next()
    }
}

/// Signature of an operator implementation.
pub type Operation = dyn Fn(&mut Arguments, &Context) -> ExpressionValue + Send + Sync;

/// A named operation together with the number of operands it takes.
#[derive(Clone)]
pub struct Operator {
    arity: Arity,
    operation: Arc<Operation>,
}

impl Operator {
    /// Create an operator that accepts `arity` operands.
    pub fn new(
        arity: Arity,
        operation: impl Fn(&mut Arguments, &Context) -> ExpressionValue + Send + Sync + 'static,
    ) -> Operator {
        Operator {
            arity,
            operation: Arc::new(operation),
        }
    }

    /// Number of operands the operator accepts.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Run the operator. A call with an unsupported number of operands yields `Undefined`.
    pub fn call(&self, mut arguments: Arguments, context: &Context) -> ExpressionValue {
        if !self.arity.accepts(arguments.remaining()) {
            return ExpressionValue::Undefined;
        }
        (self.operation)(&mut arguments, context)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name to operator map. Registering an existing name replaces the previous operator.
#[derive(Debug, Default, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Operator>,
}

impl OperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> OperatorRegistry {
        OperatorRegistry::default()
    }

    /// Create a registry pre-populated with the built-in operators.
    pub fn with_builtins() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        register_builtins(&mut registry);
        registry
    }

    /// Returns the replaced operator, if any.
    pub fn register(&mut self, name: impl Into<String>, operator: Operator) -> Option<Operator> {
        self.operators.insert(name.into(), operator)
    }

    /// Operator registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.operators.get(name)
    }

    /// Whether an operator is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }
}

fn register_builtins(registry: &mut OperatorRegistry) {
    registry.register(
        "isUndefined",
        Operator::new(Arity::Exactly(1), |args, _| args.pop().is_undefined().into()),
    );
    registry.register(
        "now",
        Operator::new(Arity::Exactly(0), |_, _| {
            (Utc::now().timestamp_millis() as f64).into()
        }),
    );

    registry.register("and", Operator::new(Arity::AtLeast(2), |args, _| and(args)));
    registry.register("or", Operator::new(Arity::AtLeast(2), |args, _| or(args)));
    registry.register(
        "not",
        Operator::new(Arity::Exactly(1), |args, _| {
            truthiness(&args.pop())
                .map(|b| ExpressionValue::Boolean(!b))
                .into()
        }),
    );
    registry.register(
        "ifThen",
        Operator::new(Arity::Exactly(3), |args, _| {
            let condition = args.pop();
            let then_value = args.pop();
            let else_value = args.pop();
            match truthiness(&condition) {
                Some(true) => then_value,
                Some(false) => else_value,
                None => ExpressionValue::Undefined,
            }
        }),
    );

    registry.register(
        "eq",
        Operator::new(Arity::Exactly(2), |args, _| (args.pop() == args.pop()).into()),
    );
    registry.register(
        "ne",
        Operator::new(Arity::Exactly(2), |args, _| (args.pop() != args.pop()).into()),
    );

    let numeric: [(&str, fn(f64, f64) -> bool); 6] = [
        ("lt", |a, b| a < b),
        ("lte", |a, b| a <= b),
        ("gt", |a, b| a > b),
        ("gte", |a, b| a >= b),
        ("numeq", |a, b| a == b),
        ("numne", |a, b| a != b),
    ];
    for (name, compare) in numeric {
        registry.register(
            name,
            Operator::new(Arity::Exactly(2), move |args, _| {
                let (a, b) = (args.pop(), args.pop());
                match (a.as_number(), b.as_number()) {
                    (Some(a), Some(b)) => compare(a, b).into(),
                    _ => false.into(),
                }
            }),
        );
    }

    let semver: [(&str, fn(&Version, &Version) -> bool); 6] = [
        ("semverEq", |a, b| a == b),
        ("semverNe", |a, b| a != b),
        ("semverLt", |a, b| a < b),
        ("semverLte", |a, b| a <= b),
        ("semverGt", |a, b| a > b),
        ("semverGte", |a, b| a >= b),
    ];
    for (name, compare) in semver {
        registry.register(
            name,
            Operator::new(Arity::Exactly(2), move |args, _| {
                let (a, b) = (args.pop(), args.pop());
                match (parse_version(&a), parse_version(&b)) {
                    (Some(a), Some(b)) => compare(&a, &b).into(),
                    _ => false.into(),
                }
            }),
        );
    }

    registry.register(
        "md5",
        Operator::new(Arity::Exactly(1), |args, _| match args.pop() {
            ExpressionValue::String(s) => format!("{:x}", md5::compute(s)).into(),
            _ => ExpressionValue::Undefined,
        }),
    );
    registry.register(
        "concat",
        Operator::new(Arity::Exactly(2), |args, _| match (args.pop(), args.pop()) {
            (ExpressionValue::String(a), ExpressionValue::String(b)) => (a + &b).into(),
            _ => ExpressionValue::Undefined,
        }),
    );
    registry.register(
        "b64d",
        Operator::new(Arity::Exactly(1), |args, _| {
            let ExpressionValue::String(encoded) = args.pop() else {
                return ExpressionValue::Undefined;
            };
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .map(ExpressionValue::String)
                .into()
        }),
    );

    registry.register(
        "isInPercentage",
        Operator::new(Arity::Exactly(2), |args, _| {
            let (percentage, seed) = (args.pop(), args.pop());
            match (percentage.as_number(), seed.as_str()) {
                (Some(percentage), Some(seed)) => (bucket(seed) < percentage).into(),
                _ => false.into(),
            }
        }),
    );
    registry.register(
        "isInPercentageRange",
        Operator::new(Arity::Exactly(3), |args, _| {
            let (low, high, seed) = (args.pop(), args.pop(), args.pop());
            match (low.as_number(), high.as_number(), seed.as_str()) {
                (Some(low), Some(high), Some(seed)) => {
                    let bucket = bucket(seed);
                    (low <= bucket && bucket < high).into()
                }
                _ => false.into(),
            }
        }),
    );
}

/// `Undefined` counts as `false`; other non-boolean values have no truthiness.
fn truthiness(value: &ExpressionValue) -> Option<bool> {
    match value {
        ExpressionValue::Boolean(b) => Some(*b),
        ExpressionValue::Undefined => Some(false),
        _ => None,
    }
}

fn and(args: &mut Arguments) -> ExpressionValue {
    let mut result = true;
    for value in args {
        let Some(b) = truthiness(&value) else {
            return ExpressionValue::Undefined;
        };
        result &= b;
    }
    result.into()
}

fn or(args: &mut Arguments) -> ExpressionValue {
    let mut result = false;
    for value in args {
        let Some(b) = truthiness(&value) else {
            return ExpressionValue::Undefined;
        };
        result |= b;
    }
    result.into()
}

fn parse_version(value: &ExpressionValue) -> Option<Version> {
    Version::parse(value.as_str()?).ok()
}

/// Map `seed` uniformly onto `[0, 1)` using the first four bytes of its MD5 digest.
pub(crate) fn bucket(seed: &str) -> f64 {
    let hash = md5::compute(seed);
    let value = u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]);
    let bucket = f64::from(value) / f64::from(u32::MAX);
    if bucket >= 1.0 {
        0.0
    } else {
        bucket
    }
}

#[cfg(test)]
mod tests {
    use super::{bucket, Arguments, Arity, Operator, OperatorRegistry};
    use crate::{Context, ExpressionValue};

    fn call(name: &str, args: Vec<ExpressionValue>) -> ExpressionValue {
        let registry = OperatorRegistry::with_builtins();
        registry
            .get(name)
            .unwrap()
            .call(Arguments::new(args), &Context::new())
    }

    #[test]
    fn boolean_logic() {
        assert_eq!(call("and", vec![true.into(), true.into()]), ExpressionValue::from(true));
        assert_eq!(
            call("and", vec![true.into(), true.into(), false.into()]),
            ExpressionValue::from(false)
        );
        assert_eq!(
            call("or", vec![false.into(), ExpressionValue::Undefined]),
            ExpressionValue::from(false)
        );
        assert_eq!(call("or", vec![false.into(), true.into()]), ExpressionValue::from(true));
        assert_eq!(call("not", vec![ExpressionValue::Undefined]), ExpressionValue::from(true));
        assert_eq!(
            call("and", vec![true.into(), "true".into()]),
            ExpressionValue::Undefined
        );
        assert_eq!(call("not", vec![1.0.into()]), ExpressionValue::Undefined);
    }

    #[test]
    fn if_then() {
        assert_eq!(
            call("ifThen", vec![true.into(), "B".into(), "A".into()]),
            ExpressionValue::from("B")
        );
        assert_eq!(
            call("ifThen", vec![false.into(), "B".into(), "A".into()]),
            ExpressionValue::from("A")
        );
        assert_eq!(
            call("ifThen", vec!["yes".into(), "B".into(), "A".into()]),
            ExpressionValue::Undefined
        );
    }

    #[test]
    fn equality() {
        assert_eq!(call("eq", vec!["a".into(), "a".into()]), ExpressionValue::from(true));
        assert_eq!(call("eq", vec!["1".into(), 1.0.into()]), ExpressionValue::from(false));
        assert_eq!(call("ne", vec![true.into(), false.into()]), ExpressionValue::from(true));
        assert_eq!(
            call(
                "eq",
                vec![ExpressionValue::Undefined, ExpressionValue::Undefined]
            ),
            ExpressionValue::from(true)
        );
    }

    #[test]
    fn numeric_comparisons() {
        assert_eq!(call("lt", vec![17.0.into(), 18.0.into()]), ExpressionValue::from(true));
        assert_eq!(call("lte", vec![18.0.into(), 18.0.into()]), ExpressionValue::from(true));
        assert_eq!(call("gt", vec![18.0.into(), 18.0.into()]), ExpressionValue::from(false));
        assert_eq!(call("gte", vec![19.0.into(), 18.0.into()]), ExpressionValue::from(true));
        assert_eq!(call("numeq", vec![2.0.into(), 2.0.into()]), ExpressionValue::from(true));
        assert_eq!(call("numne", vec![2.0.into(), 2.0.into()]), ExpressionValue::from(false));
        assert_eq!(call("gt", vec!["19".into(), 18.0.into()]), ExpressionValue::from(false));
    }

    #[test]
    fn semver_comparisons() {
        assert_eq!(
            call("semverGte", vec!["1.13.0".into(), "1.5.0".into()]),
            ExpressionValue::from(true)
        );
        assert_eq!(
            call("semverLt", vec!["1.2.0".into(), "1.10.0".into()]),
            ExpressionValue::from(true)
        );
        assert_eq!(
            call("semverEq", vec!["1.0.0".into(), "1.0.0".into()]),
            ExpressionValue::from(true)
        );
        assert_eq!(
            call("semverGt", vec!["not-a-version".into(), "1.0.0".into()]),
            ExpressionValue::from(false)
        );
    }

    #[test]
    fn strings() {
        assert_eq!(
            call("md5", vec!["hello".into()]),
            ExpressionValue::from("5d41402abc4b2a76b9719d911017c592")
        );
        assert_eq!(
            call("concat", vec!["ab".into(), "cd".into()]),
            ExpressionValue::from("abcd")
        );
        assert_eq!(call("b64d", vec!["aGVsbG8=".into()]), ExpressionValue::from("hello"));
        assert_eq!(call("b64d", vec!["%%%".into()]), ExpressionValue::Undefined);
    }

    #[test]
    fn percentage() {
        let b = bucket("seed-1");
        assert!((0.0..1.0).contains(&b));

        assert_eq!(
            call("isInPercentage", vec![1.0.into(), "seed-1".into()]),
            ExpressionValue::from(true)
        );
        assert_eq!(
            call("isInPercentage", vec![0.0.into(), "seed-1".into()]),
            ExpressionValue::from(false)
        );
        assert_eq!(
            call(
                "isInPercentageRange",
                vec![0.0.into(), 1.0.into(), "seed-1".into()]
            ),
            ExpressionValue::from(true)
        );
        assert_eq!(
            call("isInPercentage", vec!["50".into(), "seed-1".into()]),
            ExpressionValue::from(false)
        );
    }

    #[test]
    fn wrong_argument_count_is_undefined() {
        assert_eq!(call("eq", vec![true.into()]), ExpressionValue::Undefined);
        assert_eq!(call("and", vec![true.into()]), ExpressionValue::Undefined);
    }

    #[test]
    fn register_overwrites() {
        let mut registry = OperatorRegistry::with_builtins();
        let previous = registry.register(
            "eq",
            Operator::new(Arity::Exactly(2), |_, _| ExpressionValue::from("custom")),
        );
        assert!(previous.is_some());
        assert_eq!(
            registry
                .get("eq")
                .unwrap()
                .call(Arguments::new(vec![1.0.into(), 1.0.into()]), &Context::new()),
            ExpressionValue::from("custom")
        );
    }
}
