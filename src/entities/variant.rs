use std::{
    fmt,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use serde::Serialize;

use crate::{
    impression::{ImpressionInvoker, ReportingValue},
    roxx::Evaluator,
    Context, Experiment, ExperimentModel,
};

/// Result of a variant evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantValue {
    /// Returned value.
    pub value: String,
    /// `true` when `value` is the default because no experiment decided otherwise.
    pub is_default: bool,
}

/// A named value slot with a default and a set of allowed options, optionally bound to an
/// experiment.
///
/// `Variant` is a cheap handle: clones share the same underlying slot, so the instance kept by
/// application code observes bindings made through the flag repository.
///
/// # Examples
/// ```
/// # use rox::Variant;
/// let color = Variant::new("red", ["red", "green", "blue"]);
/// let value = color.get_value(None);
/// assert_eq!(value.value, "red");
/// assert!(value.is_default);
/// ```
#[derive(Clone)]
pub struct Variant {
    inner: Arc<VariantInner>,
}

struct VariantInner {
    default_value: String,
    options: Vec<String>,
    name: OnceLock<String>,
    binding: RwLock<Binding>,
}

/// Everything a variant needs to evaluate itself. Injected by the binding pass.
#[derive(Clone, Default)]
pub(crate) struct Binding {
    pub evaluator: Option<Arc<Evaluator>>,
    pub experiment: Option<Arc<BoundExperiment>>,
    pub impression_invoker: Option<Arc<ImpressionInvoker>>,
}

pub(crate) struct BoundExperiment {
    pub experiment: Experiment,
    pub condition: String,
}

impl From<&ExperimentModel> for BoundExperiment {
    fn from(model: &ExperimentModel) -> BoundExperiment {
        BoundExperiment {
            experiment: model.into(),
            condition: model.condition.clone(),
        }
    }
}

impl Variant {
    /// Create a variant. `default_value` is always part of the options, even when `options`
    /// does not list it.
    pub fn new(
        default_value: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Variant {
        let default_value = default_value.into();

        let mut all_options = vec![default_value.clone()];
        for option in options {
            let option = option.into();
            if !all_options.contains(&option) {
                all_options.push(option);
            }
        }

        Variant {
            inner: Arc::new(VariantInner {
                default_value,
                options: all_options,
                name: OnceLock::new(),
                binding: RwLock::default(),
            }),
        }
    }

    /// Name assigned when the variant was added to the flag repository. Empty until then.
    pub fn name(&self) -> &str {
        self.inner.name.get().map(String::as_str).unwrap_or_default()
    }

    /// Value returned when no experiment decides.
    pub fn default_value(&self) -> &str {
        &self.inner.default_value
    }

    /// Allowed options. The default value is always the first one.
    pub fn options(&self) -> &[String] {
        &self.inner.options
    }

    /// Experiment currently bound to the variant.
    pub fn experiment(&self) -> Option<Experiment> {
        self.binding()
            .experiment
            .as_ref()
            .map(|bound| bound.experiment.clone())
    }

    /// Evaluate the variant for `context`.
    ///
    /// When bound, the experiment condition is evaluated against the global context overlaid
    /// with `context`. If the variant is unbound or the condition evaluates to undefined, the
    /// default value is returned.
    ///
    /// The evaluated value is returned as-is, even when it is not one of [`Variant::options`].
    ///
    /// Every call emits exactly one impression (once the variant is bound to an impression
    /// invoker).
    pub fn get_value(&self, context: Option<&Context>) -> VariantValue {
        self.get_value_or(context, None)
    }

    /// [`Variant::get_value`] with `default_override` replacing the stored default.
    pub(crate) fn get_value_or(
        &self,
        context: Option<&Context>,
        default_override: Option<&str>,
    ) -> VariantValue {
        let binding = self.binding();

        let merged_context = match &binding.evaluator {
            Some(evaluator) => evaluator.global_context().merged_with(context),
            None => context.cloned().unwrap_or_default(),
        };

        let evaluated = match (&binding.evaluator, &binding.experiment) {
            (Some(evaluator), Some(bound)) => evaluator
                .evaluate_expression(&bound.condition, &merged_context)
                .to_value_string(),
            _ => None,
        };

        let result = match evaluated {
            Some(value) => VariantValue {
                value,
                is_default: false,
            },
            None => VariantValue {
                value: default_override
                    .unwrap_or(&self.inner.default_value)
                    .to_owned(),
                is_default: true,
            },
        };

        if !result.is_default && !self.inner.options.contains(&result.value) {
            log::debug!(target: "rox",
                        flag_name = self.name(),
                        value:display = result.value;
                        "evaluated value is not one of the variant options");
        }
        log::trace!(target: "rox",
                    flag_name = self.name(),
                    result:serde = result;
                    "evaluated a variant");

        if let Some(invoker) = &binding.impression_invoker {
            invoker.invoke(
                ReportingValue::new(self.name(), result.value.clone()),
                binding
                    .experiment
                    .as_ref()
                    .map(|bound| bound.experiment.clone()),
                Arc::new(merged_context),
            );
        }

        result
    }

    /// Assign the repository name. A variant keeps the first name it was given.
    pub(crate) fn set_name(&self, name: &str) {
        if let Err(rejected) = self.inner.name.set(name.to_owned()) {
            if rejected != self.name() {
                log::warn!(target: "rox",
                           flag_name = self.name(),
                           rejected_name:display = rejected;
                           "variant already has a name, keeping the original one");
            }
        }
    }

    /// Bind (or unbind, with `experiment: None`) the variant. Replaces the previous binding.
    pub(crate) fn set_for_evaluation(
        &self,
        evaluator: Arc<Evaluator>,
        experiment: Option<&ExperimentModel>,
        impression_invoker: Arc<ImpressionInvoker>,
    ) {
        let binding = Binding {
            evaluator: Some(evaluator),
            experiment: experiment.map(|model| Arc::new(model.into())),
            impression_invoker: Some(impression_invoker),
        };
        *self
            .inner
            .binding
            .write()
            .unwrap_or_else(PoisonError::into_inner) = binding;
    }

    /// Snapshot of the binding. The lock is released before evaluation, so a concurrent rebind
    /// never blocks on a running impression handler.
    fn binding(&self) -> Binding {
        self.inner
            .binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether both handles point to the same variant.
    pub fn ptr_eq(&self, other: &Variant) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name())
            .field("default_value", &self.inner.default_value)
            .field("options", &self.inner.options)
            .field("experiment", &self.experiment())
            .finish()
    }
}
