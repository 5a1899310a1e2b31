use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Context, ExpressionValue};

/// Type of the value a custom property produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomPropertyType {
    /// String value.
    String,
    /// Boolean value.
    Boolean,
    /// Number value.
    Number,
}

/// A named value that targeting expressions can read with `property("name")`.
///
/// The value is either static or computed from the evaluation [`Context`] on every lookup.
///
/// ```
/// # use rox::{Context, CustomProperty, ExpressionValue};
/// let plan = CustomProperty::string("plan", "premium");
/// let age = CustomProperty::computed_number("age", |context: &Context| {
///     context.get("age").as_number()
/// });
///
/// let context = Context::new().with("age", 42.0);
/// assert_eq!(plan.value(&context), ExpressionValue::from("premium"));
/// assert_eq!(age.value(&context), ExpressionValue::Number(42.0));
/// assert_eq!(age.value(&Context::new()), ExpressionValue::Undefined);
/// ```
#[derive(Clone)]
pub struct CustomProperty {
    name: String,
    property_type: CustomPropertyType,
    generator: Generator,
}

type Computed = Arc<dyn Fn(&Context) -> ExpressionValue + Send + Sync>;

#[derive(Clone)]
enum Generator {
    Static(ExpressionValue),
    Computed(Computed),
}

impl CustomProperty {
    /// Property with a fixed string value.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> CustomProperty {
        CustomProperty::new_static(
            name,
            CustomPropertyType::String,
            ExpressionValue::String(value.into()),
        )
    }

    /// Property with a fixed boolean value.
    pub fn boolean(name: impl Into<String>, value: bool) -> CustomProperty {
        CustomProperty::new_static(name, CustomPropertyType::Boolean, value.into())
    }

    /// Property with a fixed number value.
    pub fn number(name: impl Into<String>, value: f64) -> CustomProperty {
        CustomProperty::new_static(name, CustomPropertyType::Number, value.into())
    }

    /// String property computed on every lookup. `None` evaluates to undefined.
    pub fn computed_string(
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<String> + Send + Sync + 'static,
    ) -> CustomProperty {
        CustomProperty::new_computed(name, CustomPropertyType::String, move |context| {
            generator(context).map(ExpressionValue::String).into()
        })
    }

    /// Boolean property computed on every lookup. `None` evaluates to undefined.
    pub fn computed_boolean(
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<bool> + Send + Sync + 'static,
    ) -> CustomProperty {
        CustomProperty::new_computed(name, CustomPropertyType::Boolean, move |context| {
            generator(context).map(ExpressionValue::Boolean).into()
        })
    }

    /// Number property computed on every lookup. `None` evaluates to undefined.
    pub fn computed_number(
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<f64> + Send + Sync + 'static,
    ) -> CustomProperty {
        CustomProperty::new_computed(name, CustomPropertyType::Number, move |context| {
            generator(context).map(ExpressionValue::Number).into()
        })
    }

    fn new_static(
        name: impl Into<String>,
        property_type: CustomPropertyType,
        value: ExpressionValue,
    ) -> CustomProperty {
        CustomProperty {
            name: name.into(),
            property_type,
            generator: Generator::Static(value),
        }
    }

    fn new_computed(
        name: impl Into<String>,
        property_type: CustomPropertyType,
        generator: impl Fn(&Context) -> ExpressionValue + Send + Sync + 'static,
    ) -> CustomProperty {
        CustomProperty {
            name: name.into(),
            property_type,
            generator: Generator::Computed(Arc::new(generator)),
        }
    }

    /// Name of the property.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the produced value.
    pub fn property_type(&self) -> CustomPropertyType {
        self.property_type
    }

    /// Value of the property for `context`. `Undefined` if the generator has no value.
    pub fn value(&self, context: &Context) -> ExpressionValue {
        match &self.generator {
            Generator::Static(value) => value.clone(),
            Generator::Computed(generator) => generator(context),
        }
    }
}

impl fmt::Debug for CustomProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomProperty")
            .field("name", &self.name)
            .field("property_type", &self.property_type)
            .finish_non_exhaustive()
    }
}

/// Source of custom properties for the `property` operator.
pub trait CustomPropertyProvider {
    /// Property registered under `name`.
    fn get_custom_property(&self, name: &str) -> Option<Arc<CustomProperty>>;
}
