use std::fmt;

use crate::{Context, Experiment, Variant};

pub(crate) const FLAG_TRUE_VALUE: &str = "true";
pub(crate) const FLAG_FALSE_VALUE: &str = "false";

/// A boolean feature flag: a [`Variant`] whose values are `"true"` and `"false"`.
///
/// # Examples
/// ```
/// # use rox::Flag;
/// let show_banner = Flag::new(false);
/// assert!(!show_banner.is_enabled(None));
///
/// show_banner.disabled(None, || println!("banner is hidden"));
/// ```
#[derive(Clone)]
pub struct Flag {
    variant: Variant,
}

impl Flag {
    /// Create an unnamed flag with the given default.
    pub fn new(default_value: bool) -> Flag {
        Flag {
            variant: Variant::new(
                bool_to_value(default_value),
                [FLAG_FALSE_VALUE, FLAG_TRUE_VALUE],
            ),
        }
    }

    /// Whether the flag evaluates to `true` for `context`. Emits one impression.
    pub fn is_enabled(&self, context: Option<&Context>) -> bool {
        self.variant.get_value(context).value == FLAG_TRUE_VALUE
    }

    /// Run `action` if the flag is enabled for `context`.
    pub fn enabled(&self, context: Option<&Context>, action: impl FnOnce()) {
        if self.is_enabled(context) {
            action();
        }
    }

    /// Run `action` if the flag is disabled for `context`.
    pub fn disabled(&self, context: Option<&Context>, action: impl FnOnce()) {
        if !self.is_enabled(context) {
            action();
        }
    }

    /// Name assigned on registration. Empty until then.
    pub fn name(&self) -> &str {
        self.variant.name()
    }

    /// Value returned when no experiment decides.
    pub fn default_value(&self) -> bool {
        self.variant.default_value() == FLAG_TRUE_VALUE
    }

    /// Experiment currently bound to the flag.
    pub fn experiment(&self) -> Option<Experiment> {
        self.variant.experiment()
    }

    /// The underlying variant, as stored in the flag repository.
    pub fn variant(&self) -> &Variant {
        &self.variant
    }
}

impl From<Flag> for Variant {
    fn from(flag: Flag) -> Variant {
        flag.variant
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Flag").field(&self.variant).finish()
    }
}

pub(crate) fn bool_to_value(value: bool) -> &'static str {
    if value {
        FLAG_TRUE_VALUE
    } else {
        FLAG_FALSE_VALUE
    }
}
