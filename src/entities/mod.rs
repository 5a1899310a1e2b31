//! Flags, variants and experiments.
mod experiment;
mod flag;
mod variant;

pub use experiment::{Experiment, ExperimentModel};
pub use flag::Flag;
pub use variant::{Variant, VariantValue};

pub(crate) use flag::bool_to_value;
pub(crate) use flag::FLAG_TRUE_VALUE;
