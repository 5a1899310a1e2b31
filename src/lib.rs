//! Rox: feature flags driven by targeting expressions.
//!
//! # Overview
//!
//! The crate revolves around a [`Client`] that owns registered [`Flag`]s and [`Variant`]s and the
//! experiments controlling them. An experiment carries a targeting expression written in a small
//! expression language (see [`roxx`]), for example:
//!
//! ```text
//! ifThen(semverGte(property("app_version"), "2.0.0"), "new-checkout", "old-checkout")
//! ```
//!
//! Flags are registered with explicit [`Container`]s, and experiments are applied with
//! [`Client::set_experiments`] or [`Client::apply_configuration`]. Every flag evaluation merges
//! the client's global [`Context`] with the context passed by the caller, evaluates the bound
//! expression and falls back to the flag default whenever the expression does not produce a
//! value.
//!
//! An [`ImpressionHandler`] should be registered to record which value each evaluation returned.
//!
//! # Error Handling
//!
//! Flag evaluation never fails. Malformed expressions, unknown operators and mistyped operands
//! evaluate to [`ExpressionValue::Undefined`], which makes the flag return its default value.
//!
//! Errors are represented by the [`Error`] enum and are only returned for programming mistakes
//! detected during initialization (e.g., registering the same namespace twice) and for
//! configuration payloads that cannot be read at all.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages with the `rox` target. Consider integrating a `log`-compatible logger implementation
//! for better visibility into flag evaluation.
//!
//! # Examples
//!
//! Examples can be found in the `demos` directory of the `rox` crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod configuration;
mod container;
mod context;
mod custom_property;
mod entities;
mod error;
mod flag_setter;
mod impression;
mod repositories;
pub mod roxx;

pub use client::Client;
pub use config::ClientConfig;
pub use container::Container;
pub use context::Context;
pub use custom_property::{CustomProperty, CustomPropertyProvider, CustomPropertyType};
pub use entities::{Experiment, ExperimentModel, Flag, Variant, VariantValue};
pub use error::{Error, Result};
pub use impression::{Analytics, ImpressionArgs, ImpressionHandler, ImpressionInvoker, ReportingValue};
pub use repositories::{CustomPropertyRepository, ExperimentRepository, Experiments, FlagRepository};
pub use roxx::ExpressionValue;
