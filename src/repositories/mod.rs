//! In-memory tables read by the evaluation path.
mod custom_property_repository;
mod experiment_repository;
mod flag_repository;

pub use custom_property_repository::CustomPropertyRepository;
pub use experiment_repository::{ExperimentRepository, Experiments};
pub use flag_repository::FlagRepository;
