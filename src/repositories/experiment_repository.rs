use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::ExperimentModel;

/// Immutable experiment table. Readers hold on to a snapshot for as long as they need a
/// consistent view.
#[derive(Debug, Default)]
pub struct Experiments {
    models: Vec<Arc<ExperimentModel>>,
    by_flag: HashMap<String, Arc<ExperimentModel>>,
}

impl Experiments {
    fn new(models: Vec<ExperimentModel>) -> Experiments {
        let models: Vec<_> = models.into_iter().map(Arc::new).collect();

        let mut by_flag: HashMap<String, Arc<ExperimentModel>> = HashMap::new();
        for model in &models {
            for flag_name in &model.flags {
                if let Some(existing) = by_flag.get(flag_name) {
                    log::warn!(target: "rox",
                               flag_name = flag_name.as_str(),
                               experiment:display = model.name,
                               bound_experiment:display = existing.name;
                               "flag is referenced by more than one experiment, keeping the first one");
                    continue;
                }
                by_flag.insert(flag_name.clone(), model.clone());
            }
        }

        Experiments { models, by_flag }
    }

    /// Experiment that controls `flag_name`, if any.
    pub fn get_experiment_by_flag(&self, flag_name: &str) -> Option<&Arc<ExperimentModel>> {
        self.by_flag.get(flag_name)
    }

    /// All experiments in configuration order.
    pub fn models(&self) -> &[Arc<ExperimentModel>] {
        &self.models
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Thread-safe storage for the currently active experiments.
///
/// The whole table is replaced on every configuration refresh; a reader observes either the
/// old or the new table, never a mix of both.
#[derive(Debug, Default)]
pub struct ExperimentRepository {
    experiments: RwLock<Arc<Experiments>>,
}

impl ExperimentRepository {
    /// Create an empty instance.
    pub fn new() -> Self {
        ExperimentRepository::default()
    }

    /// Replace all experiments, returning the previous table.
    pub fn set_experiments(&self, models: Vec<ExperimentModel>) -> Arc<Experiments> {
        // Constructing new value before requesting the lock to minimize lock span.
        let new_value = Arc::new(Experiments::new(models));

        let mut slot = self
            .experiments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, new_value)
    }

    /// Experiment that currently controls `flag_name`, if any.
    pub fn get_experiment_by_flag(&self, flag_name: &str) -> Option<Arc<ExperimentModel>> {
        self.get_experiments()
            .get_experiment_by_flag(flag_name)
            .cloned()
    }

    /// Snapshot of the current table.
    pub fn get_experiments(&self) -> Arc<Experiments> {
        self.experiments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
