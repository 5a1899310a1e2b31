use std::sync::Arc;

use crate::{
    impression::ImpressionInvoker,
    repositories::{ExperimentRepository, Experiments, FlagRepository},
    roxx::Evaluator,
    Variant,
};

/// The binding pass: connects registered variants to the experiments that reference them.
///
/// Every variant gets the shared evaluator and impression invoker. A variant whose name is not
/// referenced by any experiment is bound without an experiment and evaluates to its default.
pub(crate) struct FlagSetter {
    flag_repository: Arc<FlagRepository>,
    binder: Binder,
}

#[derive(Clone)]
struct Binder {
    experiment_repository: Arc<ExperimentRepository>,
    evaluator: Arc<Evaluator>,
    impression_invoker: Arc<ImpressionInvoker>,
}

impl Binder {
    fn bind(&self, experiments: &Experiments, variant: &Variant) {
        let experiment = experiments.get_experiment_by_flag(variant.name());
        log::trace!(target: "rox",
                    flag_name = variant.name(),
                    experiment:display = experiment.map_or("", |model| model.name.as_str());
                    "binding flag");
        variant.set_for_evaluation(
            self.evaluator.clone(),
            experiment.map(|model| &**model),
            self.impression_invoker.clone(),
        );
    }
}

impl FlagSetter {
    /// Create the binding pass and subscribe it to flag additions, so flags registered after a
    /// configuration refresh are bound right away.
    pub fn new(
        flag_repository: Arc<FlagRepository>,
        experiment_repository: Arc<ExperimentRepository>,
        evaluator: Arc<Evaluator>,
        impression_invoker: Arc<ImpressionInvoker>,
    ) -> FlagSetter {
        let binder = Binder {
            experiment_repository,
            evaluator,
            impression_invoker,
        };

        {
            let binder = binder.clone();
            flag_repository.register_flag_added_handler(move |variant: &Variant| {
                binder.bind(&binder.experiment_repository.get_experiments(), variant);
            });
        }

        FlagSetter {
            flag_repository,
            binder,
        }
    }

    /// Rebind every registered flag against the current experiment table.
    pub fn set_experiments(&self) {
        // One snapshot for the whole pass, so all flags see the same configuration.
        let experiments = self.binder.experiment_repository.get_experiments();
        let flags = self.flag_repository.get_all_flags();

        for variant in flags.values() {
            self.binder.bind(&experiments, variant);
        }

        log::info!(target: "rox",
                   experiments = experiments.len(),
                   flags = flags.len();
                   "rebound flags to experiments");
    }
}
