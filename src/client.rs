use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    configuration::Configuration,
    entities::{bool_to_value, FLAG_TRUE_VALUE},
    flag_setter::FlagSetter,
    impression::{ImpressionHandler, ImpressionInvoker},
    repositories::{CustomPropertyRepository, ExperimentRepository, FlagRepository},
    roxx::{extensions, Evaluator, Operator},
    ClientConfig, Container, Context, CustomProperty, Error, Experiment, ExperimentModel, Flag,
    Result, Variant,
};

/// Entry point for flag registration and evaluation.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// # Examples
/// ```
/// # use rox::{Client, ClientConfig, Container, Flag};
/// let client = Client::new(ClientConfig::new());
///
/// let show_banner = Flag::new(false);
/// client
///     .register(Container::new("app").flag("show_banner", &show_banner))
///     .unwrap();
///
/// assert!(!show_banner.is_enabled(None));
/// ```
pub struct Client {
    evaluator: Arc<Evaluator>,
    flag_repository: Arc<FlagRepository>,
    experiment_repository: Arc<ExperimentRepository>,
    custom_property_repository: Arc<CustomPropertyRepository>,
    impression_invoker: Arc<ImpressionInvoker>,
    flag_setter: FlagSetter,
    namespaces: Mutex<HashSet<String>>,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// ```
    /// # use rox::{Client, ClientConfig};
    /// let client = Client::new(ClientConfig::new());
    /// ```
    pub fn new(config: ClientConfig) -> Self {
        let custom_property_repository = Arc::new(CustomPropertyRepository::new());

        let evaluator = Arc::new(Evaluator::new(config.context));
        {
            let custom_properties = custom_property_repository.clone();
            evaluator.update_registry(|registry| {
                extensions::register_extensions(registry, custom_properties)
            });
        }

        let impression_invoker = match config.analytics {
            Some(analytics) => ImpressionInvoker::with_analytics(analytics),
            None => ImpressionInvoker::new(),
        };
        for handler in config.impression_handlers {
            impression_invoker.register_shared(handler);
        }
        let impression_invoker = Arc::new(impression_invoker);

        let flag_repository = Arc::new(FlagRepository::new());
        let experiment_repository = Arc::new(ExperimentRepository::new());
        let flag_setter = FlagSetter::new(
            flag_repository.clone(),
            experiment_repository.clone(),
            evaluator.clone(),
            impression_invoker.clone(),
        );

        Client {
            evaluator,
            flag_repository,
            experiment_repository,
            custom_property_repository,
            impression_invoker,
            flag_setter,
            namespaces: Mutex::new(HashSet::new()),
        }
    }

    /// Register all flags and variants of `container`.
    ///
    /// Registering the same namespace twice is a programming error and returns
    /// [`Error::DuplicateNamespace`] without registering anything.
    pub fn register(&self, container: Container) -> Result<()> {
        {
            let mut namespaces = self
                .namespaces
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !namespaces.insert(container.namespace().to_owned()) {
                log::error!(target: "rox",
                            namespace = container.namespace();
                            "namespace is already registered");
                return Err(Error::DuplicateNamespace(container.namespace().to_owned()));
            }
        }

        for (name, variant) in container.into_entries() {
            self.flag_repository.add_flag(variant, &name);
        }
        Ok(())
    }

    /// Replace all experiments and rebind every registered flag.
    pub fn set_experiments(&self, experiments: Vec<ExperimentModel>) {
        self.experiment_repository.set_experiments(experiments);
        self.flag_setter.set_experiments();
    }

    /// Parse a JSON configuration payload and apply its experiments.
    ///
    /// Experiments that fail to parse are skipped. An error is returned only when the payload
    /// itself cannot be read, in which case the current experiments are left untouched.
    pub fn apply_configuration(&self, payload: &str) -> Result<()> {
        let configuration = Configuration::from_json(payload).inspect_err(|err| {
            log::warn!(target: "rox", "failed to parse configuration: {err}");
        })?;
        self.set_experiments(configuration.into_experiments());
        Ok(())
    }

    /// Add an impression handler. Handlers cannot be unregistered.
    pub fn register_impression_handler(
        &self,
        handler: impl ImpressionHandler + Send + Sync + 'static,
    ) {
        self.impression_invoker.register(handler);
    }

    /// Register an operator for use in targeting expressions. An operator with the same name
    /// (including a built-in one) is replaced.
    pub fn register_operator(&self, name: impl Into<String>, operator: Operator) {
        self.evaluator.register_operator(name, operator);
    }

    /// Add or replace a custom property readable with `property("name")`.
    pub fn add_custom_property(&self, property: CustomProperty) {
        self.custom_property_repository.add_custom_property(property);
    }

    /// Set a static string custom property.
    pub fn set_custom_string_property(&self, name: impl Into<String>, value: impl Into<String>) {
        self.add_custom_property(CustomProperty::string(name, value));
    }

    /// Set a static boolean custom property.
    pub fn set_custom_boolean_property(&self, name: impl Into<String>, value: bool) {
        self.add_custom_property(CustomProperty::boolean(name, value));
    }

    /// Set a static number custom property.
    pub fn set_custom_number_property(&self, name: impl Into<String>, value: f64) {
        self.add_custom_property(CustomProperty::number(name, value));
    }

    /// Set a string custom property computed from the evaluation context.
    pub fn set_custom_computed_string_property(
        &self,
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<String> + Send + Sync + 'static,
    ) {
        self.add_custom_property(CustomProperty::computed_string(name, generator));
    }

    /// Set a boolean custom property computed from the evaluation context.
    pub fn set_custom_computed_boolean_property(
        &self,
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<bool> + Send + Sync + 'static,
    ) {
        self.add_custom_property(CustomProperty::computed_boolean(name, generator));
    }

    /// Set a number custom property computed from the evaluation context.
    pub fn set_custom_computed_number_property(
        &self,
        name: impl Into<String>,
        generator: impl Fn(&Context) -> Option<f64> + Send + Sync + 'static,
    ) {
        self.add_custom_property(CustomProperty::computed_number(name, generator));
    }

    /// Evaluate the flag `name`.
    ///
    /// A flag that was never registered is created with `default` on the first call and reused
    /// afterwards. Whenever no experiment decides the value, `default` is returned.
    ///
    /// ```
    /// # use rox::ClientConfig;
    /// let client = ClientConfig::new().to_client();
    /// assert!(client.is_enabled("dynamic.flag", true, None));
    /// assert!(!client.is_enabled("dynamic.flag", false, None));
    /// ```
    pub fn is_enabled(&self, name: &str, default: bool, context: Option<&Context>) -> bool {
        let variant = self
            .flag_repository
            .get_or_add_flag(name, || Flag::new(default).into());
        variant
            .get_value_or(context, Some(bool_to_value(default)))
            .value
            == FLAG_TRUE_VALUE
    }

    /// Evaluate the variant `name`. See [`Client::is_enabled`] for how unregistered names and
    /// defaults are handled.
    pub fn value(
        &self,
        name: &str,
        default: &str,
        options: impl IntoIterator<Item = impl Into<String>>,
        context: Option<&Context>,
    ) -> String {
        let variant = self
            .flag_repository
            .get_or_add_flag(name, || Variant::new(default, options));
        variant.get_value_or(context, Some(default)).value
    }

    /// Registered (or dynamically created) flag or variant with the full name `name`.
    pub fn get_flag(&self, name: &str) -> Option<Variant> {
        self.flag_repository.get_flag(name)
    }

    /// Projections of the currently active experiments.
    pub fn experiments(&self) -> Vec<Experiment> {
        self.experiment_repository
            .get_experiments()
            .models()
            .iter()
            .map(|model| Experiment::from(model.as_ref()))
            .collect()
    }
}
