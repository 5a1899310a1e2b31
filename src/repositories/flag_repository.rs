use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::Variant;

type FlagAddedHandler = Arc<dyn Fn(&Variant) + Send + Sync>;

/// Registry of flags and variants by name.
///
/// Entries are only ever added. Adding under an existing name silently replaces the stored
/// variant. Every add notifies the registered "flag added" handlers synchronously, after the
/// table lock has been released.
#[derive(Default)]
pub struct FlagRepository {
    flags: RwLock<HashMap<String, Variant>>,
    added_handlers: RwLock<Vec<FlagAddedHandler>>,
}

impl FlagRepository {
    /// Create an empty instance.
    pub fn new() -> Self {
        FlagRepository::default()
    }

    /// Assign `name` to `variant` and store it. Returns the variant previously stored under
    /// `name`, if any.
    pub fn add_flag(&self, variant: Variant, name: &str) -> Option<Variant> {
        variant.set_name(name);

        let previous = self
            .flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), variant.clone());
        if previous.is_some() {
            log::warn!(target: "rox", flag_name = name; "flag with the same name already exists, replacing it");
        }

        self.notify_added(&variant);
        previous
    }

    /// Return the variant stored under `name`, or add the one produced by `create`.
    ///
    /// Lookup and insert happen under one lock, so concurrent callers agree on a single instance.
    pub fn get_or_add_flag(&self, name: &str, create: impl FnOnce() -> Variant) -> Variant {
        let variant = {
            let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = flags.get(name) {
                return existing.clone();
            }
            let variant = create();
            variant.set_name(name);
            flags.insert(name.to_owned(), variant.clone());
            variant
        };

        self.notify_added(&variant);
        variant
    }

    /// Variant stored under `name`.
    pub fn get_flag(&self, name: &str) -> Option<Variant> {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of all flags. Later additions are not reflected in the returned map.
    pub fn get_all_flags(&self) -> HashMap<String, Variant> {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscribe to flag additions. Handlers cannot be unregistered.
    pub fn register_flag_added_handler(&self, handler: impl Fn(&Variant) + Send + Sync + 'static) {
        self.added_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    fn notify_added(&self, variant: &Variant) {
        // Cloned out, so a handler may register further handlers or read the repository.
        let handlers = self
            .added_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler(variant);
        }
    }
}
