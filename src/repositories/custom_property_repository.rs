use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{CustomProperty, CustomPropertyProvider};

/// In-memory custom property table. Adding a property with an existing name replaces it.
#[derive(Debug, Default)]
pub struct CustomPropertyRepository {
    properties: RwLock<HashMap<String, Arc<CustomProperty>>>,
}

impl CustomPropertyRepository {
    /// Create an empty instance.
    pub fn new() -> Self {
        CustomPropertyRepository::default()
    }

    /// Add `property`, replacing a property with the same name.
    pub fn add_custom_property(&self, property: CustomProperty) {
        let property = Arc::new(property);
        let mut properties = self
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        properties.insert(property.name().to_owned(), property);
    }

    /// Snapshot of all properties.
    pub fn get_all_custom_properties(&self) -> Vec<Arc<CustomProperty>> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl CustomPropertyProvider for CustomPropertyRepository {
    fn get_custom_property(&self, name: &str) -> Option<Arc<CustomProperty>> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
