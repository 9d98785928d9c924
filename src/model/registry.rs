use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::field::{CustomFieldDefinition, CustomFieldValue};

/// Name-keyed set of custom field definitions.
///
/// Iteration follows insertion order, which is also the column order of the
/// task grid. Re-registering an existing name replaces the definition in place
/// and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomFieldRegistry {
    fields: IndexMap<String, CustomFieldDefinition>,
}

impl CustomFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CustomFieldDefinition> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CustomFieldDefinition> {
        self.fields.values()
    }

    /// Field names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Insert or overwrite. Returns the previous definition for `def.name`.
    pub fn register(&mut self, def: CustomFieldDefinition) -> Option<CustomFieldDefinition> {
        self.fields.insert(def.name.clone(), def)
    }

    /// Remove by name, preserving the order of the remaining fields
    pub fn unregister(&mut self, name: &str) -> Option<CustomFieldDefinition> {
        self.fields.shift_remove(name)
    }

    /// Default values for a newly created task, one per definition
    pub fn seed_values(&self) -> Vec<CustomFieldValue> {
        self.iter().map(CustomFieldDefinition::seed_value).collect()
    }
}

impl FromIterator<CustomFieldDefinition> for CustomFieldRegistry {
    fn from_iter<I: IntoIterator<Item = CustomFieldDefinition>>(iter: I) -> Self {
        let mut registry = CustomFieldRegistry::new();
        for def in iter {
            registry.register(def);
        }
        registry
    }
}
