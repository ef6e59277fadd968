//! Resolved form state shared with the renderer

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::component::Component;
use crate::state::FormDefinition;

/// Location of a component inside the definition tree.
///
/// The flat component list is made of keys, so the tree stays the single
/// owner of every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    pub page: usize,
    pub section: usize,
    pub component: usize,
}

/// A form together with its data record for one editing session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    /// Components in document order
    pub components: Vec<ComponentKey>,
    pub data: Value,
    pub form: FormDefinition,
}

impl FormState {
    pub fn component(&self, key: ComponentKey) -> Option<&Component> {
        self.form.component(key)
    }

    pub fn component_mut(&mut self, key: ComponentKey) -> Option<&mut Component> {
        self.form.component_mut(key)
    }

    /// Components in document order with their keys
    pub fn components(&self) -> impl Iterator<Item = (ComponentKey, &Component)> + '_ {
        self.components
            .iter()
            .filter_map(|&key| self.form.component(key).map(|c| (key, c)))
    }

    pub fn find_by_id(&self, id: &str) -> Option<ComponentKey> {
        self.components()
            .find(|(_, c)| c.component_id.as_deref() == Some(id))
            .map(|(key, _)| key)
    }

    /// First component bound to `schema`
    pub fn find_by_schema(&self, schema: &str) -> Option<ComponentKey> {
        self.components()
            .find(|(_, c)| c.schema.as_deref() == Some(schema))
            .map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
