//! Form definition tree: pages, sections and the components they hold

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::forms::{Component, ComponentKey};

/// Where a form's data record lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub name: String,
    /// Field in the record that holds its identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl DataSource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }
}

/// Entry returned when listing forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A complete form definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl FormDefinition {
    pub fn summary(&self) -> FormSummary {
        FormSummary {
            name: self.name.clone(),
            title: self.title.clone(),
        }
    }

    pub fn component(&self, key: ComponentKey) -> Option<&Component> {
        self.pages
            .get(key.page)?
            .sections
            .get(key.section)?
            .components
            .get(key.component)
    }

    pub fn component_mut(&mut self, key: ComponentKey) -> Option<&mut Component> {
        self.pages
            .get_mut(key.page)?
            .sections
            .get_mut(key.section)?
            .components
            .get_mut(key.component)
    }

    /// Keys of every component in document order
    pub fn keys(&self) -> Vec<ComponentKey> {
        let mut keys = Vec::new();
        for (page, p) in self.pages.iter().enumerate() {
            for (section, s) in p.sections.iter().enumerate() {
                for component in 0..s.components.len() {
                    keys.push(ComponentKey {
                        page,
                        section,
                        component,
                    });
                }
            }
        }
        keys
    }

    /// Copy of the definition with all session values cleared, fit for persisting
    pub fn strip_transient(&self) -> FormDefinition {
        let mut copy = self.clone();
        for page in &mut copy.pages {
            for section in &mut page.sections {
                for component in &mut section.components {
                    component.value = Value::Null;
                    for property in component.properties.values_mut() {
                        property.value = Value::Null;
                    }
                }
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::ValueType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> FormDefinition {
        serde_json::from_value(json!({
            "name": "order",
            "dataSource": {"name": "orders"},
            "pages": [{
                "sections": [
                    {"components": [
                        {"schema": "price", "type": "number", "value": 10},
                        {"schema": "qty", "type": "number"}
                    ]},
                    {"components": [
                        {"schema": "total", "type": "number", "value": 20,
                         "properties": {"value": {"condition": "price * qty", "value": 20}}}
                    ]}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_nested_tree() {
        let form = sample();
        assert_eq!(form.data_source, Some(DataSource::named("orders")));
        assert_eq!(form.pages[0].sections.len(), 2);
        let total = &form.pages[0].sections[1].components[0];
        assert_eq!(total.value_type, ValueType::Number);
        assert_eq!(total.schema.as_deref(), Some("total"));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let form: FormDefinition =
            serde_json::from_value(json!({"name": "x", "pages": [{"sections": [{}]}]})).unwrap();
        assert!(form.pages[0].sections[0].components.is_empty());
        assert!(form.keys().is_empty());
    }

    #[test]
    fn test_keys_follow_document_order() {
        let form = sample();
        let schemas: Vec<_> = form
            .keys()
            .into_iter()
            .filter_map(|key| form.component(key))
            .filter_map(|c| c.schema.clone())
            .collect();
        assert_eq!(schemas, vec!["price", "qty", "total"]);
    }

    #[test]
    fn test_component_out_of_range_is_none() {
        let form = sample();
        let key = ComponentKey {
            page: 0,
            section: 5,
            component: 0,
        };
        assert!(form.component(key).is_none());
    }

    #[test]
    fn test_strip_transient_clears_values_only() {
        let form = sample();
        let stripped = form.strip_transient();
        let total = &stripped.pages[0].sections[1].components[0];
        assert_eq!(total.value, Value::Null);
        assert_eq!(total.properties["value"].value, Value::Null);
        assert_eq!(total.properties["value"].condition.as_deref(), Some("price * qty"));
        // the source definition is untouched
        assert_eq!(form.pages[0].sections[0].components[0].value, json!(10));
    }

    #[test]
    fn test_camel_case_wire_names() {
        let mut form = sample();
        form.pages[0].page_id = Some("p1".into());
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["pages"][0]["pageId"], json!("p1"));
        assert_eq!(json["dataSource"]["name"], json!("orders"));
    }
}
