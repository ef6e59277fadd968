//! Form components and their conditional properties

use serde::{Deserialize, Serialize};
use serde_json::Value;
use indexmap::IndexMap;

use crate::coerce::ValueType;

/// Property whose result is computed into the component's value
pub const VALUE_PROPERTY: &str = "value";

/// A named property driven by a condition expression
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Result of the last evaluation
    #[serde(default)]
    pub value: Value,
}

impl Property {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            value: Value::Null,
        }
    }

    /// The condition, unless absent or blank
    pub fn active_condition(&self) -> Option<&str> {
        self.condition.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// A single component bound to the data record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    /// Widget the renderer should use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub value: Value,
    /// Evaluated in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Property>,
}

impl Component {
    /// Create a component bound to `schema`
    pub fn new(schema: &str, value_type: ValueType) -> Self {
        Self {
            schema: Some(schema.to_string()),
            value_type,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Attach a conditional property
    pub fn with_property(mut self, name: &str, condition: &str) -> Self {
        self.properties
            .insert(name.to_string(), Property::new(condition));
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Condition of the computed value property, if declared
    pub fn value_condition(&self) -> Option<&str> {
        self.property(VALUE_PROPERTY)
            .and_then(Property::active_condition)
    }

    /// Whether the schema is a bare top-level key
    pub fn has_bare_schema(&self) -> bool {
        self.schema.as_deref().is_some_and(|s| !s.contains('.'))
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        match self.property(name).map(|p| &p.value) {
            Some(Value::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flag("visible", true)
    }

    pub fn is_enabled(&self) -> bool {
        self.flag("enabled", true)
    }

    pub fn is_required(&self) -> bool {
        self.flag("required", false)
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(true) => "yes".to_string(),
            Value::Bool(false) => "no".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_component_defaults() {
        let c = Component::new("person.age", ValueType::Number).with_label("Age");
        assert_eq!(c.label.as_deref(), Some("Age"));
        assert_eq!(c.schema.as_deref(), Some("person.age"));
        assert!(c.component_id.is_none());
        assert_eq!(c.value, Value::Null);
        assert!(c.properties.is_empty());
    }

    #[test]
    fn test_blank_condition_is_inactive() {
        assert_eq!(Property::new("  ").active_condition(), None);
        assert_eq!(Property::default().active_condition(), None);
        assert_eq!(Property::new("a").active_condition(), Some("a"));
    }

    #[test]
    fn test_value_condition() {
        let c = Component::new("total", ValueType::Number).with_property("value", "a + b");
        assert_eq!(c.value_condition(), Some("a + b"));
        assert_eq!(Component::default().value_condition(), None);
    }

    #[test]
    fn test_bare_schema() {
        assert!(Component::new("name", ValueType::Text).has_bare_schema());
        assert!(!Component::new("person.name", ValueType::Text).has_bare_schema());
        assert!(!Component::default().has_bare_schema());
    }

    #[test]
    fn test_flags_default_until_evaluated() {
        let mut c = Component::new("x", ValueType::Text).with_property("visible", "false");
        assert!(c.is_visible());
        assert!(c.is_enabled());
        assert!(!c.is_required());

        c.properties.get_mut("visible").unwrap().value = json!(false);
        assert!(!c.is_visible());
    }

    #[test]
    fn test_display_value() {
        let mut c = Component::new("x", ValueType::Any);
        assert_eq!(c.display_value(), "");
        c.value = json!("Ada");
        assert_eq!(c.display_value(), "Ada");
        c.value = json!(2.5);
        assert_eq!(c.display_value(), "2.5");
        c.value = json!(true);
        assert_eq!(c.display_value(), "yes");
    }

    #[test]
    fn test_type_field_name_on_the_wire() {
        let c: Component = serde_json::from_value(json!({"schema": "a", "type": "date"})).unwrap();
        assert_eq!(c.value_type, ValueType::Date);
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["type"], json!("date"));
    }

    #[test]
    fn test_properties_keep_declaration_order() {
        let c: Component = serde_json::from_str(
            r#"{"schema": "total", "properties": {
                "value": {"condition": "price * qty"},
                "required": {"condition": "total > 10"},
                "enabled": {"condition": "true"}
            }}"#,
        )
        .unwrap();
        assert_eq!(
            c.properties.keys().collect::<Vec<_>>(),
            vec!["value", "required", "enabled"]
        );

        let text = serde_json::to_string(&c).unwrap();
        let back: Component = serde_json::from_str(&text).unwrap();
        assert_eq!(
            back.properties.keys().collect::<Vec<_>>(),
            vec!["value", "required", "enabled"]
        );
    }
}
