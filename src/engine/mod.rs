//! Form state engine
//!
//! [`FormEngine::populate_components`] turns a definition and a data record
//! into a [`FormState`]; every later edit goes through
//! [`FormEngine::update_component`]. Both finish by resolving conditional
//! properties (see [`FormEngine::resolve_conditions`]). All of it is
//! synchronous and works in place on the state it is handed.

mod identity;
mod resolve;

pub use identity::{assign_ids, ensure_id};

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::coerce::{resolve_type, ValueType};
use crate::config::ResolutionMode;
use crate::data;
use crate::expr::{ExpressionEvaluator, Interpreter};
use crate::state::{ComponentKey, FormDefinition, FormState};

/// Resolves form state with an expression evaluator
#[derive(Debug)]
pub struct FormEngine<E = Interpreter> {
    evaluator: E,
    mode: ResolutionMode,
}

impl FormEngine<Interpreter> {
    pub fn new() -> Self {
        Self::with_evaluator(Interpreter::new())
    }
}

impl Default for FormEngine<Interpreter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExpressionEvaluator> FormEngine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            evaluator,
            mode: ResolutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Build the session state for `form` bound to `data`.
    ///
    /// Assigns missing identifiers, computes each component's initial value
    /// from its schema, flattens the tree in document order and resolves
    /// conditions. Absent data leaves every value `null`; a record that is
    /// not an object is replaced by an empty one before anything binds to it.
    pub fn populate_components(&self, mut form: FormDefinition, data: Option<Value>) -> FormState {
        let record = match data {
            Some(Value::Object(fields)) => Value::Object(fields),
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(other) => {
                warn!(
                    form = %form.name,
                    record = %other,
                    "data record is not an object, starting from an empty one"
                );
                Value::Object(Map::new())
            }
        };
        let mut components = Vec::new();
        let mut assigned = 0;

        for (page_idx, page) in form.pages.iter_mut().enumerate() {
            assigned += usize::from(ensure_id(&mut page.page_id));
            for (section_idx, section) in page.sections.iter_mut().enumerate() {
                assigned += usize::from(ensure_id(&mut section.section_id));
                for (component_idx, component) in section.components.iter_mut().enumerate() {
                    assigned += usize::from(ensure_id(&mut component.component_id));
                    component.value = self.get_value(
                        component.schema.as_deref(),
                        &record,
                        &component.value_type,
                    );
                    components.push(ComponentKey {
                        page: page_idx,
                        section: section_idx,
                        component: component_idx,
                    });
                }
            }
        }

        debug!(
            form = %form.name,
            components = components.len(),
            assigned_ids = assigned,
            "populated form"
        );

        let mut state = FormState {
            components,
            data: record,
            form,
        };
        self.resolve_conditions(&mut state);
        state
    }

    /// Evaluate `schema` against `data` and coerce the result to `value_type`.
    ///
    /// A missing schema or a failed evaluation yields `null`.
    pub fn get_value(&self, schema: Option<&str>, data: &Value, value_type: &ValueType) -> Value {
        let Some(schema) = schema else {
            return Value::Null;
        };
        match self.evaluator.evaluate_value(schema, data) {
            Ok(raw) => resolve_type(&raw, value_type),
            Err(err) => {
                trace!(schema, error = %err, "schema evaluation failed");
                Value::Null
            }
        }
    }

    /// Apply the value currently held by the component at `key`.
    ///
    /// The value is coerced and written to the data record, components bound
    /// to the same schema (and every component with a top-level schema) are
    /// refreshed from the record, then conditions are resolved again.
    pub fn update_component<'s>(
        &self,
        key: ComponentKey,
        state: &'s mut FormState,
    ) -> &'s mut FormState {
        let Some(component) = state.form.component(key) else {
            warn!(?key, "edit for unknown component ignored");
            return state;
        };
        let schema = component.schema.clone();
        let value = resolve_type(&component.value, &component.value_type);

        if let Some(schema) = schema.as_deref() {
            data::set(&mut state.data, schema, Some(value));
        }

        let mut refreshed = 0;
        for &other in &state.components {
            let Some(c) = state.form.component_mut(other) else {
                continue;
            };
            if c.schema.is_none() || (c.schema != schema && !c.has_bare_schema()) {
                continue;
            }
            c.value = self.get_value(c.schema.as_deref(), &state.data, &c.value_type);
            refreshed += 1;
        }
        debug!(schema = ?schema, refreshed, "applied component edit");

        self.resolve_conditions(state)
    }

    /// Assign a raw `value` to the component at `key` and apply it
    pub fn set_component_value<'s>(
        &self,
        key: ComponentKey,
        value: Value,
        state: &'s mut FormState,
    ) -> &'s mut FormState {
        if let Some(component) = state.component_mut(key) {
            component.value = value;
        }
        self.update_component(key, state)
    }

    /// Edit the first component bound to `schema`; `None` if nothing is bound to it
    pub fn update_by_schema<'s>(
        &self,
        schema: &str,
        value: Value,
        state: &'s mut FormState,
    ) -> Option<&'s mut FormState> {
        let key = state.find_by_schema(schema)?;
        Some(self.set_component_value(key, value, state))
    }
}
