//! Condition resolution
//!
//! Every component property carrying a condition is evaluated against the
//! data record. The `value` property is special: its result is coerced to
//! the component's type, becomes the component's value and is written back
//! into the record, which can in turn change other computed values.
//!
//! In [`ResolutionMode::Bounded`] a full pass is followed by a second wave
//! over computed values only, and if that wave still changed something, by
//! one more full resolution. Longer dependency chains laid out against
//! document order can be left stale; [`ResolutionMode::FixedPoint`] repeats
//! full passes until nothing changes instead.

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::FormEngine;
use crate::coerce::resolve_type;
use crate::config::ResolutionMode;
use crate::data;
use crate::expr::ExpressionEvaluator;
use crate::state::{Component, ComponentKey, FormState, VALUE_PROPERTY};

impl<E: ExpressionEvaluator> FormEngine<E> {
    /// Evaluate the conditional properties of every component in `state`
    pub fn resolve_conditions<'s>(&self, state: &'s mut FormState) -> &'s mut FormState {
        match self.mode {
            ResolutionMode::Bounded => self.resolve_bounded(state, false),
            ResolutionMode::FixedPoint { max_passes } => self.resolve_fixed_point(state, max_passes),
        }
    }

    fn resolve_bounded<'s>(&self, state: &'s mut FormState, is_rerun: bool) -> &'s mut FormState {
        let recalculated = self.full_pass(state);
        if recalculated.is_empty() {
            return state;
        }

        let changed = self.value_wave(state);
        debug!(
            recalculated = recalculated.len(),
            second_wave = changed,
            is_rerun,
            "resolved conditions"
        );
        if changed > 0 && !is_rerun {
            return self.resolve_bounded(state, true);
        }
        state
    }

    fn resolve_fixed_point<'s>(
        &self,
        state: &'s mut FormState,
        max_passes: usize,
    ) -> &'s mut FormState {
        let mut changed = Vec::new();
        for pass in 1..=max_passes.max(1) {
            changed = self.full_pass(state);
            if changed.is_empty() {
                debug!(passes = pass, "conditions settled");
                return state;
            }
        }

        let unsettled: Vec<String> = changed
            .iter()
            .filter_map(|&key| state.component(key))
            .map(describe)
            .collect();
        warn!(max_passes, ?unsettled, "computed values did not settle");
        state
    }

    /// One pass over every property of every component.
    ///
    /// Properties without a condition are dropped. Returns the components
    /// whose value was recalculated.
    fn full_pass(&self, state: &mut FormState) -> Vec<ComponentKey> {
        let mut recalculated = Vec::new();
        for &key in &state.components {
            let Some(component) = state.form.component_mut(key) else {
                continue;
            };
            let Component {
                schema,
                value_type,
                value,
                properties,
                ..
            } = component;

            properties.retain(|_, property| property.active_condition().is_some());

            for (name, property) in properties.iter_mut() {
                let Some(condition) = property.active_condition() else {
                    continue;
                };

                let result = if name == VALUE_PROPERTY {
                    match self.evaluator.evaluate_value(condition, &state.data) {
                        Ok(raw) => {
                            let resolved = resolve_type(&raw, value_type);
                            if *value != resolved {
                                if let Some(schema) = schema.as_deref() {
                                    data::set(&mut state.data, schema, Some(resolved.clone()));
                                }
                                *value = resolved;
                                recalculated.push(key);
                            }
                            raw
                        }
                        Err(err) => {
                            trace!(condition, error = %err, "computed value not evaluated");
                            Value::Null
                        }
                    }
                } else {
                    match self.evaluator.evaluate_condition(condition, &state.data) {
                        Ok(flag) => Value::Bool(flag),
                        Err(err) => {
                            trace!(property = %name, condition, error = %err, "condition not evaluated");
                            Value::Null
                        }
                    }
                };
                property.value = result;
            }
        }
        recalculated
    }

    /// Re-evaluate only computed values so chains between them can settle.
    /// Returns how many values changed.
    fn value_wave(&self, state: &mut FormState) -> usize {
        let mut changed = 0;
        for &key in &state.components {
            let Some(component) = state.form.component_mut(key) else {
                continue;
            };
            let Component {
                schema,
                value_type,
                value,
                properties,
                ..
            } = component;
            let Some(property) = properties.get_mut(VALUE_PROPERTY) else {
                continue;
            };
            let Some(condition) = property.active_condition() else {
                continue;
            };
            let Ok(raw) = self.evaluator.evaluate_value(condition, &state.data) else {
                continue;
            };

            let resolved = resolve_type(&raw, value_type);
            if *value != resolved {
                if let Some(schema) = schema.as_deref() {
                    data::set(&mut state.data, schema, Some(resolved.clone()));
                }
                *value = resolved;
                changed += 1;
            }
            property.value = raw;
        }
        changed
    }
}

fn describe(component: &Component) -> String {
    component
        .schema
        .clone()
        .or_else(|| component.component_id.clone())
        .unwrap_or_default()
}
