//! Entry points for a renderer: load, resolve, edit and persist forms

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use crate::backend::{FormBackend, SaveOutcome};
use crate::engine::FormEngine;
use crate::expr::{ExpressionEvaluator, Interpreter};
use crate::state::{ComponentKey, DataSource, FormDefinition, FormState, FormSummary};

/// Form operations over an injected storage backend
pub struct FormService<B, E = Interpreter> {
    backend: B,
    engine: FormEngine<E>,
}

impl<B: FormBackend, E: ExpressionEvaluator> FormService<B, E> {
    pub fn new(backend: B, engine: FormEngine<E>) -> Self {
        Self { backend, engine }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn engine(&self) -> &FormEngine<E> {
        &self.engine
    }

    /// Load a form and, when `ids` are given, its data record, then resolve the state
    pub async fn get_form_and_data(&self, name: &str, ids: Option<&[String]>) -> Result<FormState> {
        let form = self.backend.get_form(name).await?;
        let data = match ids {
            Some(ids) => {
                let source = form
                    .data_source
                    .clone()
                    .ok_or_else(|| anyhow!("form {name} has no data source"))?;
                Some(self.get_data(&source, ids).await?)
            }
            None => None,
        };
        info!(form = name, with_data = data.is_some(), "loaded form");
        Ok(self.engine.populate_components(form, data))
    }

    /// Load a data record; a missing record is an empty object
    pub async fn get_data(&self, source: &DataSource, ids: &[String]) -> Result<Value> {
        let data = self
            .backend
            .get_data(source, ids)
            .await
            .with_context(|| format!("loading data from {}", source.name))?;
        match data {
            None | Some(Value::Null) => Ok(Value::Object(Map::new())),
            Some(record @ Value::Object(_)) => Ok(record),
            Some(_) => bail!("data record in {} is not a JSON object", source.name),
        }
    }

    pub async fn get_forms(&self) -> Result<Vec<FormSummary>> {
        self.backend.get_forms().await
    }

    pub async fn get_form(&self, name: &str) -> Result<FormDefinition> {
        self.backend.get_form(name).await
    }

    /// Persist the structure of `form`; session values are never saved
    pub async fn save_form(&self, name: &str, form: &FormDefinition) -> Result<()> {
        let stripped = form.strip_transient();
        self.backend
            .save_form(name, &stripped)
            .await
            .with_context(|| format!("saving form {name}"))
    }

    pub async fn save_data(
        &self,
        source: &DataSource,
        ids: &[String],
        data: &Value,
    ) -> Result<SaveOutcome> {
        self.backend
            .save_data(source, ids, data)
            .await
            .with_context(|| format!("saving data to {}", source.name))
    }

    pub fn populate_components(&self, form: FormDefinition, data: Option<Value>) -> FormState {
        self.engine.populate_components(form, data)
    }

    pub fn update_component<'s>(
        &self,
        key: ComponentKey,
        state: &'s mut FormState,
    ) -> &'s mut FormState {
        self.engine.update_component(key, state)
    }
}
