//! Trait abstraction for form storage to enable mocking in tests

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use crate::state::{DataSource, FormDefinition, FormSummary};

/// Result of persisting a data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Where the record was written
    pub location: PathBuf,
    pub bytes: usize,
}

/// Storage for form definitions and their data records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormBackend: Send + Sync {
    /// List the available forms
    async fn get_forms(&self) -> Result<Vec<FormSummary>>;

    /// Load a form definition by name
    async fn get_form(&self, name: &str) -> Result<FormDefinition>;

    /// Load the record identified by `ids` in `source`; `None` if it does not exist
    async fn get_data(&self, source: &DataSource, ids: &[String]) -> Result<Option<Value>>;

    /// Persist a form definition under `name`
    async fn save_form(&self, name: &str, form: &FormDefinition) -> Result<()>;

    /// Persist a data record
    async fn save_data(
        &self,
        source: &DataSource,
        ids: &[String],
        data: &Value,
    ) -> Result<SaveOutcome>;
}
