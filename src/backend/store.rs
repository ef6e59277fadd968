//! JSON file store
//!
//! Layout under the root directory:
//!
//! ```text
//! forms/<name>.json                 form definitions
//! data/<source>/<id>/.../<id>.json  data records, one path segment per id
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use super::traits::{FormBackend, SaveOutcome};
use crate::state::{DataSource, FormDefinition, FormSummary};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid name {0:?}: names must be non-empty and must not contain path separators")]
    InvalidName(String),

    #[error("form not found: {0}")]
    FormNotFound(String),

    #[error("no record ids given for data source {0}")]
    MissingIds(String),
}

/// Forms and data kept as JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn forms_dir(&self) -> PathBuf {
        self.root.join("forms")
    }

    fn form_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.forms_dir().join(format!("{name}.json")))
    }

    fn data_path(&self, source: &DataSource, ids: &[String]) -> Result<PathBuf, StoreError> {
        validate_name(&source.name)?;
        if ids.is_empty() {
            return Err(StoreError::MissingIds(source.name.clone()));
        }
        let mut path = self.root.join("data").join(&source.name);
        for (i, id) in ids.iter().enumerate() {
            validate_name(id)?;
            if i + 1 == ids.len() {
                path.push(format!("{id}.json"));
            } else {
                path.push(id);
            }
        }
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Write `value` as pretty JSON through a temporary file so readers never
/// see a partial document
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &content)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(content.len())
}

/// Read a file, mapping "not found" to `None`
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

#[async_trait]
impl FormBackend for JsonStore {
    async fn get_forms(&self) -> Result<Vec<FormSummary>> {
        let dir = self.forms_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).with_context(|| format!("listing {}", dir.display())),
        };

        let mut forms = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            match serde_json::from_str::<FormDefinition>(&content) {
                Ok(form) => forms.push(FormSummary {
                    name: stem.to_string(),
                    title: form.title,
                }),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable form"),
            }
        }
        forms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(forms)
    }

    async fn get_form(&self, name: &str) -> Result<FormDefinition> {
        let path = self.form_path(name)?;
        let content = read_optional(&path)
            .await?
            .ok_or_else(|| StoreError::FormNotFound(name.to_string()))?;
        let mut form: FormDefinition = serde_json::from_str(&content)
            .with_context(|| format!("parsing form {}", path.display()))?;
        if form.name.is_empty() {
            form.name = name.to_string();
        }
        Ok(form)
    }

    async fn get_data(&self, source: &DataSource, ids: &[String]) -> Result<Option<Value>> {
        let path = self.data_path(source, ids)?;
        let Some(content) = read_optional(&path).await? else {
            return Ok(None);
        };
        let data = serde_json::from_str(&content)
            .with_context(|| format!("parsing data {}", path.display()))?;
        Ok(Some(data))
    }

    async fn save_form(&self, name: &str, form: &FormDefinition) -> Result<()> {
        let path = self.form_path(name)?;
        let bytes = write_json(&path, form).await?;
        info!(form = name, bytes, "saved form");
        Ok(())
    }

    async fn save_data(
        &self,
        source: &DataSource,
        ids: &[String],
        data: &Value,
    ) -> Result<SaveOutcome> {
        let path = self.data_path(source, ids)?;
        let bytes = write_json(&path, data).await?;
        info!(source = %source.name, ?ids, bytes, "saved data");
        Ok(SaveOutcome {
            location: path,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::ValueType;
    use crate::state::{Component, Page, Section};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio_test::block_on;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample_form() -> FormDefinition {
        FormDefinition {
            name: "order".into(),
            title: Some("Order".into()),
            data_source: Some(DataSource::named("orders")),
            pages: vec![Page {
                sections: vec![Section {
                    components: vec![Component::new("total", ValueType::Number)],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    mod form_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_save_then_get_form() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let form = sample_form();

            block_on(store.save_form("order", &form)).unwrap();
            let loaded = block_on(store.get_form("order")).unwrap();
            assert_eq!(loaded, form);
            assert!(dir.path().join("forms/order.json").exists());
            assert!(!dir.path().join("forms/order.json.tmp").exists());
        }

        #[test]
        fn test_missing_form_is_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let err = block_on(store.get_form("nope")).unwrap_err();
            assert_eq!(
                err.downcast_ref::<StoreError>(),
                Some(&StoreError::FormNotFound("nope".into()))
            );
        }

        #[test]
        fn test_name_defaults_to_file_name() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("forms")).unwrap();
            std::fs::write(dir.path().join("forms/bare.json"), r#"{"pages": []}"#).unwrap();

            let store = JsonStore::new(dir.path());
            assert_eq!(block_on(store.get_form("bare")).unwrap().name, "bare");
        }

        #[test]
        fn test_list_forms_sorted_and_skips_invalid() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            block_on(store.save_form("zeta", &FormDefinition::default())).unwrap();
            block_on(store.save_form("alpha", &sample_form())).unwrap();
            std::fs::write(dir.path().join("forms/broken.json"), "{").unwrap();
            std::fs::write(dir.path().join("forms/notes.txt"), "ignored").unwrap();

            let forms = block_on(store.get_forms()).unwrap();
            assert_eq!(
                forms,
                vec![
                    FormSummary {
                        name: "alpha".into(),
                        title: Some("Order".into())
                    },
                    FormSummary {
                        name: "zeta".into(),
                        title: None
                    },
                ]
            );
        }

        #[test]
        fn test_list_forms_without_directory_is_empty() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path().join("missing"));
            assert!(block_on(store.get_forms()).unwrap().is_empty());
        }

        #[test]
        fn test_path_traversal_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            for name in ["../escape", "", ".hidden", "a/b"] {
                let err = block_on(store.get_form(name)).unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<StoreError>(),
                    Some(StoreError::InvalidName(_))
                ));
            }
        }
    }

    mod data_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_save_then_get_data() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let source = DataSource::named("orders");
            let data = json!({"price": 10, "customer": {"name": "Ada"}});

            let outcome = block_on(store.save_data(&source, &ids(&["7", "2024"]), &data)).unwrap();
            assert_eq!(outcome.location, dir.path().join("data/orders/7/2024.json"));
            assert!(outcome.bytes > 0);

            let loaded = block_on(store.get_data(&source, &ids(&["7", "2024"]))).unwrap();
            assert_eq!(loaded, Some(data));
        }

        #[test]
        fn test_distinct_id_lists_stay_separate() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let source = DataSource::named("orders");

            block_on(store.save_data(&source, &ids(&["a", "b"]), &json!({"who": "pair"}))).unwrap();
            assert_eq!(block_on(store.get_data(&source, &ids(&["a_b"]))).unwrap(), None);

            block_on(store.save_data(&source, &ids(&["a_b"]), &json!({"who": "single"}))).unwrap();
            assert_eq!(
                block_on(store.get_data(&source, &ids(&["a", "b"]))).unwrap(),
                Some(json!({"who": "pair"}))
            );
            assert_eq!(
                block_on(store.get_data(&source, &ids(&["a_b"]))).unwrap(),
                Some(json!({"who": "single"}))
            );
        }

        #[test]
        fn test_missing_record_is_none() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let loaded = block_on(store.get_data(&DataSource::named("orders"), &ids(&["1"])));
            assert_eq!(loaded.unwrap(), None);
        }

        #[test]
        fn test_empty_ids_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonStore::new(dir.path());
            let err = block_on(store.get_data(&DataSource::named("orders"), &[])).unwrap_err();
            assert_eq!(
                err.downcast_ref::<StoreError>(),
                Some(&StoreError::MissingIds("orders".into()))
            );
        }

        #[test]
        fn test_corrupt_record_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("data/orders")).unwrap();
            std::fs::write(dir.path().join("data/orders/1.json"), "{oops").unwrap();

            let store = JsonStore::new(dir.path());
            let err = block_on(store.get_data(&DataSource::named("orders"), &ids(&["1"])))
                .unwrap_err();
            assert!(err.to_string().contains("parsing data"));
        }
    }
}
