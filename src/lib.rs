//! formbind - declarative form state engine
//!
//! A form definition is a tree of pages, sections and components. Each
//! component is bound to a path of a JSON data record through its schema and
//! may declare conditional properties (`visible`, `enabled`, `required`, ...)
//! and a computed `value`. [`FormEngine`] resolves all of that into a
//! [`FormState`]; [`FormService`] adds loading and saving through a
//! [`FormBackend`].

pub mod backend;
pub mod coerce;
pub mod config;
pub mod data;
pub mod engine;
pub mod expr;
pub mod service;
pub mod state;

pub use backend::{FormBackend, JsonStore, SaveOutcome, StoreError};
pub use coerce::{resolve_type, ValueType};
pub use config::{EngineConfig, ResolutionMode};
pub use engine::FormEngine;
pub use expr::{EvalError, ExpressionEvaluator, Interpreter};
pub use service::FormService;
pub use state::{
    Component, ComponentKey, DataSource, FormDefinition, FormState, FormSummary, Page, Property,
    Section,
};
