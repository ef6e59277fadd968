//! Storage backends for form definitions and data records

mod store;
mod traits;

pub use store::{JsonStore, StoreError};
pub use traits::{FormBackend, SaveOutcome};

#[cfg(test)]
pub use traits::MockFormBackend;
