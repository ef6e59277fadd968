//! Form definition and session state

mod definition;
mod forms;

pub use definition::*;
pub use forms::*;
