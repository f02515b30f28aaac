//! Editing model: transactions and position mapping

mod mapping;
mod operation;

pub use mapping::{Assoc, MapResult, Mapping, StepMap};
pub use operation::{Step, Transaction};
