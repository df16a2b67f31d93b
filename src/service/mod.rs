//! ResourceOperations: generic CRUD over a transport, with diffing and validation.

pub mod diff;
mod operations;
mod validation;
pub use diff::{compute_change_set, Coercion, DiffEngine};
pub use operations::{server_message, ResourceOperations, UpdateOutcome};
pub use validation::RequestValidator;
