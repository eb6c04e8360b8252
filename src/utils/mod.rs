// file: src/utils/mod.rs
// description: logging and validation helpers
// reference: internal module structure

pub mod logging;
pub mod validation;

pub use validation::Validator;
