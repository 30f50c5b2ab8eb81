pub mod error;
pub mod validation;

pub use error::{Error, Result};
pub use validation::{FieldError, Validation};
