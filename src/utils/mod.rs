// Utility modules

pub mod list_query;
pub mod password;
pub mod service_error;
pub mod validation;

pub use list_query::{contains_pattern, escape_like, FilterOp, ListQuery, RawFilter, SortDir};
pub use password::{hash_password, random_password, verify_password, PasswordError};
pub use service_error::ServiceError;
pub use validation::{trim_and_validate_field, trim_optional_field};
