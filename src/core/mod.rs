pub mod bundle;
pub mod config;
pub mod error;
pub mod pac;
pub mod report;
pub mod resources;
pub mod structural;
pub mod substitution;
pub mod validator;

pub use error::{DefaultErrorReporter, ErrorCategory, ErrorReporter, ValidationError};
pub use report::{OutputFormat, ValidationReport};
pub use resources::Document;
pub use validator::Validator;
