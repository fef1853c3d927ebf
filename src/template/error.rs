// Error types for the template module

use thiserror::Error;

/// Template validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("argument template has no {{input}} placeholder")]
    MissingInput,

    #[error("argument template is empty")]
    Empty,

    #[error("no input path supplied for {{input}}")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, TemplateError>;
