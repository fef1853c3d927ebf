// Template module - argument template rendering and invocation building

pub mod command_line;
pub mod error;
pub mod renderer;

pub use command_line::{Invocation, quote_arg, requires_shell};
pub use error::TemplateError;
pub use renderer::{Placeholder, TemplateVars, render, validate};
