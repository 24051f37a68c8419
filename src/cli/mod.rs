//! Command-line interface module.

mod args;
pub mod inject;
pub mod serve;

pub use args::{Cli, Commands, DEFAULT_CONFIG, InjectArgs, ServeArgs};
