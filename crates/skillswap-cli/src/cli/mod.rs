//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: text or JSON output
//! - `prompt`: interactive input for missing credentials

mod commands;
mod display;
pub mod prompt;

pub use commands::{
    Cli, Commands, DbAction, OutputFormat, RequestAction, ReviewAction, SkillAction,
    UserAction,
};
pub use display::Display;
