//! Tool catalogue and commands for usekit
//!
//! A [`Tool`] describes what a development tool needs in a project: its
//! dependencies, configuration, pre-commit hook, CI steps and linter rules.
//! The [`commands`] module adds and removes tools and rules through the
//! [`ToolRegistry`].

pub mod commands;
pub mod error;
pub mod registry;
pub mod rules;
pub mod tool;
pub mod tools;

pub use commands::{Action, ToolStatus};
pub use error::{Error, Result};
pub use registry::ToolRegistry;
pub use rules::{Linter, RuleSet};
pub use tool::{CiStep, ConfigEntry, ConfigLocation, Tool};
