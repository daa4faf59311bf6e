//! Project context and file integrations for usekit
//!
//! A [`Project`] carries the resolved [`Options`], the shared document store
//! and the console. The integration modules edit one configuration file
//! each:
//!
//! - [`pyproject`] - `pyproject.toml`
//! - [`precommit`] - `.pre-commit-config.yaml`
//! - [`pipelines`] - `bitbucket-pipelines.yml`
//! - [`deps`] - dependency groups, through `uv` or direct manifest edits

pub mod console;
pub mod deps;
pub mod error;
pub mod options;
pub mod pipelines;
pub mod precommit;
pub mod project;
pub mod pyproject;
pub mod subprocess;

pub use console::{Console, Style};
pub use deps::{Dependency, DependencyBackend};
pub use error::{Error, Result};
pub use options::{BackendKind, OptionOverrides, Options};
pub use project::{OptionsGuard, Project};
