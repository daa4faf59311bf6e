//! Shared test utilities for the usekit workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`project`] - [`TestProject`](project::TestProject) builder for
//!   temporary Python project directories

pub mod project;

pub use project::TestProject;
