//! `usekit tool` and `usekit ci`

use usekit_core::Project;
use usekit_tools::ToolRegistry;
use usekit_tools::commands::{self, Action};

use crate::error::Result;

/// Add or remove the tool called `name`.
pub fn run_tool(project: &Project, registry: &ToolRegistry, name: &str, remove: bool) -> Result<()> {
    let action = if remove { Action::Remove } else { Action::Add };
    commands::use_tool(project, registry, name, action)?;
    Ok(())
}
