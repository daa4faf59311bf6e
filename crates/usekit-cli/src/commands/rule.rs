//! `usekit rule`

use usekit_core::Project;
use usekit_tools::ToolRegistry;
use usekit_tools::commands;

use crate::error::Result;

/// Select, deselect, ignore or un-ignore `rules` depending on the flags.
pub fn run_rule(
    project: &Project,
    registry: &ToolRegistry,
    rules: &[String],
    remove: bool,
    ignore: bool,
) -> Result<()> {
    match (ignore, remove) {
        (false, false) => commands::select_rules(project, registry, rules)?,
        (false, true) => commands::deselect_rules(project, rules)?,
        (true, false) => commands::ignore_rules(project, registry, rules)?,
        (true, true) => commands::unignore_rules(project, rules)?,
    }
    Ok(())
}
