//! `usekit list`

use colored::Colorize;
use usekit_core::Project;
use usekit_tools::ToolRegistry;
use usekit_tools::commands;

use crate::error::Result;

pub fn run_list(project: &Project, registry: &ToolRegistry) -> Result<()> {
    let rows = commands::status(project, registry)?;
    let width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);

    println!("{}", "Available Tools".bold());
    for row in &rows {
        let state = if row.used {
            "used".green()
        } else {
            "unused".dimmed()
        };
        println!("  {:<width$}  {:<6}  {}", row.name.cyan(), state, row.description);
    }
    println!();
    let used = rows.iter().filter(|row| row.used).count();
    println!("{} of {} tools in use", used, rows.len());
    Ok(())
}
