//! External command execution

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Run `program args...` in `working_dir` and return its stdout.
pub fn run(program: &str, args: &[String], working_dir: &Path) -> Result<String> {
    let command_line = std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!(command = %command_line, cwd = %working_dir.display(), "running command");

    let output = Command::new(program)
        .current_dir(working_dir)
        .args(args)
        .output()
        .map_err(|e| Error::BackendFailed {
            command: command_line.clone(),
            stderr: e.to_string(),
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::BackendFailed {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Whether `program --version` runs successfully
pub fn is_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_backend_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run("usekit-definitely-missing-program", &[], dir.path()).unwrap_err();
        assert!(matches!(err, Error::BackendFailed { .. }));
        assert!(!is_available("usekit-definitely-missing-program"));
    }
}
