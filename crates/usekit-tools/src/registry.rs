//! Tool registry
//!
//! Holds the tool catalogue in a fixed order. The order matters: status
//! output lists tools in it, and it is the order integrations are applied
//! when one tool brings in the others (pre-commit hooks, CI steps).

use usekit_core::Project;

use crate::error::{Error, Result};
use crate::tool::Tool;
use crate::tools::{BitbucketPipelines, Codespell, Coverage, Deptry, PreCommit, PyprojectFmt, Pytest, Ruff};

/// Ordered catalogue of tools
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry holding every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PyprojectFmt));
        registry.register(Box::new(Ruff));
        registry.register(Box::new(Deptry));
        registry.register(Box::new(Codespell));
        registry.register(Box::new(Pytest));
        registry.register(Box::new(Coverage));
        registry.register(Box::new(PreCommit));
        registry.register(Box::new(BitbucketPipelines));
        registry
    }

    /// Register a tool, replacing any tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|existing| existing.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    /// Look up `name`, failing with the list of known tools.
    pub fn require(&self, name: &str) -> Result<&dyn Tool> {
        self.get(name).ok_or_else(|| Error::UnknownTool {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in catalogue order
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|tool| tool.as_ref())
    }

    /// Tools in use by `project`, other than `name`
    pub fn used_except(&self, project: &Project, name: &str) -> Result<Vec<&dyn Tool>> {
        let mut used = Vec::new();
        for tool in self.iter().filter(|tool| tool.name() != name) {
            if tool.is_used(project)? {
                used.push(tool);
            }
        }
        Ok(used)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins_keep_catalogue_order() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["pyproject-fmt", "ruff", "deptry", "codespell", "pytest", "coverage", "pre-commit", "bitbucket"]
        );
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = ToolRegistry::with_builtins();
        let len = registry.len();
        registry.register(Box::new(Ruff));
        assert_eq!(registry.len(), len);
        assert_eq!(registry.names()[1], "ruff");
    }

    #[test]
    fn test_require_unknown_lists_available() {
        let registry = ToolRegistry::with_builtins();
        let err = registry.require("black").err().unwrap();
        assert!(err.to_string().contains("available: pyproject-fmt, ruff"));
        assert!(registry.contains("deptry"));
    }
}
