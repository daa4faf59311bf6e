//! Command options and their layering
//!
//! Options are resolved from, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. `[tool.usekit]` in `pyproject.toml`
//! 3. `USEKIT_*` environment variables and command-line flags
//!
//! The result is an explicit [`Options`] value owned by the
//! [`Project`](crate::Project); scoped changes go through
//! [`Project::override_options`](crate::Project::override_options).

use std::fmt;
use std::str::FromStr;

use usekit_model::models::UsekitSettings;

use crate::error::{Error, Result};

/// Which tool manages dependency declarations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Run `uv add` / `uv remove`
    Uv,
    /// Edit `[dependency-groups]` directly
    Disabled,
    /// `uv` when it is available or the project is locked with it
    #[default]
    Auto,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uv => "uv",
            Self::Disabled => "none",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "uv" => Ok(Self::Uv),
            "none" => Ok(Self::Disabled),
            "auto" => Ok(Self::Auto),
            _ => Err(Error::InvalidOption {
                name: "backend",
                value: s.to_string(),
            }),
        }
    }
}

/// Options every command runs under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Suppress progress output (errors are still shown)
    pub quiet: bool,
    /// Do not touch the network when running the backend
    pub offline: bool,
    /// Do not update lock files when running the backend
    pub frozen: bool,
    pub backend: BackendKind,
}

impl Options {
    /// Resolve options from project settings and explicit overrides.
    pub fn layered(settings: Option<&UsekitSettings>, overrides: &OptionOverrides) -> Result<Self> {
        let mut options = Self::default();
        if let Some(settings) = settings {
            options = OptionOverrides::from_settings(settings)?.apply(options);
        }
        Ok(overrides.apply(options))
    }
}

/// A partial set of options; unset fields keep the lower layer's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub quiet: Option<bool>,
    pub offline: Option<bool>,
    pub frozen: Option<bool>,
    pub backend: Option<BackendKind>,
}

impl OptionOverrides {
    pub fn from_settings(settings: &UsekitSettings) -> Result<Self> {
        Ok(Self {
            quiet: settings.quiet,
            offline: settings.offline,
            frozen: settings.frozen,
            backend: settings.backend.as_deref().map(str::parse::<BackendKind>).transpose()?,
        })
    }

    pub fn apply(&self, options: Options) -> Options {
        Options {
            quiet: self.quiet.unwrap_or(options.quiet),
            offline: self.offline.unwrap_or(options.offline),
            frozen: self.frozen.unwrap_or(options.frozen),
            backend: self.backend.unwrap_or(options.backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("uv", BackendKind::Uv)]
    #[case("none", BackendKind::Disabled)]
    #[case(" AUTO ", BackendKind::Auto)]
    fn test_backend_from_str(#[case] input: &str, #[case] expected: BackendKind) {
        assert_eq!(input.parse::<BackendKind>().unwrap(), expected);
    }

    #[test]
    fn test_backend_rejects_unknown() {
        let err = "poetry".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { name: "backend", .. }));
    }

    #[test]
    fn test_overrides_win_over_settings() {
        let settings = UsekitSettings {
            quiet: Some(true),
            offline: Some(true),
            frozen: None,
            backend: Some("uv".to_string()),
        };
        let overrides = OptionOverrides {
            offline: Some(false),
            backend: Some(BackendKind::Disabled),
            ..OptionOverrides::default()
        };
        let options = Options::layered(Some(&settings), &overrides).unwrap();
        assert_eq!(
            options,
            Options {
                quiet: true,
                offline: false,
                frozen: false,
                backend: BackendKind::Disabled,
            }
        );
    }

    #[test]
    fn test_defaults_without_layers() {
        let options = Options::layered(None, &OptionOverrides::default()).unwrap();
        assert_eq!(options, Options::default());
        assert_eq!(options.backend, BackendKind::Auto);
    }
}
