//! Optional per-project settings.
//!
//! Read from `.kconftool.toml` in the working directory, or from the file
//! given with `--settings`. Every field is optional; command-line flags take
//! precedence and missing fields fall back on the usual Kconfig environment
//! variables.
//!
//! # File Format
//!
//! ```toml
//! kconfig = "${workspaceFolder}/Kconfig"
//! config = "build/.config"
//! header = "# Generated by kconftool\n"
//! autoheader = "/* Generated by kconftool */\n"
//! header_path = "build/include/autoconf.h"
//! warn_undef = true
//! ```
//!
//! Path fields may use `${env:VAR}` and `${workspaceFolder}` placeholders.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::utils::replace_placeholders;

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = ".kconftool.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Top-level Kconfig file.
    pub kconfig: Option<String>,
    /// Base directory for `source` statements.
    pub srctree: Option<String>,
    /// Configuration file to read and write.
    pub config: Option<String>,
    /// Header written at the top of configuration files.
    pub header: Option<String>,
    /// Header written at the top of the C header.
    pub autoheader: Option<String>,
    /// Output path of the C header.
    pub header_path: Option<String>,
    /// Warn about symbols that are referenced but never defined.
    #[serde(default)]
    pub warn_undef: bool,
}

impl Settings {
    /// Loads settings from `path`, or from [`SETTINGS_FILE`] in `workspace`
    /// when no path is given. A missing default file yields empty settings;
    /// a missing explicit file is an error.
    pub fn load(path: Option<&Path>, workspace: &Path) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = workspace.join(SETTINGS_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Expands placeholders in a path field and makes it relative to
    /// `workspace`.
    pub fn resolve(value: &str, workspace: &Path) -> PathBuf {
        let expanded = PathBuf::from(replace_placeholders(value, workspace));
        if expanded.is_absolute() {
            expanded
        } else {
            workspace.join(expanded)
        }
    }

    pub fn kconfig_path(&self, workspace: &Path) -> Option<PathBuf> {
        self.kconfig.as_deref().map(|v| Self::resolve(v, workspace))
    }

    pub fn srctree_path(&self, workspace: &Path) -> Option<PathBuf> {
        self.srctree.as_deref().map(|v| Self::resolve(v, workspace))
    }

    pub fn config_path(&self, workspace: &Path) -> Option<PathBuf> {
        self.config.as_deref().map(|v| Self::resolve(v, workspace))
    }

    pub fn header_path(&self, workspace: &Path) -> Option<PathBuf> {
        self.header_path.as_deref().map(|v| Self::resolve(v, workspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_default_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(dir.path().join("nope.toml").as_path()), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_paths_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "kconfig = \"${workspaceFolder}/src/Kconfig\"\nconfig = \"out/.config\"\nwarn_undef = true\n",
        )
        .unwrap();

        let settings = Settings::load(None, dir.path()).unwrap();
        assert!(settings.warn_undef);
        assert_eq!(
            settings.kconfig_path(dir.path()).unwrap(),
            dir.path().join("src/Kconfig")
        );
        assert_eq!(
            settings.config_path(dir.path()).unwrap(),
            dir.path().join("out/.config")
        );
        assert_eq!(settings.header_path(dir.path()), None);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.toml");
        fs::write(&path, "kconfg = \"typo\"\n").unwrap();
        let err = Settings::load(Some(path.as_path()), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }
}
