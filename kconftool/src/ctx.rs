//! Application context.
//!
//! [`AppContext`] resolves where the Kconfig tree, the configuration file
//! and the generated header live, from command-line flags, the settings file
//! and the environment, in that order of precedence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use kconfig::{Kconfig, LoadOptions};

use crate::settings::Settings;

/// Default top-level Kconfig file.
pub const DEFAULT_KCONFIG: &str = "Kconfig";

/// Default minimal configuration written by `savedefconfig`.
pub const DEFAULT_DEFCONFIG: &str = "defconfig";

#[derive(Debug, Clone)]
pub struct AppContext {
    /// Directory the tool runs in. Relative settings paths start here.
    pub workspace: PathBuf,
    pub kconfig: PathBuf,
    pub srctree: Option<PathBuf>,
    /// Configuration file read and written by the tools.
    pub config: PathBuf,
    /// Output path for the C header, if configured.
    pub header_path: Option<PathBuf>,
    pub settings: Settings,
}

impl AppContext {
    pub fn new(
        workspace: PathBuf,
        kconfig: Option<PathBuf>,
        config: Option<PathBuf>,
        settings_path: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let settings = Settings::load(settings_path, &workspace)?;

        let kconfig = kconfig
            .or_else(|| settings.kconfig_path(&workspace))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KCONFIG));
        let config = config
            .or_else(|| settings.config_path(&workspace))
            .unwrap_or_else(kconfig::standard_config_filename);
        let srctree = settings.srctree_path(&workspace);
        let header_path = settings.header_path(&workspace);

        Ok(Self {
            workspace,
            kconfig,
            srctree,
            config,
            header_path,
            settings,
        })
    }

    /// Parses the Kconfig tree.
    pub fn load_kconfig(&self) -> anyhow::Result<Kconfig> {
        let mut opts = LoadOptions::default();
        if let Some(srctree) = &self.srctree {
            opts.srctree = Some(srctree.clone());
        }
        info!("Parsing {}", self.kconfig.display());
        let kconf = Kconfig::load_with(&self.kconfig, opts)
            .with_context(|| format!("Failed to load Kconfig: {}", self.kconfig.display()))?;

        if self.settings.warn_undef {
            kconf.check_undefined_syms();
        }
        Ok(kconf)
    }

    /// Parses the Kconfig tree and loads the configuration file, or the
    /// defaults when it does not exist.
    pub fn load_kconfig_with_config(&self) -> anyhow::Result<Kconfig> {
        let mut kconf = self.load_kconfig()?;
        let source = if self.config.exists() {
            Some(self.config.clone())
        } else {
            kconf.defconfig_filename()
        };
        let msg = match source {
            Some(path) => kconf
                .load_config(Some(path.as_path()), true)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
            None => format!(
                "Using default symbol values (no '{}')",
                self.config.display()
            ),
        };
        print_status(&msg);
        Ok(kconf)
    }

    /// Header for configuration files, from the settings file.
    pub fn config_header(&self) -> Option<&str> {
        self.settings.header.as_deref()
    }

    /// Header for the C header, from the settings file.
    pub fn autoheader(&self) -> Option<&str> {
        self.settings.autoheader.as_deref()
    }

    /// Writes the configuration file and prints the outcome.
    pub fn save_config(&self, kconf: &Kconfig) -> anyhow::Result<()> {
        let msg = kconf
            .write_config(Some(self.config.as_path()), self.config_header(), true)
            .with_context(|| format!("Failed to write configuration: {}", self.config.display()))?;
        print_status(&msg);
        Ok(())
    }
}

/// Prints a status line from the library, such as "Configuration saved to
/// '.config'".
pub fn print_status(msg: &str) {
    println!("{}", msg.green());
}
