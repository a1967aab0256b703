//! The configuration tools behind each subcommand.
//!
//! Every tool works on an [`AppContext`]: it parses the Kconfig tree, loads
//! or computes values and writes the results back.

use std::path::PathBuf;

use clap::Subcommand;

use crate::ctx::AppContext;

pub mod allconfig;
pub mod defconfig;
pub mod dump;
pub mod lint;
pub mod setconfig;

pub use allconfig::AllConfigMode;

#[derive(Subcommand, Debug, Clone)]
pub enum Tool {
    /// Interactive configuration editor
    Menuconfig,
    /// New configuration with every symbol set as high as it goes
    Allyesconfig,
    /// New configuration with modules preferred over built-ins
    Allmodconfig,
    /// New configuration with every symbol disabled where possible
    Allnoconfig,
    /// New configuration with default values only
    Alldefconfig,
    /// Update an existing configuration, taking defaults for new symbols
    Olddefconfig,
    /// Create a configuration from a minimal configuration file
    Defconfig {
        /// Minimal configuration to start from
        file: PathBuf,
    },
    /// Save a minimal configuration
    Savedefconfig {
        /// Output file
        #[arg(long, default_value = crate::ctx::DEFAULT_DEFCONFIG)]
        out: PathBuf,
    },
    /// Assign symbol values from the command line
    Setconfig {
        /// Assignments in NAME=VALUE form
        assignments: Vec<String>,
        /// Ignore assignments to symbols that do not exist
        #[arg(long)]
        no_check_exists: bool,
        /// Accept assignments that do not end up with the assigned value
        #[arg(long)]
        no_check_value: bool,
    },
    /// List visible symbols without a value in the configuration
    Listnewconfig,
    /// Generate the C header from the configuration
    Genconfig {
        /// Output path of the header
        #[arg(long)]
        header_path: Option<PathBuf>,
        /// Also write the configuration to this file
        #[arg(long)]
        config_out: Option<PathBuf>,
        /// Write the list of parsed Kconfig files to this file
        #[arg(long)]
        file_list: Option<PathBuf>,
    },
    /// Check the Kconfig files for common problems
    Lint {
        /// Checks to run [default: all]
        #[arg(short, long = "check", value_enum)]
        checks: Vec<lint::Check>,
        /// Directory to search for symbol references, may be repeated
        #[arg(long = "search-dir")]
        search_dirs: Vec<PathBuf>,
    },
    /// Print every symbol with its type and value
    Dump {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Tool {
    pub fn run(self, ctx: &AppContext) -> anyhow::Result<()> {
        match self {
            Tool::Menuconfig => crate::menuconfig::MenuConfigHandler::handle_menuconfig(ctx),
            Tool::Allyesconfig => allconfig::run(ctx, AllConfigMode::Yes),
            Tool::Allmodconfig => allconfig::run(ctx, AllConfigMode::Mod),
            Tool::Allnoconfig => allconfig::run(ctx, AllConfigMode::No),
            Tool::Alldefconfig => allconfig::run(ctx, AllConfigMode::Def),
            Tool::Olddefconfig => defconfig::olddefconfig(ctx),
            Tool::Defconfig { file } => defconfig::defconfig(ctx, &file),
            Tool::Savedefconfig { out } => defconfig::savedefconfig(ctx, &out),
            Tool::Setconfig {
                assignments,
                no_check_exists,
                no_check_value,
            } => setconfig::run(
                ctx,
                &assignments,
                setconfig::Checks {
                    exists: !no_check_exists,
                    value: !no_check_value,
                },
            ),
            Tool::Listnewconfig => defconfig::listnewconfig(ctx),
            Tool::Genconfig {
                header_path,
                config_out,
                file_list,
            } => defconfig::genconfig(
                ctx,
                header_path.as_deref(),
                config_out.as_deref(),
                file_list.as_deref(),
            ),
            Tool::Lint {
                checks,
                search_dirs,
            } => lint::run(ctx, &checks, &search_dirs),
            Tool::Dump { json } => dump::run(ctx, json),
        }
    }
}
