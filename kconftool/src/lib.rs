//! # kconftool
//!
//! Command-line front end for the [`kconfig`] engine.
//!
//! ## Tools
//!
//! - `menuconfig` - Interactive configuration editor
//! - `allyesconfig`, `allmodconfig`, `allnoconfig`, `alldefconfig` - Fresh
//!   configurations, honoring `KCONFIG_ALLCONFIG`
//! - `olddefconfig`, `defconfig`, `savedefconfig` - Updating, creating and
//!   minimizing configurations
//! - `setconfig` - Command-line assignments
//! - `listnewconfig`, `genconfig`, `lint`, `dump` - Reporting and output
//!
//! ## Modules
//!
//! - [`ctx`] - Application context and path resolution
//! - [`menuconfig`] - Terminal editor runner
//! - [`settings`] - `.kconftool.toml` settings file
//! - [`term`] - crossterm terminal backend
//! - [`tools`] - The subcommands
//! - [`utils`] - Placeholder expansion and small helpers

#[macro_use]
extern crate log;

/// Application context and path resolution.
pub mod ctx;

/// Interactive configuration editor on the real terminal.
pub mod menuconfig;

pub mod settings;

/// Terminal backend for [`kconfig::ui`].
pub mod term;

/// Implementations of the subcommands.
pub mod tools;

pub mod utils;
