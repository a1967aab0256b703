//! Runs the interactive editor on the real terminal.

use anyhow::Context;
use colored::Colorize;
use kconfig::ui::MenuConfig;
use log::LevelFilter;

use crate::{ctx::AppContext, term::CrosstermTerminal};

pub struct MenuConfigHandler;

impl MenuConfigHandler {
    /// Loads the configuration, runs the editor until the user quits and
    /// reports the warnings collected on the way.
    pub fn handle_menuconfig(ctx: &AppContext) -> anyhow::Result<()> {
        let kconf = ctx.load_kconfig_with_config()?;
        // Warnings from loading were logged already
        kconf.clear_warnings();

        let mut editor = MenuConfig::new(kconf, ctx.config.clone());
        if let Some(header) = ctx.config_header() {
            editor = editor.with_header(header);
        }

        // Log output would land on top of the editor. Warnings are still
        // collected on the Kconfig object.
        let level = log::max_level();
        log::set_max_level(LevelFilter::Off);
        let result = Self::run_editor(&mut editor);
        log::set_max_level(level);
        result?;

        if editor.needs_save() {
            println!("{}", "Configuration was not saved".yellow());
        }
        for warning in editor.kconf().warnings() {
            eprintln!("{}", warning.yellow());
        }
        Ok(())
    }

    fn run_editor(editor: &mut MenuConfig) -> anyhow::Result<()> {
        let mut term = CrosstermTerminal::enter().context("Failed to set up the terminal")?;
        editor.run(&mut term).context("Terminal I/O failed")
    }
}
