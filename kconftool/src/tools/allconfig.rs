//! `allyesconfig`, `allmodconfig`, `allnoconfig` and `alldefconfig`.
//!
//! Each starts from scratch rather than from the existing configuration,
//! then applies `$KCONFIG_ALLCONFIG` on top: empty or `1` means
//! `<mode>.config`, falling back on `all.config`; anything else is a path.

use std::{env, path::Path};

use anyhow::bail;
use kconfig::{Kconfig, SymbolType};

use crate::ctx::{AppContext, print_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllConfigMode {
    Yes,
    Mod,
    No,
    Def,
}

impl AllConfigMode {
    /// File looked up when `$KCONFIG_ALLCONFIG` is empty or `1`.
    pub fn allconfig_name(self) -> &'static str {
        match self {
            AllConfigMode::Yes => "allyes.config",
            AllConfigMode::Mod => "allmod.config",
            AllConfigMode::No => "allno.config",
            AllConfigMode::Def => "alldef.config",
        }
    }
}

pub fn run(ctx: &AppContext, mode: AllConfigMode) -> anyhow::Result<()> {
    let mut kconf = ctx.load_kconfig()?;
    apply(&mut kconf, mode);
    load_allconfig(&mut kconf, mode.allconfig_name())?;
    ctx.save_config(&kconf)
}

/// Assigns every symbol and choice the value `mode` asks for.
pub fn apply(kconf: &mut Kconfig, mode: AllConfigMode) {
    // Promptless and out-of-type assignments are expected here
    let warn = kconf.warn.enabled;
    kconf.warn.enabled = false;

    let syms = kconf.unique_defined_syms().to_vec();
    let choices = kconf.unique_choices().to_vec();
    match mode {
        AllConfigMode::Yes => {
            for sym in syms {
                // Choice members follow the choice mode and selection
                let s = kconf.sym(sym);
                if s.choice().is_none() && s.orig_type().is_bool_or_tristate() {
                    kconf.set_value(sym, "y");
                }
            }
            for choice in choices {
                kconf.set_choice_value(choice, "y");
            }
        }
        AllConfigMode::Mod => {
            for sym in syms {
                let s = kconf.sym(sym);
                if s.choice().is_some() {
                    continue;
                }
                match s.orig_type() {
                    SymbolType::Bool => {
                        kconf.set_value(sym, "y");
                    }
                    SymbolType::Tristate => {
                        kconf.set_value(sym, "m");
                    }
                    _ => {}
                }
            }
            for choice in choices {
                let value = match kconf.choice(choice).orig_type() {
                    SymbolType::Bool => "y",
                    _ => "m",
                };
                kconf.set_choice_value(choice, value);
            }
        }
        AllConfigMode::No => {
            for sym in syms {
                if !kconf.sym(sym).orig_type().is_bool_or_tristate() {
                    continue;
                }
                let value = if kconf.sym(sym).is_allnoconfig_y() { "y" } else { "n" };
                kconf.set_value(sym, value);
            }
        }
        AllConfigMode::Def => {}
    }

    kconf.warn.enabled = warn;
}

/// Merges the `$KCONFIG_ALLCONFIG` file, if requested.
pub fn load_allconfig(kconf: &mut Kconfig, filename: &str) -> anyhow::Result<()> {
    let Ok(allconfig) = env::var("KCONFIG_ALLCONFIG") else {
        return Ok(());
    };

    if allconfig.is_empty() || allconfig == "1" {
        let msg = match kconf.load_config(Some(Path::new(filename)), false) {
            Ok(msg) => msg,
            Err(e1) => match kconf.load_config(Some(Path::new("all.config")), false) {
                Ok(msg) => msg,
                Err(e2) => bail!(
                    "KCONFIG_ALLCONFIG is set, but neither '{filename}' nor 'all.config' could \
                     be opened: {e1}; {e2}"
                ),
            },
        };
        print_status(&msg);
    } else {
        match kconf.load_config(Some(Path::new(&allconfig)), false) {
            Ok(msg) => print_status(&msg),
            Err(e) => bail!("KCONFIG_ALLCONFIG is set to '{allconfig}', which could not be opened: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use kconfig::Tristate;

    use super::*;

    const KCONFIG: &str = "\
config MODULES
\tbool \"modules\"
\toption modules
config B
\tbool \"b\"
config T
\ttristate \"t\"
config KEEP
\tbool \"keep\"
\toption allnoconfig_y
config S
\tstring \"s\"
\tdefault \"text\"
choice
\tprompt \"c\"
config C1
\tbool \"c1\"
config C2
\tbool \"c2\"
endchoice
";

    fn value(kconf: &Kconfig, name: &str) -> Tristate {
        kconf.tri_value(kconf.lookup(name).unwrap())
    }

    #[test]
    fn test_allyes() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        apply(&mut kconf, AllConfigMode::Yes);
        assert_eq!(value(&kconf, "MODULES"), Tristate::Y);
        assert_eq!(value(&kconf, "B"), Tristate::Y);
        assert_eq!(value(&kconf, "T"), Tristate::Y);
        assert_eq!(value(&kconf, "C1"), Tristate::Y);
        assert_eq!(kconf.str_value(kconf.lookup("S").unwrap()), "text");
        assert!(kconf.warnings().is_empty());
    }

    #[test]
    fn test_allmod() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        apply(&mut kconf, AllConfigMode::Mod);
        assert_eq!(value(&kconf, "B"), Tristate::Y);
        assert_eq!(value(&kconf, "T"), Tristate::M);
        assert_eq!(value(&kconf, "C1"), Tristate::Y);
    }

    #[test]
    fn test_allno_keeps_allnoconfig_y() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        apply(&mut kconf, AllConfigMode::No);
        assert_eq!(value(&kconf, "B"), Tristate::N);
        assert_eq!(value(&kconf, "T"), Tristate::N);
        assert_eq!(value(&kconf, "KEEP"), Tristate::Y);
        // Mandatory choices still pick a member
        assert_eq!(value(&kconf, "C1"), Tristate::Y);
    }
}
