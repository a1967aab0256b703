//! `setconfig NAME=VALUE...`: assigns values on top of the current
//! configuration and saves it.

use anyhow::bail;
use kconfig::Kconfig;

use crate::{ctx::AppContext, utils::split_assignment};

/// What to verify for each assignment.
#[derive(Debug, Clone, Copy)]
pub struct Checks {
    /// The symbol must exist.
    pub exists: bool,
    /// The symbol must end up with the assigned value.
    pub value: bool,
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            exists: true,
            value: true,
        }
    }
}

pub fn run(ctx: &AppContext, assignments: &[String], checks: Checks) -> anyhow::Result<()> {
    let mut kconf = ctx.load_kconfig_with_config()?;
    apply(&mut kconf, assignments, checks)?;
    ctx.save_config(&kconf)
}

pub fn apply(kconf: &mut Kconfig, assignments: &[String], checks: Checks) -> anyhow::Result<()> {
    let prefix = kconf.config_prefix().to_string();
    for arg in assignments {
        let Some((name, value)) = split_assignment(arg, Some(prefix.as_str())) else {
            bail!("no '=' in assignment: '{arg}'");
        };

        let sym = match kconf.lookup(name) {
            Some(sym) if kconf.sym(sym).is_defined() => sym,
            _ if checks.exists => bail!("no symbol '{name}' in configuration"),
            _ => {
                warn!("skipping assignment to unknown symbol {name}");
                continue;
            }
        };

        if !kconf.set_value(sym, value) {
            bail!(
                "'{value}' is an invalid value for the {} symbol {name}",
                kconf.sym(sym).orig_type()
            );
        }

        let got = kconf.str_value(sym);
        if checks.value && got != value {
            bail!(
                "{name} was assigned the value '{value}', but got the value '{got}'. Check the \
                 symbol's dependencies, and make sure that it has a prompt."
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KCONFIG: &str = "\
config DEP
\tbool \"dep\"
config FEATURE
\tbool \"feature\"
\tdepends on DEP
config COUNT
\tint \"count\"
\tdefault 4
";

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_assignments_apply() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        apply(
            &mut kconf,
            &args(&["DEP=y", "CONFIG_FEATURE=y", "COUNT=12"]),
            Checks::default(),
        )
        .unwrap();
        assert_eq!(kconf.str_value(kconf.lookup("FEATURE").unwrap()), "y");
        assert_eq!(kconf.str_value(kconf.lookup("COUNT").unwrap()), "12");
    }

    #[test]
    fn test_unmet_dependency_is_reported() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        let err = apply(&mut kconf, &args(&["FEATURE=y"]), Checks::default()).unwrap_err();
        assert!(err.to_string().contains("but got the value 'n'"));

        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        let checks = Checks {
            value: false,
            ..Checks::default()
        };
        assert!(apply(&mut kconf, &args(&["FEATURE=y"]), checks).is_ok());
    }

    #[test]
    fn test_bad_assignments() {
        let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        let err = apply(&mut kconf, &args(&["COUNT"]), Checks::default()).unwrap_err();
        assert!(err.to_string().contains("no '=' in assignment"));

        let err = apply(&mut kconf, &args(&["MISSING=y"]), Checks::default()).unwrap_err();
        assert!(err.to_string().contains("no symbol 'MISSING'"));

        let err = apply(&mut kconf, &args(&["COUNT=abc"]), Checks::default()).unwrap_err();
        assert!(err.to_string().contains("invalid value for the int symbol COUNT"));

        let checks = Checks {
            exists: false,
            ..Checks::default()
        };
        assert!(apply(&mut kconf, &args(&["MISSING=y"]), checks).is_ok());
    }
}
