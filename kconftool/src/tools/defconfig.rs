//! Tools that go through the existing configuration file: `olddefconfig`,
//! `defconfig`, `savedefconfig`, `listnewconfig` and `genconfig`.

use std::{fs, path::Path};

use anyhow::Context;
use kconfig::{Kconfig, Tristate};

use crate::ctx::{AppContext, print_status};

/// Loads the configuration and writes it back, with defaults for symbols it
/// does not mention.
pub fn olddefconfig(ctx: &AppContext) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig_with_config()?;
    ctx.save_config(&kconf)
}

/// Replaces the configuration with the one described by `file`.
pub fn defconfig(ctx: &AppContext, file: &Path) -> anyhow::Result<()> {
    let mut kconf = ctx.load_kconfig()?;
    let msg = kconf
        .load_config(Some(file), true)
        .with_context(|| format!("Failed to load defconfig: {}", file.display()))?;
    print_status(&msg);
    ctx.save_config(&kconf)
}

pub fn savedefconfig(ctx: &AppContext, out: &Path) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig_with_config()?;
    let msg = kconf
        .write_min_config(out, ctx.config_header())
        .with_context(|| format!("Failed to write minimal configuration: {}", out.display()))?;
    print_status(&msg);
    Ok(())
}

pub fn listnewconfig(ctx: &AppContext) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig_with_config()?;
    for line in new_symbols(&kconf) {
        println!("{line}");
    }
    Ok(())
}

/// `CONFIG_NAME=value` for every visible symbol the loaded configuration
/// did not assign.
pub fn new_symbols(kconf: &Kconfig) -> Vec<String> {
    kconf
        .unique_defined_syms()
        .iter()
        .copied()
        .filter(|&sym| {
            let s = kconf.sym(sym);
            s.user_value().is_none()
                && !s.is_transitional()
                && kconf.visibility(sym) != Tristate::N
                && !kconf.config_string(sym).is_empty()
        })
        .map(|sym| {
            format!(
                "{}{}={}",
                kconf.config_prefix(),
                kconf.sym(sym).name(),
                kconf.str_value(sym)
            )
        })
        .collect()
}

/// Writes the C header and, optionally, a copy of the configuration and the
/// list of Kconfig files that were parsed.
pub fn genconfig(
    ctx: &AppContext,
    header_path: Option<&Path>,
    config_out: Option<&Path>,
    file_list: Option<&Path>,
) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig_with_config()?;

    let header_path = header_path.or(ctx.header_path.as_deref());
    let msg = kconf
        .write_autoconf(header_path, ctx.autoheader())
        .context("Failed to write C header")?;
    print_status(&msg);

    if let Some(out) = config_out {
        let msg = kconf
            .write_config(Some(out), ctx.config_header(), false)
            .with_context(|| format!("Failed to write configuration: {}", out.display()))?;
        print_status(&msg);
    }

    if let Some(list) = file_list {
        let mut content = kconf.kconfig_filenames().join("\n");
        content.push('\n');
        fs::write(list, content)
            .with_context(|| format!("Failed to write file list: {}", list.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_symbols() {
        let text = "config OLD\n\tbool \"old\"\nconfig NEW\n\tbool \"new\"\n\tdefault y\n\
                    config HIDDEN\n\tbool\n\tdefault y\n";
        let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
        kconf.load_config_text("CONFIG_OLD=y\n", ".config", true);

        assert_eq!(new_symbols(&kconf), vec!["CONFIG_NEW=y".to_string()]);
    }
}
