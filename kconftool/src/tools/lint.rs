//! Checks for Kconfig trees that parse fine but are likely mistakes.
//!
//! Some checks are heuristics. References outside the Kconfig files are
//! only seen in the directories passed with `--search-dir`.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use clap::ValueEnum;
use colored::Colorize;
use kconfig::{Item, Kconfig, MenuItem, SymbolId};
use regex::Regex;

use crate::ctx::AppContext;

/// `CONFIG_NAME` references in source files.
static CONFIG_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCONFIG_([A-Z0-9_]+)\b").expect("Invalid CONFIG_ regex"));

/// Lines assigning a value, as in `.config` files. Not references.
static CONFIG_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s#]*CONFIG_[A-Z0-9_]+=").expect("Invalid assignment regex")
});

static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#\s*define\s+([A-Z0-9_]+)\b").expect("Invalid #define regex")
});

/// Preprocessor tests on a bare name.
static BARE_TEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:#\s*if(?:n?def)?\s+(?:defined\s*\(\s*)?|\bdefined\s*\(\s*|IS_ENABLED\(\s*)",
        r"([A-Za-z0-9_]+)\b"
    ))
    .expect("Invalid preprocessor test regex")
});

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Symbols without prompt or defaults that are never selected or implied
    AlwaysN,
    /// Symbols nothing seems to reference
    Unused,
    /// `menuconfig` symbols with empty menus
    Menuconfigs,
    /// Symbols only defined in Kconfig.defconfig files
    Defconfig,
    /// Preprocessor tests on symbol names without the CONFIG_ prefix
    Prefix,
    /// Symbols referenced but never defined
    Undefined,
}

impl Check {
    pub const ALL: [Check; 6] = [
        Check::AlwaysN,
        Check::Unused,
        Check::Menuconfigs,
        Check::Defconfig,
        Check::Prefix,
        Check::Undefined,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Check::AlwaysN => "Symbols that can't be anything but n/empty",
            Check::Unused => "Symbols that look unused",
            Check::Menuconfigs => "menuconfig symbols with empty menus",
            Check::Defconfig => "Symbols only defined in Kconfig.defconfig files",
            Check::Prefix => "Symbol references that might be missing a CONFIG_ prefix",
            Check::Undefined => "Symbols referenced but never defined",
        }
    }
}

pub fn run(ctx: &AppContext, checks: &[Check], search_dirs: &[PathBuf]) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig()?;
    let checks = if checks.is_empty() {
        &Check::ALL[..]
    } else {
        checks
    };
    let sources = SourceRefs::scan(search_dirs);

    let mut separator = false;
    for &check in checks {
        let results = run_check(&kconf, check, &sources);
        if results.is_empty() {
            continue;
        }
        if separator {
            println!();
        }
        separator = true;
        let title = check.title();
        println!("{}\n{}", title.yellow().bold(), "=".repeat(title.len()));
        for line in results {
            println!("{line}");
        }
    }
    Ok(())
}

/// What the search directories say about symbol names.
#[derive(Debug, Default)]
pub struct SourceRefs {
    /// Names used as `CONFIG_NAME`.
    pub referenced: HashSet<String>,
    /// Names `#define`d as macros.
    pub defined: HashSet<String>,
    /// `(file:line, name)` for preprocessor tests on bare names.
    pub bare_tests: Vec<(String, String)>,
}

impl SourceRefs {
    pub fn scan(dirs: &[PathBuf]) -> Self {
        let mut refs = Self::default();
        for dir in dirs {
            if dir.is_dir() {
                refs.scan_dir(dir);
            } else {
                warn!("search directory {} does not exist", dir.display());
            }
        }
        refs
    }

    fn scan_dir(&mut self, dir: &Path) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_dir() {
                if !hidden && entry.file_name() != "target" {
                    self.scan_dir(&path);
                }
            } else if let Ok(text) = fs::read_to_string(&path) {
                self.scan_text(&path.display().to_string(), &text);
            }
        }
    }

    pub fn scan_text(&mut self, filename: &str, text: &str) {
        for (idx, line) in text.lines().enumerate() {
            if !CONFIG_ASSIGN_RE.is_match(line) {
                for caps in CONFIG_REF_RE.captures_iter(line) {
                    self.referenced.insert(caps[1].to_string());
                }
            }
            for caps in DEFINE_RE.captures_iter(line) {
                self.defined.insert(caps[1].to_string());
            }
            for caps in BARE_TEST_RE.captures_iter(line) {
                self.bare_tests
                    .push((format!("{filename}:{}", idx + 1), caps[1].to_string()));
            }
        }
    }
}

pub fn run_check(kconf: &Kconfig, check: Check, sources: &SourceRefs) -> Vec<String> {
    let defined = kconf.unique_defined_syms();
    match check {
        Check::AlwaysN => defined
            .iter()
            .copied()
            .filter(|&sym| {
                let s = kconf.sym(sym);
                !has_prompt(kconf, sym)
                    && s.rev_dep().is_n()
                    && s.weak_rev_dep().is_n()
                    && s.defaults().is_empty()
            })
            .map(|sym| name_and_locs(kconf, sym))
            .collect(),
        Check::Unused => {
            let in_kconfig = referenced_in_kconfig(kconf);
            defined
                .iter()
                .copied()
                .filter(|&sym| {
                    let s = kconf.sym(sym);
                    s.selects().is_empty()
                        && s.implies().is_empty()
                        && s.choice().is_none()
                        && !in_kconfig.contains(&sym)
                        && !sources.referenced.contains(s.name())
                })
                .map(|sym| name_and_locs(kconf, sym))
                .collect()
        }
        Check::Menuconfigs => kconf
            .node_iter(false)
            .filter_map(|n| {
                let node = kconf.node(n);
                let MenuItem::Symbol(sym) = node.item() else {
                    return None;
                };
                (node.is_menuconfig() && node.list().is_none()).then(|| {
                    format!(
                        "{:40} {}:{}",
                        kconf.sym(sym).name(),
                        node.filename(),
                        node.linenr()
                    )
                })
            })
            .collect(),
        Check::Defconfig => defined
            .iter()
            .copied()
            .filter(|&sym| {
                kconf
                    .sym(sym)
                    .nodes()
                    .iter()
                    .all(|&n| kconf.node(n).filename().contains("defconfig"))
            })
            .map(|sym| name_and_locs(kconf, sym))
            .collect(),
        Check::Prefix => {
            let names: HashSet<&str> = defined
                .iter()
                .map(|&sym| kconf.sym(sym).name())
                .filter(|name| !sources.defined.contains(*name))
                .collect();
            sources
                .bare_tests
                .iter()
                .filter(|(_, name)| names.contains(name.as_str()))
                .map(|(loc, name)| format!("{loc}: {name}"))
                .collect()
        }
        Check::Undefined => {
            let mut undefined: Vec<_> = kconf
                .syms()
                .filter(|&(name, sym)| {
                    !kconf.sym(sym).is_defined() && !is_number(name) && name != "MODULES"
                })
                .collect();
            undefined.sort_by_key(|&(name, _)| name);
            undefined
                .into_iter()
                .filter_map(|(name, sym)| {
                    let refs: Vec<String> = kconf
                        .node_iter(false)
                        .filter(|&n| kconf.node_referenced(n).contains(&Item::Sym(sym)))
                        .map(|n| format!("{}:{}", kconf.node(n).filename(), kconf.node(n).linenr()))
                        .collect();
                    (!refs.is_empty()).then(|| format!("{name:40} {}", refs.join(", ")))
                })
                .collect()
        }
    }
}

fn has_prompt(kconf: &Kconfig, sym: SymbolId) -> bool {
    kconf
        .sym(sym)
        .nodes()
        .iter()
        .any(|&n| kconf.node(n).prompt().is_some())
}

fn name_and_locs(kconf: &Kconfig, sym: SymbolId) -> String {
    let locs: Vec<String> = kconf
        .sym(sym)
        .nodes()
        .iter()
        .map(|&n| format!("{}:{}", kconf.node(n).filename(), kconf.node(n).linenr()))
        .collect();
    format!("{:40} {}", kconf.sym(sym).name(), locs.join(", "))
}

fn referenced_in_kconfig(kconf: &Kconfig) -> HashSet<SymbolId> {
    kconf
        .node_iter(false)
        .flat_map(|n| kconf.node_referenced(n))
        .filter_map(|item| match item {
            Item::Sym(sym) => Some(sym),
            Item::Choice(_) => None,
        })
        .collect()
}

fn is_number(name: &str) -> bool {
    let hex = name
        .strip_prefix("0x")
        .or_else(|| name.strip_prefix("0X"))
        .is_some_and(|h| i64::from_str_radix(h, 16).is_ok());
    hex || name.parse::<i64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KCONFIG: &str = "\
config USED
\tbool \"used\"
config NEVER
\tbool
config USER
\tbool \"user\"
\tdepends on USED && GHOST
menuconfig EMPTY
\tbool \"empty\"
config NUM
\tint \"num\"
\tdefault 10
";

    fn names(results: &[String]) -> Vec<&str> {
        results
            .iter()
            .filter_map(|r| r.split_whitespace().next())
            .collect()
    }

    #[test]
    fn test_kconfig_only_checks() {
        let kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        let none = SourceRefs::default();

        assert_eq!(names(&run_check(&kconf, Check::AlwaysN, &none)), ["NEVER"]);
        assert_eq!(
            names(&run_check(&kconf, Check::Unused, &none)),
            ["NEVER", "USER", "EMPTY", "NUM"]
        );
        assert_eq!(
            run_check(&kconf, Check::Menuconfigs, &none),
            [format!("{:40} Kconfig:8", "EMPTY")]
        );
        assert_eq!(
            run_check(&kconf, Check::Undefined, &none),
            [format!("{:40} Kconfig:5", "GHOST")]
        );
        assert!(run_check(&kconf, Check::Defconfig, &none).is_empty());
    }

    #[test]
    fn test_source_references() {
        let kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
        let mut sources = SourceRefs::default();
        sources.scan_text(
            "main.c",
            "#ifdef CONFIG_USER\n#endif\nCONFIG_NUM=3\n#if defined(EMPTY)\n#endif\n\
             #define NUM 4\n#ifdef NUM\n#endif\n",
        );

        assert_eq!(
            names(&run_check(&kconf, Check::Unused, &sources)),
            ["NEVER", "EMPTY", "NUM"]
        );
        assert_eq!(
            run_check(&kconf, Check::Prefix, &sources),
            ["main.c:4: EMPTY"]
        );
    }
}
