//! `.config` files and C headers.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::{
    Kconfig, Result,
    error::Error,
    expr::{Item, SymbolId},
    menu::MenuItem,
    symbol::UserValue,
    tristate::{SymbolType, Tristate},
    util::{escape, unescape},
};

/// A complete quoted string value, with `\"` and `\\` escapes.
static STRING_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"((?:[^\\"]|\\.)*)"$"#).expect("Invalid string literal regex")
});

/// `$KCONFIG_CONFIG`, or `.config`.
pub fn standard_config_filename() -> PathBuf {
    env::var_os("KCONFIG_CONFIG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".config"))
}

/// One parsed `.config` line.
enum ConfLine<'a> {
    Set(&'a str, &'a str),
    Unset(&'a str),
    Ignored,
    Malformed,
}

impl Kconfig {
    fn parse_conf_line<'a>(&self, line: &'a str) -> ConfLine<'a> {
        if let Some(rest) = line.strip_prefix(self.config_prefix.as_str()) {
            if let Some((name, val)) = rest.split_once('=') {
                if !name.is_empty() {
                    return ConfLine::Set(name, val);
                }
            }
        }
        if let Some(rest) = line
            .strip_prefix("# ")
            .and_then(|r| r.strip_prefix(self.config_prefix.as_str()))
        {
            if let Some((name, tail)) = rest.split_once(' ') {
                if !name.is_empty() && tail.starts_with("is not set") {
                    return ConfLine::Unset(name);
                }
            }
        }
        if line.is_empty() || line.trim_start().starts_with('#') {
            ConfLine::Ignored
        } else {
            ConfLine::Malformed
        }
    }

    /// Opens a `.config` file, retrying relative to `$srctree`.
    fn read_config(&self, path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) => {
                let alt = self.resolve_path(path);
                if alt != path {
                    if let Ok(text) = fs::read_to_string(&alt) {
                        return Ok(text);
                    }
                }
                Err(Error::io(path, e))
            }
        }
    }

    /// Loads symbol values from a `.config` file.
    ///
    /// Without a path, `$KCONFIG_CONFIG` (or `.config`) is used, falling
    /// back on [`defconfig_filename`](Self::defconfig_filename) when it does
    /// not exist. With `replace`, values not assigned by the file are unset;
    /// otherwise they are kept. Returns a message describing what was done.
    pub fn load_config(&mut self, path: Option<&Path>, replace: bool) -> Result<String> {
        let (path, what) = match path {
            Some(p) => (p.to_path_buf(), format!("configuration '{}'", p.display())),
            None => {
                let std = standard_config_filename();
                if std.exists() || self.resolve_path(&std).exists() {
                    (std.clone(), format!("configuration '{}'", std.display()))
                } else {
                    let Some(defconfig) = self.defconfig_filename() else {
                        return Ok(format!(
                            "Using default symbol values (no '{}')",
                            std.display()
                        ));
                    };
                    let what = format!(
                        "default configuration '{}' (no '{}')",
                        defconfig.display(),
                        std.display()
                    );
                    (defconfig, what)
                }
            }
        };

        let text = self.read_config(&path)?;

        // Promptless assignments are normal in .config files
        self.warn_assign_no_prompt = false;
        self.load_config_text(&text, &path.to_string_lossy(), replace);
        self.warn_assign_no_prompt = true;

        let verb = if replace { "Replaced" } else { "Loaded" };
        Ok(format!("{verb} {what}"))
    }

    /// Applies the assignments in `text`, read from `filename`.
    pub fn load_config_text(&mut self, text: &str, filename: &str, replace: bool) {
        for &sym in &self.unique_defined_syms {
            self.syms[sym.0].was_set = false;
        }
        for &choice in &self.unique_choices {
            self.choices[choice.0].was_set = false;
        }
        if replace {
            self.missing_syms.clear();
        }

        for (idx, raw) in text.lines().enumerate() {
            let linenr = idx + 1;
            // Trailing whitespace is ignored
            let line = raw.trim_end();
            let loc = Some((filename, linenr));

            let (name, val, is_unset) = match self.parse_conf_line(line) {
                ConfLine::Set(name, val) => (name, val, false),
                ConfLine::Unset(name) => (name, "n", true),
                ConfLine::Ignored => continue,
                ConfLine::Malformed => {
                    self.warn_at(format!("ignoring malformed line '{line}'"), loc);
                    continue;
                }
            };

            let sym = match self.sym_table.get(name) {
                Some(&sym) if !self.syms[sym.0].nodes.is_empty() => sym,
                _ => {
                    self.undef_assign(name, val, loc);
                    continue;
                }
            };

            let orig_type = self.syms[sym.0].orig_type;
            let value = if is_unset {
                if !orig_type.is_bool_or_tristate() {
                    continue;
                }
                "n".to_string()
            } else if orig_type.is_bool_or_tristate() {
                // Only the first character counts
                let ok = match orig_type {
                    SymbolType::Bool => val.starts_with(['y', 'n']),
                    _ => val.starts_with(['y', 'm', 'n']),
                };
                if !ok {
                    self.warn_at(
                        format!(
                            "'{val}' is not a valid value for the {orig_type} symbol {}. \
                             Assignment ignored.",
                            self.name_and_loc(Item::Sym(sym))
                        ),
                        loc,
                    );
                    continue;
                }
                let val = val[..1].to_string();

                if let (Some(choice), false) = (self.syms[sym.0].choice, val == "n") {
                    // The choice mode follows from the member values
                    let prev = self.choices[choice.0].user_value;
                    if prev.is_some_and(|p| p.as_str() != val) {
                        self.warn_at("both m and y assigned to symbols within the same choice", loc);
                    }
                    self.set_choice_value(choice, &val);
                }
                val
            } else if orig_type == SymbolType::String {
                let Some(caps) = STRING_LITERAL_RE.captures(val) else {
                    self.warn_at(
                        format!(
                            "malformed string literal in assignment to {}. Assignment ignored.",
                            self.name_and_loc(Item::Sym(sym))
                        ),
                        loc,
                    );
                    continue;
                };
                unescape(&caps[1])
            } else {
                val.to_string()
            };

            if self.syms[sym.0].was_set {
                self.assigned_twice(sym, &value, loc);
            }
            self.set_value(sym, &value);
        }

        if replace {
            for sym in self.unique_defined_syms.clone() {
                if !self.syms[sym.0].was_set {
                    self.unset_value(sym);
                }
            }
            for choice in self.unique_choices.clone() {
                if !self.choices[choice.0].was_set {
                    self.unset_choice_value(choice);
                }
            }
        }
    }

    fn undef_assign(&mut self, name: &str, val: &str, loc: Option<(&str, usize)>) {
        self.missing_syms.push((name.to_string(), val.to_string()));
        if self.warn.assign_undef {
            self.warn_at(
                format!("attempt to assign the value '{val}' to the undefined symbol {name}"),
                loc,
            );
        }
    }

    fn assigned_twice(&self, sym: SymbolId, new: &str, loc: Option<(&str, usize)>) {
        let old = self.syms[sym.0]
            .user_value
            .as_ref()
            .map(UserValue::as_str)
            .unwrap_or("");
        let msg = format!(
            "{} set more than once. Old value \"{old}\", new value \"{new}\".",
            self.name_and_loc(Item::Sym(sym))
        );
        let enabled = if old == new {
            self.warn.assign_redun
        } else {
            self.warn.assign_override
        };
        if enabled {
            self.warn_at(msg, loc);
        }
    }

    /// The `.config` line for a symbol, with trailing newline, or an empty
    /// string if the symbol is not written out.
    pub fn config_string(&self, sym: SymbolId) -> String {
        let val = self.str_value(sym);
        if !self.write_to_conf(sym) {
            return String::new();
        }
        let s = &self.syms[sym.0];
        let prefix = &self.config_prefix;
        match s.orig_type {
            t if t.is_bool_or_tristate() && val == "n" => {
                format!("# {prefix}{} is not set\n", s.name)
            }
            SymbolType::String => format!("{prefix}{}=\"{}\"\n", s.name, escape(&val)),
            _ => format!("{prefix}{}={val}\n", s.name),
        }
    }

    /// Full `.config` contents: menu and comment headings for visible
    /// menus, `# end of` markers and every symbol once, in menu order.
    pub fn config_contents(&self, header: Option<&str>) -> String {
        let mut out = String::from(header.unwrap_or(&self.config_header));
        let mut seen = vec![false; self.syms.len()];

        let mut node = self.top_node;
        loop {
            let n = &self.nodes[node.0];
            if let Some(child) = n.list {
                node = child;
            } else if let Some(next) = n.next {
                node = next;
            } else {
                let mut cur = node;
                let mut found = None;
                while let Some(parent) = self.nodes[cur.0].parent {
                    cur = parent;
                    let p = &self.nodes[cur.0];
                    if p.item == MenuItem::Menu
                        && cur != self.top_node
                        && self.eval(&p.dep) != Tristate::N
                        && self.eval(&p.visibility) != Tristate::N
                    {
                        out.push_str(&format!("# end of {}\n", p.prompt_text().unwrap_or("")));
                    }
                    if let Some(next) = p.next {
                        found = Some(next);
                        break;
                    }
                }
                match found {
                    Some(next) => node = next,
                    None => return out,
                }
            }

            let n = &self.nodes[node.0];
            match n.item {
                MenuItem::Symbol(sym) => {
                    if seen[sym.0] {
                        continue;
                    }
                    seen[sym.0] = true;
                    out.push_str(&self.config_string(sym));
                }
                MenuItem::Choice(_) => {}
                MenuItem::Menu | MenuItem::Comment => {
                    let shown = self.eval(&n.dep) != Tristate::N
                        && (n.item == MenuItem::Comment
                            || self.eval(&n.visibility) != Tristate::N);
                    if shown {
                        out.push_str(&format!("\n#\n# {}\n#\n", n.prompt_text().unwrap_or("")));
                    }
                }
            }
        }
    }

    /// Writes the configuration. Without a path, `$KCONFIG_CONFIG` (or
    /// `.config`) is used. Unchanged files are left alone; otherwise the old
    /// file is kept as `<path>.old` when `save_old` is set.
    pub fn write_config(
        &self,
        path: Option<&Path>,
        header: Option<&str>,
        save_old: bool,
    ) -> Result<String> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(standard_config_filename);
        let contents = self.config_contents(header);
        if contents_eq(&path, &contents) {
            return Ok(format!("No change to configuration in '{}'", path.display()));
        }
        if save_old {
            save_old_file(&path);
        }
        fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        Ok(format!("Configuration saved to '{}'", path.display()))
    }

    /// The value a symbol would get without a user value.
    fn str_default(&self, sym: SymbolId) -> String {
        let s = &self.syms[sym.0];
        if s.orig_type.is_bool_or_tristate() {
            let mut val = Tristate::N;
            // Defaults, selects and implies do not apply to choice members
            if s.choice.is_none() {
                if let Some((default, cond)) = s
                    .defaults
                    .iter()
                    .map(|(d, c)| (d, self.eval(c)))
                    .find(|(_, c)| *c != Tristate::N)
                {
                    val = self.eval(default).min(cond);
                }
                val = val
                    .max(self.eval(&s.rev_dep))
                    .max(self.eval(&s.weak_rev_dep));
                if val == Tristate::M && self.sym_type(sym) == SymbolType::Bool {
                    val = Tristate::Y;
                }
            }
            return val.as_str().to_string();
        }

        if s.orig_type != SymbolType::Unknown {
            if let Some((default, _)) = s
                .defaults
                .iter()
                .find(|(_, cond)| self.eval(cond) != Tristate::N)
            {
                if let Some(d) = default.as_sym() {
                    return self.str_value(d);
                }
            }
        }
        String::new()
    }

    /// Minimal configuration: only symbols whose value differs from the one
    /// they would get anyway.
    pub fn min_config_contents(&self, header: Option<&str>) -> String {
        let mut out = String::from(header.unwrap_or(&self.config_header));

        for &sym in &self.unique_defined_syms {
            let s = &self.syms[sym.0];
            // Symbols the user cannot change. Selects do not affect choice
            // members.
            if s.choice.is_none() && self.visibility(sym) <= self.eval(&s.rev_dep) {
                continue;
            }
            if self.str_value(sym) == self.str_default(sym) {
                continue;
            }
            // Members a mandatory bool choice selects by default
            if let Some(choice) = s.choice {
                if !self.choices[choice.0].is_optional
                    && self.selection_from_defaults(choice) == Some(sym)
                    && s.orig_type == SymbolType::Bool
                    && self.tri_value(sym) == Tristate::Y
                {
                    continue;
                }
            }
            out.push_str(&self.config_string(sym));
        }
        out
    }

    /// Writes a minimal configuration, suitable as a defconfig.
    pub fn write_min_config(&self, path: &Path, header: Option<&str>) -> Result<String> {
        let contents = self.min_config_contents(header);
        if contents_eq(path, &contents) {
            return Ok(format!(
                "No change to minimal configuration in '{}'",
                path.display()
            ));
        }
        fs::write(path, contents).map_err(|e| Error::io(path, e))?;
        Ok(format!("Minimal configuration saved to '{}'", path.display()))
    }

    /// True if writing the configuration would change what was loaded:
    /// assignments to unknown symbols were dropped, symbols without a user
    /// value would be written, or a user value did not stick.
    pub fn config_outdated(&self) -> bool {
        if !self.missing_syms.is_empty() {
            return true;
        }
        self.unique_defined_syms.iter().any(|&sym| {
            let s = &self.syms[sym.0];
            match &s.user_value {
                None => !self.config_string(sym).is_empty(),
                Some(user) if s.orig_type.is_bool_or_tristate() => {
                    user.as_tri() != Some(self.tri_value(sym))
                }
                Some(user) => user.as_str() != self.str_value(sym),
            }
        })
    }

    /// C header with a `#define` per enabled symbol.
    pub fn autoconf_contents(&self, header: Option<&str>) -> String {
        let mut out = String::from(header.unwrap_or(&self.header_header));
        let prefix = &self.config_prefix;

        for &sym in &self.unique_defined_syms {
            let val = self.str_value(sym);
            if !self.write_to_conf(sym) {
                continue;
            }
            let s = &self.syms[sym.0];
            match s.orig_type {
                SymbolType::Bool | SymbolType::Tristate => match val.as_str() {
                    "y" => out.push_str(&format!("#define {prefix}{} 1\n", s.name)),
                    "m" => out.push_str(&format!("#define {prefix}{}_MODULE 1\n", s.name)),
                    _ => {}
                },
                SymbolType::String => {
                    out.push_str(&format!("#define {prefix}{} \"{}\"\n", s.name, escape(&val)));
                }
                SymbolType::Hex if !val.starts_with("0x") && !val.starts_with("0X") => {
                    out.push_str(&format!("#define {prefix}{} 0x{val}\n", s.name));
                }
                _ => out.push_str(&format!("#define {prefix}{} {val}\n", s.name)),
            }
        }
        out
    }

    /// Writes the C header, creating missing directories. Without a path,
    /// `$KCONFIG_AUTOHEADER` (or `include/generated/autoconf.h`) is used.
    pub fn write_autoconf(&self, path: Option<&Path>, header: Option<&str>) -> Result<String> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| {
            env::var_os("KCONFIG_AUTOHEADER")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("include/generated/autoconf.h"))
        });
        let contents = self.autoconf_contents(header);
        if contents_eq(&path, &contents) {
            return Ok(format!("No change to Kconfig header in '{}'", path.display()));
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        Ok(format!("Kconfig header saved to '{}'", path.display()))
    }

    /// First existing file among the `option defconfig_list` defaults whose
    /// condition holds.
    pub fn defconfig_filename(&self) -> Option<PathBuf> {
        let list = self.defconfig_list?;
        self.syms[list.0]
            .defaults
            .iter()
            .filter(|(_, cond)| self.eval(cond) != Tristate::N)
            .filter_map(|(default, _)| default.as_sym())
            .map(|d| PathBuf::from(self.str_value(d)))
            .find_map(|p| {
                if p.is_file() {
                    Some(p)
                } else {
                    let alt = self.resolve_path(&p);
                    alt.is_file().then_some(alt)
                }
            })
    }
}

fn contents_eq(path: &Path, contents: &str) -> bool {
    fs::read_to_string(path).is_ok_and(|old| old == contents)
}

/// Moves `path` to `path.old`. Failures are ignored; the backup is a
/// convenience.
fn save_old_file(path: &Path) {
    if !path.is_file() {
        return;
    }
    let mut old = path.as_os_str().to_owned();
    old.push(".old");
    if let Err(e) = fs::copy(path, &old) {
        debug!("Failed to back up {}: {e}", path.display());
    }
}
