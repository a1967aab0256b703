//! Macro expansion applied to each logical line before tokenizing.

use std::{
    collections::{BTreeSet, HashMap},
    env,
    sync::LazyLock,
};

use regex::Regex;

use crate::{
    Result,
    error::{Error, Location},
};

/// Text substitution run on every logical line before it is tokenized.
///
/// The engine treats this as a black box: whatever comes out is parsed as
/// Kconfig syntax.
pub trait Preprocessor {
    /// Expands `line`, read at `loc`. Returns `None` when the line was
    /// consumed by the preprocessor (a variable assignment).
    fn process(&mut self, line: &str, loc: &Location) -> Result<Option<String>>;

    /// Environment variables looked up so far.
    fn env_vars(&self) -> Vec<String> {
        Vec::new()
    }
}

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9_-]+)\s*(:=|\+=|=)\s*(.*?)\s*$")
        .expect("Invalid variable assignment regex")
});

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct Variable {
    value: String,
    /// `=` variables are expanded when used, `:=` ones when assigned.
    recursive: bool,
}

/// `$(NAME)` expansion from Kconfig variables and the environment, plus a
/// handful of built-in functions.
#[derive(Debug, Default)]
pub struct DefaultPreprocessor {
    vars: HashMap<String, Variable>,
    env_vars: BTreeSet<String>,
}

impl DefaultPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a Kconfig variable as written.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|v| v.value.as_str())
    }

    fn error(loc: &Location, message: impl Into<String>) -> Error {
        Error::Preprocess {
            location: loc.clone(),
            message: message.into(),
        }
    }

    fn assign(&mut self, name: &str, op: &str, value: &str, loc: &Location) -> Result<()> {
        match op {
            ":=" => {
                let value = self.expand(value, loc, 0)?;
                self.vars.insert(
                    name.to_string(),
                    Variable {
                        value,
                        recursive: false,
                    },
                );
            }
            "=" => {
                self.vars.insert(
                    name.to_string(),
                    Variable {
                        value: value.to_string(),
                        recursive: true,
                    },
                );
            }
            _ => {
                let recursive = self.vars.get(name).is_none_or(|v| v.recursive);
                let addition = if recursive {
                    value.to_string()
                } else {
                    self.expand(value, loc, 0)?
                };
                let var = self.vars.entry(name.to_string()).or_insert(Variable {
                    value: String::new(),
                    recursive,
                });
                if !var.value.is_empty() {
                    var.value.push(' ');
                }
                var.value.push_str(&addition);
            }
        }
        Ok(())
    }

    fn expand(&mut self, s: &str, loc: &Location, depth: usize) -> Result<String> {
        if depth > MAX_DEPTH {
            return Err(Self::error(loc, "too deep recursion in macro expansion"));
        }

        let chars: Vec<char> = s.chars().collect();
        let mut out = String::with_capacity(s.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '$' && chars.get(i + 1) == Some(&'$') {
                out.push('$');
                i += 2;
            } else if chars[i] == '$' && chars.get(i + 1) == Some(&'(') {
                let mut nest = 0;
                let mut end = None;
                for (j, c) in chars.iter().enumerate().skip(i + 1) {
                    match c {
                        '(' => nest += 1,
                        ')' => {
                            nest -= 1;
                            if nest == 0 {
                                end = Some(j);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let Some(end) = end else {
                    return Err(Self::error(
                        loc,
                        format!("unterminated reference to '{s}': missing ')'"),
                    ));
                };
                let inner: String = chars[i + 2..end].iter().collect();
                out.push_str(&self.expand_call(&inner, loc, depth)?);
                i = end + 1;
            } else {
                out.push(chars[i]);
                i += 1;
            }
        }
        Ok(out)
    }

    /// Expands the inside of `$( ... )`.
    fn expand_call(&mut self, inner: &str, loc: &Location, depth: usize) -> Result<String> {
        let mut parts = Vec::new();
        let mut nest = 0;
        let mut cur = String::new();
        for c in inner.chars() {
            match c {
                '(' => {
                    nest += 1;
                    cur.push(c);
                }
                ')' => {
                    nest -= 1;
                    cur.push(c);
                }
                ',' if nest == 0 => parts.push(std::mem::take(&mut cur)),
                _ => cur.push(c),
            }
        }
        parts.push(cur);

        let mut expanded = Vec::with_capacity(parts.len());
        for part in &parts {
            expanded.push(self.expand(part, loc, depth + 1)?);
        }
        let name = expanded.remove(0);
        let name = name.trim();
        let args = expanded;

        match (name, args.as_slice()) {
            ("filename", []) => Ok(loc.filename.clone()),
            ("lineno", []) => Ok(loc.linenr.to_string()),
            ("info", [msg]) => {
                info!("{msg}");
                Ok(String::new())
            }
            ("warning-if", [cond, msg]) => {
                if cond == "y" {
                    warn!("{loc}: {msg}");
                }
                Ok(String::new())
            }
            ("error-if", [cond, msg]) => {
                if cond == "y" {
                    return Err(Self::error(loc, msg.clone()));
                }
                Ok(String::new())
            }
            (_, []) => {
                if let Some(var) = self.vars.get(name).cloned() {
                    if var.recursive {
                        return self.expand(&var.value, loc, depth + 1);
                    }
                    return Ok(var.value);
                }
                self.env_vars.insert(name.to_string());
                Ok(env::var(name).unwrap_or_default())
            }
            _ => Err(Self::error(
                loc,
                format!("unknown function '{name}' or wrong number of arguments"),
            )),
        }
    }
}

impl Preprocessor for DefaultPreprocessor {
    fn process(&mut self, line: &str, loc: &Location) -> Result<Option<String>> {
        if let Some(caps) = ASSIGN_RE.captures(line) {
            let name = &caps[1];
            let op = &caps[2];
            let value = &caps[3];
            self.assign(name, op, value, loc)?;
            return Ok(None);
        }
        self.expand(line, loc, 0).map(Some)
    }

    fn env_vars(&self) -> Vec<String> {
        self.env_vars.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("Kconfig", 3)
    }

    fn run(pp: &mut DefaultPreprocessor, line: &str) -> Option<String> {
        pp.process(line, &loc()).unwrap()
    }

    #[test]
    fn test_immediate_and_recursive_variables() {
        let mut pp = DefaultPreprocessor::new();
        assert_eq!(run(&mut pp, "A := one"), None);
        assert_eq!(run(&mut pp, "B = $(A) two"), None);
        assert_eq!(run(&mut pp, "A := uno"), None);
        assert_eq!(
            run(&mut pp, "prompt \"$(B)\"").as_deref(),
            Some("prompt \"uno two\"")
        );
        assert_eq!(run(&mut pp, "B += three"), None);
        assert_eq!(pp.variable("B"), Some("$(A) two three"));
    }

    #[test]
    fn test_env_fallback_is_recorded() {
        let mut pp = DefaultPreprocessor::new();
        let out = run(&mut pp, "source \"$(KCONFIG_PP_TEST_UNSET_VAR)/Kconfig\"");
        assert_eq!(out.as_deref(), Some("source \"/Kconfig\""));
        assert_eq!(pp.env_vars(), vec!["KCONFIG_PP_TEST_UNSET_VAR".to_string()]);
    }

    #[test]
    fn test_builtin_functions() {
        let mut pp = DefaultPreprocessor::new();
        assert_eq!(
            run(&mut pp, "comment \"$(filename):$(lineno)\"").as_deref(),
            Some("comment \"Kconfig:3\"")
        );
        assert_eq!(run(&mut pp, "$(info,hello)").as_deref(), Some(""));
        assert_eq!(run(&mut pp, "$$(x)").as_deref(), Some("$(x)"));

        let err = pp.process("$(error-if,y,boom)", &loc()).unwrap_err();
        assert_eq!(err.to_string(), "Kconfig:3: error: boom");
        assert!(pp.process("$(shell,true)", &loc()).is_err());
        assert!(pp.process("$(A", &loc()).is_err());
    }

    #[test]
    fn test_plain_lines_pass_through() {
        let mut pp = DefaultPreprocessor::new();
        assert_eq!(
            run(&mut pp, "\tdepends on A = B").as_deref(),
            Some("\tdepends on A = B")
        );
        assert_eq!(run(&mut pp, "config FOO").as_deref(), Some("config FOO"));
    }
}
