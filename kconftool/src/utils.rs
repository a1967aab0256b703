//! Small helpers shared by the tools.

use std::{env, path::Path};

/// Replaces `${env:VAR}` and `${workspaceFolder}` placeholders.
///
/// Unset variables expand to the empty string. Anything else that looks
/// like a placeholder, including unterminated ones, is kept as written.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use kconftool::utils::replace_placeholders;
///
/// let out = replace_placeholders("${workspaceFolder}/.config", Path::new("/work"));
/// assert_eq!(out, "/work/.config");
/// ```
pub fn replace_placeholders(input: &str, workspace: &Path) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut placeholder = String::new();
        let mut depth = 1;
        let mut closed = false;
        for ch in chars.by_ref() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        closed = true;
                        break;
                    }
                }
                _ => {}
            }
            placeholder.push(ch);
        }

        match (closed, placeholder.as_str()) {
            (true, "workspaceFolder") => result.push_str(&workspace.display().to_string()),
            (true, p) if p.starts_with("env:") => {
                let name = &p[4..];
                if let Ok(value) = env::var(name) {
                    debug!("Using {name}={value}");
                    result.push_str(&value);
                }
            }
            _ => {
                result.push_str("${");
                result.push_str(&placeholder);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

/// Splits a `NAME=VALUE` command-line assignment. A leading `CONFIG_`
/// style prefix is stripped from the name when `prefix` is given.
pub fn split_assignment<'a>(arg: &'a str, prefix: Option<&str>) -> Option<(&'a str, &'a str)> {
    let (name, value) = arg.split_once('=')?;
    let name = prefix
        .and_then(|p| name.strip_prefix(p))
        .unwrap_or(name);
    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_placeholders() {
        unsafe {
            env::set_var("KCONFTOOL_TEST_HOME", "/home/test");
            env::set_var("KCONFTOOL_TEST_EMPTY", "");
        }
        let ws = Path::new("/ws");

        assert_eq!(
            replace_placeholders("${env:KCONFTOOL_TEST_HOME}/bin", ws),
            "/home/test/bin"
        );
        assert_eq!(replace_placeholders("${env:KCONFTOOL_TEST_EMPTY}", ws), "");
        assert_eq!(replace_placeholders("${env:KCONFTOOL_TEST_UNSET}", ws), "");
        assert_eq!(
            replace_placeholders("${workspaceFolder}/Kconfig", ws),
            "/ws/Kconfig"
        );
    }

    #[test]
    fn test_malformed_placeholders_are_kept() {
        let ws = Path::new("/ws");
        assert_eq!(replace_placeholders("${", ws), "${");
        assert_eq!(replace_placeholders("${env:VAR", ws), "${env:VAR");
        assert_eq!(replace_placeholders("${other}", ws), "${other}");
        assert_eq!(replace_placeholders("$$ and {x}", ws), "$$ and {x}");
        assert_eq!(replace_placeholders("${a{b}c}", ws), "${a{b}c}");
    }

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("FOO=y", None), Some(("FOO", "y")));
        assert_eq!(
            split_assignment("CONFIG_FOO=\"a=b\"", Some("CONFIG_")),
            Some(("FOO", "\"a=b\""))
        );
        assert_eq!(split_assignment("FOO", None), None);
    }
}
