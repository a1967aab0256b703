//! Wildcard expansion for `source` paths.
//!
//! Supports `*`, `?` and `[...]` (with `!` or `^` negation) within a single
//! path component. Results are sorted.

use std::{cell::Cell, fs, path::Path};

/// Bound on the work spent matching one name. Patterns like `*a*a*a*b`
/// backtrack polynomially in the name length; past this many calls the name
/// counts as not matching.
const MAX_MATCH_CALLS: usize = 100_000;

pub(crate) fn contains_glob(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// Expands `pattern`, resolving relative paths against `base`.
///
/// The returned paths keep the shape of the pattern: relative patterns give
/// relative paths. Only existing files are returned.
pub(crate) fn expand(base: Option<&Path>, pattern: &str) -> Vec<String> {
    let resolve = |p: &str| match base {
        Some(b) if Path::new(p).is_relative() => b.join(p),
        _ => Path::new(p).to_path_buf(),
    };

    if !contains_glob(pattern) {
        return if resolve(pattern).is_file() {
            vec![pattern.to_string()]
        } else {
            Vec::new()
        };
    }

    let absolute = pattern.starts_with('/');
    let mut candidates = vec![if absolute { "/".to_string() } else { String::new() }];

    for component in pattern.split('/').filter(|c| !c.is_empty()) {
        let mut next = Vec::new();
        for prefix in &candidates {
            if !contains_glob(component) {
                next.push(format!("{prefix}{component}/"));
                continue;
            }
            let dir = if prefix.is_empty() { "." } else { prefix.as_str() };
            let Ok(entries) = fs::read_dir(resolve(dir)) else {
                continue;
            };
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| !name.starts_with('.') || component.starts_with('.'))
                .filter(|name| glob_match(component, name))
                .collect();
            names.sort();
            next.extend(names.into_iter().map(|name| format!("{prefix}{name}/")));
        }
        candidates = next;
    }

    let mut out: Vec<String> = candidates
        .into_iter()
        .map(|c| c.trim_end_matches('/').to_string())
        .filter(|c| resolve(c).is_file())
        .collect();
    out.sort();
    out
}

/// Matches one path component against a pattern.
pub(crate) fn glob_match(pattern: &str, input: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let inp: Vec<char> = input.chars().collect();
    match_from(&pat, 0, &inp, 0, &Cell::new(0))
}

fn match_from(pat: &[char], pi: usize, inp: &[char], ii: usize, calls: &Cell<usize>) -> bool {
    let count = calls.get() + 1;
    calls.set(count);
    if count > MAX_MATCH_CALLS {
        return false;
    }
    if pi == pat.len() {
        return ii == inp.len();
    }
    match pat[pi] {
        '*' => {
            let mut next = pi;
            while next < pat.len() && pat[next] == '*' {
                next += 1;
            }
            if next == pat.len() {
                return true;
            }
            (ii..=inp.len()).any(|k| match_from(pat, next, inp, k, calls))
        }
        '?' => ii < inp.len() && match_from(pat, pi + 1, inp, ii + 1, calls),
        '[' => {
            let Some(&c) = inp.get(ii) else {
                return false;
            };
            match match_class(pat, pi, c) {
                Some((matched, end)) => matched && match_from(pat, end, inp, ii + 1, calls),
                // Unterminated class, treat '[' literally
                None => c == '[' && match_from(pat, pi + 1, inp, ii + 1, calls),
            }
        }
        p => ii < inp.len() && inp[ii] == p && match_from(pat, pi + 1, inp, ii + 1, calls),
    }
}

/// Returns whether `c` is in the class starting at `pat[start] == '['` and
/// the index just past the closing `]`.
fn match_class(pat: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = matches!(pat.get(i), Some('!' | '^'));
    if negate {
        i += 1;
    }
    let mut matched = false;
    let mut first = true;
    while i < pat.len() {
        if pat[i] == ']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;
        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            if pat[i] <= c && c <= pat[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if pat[i] == c {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Kconfig*", "Kconfig.debug"));
        assert!(glob_match("K?onfig", "Kconfig"));
        assert!(glob_match("[a-c]x", "bx"));
        assert!(!glob_match("[!a-c]x", "bx"));
        assert!(!glob_match("*.txt", "Kconfig"));
    }

    #[test]
    #[ntest::timeout(5000)]
    fn test_many_stars_give_up() {
        let pattern = "*a".repeat(20) + "*b";
        let name = "a".repeat(60);
        assert!(!glob_match(&pattern, &name));
        assert!(glob_match(&pattern, &(name + "b")));
    }

    #[test]
    fn test_expand_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["b", "a", "c"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("a/Kconfig"), "").unwrap();
        fs::write(dir.path().join("b/Kconfig"), "").unwrap();

        let found = expand(Some(dir.path()), "*/Kconfig");
        assert_eq!(found, vec!["a/Kconfig".to_string(), "b/Kconfig".to_string()]);

        assert_eq!(expand(Some(dir.path()), "a/Kconfig"), vec!["a/Kconfig"]);
        assert!(expand(Some(dir.path()), "missing/Kconfig").is_empty());
    }
}
