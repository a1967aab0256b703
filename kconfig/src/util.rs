//! String and number helpers shared by the parser, evaluator and `.config`
//! code.

/// Escapes `"` and `\` with a backslash.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Removes the backslash in front of any escaped character.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses an integer in `base` (10 or 16), or with prefix detection when
/// `base` is 0.
///
/// Surrounding whitespace and a sign are accepted. Base 16 tolerates a `0x`
/// prefix. Base 0 recognizes `0x`, `0o` and `0b` and rejects decimal numbers
/// with leading zeros.
pub fn parse_int(s: &str, base: u32) -> Option<i64> {
    let s = s.trim();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = digits.to_ascii_lowercase();
    let (radix, body) = match base {
        16 => (16, lower.strip_prefix("0x").unwrap_or(&lower)),
        0 => {
            if let Some(rest) = lower.strip_prefix("0x") {
                (16, rest)
            } else if let Some(rest) = lower.strip_prefix("0o") {
                (8, rest)
            } else if let Some(rest) = lower.strip_prefix("0b") {
                (2, rest)
            } else {
                if lower.len() > 1 && lower.starts_with('0') && lower.bytes().any(|b| b != b'0') {
                    return None;
                }
                (10, lower.as_str())
            }
        }
        _ => (base, lower.as_str()),
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let v = i64::from_str_radix(body, radix).ok()?;
    Some(if neg { -v } else { v })
}

/// True if `s` parses as an integer in `base`.
pub fn is_base_n(s: &str, base: u32) -> bool {
    parse_int(s, base).is_some()
}

/// Formats like Python's `hex()`: `0x1f`, `-0x1f`.
pub fn to_hex(v: i64) -> String {
    if v < 0 {
        format!("-0x{:x}", v.unsigned_abs())
    } else {
        format!("0x{v:x}")
    }
}

/// Expands tabs to the next multiple of eight columns.
pub fn expand_tabs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            let pad = 8 - col % 8;
            out.extend(std::iter::repeat_n(' ', pad));
            col += pad;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

/// Removes duplicates, keeping the first occurrence.
pub fn ordered_unique<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip() {
        let raw = r#"a "quoted" \path\"#;
        let esc = escape(raw);
        assert_eq!(esc, r#"a \"quoted\" \\path\\"#);
        assert_eq!(unescape(&esc), raw);
    }

    #[test]
    fn test_unescape_any_char() {
        assert_eq!(unescape(r"\a\b"), "ab");
        assert_eq!(unescape(r"trailing\"), "trailing");
    }

    #[test]
    fn test_parse_int_bases() {
        assert_eq!(parse_int("42", 10), Some(42));
        assert_eq!(parse_int("-7", 10), Some(-7));
        assert_eq!(parse_int("0x1F", 16), Some(31));
        assert_eq!(parse_int("ff", 16), Some(255));
        assert_eq!(parse_int("0x10", 10), None);
        assert_eq!(parse_int("", 10), None);
        assert_eq!(parse_int(" 12 ", 10), Some(12));
    }

    #[test]
    fn test_parse_int_base0() {
        assert_eq!(parse_int("0x10", 0), Some(16));
        assert_eq!(parse_int("0b101", 0), Some(5));
        assert_eq!(parse_int("0", 0), Some(0));
        assert_eq!(parse_int("000", 0), Some(0));
        assert_eq!(parse_int("010", 0), None);
        assert_eq!(parse_int("foo", 0), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(16), "0x10");
        assert_eq!(to_hex(-16), "-0x10");
        assert_eq!(to_hex(0), "0x0");
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx"), "        x");
        assert_eq!(expand_tabs("ab\tc"), "ab      c");
    }
}
