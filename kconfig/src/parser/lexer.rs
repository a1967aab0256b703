//! Splits one macro-expanded logical line into tokens.

use crate::expr::RelOp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Keyword, symbol name or unquoted number.
    Word(String),
    /// Quoted string with escapes removed.
    Str(String),
    And,
    Or,
    Not,
    Rel(RelOp),
    LParen,
    RParen,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | '.' | '-')
}

/// Tokenizes `line`. A `#` outside a string starts a comment.
pub(crate) fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            break;
        }

        if is_word_char(c) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err("unterminated string".to_string()),
                    Some('\\') => {
                        if let Some(next) = chars.get(i + 1) {
                            s.push(*next);
                        }
                        i += 2;
                    }
                    Some(ch) if *ch == quote => {
                        i += 1;
                        break;
                    }
                    Some(ch) => {
                        s.push(*ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(s));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (tok, len) = match (c, next) {
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('!', Some('=')) => (Token::Rel(RelOp::Unequal), 2),
            ('!', _) => (Token::Not, 1),
            ('=', _) => (Token::Rel(RelOp::Equal), 1),
            ('<', Some('=')) => (Token::Rel(RelOp::LessEqual), 2),
            ('<', _) => (Token::Rel(RelOp::Less), 1),
            ('>', Some('=')) => (Token::Rel(RelOp::GreaterEqual), 2),
            ('>', _) => (Token::Rel(RelOp::Greater), 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            _ => return Err(format!("unknown token at '{}'", chars[i..].iter().collect::<String>())),
        };
        tokens.push(tok);
        i += len;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_expression_tokens() {
        let toks = tokenize("depends on A && !(B || C=\"x y\") # trailing").unwrap();
        assert_eq!(
            toks,
            vec![
                w("depends"),
                w("on"),
                w("A"),
                Token::And,
                Token::Not,
                Token::LParen,
                w("B"),
                Token::Or,
                w("C"),
                Token::Rel(RelOp::Equal),
                Token::Str("x y".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_relations_and_numbers() {
        let toks = tokenize("range 0x10 256 if A>=B").unwrap();
        assert_eq!(toks[1], w("0x10"));
        assert_eq!(toks[2], w("256"));
        assert_eq!(toks[5], Token::Rel(RelOp::GreaterEqual));
        assert_eq!(tokenize("---help---").unwrap(), vec![w("---help---")]);
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokenize(r#"prompt "say \"hi\" \\ there""#).unwrap();
        assert_eq!(toks[1], Token::Str(r#"say "hi" \ there"#.to_string()));
        assert!(tokenize("prompt \"open").is_err());
        assert!(tokenize("config A @").is_err());
    }
}
