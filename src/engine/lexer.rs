//! Clause splitting and tokenization.
//!
//! The DSL grammar is flat on purpose. An assertion is a list of clauses
//! joined by the standalone word `AND`; each clause is a short sequence of
//! identifiers, literals and punctuation:
//!
//! ```text
//! w = Widget(resource_id="btn_ok", clickable=true)
//! ^ ^ ^     ^^          ^        ^ ^        ^   ^
//! Ident Eq Ident LParen Ident Eq Str Comma ... RParen
//! ```
//!
//! Every token remembers its byte offset into the *whole* assertion text so
//! that errors can point at the rejected character. Brackets and braces are
//! rejected here; a nested `(` is rejected by the parser, which knows whether
//! it is already inside a call.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LParen,
    RParen,
    Comma,
    Eq,
    Dot,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Str(_) => "a string".to_string(),
            TokenKind::Int(_) | TokenKind::Float(_) => "a number".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// A clause slice and its byte offset in the assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClauseText<'a> {
    pub text: &'a str,
    pub offset: usize,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split on the word `AND` outside string literals. Clause texts are trimmed.
pub(crate) fn split_clauses(input: &str) -> Result<Vec<ClauseText<'_>>, ParseError> {
    let bytes = input.as_bytes();
    let mut clauses = Vec::new();
    let mut start = 0;
    // Quote byte and the offset it was opened at.
    let mut quote: Option<(u8, usize)> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some((q, _)) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some((b, i)),
            None if bytes[i..].starts_with(b"AND") => {
                let before_ok = i == 0 || !is_ident_byte(bytes[i - 1]);
                let after_ok = i + 3 >= bytes.len() || !is_ident_byte(bytes[i + 3]);
                if before_ok && after_ok {
                    clauses.push(trimmed(input, start, i)?);
                    start = i + 3;
                    i += 3;
                    continue;
                }
            }
            None => {}
        }
        i += 1;
    }
    if let Some((_, opened)) = quote {
        return Err(ParseError::new(input[start..].trim(), opened, "unterminated string literal"));
    }
    clauses.push(trimmed(input, start, bytes.len())?);
    Ok(clauses)
}

fn trimmed(input: &str, start: usize, end: usize) -> Result<ClauseText<'_>, ParseError> {
    let raw = &input[start..end];
    let text = raw.trim();
    if text.is_empty() {
        let reason = if input.trim().is_empty() { "empty assertion" } else { "empty clause around `AND`" };
        return Err(ParseError::new(text, start, reason));
    }
    let leading = raw.len() - raw.trim_start().len();
    Ok(ClauseText { text, offset: start + leading })
}

/// Tokenize one clause.
pub(crate) fn tokenize(clause: ClauseText<'_>) -> Result<Vec<Token>, ParseError> {
    let text = clause.text;
    let bytes = text.as_bytes();
    let err = |at: usize, reason: String| ParseError::new(text, clause.offset + at, reason);
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let offset = clause.offset + i;
        let single = match b {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b',' => Some(TokenKind::Comma),
            b'=' => Some(TokenKind::Eq),
            b'.' => Some(TokenKind::Dot),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token { kind, offset });
            i += 1;
            continue;
        }

        match b {
            _ if b.is_ascii_whitespace() => i += 1,
            b'[' | b']' | b'{' | b'}' => {
                return Err(err(i, format!("nested structures are not supported (found `{}`)", b as char)));
            }
            b'"' | b'\'' => {
                let (value, next) = lex_string(text, i).map_err(|(at, reason)| err(at, reason))?;
                tokens.push(Token { kind: TokenKind::Str(value), offset });
                i = next;
            }
            b'-' | b'0'..=b'9' => {
                let (kind, next) = lex_number(text, i).map_err(|(at, reason)| err(at, reason))?;
                tokens.push(Token { kind, offset });
                i = next;
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                let end = bytes[i..].iter().position(|&c| !is_ident_byte(c)).map_or(bytes.len(), |p| i + p);
                tokens.push(Token { kind: TokenKind::Ident(text[i..end].to_string()), offset });
                i = end;
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or('?');
                return Err(err(i, format!("unexpected character `{ch}`")));
            }
        }
    }
    Ok(tokens)
}

/// Returns the unescaped value and the index after the closing quote.
fn lex_string(text: &str, start: usize) -> Result<(String, usize), (usize, String)> {
    let quote = text.as_bytes()[start] as char;
    let mut value = String::new();
    let mut chars = text[start + 1..].char_indices();

    while let Some((rel, c)) = chars.next() {
        let at = start + 1 + rel;
        match c {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err((at, "unterminated string literal".to_string()));
                };
                value.push(match escaped {
                    '"' => '"',
                    '\'' => '\'',
                    '\\' => '\\',
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => return Err((at, format!("unknown escape `\\{other}`"))),
                });
            }
            c if c == quote => return Ok((value, at + 1)),
            c => value.push(c),
        }
    }
    Err((start, "unterminated string literal".to_string()))
}

fn lex_number(text: &str, start: usize) -> Result<(TokenKind, usize), (usize, String)> {
    let re = regex!(r"^-?\d+(\.\d+)?");
    let Some(m) = re.find(&text[start..]) else {
        return Err((start, "expected a number after `-`".to_string()));
    };
    let end = start + m.end();
    if text.as_bytes().get(end).is_some_and(|&b| is_ident_byte(b) || b == b'.') {
        return Err((end, format!("malformed number `{}`", &text[start..=end])));
    }
    let literal = m.as_str();
    let kind = if m.as_str().contains('.') {
        let value = literal.parse::<f64>().ok().filter(|x| x.is_finite());
        TokenKind::Float(value.ok_or_else(|| (start, format!("number `{literal}` is out of range")))?)
    } else {
        TokenKind::Int(literal.parse().map_err(|_| (start, format!("integer `{literal}` is out of range")))?)
    };
    Ok((kind, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(ClauseText { text, offset: 0 }).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<&str> {
        split_clauses(input).unwrap().into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn splits_on_standalone_and() {
        assert_eq!(texts("s = Screen() AND keyboard_on(s)"), vec!["s = Screen()", "keyboard_on(s)"]);
        // Inside a literal, or as part of a word, AND does not split.
        assert_eq!(texts(r#"log_contains(d, "A AND B") AND ANDROID(x)"#), vec![
            r#"log_contains(d, "A AND B")"#,
            "ANDROID(x)"
        ]);
        assert_eq!(texts("f(BAND) AND g(x)"), vec!["f(BAND)", "g(x)"]);
    }

    #[test]
    fn clause_offsets_point_into_the_input() {
        let clauses = split_clauses("  s = Screen()   AND  keyboard_on(s)").unwrap();
        assert_eq!(clauses[0].offset, 2);
        assert_eq!(clauses[1].offset, 22);
        assert_eq!(clauses[1].text, "keyboard_on(s)");
    }

    #[test]
    fn empty_clauses_are_rejected() {
        assert_eq!(split_clauses("   ").unwrap_err().reason, "empty assertion");
        assert_eq!(split_clauses("s = Screen() AND ").unwrap_err().reason, "empty clause around `AND`");
        assert_eq!(split_clauses("x(\"open").unwrap_err().reason, "unterminated string literal");
    }

    #[test]
    fn tokenizes_calls_and_literals() {
        assert_eq!(kinds(r#"w = Widget(text='It\'s', n=-3, t=0.75)"#), vec![
            TokenKind::Ident("w".into()),
            TokenKind::Eq,
            TokenKind::Ident("Widget".into()),
            TokenKind::LParen,
            TokenKind::Ident("text".into()),
            TokenKind::Eq,
            TokenKind::Str("It's".into()),
            TokenKind::Comma,
            TokenKind::Ident("n".into()),
            TokenKind::Eq,
            TokenKind::Int(-3),
            TokenKind::Comma,
            TokenKind::Ident("t".into()),
            TokenKind::Eq,
            TokenKind::Float(0.75),
            TokenKind::RParen,
        ]);
        assert_eq!(kinds("less_than(d.volume, 3)"), vec![
            TokenKind::Ident("less_than".into()),
            TokenKind::LParen,
            TokenKind::Ident("d".into()),
            TokenKind::Dot,
            TokenKind::Ident("volume".into()),
            TokenKind::Comma,
            TokenKind::Int(3),
            TokenKind::RParen,
        ]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\"b\\c\nd\te""#), vec![TokenKind::Str("a\"b\\c\nd\te".into())]);
        let err = tokenize(ClauseText { text: r#""bad \q""#, offset: 10 }).unwrap_err();
        assert_eq!(err.reason, "unknown escape `\\q`");
        assert_eq!(err.offset, 15);
    }

    #[test]
    fn nested_structures_report_their_offset() {
        let err = tokenize(ClauseText { text: "w = Widget(text=[1, 2])", offset: 4 }).unwrap_err();
        assert_eq!(err.offset, 20);
        assert!(err.reason.contains("nested structures"));
        assert!(tokenize(ClauseText { text: "x = Screen(a={})", offset: 0 }).is_err());
    }

    #[test]
    fn malformed_numbers() {
        assert!(tokenize(ClauseText { text: "f(3abc)", offset: 0 }).is_err());
        assert!(tokenize(ClauseText { text: "f(1.2.3)", offset: 0 }).is_err());
        assert!(tokenize(ClauseText { text: "f(- 3)", offset: 0 }).is_err());
        assert!(tokenize(ClauseText { text: "f(99999999999999999999)", offset: 0 }).is_err());
    }
}
