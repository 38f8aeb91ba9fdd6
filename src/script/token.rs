//! Tokenizer for handler scripts.

use super::ScriptError;

/// A single token together with the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

/// Token kinds of the handler script language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Fn,
    Let,
    If,
    Else,
    Loop,
    Break,
    Send,
    Fail,
    Recv,
    True,
    False,
    NoneLit,
    // Literals and names
    Ident(String),
    Int(i64),
    Str(String),
    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Assign,
    EqEq,
    NotEq,
    Plus,
    Minus,
    Star,
    Slash,
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "fn" => TokenKind::Fn,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "loop" => TokenKind::Loop,
        "break" => TokenKind::Break,
        "send" => TokenKind::Send,
        "fail" => TokenKind::Fail,
        "recv" => TokenKind::Recv,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "none" => TokenKind::NoneLit,
        _ => return None,
    };
    Some(kind)
}

fn parse_error(line: u32, message: impl Into<String>) -> ScriptError {
    ScriptError::Parse {
        line,
        message: message.into(),
    }
}

/// Split script text into tokens.
///
/// `#` starts a comment running to the end of the line. String literals
/// support the escapes `\"`, `\\`, `\n` and `\t` and may not contain a raw
/// newline.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        let start = line;
        let kind = match c {
            '\n' => {
                line += 1;
                chars.next();
                continue;
            }
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
                continue;
            }
            '{' => {
                chars.next();
                TokenKind::LBrace
            }
            '}' => {
                chars.next();
                TokenKind::RBrace
            }
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '+' => {
                chars.next();
                TokenKind::Plus
            }
            '-' => {
                chars.next();
                TokenKind::Minus
            }
            '*' => {
                chars.next();
                TokenKind::Star
            }
            '/' => {
                chars.next();
                TokenKind::Slash
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::NotEq
                } else {
                    return Err(parse_error(start, "expected `=` after `!`"));
                }
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('"') => value.push('"'),
                            Some('\\') => value.push('\\'),
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(other) => {
                                return Err(parse_error(
                                    start,
                                    format!("unknown escape `\\{other}`"),
                                ));
                            }
                            None => {
                                return Err(parse_error(start, "unterminated string literal"));
                            }
                        },
                        Some('\n') | None => {
                            return Err(parse_error(start, "unterminated string literal"));
                        }
                        Some(other) => value.push(other),
                    }
                }
                TokenKind::Str(value)
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    digits.push(c);
                    chars.next();
                }
                let value = digits.parse::<i64>().map_err(|_| {
                    parse_error(start, format!("integer literal out of range: {digits}"))
                })?;
                TokenKind::Int(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphanumeric() && c != '_' {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                keyword(&ident).unwrap_or(TokenKind::Ident(ident))
            }
            other => {
                return Err(parse_error(start, format!("unexpected character `{other}`")));
            }
        };
        tokens.push(Token { kind, line: start });
    }

    Ok(tokens)
}
