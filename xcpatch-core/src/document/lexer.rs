//! Tokenizer for the OpenStep property-list dialect used by `project.pbxproj`.
//!
//! Comments (`/* ... */` and `// ...`) are skipped. Every token carries its
//! byte span in the source so the parser can hand out insertion offsets.

use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Equals,
    Semicolon,
    Comma,
    /// A quoted or bare string, already unescaped.
    String(String),
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            Self::LBrace => "`{`".into(),
            Self::RBrace => "`}`".into(),
            Self::LParen => "`(`".into(),
            Self::RParen => "`)`".into(),
            Self::Equals => "`=`".into(),
            Self::Semicolon => "`;`".into(),
            Self::Comma => "`,`".into(),
            Self::String(s) => format!("string {:?}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Characters allowed in an unquoted string.
pub fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-' | '+')
}

/// 1-based line number of a byte offset.
pub fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_trivia(&mut self) -> Result<(), DocumentError> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => {
                        return Err(DocumentError::UnterminatedComment {
                            line: line_of(self.text, self.pos),
                        })
                    }
                }
            } else if trimmed.starts_with("//") {
                match trimmed.find('\n') {
                    Some(end) => self.pos += end + 1,
                    None => self.pos = self.text.len(),
                }
            } else {
                return Ok(());
            }
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, DocumentError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        let single = match c {
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '=' => Some(TokenKind::Equals),
            ';' => Some(TokenKind::Semicolon),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            self.pos += 1;
            return Ok(Some(Token {
                kind,
                start,
                end: self.pos,
            }));
        }

        let value = if c == '"' {
            self.quoted()?
        } else if is_bare_char(c) {
            let len = self
                .rest()
                .find(|ch: char| !is_bare_char(ch))
                .unwrap_or(self.rest().len());
            let value = self.rest()[..len].to_string();
            self.pos += len;
            value
        } else {
            return Err(DocumentError::UnexpectedChar {
                line: line_of(self.text, start),
                found: c,
            });
        };

        Ok(Some(Token {
            kind: TokenKind::String(value),
            start,
            end: self.pos,
        }))
    }

    fn quoted(&mut self) -> Result<String, DocumentError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                other => value.push(other),
            }
        }

        Err(DocumentError::UnterminatedString {
            line: line_of(self.text, start),
        })
    }
}
