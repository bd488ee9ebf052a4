use tracing::{instrument, trace};

use crate::{CompileError, CompileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Return,
    If,
    Else,
    While,
    For,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    Ampersand,
    Comma,
    Eq,
    EqEq,
    Gt,
    Gte,
    LeftBrace,
    LeftParen,
    Lt,
    Lte,
    Minus,
    Ne,
    Plus,
    RightBrace,
    RightParen,
    Semicolon,
    Slash,
    Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Type(TokenType),
    Punct(Punct),
    Number(i64),
    Ident,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// A lexical unit. `text` borrows the slice of source it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub loc: SourceLocation,
}

// Tried in order; a word only matches when no identifier character follows it.
const RESERVED_WORDS: [(&str, TokenKind); 6] = [
    ("return", TokenKind::Keyword(Keyword::Return)),
    ("if", TokenKind::Keyword(Keyword::If)),
    ("else", TokenKind::Keyword(Keyword::Else)),
    ("while", TokenKind::Keyword(Keyword::While)),
    ("for", TokenKind::Keyword(Keyword::For)),
    ("int", TokenKind::Type(TokenType::Int)),
];

const TWO_CHAR_PUNCTS: [(&str, Punct); 4] = [
    ("==", Punct::EqEq),
    ("!=", Punct::Ne),
    ("<=", Punct::Lte),
    (">=", Punct::Gte),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Tokenizer<'src> {
    pub source: &'src str,
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

pub fn tokenize(source: &str) -> CompileResult<Vec<Token<'_>>> {
    Tokenizer::new(source).tokenize()
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    #[instrument(skip_all)]
    pub fn tokenize(&mut self) -> CompileResult<Vec<Token<'src>>> {
        let mut tokens = vec![];
        while let Some(c) = self.peek() {
            if is_space(c) {
                self.advance_n(1);
                continue;
            }
            if let Some(token) = self.two_char_punct() {
                tokens.push(token);
                continue;
            }
            if let Some(token) = self.reserved_word() {
                tokens.push(token);
                continue;
            }
            let token = match (c, punct_kind(c)) {
                (b'a'..=b'z', _) => self.ident(),
                (_, Some(punct)) => self.token(TokenKind::Punct(punct), 1),
                (b'0'..=b'9', _) => self.number()?,
                _ => {
                    let ch = self.source[self.index..].chars().next().unwrap_or('\0');
                    return Err(CompileError::UnexpectedChar {
                        ch,
                        loc: self.location(),
                    });
                }
            };
            tokens.push(token);
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: &self.source[self.index..],
            loc: self.location(),
        });
        trace!(count = tokens.len(), "tokenized");
        Ok(tokens)
    }

    fn two_char_punct(&mut self) -> Option<Token<'src>> {
        let rest = &self.source[self.index..];
        let (op, punct) = TWO_CHAR_PUNCTS
            .iter()
            .find(|(op, _)| rest.starts_with(op))?;
        Some(self.token(TokenKind::Punct(*punct), op.len()))
    }

    fn reserved_word(&mut self) -> Option<Token<'src>> {
        let rest = &self.source[self.index..];
        let (word, kind) = RESERVED_WORDS.iter().find(|(word, _)| {
            rest.starts_with(word)
                && !rest
                    .as_bytes()
                    .get(word.len())
                    .is_some_and(|&c| is_ident_char(c))
        })?;
        Some(self.token(*kind, word.len()))
    }

    fn ident(&mut self) -> Token<'src> {
        let len = self.source.as_bytes()[self.index..]
            .iter()
            .take_while(|&&c| is_ident_char(c))
            .count();
        self.token(TokenKind::Ident, len)
    }

    fn number(&mut self) -> CompileResult<Token<'src>> {
        let len = self.source.as_bytes()[self.index..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        let text = &self.source[self.index..self.index + len];
        let value = text.parse::<i64>().map_err(|_| CompileError::InvalidNumber {
            text: text.to_string(),
            loc: self.location(),
        })?;
        Ok(self.token(TokenKind::Number(value), len))
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'src> {
        let token = Token {
            kind,
            text: &self.source[self.index..self.index + len],
            loc: self.location(),
        };
        self.advance_n(len);
        token
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            offset: self.index,
            line: self.line,
            column: self.column,
        }
    }

    fn advance_n(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.peek() == Some(b'\n') {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.index += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.index).copied()
    }
}

// C `isspace`: ASCII whitespace plus vertical tab.
fn is_space(c: u8) -> bool {
    c.is_ascii_whitespace() || c == b'\x0b'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn punct_kind(c: u8) -> Option<Punct> {
    let punct = match c {
        b'+' => Punct::Plus,
        b'-' => Punct::Minus,
        b'*' => Punct::Star,
        b'/' => Punct::Slash,
        b'(' => Punct::LeftParen,
        b')' => Punct::RightParen,
        b'<' => Punct::Lt,
        b'>' => Punct::Gt,
        b'=' => Punct::Eq,
        b';' => Punct::Semicolon,
        b'{' => Punct::LeftBrace,
        b'}' => Punct::RightBrace,
        b',' => Punct::Comma,
        b'&' => Punct::Ampersand,
        _ => return None,
    };
    Some(punct)
}
