//! Tokenizer: lexemes to structural tokens
//!
//! At every position the following patterns are tried in this fixed
//! order, each allowed to start after any amount of whitespace:
//!
//! 1. `server {`
//! 2. `location <value> {`
//! 3. `upstream <value> {`
//! 4. `}`
//! 5. `name value... ;`
//! 6. `name ;`
//!
//! Block keywords only count as whole words, and an opener needs a `{`
//! before any `;`, so `upstream_ip;` or `server 10.0.0.1:80;` are plain
//! directives. Names and values are built from tokens that are either
//! double-quoted, single-quoted or bare (a run without whitespace or `;`).
//! Quotes are kept in the resulting text.
//!
//! When nothing matches, tokenizing stops; the unconsumed offset is kept
//! for callers that want to report it.

use crate::parser::lexer::{lex, Lexeme, SourceSpan, Spanned};
use std::fmt;

/// Structural tokens fed to the tree builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenServer,
    OpenLocation(String),
    OpenUpstream(String),
    Close,
    Directive { name: String, value: String },
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenServer => write!(f, "server {{"),
            Token::OpenLocation(v) => write!(f, "location {} {{", v),
            Token::OpenUpstream(v) => write!(f, "upstream {} {{", v),
            Token::Close => write!(f, "}}"),
            Token::Directive { name, value } if value.is_empty() => write!(f, "{};", name),
            Token::Directive { name, value } => write!(f, "{} {};", name, value),
        }
    }
}

/// A successful pattern match: the token and the lexeme index after it
type Match = (Spanned<Token>, usize);

/// Cursor over the lexemes of one source string
pub struct Tokenizer<'s> {
    source: &'s str,
    lexemes: Vec<Spanned<Lexeme>>,
    pos: usize,
    stopped_at: Option<usize>,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            lexemes: lex(source),
            pos: 0,
            stopped_at: None,
        }
    }

    /// Byte offset of input left unconsumed because no pattern matched.
    ///
    /// `None` while tokenizing is in progress, or when only whitespace
    /// remained.
    pub fn remainder(&self) -> Option<usize> {
        self.stopped_at
    }

    // ========================================
    // Patterns
    // ========================================

    fn open_server(&self) -> Option<Match> {
        let start = self.skip_whitespace(self.pos);
        if !self.is_word(start, "server") {
            return None;
        }
        let brace = self.skip_whitespace(start + 1);
        if self.kind(brace) != Some(Lexeme::BlockOpen) {
            return None;
        }
        Some((self.spanned(Token::OpenServer, start, brace), brace + 1))
    }

    /// `keyword <value> {`, value being everything up to the brace
    fn open_block(&self, keyword: &str) -> Option<(String, usize, usize)> {
        let start = self.skip_whitespace(self.pos);
        if !self.is_word(start, keyword) {
            return None;
        }

        let mut i = start + 1;
        loop {
            match self.kind(i)? {
                Lexeme::BlockOpen => break,
                Lexeme::Semicolon => return None,
                _ => i += 1,
            }
        }

        let value = self.source[self.lexemes[start].span.end..self.lexemes[i].span.start].trim();
        Some((value.to_string(), start, i))
    }

    fn open_location(&self) -> Option<Match> {
        let (value, start, brace) = self.open_block("location")?;
        Some((self.spanned(Token::OpenLocation(value), start, brace), brace + 1))
    }

    fn open_upstream(&self) -> Option<Match> {
        let (value, start, brace) = self.open_block("upstream")?;
        Some((self.spanned(Token::OpenUpstream(value), start, brace), brace + 1))
    }

    fn close(&self) -> Option<Match> {
        let start = self.skip_whitespace(self.pos);
        if self.kind(start) != Some(Lexeme::BlockClose) {
            return None;
        }
        Some((self.spanned(Token::Close, start, start), start + 1))
    }

    /// `name value... ;` with at least one value token
    fn directive(&self) -> Option<Match> {
        self.directive_with(true).or_else(|| self.directive_with(false))
    }

    /// With `quotes` off, quote characters are ordinary text. That second
    /// pass only matters when a quote opened early is never closed before
    /// the end of input.
    fn directive_with(&self, quotes: bool) -> Option<Match> {
        let start = self.skip_whitespace(self.pos);
        let name_end = self.read_token(start, quotes)?;

        let value_start = self.skip_whitespace(name_end);
        let mut i = value_start;
        let mut value_end = value_start;
        loop {
            let next = self.skip_whitespace(i);
            match self.kind(next)? {
                Lexeme::Semicolon => {
                    i = next;
                    break;
                }
                _ => {
                    i = self.read_token(next, quotes)?;
                    value_end = i;
                }
            }
        }
        if value_end == value_start {
            return None;
        }

        let token = Token::Directive {
            name: self.text(start, name_end).to_string(),
            value: self.text(value_start, value_end).trim().to_string(),
        };
        Some((self.spanned(token, start, i), i + 1))
    }

    /// `name ;`
    fn flag(&self) -> Option<Match> {
        let start = self.skip_whitespace(self.pos);
        let name_end = self.read_token(start, true)?;
        let semi = self.skip_whitespace(name_end);
        if self.kind(semi) != Some(Lexeme::Semicolon) {
            return None;
        }
        let token = Token::Directive {
            name: self.text(start, name_end).to_string(),
            value: String::new(),
        };
        Some((self.spanned(token, start, semi), semi + 1))
    }

    // ========================================
    // Lexeme utilities
    // ========================================

    /// Read one name/value token starting at lexeme `i`; returns the index
    /// after it, or `None` if `i` does not start a token.
    fn read_token(&self, i: usize, quotes: bool) -> Option<usize> {
        let first = self.kind(i)?;
        if matches!(first, Lexeme::Whitespace | Lexeme::Semicolon) {
            return None;
        }
        if quotes && first.is_quote() {
            let closing = (i + 1..self.lexemes.len()).find(|&j| self.lexemes[j].value == first);
            if let Some(closing) = closing {
                return Some(closing + 1);
            }
        }

        let mut end = i + 1;
        while let Some(kind) = self.kind(end) {
            if matches!(kind, Lexeme::Whitespace | Lexeme::Semicolon) {
                break;
            }
            end += 1;
        }
        Some(end)
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        while self.kind(i) == Some(Lexeme::Whitespace) {
            i += 1;
        }
        i
    }

    fn kind(&self, i: usize) -> Option<Lexeme> {
        self.lexemes.get(i).map(|s| s.value)
    }

    fn is_word(&self, i: usize, word: &str) -> bool {
        self.kind(i) == Some(Lexeme::Word) && self.text(i, i + 1) == word
    }

    /// Source text covered by lexemes `from..to`
    fn text(&self, from: usize, to: usize) -> &'s str {
        if from >= to {
            return "";
        }
        &self.source[self.lexemes[from].span.start..self.lexemes[to - 1].span.end]
    }

    /// Wrap a token with the span of lexemes `first..=last`
    fn spanned(&self, token: Token, first: usize, last: usize) -> Spanned<Token> {
        let span = SourceSpan {
            start: self.lexemes[first].span.start,
            end: self.lexemes[last].span.end,
        };
        Spanned::new(token, span)
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Spanned<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.lexemes.len() {
                return None;
            }

            let found = self
                .open_server()
                .or_else(|| self.open_location())
                .or_else(|| self.open_upstream())
                .or_else(|| self.close())
                .or_else(|| self.directive())
                .or_else(|| self.flag());

            if let Some((token, next)) = found {
                tracing::trace!(offset = token.span.start, token = %token.value, "token");
                self.pos = next;
                return Some(token);
            }

            let at = self.skip_whitespace(self.pos);
            match self.kind(at) {
                // A `;` with nothing in front of it carries no directive.
                Some(Lexeme::Semicolon) => {
                    tracing::warn!(offset = self.lexemes[at].span.start, "dropping stray ';'");
                    self.pos = at + 1;
                }
                Some(_) => {
                    self.stopped_at = Some(self.lexemes[at].span.start);
                    self.pos = self.lexemes.len();
                    return None;
                }
                None => {
                    self.pos = self.lexemes.len();
                    return None;
                }
            }
        }
    }
}

/// Tokenize a whole source string
pub fn tokenize(source: &str) -> Vec<Spanned<Token>> {
    Tokenizer::new(source).collect()
}
