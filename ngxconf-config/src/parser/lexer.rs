//! Lexer for nginx configuration text
//!
//! Splits the source into a flat stream of lexemes that covers every byte:
//! - whitespace runs
//! - `;`, `{`, `}`
//! - single `"` and `'` characters (quoting is resolved by the tokenizer)
//! - words: everything else
//!
//! No comment syntax is recognised; `#` is part of a word.

use logos::Logos;
use std::fmt;

/// Byte range in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl From<logos::Span> for SourceSpan {
    fn from(span: logos::Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

impl From<SourceSpan> for std::ops::Range<usize> {
    fn from(span: SourceSpan) -> Self {
        span.start..span.end
    }
}

/// A value with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: SourceSpan,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<SourceSpan>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Lexeme kinds
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    #[regex(r"\s+")]
    Whitespace,

    #[token(";")]
    Semicolon,

    #[token("{")]
    BlockOpen,

    #[token("}")]
    BlockClose,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    /// Any run of characters that is none of the above
    #[regex(r#"[^\s;{}"']+"#)]
    Word,
}

impl Lexeme {
    pub fn is_quote(self) -> bool {
        matches!(self, Lexeme::DoubleQuote | Lexeme::SingleQuote)
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Whitespace => write!(f, "whitespace"),
            Lexeme::Semicolon => write!(f, ";"),
            Lexeme::BlockOpen => write!(f, "{{"),
            Lexeme::BlockClose => write!(f, "}}"),
            Lexeme::DoubleQuote => write!(f, "\""),
            Lexeme::SingleQuote => write!(f, "'"),
            Lexeme::Word => write!(f, "word"),
        }
    }
}

/// Split a source string into lexemes
pub fn lex(source: &str) -> Vec<Spanned<Lexeme>> {
    Lexeme::lexer(source)
        .spanned()
        .map(|(result, span)| {
            // The word class is the complement of all other classes, so a
            // rejected slice can only be ordinary text.
            let lexeme = result.unwrap_or(Lexeme::Word);
            Spanned::new(lexeme, span)
        })
        .collect()
}
