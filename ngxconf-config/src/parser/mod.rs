//! Parser module for nginx configuration text
//!
//! Three stages: the lexer splits text into lexemes, the tokenizer matches
//! block openers, closers and directives, and the parser builds the tree.

pub mod lexer;
pub mod parser;
pub mod tokenizer;

pub use lexer::{lex, Lexeme, SourceSpan, Spanned};
pub use parser::{parse, parse_items, parse_strict, ParseError, ParseResult, Parser};
pub use tokenizer::{tokenize, Token, Tokenizer};
