//! Tree builder
//!
//! Consumes the token stream with a stack of open blocks (frames). A
//! closing brace pops the innermost frame and attaches it to the frame
//! below, or to the top level when the stack is empty.
//!
//! Best-effort mode never fails: an excess `}` is ignored, unparsable
//! trailing text is dropped, and blocks still open at the end of input are
//! closed as if their braces were there. Strict mode reports each of those
//! as a [`ParseError`] carrying a byte offset.

use crate::parser::tokenizer::{Token, Tokenizer};
use ngxconf_core::{Conf, Container, Key, Node, Parent};
use thiserror::Error;

/// Parser error types (strict mode)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected '}}' at position {position}: no block is open")]
    UnexpectedCloser { position: usize },

    #[error("Unclosed '{name}' block opened at position {position}")]
    UnclosedBlock { name: String, position: usize },

    #[error("Unparsable input at position {position}")]
    TrailingInput { position: usize },
}

impl ParseError {
    /// Byte offset the error points at
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedCloser { position }
            | ParseError::UnclosedBlock { position, .. }
            | ParseError::TrailingInput { position } => *position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A block seen opened but not yet closed
struct Frame {
    container: Container,
    position: usize,
}

/// Parser state
pub struct Parser<'s> {
    tokens: Tokenizer<'s>,
    strict: bool,
    stack: Vec<Frame>,
    top: Vec<Node>,
}

impl<'s> Parser<'s> {
    /// Create a best-effort parser over a source string
    pub fn new(source: &'s str) -> Self {
        Self {
            tokens: Tokenizer::new(source),
            strict: false,
            stack: Vec::new(),
            top: Vec::new(),
        }
    }

    /// Report malformed input instead of repairing it
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse into the list of top-level nodes
    pub fn parse(mut self) -> ParseResult<Vec<Node>> {
        while let Some(token) = self.tokens.next() {
            let position = token.span.start;
            match token.value {
                Token::OpenServer => self.open(Container::server(), position),
                Token::OpenLocation(value) => self.open(Container::location(value), position),
                Token::OpenUpstream(value) => self.open(Container::upstream(value), position),
                Token::Close => self.close(position)?,
                Token::Directive { name, value } => self.attach(Key::new(name, value).into()),
            }
        }

        if let Some(position) = self.tokens.remainder() {
            if self.strict {
                return Err(ParseError::TrailingInput { position });
            }
            tracing::warn!(position, "stopped at unparsable input; the rest is ignored");
        }

        while let Some(frame) = self.stack.pop() {
            if self.strict {
                return Err(ParseError::UnclosedBlock {
                    name: frame.container.name().to_string(),
                    position: frame.position,
                });
            }
            tracing::warn!(
                block = frame.container.name(),
                position = frame.position,
                "closing block left open at end of input"
            );
            self.attach(frame.container.into());
        }

        tracing::debug!(nodes = self.top.len(), "parsed configuration");
        Ok(self.top)
    }

    // ========================================
    // Frame stack
    // ========================================

    fn open(&mut self, container: Container, position: usize) {
        self.stack.push(Frame {
            container,
            position,
        });
    }

    fn close(&mut self, position: usize) -> ParseResult<()> {
        match self.stack.pop() {
            Some(frame) => {
                self.attach(frame.container.into());
                Ok(())
            }
            None if self.strict => Err(ParseError::UnexpectedCloser { position }),
            None => {
                tracing::warn!(position, "ignoring '}}' with no open block");
                Ok(())
            }
        }
    }

    /// Attach to the innermost open frame, or to the top level
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => {
                frame.container.add([node]);
            }
            None => self.top.push(node),
        }
    }
}

/// Parse a source string into a [`Conf`], repairing malformed input
pub fn parse(source: &str) -> Conf {
    Conf::from(parse_items(source))
}

/// Parse a source string into its top-level nodes, repairing malformed input
pub fn parse_items(source: &str) -> Vec<Node> {
    // Best-effort parsing has no failure path.
    Parser::new(source).parse().unwrap_or_default()
}

/// Parse a source string into a [`Conf`], rejecting malformed input
pub fn parse_strict(source: &str) -> ParseResult<Conf> {
    Parser::new(source).strict(true).parse().map(Conf::from)
}
