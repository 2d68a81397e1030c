//! Root aggregate of a configuration tree

use super::{Container, Node, Parent};
use crate::error::{Error, Result};

/// A whole configuration file: an ordered list of top-level nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conf {
    pub(crate) children: Vec<Node>,
}

impl Conf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `add`
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.add(children);
        self
    }

    /// The first `server` block.
    ///
    /// Fails with [`Error::NoServer`] when the tree has none.
    pub fn server(&self) -> Result<&Container> {
        self.servers().into_iter().next().ok_or(Error::NoServer)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<Vec<Node>> for Conf {
    fn from(children: Vec<Node>) -> Self {
        Conf::new().with_children(children)
    }
}
