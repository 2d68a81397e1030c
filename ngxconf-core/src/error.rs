//! Error types for ngxconf

use crate::tree::NodeId;
use thiserror::Error;

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ngxconf
#[derive(Error, Debug)]
pub enum Error {
    /// A node passed to `remove` is not a direct child of the target
    #[error("node {id} is not a child of this container")]
    NotFound { id: NodeId },

    /// First-server accessor used on a tree without servers
    #[error("no server block present (index 0 out of range)")]
    NoServer,
}
