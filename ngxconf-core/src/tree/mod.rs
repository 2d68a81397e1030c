//! Configuration tree
//!
//! Nodes are plain owned values: a tree owns its children outright and
//! nothing points back up. Depth is bookkeeping for indentation and is
//! refreshed every time a subtree is attached through [`Parent::add`].

mod conf;
mod parent;
mod projection;
mod types;

pub use conf::Conf;
pub use parent::Parent;
pub use types::{Container, ContainerKind, Key, Node, NodeId, NodeKind};
