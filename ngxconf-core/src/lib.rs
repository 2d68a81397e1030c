//! ngxconf Core Library
//!
//! This crate provides the in-memory model of an nginx configuration
//! (keys, blocks and the root aggregate) together with the serializer
//! that turns a tree back into configuration text.
//!
//! # Example
//!
//! ```rust
//! use ngxconf_core::{Conf, Container, Key, Render};
//!
//! let conf = Conf::new().with_children([
//!     Container::upstream("backend").with_children([Key::new("server", "127.0.0.1:8080")]),
//! ]);
//!
//! assert_eq!(conf.dumps(), "upstream backend {\n    server 127.0.0.1:8080;\n}\n");
//! ```

pub mod error;
pub mod render;
pub mod tree;

pub use error::{Error, Result};
pub use render::{Render, INDENT};
pub use tree::{Conf, Container, ContainerKind, Key, Node, NodeId, NodeKind, Parent};
