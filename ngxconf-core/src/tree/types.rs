//! Node type definitions
//!
//! A configuration tree is made of two node kinds: [`Key`] directives and
//! [`Container`] blocks. Containers come in a closed set of flavours
//! (generic, `server`, `location`, `upstream`) tagged by [`ContainerKind`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a node, unique for the lifetime of the process.
///
/// Cloning a node allocates a fresh identity, so `remove` only ever
/// matches the exact node that was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================
// Type tags
// ============================================================

/// Type tag used by `filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Key,
    Container,
    Server,
    Location,
    Upstream,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Key => "Key",
            NodeKind::Container => "Container",
            NodeKind::Server => "Server",
            NodeKind::Location => "Location",
            NodeKind::Upstream => "Upstream",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flavour of a container block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerKind {
    /// Any other named block (`http`, `events`, `if`, ...)
    #[default]
    Generic,
    Server,
    Location,
    Upstream,
}

impl ContainerKind {
    /// Fixed block keyword, `None` for generic containers
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ContainerKind::Generic => None,
            ContainerKind::Server => Some("server"),
            ContainerKind::Location => Some("location"),
            ContainerKind::Upstream => Some("upstream"),
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            ContainerKind::Generic => NodeKind::Container,
            ContainerKind::Server => NodeKind::Server,
            ContainerKind::Location => NodeKind::Location,
            ContainerKind::Upstream => NodeKind::Upstream,
        }
    }
}

// ============================================================
// Key
// ============================================================

/// A single directive: `name value;` or `name;`
#[derive(Debug)]
pub struct Key {
    id: NodeId,
    pub name: String,
    /// Empty means the directive has no argument
    pub value: String,
}

impl Key {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Directive without a value, e.g. `ip_hash;`
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Clone for Key {
    fn clone(&self) -> Self {
        Self::new(self.name.clone(), self.value.clone())
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Key {}

// ============================================================
// Container
// ============================================================

/// A named block with an optional inline value and ordered children
#[derive(Debug)]
pub struct Container {
    id: NodeId,
    kind: ContainerKind,
    name: String,
    /// Inline argument, e.g. the location pattern or upstream name
    pub value: String,
    depth: usize,
    pub(crate) children: Vec<Node>,
}

impl Container {
    /// Generic block with a custom keyword
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_kind(ContainerKind::Generic, name.into(), value.into())
    }

    /// `server { ... }`
    pub fn server() -> Self {
        Self::with_kind(ContainerKind::Server, "server".to_string(), String::new())
    }

    /// `location <pattern> { ... }`
    pub fn location(pattern: impl Into<String>) -> Self {
        Self::with_kind(ContainerKind::Location, "location".to_string(), pattern.into())
    }

    /// `upstream <name> { ... }`
    pub fn upstream(name: impl Into<String>) -> Self {
        Self::with_kind(ContainerKind::Upstream, "upstream".to_string(), name.into())
    }

    fn with_kind(kind: ContainerKind, name: String, value: String) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            name,
            value,
            depth: 0,
            children: Vec::new(),
        }
    }

    /// Builder form of `add`
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        super::Parent::add(&mut self, children);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nesting level used for indentation; 0 for top-level blocks
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Set this container's depth and renumber every descendant.
    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            if let Node::Container(c) = child {
                c.set_depth(depth + 1);
            }
        }
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            id: NodeId::next(),
            kind: self.kind,
            name: self.name.clone(),
            value: self.value.clone(),
            depth: self.depth,
            children: self.children.clone(),
        }
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.value == other.value
            && self.children == other.children
    }
}

impl Eq for Container {}

// ============================================================
// Node
// ============================================================

/// Any child of a container or of the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Key(Key),
    Container(Container),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Key(k) => k.id(),
            Node::Container(c) => c.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Key(_) => NodeKind::Key,
            Node::Container(c) => c.kind().node_kind(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Key(k) => &k.name,
            Node::Container(c) => c.name(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Node::Key(k) => &k.value,
            Node::Container(c) => &c.value,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Node::Key(k) => Some(k),
            Node::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Key(_) => None,
        }
    }
}

impl From<Key> for Node {
    fn from(key: Key) -> Self {
        Node::Key(key)
    }
}

impl From<Container> for Node {
    fn from(container: Container) -> Self {
        Node::Container(container)
    }
}
