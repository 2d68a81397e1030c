//! Child management shared by [`Conf`] and [`Container`]
//!
//! Attaching a subtree always renumbers its depths, so indentation stays
//! consistent no matter how a tree was assembled.

use super::{Conf, Container, Key, Node, NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::tree::types::ContainerKind;

mod sealed {
    use super::Node;

    pub trait Sealed {
        fn children_vec(&mut self) -> &mut Vec<Node>;

        /// Depth assigned to containers attached directly to `self`
        fn child_depth(&self) -> usize;
    }
}

impl sealed::Sealed for Conf {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_depth(&self) -> usize {
        0
    }
}

impl sealed::Sealed for Container {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_depth(&self) -> usize {
        self.depth() + 1
    }
}

/// Anything that owns an ordered list of child nodes
pub trait Parent: sealed::Sealed {
    /// Children in insertion order
    fn children(&self) -> &[Node];

    /// Append nodes to the end of the child list.
    ///
    /// Every attached container (and its whole subtree) gets its depth
    /// recomputed relative to `self`. Returns the full child list.
    fn add<I>(&mut self, children: I) -> &[Node]
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let depth = self.child_depth();
        let list = self.children_vec();
        for child in children {
            let mut child = child.into();
            if let Node::Container(c) = &mut child {
                c.set_depth(depth);
            }
            list.push(child);
        }
        list.as_slice()
    }

    /// Remove the children with the given identities.
    ///
    /// Fails without touching the list if any id is not a current child
    /// (an id listed twice counts as absent the second time).
    fn remove(&mut self, ids: &[NodeId]) -> Result<&[Node]> {
        let list = self.children_vec();
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            let found = list
                .iter()
                .enumerate()
                .position(|(i, n)| n.id() == *id && !positions.contains(&i));
            match found {
                Some(pos) => positions.push(pos),
                None => return Err(Error::NotFound { id: *id }),
            }
        }

        positions.sort_unstable_by(|a, b| b.cmp(a));
        for pos in positions {
            let removed = list.remove(pos);
            tracing::trace!(id = %removed.id(), name = removed.name(), "removed child");
        }
        Ok(list.as_slice())
    }

    /// Direct children matching a type tag and/or a name.
    ///
    /// - with a name, keys match on `Key::name`
    /// - containers of `kind` match when their value equals the name
    ///   (an absent name matches an empty value)
    /// - with a kind and no name, every child of that kind matches
    fn filter(&self, kind: Option<NodeKind>, name: Option<&str>) -> Vec<&Node> {
        let name = name.unwrap_or("");
        self.children()
            .iter()
            .filter(|child| match child {
                Node::Key(k) if !name.is_empty() && k.name == name => true,
                Node::Container(c) if Some(c.kind().node_kind()) == kind && c.value == name => {
                    true
                }
                _ => name.is_empty() && kind.is_some_and(|k| child.kind() == k),
            })
            .collect()
    }

    /// Immediate `server` blocks
    fn servers(&self) -> Vec<&Container> {
        containers_of(self.children(), ContainerKind::Server)
    }

    /// Immediate `location` blocks
    fn locations(&self) -> Vec<&Container> {
        containers_of(self.children(), ContainerKind::Location)
    }

    /// Immediate `upstream` blocks
    fn upstreams(&self) -> Vec<&Container> {
        containers_of(self.children(), ContainerKind::Upstream)
    }

    /// Immediate directives
    fn keys(&self) -> Vec<&Key> {
        self.children().iter().filter_map(Node::as_key).collect()
    }
}

fn containers_of(children: &[Node], kind: ContainerKind) -> Vec<&Container> {
    children
        .iter()
        .filter_map(Node::as_container)
        .filter(|c| c.kind() == kind)
        .collect()
}

impl Parent for Conf {
    fn children(&self) -> &[Node] {
        &self.children
    }
}

impl Parent for Container {
    fn children(&self) -> &[Node] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_depths(container: &Container, expected: usize) {
        assert_eq!(container.depth(), expected, "depth of {}", container.name());
        for child in container.children() {
            if let Node::Container(c) = child {
                assert_depths(c, expected + 1);
            }
        }
    }

    #[test]
    fn test_add_returns_full_list() {
        let mut server = Container::server();
        server.add([Key::new("listen", "80")]);
        let children = server.add([Key::new("server_name", "example.com")]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].name(), "server_name");
    }

    #[test]
    fn test_depth_recomputed_on_attach() {
        // Built bottom-up: inner blocks are created before their parents.
        let inner = Container::new("if", "($bad)").with_children([Key::new("return", "403")]);
        let location = Container::location("/").with_children([inner]);
        let server = Container::server().with_children([location]);

        let mut http = Container::new("http", "");
        http.add([server]);
        assert_depths(&http, 0);

        let mut conf = Conf::new();
        conf.add([http]);
        let Node::Container(http) = &conf.children()[0] else {
            panic!("expected container");
        };
        assert_depths(http, 0);
    }

    #[test]
    fn test_reparenting_resets_depth() {
        let mut server = Container::server();
        server.add([Container::location("/")]);
        let mut nested = Container::new("http", "");
        nested.add([server]);

        let Node::Container(server) = &nested.children()[0] else {
            panic!("expected container");
        };
        let Node::Container(location) = &server.children()[0] else {
            panic!("expected container");
        };
        assert_eq!(location.depth(), 2);

        let mut conf = Conf::new();
        conf.add([location.clone()]);
        assert_eq!(conf.locations()[0].depth(), 0);
    }

    #[test]
    fn test_remove_by_identity() {
        let first = Key::new("allow", "10.0.0.0/8");
        let twin = first.clone();
        let first_id = first.id();

        let mut location = Container::location("/");
        location.add([first, twin]);
        let left = location.remove(&[first_id]).unwrap();
        assert_eq!(left.len(), 1);
        assert_ne!(left[0].id(), first_id);
    }

    #[test]
    fn test_remove_absent_is_error() {
        let stranger = Key::new("deny", "all");
        let mut location = Container::location("/").with_children([Key::new("allow", "all")]);

        let err = location.remove(&[stranger.id()]).unwrap_err();
        assert!(matches!(err, Error::NotFound { id } if id == stranger.id()));
        assert_eq!(location.children().len(), 1);
    }

    #[test]
    fn test_remove_same_id_twice_fails() {
        let key = Key::new("deny", "all");
        let id = key.id();
        let mut location = Container::location("/").with_children([key]);

        assert!(location.remove(&[id, id]).is_err());
        assert_eq!(location.children().len(), 1);
    }

    #[test]
    fn test_filter_rules() {
        let conf = Conf::new().with_children(vec![
            Node::from(Key::new("user", "nginx")),
            Container::upstream("a").into(),
            Container::upstream("b").into(),
            Container::server().into(),
            Key::new("upstream", "shadow").into(),
        ]);

        assert_eq!(conf.filter(Some(NodeKind::Upstream), None).len(), 2);
        assert_eq!(conf.filter(Some(NodeKind::Server), None).len(), 1);
        assert_eq!(conf.filter(Some(NodeKind::Key), None).len(), 2);

        let named = conf.filter(Some(NodeKind::Upstream), Some("b"));
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].value(), "b");

        // A name always matches keys, whatever the kind.
        let keys = conf.filter(Some(NodeKind::Upstream), Some("user"));
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kind(), NodeKind::Key);

        assert!(conf.filter(None, None).is_empty());
    }

    #[test]
    fn test_filter_keeps_order() {
        let server = Container::server().with_children([
            Key::new("listen", "80"),
            Key::new("server_name", "a"),
            Key::new("listen", "443 ssl"),
        ]);
        let listens: Vec<&str> = server
            .filter(None, Some("listen"))
            .iter()
            .map(|n| n.value())
            .collect();
        assert_eq!(listens, ["80", "443 ssl"]);
    }

    #[test]
    fn test_typed_accessors() {
        let server = Container::server().with_children(vec![
            Node::from(Key::new("listen", "80")),
            Container::location("/").into(),
            Container::location("/api").into(),
        ]);
        assert_eq!(server.keys().len(), 1);
        assert_eq!(server.locations().len(), 2);
        assert!(server.servers().is_empty());
        assert!(server.upstreams().is_empty());
    }
}
