//! Structural projections of a tree into plain JSON values
//!
//! `as_list` mirrors the tree shape with nested arrays of strings.
//! `as_dict` keys each node by its header; siblings stay in a list of
//! single-entry maps, so consumers that merge them into one map will lose
//! repeated directive names.

use super::{Conf, Container, ContainerKind, Key, Node, Parent};
use serde_json::{json, Map, Value};

impl Key {
    /// `[name, value]`
    pub fn as_list(&self) -> Value {
        json!([self.name, self.value])
    }

    /// `{name: value}`
    pub fn as_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.name.clone(), Value::String(self.value.clone()));
        Value::Object(map)
    }
}

impl Container {
    /// `[name, value, [children...]]`
    pub fn as_list(&self) -> Value {
        let children: Vec<Value> = self.children().iter().map(Node::as_list).collect();
        json!([self.name(), self.value, children])
    }

    /// `{"name value": [children...]}`, or `{"name": [...]}` without a value
    pub fn as_dict(&self) -> Value {
        let header = if self.kind() == ContainerKind::Server || self.value.is_empty() {
            self.name().to_string()
        } else {
            format!("{} {}", self.name(), self.value)
        };
        let children: Vec<Value> = self.children().iter().map(Node::as_dict).collect();

        let mut map = Map::new();
        map.insert(header, Value::Array(children));
        Value::Object(map)
    }
}

impl Node {
    pub fn as_list(&self) -> Value {
        match self {
            Node::Key(k) => k.as_list(),
            Node::Container(c) => c.as_list(),
        }
    }

    pub fn as_dict(&self) -> Value {
        match self {
            Node::Key(k) => k.as_dict(),
            Node::Container(c) => c.as_dict(),
        }
    }
}

impl Conf {
    /// `[child, child, ...]`
    pub fn as_list(&self) -> Value {
        Value::Array(self.children().iter().map(Node::as_list).collect())
    }

    /// `{"conf": [child, child, ...]}`
    pub fn as_dict(&self) -> Value {
        json!({ "conf": self.children().iter().map(Node::as_dict).collect::<Vec<_>>() })
    }
}
