//! JSON configuration adapter
//!
//! Renders the structural projections of a tree as JSON text, and reads
//! the list projection back into a tree.

use ngxconf_core::{Conf, Container, Key, Node};
use serde_json::Value;
use thiserror::Error;

/// Which projection to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Nested `[name, value, [children]]` arrays
    #[default]
    List,
    /// Nested `{"name value": [children]}` maps
    Dict,
}

/// JSON adapter errors
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Invalid node at {path}: {message}")]
    Shape { path: String, message: String },
}

/// JSON configuration adapter
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn to_value(conf: &Conf, projection: Projection) -> Value {
        match projection {
            Projection::List => conf.as_list(),
            Projection::Dict => conf.as_dict(),
        }
    }

    /// Serialize a projection to JSON text
    pub fn serialize(
        conf: &Conf,
        projection: Projection,
        pretty: bool,
    ) -> Result<String, JsonError> {
        let value = Self::to_value(conf, projection);
        let text = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    /// Parse the list projection back into a tree
    pub fn parse(input: &str) -> Result<Conf, JsonError> {
        let value: Value = serde_json::from_str(input)?;
        let items = value.as_array().ok_or_else(|| shape("$", "expected an array"))?;

        let mut nodes = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            nodes.push(node_from_value(item, &format!("$[{}]", i))?);
        }
        Ok(Conf::from(nodes))
    }
}

fn node_from_value(value: &Value, path: &str) -> Result<Node, JsonError> {
    let parts = value.as_array().ok_or_else(|| shape(path, "expected an array"))?;

    match parts.len() {
        2 => Ok(Key::new(text_at(parts, 0, path)?, text_at(parts, 1, path)?).into()),
        3 => {
            let (name, value) = (text_at(parts, 0, path)?, text_at(parts, 1, path)?);
            let mut container = match name {
                "server" if value.is_empty() => Container::server(),
                "server" => return Err(shape(path, "a server block takes no value")),
                "location" => Container::location(value),
                "upstream" => Container::upstream(value),
                other => Container::new(other, value),
            };

            let children = parts[2]
                .as_array()
                .ok_or_else(|| shape(path, "element 2 must be an array of children"))?;
            let mut nodes = Vec::with_capacity(children.len());
            for (i, child) in children.iter().enumerate() {
                nodes.push(node_from_value(child, &format!("{}[2][{}]", path, i))?);
            }
            container = container.with_children(nodes);
            Ok(container.into())
        }
        n => Err(shape(path, &format!("expected 2 or 3 elements, found {}", n))),
    }
}

fn text_at<'v>(parts: &'v [Value], i: usize, path: &str) -> Result<&'v str, JsonError> {
    parts[i]
        .as_str()
        .ok_or_else(|| shape(path, &format!("element {} must be a string", i)))
}

fn shape(path: &str, message: &str) -> JsonError {
    JsonError::Shape {
        path: path.to_string(),
        message: message.to_string(),
    }
}
