//! Serializer: tree back to nginx syntax
//!
//! Rendering works on line fragments so that a parent can prefix one
//! indent level onto everything a nested block produced. A block's
//! opening line is indented from its own `depth`; every following line
//! picks up one indent per enclosing block, except the empty separator
//! line in front of a nested opener.

use crate::tree::{Conf, Container, Key, Node, Parent};
use std::fmt;

/// One indentation level
pub const INDENT: &str = "    ";

/// Anything that can be written out as configuration text
pub trait Render {
    /// Output as a sequence of line fragments
    fn to_lines(&self) -> Vec<String>;

    /// Output as a single string
    fn dumps(&self) -> String {
        self.to_lines().concat()
    }
}

impl Key {
    /// `name;`, `name value;` or `name "value";`
    ///
    /// Values holding `;` or `#` are wrapped in double quotes unless they
    /// already contain a double quote, in which case they pass through as is.
    pub fn to_line(&self) -> String {
        let value = &self.value;
        if value.is_empty() {
            format!("{};\n", self.name)
        } else if !value.contains('"') && (value.contains(';') || value.contains('#')) {
            format!("{} \"{}\";\n", self.name, value)
        } else {
            format!("{} {};\n", self.name, value)
        }
    }
}

impl Render for Key {
    fn to_lines(&self) -> Vec<String> {
        vec![self.to_line()]
    }
}

impl Render for Container {
    fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.children().len() + 2);

        let mut header = INDENT.repeat(self.depth());
        header.push_str(self.name());
        if !self.value.is_empty() {
            header.push(' ');
            header.push_str(&self.value);
        }
        header.push_str(" {\n");
        lines.push(header);

        for child in self.children() {
            match child {
                Node::Key(key) => lines.push(format!("{INDENT}{}", key.to_line())),
                Node::Container(nested) => {
                    let mut nested_lines = nested.to_lines().into_iter();
                    if let Some(opening) = nested_lines.next() {
                        lines.push(format!("\n{opening}"));
                    }
                    lines.extend(nested_lines.map(indent_fragment));
                }
            }
        }

        if let Some(last) = lines.last_mut() {
            collapse_block_gap(last);
        }
        lines.push("}\n\n".to_string());
        lines
    }
}

impl Render for Node {
    fn to_lines(&self) -> Vec<String> {
        match self {
            Node::Key(k) => k.to_lines(),
            Node::Container(c) => c.to_lines(),
        }
    }
}

impl Render for Conf {
    fn to_lines(&self) -> Vec<String> {
        let lines = self.children().to_lines();
        tracing::debug!(lines = lines.len(), "rendered configuration");
        lines
    }
}

/// A bare list of top-level nodes renders like a `Conf`
impl Render for [Node] {
    fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.iter().flat_map(Node::to_lines).collect();
        if let Some(last) = lines.last_mut() {
            collapse_block_gap(last);
        }
        lines
    }
}

/// Push a nested fragment one level in.
///
/// Fragments starting with a newline are openers of deeper blocks; their
/// indentation already comes from `depth`, and the separator line above
/// them stays empty.
fn indent_fragment(line: String) -> String {
    if line.starts_with('\n') {
        line
    } else {
        format!("{INDENT}{line}")
    }
}

/// Turn a trailing `}\n\n...` into a single `}\n`.
fn collapse_block_gap(line: &mut String) {
    let content = line.trim_end_matches('\n');
    if content.len() < line.len() && content.ends_with('}') {
        let keep = content.len() + 1;
        line.truncate(keep);
    }
}

macro_rules! display_via_render {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    for line in self.to_lines() {
                        f.write_str(&line)?;
                    }
                    Ok(())
                }
            }
        )*
    };
}

display_via_render!(Key, Container, Node, Conf);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_quoting() {
        assert_eq!(Key::new("send", "some request").to_line(), "send some request;\n");
        assert_eq!(Key::new("send", "a;b").to_line(), "send \"a;b\";\n");
        assert_eq!(Key::new("send", "a#b").to_line(), "send \"a#b\";\n");
        assert_eq!(Key::new("send", "").to_line(), "send;\n");
        assert_eq!(Key::flag("ip_hash").to_line(), "ip_hash;\n");
    }

    #[test]
    fn test_key_with_quote_passes_through() {
        let key = Key::new("send", "\"a;b\"");
        assert_eq!(key.to_line(), "send \"a;b\";\n");

        // Not escaped: the output is ambiguous for a re-parse.
        let key = Key::new("log_format", "x \"y\" ;z");
        assert_eq!(key.to_line(), "log_format x \"y\" ;z;\n");
    }

    #[test]
    fn test_empty_container() {
        assert_eq!(Container::server().dumps(), "server {\n}\n\n");
    }

    #[test]
    fn test_nested_layout() {
        let conf = Conf::new().with_children([Container::server().with_children(vec![
            Node::from(Key::new("listen", "80")),
            Container::location("/").with_children([Key::new("root", "html")]).into(),
        ])]);

        assert_eq!(
            conf.to_string(),
            "server {\n    listen 80;\n\n    location / {\n        root html;\n    }\n}\n"
        );
    }

    #[test]
    fn test_block_followed_by_key_keeps_gap() {
        let server = Container::server().with_children(vec![
            Node::from(Container::location("/").with_children([Key::new("root", "html")])),
            Key::new("listen", "80").into(),
        ]);
        assert_eq!(
            server.dumps(),
            "server {\n\n    location / {\n        root html;\n    }\n\n    listen 80;\n}\n\n"
        );
    }

    #[test]
    fn test_three_levels() {
        let conf = Conf::new().with_children([Container::new("http", "").with_children([
            Container::server().with_children([
                Container::location("/").with_children([Key::new("return", "503")]),
            ]),
        ])]);

        let expected = "\
http {

    server {

        location / {
            return 503;
        }
    }
}
";
        assert_eq!(conf.dumps(), expected);
    }

    #[test]
    fn test_sibling_blocks_separated_once() {
        let conf = Conf::new().with_children([
            Container::upstream("a").with_children([Key::new("server", "1.1.1.1:80")]),
            Container::upstream("b").with_children([Key::new("server", "2.2.2.2:80")]),
        ]);
        assert_eq!(
            conf.dumps(),
            "upstream a {\n    server 1.1.1.1:80;\n}\n\nupstream b {\n    server 2.2.2.2:80;\n}\n"
        );
    }

    #[test]
    fn test_empty_conf() {
        assert_eq!(Conf::new().dumps(), "");
    }

    #[test]
    fn test_collapse_block_gap() {
        let mut line = "    }\n\n\n".to_string();
        collapse_block_gap(&mut line);
        assert_eq!(line, "    }\n");

        let mut line = "root html;\n".to_string();
        collapse_block_gap(&mut line);
        assert_eq!(line, "root html;\n");
    }
}
