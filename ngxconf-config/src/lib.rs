//! nginx configuration parser
//!
//! Turns configuration text into an `ngxconf_core` tree and back.
//!
//! # Example
//!
//! ```rust
//! use ngxconf_config::loads;
//! use ngxconf_core::{Parent, Render};
//!
//! let conf = loads("upstream app {\n    server 127.0.0.1:9000;\n}\n");
//! assert_eq!(conf.upstreams()[0].value, "app");
//! assert_eq!(conf.dumps(), "upstream app {\n    server 127.0.0.1:9000;\n}\n");
//! ```

pub mod adapter;
pub mod io;
pub mod parser;
pub mod report;

pub use adapter::{JsonAdapter, JsonError, Projection};
pub use io::{dump, dumpf, load, load_strict, loads, LoadError};
pub use report::render;
pub use parser::{parse, parse_items, parse_strict, ParseError, ParseResult, Parser};
