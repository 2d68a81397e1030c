//! File helpers: read configuration text into a tree, write a tree out

use crate::parser::{self, ParseError};
use ngxconf_core::{Conf, Render};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors from the file helpers
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Parse configuration text, repairing malformed input
pub fn loads(text: &str) -> Conf {
    parser::parse(text)
}

/// Read and parse a configuration file
pub fn load(path: impl AsRef<Path>) -> Result<Conf, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded configuration file");
    Ok(loads(&text))
}

/// Read and parse a configuration file, rejecting malformed input
pub fn load_strict(path: impl AsRef<Path>) -> Result<Conf, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parser::parse_strict(&text)?)
}

/// Serialize into any writer
pub fn dump<R, W>(node: &R, writer: &mut W) -> Result<(), LoadError>
where
    R: Render + ?Sized,
    W: Write,
{
    for line in node.to_lines() {
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize into a file, creating or truncating it
pub fn dumpf<R>(node: &R, path: impl AsRef<Path>) -> Result<(), LoadError>
where
    R: Render + ?Sized,
{
    let path = path.as_ref();
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    dump(node, &mut file)?;
    tracing::info!(path = %path.display(), "wrote configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngxconf_core::{Container, Key, Parent};

    #[test]
    fn test_dump_to_buffer() {
        let server = Container::server().with_children([Key::new("listen", "80")]);
        let mut buf = Vec::new();
        dump(&server, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "server {\n    listen 80;\n}\n\n");
    }

    #[test]
    fn test_dumpf_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nginx.conf");

        let conf = loads("upstream app { server 10.0.0.1:80; }\nserver { listen 80; }");
        dumpf(&conf, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, conf.dumps());

        let back = load(&path).unwrap();
        assert_eq!(back, conf);
        assert_eq!(back.upstreams()[0].value, "app");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_load_strict_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"server {\n    listen 80;\n").unwrap();

        let err = load_strict(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse(ParseError::UnclosedBlock { .. })));
        assert!(load(file.path()).unwrap().server().is_ok());
    }
}
