//! Human-readable diagnostics for strict-mode parse errors

use crate::parser::ParseError;
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

/// Render a parse error against its source, pointing at the offending byte.
///
/// Positions are byte offsets, so the report indexes the source by byte.
pub fn render(name: &str, source: &str, error: &ParseError, color: bool) -> String {
    let start = error.position().min(source.len());
    let end = (start + 1).min(source.len()).max(start);
    let label = match error {
        ParseError::UnexpectedCloser { .. } => "this brace closes nothing",
        ParseError::UnclosedBlock { .. } => "block opened here is never closed",
        ParseError::TrailingInput { .. } => "parsing stopped here",
    };

    let config = Config::default()
        .with_color(color)
        .with_index_type(IndexType::Byte);

    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, (name, start..end))
        .with_config(config)
        .with_message(error.to_string())
        .with_label(
            Label::new((name, start..end))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((name, Source::from(source)), &mut buf);

    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {}", name, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_strict;

    #[test]
    fn test_render_mentions_error() {
        let source = "listen 80;\n}\n";
        let err = parse_strict(source).unwrap_err();
        let text = render("nginx.conf", source, &err, false);
        assert!(text.contains("nginx.conf"));
        assert!(text.contains("this brace closes nothing"));
    }

    #[test]
    fn test_render_after_multibyte_text() {
        let source = "server_name ééééééééééééééééééééééé.example;\n}\n";
        let err = parse_strict(source).unwrap_err();
        assert_eq!(err.position(), source.len() - 2);

        let text = render("nginx.conf", source, &err, false);
        assert!(text.contains("this brace closes nothing"));
    }

    #[test]
    fn test_render_at_end_of_input() {
        let source = "server {";
        let err = ParseError::TrailingInput { position: source.len() };
        let text = render("x.conf", source, &err, false);
        assert!(text.contains("parsing stopped here"));
    }
}
