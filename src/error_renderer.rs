//! Error rendering with ariadne.
//!
//! Compilation errors are printed as annotated source snippets, one report
//! per collected diagnostic. Runtime and API errors have no source location
//! and render as a single line.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error with beautiful formatting to stderr
///
/// # Example
/// ```no_run
/// use calyx::{Expression, Parser, render_error};
///
/// let mut expression = Expression::new();
/// if let Err(e) = Parser::default().compile_checked("1 + (2", &mut expression) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for tests, web UIs, etc.)
///
/// # Example
/// ```no_run
/// use calyx::{Expression, Parser, render_error_to_string};
///
/// let mut expression = Expression::new();
/// if let Err(e) = Parser::default().compile_checked("x +", &mut expression) {
///     let formatted = render_error_to_string(&e);
///     eprintln!("{formatted}");
/// }
/// ```
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
///
/// This is the same as `render_error_to_string` but without ANSI color codes,
/// making the output easier to compare in tests.
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Compilation {
            diagnostics,
            source,
        } => render_diagnostics(source, diagnostics, writer, use_color),
        Error::Runtime(msg) => {
            writeln!(writer, "Runtime error: {}", msg)
        }
        Error::ResourceExceeded(msg) => {
            writeln!(writer, "Resource limit exceeded: {}", msg)
        }
        Error::Api(msg) => {
            writeln!(writer, "API error: {}", msg)
        }
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let mut report = Report::build(kind, ("<unknown>", diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        // Add error code if present
        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        // Primary label with the main error span
        let color = colors.next();
        report = report.with_label(
            Label::new(("<unknown>", diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        // Related info as secondary labels (shows context breadcrumbs!)
        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new(("<unknown>", related.span.0.clone()))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        // Help text as notes
        for help_msg in &diag.help {
            report = report.with_help(help_msg);
        }

        // Render to the writer (need to reborrow to avoid moving)
        report.finish().write(("<unknown>", Source::from(source)), &mut *writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expression, Parser};

    fn compile_error(source: &str) -> Error {
        let mut expression = Expression::new();
        Parser::default()
            .compile_checked(source, &mut expression)
            .unwrap_err()
    }

    #[test]
    fn test_render_syntax_error() {
        let output = render_error_to_string_no_color(&compile_error("1 + * 2"));
        assert!(output.contains("Error") || output.contains("error"));
        assert!(output.contains("1 + * 2"));
    }

    #[test]
    fn test_render_includes_error_code() {
        let output = render_error_to_string_no_color(&compile_error("1 + missing"));
        assert!(output.contains("E-SYMTAB"), "{output}");
        assert!(output.contains("undefined symbol 'missing'"));
    }

    #[test]
    fn test_render_every_token_error() {
        let err = compile_error("(1 2");
        let Error::Compilation { diagnostics, .. } = &err else {
            panic!("expected a compilation error, got {err:?}");
        };
        assert_eq!(diagnostics.len(), 2);
        let output = render_error_to_string_no_color(&err);
        assert!(output.matches("E-TOKEN").count() >= 2, "{output}");
    }

    #[test]
    fn test_render_runtime_error_is_one_line() {
        let output = render_error_to_string_no_color(&Error::Runtime("aborted".to_string()));
        assert_eq!(output, "Runtime error: aborted\n");
    }
}
