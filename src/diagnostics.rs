//! The diagnostic reporter contract: every stage reports through this trait
//! instead of panicking or short-circuiting, so one run surfaces as many
//! problems as possible instead of stopping at the first one.

use std::fmt;

use colored::Colorize;

/// An inclusive, 1-based column span used to underline the offending text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A span covering a single column.
    pub fn point(column: usize) -> Self {
        Self { start: column, end: column }
    }
}

/// A stable diagnostic code, e.g. `AS301`. Wrapping it instead of passing
/// bare `&str` around keeps call sites from typo-ing a code that a test
/// then silently fails to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub source_line: String,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: ErrorCode,
        file: impl Into<String>,
        line: usize,
        span: Span,
        source_line: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            file: file.into(),
            line,
            column: span.start,
            source_line: source_line.into(),
            span,
            message: message.into(),
        }
    }
}

/// The interface every pipeline stage reports diagnostics through. Kept
/// object-safe so the driver can hand the same `&mut dyn Reporter` down
/// through the preprocessor, both passes, and the emitters.
pub trait Reporter {
    fn info(&mut self, diagnostic: Diagnostic);
    fn error(&mut self, diagnostic: Diagnostic);
    fn error_count(&self) -> usize;

    fn had_errors(&self) -> bool {
        self.error_count() > 0
    }
}

fn underline(source_line: &str, span: Span) -> String {
    let width = source_line.chars().count().max(span.end);
    let mut marks = vec![' '; width];
    for i in span.start.saturating_sub(1)..span.end {
        if let Some(slot) = marks.get_mut(i) {
            *slot = '^';
        }
    }
    marks.into_iter().collect()
}

fn print_diagnostic(tag: &str, d: &Diagnostic) {
    println!("{}:{}:{}: {} [{}] {}", d.file, d.line, d.column, tag, d.code, d.message);
    println!("{}", d.source_line);
    println!("{}", underline(&d.source_line, d.span).green());
}

/// Prints diagnostics to stdout in `file:line:col: error: [code] message`
/// form, underlining the offending span on the line beneath it.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    errors: usize,
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, diagnostic: Diagnostic) {
        print_diagnostic(&"info:".cyan().bold().to_string(), &diagnostic);
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.errors += 1;
        print_diagnostic(&"error:".red().bold().to_string(), &diagnostic);
    }

    fn error_count(&self) -> usize {
        self.errors
    }
}

/// Records diagnostics instead of printing them, so tests can assert on
/// codes and spans without capturing stdout.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub infos: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl Reporter for CollectingReporter {
    fn info(&mut self, diagnostic: Diagnostic) {
        self.infos.push(diagnostic);
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_reporter_counts_only_errors() {
        let mut reporter = CollectingReporter::default();
        reporter.info(Diagnostic::new(ErrorCode("AS001"), "a.am", 1, Span::point(1), "mov r1,r2", "note"));
        reporter.error(Diagnostic::new(ErrorCode("AS002"), "a.am", 2, Span::point(1), "bogus", "bad"));
        assert_eq!(reporter.error_count(), 1);
        assert!(reporter.had_errors());
    }
}
