//! Diagnostic infrastructure.
//!
//! Diagnostics are in-memory records carrying the owning unit path, a span,
//! a pre-formatted message, and a numeric code. They are produced by the
//! parser (syntactic), the binder and resolver (semantic), and the compiler
//! facade (structural/configuration, reported with a zero span).

use crate::span::Span;
use serde::Serialize;
use std::fmt;

// =============================================================================
// Diagnostic Severity
// =============================================================================

/// The severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning = 2,
    Error = 1,
}

impl DiagnosticSeverity {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DiagnosticSeverity::Error)
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A diagnostic message with location, severity, and error code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The unit containing the diagnostic.
    pub unit: String,
    /// The source span (byte offsets). Zero for unit-level diagnostics.
    pub span: Span,
    /// The formatted message.
    pub message: String,
    pub severity: DiagnosticSeverity,
    /// The numeric diagnostic code (e.g. 2304).
    pub code: u32,
}

impl Diagnostic {
    pub fn new(
        unit: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        severity: DiagnosticSeverity,
        code: u32,
    ) -> Self {
        Diagnostic {
            unit: unit.into(),
            span,
            message: message.into(),
            severity,
            code,
        }
    }

    pub fn error(
        unit: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self::new(unit, span, message, DiagnosticSeverity::Error, code)
    }

    pub fn warning(
        unit: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self::new(unit, span, message, DiagnosticSeverity::Warning, code)
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    pub fn start(&self) -> u32 {
        self.span.start
    }

    pub fn length(&self) -> u32 {
        self.span.len()
    }

    /// Format in a compact form: `error[2304]: Cannot find name 'foo'.`
    pub fn format_simple(&self) -> String {
        format!("{}[{}]: {}", self.severity, self.code, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

// =============================================================================
// DiagnosticBag
// =============================================================================

/// A collection of diagnostics for one compilation phase or unit.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    /// Unit used for diagnostics added without an explicit unit path.
    default_unit: String,
    error_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        DiagnosticBag::default()
    }

    pub fn with_unit(unit: impl Into<String>) -> Self {
        DiagnosticBag {
            diagnostics: Vec::new(),
            default_unit: unit.into(),
            error_count: 0,
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>, code: u32) {
        self.add(Diagnostic::error(&self.default_unit, span, message, code));
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>, code: u32) {
        self.add(Diagnostic::warning(&self.default_unit, span, message, code));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Error codes in insertion order (test helper).
    pub fn error_codes(&self) -> Vec<u32> {
        self.errors().map(|d| d.code).collect()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
    }

    /// Take all diagnostics, leaving the bag empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    pub fn merge(&mut self, other: DiagnosticBag) {
        for diag in other.diagnostics {
            self.add(diag);
        }
    }

    /// Sort by unit, then by start offset. Resolution emits in source order
    /// already; this is for callers aggregating across units.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.unit
                .cmp(&b.unit)
                .then_with(|| a.span.start.cmp(&b.span.start))
        });
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl Extend<Diagnostic> for DiagnosticBag {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diag in iter {
            self.add(diag);
        }
    }
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Format a diagnostic message template, replacing `{0}`, `{1}`, ... with
/// the provided arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("u1.ts", Span::new(10, 20), "Test error", 2304);
        assert_eq!(diag.unit, "u1.ts");
        assert_eq!(diag.start(), 10);
        assert_eq!(diag.length(), 10);
        assert!(diag.is_error());
        assert_eq!(diag.format_simple(), "error[2304]: Test error");
    }

    #[test]
    fn test_bag_counts_and_codes() {
        let mut bag = DiagnosticBag::with_unit("u1.ts");
        bag.error(Span::new(0, 5), "Error 1", 2304);
        bag.error(Span::new(10, 15), "Error 2", 2322);
        bag.warning(Span::new(20, 25), "Warning 1", 6133);

        assert_eq!(bag.len(), 3);
        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 2);
        assert_eq!(bag.error_codes(), vec![2304, 2322]);
    }

    #[test]
    fn test_bag_take_resets() {
        let mut bag = DiagnosticBag::with_unit("u1.ts");
        bag.error(Span::new(0, 5), "Error 1", 2304);
        let taken = bag.take();
        assert_eq!(taken.len(), 1);
        assert!(bag.is_empty());
        assert_eq!(bag.error_count(), 0);
    }

    #[test]
    fn test_bag_sort() {
        let mut bag = DiagnosticBag::new();
        bag.add(Diagnostic::error("b.ts", Span::new(10, 15), "B", 2304));
        bag.add(Diagnostic::error("a.ts", Span::new(5, 10), "A2", 2322));
        bag.add(Diagnostic::error("a.ts", Span::new(0, 5), "A1", 2304));
        bag.sort();
        let units: Vec<_> = bag.iter().map(|d| (d.unit.as_str(), d.span.start)).collect();
        assert_eq!(units, vec![("a.ts", 0), ("a.ts", 5), ("b.ts", 10)]);
    }

    #[test]
    fn test_format_message() {
        let msg = format_message("Cannot find name '{0}'.", &["foo"]);
        assert_eq!(msg, "Cannot find name 'foo'.");
    }
}
