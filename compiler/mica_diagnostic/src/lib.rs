//! Diagnostic system for the Mica compiler.
//!
//! Every phase reports user-facing problems through a shared [`Handler`];
//! the handler counts messages per severity level so the driver can decide
//! whether to proceed past each phase. Rendering is separate (see
//! [`emitter`]): phases never format source context themselves.

pub mod emitter;
mod source_map;

pub use source_map::{LineCol, SourceFile, SourceMap};

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use mica_ir::Span;

/// Severity of a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Error => 2,
            Severity::Critical => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(text)
    }
}

/// A single diagnostic message.
///
/// Carries a severity, a source range (global offsets; `Span::DUMMY` for
/// messages without a location) and a formatted message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            span,
            message: message.into(),
        }
    }

    pub fn info(span: Span, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Info, span, message)
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, span, message)
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, span, message)
    }

    pub fn critical(span: Span, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Critical, span, message)
    }
}

/// Thread-safe diagnostic sink.
///
/// Phases within one module run on one thread, but a host may compile
/// independent modules concurrently against a shared handler, so the store
/// is a mutex and the per-level counters are atomics (countable without
/// taking the lock).
#[derive(Default)]
pub struct Handler {
    diagnostics: Mutex<Vec<Diagnostic>>,
    counts: [AtomicUsize; Severity::COUNT],
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.counts[diagnostic.severity.index()].fetch_add(1, Ordering::Relaxed);
        self.diagnostics.lock().push(diagnostic);
    }

    /// Report an error at a location.
    pub fn error(&self, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::error(span, message));
    }

    /// Report a warning at a location.
    pub fn warning(&self, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::warning(span, message));
    }

    /// Report a critical failure at a location.
    pub fn critical(&self, span: Span, message: impl Into<String>) {
        self.report(Diagnostic::critical(span, message));
    }

    /// Number of diagnostics reported at a level.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity.index()].load(Ordering::Relaxed)
    }

    /// Whether any Error or Critical diagnostic has been reported.
    ///
    /// Phase gates check this before handing off to the next phase.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0 || self.count(Severity::Critical) > 0
    }

    /// Snapshot of all diagnostics reported so far, in report order.
    pub fn collected(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handler {{ info: {}, warning: {}, error: {}, critical: {} }}",
            self.count(Severity::Info),
            self.count(Severity::Warning),
            self.count(Severity::Error),
            self.count(Severity::Critical),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_level() {
        let handler = Handler::new();
        handler.error(Span::new(0, 1), "first");
        handler.error(Span::new(2, 3), "second");
        handler.warning(Span::DUMMY, "meh");

        assert_eq!(handler.count(Severity::Error), 2);
        assert_eq!(handler.count(Severity::Warning), 1);
        assert_eq!(handler.count(Severity::Critical), 0);
        assert!(handler.has_errors());
    }

    #[test]
    fn no_errors_initially() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.warning(Span::DUMMY, "warnings do not gate phases");
        assert!(!handler.has_errors());
    }

    #[test]
    fn collected_preserves_order() {
        let handler = Handler::new();
        handler.error(Span::new(0, 1), "a");
        handler.error(Span::new(5, 6), "b");

        let all = handler.collected();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "a");
        assert_eq!(all[1].message, "b");
    }
}
