//! Terminal rendering for diagnostics.
//!
//! Kept deliberately small: one line per diagnostic plus a location line
//! resolved through the source map. Diagnostics are sorted by source
//! position before rendering so output order is stable regardless of the
//! order phases reported them in.

use crate::{Diagnostic, SourceMap};
use std::fmt::Write;

/// Render diagnostics to a string.
pub fn render(diagnostics: &[Diagnostic], map: &SourceMap) -> String {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by_key(|d| (d.span.start, d.span.end));

    let mut out = String::new();
    for diag in sorted {
        let _ = writeln!(out, "{}: {}", diag.severity, diag.message);
        if !diag.span.is_dummy() {
            if let Some((file, pos)) = map.lookup(diag.span.start) {
                let _ = writeln!(out, "  --> {}:{}:{}", file.name, pos.line, pos.column);
            }
        }
    }
    out
}

/// Render diagnostics to stderr.
pub fn emit(diagnostics: &[Diagnostic], map: &SourceMap) {
    eprint!("{}", render(diagnostics, map));
}
