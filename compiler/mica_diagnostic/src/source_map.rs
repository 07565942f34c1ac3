//! Mapping from global byte offsets to files, lines and columns.
//!
//! Each registered file owns a disjoint interval of the global `u32` offset
//! space, with a one-byte gap after every file so end-of-file positions stay
//! unambiguous. Spans therefore remain 8 bytes everywhere, and positional
//! comparisons (symbol table "as-of" lookups) work across files.

use mica_ir::Span;

/// One registered source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display path of the file.
    pub name: String,
    /// File contents.
    pub source: String,
    /// Global offset of the file's first byte.
    pub start: u32,
    /// Byte offsets (file-local) of every line start.
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(name: String, source: String, start: u32) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx as u32 + 1);
            }
        }
        SourceFile {
            name,
            source,
            start,
            line_starts,
        }
    }

    /// Global end offset (exclusive).
    pub fn end(&self) -> u32 {
        self.start + self.source.len() as u32
    }
}

/// 1-based line/column position inside a file.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Registry of source files sharing one global offset space.
#[derive(Default, Debug)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    next_start: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap {
            files: Vec::new(),
            // Offset 0 is reserved so Span::DUMMY never points into a file.
            next_start: 1,
        }
    }

    /// Register a file, returning the global offset of its first byte.
    ///
    /// The lexer adds this base to every token span it produces.
    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        let source = source.into();
        let start = self.next_start;
        let file = SourceFile::new(name.into(), source, start);
        self.next_start = file.end() + 1;
        self.files.push(file);
        start
    }

    /// All registered files, in registration order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The file containing a global offset.
    pub fn file_for(&self, offset: u32) -> Option<&SourceFile> {
        self.files
            .iter()
            .find(|f| offset >= f.start && offset <= f.end())
    }

    /// Resolve a global offset to its file and 1-based line/column.
    pub fn lookup(&self, offset: u32) -> Option<(&SourceFile, LineCol)> {
        let file = self.file_for(offset)?;
        let local = offset - file.start;
        let line_idx = match file.line_starts.binary_search(&local) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let column = local - file.line_starts[line_idx] + 1;
        Some((
            file,
            LineCol {
                line: line_idx as u32 + 1,
                column,
            },
        ))
    }

    /// The source text a span covers, if it lies within one file.
    pub fn snippet(&self, span: Span) -> Option<&str> {
        let file = self.file_for(span.start)?;
        if span.end > file.end() {
            return None;
        }
        let start = (span.start - file.start) as usize;
        let end = (span.end - file.start) as usize;
        file.source.get(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_get_disjoint_intervals() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.mica", "var x: Int\n");
        let b = map.add_file("b.mica", "var y: Int\n");

        assert!(a < b);
        assert!(map.files()[0].end() < b);
    }

    #[test]
    fn lookup_line_and_column() {
        let mut map = SourceMap::new();
        let base = map.add_file("a.mica", "one\ntwo\nthree\n");

        let (file, pos) = map.lookup(base).unwrap();
        assert_eq!(file.name, "a.mica");
        assert_eq!(pos, LineCol { line: 1, column: 1 });

        // Offset of 'w' in "two".
        let (_, pos) = map.lookup(base + 5).unwrap();
        assert_eq!(pos, LineCol { line: 2, column: 2 });
    }

    #[test]
    fn snippet_extracts_span_text() {
        let mut map = SourceMap::new();
        let base = map.add_file("a.mica", "var x: Int");

        let span = Span::new(base + 4, base + 5);
        assert_eq!(map.snippet(span), Some("x"));
    }

    #[test]
    fn lookup_across_files() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.mica", "aa\n");
        let b = map.add_file("b.mica", "bb\n");

        assert_eq!(map.lookup(a).unwrap().0.name, "a.mica");
        assert_eq!(map.lookup(b + 1).unwrap().0.name, "b.mica");
    }
}
