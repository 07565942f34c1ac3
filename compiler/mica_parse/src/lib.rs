//! Recursive descent parser for Mica.
//!
//! Produces a flat AST in the module's [`AstArena`], driven by a
//! precedence-climbing expression sub-parser over the operator table.
//!
//! # Failure mode
//!
//! Every production that reads lookahead and finds something unexpected
//! reports a diagnostic and returns `None`; the caller decides whether to
//! continue or abort the enclosing production. The parser never panics on
//! user input and never throws. At the top level, parsing synchronizes to
//! the next declaration keyword and keeps going to maximize reporting.

mod cursor;
mod grammar;
mod operators;


pub use cursor::Cursor;
pub use operators::{Assoc, Fixity, OpInfo, OpKind, OperatorTable};

use mica_diagnostic::Handler;
use mica_ir::{
    AstArena, Name, NodeId, NodeKind, Span, StringInterner, TokenKind, TokenList,
};
use tracing::debug;

/// Parser state for one source unit.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: &'a mut AstArena,
    ops: &'a OperatorTable,
    interner: &'a StringInterner,
    handler: &'a Handler,
}

/// Parse one source unit out of a token stream.
///
/// Always returns a `SourceUnit` node, possibly with fewer declarations
/// than the file had, if recovery skipped malformed ones. Parents of every
/// node in the unit are linked before returning.
pub fn parse_source_unit(
    path: Name,
    tokens: &TokenList,
    arena: &mut AstArena,
    ops: &OperatorTable,
    interner: &StringInterner,
    handler: &Handler,
) -> NodeId {
    let mut parser = Parser {
        cursor: Cursor::new(tokens),
        arena,
        ops,
        interner,
        handler,
    };
    let unit = parser.source_unit(path);
    parser.arena.link_parents(unit);
    unit
}

impl<'a> Parser<'a> {
    fn source_unit(&mut self, path: Name) -> NodeId {
        let start = self.cursor.current_span();
        let mut decls = Vec::new();

        while !self.cursor.is_at_end() {
            let before = self.cursor.position();
            match self.top_level_decl() {
                Some(decl) => decls.push(decl),
                None => {
                    // Guarantee progress, then skip to the next declaration.
                    if self.cursor.position() == before {
                        self.cursor.advance();
                    }
                    self.synchronize_top_level();
                }
            }
        }

        debug!(decls = decls.len(), "parsed source unit");
        let span = start.merge(self.cursor.current_span());
        let decls = self.arena.alloc_list(&decls);
        self.arena.alloc(NodeKind::SourceUnit { path, decls }, span)
    }

    /// Skip tokens until the next plausible top-level declaration start.
    fn synchronize_top_level(&mut self) {
        loop {
            match self.cursor.current_kind() {
                TokenKind::Eof
                | TokenKind::Load
                | TokenKind::Enum
                | TokenKind::Func
                | TokenKind::Prefix
                | TokenKind::Infix
                | TokenKind::Foreign
                | TokenKind::Intrinsic
                | TokenKind::Struct
                | TokenKind::Var
                | TokenKind::Let => return,
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ---- Shared helpers ----

    fn error_here(&self, message: impl Into<String>) {
        self.handler.error(self.cursor.current_span(), message.into());
    }

    /// Expect a specific token; report and return `None` on mismatch.
    fn expect(&mut self, kind: TokenKind, context: &str) -> Option<Span> {
        if self.cursor.check(kind) {
            Some(self.cursor.advance().span)
        } else {
            self.error_here(format!(
                "expected '{}' {}, found '{}'",
                kind.display_name(),
                context,
                self.cursor.current_kind().display_name()
            ));
            None
        }
    }

    /// Expect an identifier; report and return `None` on mismatch.
    fn expect_ident(&mut self, context: &str) -> Option<(Name, Span)> {
        match self.cursor.ident_name() {
            Some(name) => Some((name, self.cursor.advance().span)),
            None => {
                self.error_here(format!(
                    "expected identifier {}, found '{}'",
                    context,
                    self.cursor.current_kind().display_name()
                ));
                None
            }
        }
    }

    /// Whether the lookahead is the given operator lexeme.
    fn at_op(&self, lexeme: &str) -> bool {
        match self.cursor.op_name() {
            Some(name) => self.interner.lookup(name) == lexeme,
            None => false,
        }
    }

    /// Span from a start to the last consumed token.
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.cursor.previous_span())
    }
}
