//! Type references.
//!
//! ```text
//! type      := base-type { "*" | "[" [ expression ] "]" }
//! base-type := "Any" | identifier | "typeof" "(" expression ")"
//! ```
//!
//! Stacked pointer stars fold into one Pointer node with a depth; the lexer
//! munches adjacent stars into a single operator lexeme, so `Int**` arrives
//! as one `**` token.

use mica_ir::{NodeId, NodeKind, TokenKind};

use crate::Parser;

impl Parser<'_> {
    pub(crate) fn type_ref(&mut self) -> Option<NodeId> {
        let start = self.cursor.current_span();
        let mut ty = match self.cursor.current_kind() {
            TokenKind::Any => {
                let span = self.cursor.advance().span;
                self.arena.alloc(NodeKind::TypeAny, span)
            }
            TokenKind::Ident(name) => {
                let span = self.cursor.advance().span;
                self.arena.alloc(NodeKind::TypeName { name, decl: None }, span)
            }
            TokenKind::Typeof => {
                self.cursor.advance();
                self.expect(TokenKind::LParen, "after 'typeof'")?;
                let expr = self.expression()?;
                self.expect(TokenKind::RParen, "after typeof expression")?;
                self.arena
                    .alloc(NodeKind::TypeOf { expr }, self.span_from(start))
            }
            _ => {
                self.error_here(format!(
                    "expected type, found '{}'",
                    self.cursor.current_kind().display_name()
                ));
                return None;
            }
        };

        loop {
            match self.cursor.current_kind() {
                // One or more pointer stars, munched into a single lexeme.
                TokenKind::Op(name) if self.is_all_stars(name) => {
                    let depth = self.interner.lookup(name).len() as u32;
                    self.cursor.advance();
                    ty = self.arena.alloc(
                        NodeKind::TypePointer { pointee: ty, depth },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let size = if self.cursor.check(TokenKind::RBracket) {
                        None
                    } else {
                        Some(self.expression()?)
                    };
                    self.expect(TokenKind::RBracket, "at end of array type")?;
                    ty = self.arena.alloc(
                        NodeKind::TypeArray {
                            element: ty,
                            size,
                            len: None,
                        },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }

        Some(ty)
    }

    fn is_all_stars(&self, name: mica_ir::Name) -> bool {
        let text = self.interner.lookup(name);
        !text.is_empty() && text.bytes().all(|b| b == b'*')
    }
}
