//! Precedence-climbing expression parsing.
//!
//! ```text
//! expression := prefix-op expression | atom { infix-or-postfix-tail }
//! atom       := literal | identifier | "(" expression ")"
//!             | "sizeof" "(" type ")"
//! ```
//!
//! The climbing loop consumes operators while their precedence exceeds the
//! caller's threshold. Left-associative infix operators parse their right
//! operand at their own precedence; right-associative ones at the next
//! lower level (`precedence_before`). Postfix `()`, `[]` and `.` build
//! call, subscript and member-access nodes.

use mica_ir::{NodeFlags, NodeId, NodeKind, TokenKind};

use crate::operators::{Assoc, Fixity, OpInfo, OpKind};
use crate::Parser;

impl Parser<'_> {
    /// Parse an expression at the lowest threshold.
    pub(crate) fn expression(&mut self) -> Option<NodeId> {
        self.expression_at(0)
    }

    fn expression_at(&mut self, min_precedence: u32) -> Option<NodeId> {
        let mut lhs = self.prefix_or_atom()?;

        loop {
            let Some(info) = self.infix_or_postfix() else {
                break;
            };
            if info.precedence <= min_precedence {
                break;
            }
            lhs = self.apply_operator(lhs, info)?;
        }

        Some(lhs)
    }

    fn prefix_or_atom(&mut self) -> Option<NodeId> {
        if let Some(name) = self.cursor.op_name() {
            if let Some(info) = self.ops.lookup(name, Fixity::Prefix) {
                let start = self.cursor.advance().span;
                let OpKind::Unary(op) = info.kind else {
                    unreachable!("prefix table entries are unary");
                };
                // The operand binds at the prefix operator's own level, so
                // only postfix operators attach tighter than the prefix.
                let operand = self.expression_at(info.precedence)?;
                return Some(self.arena.alloc(
                    NodeKind::Unary {
                        op,
                        operand,
                        op_fn: None,
                    },
                    self.span_from(start),
                ));
            }
        }
        self.atom()
    }

    /// The operator entry matching the lookahead in infix or postfix
    /// position, if any.
    fn infix_or_postfix(&self) -> Option<OpInfo> {
        match self.cursor.current_kind() {
            TokenKind::Op(name) => self
                .ops
                .lookup(name, Fixity::Infix)
                .or_else(|| {
                    self.ops
                        .lookup(name, Fixity::Postfix)
                        .filter(|info| info.kind != OpKind::PointerStar)
                }),
            TokenKind::LParen => self.ops.lookup(self.interner.intern("()"), Fixity::Postfix),
            TokenKind::LBracket => self.ops.lookup(self.interner.intern("[]"), Fixity::Postfix),
            TokenKind::As => self.ops.lookup(self.interner.intern("as"), Fixity::Infix),
            TokenKind::Is => self.ops.lookup(self.interner.intern("is"), Fixity::Infix),
            _ => None,
        }
    }

    fn apply_operator(&mut self, lhs: NodeId, info: OpInfo) -> Option<NodeId> {
        let start = self.arena.span(lhs);
        match info.kind {
            OpKind::Binary(op) => {
                self.cursor.advance();
                let threshold = match info.assoc {
                    Assoc::Left => info.precedence,
                    Assoc::Right => self.ops.precedence_before(info.precedence),
                };
                let rhs = self.expression_at(threshold)?;
                Some(self.arena.alloc(
                    NodeKind::Binary {
                        op,
                        lhs,
                        rhs,
                        op_fn: None,
                    },
                    self.span_from(start),
                ))
            }
            OpKind::Assign(op) => {
                self.cursor.advance();
                let threshold = self.ops.precedence_before(info.precedence);
                let rhs = self.expression_at(threshold)?;
                Some(self.arena.alloc(
                    NodeKind::Assign { op, lhs, rhs },
                    self.span_from(start),
                ))
            }
            OpKind::TypeOp(kind) => {
                self.cursor.advance();
                let ty = self.type_ref()?;
                Some(self.arena.alloc(
                    NodeKind::TypeOp {
                        kind,
                        expr: lhs,
                        ty,
                    },
                    self.span_from(start),
                ))
            }
            OpKind::Call => {
                self.cursor.advance(); // `(`
                let args = self.argument_list(TokenKind::RParen)?;
                Some(self.arena.alloc(
                    NodeKind::Call { callee: lhs, args },
                    self.span_from(start),
                ))
            }
            OpKind::Subscript => {
                self.cursor.advance(); // `[`
                let args = self.argument_list(TokenKind::RBracket)?;
                Some(self.arena.alloc(
                    NodeKind::Subscript { base: lhs, args },
                    self.span_from(start),
                ))
            }
            OpKind::Member => {
                self.cursor.advance(); // `.`
                let (name, _) = self.expect_ident("after '.'")?;
                Some(self.arena.alloc(
                    NodeKind::Member {
                        base: lhs,
                        name,
                        index: None,
                    },
                    self.span_from(start),
                ))
            }
            OpKind::Unary(_) | OpKind::PointerStar => {
                unreachable!("not an infix/postfix expression operator")
            }
        }
    }

    /// Comma-separated expressions up to a closing delimiter.
    fn argument_list(&mut self, close: TokenKind) -> Option<mica_ir::NodeRange> {
        let mut args = Vec::new();
        if !self.cursor.check(close) {
            loop {
                args.push(self.expression()?);
                if self.cursor.check(close) {
                    break;
                }
                self.expect(TokenKind::Comma, "in argument list")?;
            }
        }
        self.cursor.advance(); // closing delimiter
        Some(self.arena.alloc_list(&args))
    }

    fn atom(&mut self) -> Option<NodeId> {
        let token = *self.cursor.current();
        match token.kind {
            TokenKind::Nil => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Nil, token.span))
            }
            TokenKind::True => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Bool(true), token.span))
            }
            TokenKind::False => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Bool(false), token.span))
            }
            TokenKind::Int(value) => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Int(value), token.span))
            }
            TokenKind::Float(bits) => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Float(bits), token.span))
            }
            TokenKind::Str(value) => {
                self.cursor.advance();
                Some(self.literal(NodeKind::Str(value), token.span))
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Some(
                    self.arena
                        .alloc(NodeKind::Ident { name, decl: None }, token.span),
                )
            }
            TokenKind::LParen => {
                // Grouping only; parentheses allocate no node.
                self.cursor.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "at end of group expression")?;
                Some(inner)
            }
            TokenKind::Sizeof => {
                self.cursor.advance();
                self.expect(TokenKind::LParen, "after 'sizeof'")?;
                let ty = self.type_ref()?;
                self.expect(TokenKind::RParen, "after sizeof type")?;
                Some(
                    self.arena
                        .alloc(NodeKind::SizeOf { ty }, self.span_from(token.span)),
                )
            }
            _ => {
                self.error_here(format!(
                    "expected expression, found '{}'",
                    token.kind.display_name()
                ));
                None
            }
        }
    }

    fn literal(&mut self, kind: NodeKind, span: mica_ir::Span) -> NodeId {
        let id = self.arena.alloc(kind, span);
        self.arena.set_flag(id, NodeFlags::CONSTANT);
        id
    }
}
