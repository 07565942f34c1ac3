//! Statements and blocks.
//!
//! ```text
//! statement  := variable-decl | control-stmt | defer-stmt | do-stmt
//!             | for-stmt | guard-stmt | if-stmt | switch-stmt | while-stmt
//!             | expression
//! control    := "break" | "continue" | "fallthrough" | "return" [ expr ]
//! defer-stmt := "defer" expression
//! do-stmt    := "do" block "while" condition-list
//! for-stmt   := "for" identifier "in" expression block
//! guard-stmt := "guard" condition-list "else" block
//! if-stmt    := "if" condition-list block [ "else" ( if-stmt | block ) ]
//! switch     := "switch" expression "{" switch-case { switch-case } "}"
//! switch-case:= ( "case" expression | "else" ) ":" { statement }
//! while-stmt := "while" condition-list block
//! block      := "{" { statement } "}"
//! condition-list := expression { "," expression }
//! ```

use mica_ir::{
    CaseKind, ControlKind, ElseArm, LoopKind, NodeId, NodeKind, NodeRange, Span, TokenKind,
};

use crate::Parser;

impl Parser<'_> {
    pub(crate) fn statement(&mut self) -> Option<NodeId> {
        match self.cursor.current_kind() {
            TokenKind::Var | TokenKind::Let => self.variable_decl(),
            TokenKind::Break => self.control_stmt(ControlKind::Break),
            TokenKind::Continue => self.control_stmt(ControlKind::Continue),
            TokenKind::Fallthrough => self.control_stmt(ControlKind::Fallthrough),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Defer => self.defer_stmt(),
            TokenKind::Do => self.do_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Guard => self.guard_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::Switch => self.switch_stmt(),
            TokenKind::While => self.while_stmt(),
            _ => self.expression(),
        }
    }

    pub(crate) fn block(&mut self) -> Option<NodeId> {
        let start = self.expect(TokenKind::LBrace, "at start of block")?;
        let mut stmts = Vec::new();
        while !self.cursor.check(TokenKind::RBrace) {
            if self.cursor.is_at_end() {
                self.error_here("expected '}' at end of block");
                return None;
            }
            stmts.push(self.statement()?);
        }
        self.cursor.advance(); // `}`

        let stmts = self.arena.alloc_list(&stmts);
        Some(
            self.arena
                .alloc(NodeKind::Block { stmts }, self.span_from(start)),
        )
    }

    fn control_stmt(&mut self, kind: ControlKind) -> Option<NodeId> {
        let span = self.cursor.advance().span;
        Some(self.arena.alloc(
            NodeKind::Control {
                kind,
                result: None,
                target: None,
            },
            span,
        ))
    }

    fn return_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        // A result expression follows unless the statement ends the
        // enclosing construct.
        let result = if self.at_expression_start() {
            Some(self.expression()?)
        } else {
            None
        };
        Some(self.arena.alloc(
            NodeKind::Control {
                kind: ControlKind::Return,
                result,
                target: None,
            },
            self.span_from(start),
        ))
    }

    /// Whether the lookahead can begin an expression.
    fn at_expression_start(&self) -> bool {
        match self.cursor.current_kind() {
            TokenKind::Nil
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Ident(_)
            | TokenKind::LParen
            | TokenKind::Sizeof => true,
            TokenKind::Op(name) => self
                .ops
                .lookup(name, crate::Fixity::Prefix)
                .is_some(),
            _ => false,
        }
    }

    fn defer_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let expr = self.expression()?;
        Some(
            self.arena
                .alloc(NodeKind::Defer { expr }, self.span_from(start)),
        )
    }

    fn condition_list(&mut self) -> Option<NodeRange> {
        let mut conditions = Vec::new();
        loop {
            conditions.push(self.expression()?);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        Some(self.arena.alloc_list(&conditions))
    }

    fn do_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let body = self.block()?;
        self.expect(TokenKind::While, "after do block")?;
        let conditions = self.condition_list()?;
        Some(self.arena.alloc(
            NodeKind::Loop {
                kind: LoopKind::DoWhile,
                conditions,
                body,
            },
            self.span_from(start),
        ))
    }

    fn while_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let conditions = self.condition_list()?;
        let body = self.block()?;
        Some(self.arena.alloc(
            NodeKind::Loop {
                kind: LoopKind::While,
                conditions,
                body,
            },
            self.span_from(start),
        ))
    }

    fn for_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let (name, name_span) = self.expect_ident("for loop element name")?;
        // The element is a synthesized declaration; its type comes from the
        // sequence during resolution.
        let element = self.arena.alloc(
            NodeKind::Var {
                name,
                ty: None,
                init: None,
            },
            name_span,
        );
        self.expect(TokenKind::In, "after loop element name")?;
        let sequence = self.expression()?;
        let body = self.block()?;
        Some(self.arena.alloc(
            NodeKind::For {
                element,
                sequence,
                body,
            },
            self.span_from(start),
        ))
    }

    fn guard_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let conditions = self.condition_list()?;
        self.expect(TokenKind::Else, "in guard statement")?;
        let else_block = self.block()?;
        Some(self.arena.alloc(
            NodeKind::Guard {
                conditions,
                else_block,
            },
            self.span_from(start),
        ))
    }

    fn if_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let conditions = self.condition_list()?;
        let then_block = self.block()?;

        let else_arm = if self.cursor.eat(TokenKind::Else) {
            if self.cursor.check(TokenKind::If) {
                ElseArm::If(self.if_stmt()?)
            } else {
                ElseArm::Block(self.block()?)
            }
        } else {
            ElseArm::None
        };

        Some(self.arena.alloc(
            NodeKind::If {
                conditions,
                then_block,
                else_arm,
            },
            self.span_from(start),
        ))
    }

    fn switch_stmt(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let argument = self.expression()?;
        self.expect(TokenKind::LBrace, "after switch argument")?;

        let mut cases = Vec::new();
        while matches!(
            self.cursor.current_kind(),
            TokenKind::Case | TokenKind::Else
        ) {
            cases.push(self.switch_case()?);
        }
        if cases.is_empty() {
            self.error_here("expected at least one case in switch statement");
        }
        self.expect(TokenKind::RBrace, "at end of switch statement")?;

        // Link each case to its successor for fallthrough.
        for pair in cases.windows(2) {
            let (case, next) = (pair[0], pair[1]);
            if let NodeKind::Case { next: slot, .. } = self.arena.kind_mut(case) {
                *slot = Some(next);
            }
        }

        let cases = self.arena.alloc_list(&cases);
        Some(self.arena.alloc(
            NodeKind::Switch { argument, cases },
            self.span_from(start),
        ))
    }

    fn switch_case(&mut self) -> Option<NodeId> {
        let start = self.cursor.current_span();
        let (kind, condition) = if self.cursor.eat(TokenKind::Case) {
            (CaseKind::Conditional, Some(self.expression()?))
        } else {
            self.cursor.advance(); // `else`
            (CaseKind::Else, None)
        };
        self.expect(TokenKind::Colon, "in switch case")?;

        let body_start = self.cursor.current_span();
        let mut stmts = Vec::new();
        while !matches!(
            self.cursor.current_kind(),
            TokenKind::Case | TokenKind::Else | TokenKind::RBrace | TokenKind::Eof
        ) {
            stmts.push(self.statement()?);
        }
        let body_span = if stmts.is_empty() {
            Span::point(body_start.start)
        } else {
            body_start.merge(self.cursor.previous_span())
        };
        let stmts = self.arena.alloc_list(&stmts);
        let body = self.arena.alloc(NodeKind::Block { stmts }, body_span);

        Some(self.arena.alloc(
            NodeKind::Case {
                kind,
                condition,
                body,
                switch_stmt: None,
                next: None,
            },
            self.span_from(start),
        ))
    }
}
