//! Top-level declarations.
//!
//! ```text
//! top-level       := load-directive | enum-decl | func-decl | struct-decl
//!                  | variable-decl
//! load-directive  := "#load" string-literal
//! enum-decl       := "enum" identifier "{" { enum-element } "}"
//! enum-element    := "case" identifier [ "=" expression ]
//! func-decl       := [ "prefix" | "infix" | "foreign" | "intrinsic" ]
//!                    "func" name "(" [ parameter { "," parameter } ] ")"
//!                    "->" type [ block ]
//! parameter       := identifier ":" type
//! struct-decl     := "struct" identifier block   // var/let statements only
//! variable-decl   := ( "var" | "let" ) identifier ":" type
//!                    [ "=" expression ]
//! ```

use mica_ir::{FuncKind, Name, NodeFlags, NodeId, NodeKind, TokenKind};

use crate::Parser;

impl Parser<'_> {
    pub(crate) fn top_level_decl(&mut self) -> Option<NodeId> {
        match self.cursor.current_kind() {
            TokenKind::Load => self.load_directive(),
            TokenKind::Enum => self.enum_decl(),
            TokenKind::Func => {
                self.cursor.advance();
                self.func_decl(FuncKind::Plain)
            }
            TokenKind::Prefix => self.introduced_func(FuncKind::PrefixOp),
            TokenKind::Infix => self.introduced_func(FuncKind::InfixOp),
            TokenKind::Foreign => self.introduced_func(FuncKind::Foreign),
            TokenKind::Intrinsic => self.introduced_func(FuncKind::Intrinsic),
            TokenKind::Struct => self.struct_decl(),
            TokenKind::Var | TokenKind::Let => self.variable_decl(),
            _ => {
                self.error_here(format!(
                    "expected a top level declaration, found '{}'",
                    self.cursor.current_kind().display_name()
                ));
                None
            }
        }
    }

    fn load_directive(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        match self.cursor.current_kind() {
            TokenKind::Str(path) => {
                let literal_span = self.cursor.advance().span;
                let literal = self.arena.alloc(NodeKind::Str(path), literal_span);
                self.arena.set_flag(literal, NodeFlags::CONSTANT);
                Some(self.arena.alloc(
                    NodeKind::Load { path, literal },
                    self.span_from(start),
                ))
            }
            _ => {
                self.error_here("expected string literal after '#load'");
                None
            }
        }
    }

    fn enum_decl(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let (name, _) = self.expect_ident("for enum name")?;
        self.expect(TokenKind::LBrace, "after enum name")?;

        let mut elements = Vec::new();
        while self.cursor.check(TokenKind::Case) {
            elements.push(self.enum_element()?);
        }
        self.expect(TokenKind::RBrace, "at end of enum declaration")?;

        let elements = self.arena.alloc_list(&elements);
        Some(
            self.arena
                .alloc(NodeKind::Enum { name, elements }, self.span_from(start)),
        )
    }

    fn enum_element(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span; // `case`
        let (name, _) = self.expect_ident("for enum element name")?;

        let init = if self.at_op("=") {
            self.cursor.advance();
            Some(self.expression()?)
        } else {
            None
        };

        Some(
            self.arena
                .alloc(NodeKind::EnumElement { name, init }, self.span_from(start)),
        )
    }

    fn introduced_func(&mut self, kind: FuncKind) -> Option<NodeId> {
        self.cursor.advance(); // `prefix` / `infix` / `foreign` / `intrinsic`
        if !self.cursor.check(TokenKind::Func) {
            self.error_here("expected 'func' after function introducer");
            return None;
        }
        self.cursor.advance();
        self.func_decl(kind)
    }

    /// Parse a function declaration after its `func` keyword.
    fn func_decl(&mut self, kind: FuncKind) -> Option<NodeId> {
        let start = self.cursor.previous_span();
        let name = self.func_name(kind)?;

        self.expect(TokenKind::LParen, "before parameter list")?;
        let mut params = Vec::new();
        if !self.cursor.check(TokenKind::RParen) {
            loop {
                params.push(self.parameter()?);
                if self.cursor.check(TokenKind::RParen) {
                    break;
                }
                self.expect(TokenKind::Comma, "in parameter list")?;
            }
        }
        self.cursor.advance(); // `)`

        self.expect(TokenKind::Arrow, "before return type")?;
        let return_ty = self.type_ref()?;

        let body = if kind.has_body() {
            Some(self.block()?)
        } else {
            None
        };

        let params = self.arena.alloc_list(&params);
        Some(self.arena.alloc(
            NodeKind::Func {
                kind,
                name,
                params,
                return_ty,
                body,
            },
            self.span_from(start),
        ))
    }

    /// Operator functions are named by an operator lexeme, everything else
    /// by an identifier.
    fn func_name(&mut self, kind: FuncKind) -> Option<Name> {
        match kind {
            FuncKind::PrefixOp | FuncKind::InfixOp => match self.cursor.op_name() {
                Some(name) => {
                    self.cursor.advance();
                    Some(name)
                }
                None => {
                    self.error_here("expected operator lexeme as operator function name");
                    None
                }
            },
            _ => self.expect_ident("for function name").map(|(name, _)| name),
        }
    }

    fn parameter(&mut self) -> Option<NodeId> {
        let (name, start) = self.expect_ident("for parameter name")?;
        self.expect(TokenKind::Colon, "after parameter name")?;
        let ty = self.type_ref()?;
        Some(
            self.arena
                .alloc(NodeKind::Param { name, ty }, self.span_from(start)),
        )
    }

    fn struct_decl(&mut self) -> Option<NodeId> {
        let start = self.cursor.advance().span;
        let (name, _) = self.expect_ident("for struct name")?;
        let body = self.block()?;

        // The body must consist solely of variable declarations.
        let mut members = Vec::new();
        if let NodeKind::Block { stmts } = self.arena.kind(body) {
            for &stmt in self.arena.list(stmts) {
                members.push(stmt);
            }
        }
        for &member in &members {
            if !matches!(self.arena.kind(member), NodeKind::Var { .. }) {
                self.handler.error(
                    self.arena.span(member),
                    "only variable declarations are allowed inside a struct declaration",
                );
                return None;
            }
        }

        let members = self.arena.alloc_list(&members);
        Some(
            self.arena
                .alloc(NodeKind::Struct { name, members }, self.span_from(start)),
        )
    }

    pub(crate) fn variable_decl(&mut self) -> Option<NodeId> {
        let immutable = self.cursor.check(TokenKind::Let);
        let start = self.cursor.advance().span; // `var` / `let`
        let (name, _) = self.expect_ident("for variable name")?;
        self.expect(TokenKind::Colon, "after variable name")?;
        let ty = self.type_ref()?;

        let init = if self.at_op("=") {
            self.cursor.advance();
            Some(self.expression()?)
        } else {
            None
        };

        let decl = self.arena.alloc(
            NodeKind::Var {
                name,
                ty: Some(ty),
                init,
            },
            self.span_from(start),
        );
        if immutable {
            self.arena.set_flag(decl, NodeFlags::IMMUTABLE);
        }
        Some(decl)
    }
}
