//! Source renderer for AST dumps and round-trip tests.
//!
//! Prints an arena-backed tree back to parseable Mica source. Parentheses
//! are emitted from operator precedence, so parse → print → parse preserves
//! tree structure (grouping parentheses do not allocate nodes).

use crate::ast::{
    BinaryOp, CaseKind, ControlKind, ElseArm, FuncKind, LoopKind, NodeId, NodeKind, NodeRange,
    TypeOpKind,
};
use crate::{AstArena, Name, StringInterner};

/// Precedence tier used when choosing parentheses; mirrors the parser's
/// operator table.
fn binary_precedence(op: BinaryOp) -> u32 {
    match op {
        BinaryOp::Shl | BinaryOp::Shr => 900,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem | BinaryOp::BitAnd => 800,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::BitOr | BinaryOp::BitXor => 700,
        BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::Eq
        | BinaryOp::NotEq => 500,
        BinaryOp::LogicAnd => 400,
        BinaryOp::LogicOr => 300,
    }
}

const PREC_ATOM: u32 = 1000;
const PREC_UNARY: u32 = 950;
const PREC_TYPE_OP: u32 = 600;
const PREC_ASSIGN: u32 = 100;

/// Render one source unit (or any subtree) back to source text.
pub fn print(arena: &AstArena, interner: &StringInterner, root: NodeId) -> String {
    let mut printer = Printer {
        arena,
        interner,
        out: String::new(),
        indent: 0,
    };
    printer.node(root);
    printer.out
}

struct Printer<'a> {
    arena: &'a AstArena,
    interner: &'a StringInterner,
    out: String,
    indent: usize,
}

impl Printer<'_> {
    fn node(&mut self, id: NodeId) {
        match self.arena.kind(id) {
            NodeKind::SourceUnit { decls, .. } => {
                for &decl in self.arena.list(decls) {
                    self.stmt(decl);
                }
            }
            kind if kind.is_expr() => self.expr(id, 0),
            kind if kind.is_type_ref() => self.type_ref(id),
            _ => self.stmt(id),
        }
    }

    fn push_line(&mut self) {
        self.out.push('\n');
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn name(&mut self, name: Name) {
        self.out.push_str(self.interner.lookup(name));
    }

    // ---- Declarations and statements ----

    fn stmt(&mut self, id: NodeId) {
        self.pad();
        match self.arena.kind(id) {
            NodeKind::Load { literal, .. } => {
                self.out.push_str("#load ");
                self.expr(literal, 0);
            }
            NodeKind::Enum { name, elements } => {
                self.out.push_str("enum ");
                self.name(name);
                self.out.push_str(" {");
                self.push_line();
                self.indent += 1;
                for &element in self.arena.list(elements) {
                    self.pad();
                    if let NodeKind::EnumElement { name, init } = self.arena.kind(element) {
                        self.out.push_str("case ");
                        self.name(name);
                        if let Some(init) = init {
                            // Skip initializers synthesized during validation.
                            if !self.arena.span(init).is_dummy() {
                                self.out.push_str(" = ");
                                self.expr(init, 0);
                            }
                        }
                    }
                    self.push_line();
                }
                self.indent -= 1;
                self.pad();
                self.out.push('}');
            }
            NodeKind::Func {
                kind,
                name,
                params,
                return_ty,
                body,
            } => {
                match kind {
                    FuncKind::Plain => {}
                    FuncKind::PrefixOp => self.out.push_str("prefix "),
                    FuncKind::InfixOp => self.out.push_str("infix "),
                    FuncKind::Foreign => self.out.push_str("foreign "),
                    FuncKind::Intrinsic => self.out.push_str("intrinsic "),
                }
                self.out.push_str("func ");
                self.name(name);
                self.out.push('(');
                self.comma_separated_params(params);
                self.out.push_str(") -> ");
                self.type_ref(return_ty);
                if let Some(body) = body {
                    self.out.push(' ');
                    self.block(body);
                }
            }
            NodeKind::Struct { name, members } => {
                self.out.push_str("struct ");
                self.name(name);
                self.out.push_str(" {");
                self.push_line();
                self.indent += 1;
                for &member in self.arena.list(members) {
                    self.stmt(member);
                }
                self.indent -= 1;
                self.pad();
                self.out.push('}');
            }
            NodeKind::Var { name, ty, init } => {
                let keyword = if self.arena.has_flag(id, crate::NodeFlags::IMMUTABLE) {
                    "let "
                } else {
                    "var "
                };
                self.out.push_str(keyword);
                self.name(name);
                if let Some(ty) = ty {
                    self.out.push_str(": ");
                    self.type_ref(ty);
                }
                if let Some(init) = init {
                    self.out.push_str(" = ");
                    self.expr(init, 0);
                }
            }
            NodeKind::Control {
                kind, result: value, ..
            } => {
                self.out.push_str(kind.keyword());
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value, 0);
                }
            }
            NodeKind::Defer { expr } => {
                self.out.push_str("defer ");
                self.expr(expr, 0);
            }
            NodeKind::If { .. } => self.if_chain(id),
            NodeKind::Loop {
                kind,
                conditions,
                body,
            } => match kind {
                LoopKind::While => {
                    self.out.push_str("while ");
                    self.comma_separated_exprs(conditions);
                    self.out.push(' ');
                    self.block(body);
                }
                LoopKind::DoWhile => {
                    self.out.push_str("do ");
                    self.block(body);
                    self.out.push_str(" while ");
                    self.comma_separated_exprs(conditions);
                }
            },
            NodeKind::For {
                element,
                sequence,
                body,
            } => {
                self.out.push_str("for ");
                if let NodeKind::Var { name, .. } = self.arena.kind(element) {
                    self.name(name);
                }
                self.out.push_str(" in ");
                self.expr(sequence, 0);
                self.out.push(' ');
                self.block(body);
            }
            NodeKind::Guard {
                conditions,
                else_block,
            } => {
                self.out.push_str("guard ");
                self.comma_separated_exprs(conditions);
                self.out.push_str(" else ");
                self.block(else_block);
            }
            NodeKind::Switch { argument, cases } => {
                self.out.push_str("switch ");
                self.expr(argument, 0);
                self.out.push_str(" {");
                self.push_line();
                for &case in self.arena.list(cases) {
                    if let NodeKind::Case {
                        kind,
                        condition,
                        body,
                        ..
                    } = self.arena.kind(case)
                    {
                        self.pad();
                        match kind {
                            CaseKind::Conditional => {
                                self.out.push_str("case ");
                                if let Some(condition) = condition {
                                    self.expr(condition, 0);
                                }
                            }
                            CaseKind::Else => self.out.push_str("else"),
                        }
                        self.out.push(':');
                        self.push_line();
                        self.indent += 1;
                        if let NodeKind::Block { stmts } = self.arena.kind(body) {
                            for &stmt in self.arena.list(stmts) {
                                self.stmt(stmt);
                            }
                        }
                        self.indent -= 1;
                    }
                }
                self.pad();
                self.out.push('}');
            }
            NodeKind::Block { .. } => self.block(id),
            _ => {
                // Expression statement.
                self.expr(id, 0);
            }
        }
        self.push_line();
    }

    fn if_chain(&mut self, id: NodeId) {
        if let NodeKind::If {
            conditions,
            then_block,
            else_arm,
        } = self.arena.kind(id)
        {
            self.out.push_str("if ");
            self.comma_separated_exprs(conditions);
            self.out.push(' ');
            self.block(then_block);
            match else_arm {
                ElseArm::None => {}
                ElseArm::Block(block) => {
                    self.out.push_str(" else ");
                    self.block(block);
                }
                ElseArm::If(nested) => {
                    self.out.push_str(" else ");
                    self.if_chain(nested);
                }
            }
        }
    }

    fn block(&mut self, id: NodeId) {
        self.out.push('{');
        if let NodeKind::Block { stmts } = self.arena.kind(id) {
            let stmts: Vec<NodeId> = self.arena.list(stmts).to_vec();
            if stmts.is_empty() {
                self.out.push('}');
                return;
            }
            self.push_line();
            self.indent += 1;
            for stmt in stmts {
                self.stmt(stmt);
            }
            self.indent -= 1;
            self.pad();
        }
        self.out.push('}');
    }

    fn comma_separated_exprs(&mut self, range: NodeRange) {
        let ids: Vec<NodeId> = self.arena.list(range).to_vec();
        for (i, id) in ids.into_iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(id, 0);
        }
    }

    fn comma_separated_params(&mut self, range: NodeRange) {
        let ids: Vec<NodeId> = self.arena.list(range).to_vec();
        for (i, id) in ids.into_iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            if let NodeKind::Param { name, ty } = self.arena.kind(id) {
                self.name(name);
                self.out.push_str(": ");
                self.type_ref(ty);
            }
        }
    }

    // ---- Expressions ----

    fn expr_precedence(&self, id: NodeId) -> u32 {
        match self.arena.kind(id) {
            NodeKind::Unary { .. } => PREC_UNARY,
            NodeKind::Binary { op, .. } => binary_precedence(op),
            NodeKind::Assign { .. } => PREC_ASSIGN,
            NodeKind::TypeOp { .. } => PREC_TYPE_OP,
            _ => PREC_ATOM,
        }
    }

    /// Print an expression, parenthesizing when its precedence is below the
    /// context's requirement.
    fn expr(&mut self, id: NodeId, min_prec: u32) {
        let prec = self.expr_precedence(id);
        let parens = prec < min_prec;
        if parens {
            self.out.push('(');
        }
        match self.arena.kind(id) {
            NodeKind::Nil => self.out.push_str("nil"),
            NodeKind::Bool(true) => self.out.push_str("true"),
            NodeKind::Bool(false) => self.out.push_str("false"),
            NodeKind::Int(value) => {
                self.out.push_str(&value.to_string());
            }
            NodeKind::Float(bits) => {
                self.out.push_str(&format!("{:?}", f64::from_bits(bits)));
            }
            NodeKind::Str(value) => {
                self.out.push('"');
                for c in self.interner.lookup_static(value).chars() {
                    match c {
                        '"' => self.out.push_str("\\\""),
                        '\\' => self.out.push_str("\\\\"),
                        '\n' => self.out.push_str("\\n"),
                        '\t' => self.out.push_str("\\t"),
                        '\r' => self.out.push_str("\\r"),
                        '\0' => self.out.push_str("\\0"),
                        c => self.out.push(c),
                    }
                }
                self.out.push('"');
            }
            NodeKind::Ident { name, .. } => self.name(name),
            NodeKind::Member { base, name, .. } => {
                self.expr(base, PREC_ATOM);
                self.out.push('.');
                self.name(name);
            }
            NodeKind::Unary { op, operand, .. } => {
                self.out.push_str(op.lexeme());
                // A nested unary must not fuse with this operator's lexeme
                // (`--a` would re-lex as one operator).
                if matches!(self.arena.kind(operand), NodeKind::Unary { .. }) {
                    self.out.push('(');
                    self.expr(operand, 0);
                    self.out.push(')');
                } else {
                    self.expr(operand, PREC_UNARY);
                }
            }
            NodeKind::Binary { op, lhs, rhs, .. } => {
                self.expr(lhs, prec);
                self.out.push(' ');
                self.out.push_str(op.lexeme());
                self.out.push(' ');
                self.expr(rhs, prec + 1);
            }
            NodeKind::Assign { op, lhs, rhs } => {
                self.expr(lhs, prec + 1);
                self.out.push(' ');
                if let Some(op) = op {
                    self.out.push_str(op.lexeme());
                }
                self.out.push_str("= ");
                self.expr(rhs, prec);
            }
            NodeKind::Call { callee, args } => {
                self.expr(callee, PREC_ATOM);
                self.out.push('(');
                self.comma_separated_exprs(args);
                self.out.push(')');
            }
            NodeKind::Subscript { base, args } => {
                self.expr(base, PREC_ATOM);
                self.out.push('[');
                self.comma_separated_exprs(args);
                self.out.push(']');
            }
            NodeKind::SizeOf { ty } => {
                self.out.push_str("sizeof(");
                self.type_ref(ty);
                self.out.push(')');
            }
            NodeKind::TypeOp { kind, expr, ty } => {
                self.expr(expr, PREC_TYPE_OP);
                self.out.push_str(match kind {
                    TypeOpKind::Bitcast => " as ",
                    TypeOpKind::Check => " is ",
                });
                self.type_ref(ty);
            }
            _ => {}
        }
        if parens {
            self.out.push(')');
        }
    }

    // ---- Type references ----

    fn type_ref(&mut self, id: NodeId) {
        match self.arena.kind(id) {
            NodeKind::TypeAny => self.out.push_str("Any"),
            NodeKind::TypeName { name, .. } => self.name(name),
            NodeKind::TypeOf { expr } => {
                self.out.push_str("typeof(");
                self.expr(expr, 0);
                self.out.push(')');
            }
            NodeKind::TypePointer { pointee, depth } => {
                self.type_ref(pointee);
                for _ in 0..depth {
                    self.out.push('*');
                }
            }
            NodeKind::TypeArray { element, size, .. } => {
                self.type_ref(element);
                self.out.push('[');
                if let Some(size) = size {
                    self.expr(size, 0);
                }
                self.out.push(']');
            }
            _ => {}
        }
    }
}
