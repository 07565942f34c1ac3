//! The name resolution pass.
//!
//! Three sweeps over each module, top-down:
//!
//! 1. **declare** - insert every top-level symbol into the global scope and
//!    register named types (structures, enumerations, their elements), so
//!    later sweeps can reference any of them regardless of source order.
//! 2. **materialize** - resolve the type references of signatures: function
//!    parameter/return types, structure member types, global variable types.
//! 3. **resolve** - walk bodies and initializers, pushing scopes, binding
//!    identifiers as of their own source position, resolving operators
//!    against declared overloads and computing every expression's type.
//!
//! Failures become diagnostics and seed the error type through the
//! offending node; enclosing expressions treat the error type as compatible
//! with everything so one mistake is reported once.

use tracing::debug;

use mica_diagnostic::Handler;
use mica_ir::{
    AstArena, BinaryOp, ElseArm, FuncKind, Module, Name, NodeFlags, NodeId, NodeKind,
    StringInterner, TypeId, TypeOpKind, UnaryOp,
};
use mica_types::{Type, TypeTable};

use crate::scope::{ScopeKind, ScopeTree};

/// A user-declared operator function overload.
struct OpFunc {
    name: Name,
    decl: NodeId,
}

/// The resolver for one module.
pub struct Resolver<'a> {
    arena: &'a mut AstArena,
    scopes: &'a mut ScopeTree,
    types: &'a mut TypeTable,
    interner: &'a StringInterner,
    handler: &'a Handler,
    prefix_ops: Vec<OpFunc>,
    infix_ops: Vec<OpFunc>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        arena: &'a mut AstArena,
        scopes: &'a mut ScopeTree,
        types: &'a mut TypeTable,
        interner: &'a StringInterner,
        handler: &'a Handler,
    ) -> Self {
        Resolver {
            arena,
            scopes,
            types,
            interner,
            handler,
            prefix_ops: Vec::new(),
            infix_ops: Vec::new(),
        }
    }

    /// Resolve a whole module.
    pub fn resolve_module(&mut self, module: &Module) {
        debug!(units = module.units.len(), "resolving module");

        // All nested scopes hang off one Module scope; top-level symbols
        // live in the global scope so they are visible throughout.
        self.scopes.push(ScopeKind::Module);

        for &unit in &module.units {
            self.declare_unit(unit);
        }
        for &unit in &module.units {
            self.materialize_unit(unit);
        }
        for &unit in &module.units {
            self.resolve_unit(unit);
        }

        self.scopes.pop();
    }

    fn error_type(&self) -> TypeId {
        self.types.error()
    }

    fn text(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    fn declare_global(&mut self, name: Name, node: NodeId) {
        let span = self.arena.span(node);
        if !self
            .scopes
            .insert(mica_ir::ScopeId::GLOBAL, name, span, node)
        {
            self.handler.error(
                span,
                format!("invalid redeclaration of '{}'", self.text(name)),
            );
        }
    }

    // ---- Sweep 1: declare ----

    fn declare_unit(&mut self, unit: NodeId) {
        self.arena.set_scope(unit, mica_ir::ScopeId::GLOBAL);
        let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
            return;
        };
        for &decl in collect(self.arena, decls).iter() {
            match self.arena.kind(decl) {
                NodeKind::Enum { name, elements } => {
                    self.declare_global(name, decl);
                    let ty = self.types.enumeration(name, decl);
                    self.arena.set_ty(decl, ty);
                    // Elements are unqualified constants: visible both
                    // through `E.element` and plainly in the global scope.
                    for &element in collect(self.arena, elements).iter() {
                        if let NodeKind::EnumElement { name, .. } = self.arena.kind(element) {
                            self.declare_global(name, element);
                            self.arena.set_ty(element, ty);
                        }
                    }
                }
                NodeKind::Struct { name, .. } => {
                    self.declare_global(name, decl);
                    let ty = self.types.structure(name, decl);
                    self.arena.set_ty(decl, ty);
                }
                NodeKind::Func { kind, name, .. } => match kind {
                    FuncKind::PrefixOp => self.prefix_ops.push(OpFunc { name, decl }),
                    FuncKind::InfixOp => self.infix_ops.push(OpFunc { name, decl }),
                    _ => self.declare_global(name, decl),
                },
                NodeKind::Var { name, .. } => self.declare_global(name, decl),
                _ => {}
            }
        }
    }

    // ---- Sweep 2: materialize signature types ----

    fn materialize_unit(&mut self, unit: NodeId) {
        let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
            return;
        };
        for &decl in collect(self.arena, decls).iter() {
            match self.arena.kind(decl) {
                NodeKind::Struct { members, .. } => {
                    let struct_ty = match self.arena.ty(decl) {
                        Some(ty) => ty,
                        None => continue,
                    };
                    let mut resolved = Vec::new();
                    for &member in collect(self.arena, members).iter() {
                        if let NodeKind::Var {
                            name,
                            ty: Some(ty_ref),
                            ..
                        } = self.arena.kind(member)
                        {
                            let ty = self.resolve_type_ref(ty_ref);
                            self.arena.set_ty(member, ty);
                            resolved.push(mica_types::StructMember { name, ty });
                        }
                    }
                    self.types.set_struct_members(struct_ty, resolved);
                }
                NodeKind::Func {
                    params, return_ty, ..
                } => {
                    let mut param_types = Vec::new();
                    for &param in collect(self.arena, params).iter() {
                        if let NodeKind::Param { ty: ty_ref, .. } = self.arena.kind(param) {
                            let ty = self.resolve_type_ref(ty_ref);
                            self.arena.set_ty(param, ty);
                            param_types.push(ty);
                        }
                    }
                    let ret = self.resolve_type_ref(return_ty);
                    let fn_ty = self.types.function(param_types, ret, Some(decl));
                    self.arena.set_ty(decl, fn_ty);
                }
                NodeKind::Var {
                    ty: Some(ty_ref), ..
                } => {
                    let ty = self.resolve_type_ref(ty_ref);
                    self.arena.set_ty(decl, ty);
                }
                _ => {}
            }
        }
    }

    // ---- Sweep 3: bodies and initializers ----

    fn resolve_unit(&mut self, unit: NodeId) {
        let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
            return;
        };
        for &decl in collect(self.arena, decls).iter() {
            self.resolve_top_level(decl);
        }
    }

    fn resolve_top_level(&mut self, decl: NodeId) {
        self.arena.set_scope(decl, self.scopes.current());
        match self.arena.kind(decl) {
            NodeKind::Load { literal, .. } => {
                self.resolve_expr(literal);
            }
            NodeKind::Enum { elements, .. } => {
                let scope = self.scopes.push(ScopeKind::Enumeration);
                self.scopes.set_anchor(scope, decl);
                for &element in collect(self.arena, elements).iter() {
                    self.arena.set_scope(element, scope);
                    if let NodeKind::EnumElement { name, init } = self.arena.kind(element) {
                        let span = self.arena.span(element);
                        self.scopes.insert(scope, name, span, element);
                        if let Some(init) = init {
                            self.resolve_expr(init);
                        }
                    }
                }
                self.scopes.pop();
            }
            NodeKind::Struct { members, .. } => {
                let scope = self.scopes.push(ScopeKind::Structure);
                self.scopes.set_anchor(scope, decl);
                for &member in collect(self.arena, members).iter() {
                    self.arena.set_scope(member, scope);
                    if let NodeKind::Var { name, init, .. } = self.arena.kind(member) {
                        let span = self.arena.span(member);
                        self.scopes.insert(scope, name, span, member);
                        if let Some(init) = init {
                            self.resolve_expr(init);
                        }
                    }
                }
                self.scopes.pop();
            }
            NodeKind::Func { params, body, .. } => {
                let scope = self.scopes.push(ScopeKind::Function);
                self.scopes.set_anchor(scope, decl);
                for &param in collect(self.arena, params).iter() {
                    self.arena.set_scope(param, scope);
                    if let NodeKind::Param { name, .. } = self.arena.kind(param) {
                        let span = self.arena.span(param);
                        if !self.scopes.insert(scope, name, span, param) {
                            self.handler.error(
                                span,
                                format!("invalid redeclaration of parameter '{}'", self.text(name)),
                            );
                        }
                    }
                }
                if let Some(body) = body {
                    self.resolve_block(body);
                }
                self.scopes.pop();
            }
            NodeKind::Var { init, .. } => {
                if let Some(init) = init {
                    self.resolve_expr(init);
                }
            }
            _ => {}
        }
    }

    fn resolve_block(&mut self, block: NodeId) {
        self.arena.set_scope(block, self.scopes.current());
        if let NodeKind::Block { stmts } = self.arena.kind(block) {
            for &stmt in collect(self.arena, stmts).iter() {
                self.resolve_stmt(stmt);
            }
        }
    }

    fn resolve_stmt(&mut self, stmt: NodeId) {
        self.arena.set_scope(stmt, self.scopes.current());
        match self.arena.kind(stmt) {
            NodeKind::Var {
                name,
                ty: ty_ref,
                init,
            } => {
                let span = self.arena.span(stmt);
                if !self.scopes.insert_current(name, span, stmt) {
                    self.handler.error(
                        span,
                        format!("invalid redeclaration of '{}'", self.text(name)),
                    );
                }
                let declared = match ty_ref {
                    Some(ty_ref) => self.resolve_type_ref(ty_ref),
                    None => self.error_type(),
                };
                self.arena.set_ty(stmt, declared);
                if let Some(init) = init {
                    self.resolve_expr(init);
                }
            }
            NodeKind::Block { .. } => self.resolve_block(stmt),
            NodeKind::If {
                conditions,
                then_block,
                else_arm,
            } => {
                for &cond in collect(self.arena, conditions).iter() {
                    self.resolve_expr(cond);
                }
                let scope = self.scopes.push(ScopeKind::Branch);
                self.scopes.set_anchor(scope, stmt);
                self.resolve_block(then_block);
                self.scopes.pop();
                match else_arm {
                    ElseArm::None => {}
                    ElseArm::Block(block) => {
                        let scope = self.scopes.push(ScopeKind::Branch);
                        self.scopes.set_anchor(scope, stmt);
                        self.resolve_block(block);
                        self.scopes.pop();
                    }
                    ElseArm::If(nested) => self.resolve_stmt(nested),
                }
            }
            NodeKind::Loop {
                conditions, body, ..
            } => {
                for &cond in collect(self.arena, conditions).iter() {
                    self.resolve_expr(cond);
                }
                let scope = self.scopes.push(ScopeKind::Loop);
                self.scopes.set_anchor(scope, stmt);
                self.resolve_block(body);
                self.scopes.pop();
            }
            NodeKind::For {
                element,
                sequence,
                body,
            } => {
                let sequence_ty = self.resolve_expr(sequence);
                let scope = self.scopes.push(ScopeKind::Loop);
                self.scopes.set_anchor(scope, stmt);
                self.arena.set_scope(element, scope);

                let element_ty = match self.types.get(sequence_ty) {
                    Type::StaticArray { element, .. } | Type::DynamicArray { element } => *element,
                    _ => self.error_type(),
                };
                self.arena.set_ty(element, element_ty);
                if let NodeKind::Var { name, .. } = self.arena.kind(element) {
                    let span = self.arena.span(element);
                    self.scopes.insert(scope, name, span, element);
                }

                self.resolve_block(body);
                self.scopes.pop();
            }
            NodeKind::Guard {
                conditions,
                else_block,
            } => {
                for &cond in collect(self.arena, conditions).iter() {
                    self.resolve_expr(cond);
                }
                let scope = self.scopes.push(ScopeKind::Branch);
                self.scopes.set_anchor(scope, stmt);
                self.resolve_block(else_block);
                self.scopes.pop();
            }
            NodeKind::Switch { argument, cases } => {
                self.resolve_expr(argument);
                let switch_scope = self.scopes.push(ScopeKind::Switch);
                self.scopes.set_anchor(switch_scope, stmt);
                for &case in collect(self.arena, cases).iter() {
                    self.arena.set_scope(case, switch_scope);
                    if let NodeKind::Case {
                        condition, body, ..
                    } = self.arena.kind(case)
                    {
                        if let Some(condition) = condition {
                            self.resolve_expr(condition);
                        }
                        let case_scope = self.scopes.push(ScopeKind::Case);
                        self.scopes.set_anchor(case_scope, case);
                        self.resolve_block(body);
                        self.scopes.pop();
                    }
                }
                self.scopes.pop();
            }
            NodeKind::Control { result, .. } => {
                if let Some(result) = result {
                    self.resolve_expr(result);
                }
            }
            NodeKind::Defer { expr } => {
                self.resolve_expr(expr);
            }
            kind if kind.is_expr() => {
                self.resolve_expr(stmt);
            }
            _ => {}
        }
    }

    // ---- Expressions ----

    /// Resolve an expression, binding names and computing its type.
    fn resolve_expr(&mut self, expr: NodeId) -> TypeId {
        self.arena.set_scope(expr, self.scopes.current());
        let ty = match self.arena.kind(expr) {
            NodeKind::Nil => self.types.nil_pointer(),
            NodeKind::Bool(_) => self.types.bool_(),
            NodeKind::Int(_) => self.types.int(),
            NodeKind::Float(_) => self.types.float(),
            NodeKind::Str(_) => self.types.string(),
            NodeKind::Ident { name, .. } => self.resolve_ident(expr, name),
            NodeKind::Member { base, name, .. } => self.resolve_member(expr, base, name),
            NodeKind::Unary { op, operand, .. } => self.resolve_unary(expr, op, operand),
            NodeKind::Binary { op, lhs, rhs, .. } => self.resolve_binary(expr, op, lhs, rhs),
            NodeKind::Assign { lhs, rhs, .. } => {
                self.resolve_expr(lhs);
                self.resolve_expr(rhs);
                self.types.void()
            }
            NodeKind::Call { callee, args } => self.resolve_call(expr, callee, args),
            NodeKind::Subscript { base, args } => self.resolve_subscript(expr, base, args),
            NodeKind::SizeOf { ty } => {
                self.resolve_type_ref(ty);
                self.types.int()
            }
            NodeKind::TypeOp { kind, expr: sub, ty } => {
                self.resolve_expr(sub);
                let target = self.resolve_type_ref(ty);
                match kind {
                    TypeOpKind::Bitcast => target,
                    TypeOpKind::Check => self.types.bool_(),
                }
            }
            _ => self.error_type(),
        };
        self.arena.set_ty(expr, ty);
        ty
    }

    fn resolve_ident(&mut self, expr: NodeId, name: Name) -> TypeId {
        let span = self.arena.span(expr);
        let found = self
            .scopes
            .lookup_as_of(self.scopes.current(), name, span.start)
            .and_then(|symbol| symbol.node);
        match found {
            Some(decl) => {
                if let NodeKind::Ident { decl: slot, .. } = self.arena.kind_mut(expr) {
                    *slot = Some(decl);
                }
                self.arena.ty(decl).unwrap_or_else(|| self.error_type())
            }
            None => {
                self.handler.error(
                    span,
                    format!("use of unresolved identifier '{}'", self.text(name)),
                );
                self.error_type()
            }
        }
    }

    fn resolve_member(&mut self, expr: NodeId, base: NodeId, name: Name) -> TypeId {
        let base_ty = self.resolve_expr(base);
        if self.types.is_error(base_ty) {
            return self.error_type();
        }

        // Enumeration element access: `Mode.Idle`.
        if let Type::Enum { decl, .. } = self.types.get(base_ty) {
            let decl = *decl;
            // Only a direct type reference selects elements; a value of
            // enum type has no members.
            if self.base_is_type_reference(base, decl) {
                if let NodeKind::Enum { elements, .. } = self.arena.kind(decl) {
                    let elements = collect(self.arena, elements);
                    for (idx, &element) in elements.iter().enumerate() {
                        if let NodeKind::EnumElement {
                            name: element_name, ..
                        } = self.arena.kind(element)
                        {
                            if element_name == name {
                                if let NodeKind::Member { index, .. } = self.arena.kind_mut(expr) {
                                    *index = Some(idx as u32);
                                }
                                return base_ty;
                            }
                        }
                    }
                }
                self.handler.error(
                    self.arena.span(expr),
                    format!(
                        "enumeration '{}' has no element '{}'",
                        self.types.display(base_ty),
                        self.text(name)
                    ),
                );
                return self.error_type();
            }
        }

        // Structure member access, with one implicit dereference.
        let struct_ty = match self.types.get(base_ty) {
            Type::Struct { .. } => base_ty,
            Type::Pointer { pointee, depth: 1 } => *pointee,
            _ => {
                self.handler.error(
                    self.arena.span(expr),
                    format!(
                        "value of type '{}' has no member '{}'",
                        self.types.display(base_ty),
                        self.text(name)
                    ),
                );
                return self.error_type();
            }
        };
        match self.types.struct_member(struct_ty, name) {
            Some((index, member_ty)) => {
                if let NodeKind::Member { index: slot, .. } = self.arena.kind_mut(expr) {
                    *slot = Some(index);
                }
                member_ty
            }
            None => {
                self.handler.error(
                    self.arena.span(expr),
                    format!(
                        "value of type '{}' has no member '{}'",
                        self.types.display(struct_ty),
                        self.text(name)
                    ),
                );
                self.error_type()
            }
        }
    }

    /// Whether a member-access base is a direct reference to the type
    /// declaration itself (`Mode.Idle`) rather than a value of that type.
    fn base_is_type_reference(&self, base: NodeId, type_decl: NodeId) -> bool {
        matches!(
            self.arena.kind(base),
            NodeKind::Ident { decl: Some(decl), .. } if decl == type_decl
        )
    }

    fn resolve_unary(&mut self, expr: NodeId, op: UnaryOp, operand: NodeId) -> TypeId {
        let operand_ty = self.resolve_expr(operand);
        if self.types.is_error(operand_ty) {
            return self.error_type();
        }

        if let Some((decl, ret)) = self.resolve_op_overload(expr, op.lexeme(), &[operand_ty], true)
        {
            if let NodeKind::Unary { op_fn, .. } = self.arena.kind_mut(expr) {
                *op_fn = Some(decl);
            }
            return ret;
        }

        let ok = match op {
            UnaryOp::Not => matches!(self.types.get(operand_ty), Type::Bool),
            UnaryOp::BitNot => self.types.is_integer(operand_ty),
            UnaryOp::Plus | UnaryOp::Neg => {
                self.types.is_integer(operand_ty) || self.types.get(operand_ty).is_float()
            }
        };
        if ok {
            operand_ty
        } else {
            self.handler.error(
                self.arena.span(expr),
                format!(
                    "no matching operator function for '{}' with operand type '{}'",
                    op.lexeme(),
                    self.types.display(operand_ty)
                ),
            );
            self.error_type()
        }
    }

    fn resolve_binary(&mut self, expr: NodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> TypeId {
        let lhs_ty = self.resolve_expr(lhs);
        let rhs_ty = self.resolve_expr(rhs);
        if self.types.is_error(lhs_ty) || self.types.is_error(rhs_ty) {
            return self.error_type();
        }

        if let Some((decl, ret)) =
            self.resolve_op_overload(expr, op.lexeme(), &[lhs_ty, rhs_ty], false)
        {
            if let NodeKind::Binary { op_fn, .. } = self.arena.kind_mut(expr) {
                *op_fn = Some(decl);
            }
            return ret;
        }

        let same = lhs_ty == rhs_ty;
        let result = if op.is_logical() {
            (same && matches!(self.types.get(lhs_ty), Type::Bool)).then(|| self.types.bool_())
        } else if op.is_comparison() {
            let comparable = same
                || self.nil_comparison(lhs, lhs_ty, rhs, rhs_ty)
                || self.types.is_implicitly_convertible(lhs_ty, rhs_ty)
                || self.types.is_implicitly_convertible(rhs_ty, lhs_ty);
            comparable.then(|| self.types.bool_())
        } else if op.is_bitwise() {
            (same && self.types.is_integer(lhs_ty)).then_some(lhs_ty)
        } else {
            // Arithmetic.
            (same && (self.types.is_integer(lhs_ty) || self.types.get(lhs_ty).is_float()))
                .then_some(lhs_ty)
        };

        result.unwrap_or_else(|| {
            self.handler.error(
                self.arena.span(expr),
                format!(
                    "no matching operator function for '{}' with operand types '{}' and '{}'",
                    op.lexeme(),
                    self.types.display(lhs_ty),
                    self.types.display(rhs_ty)
                ),
            );
            self.error_type()
        })
    }

    /// Whether one side is the `nil` constant and the other a pointer.
    fn nil_comparison(&self, lhs: NodeId, lhs_ty: TypeId, rhs: NodeId, rhs_ty: TypeId) -> bool {
        (matches!(self.arena.kind(lhs), NodeKind::Nil) && self.types.is_pointer(rhs_ty))
            || (matches!(self.arena.kind(rhs), NodeKind::Nil) && self.types.is_pointer(lhs_ty))
    }

    /// Match a user-declared operator function by lexeme and operand types.
    ///
    /// Candidate overload types are recorded on the expression node.
    fn resolve_op_overload(
        &mut self,
        expr: NodeId,
        lexeme: &str,
        operands: &[TypeId],
        prefix: bool,
    ) -> Option<(NodeId, TypeId)> {
        let registry = if prefix {
            &self.prefix_ops
        } else {
            &self.infix_ops
        };
        let mut candidates = Vec::new();
        let mut winner = None;
        for op_func in registry {
            if self.interner.lookup(op_func.name) != lexeme {
                continue;
            }
            let Some(fn_ty) = self.arena.ty(op_func.decl) else {
                continue;
            };
            candidates.push(fn_ty);
            if winner.is_some() {
                continue;
            }
            if let Type::Function { params, ret, .. } = self.types.get(fn_ty) {
                if params.as_slice() == operands {
                    winner = Some((op_func.decl, *ret));
                }
            }
        }
        if !candidates.is_empty() {
            self.arena.set_candidates(expr, candidates);
        }
        winner
    }

    fn resolve_call(&mut self, expr: NodeId, callee: NodeId, args: mica_ir::NodeRange) -> TypeId {
        let callee_ty = self.resolve_expr(callee);
        for &arg in collect(self.arena, args).iter() {
            self.resolve_expr(arg);
        }

        let unwrapped = match self.types.get(callee_ty) {
            Type::Pointer { pointee, depth: 1 } => *pointee,
            _ => callee_ty,
        };
        match self.types.get(unwrapped) {
            Type::Function { ret, .. } => {
                self.arena.set_candidates(expr, vec![unwrapped]);
                *ret
            }
            // Non-function callees are diagnosed by the type checker.
            _ => self.error_type(),
        }
    }

    fn resolve_subscript(
        &mut self,
        expr: NodeId,
        base: NodeId,
        args: mica_ir::NodeRange,
    ) -> TypeId {
        let base_ty = self.resolve_expr(base);
        for &arg in collect(self.arena, args).iter() {
            self.resolve_expr(arg);
        }
        match self.types.get(base_ty) {
            Type::StaticArray { element, .. } | Type::DynamicArray { element } => *element,
            Type::Error => self.error_type(),
            _ => {
                self.handler.error(
                    self.arena.span(expr),
                    format!(
                        "cannot subscript a value of type '{}'",
                        self.types.display(base_ty)
                    ),
                );
                self.error_type()
            }
        }
    }

    // ---- Type references ----

    /// Resolve a type-reference node to a canonical type.
    pub fn resolve_type_ref(&mut self, type_ref: NodeId) -> TypeId {
        self.arena.set_scope(type_ref, self.scopes.current());
        let ty = match self.arena.kind(type_ref) {
            NodeKind::TypeAny => self.types.any(),
            NodeKind::TypeName { name, .. } => self.resolve_type_name(type_ref, name),
            NodeKind::TypeOf { expr } => self.resolve_expr(expr),
            NodeKind::TypePointer { pointee, depth } => {
                let inner = self.resolve_type_ref(pointee);
                if self.types.is_error(inner) {
                    inner
                } else {
                    self.types.pointer(inner, depth)
                }
            }
            NodeKind::TypeArray { element, size, .. } => {
                let inner = self.resolve_type_ref(element);
                let size_value = match size {
                    Some(size) => {
                        self.resolve_expr(size);
                        match self.arena.kind(size) {
                            NodeKind::Int(value) => Some(value),
                            // Non-literal sizes are diagnosed during module
                            // validation; treat as dynamic here.
                            _ => None,
                        }
                    }
                    None => None,
                };
                if self.types.is_error(inner) {
                    inner
                } else if let Some(len) = size_value {
                    self.arena.set_flag(type_ref, NodeFlags::STATIC_ARRAY);
                    if let NodeKind::TypeArray { len: slot, .. } = self.arena.kind_mut(type_ref) {
                        *slot = Some(len);
                    }
                    self.types.static_array(inner, len)
                } else {
                    self.types.dynamic_array(inner)
                }
            }
            _ => self.error_type(),
        };
        self.arena.set_ty(type_ref, ty);
        ty
    }

    fn resolve_type_name(&mut self, type_ref: NodeId, name: Name) -> TypeId {
        if let Some(builtin) = self.types.builtin_by_name(name) {
            return builtin;
        }
        let span = self.arena.span(type_ref);
        let found = self
            .scopes
            .lookup_as_of(self.scopes.current(), name, span.start)
            .and_then(|symbol| symbol.node);
        match found {
            Some(decl)
                if matches!(
                    self.arena.kind(decl),
                    NodeKind::Struct { .. } | NodeKind::Enum { .. }
                ) =>
            {
                if let NodeKind::TypeName { decl: slot, .. } = self.arena.kind_mut(type_ref) {
                    *slot = Some(decl);
                }
                self.arena.ty(decl).unwrap_or_else(|| self.error_type())
            }
            Some(_) => {
                self.handler.error(
                    span,
                    format!("'{}' is not a type", self.text(name)),
                );
                self.error_type()
            }
            None => {
                self.handler.error(
                    span,
                    format!("use of unresolved type name '{}'", self.text(name)),
                );
                self.error_type()
            }
        }
    }
}

/// Copy a node list out of the arena so the borrow does not pin it while
/// resolution mutates other arena state.
fn collect(arena: &AstArena, range: mica_ir::NodeRange) -> Vec<NodeId> {
    arena.list(range).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_ir::SharedInterner;
    use mica_parse::{parse_source_unit, OperatorTable};

    struct Resolved {
        arena: AstArena,
        scopes: ScopeTree,
        types: TypeTable,
        handler: Handler,
        interner: SharedInterner,
        unit: NodeId,
    }

    fn resolve(source: &str) -> Resolved {
        let interner = SharedInterner::new();
        let tokens = mica_lexer::lex(source, 0, &interner);
        let ops = OperatorTable::new(&interner);
        let handler = Handler::new();
        let mut arena = AstArena::new();
        let unit = parse_source_unit(
            interner.intern("test.mica"),
            &tokens,
            &mut arena,
            &ops,
            &interner,
            &handler,
        );
        assert!(!handler.has_errors(), "parse failed: {:?}", handler.collected());

        let mut module = Module::new(interner.intern("test"), interner.intern("main"));
        module.units.push(unit);

        let mut scopes = ScopeTree::new();
        let mut types = TypeTable::new(interner.clone());
        Resolver::new(&mut arena, &mut scopes, &mut types, &interner, &handler)
            .resolve_module(&module);

        Resolved {
            arena,
            scopes,
            types,
            handler,
            interner,
            unit,
        }
    }

    impl Resolved {
        fn messages(&self) -> Vec<String> {
            self.handler
                .collected()
                .into_iter()
                .map(|d| d.message)
                .collect()
        }

        fn find_ident(&self, name: &str) -> NodeId {
            let name = self.interner.intern(name);
            for (id, kind) in self.arena.iter() {
                if matches!(kind, NodeKind::Ident { name: n, .. } if *n == name) {
                    return id;
                }
            }
            panic!("no identifier expression named {name:?}");
        }
    }

    #[test]
    fn identifiers_bind_to_declarations() {
        let resolved = resolve("func f(x: Int) -> Int { return x }");
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let x = resolved.find_ident("x");
        let NodeKind::Ident { decl: Some(decl), .. } = resolved.arena.kind(x) else {
            panic!("x not bound");
        };
        assert!(matches!(resolved.arena.kind(decl), NodeKind::Param { .. }));
        assert_eq!(resolved.arena.ty(x), Some(resolved.types.int()));
    }

    #[test]
    fn unresolved_identifier_gets_error_type() {
        let resolved = resolve("func f() -> Int { return ghost }");
        assert!(resolved
            .messages()
            .iter()
            .any(|m| m.contains("use of unresolved identifier 'ghost'")));

        let ghost = resolved.find_ident("ghost");
        assert!(matches!(
            resolved.arena.kind(ghost),
            NodeKind::Ident { decl: None, .. }
        ));
        assert_eq!(resolved.arena.ty(ghost), Some(resolved.types.error()));
    }

    #[test]
    fn identifier_invariant_bound_or_error_typed() {
        let resolved = resolve(
            "var g: Int = 1\nfunc f(a: Bool) -> Int { var l: Int = g\n return unknown }",
        );
        for (id, kind) in resolved.arena.iter() {
            if let NodeKind::Ident { decl, .. } = kind {
                let bound = decl.is_some();
                let errored = resolved.arena.ty(id) == Some(resolved.types.error());
                assert!(bound || errored, "identifier {id:?} neither bound nor errored");
            }
        }
    }

    #[test]
    fn globals_are_visible_before_their_declaration() {
        let resolved = resolve("func f() -> Int { return limit }\nlet limit: Int = 8");
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());
    }

    #[test]
    fn locals_are_only_visible_after_their_declaration() {
        let resolved = resolve("func f() -> Void { use_it(x)\n var x: Int }");
        assert!(resolved
            .messages()
            .iter()
            .any(|m| m.contains("use of unresolved identifier 'x'")));
    }

    #[test]
    fn local_shadowing_rebinds_inner_uses() {
        let resolved = resolve(
            "var x: Int = 1\nfunc f(flag: Bool) -> Void { if flag { var x: Bool = true\n var y: Bool = x } }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        // y's initializer must bind to the inner Bool x, not the global Int x.
        let y_init = {
            let name = resolved.interner.intern("y");
            resolved
                .arena
                .iter()
                .find_map(|(id, kind)| match kind {
                    NodeKind::Var {
                        name: n,
                        init: Some(init),
                        ..
                    } if *n == name => Some(*init),
                    _ => None,
                })
                .expect("y declaration")
        };
        let NodeKind::Ident { decl: Some(decl), .. } = resolved.arena.kind(y_init) else {
            panic!("y initializer is not a bound identifier");
        };
        assert_eq!(resolved.arena.ty(decl), Some(resolved.types.bool_()));
        assert_eq!(resolved.arena.ty(y_init), Some(resolved.types.bool_()));
    }

    #[test]
    fn struct_member_access_records_dense_index() {
        let resolved = resolve(
            "struct Point { var x: Int var y: Int }\nfunc f(p: Point) -> Int { return p.y }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let member = resolved
            .arena
            .iter()
            .find_map(|(id, kind)| match kind {
                NodeKind::Member { .. } => Some(id),
                _ => None,
            })
            .expect("member access");
        assert!(matches!(
            resolved.arena.kind(member),
            NodeKind::Member { index: Some(1), .. }
        ));
        assert_eq!(resolved.arena.ty(member), Some(resolved.types.int()));
    }

    #[test]
    fn member_access_through_pointer_dereferences_once() {
        let resolved = resolve(
            "struct Point { var x: Int var y: Int }\nfunc f(p: Point*) -> Int { return p.x }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());
    }

    #[test]
    fn unknown_member_is_a_diagnostic() {
        let resolved = resolve(
            "struct Point { var x: Int }\nfunc f(p: Point) -> Int { return p.z }",
        );
        assert!(resolved
            .messages()
            .iter()
            .any(|m| m.contains("has no member 'z'")));
    }

    #[test]
    fn enum_member_access_selects_elements() {
        let resolved = resolve(
            "enum Mode { case Idle case Busy }\nfunc f() -> Void { var m: Mode = Mode.Busy }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let member = resolved
            .arena
            .iter()
            .find_map(|(id, kind)| match kind {
                NodeKind::Member { .. } => Some(id),
                _ => None,
            })
            .expect("member access");
        assert!(matches!(
            resolved.arena.kind(member),
            NodeKind::Member { index: Some(1), .. }
        ));
    }

    #[test]
    fn unresolved_type_name_is_a_diagnostic() {
        let resolved = resolve("var x: Missing");
        assert!(resolved
            .messages()
            .iter()
            .any(|m| m.contains("use of unresolved type name 'Missing'")));
    }

    #[test]
    fn value_names_are_not_types() {
        let resolved = resolve("var a: Int\nvar b: a");
        assert!(resolved.messages().iter().any(|m| m.contains("'a' is not a type")));
    }

    #[test]
    fn typeof_takes_the_expression_type() {
        let resolved = resolve("var a: Int = 1\nvar b: typeof(a) = 2");
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let b = {
            let name = resolved.interner.intern("b");
            resolved
                .arena
                .iter()
                .find_map(|(id, kind)| match kind {
                    NodeKind::Var { name: n, .. } if *n == name => Some(id),
                    _ => None,
                })
                .expect("b declaration")
        };
        assert_eq!(resolved.arena.ty(b), Some(resolved.types.int()));
    }

    #[test]
    fn operator_overload_attaches_function() {
        let resolved = resolve(
            "struct Vec { var x: Int }\n\
             infix func + (a: Vec, b: Vec) -> Vec { return a }\n\
             func f(a: Vec, b: Vec) -> Vec { return a + b }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let binary = resolved
            .arena
            .iter()
            .find_map(|(id, kind)| match kind {
                NodeKind::Binary { op: BinaryOp::Add, .. } => Some(id),
                _ => None,
            })
            .expect("binary expression");
        let NodeKind::Binary { op_fn: Some(op_fn), .. } = resolved.arena.kind(binary) else {
            panic!("operator function not attached");
        };
        assert!(matches!(
            resolved.arena.kind(op_fn),
            NodeKind::Func { kind: FuncKind::InfixOp, .. }
        ));
        // The overload's type was recorded as a candidate.
        assert!(!resolved.arena.candidates(binary).is_empty());
    }

    #[test]
    fn builtin_operators_need_no_overload() {
        let resolved = resolve("var x: Bool = 1 + 2 < 4 && true");
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());
    }

    #[test]
    fn every_expression_ends_up_typed() {
        let resolved = resolve(
            "struct Point { var x: Int }\n\
             func f(p: Point*, xs: Int[]) -> Int { \
               if p != nil { return xs[0] + p.x } \
               return sizeof(Point) }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());
        for (id, kind) in resolved.arena.iter() {
            if kind.is_expr() {
                assert!(resolved.arena.ty(id).is_some(), "expression {id:?} untyped");
            }
        }
    }

    #[test]
    fn scope_tree_anchors_constructs() {
        let resolved = resolve(
            "func f(b: Bool) -> Void { while b { } switch b { case true: break case false: break } }",
        );
        assert!(resolved.messages().is_empty(), "{:?}", resolved.messages());

        let dump = resolved.scopes.dump(&resolved.interner);
        assert!(dump.contains("function"), "{dump}");
        assert!(dump.contains("loop"), "{dump}");
        assert!(dump.contains("switch"), "{dump}");
        assert!(dump.contains("case"), "{dump}");
        let _ = resolved.unit;
    }
}
