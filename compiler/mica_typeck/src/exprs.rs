//! Expression validation.

use mica_ir::{NodeFlags, NodeId, NodeKind, TypeOpKind};
use mica_types::Type;

use crate::TypeChecker;

impl TypeChecker<'_> {
    pub(crate) fn validate_expr(&mut self, expr: NodeId) {
        if !self.mark_validated(expr) {
            return;
        }
        match self.arena.kind(expr) {
            NodeKind::Unary { operand, .. } => {
                self.validate_expr(operand);
            }
            NodeKind::Binary { lhs, rhs, .. } => {
                self.validate_expr(lhs);
                self.validate_expr(rhs);
            }
            NodeKind::Assign { lhs, rhs, .. } => self.validate_assign(expr, lhs, rhs),
            NodeKind::Call { callee, args } => self.validate_call(expr, callee, args),
            NodeKind::Subscript { args, base } => self.validate_subscript(expr, base, args),
            NodeKind::TypeOp {
                kind,
                expr: sub,
                ty,
            } => {
                self.validate_expr(sub);
                if kind == TypeOpKind::Bitcast {
                    let sub_ty = self.ty(sub);
                    let target_ty = self.ty(ty);
                    let ok = (self.types.is_pointer(sub_ty) || self.types.is_error(sub_ty))
                        && (self.types.is_pointer(target_ty) || self.types.is_error(target_ty));
                    if !ok {
                        self.handler.error(
                            self.arena.span(expr),
                            "bitcast operation only accepts pointer types",
                        );
                        let error = self.types.error();
                        self.arena.set_ty(expr, error);
                    }
                }
            }
            NodeKind::Member { base, .. } => {
                self.validate_expr(base);
            }
            // Identifiers and literals were fully handled by resolution.
            _ => {}
        }
    }

    fn validate_assign(&mut self, expr: NodeId, lhs: NodeId, rhs: NodeId) {
        self.validate_expr(lhs);
        self.validate_expr(rhs);

        if !self.is_lvalue(lhs) {
            self.handler.error(
                self.arena.span(expr),
                "left hand side of assignment expression is not assignable",
            );
        }

        let lhs_ty = self.ty(lhs);
        let rhs_ty = self.ty(rhs);
        if !self.assignable(rhs, rhs_ty, lhs_ty) {
            self.handler.error(
                self.arena.span(expr),
                "assignment expression has mismatching type",
            );
        }
    }

    /// An lvalue designates assignable storage: a mutable variable
    /// identifier, a pointer-typed parameter identifier, a subscript with
    /// an lvalue base, or a member access with an lvalue base.
    fn is_lvalue(&self, expr: NodeId) -> bool {
        match self.arena.kind(expr) {
            NodeKind::Ident {
                decl: Some(decl), ..
            } => match self.arena.kind(decl) {
                NodeKind::Var { .. } => !self.arena.has_flag(decl, NodeFlags::IMMUTABLE),
                NodeKind::Param { .. } => self.types.is_pointer(self.ty(decl)),
                _ => false,
            },
            NodeKind::Member { base, .. } => self.is_lvalue(base),
            NodeKind::Subscript { base, .. } => self.is_lvalue(base),
            _ => false,
        }
    }

    fn validate_call(&mut self, expr: NodeId, callee: NodeId, args: mica_ir::NodeRange) {
        self.validate_expr(callee);
        let args = self.arena.list(args).to_vec();
        for &arg in &args {
            self.validate_expr(arg);
        }

        let callee_ty = self.ty(callee);
        if self.types.is_error(callee_ty) {
            return;
        }
        let unwrapped = match self.types.get(callee_ty) {
            Type::Pointer { pointee, depth: 1 } => *pointee,
            _ => callee_ty,
        };
        let (params, decl) = match self.types.get(unwrapped) {
            Type::Function { params, decl, .. } => (params.clone(), *decl),
            _ => {
                self.handler
                    .error(self.arena.span(expr), "cannot call a non function type");
                return;
            }
        };

        if args.len() != params.len() {
            self.handler.error(
                self.arena.span(expr),
                format!(
                    "invalid argument count expected '{}' found '{}'",
                    params.len(),
                    args.len()
                ),
            );
            return;
        }

        for (index, (&arg, &param_ty)) in args.iter().zip(params.iter()).enumerate() {
            let arg_ty = self.ty(arg);
            if self.assignable(arg, arg_ty, param_ty) {
                continue;
            }
            match self.parameter_name(decl, index) {
                Some((param_name, func_name)) => self.handler.error(
                    self.arena.span(arg),
                    format!(
                        "mismatching type for parameter '{}' in '{}'",
                        self.text(param_name),
                        self.text(func_name)
                    ),
                ),
                None => self.handler.error(
                    self.arena.span(arg),
                    format!("mismatching type for parameter at position '{index}'"),
                ),
            }
        }
    }

    /// Parameter and function names from the callee's declaration back-link,
    /// for diagnostics.
    fn parameter_name(
        &self,
        decl: Option<NodeId>,
        index: usize,
    ) -> Option<(mica_ir::Name, mica_ir::Name)> {
        let decl = decl?;
        let NodeKind::Func { name, params, .. } = self.arena.kind(decl) else {
            return None;
        };
        let param = *self.arena.list(params).get(index)?;
        let NodeKind::Param {
            name: param_name, ..
        } = self.arena.kind(param)
        else {
            return None;
        };
        Some((param_name, name))
    }

    fn validate_subscript(&mut self, expr: NodeId, base: NodeId, args: mica_ir::NodeRange) {
        self.validate_expr(base);
        let args = self.arena.list(args).to_vec();
        for &arg in &args {
            self.validate_expr(arg);
        }

        if args.len() != 1 {
            self.handler.error(
                self.arena.span(expr),
                format!(
                    "expected single argument for subscript expression found '{}'",
                    args.len()
                ),
            );
            let error = self.types.error();
            self.arena.set_ty(expr, error);
            return;
        }

        let arg_ty = self.ty(args[0]);
        if !self.types.is_error(arg_ty) && !self.types.is_integer(arg_ty) {
            self.handler.error(
                self.arena.span(args[0]),
                "type mismatch in argument list of subscript expression",
            );
            let error = self.types.error();
            self.arena.set_ty(expr, error);
        }
    }
}
