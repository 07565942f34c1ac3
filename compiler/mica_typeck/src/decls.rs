//! Declaration validation.

use mica_ir::{NodeFlags, NodeId, NodeKind, Span};
use mica_types::Type;

use crate::TypeChecker;

impl TypeChecker<'_> {
    /// Validate an enumeration: synthesize missing element initializers
    /// (previous value + 1, starting at zero) and require constant,
    /// integer-typed, pairwise distinct values.
    pub(crate) fn validate_enum(&mut self, decl: NodeId) {
        if !self.mark_validated(decl) {
            return;
        }
        let NodeKind::Enum { elements, .. } = self.arena.kind(decl) else {
            return;
        };

        let mut seen = Vec::new();
        let mut next_value = 0u64;
        for &element in self.arena.list(elements).to_vec().iter() {
            let NodeKind::EnumElement { name, init } = self.arena.kind(element) else {
                continue;
            };
            if self.types.is_error(self.ty(element)) {
                continue;
            }

            let init = match init {
                Some(init) => init,
                None => {
                    let synthesized = self.synthesize_int(next_value, element);
                    if let NodeKind::EnumElement { init: slot, .. } =
                        self.arena.kind_mut(element)
                    {
                        *slot = Some(synthesized);
                    }
                    synthesized
                }
            };

            self.validate_expr(init);
            let init_ty = self.ty(init);
            if self.types.is_error(init_ty) {
                let error = self.types.error();
                self.arena.set_ty(element, error);
                continue;
            }
            if !self.types.is_integer(init_ty) {
                self.handler.error(
                    self.arena.span(element),
                    format!(
                        "initializer of element '{}' has mismatching type",
                        self.text(name)
                    ),
                );
                continue;
            }
            let NodeKind::Int(value) = self.arena.kind(init) else {
                self.handler.error(
                    self.arena.span(element),
                    format!(
                        "initializer of element '{}' has to be a constant value",
                        self.text(name)
                    ),
                );
                continue;
            };

            if seen.contains(&value) {
                self.handler.error(
                    self.arena.span(element),
                    format!("invalid reuse of value {value} for different enum elements"),
                );
            } else {
                seen.push(value);
                next_value = value + 1;
            }
        }
    }

    /// Allocate a synthesized integer literal for an element without an
    /// initializer. The node carries the null span of generated code.
    fn synthesize_int(&mut self, value: u64, element: NodeId) -> NodeId {
        let node = self.arena.alloc(NodeKind::Int(value), Span::DUMMY);
        self.arena.set_flag(node, NodeFlags::CONSTANT);
        let int = self.types.int();
        self.arena.set_ty(node, int);
        if let Some(scope) = self.arena.scope(element) {
            self.arena.set_scope(node, scope);
        }
        self.arena.set_parent(node, element);
        node
    }

    /// Validate a structure: cyclic storage and Void members.
    pub(crate) fn validate_struct(&mut self, decl: NodeId) {
        if !self.mark_validated(decl) {
            return;
        }

        let mut parents = vec![decl];
        self.check_cyclic_storage(decl, decl, &mut parents);

        let NodeKind::Struct { members, .. } = self.arena.kind(decl) else {
            return;
        };
        for &member in self.arena.list(members).to_vec().iter() {
            let member_ty = self.ty(member);
            if matches!(self.types.get(member_ty), Type::Void) {
                let error = self.types.error();
                self.arena.set_ty(member, error);
                self.handler.error(
                    self.arena.span(member),
                    "cannot store 'Void' type as member",
                );
            }
        }
    }

    /// Depth-first search over member types, unwrapping arrays to their
    /// elements. A structure already on the current path stored by value is
    /// cyclic storage.
    fn check_cyclic_storage(&mut self, root: NodeId, current: NodeId, parents: &mut Vec<NodeId>) {
        let NodeKind::Struct { members, .. } = self.arena.kind(current) else {
            return;
        };
        for &member in self.arena.list(members).to_vec().iter() {
            let mut element_ty = self.ty(member);
            loop {
                match self.types.get(element_ty) {
                    Type::StaticArray { element, .. } | Type::DynamicArray { element } => {
                        element_ty = *element;
                    }
                    _ => break,
                }
            }

            let Type::Struct {
                decl: member_decl, ..
            } = self.types.get(element_ty)
            else {
                continue;
            };
            let member_decl = *member_decl;

            if parents.contains(&member_decl) {
                self.handler.error(
                    self.arena.span(member),
                    "struct cannot store a variable of same type recursively",
                );
                self.arena.set_flag(root, NodeFlags::CYCLIC_STORAGE);
                return;
            }

            parents.push(member_decl);
            self.check_cyclic_storage(root, member_decl, parents);
            parents.pop();
        }
    }

    /// Validate a function declaration.
    ///
    /// Foreign and intrinsic functions get the same signature checks but
    /// have no body to validate.
    pub(crate) fn validate_function(&mut self, decl: NodeId) {
        if !self.mark_validated(decl) {
            return;
        }
        let NodeKind::Func {
            kind, params, body, ..
        } = self.arena.kind(decl)
        else {
            return;
        };

        for &param in self.arena.list(params).to_vec().iter() {
            let param_ty = self.ty(param);
            if matches!(self.types.get(param_ty), Type::Void) {
                let error = self.types.error();
                self.arena.set_ty(param, error);
                self.handler.error(
                    self.arena.span(param),
                    "cannot pass 'Void' type as parameter",
                );
            }
        }

        if !kind.has_body() {
            return;
        }
        let Some(body) = body else {
            return;
        };

        let ret = match self.types.get(self.ty(decl)) {
            Type::Function { ret, .. } => *ret,
            _ => self.types.error(),
        };
        let requires_return = !matches!(self.types.get(ret), Type::Void);

        let always_returns = self.check_always_returns(body);
        if requires_return && !always_returns {
            self.handler.error(
                self.arena.span(decl),
                "not all code paths return a value",
            );
        }

        let NodeKind::Block { stmts } = self.arena.kind(body) else {
            return;
        };
        for &stmt in self.arena.list(stmts).to_vec().iter() {
            self.validate_stmt(stmt);
        }
    }

    /// Validate a variable declaration: the initializer type must match
    /// the declared type or be implicitly convertible to it.
    pub(crate) fn validate_var(&mut self, decl: NodeId) {
        if !self.mark_validated(decl) {
            return;
        }
        let NodeKind::Var { name, init, .. } = self.arena.kind(decl) else {
            return;
        };
        let Some(init) = init else {
            return;
        };

        self.validate_expr(init);
        let declared = self.ty(decl);
        let init_ty = self.ty(init);
        if !self.assignable(init, init_ty, declared) {
            self.handler.error(
                self.arena.span(decl),
                format!(
                    "assignment expression of '{}' has mismatching type",
                    self.text(name)
                ),
            );
        }
    }
}
