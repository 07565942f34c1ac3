//! Type checking for Mica.
//!
//! The checker runs after name resolution on a fully typed AST. It
//! validates declarations, statements and expressions, enforces switch
//! exhaustiveness, cyclic-storage and return-path rules, and locates the
//! module's entry point. It reports diagnostics; it never changes a type
//! the resolver computed (the only nodes it creates are synthesized
//! enumeration element initializers).
//!
//! Validation is idempotent: every node is marked once validated and
//! re-entering it is a no-op.

mod decls;
mod exprs;
mod returns;
mod stmts;

#[cfg(test)]
mod tests;

use tracing::debug;

use mica_diagnostic::Handler;
use mica_ir::{
    AstArena, FuncKind, Module, Name, NodeFlags, NodeId, NodeKind, StringInterner, TypeId,
};
use mica_sema::ScopeTree;
use mica_types::{Type, TypeTable};

/// The type checker for one module.
pub struct TypeChecker<'a> {
    arena: &'a mut AstArena,
    scopes: &'a ScopeTree,
    types: &'a mut TypeTable,
    interner: &'a StringInterner,
    handler: &'a Handler,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        arena: &'a mut AstArena,
        scopes: &'a ScopeTree,
        types: &'a mut TypeTable,
        interner: &'a StringInterner,
        handler: &'a Handler,
    ) -> Self {
        TypeChecker {
            arena,
            scopes,
            types,
            interner,
            handler,
        }
    }

    /// Validate a whole module, then locate its entry point.
    pub fn check_module(&mut self, module: &mut Module) {
        if module.validated {
            return;
        }
        module.validated = true;
        debug!(units = module.units.len(), "type checking module");

        self.validate_static_array_types();

        for &unit in &module.units {
            self.validate_source_unit(unit);
        }

        if self.handler.has_errors() {
            return;
        }

        self.locate_entry_point(module);
    }

    /// Mark a node validated; returns `false` if it already was (no-op).
    fn mark_validated(&mut self, node: NodeId) -> bool {
        if self.arena.has_flag(node, NodeFlags::VALIDATED) {
            return false;
        }
        self.arena.set_flag(node, NodeFlags::VALIDATED);
        true
    }

    fn text(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    /// The resolved type of a node; the error type if resolution skipped it.
    fn ty(&self, node: NodeId) -> TypeId {
        self.arena.ty(node).unwrap_or_else(|| self.types.error())
    }

    /// Type equality with the error type compatible to everything.
    fn equal_or_error(&self, lhs: TypeId, rhs: TypeId) -> bool {
        lhs == rhs || self.types.is_error(lhs) || self.types.is_error(rhs)
    }

    /// Whether `value` (of type `from`) is acceptable where `to` is
    /// expected: equal, error-compatible, implicitly convertible, or the
    /// nil constant meeting any pointer type.
    fn assignable(&self, value: NodeId, from: TypeId, to: TypeId) -> bool {
        self.equal_or_error(from, to)
            || self.types.is_implicitly_convertible(from, to)
            || (matches!(self.arena.kind(value), NodeKind::Nil) && self.types.is_pointer(to))
    }

    /// Every static array size must be an integer literal.
    fn validate_static_array_types(&mut self) {
        let mut pending = Vec::new();
        for (id, kind) in self.arena.iter() {
            if let NodeKind::TypeArray {
                size: Some(size), ..
            } = kind
            {
                pending.push((id, *size));
            }
        }
        for (array, size) in pending {
            match self.arena.kind(size) {
                NodeKind::Int(_) => {
                    debug_assert!(self.arena.has_flag(array, NodeFlags::STATIC_ARRAY));
                }
                kind if kind.is_literal() => {
                    self.handler.error(
                        self.arena.span(size),
                        "only integer literals are allowed for the size of an array",
                    );
                }
                _ => {
                    self.handler.error(
                        self.arena.span(size),
                        "only literal expressions are allowed for the size of an array",
                    );
                }
            }
        }
    }

    fn validate_source_unit(&mut self, unit: NodeId) {
        if !self.mark_validated(unit) {
            return;
        }
        let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
            return;
        };
        for &decl in self.arena.list(decls).to_vec().iter() {
            self.validate_top_level(decl);
        }
    }

    fn validate_top_level(&mut self, decl: NodeId) {
        match self.arena.kind(decl) {
            NodeKind::Load { .. } => {}
            NodeKind::Enum { .. } => self.validate_enum(decl),
            NodeKind::Func { .. } => self.validate_function(decl),
            NodeKind::Struct { .. } => self.validate_struct(decl),
            NodeKind::Var { .. } => self.validate_var(decl),
            _ => {}
        }
    }

    /// Find the module's entry point: a function named by the configured
    /// entry name, parameterless, returning Void; exactly one per module.
    fn locate_entry_point(&mut self, module: &mut Module) {
        let mut has_error = false;
        let units = module.units.clone();
        'units: for &unit in &units {
            let NodeKind::SourceUnit { decls, .. } = self.arena.kind(unit) else {
                continue;
            };
            for &decl in self.arena.list(decls) {
                let NodeKind::Func {
                    kind,
                    name,
                    params,
                    ..
                } = self.arena.kind(decl)
                else {
                    continue;
                };
                // Only plain functions qualify; foreign and intrinsic
                // declarations have no body to enter.
                if kind != FuncKind::Plain {
                    continue;
                }
                if name != module.entry_name {
                    continue;
                }
                let span = self.arena.span(decl);
                if module.entry_point.is_some() {
                    self.handler
                        .error(span, "invalid redeclaration of program entry point");
                    has_error = true;
                    break 'units;
                }
                if !self.arena.list(params).is_empty() {
                    self.handler
                        .error(span, "expected no parameters for program entry point");
                    has_error = true;
                    break 'units;
                }
                let ret = match self.types.get(self.ty(decl)) {
                    Type::Function { ret, .. } => *ret,
                    _ => self.types.error(),
                };
                if !self.equal_or_error(ret, self.types.void()) {
                    self.handler
                        .error(span, "return type of program entry point is not 'Void'");
                    has_error = true;
                    break 'units;
                }
                module.entry_point = Some(decl);
            }
        }

        if !has_error && module.entry_point.is_none() {
            self.handler.error(
                mica_ir::Span::DUMMY,
                "no entry point specified for module",
            );
        }
    }
}
