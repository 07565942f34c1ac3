//! Return-path analysis and switch exhaustiveness.
//!
//! A block "always returns" iff one of its statements does: a `return`; a
//! `continue` inside a loop (the body is guaranteed to re-enter); an `if`
//! whose branches both always return; an exhaustive switch whose every case
//! body always returns; or a loop whose body is guaranteed to run and
//! always returns (`for`, `do`-`while`). Results are memoised as a flag on
//! the block.

use mica_ir::{CaseKind, ControlKind, ElseArm, LoopKind, NodeFlags, NodeId, NodeKind};
use mica_sema::{ScopeKind, ScopeKindSet};
use mica_types::Type;

use crate::TypeChecker;

impl TypeChecker<'_> {
    /// Whether every control-flow path through a block ends in a return.
    pub(crate) fn check_always_returns(&mut self, block: NodeId) -> bool {
        if self.arena.has_flag(block, NodeFlags::ALWAYS_RETURNS) {
            return true;
        }
        let NodeKind::Block { stmts } = self.arena.kind(block) else {
            return false;
        };

        let mut always_returns = false;
        for &stmt in self.arena.list(stmts).to_vec().iter() {
            match self.arena.kind(stmt) {
                NodeKind::Control { kind, .. } => match kind {
                    ControlKind::Return => always_returns = true,
                    ControlKind::Continue => {
                        let in_loop = self
                            .arena
                            .scope(stmt)
                            .and_then(|scope| {
                                self.scopes.enclosing_of_kinds(
                                    scope,
                                    ScopeKindSet::single(ScopeKind::Loop),
                                )
                            })
                            .is_some();
                        if in_loop {
                            always_returns = true;
                        }
                    }
                    _ => {}
                },
                NodeKind::If { .. } => {
                    if self.if_always_returns(stmt) {
                        always_returns = true;
                    }
                }
                NodeKind::Switch { .. } => {
                    if self.switch_always_returns(stmt) {
                        always_returns = true;
                    }
                }
                NodeKind::Loop {
                    kind: LoopKind::DoWhile,
                    body,
                    ..
                }
                | NodeKind::For { body, .. } => {
                    // The body runs at least once for do-while, and the
                    // sequence rule treats for the same way.
                    if self.check_always_returns(body) {
                        always_returns = true;
                    }
                }
                _ => {}
            }
        }

        if always_returns {
            self.arena.set_flag(block, NodeFlags::ALWAYS_RETURNS);
        }
        always_returns
    }

    fn if_always_returns(&mut self, stmt: NodeId) -> bool {
        if self.arena.has_flag(stmt, NodeFlags::ALWAYS_RETURNS) {
            return true;
        }
        let NodeKind::If {
            then_block,
            else_arm,
            ..
        } = self.arena.kind(stmt)
        else {
            return false;
        };

        let then_returns = self.check_always_returns(then_block);
        let else_returns = match else_arm {
            ElseArm::None => false,
            ElseArm::Block(block) => self.check_always_returns(block),
            ElseArm::If(nested) => self.if_always_returns(nested),
        };

        if then_returns && else_returns {
            self.arena.set_flag(stmt, NodeFlags::ALWAYS_RETURNS);
            return true;
        }
        false
    }

    fn switch_always_returns(&mut self, stmt: NodeId) -> bool {
        if self.arena.has_flag(stmt, NodeFlags::ALWAYS_RETURNS) {
            return true;
        }
        let NodeKind::Switch { cases, .. } = self.arena.kind(stmt) else {
            return false;
        };

        let mut all_cases_return = true;
        for &case in self.arena.list(cases).to_vec().iter() {
            if let NodeKind::Case { body, .. } = self.arena.kind(case) {
                if !self.check_always_returns(body) {
                    all_cases_return = false;
                }
            }
        }

        if all_cases_return && self.switch_is_exhaustive(stmt) {
            self.arena.set_flag(stmt, NodeFlags::ALWAYS_RETURNS);
            return true;
        }
        false
    }

    /// Whether a switch covers every value its argument type can take.
    ///
    /// A terminal `else` case is always exhaustive. Enumeration switches
    /// exhaust when every declared element value appears as a case
    /// condition; Bool switches when both `true` and `false` appear. Any
    /// other argument type requires an `else`.
    pub(crate) fn switch_is_exhaustive(&mut self, stmt: NodeId) -> bool {
        if self.arena.has_flag(stmt, NodeFlags::SWITCH_EXHAUSTIVE) {
            return true;
        }
        let NodeKind::Switch { argument, cases } = self.arena.kind(stmt) else {
            return false;
        };
        let cases = self.arena.list(cases).to_vec();
        let Some(&last) = cases.last() else {
            return false;
        };

        // The else case is required to be last; a misplaced one is reported
        // separately, so checking the last case is enough here.
        if matches!(
            self.arena.kind(last),
            NodeKind::Case {
                kind: CaseKind::Else,
                ..
            }
        ) {
            self.arena.set_flag(stmt, NodeFlags::SWITCH_EXHAUSTIVE);
            return true;
        }

        let argument_ty = self.ty(argument);
        let exhausted = match self.types.get(argument_ty) {
            Type::Enum { decl, .. } => {
                let decl = *decl;
                self.enum_switch_is_exhaustive(decl, &cases)
            }
            Type::Bool => {
                let mut need_true = true;
                let mut need_false = true;
                for &case in &cases {
                    if let NodeKind::Case {
                        condition: Some(condition),
                        ..
                    } = self.arena.kind(case)
                    {
                        match self.arena.kind(condition) {
                            NodeKind::Bool(true) => need_true = false,
                            NodeKind::Bool(false) => need_false = false,
                            _ => {}
                        }
                    }
                }
                !need_true && !need_false
            }
            _ => false,
        };

        if exhausted {
            self.arena.set_flag(stmt, NodeFlags::SWITCH_EXHAUSTIVE);
        }
        exhausted
    }

    fn enum_switch_is_exhaustive(&mut self, enum_decl: NodeId, cases: &[NodeId]) -> bool {
        // Element values come from validated initializers; enumeration
        // validation is idempotent, so force it here in case the switch is
        // checked before its enum declaration.
        self.validate_enum(enum_decl);

        let NodeKind::Enum { elements, .. } = self.arena.kind(enum_decl) else {
            return false;
        };
        let elements = self.arena.list(elements).to_vec();

        let mut remaining = Vec::new();
        for &element in &elements {
            if let Some(value) = self.element_value(element) {
                remaining.push(value);
            }
        }

        for &case in cases {
            let NodeKind::Case {
                condition: Some(condition),
                ..
            } = self.arena.kind(case)
            else {
                continue;
            };
            let matched = match self.arena.kind(condition) {
                // Unqualified element constant: `case Idle:`
                NodeKind::Ident {
                    decl: Some(decl), ..
                } => self.element_value(decl),
                // Qualified access: `case Mode.Idle:`
                NodeKind::Member {
                    index: Some(index), ..
                } => elements
                    .get(index as usize)
                    .and_then(|&element| self.element_value(element)),
                _ => None,
            };
            if let Some(value) = matched {
                if let Some(at) = remaining.iter().position(|&v| v == value) {
                    remaining.swap_remove(at);
                }
            }
        }

        remaining.is_empty()
    }

    /// The integer value of an enumeration element, if its declaration has
    /// a validated constant initializer.
    fn element_value(&self, element: NodeId) -> Option<u64> {
        let NodeKind::EnumElement {
            init: Some(init), ..
        } = self.arena.kind(element)
        else {
            return None;
        };
        match self.arena.kind(init) {
            NodeKind::Int(value) => Some(value),
            _ => None,
        }
    }
}
