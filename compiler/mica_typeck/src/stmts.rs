//! Statement validation.

use mica_ir::{CaseKind, ControlKind, ElseArm, NodeFlags, NodeId, NodeKind};
use mica_sema::{ScopeKind, ScopeKindSet};
use mica_types::Type;

use crate::TypeChecker;

impl TypeChecker<'_> {
    pub(crate) fn validate_stmt(&mut self, stmt: NodeId) {
        match self.arena.kind(stmt) {
            NodeKind::If {
                conditions,
                then_block,
                else_arm,
            } => {
                self.validate_conditions(conditions, "if statement");
                self.validate_block(then_block);
                match else_arm {
                    ElseArm::None => {}
                    ElseArm::Block(block) => self.validate_block(block),
                    ElseArm::If(nested) => self.validate_stmt(nested),
                }
            }
            NodeKind::Loop {
                conditions, body, ..
            } => {
                self.validate_conditions(conditions, "loop statement");
                self.validate_block(body);
            }
            NodeKind::For {
                element: _,
                sequence,
                body,
            } => {
                self.validate_expr(sequence);
                let sequence_ty = self.ty(sequence);
                if !self.types.is_error(sequence_ty)
                    && !self.types.get(sequence_ty).is_array()
                {
                    self.handler.error(
                        self.arena.span(sequence),
                        format!(
                            "expected array type for sequence of for statement, found '{}'",
                            self.types.display(sequence_ty)
                        ),
                    );
                }
                self.validate_block(body);
            }
            NodeKind::Guard {
                conditions,
                else_block,
            } => {
                self.validate_conditions(conditions, "guard statement");
                self.validate_block(else_block);
            }
            NodeKind::Switch { .. } => self.validate_switch(stmt),
            NodeKind::Case { .. } => self.validate_case(stmt),
            NodeKind::Control { .. } => self.validate_control(stmt),
            NodeKind::Defer { expr } => {
                self.validate_expr(expr);
            }
            NodeKind::Var { .. } => self.validate_var(stmt),
            NodeKind::Block { .. } => self.validate_block(stmt),
            kind if kind.is_expr() => self.validate_expr(stmt),
            _ => {}
        }
    }

    pub(crate) fn validate_block(&mut self, block: NodeId) {
        if !self.mark_validated(block) {
            return;
        }
        let NodeKind::Block { stmts } = self.arena.kind(block) else {
            return;
        };
        for &stmt in self.arena.list(stmts).to_vec().iter() {
            self.validate_stmt(stmt);

            // Every control statement terminates its block.
            if matches!(self.arena.kind(stmt), NodeKind::Control { .. }) {
                self.arena.set_flag(block, NodeFlags::HAS_TERMINATOR);
            }
        }
    }

    fn validate_conditions(&mut self, conditions: mica_ir::NodeRange, context: &str) {
        for &cond in self.arena.list(conditions).to_vec().iter() {
            self.validate_expr(cond);
            let ty = self.ty(cond);
            if !self.equal_or_error(ty, self.types.bool_()) {
                self.handler.error(
                    self.arena.span(cond),
                    format!("expected type Bool for condition of {context}"),
                );
            }
        }
    }

    fn validate_switch(&mut self, stmt: NodeId) {
        if !self.mark_validated(stmt) {
            return;
        }
        let NodeKind::Switch { argument, cases } = self.arena.kind(stmt) else {
            return;
        };
        self.validate_expr(argument);

        let cases = self.arena.list(cases).to_vec();
        let mut has_else = false;
        for (index, &case) in cases.iter().enumerate() {
            self.validate_case(case);

            if let NodeKind::Case {
                kind: CaseKind::Else,
                ..
            } = self.arena.kind(case)
            {
                if index + 1 < cases.len() {
                    self.handler.error(
                        self.arena.span(case),
                        "the 'else' case has to be the last case of a switch statement",
                    );
                }
                if has_else {
                    self.handler.error(
                        self.arena.span(case),
                        "there can only be a single 'else' case inside a switch statement",
                    );
                }
                has_else = true;
            }
        }

        if !self.switch_is_exhaustive(stmt) {
            self.handler
                .error(self.arena.span(stmt), "switch statement must be exhaustive");
        }
    }

    fn validate_case(&mut self, case: NodeId) {
        if !self.mark_validated(case) {
            return;
        }
        let NodeKind::Case {
            kind,
            condition,
            body,
            ..
        } = self.arena.kind(case)
        else {
            return;
        };

        // Bind the enclosing switch statement.
        let enclosing = self
            .arena
            .scope(case)
            .and_then(|scope| {
                self.scopes
                    .enclosing_of_kinds(scope, ScopeKindSet::single(ScopeKind::Switch))
            })
            .and_then(|scope| self.scopes.anchor(scope));
        match enclosing {
            Some(switch_stmt) => {
                if let NodeKind::Case {
                    switch_stmt: slot, ..
                } = self.arena.kind_mut(case)
                {
                    *slot = Some(switch_stmt);
                }
            }
            None => {
                self.handler
                    .error(self.arena.span(case), "'case' is only allowed inside a switch");
            }
        }

        if let NodeKind::Block { stmts } = self.arena.kind(body) {
            if self.arena.list(stmts).is_empty() {
                self.handler.error(
                    self.arena.span(case),
                    "switch case should contain at least one statement",
                );
            }
        }

        if kind == CaseKind::Conditional {
            if let Some(condition) = condition {
                self.validate_expr(condition);
                // The condition must be compatible with the switch argument.
                if let Some(switch_stmt) = self.case_switch(case) {
                    if let NodeKind::Switch { argument, .. } = self.arena.kind(switch_stmt) {
                        let argument_ty = self.ty(argument);
                        let condition_ty = self.ty(condition);
                        if !self.assignable(condition, condition_ty, argument_ty) {
                            self.handler.error(
                                self.arena.span(condition),
                                "mismatching type for condition of case statement",
                            );
                        }
                    }
                }
            }
        }

        self.validate_block(body);
    }

    fn case_switch(&self, case: NodeId) -> Option<NodeId> {
        match self.arena.kind(case) {
            NodeKind::Case { switch_stmt, .. } => switch_stmt,
            _ => None,
        }
    }

    fn validate_control(&mut self, stmt: NodeId) {
        let NodeKind::Control { kind, result, .. } = self.arena.kind(stmt) else {
            return;
        };
        let span = self.arena.span(stmt);
        let scope = self.arena.scope(stmt);

        let bind_target = |checker: &mut Self, kinds: ScopeKindSet| -> Option<NodeId> {
            scope
                .and_then(|scope| checker.scopes.enclosing_of_kinds(scope, kinds))
                .and_then(|scope| checker.scopes.anchor(scope))
        };

        match kind {
            ControlKind::Break => {
                let kinds = ScopeKindSet::single(ScopeKind::Loop).with(ScopeKind::Switch);
                match bind_target(self, kinds) {
                    Some(target) => self.set_control_target(stmt, target),
                    None => self
                        .handler
                        .error(span, "'break' is only allowed inside a switch or loop"),
                }
            }
            ControlKind::Continue => {
                match bind_target(self, ScopeKindSet::single(ScopeKind::Loop)) {
                    Some(target) => self.set_control_target(stmt, target),
                    None => self
                        .handler
                        .error(span, "'continue' is only allowed inside a loop"),
                }
            }
            ControlKind::Fallthrough => {
                match bind_target(self, ScopeKindSet::single(ScopeKind::Case)) {
                    Some(target) => self.set_control_target(stmt, target),
                    None => self
                        .handler
                        .error(span, "'fallthrough' is only allowed inside a case"),
                }
            }
            ControlKind::Return => {
                if let Some(result) = result {
                    self.validate_expr(result);
                }
                match bind_target(self, ScopeKindSet::single(ScopeKind::Function)) {
                    Some(function) => {
                        self.set_control_target(stmt, function);

                        let expected = match self.types.get(self.ty(function)) {
                            Type::Function { ret, .. } => *ret,
                            _ => self.types.error(),
                        };
                        let (value, actual) = match result {
                            Some(result) => (result, self.ty(result)),
                            None => (stmt, self.types.void()),
                        };
                        if !self.assignable(value, actual, expected) {
                            self.handler.error(span, "type mismatch in return statement");
                        }
                    }
                    None => self
                        .handler
                        .error(span, "'return' is only allowed inside a function"),
                }
            }
        }
    }

    fn set_control_target(&mut self, stmt: NodeId, target: NodeId) {
        if let NodeKind::Control { target: slot, .. } = self.arena.kind_mut(stmt) {
            *slot = Some(target);
        }
    }
}
