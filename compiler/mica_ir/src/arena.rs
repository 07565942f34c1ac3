//! Arena allocation for the flat AST.
//!
//! One arena per module. Allocation is amortized O(1), ids are stable for
//! the arena's whole lifetime, and nothing is freed individually: teardown
//! drops the backing arrays in one pass.
//!
//! # Layout
//! Parallel arrays indexed by `NodeId`: kind, span, parent, scope, flags and
//! resolved type each live in their own array, so passes that only touch one
//! attribute stay cache-friendly. Child lists are flattened into a single
//! id buffer addressed by `NodeRange`.
//!
//! # Capacity Limits
//! - Max nodes: 4 billion (`u32::MAX`)
//! - Max list length: 65,535 (`u16::MAX`)
//!
//! These limits are enforced at runtime with clear panic messages.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::{ElseArm, NodeFlags, NodeId, NodeKind, NodeRange, ScopeId, TypeId};
use crate::Span;

/// Panic helper for capacity overflow (cold path, never inlined).
#[cold]
#[inline(never)]
fn panic_capacity_exceeded(value: usize, context: &str, max: u64) -> ! {
    panic!("arena capacity exceeded: {context} has {value} elements, max is {max}")
}

/// Convert usize to u32, panicking with a clear message on overflow.
#[inline]
fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value)
        .unwrap_or_else(|_| panic_capacity_exceeded(value, context, u64::from(u32::MAX)))
}

/// Convert usize to u16, panicking with a clear message on overflow.
#[inline]
fn to_u16(value: usize, context: &str) -> u16 {
    u16::try_from(value)
        .unwrap_or_else(|_| panic_capacity_exceeded(value, context, u64::from(u16::MAX)))
}

/// Storage for all AST nodes of a module.
#[derive(Default)]
pub struct AstArena {
    /// Node payloads (indexed by `NodeId`). Parallel array.
    kinds: Vec<NodeKind>,
    /// Node spans. Parallel array.
    spans: Vec<Span>,
    /// Parent links, set exactly once after each source unit is parsed.
    parents: Vec<Option<NodeId>>,
    /// Enclosing scopes, set by the resolver.
    scopes: Vec<Option<ScopeId>>,
    /// Flag bits.
    flags: Vec<NodeFlags>,
    /// Resolved expression / declaration types.
    types: Vec<Option<TypeId>>,
    /// Flattened child lists addressed by `NodeRange`.
    lists: Vec<NodeId>,
    /// Candidate types collected during overload and operator resolution.
    candidates: FxHashMap<NodeId, Vec<TypeId>>,
}

impl AstArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: roughly one node per 12 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 12;
        AstArena {
            kinds: Vec::with_capacity(estimated),
            spans: Vec::with_capacity(estimated),
            parents: Vec::with_capacity(estimated),
            scopes: Vec::with_capacity(estimated),
            flags: Vec::with_capacity(estimated),
            types: Vec::with_capacity(estimated),
            lists: Vec::with_capacity(estimated / 2),
            candidates: FxHashMap::default(),
        }
    }

    /// Allocate a node, returning its id.
    ///
    /// The tag is fixed for the node's lifetime; resolution fields inside
    /// the payload are filled in later through [`AstArena::kind_mut`].
    #[inline]
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(to_u32(self.kinds.len(), "nodes"));
        self.kinds.push(kind);
        self.spans.push(span);
        self.parents.push(None);
        self.scopes.push(None);
        self.flags.push(NodeFlags::NONE);
        self.types.push(None);
        id
    }

    /// Number of allocated nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if the arena is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Get a node's payload by id (copied; payloads are small and `Copy`).
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.kinds[id.index()]
    }

    /// Mutable access to a node's payload, for filling resolution fields.
    ///
    /// The tag itself must not change; debug builds check this.
    #[inline]
    #[track_caller]
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.kinds[id.index()]
    }

    /// Get a node's span.
    #[inline]
    #[track_caller]
    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.index()]
    }

    /// Get a node's parent, if linked.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    /// Link a node to its parent. A parent is set exactly once.
    #[inline]
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        debug_assert!(
            self.parents[id.index()].is_none(),
            "parent of {id:?} linked twice"
        );
        self.parents[id.index()] = Some(parent);
    }

    /// Get the scope a node belongs to, once resolved.
    #[inline]
    pub fn scope(&self, id: NodeId) -> Option<ScopeId> {
        self.scopes[id.index()]
    }

    /// Record the scope a node belongs to.
    #[inline]
    pub fn set_scope(&mut self, id: NodeId, scope: ScopeId) {
        self.scopes[id.index()] = Some(scope);
    }

    /// Get a node's flags.
    #[inline]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.flags[id.index()]
    }

    /// Check a flag on a node.
    #[inline]
    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.flags[id.index()].has(flag)
    }

    /// Set a flag on a node.
    #[inline]
    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags) {
        self.flags[id.index()].insert(flag);
    }

    /// Get a node's resolved type, if set.
    #[inline]
    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.types[id.index()]
    }

    /// Set a node's resolved type.
    #[inline]
    pub fn set_ty(&mut self, id: NodeId, ty: TypeId) {
        self.types[id.index()] = Some(ty);
    }

    /// Allocate a child list, returning its range.
    pub fn alloc_list(&mut self, ids: &[NodeId]) -> NodeRange {
        let start = to_u32(self.lists.len(), "node lists");
        self.lists.extend_from_slice(ids);
        NodeRange::new(start, to_u16(ids.len(), "node list"))
    }

    /// Get a child list by range.
    #[inline]
    pub fn list(&self, range: NodeRange) -> &[NodeId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len as usize]
    }

    /// Record the candidate types considered while resolving a node.
    pub fn set_candidates(&mut self, id: NodeId, candidates: Vec<TypeId>) {
        self.candidates.insert(id, candidates);
    }

    /// Candidate types recorded for a node, if any.
    pub fn candidates(&self, id: NodeId) -> &[TypeId] {
        self.candidates.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Iterate over all nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeKind)> + '_ {
        self.kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| (NodeId::new(i as u32), kind))
    }

    /// Invoke `f` for every direct child of a node, in source order.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        match self.kind(id) {
            NodeKind::Load { literal, .. } => f(literal),
            NodeKind::Nil
            | NodeKind::Bool(_)
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Ident { .. }
            | NodeKind::TypeAny
            | NodeKind::TypeName { .. } => {}
            NodeKind::Member { base, .. } => f(base),
            NodeKind::Unary { operand, .. } => f(operand),
            NodeKind::Binary { lhs, rhs, .. } | NodeKind::Assign { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            NodeKind::Call { callee, args } => {
                f(callee);
                for &arg in self.list(args) {
                    f(arg);
                }
            }
            NodeKind::Subscript { base, args } => {
                f(base);
                for &arg in self.list(args) {
                    f(arg);
                }
            }
            NodeKind::SizeOf { ty } => f(ty),
            NodeKind::TypeOp { expr, ty, .. } => {
                f(expr);
                f(ty);
            }
            NodeKind::Block { stmts } => {
                for &stmt in self.list(stmts) {
                    f(stmt);
                }
            }
            NodeKind::Control { result, .. } => {
                if let Some(result) = result {
                    f(result);
                }
            }
            NodeKind::If {
                conditions,
                then_block,
                else_arm,
            } => {
                for &cond in self.list(conditions) {
                    f(cond);
                }
                f(then_block);
                match else_arm {
                    ElseArm::None => {}
                    ElseArm::Block(block) | ElseArm::If(block) => f(block),
                }
            }
            NodeKind::Loop {
                conditions, body, ..
            } => {
                for &cond in self.list(conditions) {
                    f(cond);
                }
                f(body);
            }
            NodeKind::For {
                element,
                sequence,
                body,
            } => {
                f(element);
                f(sequence);
                f(body);
            }
            NodeKind::Guard {
                conditions,
                else_block,
            } => {
                for &cond in self.list(conditions) {
                    f(cond);
                }
                f(else_block);
            }
            NodeKind::Switch { argument, cases } => {
                f(argument);
                for &case in self.list(cases) {
                    f(case);
                }
            }
            NodeKind::Case {
                condition, body, ..
            } => {
                if let Some(condition) = condition {
                    f(condition);
                }
                f(body);
            }
            NodeKind::Defer { expr } => f(expr),
            NodeKind::SourceUnit { decls, .. } => {
                for &decl in self.list(decls) {
                    f(decl);
                }
            }
            NodeKind::Enum { elements, .. } => {
                for &element in self.list(elements) {
                    f(element);
                }
            }
            NodeKind::EnumElement { init, .. } => {
                if let Some(init) = init {
                    f(init);
                }
            }
            NodeKind::Func {
                params,
                return_ty,
                body,
                ..
            } => {
                for &param in self.list(params) {
                    f(param);
                }
                f(return_ty);
                if let Some(body) = body {
                    f(body);
                }
            }
            NodeKind::Param { ty, .. } => f(ty),
            NodeKind::Var { ty, init, .. } => {
                if let Some(ty) = ty {
                    f(ty);
                }
                if let Some(init) = init {
                    f(init);
                }
            }
            NodeKind::Struct { members, .. } => {
                for &member in self.list(members) {
                    f(member);
                }
            }
            NodeKind::TypeOf { expr } => f(expr),
            NodeKind::TypePointer { pointee, .. } => f(pointee),
            NodeKind::TypeArray { element, size, .. } => {
                f(element);
                if let Some(size) = size {
                    f(size);
                }
            }
        }
    }

    /// Link every descendant of `root` to its parent.
    ///
    /// Run once per source unit after parsing; parents are set exactly once.
    pub fn link_parents(&mut self, root: NodeId) {
        let mut worklist = vec![root];
        let mut children = Vec::new();
        while let Some(node) = worklist.pop() {
            children.clear();
            self.for_each_child(node, |child| children.push(child));
            for &child in &children {
                self.set_parent(child, node);
                worklist.push(child);
            }
        }
    }
}

impl fmt::Debug for AstArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AstArena {{ {} nodes, {} list entries }}",
            self.kinds.len(),
            self.lists.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, NodeFlags};

    #[test]
    fn alloc_and_read_back() {
        let mut arena = AstArena::new();
        let a = arena.alloc(NodeKind::Int(1), Span::new(0, 1));
        let b = arena.alloc(NodeKind::Int(2), Span::new(4, 5));
        let add = arena.alloc(
            NodeKind::Binary {
                op: BinaryOp::Add,
                lhs: a,
                rhs: b,
                op_fn: None,
            },
            Span::new(0, 5),
        );

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.kind(a), NodeKind::Int(1));
        assert_eq!(arena.span(b), Span::new(4, 5));
        assert!(matches!(
            arena.kind(add),
            NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn lists_round_trip() {
        let mut arena = AstArena::new();
        let a = arena.alloc(NodeKind::Int(1), Span::DUMMY);
        let b = arena.alloc(NodeKind::Int(2), Span::DUMMY);
        let range = arena.alloc_list(&[a, b]);

        assert_eq!(arena.list(range), &[a, b]);
        assert_eq!(arena.list(NodeRange::EMPTY), &[] as &[NodeId]);
    }

    #[test]
    fn flags_accumulate() {
        let mut arena = AstArena::new();
        let id = arena.alloc(NodeKind::Nil, Span::DUMMY);

        assert!(!arena.has_flag(id, NodeFlags::VALIDATED));
        arena.set_flag(id, NodeFlags::VALIDATED);
        arena.set_flag(id, NodeFlags::CONSTANT);
        assert!(arena.has_flag(id, NodeFlags::VALIDATED));
        assert!(arena.has_flag(id, NodeFlags::CONSTANT));
    }

    #[test]
    fn link_parents_reaches_descendants() {
        let mut arena = AstArena::new();
        let lhs = arena.alloc(NodeKind::Int(1), Span::DUMMY);
        let rhs = arena.alloc(NodeKind::Int(2), Span::DUMMY);
        let add = arena.alloc(
            NodeKind::Binary {
                op: BinaryOp::Add,
                lhs,
                rhs,
                op_fn: None,
            },
            Span::DUMMY,
        );
        let stmts = arena.alloc_list(&[add]);
        let block = arena.alloc(NodeKind::Block { stmts }, Span::DUMMY);

        arena.link_parents(block);

        assert_eq!(arena.parent(add), Some(block));
        assert_eq!(arena.parent(lhs), Some(add));
        assert_eq!(arena.parent(rhs), Some(add));
        assert_eq!(arena.parent(block), None);

        // Parent chain from leaf reaches the root.
        let mut cursor = lhs;
        while let Some(parent) = arena.parent(cursor) {
            cursor = parent;
        }
        assert_eq!(cursor, block);
    }

    #[test]
    fn candidates_default_empty() {
        let mut arena = AstArena::new();
        let id = arena.alloc(NodeKind::Nil, Span::DUMMY);
        assert!(arena.candidates(id).is_empty());

        arena.set_candidates(id, vec![TypeId::new(0)]);
        assert_eq!(arena.candidates(id).len(), 1);
    }
}
