//! AST node kinds and handle types.
//!
//! Nodes live in the module's [`AstArena`](crate::AstArena) and reference
//! each other through `NodeId` indices; child lists are ranges into the
//! arena's flattened list storage. Common per-node attributes (span, parent,
//! scope, flags, resolved type) live in parallel arrays on the arena, keyed
//! by the same `NodeId`.

mod flags;
mod node;
mod operators;

pub use flags::NodeFlags;
pub use node::{CaseKind, ControlKind, ElseArm, FuncKind, LoopKind, NodeKind, TypeOpKind};
pub use operators::{BinaryOp, UnaryOp};

use crate::Name;
use std::fmt;
use std::num::NonZeroU32;

/// Handle to a node in the arena.
///
/// Stored with a +1 bias so `Option<NodeId>` is 4 bytes (niche-optimized);
/// resolution fields in node payloads are mostly optional handles.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[inline]
    pub fn new(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(raw) => NodeId(raw),
            None => panic!("node id overflow: index {index}"),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0.get() - 1)
    }
}

/// A contiguous run of node ids in the arena's list storage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NodeRange {
    pub start: u32,
    pub len: u16,
}

impl NodeRange {
    /// The empty range.
    pub const EMPTY: NodeRange = NodeRange { start: 0, len: 0 };

    #[inline]
    pub fn new(start: u32, len: u16) -> Self {
        NodeRange { start, len }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Handle to a scope in the symbol table's scope tree.
///
/// Defined here so that AST nodes can record their enclosing scope without
/// depending on the symbol table crate; the resolver assigns these.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ScopeId(NonZeroU32);

impl ScopeId {
    /// The global root scope.
    pub const GLOBAL: ScopeId = ScopeId(NonZeroU32::MIN);

    #[inline]
    pub fn new(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(raw) => ScopeId(raw),
            None => panic!("scope id overflow: index {index}"),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0.get() - 1)
    }
}

/// Handle to a canonical type in the module's type table.
///
/// Two type references with the same canonical name share one `TypeId`, so
/// type equality is handle equality.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TypeId(NonZeroU32);

impl TypeId {
    #[inline]
    pub fn new(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(raw) => TypeId(raw),
            None => panic!("type id overflow: index {index}"),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0.get() - 1)
    }
}

/// The root of a compiled module.
///
/// Source units accumulate as the load graph closes, so the module keeps a
/// growable list instead of an arena range. The entry point is located by
/// the type checker (zero or more than one matching function is an error).
#[derive(Debug)]
pub struct Module {
    /// Module name (used for artifact naming by a back-end).
    pub name: Name,
    /// Name the entry-point function must have. Defaults to `main`.
    pub entry_name: Name,
    /// Parsed source units, in load order.
    pub units: Vec<NodeId>,
    /// The entry-point function, set during module validation.
    pub entry_point: Option<NodeId>,
    /// Validate-once guard for module validation.
    pub validated: bool,
}

impl Module {
    pub fn new(name: Name, entry_name: Name) -> Self {
        Module {
            name,
            entry_name,
            units: Vec::new(),
            entry_point: None,
            validated: false,
        }
    }
}

// Handle types are stored in bulk; keep them (and their options) compact.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{NodeId, NodeRange, ScopeId, TypeId};
    crate::static_assert_size!(NodeId, 4);
    crate::static_assert_size!(Option<NodeId>, 4);
    crate::static_assert_size!(ScopeId, 4);
    crate::static_assert_size!(TypeId, 4);
    crate::static_assert_size!(NodeRange, 8);
}
