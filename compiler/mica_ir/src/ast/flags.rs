//! Per-node flag bits.

use std::fmt;

/// Bitset of per-node flags.
///
/// Stored in a parallel array on the arena. The builder methods are `const`
/// so flag combinations can be named as constants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct NodeFlags(u16);

impl NodeFlags {
    pub const NONE: NodeFlags = NodeFlags(0);

    /// The node has been validated; re-entering validation is a no-op.
    pub const VALIDATED: NodeFlags = NodeFlags(1 << 0);
    /// The expression is a compile-time constant.
    pub const CONSTANT: NodeFlags = NodeFlags(1 << 1);
    /// The value declaration is immutable (`let`).
    pub const IMMUTABLE: NodeFlags = NodeFlags(1 << 2);
    /// Every control-flow path through the statement ends in a return.
    pub const ALWAYS_RETURNS: NodeFlags = NodeFlags(1 << 3);
    /// The block contains a control-transfer statement.
    pub const HAS_TERMINATOR: NodeFlags = NodeFlags(1 << 4);
    /// The switch covers every value of its argument type.
    pub const SWITCH_EXHAUSTIVE: NodeFlags = NodeFlags(1 << 5);
    /// The array type has a resolved literal size.
    pub const STATIC_ARRAY: NodeFlags = NodeFlags(1 << 6);
    /// The structure stores itself by value.
    pub const CYCLIC_STORAGE: NodeFlags = NodeFlags(1 << 7);

    /// Union of two flag sets.
    #[inline]
    #[must_use]
    pub const fn with(self, other: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | other.0)
    }

    /// Check whether every bit of `other` is set.
    #[inline]
    pub const fn has(self, other: NodeFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Set the bits of `other` in place.
    #[inline]
    pub fn insert(&mut self, other: NodeFlags) {
        self.0 |= other.0;
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeFlags({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_has() {
        let mut flags = NodeFlags::NONE;
        assert!(!flags.has(NodeFlags::VALIDATED));

        flags.insert(NodeFlags::VALIDATED);
        flags.insert(NodeFlags::CONSTANT);
        assert!(flags.has(NodeFlags::VALIDATED));
        assert!(flags.has(NodeFlags::CONSTANT));
        assert!(!flags.has(NodeFlags::IMMUTABLE));
    }

    #[test]
    fn with_is_union() {
        let flags = NodeFlags::ALWAYS_RETURNS.with(NodeFlags::HAS_TERMINATOR);
        assert!(flags.has(NodeFlags::ALWAYS_RETURNS));
        assert!(flags.has(NodeFlags::HAS_TERMINATOR));
    }
}
