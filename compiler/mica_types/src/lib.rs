//! Semantic types for Mica.
//!
//! Types are separate from type-reference AST nodes. Every type is
//! canonicalized in a per-module [`TypeTable`] keyed by its canonical name:
//! two references to `Int32` (or to `Point*`, or to `(Int) -> Void`) yield
//! the same [`TypeId`], so type equality throughout the checker is handle
//! equality. Types outlive AST nodes.

mod table;

pub use table::TypeTable;

use mica_ir::{Name, NodeId, TypeId};

/// Integer bit widths. `Native` is the target's pointer-sized integer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,
    Native,
}

impl IntWidth {
    /// Ordering rank used for widening checks; `Native` is treated as the
    /// widest fixed width it can hold everywhere (64 bits).
    pub fn rank(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 | IntWidth::Native => 64,
            IntWidth::W128 => 128,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            IntWidth::W8 => "8",
            IntWidth::W16 => "16",
            IntWidth::W32 => "32",
            IntWidth::W64 => "64",
            IntWidth::W128 => "128",
            IntWidth::Native => "",
        }
    }
}

/// Floating point widths. `Native` is the target's preferred float.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FloatWidth {
    W16,
    W32,
    W64,
    W80,
    W128,
    Native,
}

impl FloatWidth {
    pub fn rank(self) -> u32 {
        match self {
            FloatWidth::W16 => 16,
            FloatWidth::W32 => 32,
            FloatWidth::W64 | FloatWidth::Native => 64,
            FloatWidth::W80 => 80,
            FloatWidth::W128 => 128,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            FloatWidth::W16 => "16",
            FloatWidth::W32 => "32",
            FloatWidth::W64 => "64",
            FloatWidth::W80 => "80",
            FloatWidth::W128 => "128",
            FloatWidth::Native => "",
        }
    }
}

/// One member of a structure type. Member indexes are dense `[0, n)` in
/// declaration order: a member's index is its position in the vector.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructMember {
    pub name: Name,
    pub ty: TypeId,
}

/// A canonical semantic type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    /// The distinguished error type; compatible with everything so one
    /// failure does not cascade.
    Error,
    Any,
    Void,
    Bool,
    String,
    Int { width: IntWidth, signed: bool },
    Float(FloatWidth),
    Pointer { pointee: TypeId, depth: u32 },
    StaticArray { element: TypeId, len: u64 },
    DynamicArray { element: TypeId },
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
        /// Declaration back-link, used to name parameters in diagnostics.
        decl: Option<NodeId>,
    },
    Struct {
        name: Name,
        decl: NodeId,
        /// Filled in after all named types are registered, so members can
        /// reference any structure (including, illegally, this one - the
        /// checker diagnoses cyclic storage over declarations).
        members: Vec<StructMember>,
    },
    Enum { name: Name, decl: NodeId },
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::StaticArray { .. } | Type::DynamicArray { .. })
    }
}
