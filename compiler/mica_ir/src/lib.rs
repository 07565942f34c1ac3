//! Mica IR - core data structures for the Mica compiler front-end.
//!
//! This crate contains the types every phase shares:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - AST nodes and the node arena
//! - The pretty-printer used for AST dumps and round-trip tests
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → `Name(u32)`, Types → `TypeId(u32)`
//! - **Flatten Everything**: No `Box<Node>`, use `NodeId(u32)` indices
//! - Floats are stored as `u64` bits so node kinds stay `Eq + Hash`

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
mod interner;
pub mod pretty;
mod span;
mod token;

pub use arena::AstArena;
pub use ast::{
    BinaryOp, CaseKind, ControlKind, ElseArm, FuncKind, LoopKind, Module, NodeFlags, NodeId,
    NodeKind, NodeRange, ScopeId, TypeId, TypeOpKind, UnaryOp,
};
pub use interner::{InternError, Name, SharedInterner, StringInterner};
pub use span::{Span, SpanError};
pub use token::{Token, TokenKind, TokenList};
