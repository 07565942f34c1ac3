//! Scoped symbol table and name resolution for Mica.
//!
//! The resolver runs between parsing and type checking. It populates the
//! scope tree, binds identifier and type-reference nodes to declarations,
//! materializes declaration types in the type table, attaches operator
//! function overloads, and infers expression types bottom-up. The type
//! checker that follows only validates; it never invents types.

mod resolver;
mod scope;

pub use resolver::Resolver;
pub use scope::{Scope, ScopeKind, ScopeKindSet, ScopeTree, Symbol};
