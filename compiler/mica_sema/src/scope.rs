//! The scope tree and symbol table.
//!
//! One tree per module, rooted at the global scope. Scopes are stored in an
//! id-indexed arena (handles stay valid as the vector grows), each holding
//! its kind, parent, bounding source range, an ordered list of symbol
//! entries and an optional anchor node (e.g. the switch statement for a
//! Switch scope).
//!
//! Lookups are position-restricted: a symbol is visible only at source
//! positions after its definition, except in the global scope where
//! top-level declarations are visible throughout. This implements the
//! language's forward-declaration rules without a separate pre-pass over
//! local scopes.

use mica_ir::{Name, NodeId, ScopeId, Span};

/// Kind of a scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    Global,
    Module,
    Enumeration,
    Structure,
    Function,
    Branch,
    Loop,
    Switch,
    Case,
}

impl ScopeKind {
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Module => "module",
            ScopeKind::Enumeration => "enumeration",
            ScopeKind::Structure => "structure",
            ScopeKind::Function => "function",
            ScopeKind::Branch => "branch",
            ScopeKind::Loop => "loop",
            ScopeKind::Switch => "switch",
            ScopeKind::Case => "case",
        }
    }
}

/// A set of scope kinds, used for enclosing-scope queries
/// (`break` targets Loop | Switch, `continue` targets Loop, ...).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ScopeKindSet(u16);

impl ScopeKindSet {
    pub const fn new() -> Self {
        ScopeKindSet(0)
    }

    pub const fn single(kind: ScopeKind) -> Self {
        ScopeKindSet(kind.bit())
    }

    #[must_use]
    pub const fn with(self, kind: ScopeKind) -> Self {
        ScopeKindSet(self.0 | kind.bit())
    }

    pub const fn contains(self, kind: ScopeKind) -> bool {
        (self.0 & kind.bit()) != 0
    }
}

impl Default for ScopeKindSet {
    fn default() -> Self {
        Self::new()
    }
}

/// One symbol entry: a name defined at a source range, with the declaring
/// AST node attached once known.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Name,
    pub span: Span,
    pub node: Option<NodeId>,
}

/// One scope in the tree.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Bounding range of the symbols defined here; `None` until the first
    /// insertion.
    pub range: Option<Span>,
    /// Symbol entries ordered by definition position.
    symbols: Vec<Symbol>,
    pub children: Vec<ScopeId>,
    /// The AST node this scope hangs off (switch statement for a Switch
    /// scope, function declaration for a Function scope, ...).
    pub anchor: Option<NodeId>,
}

impl Scope {
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// The scope tree of one module.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create a tree containing only the global scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                range: None,
                symbols: Vec::new(),
                children: Vec::new(),
                anchor: None,
            }],
            current: ScopeId::GLOBAL,
        }
    }

    /// The scope the walker is currently inside.
    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Create a child of the current scope and enter it.
    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            range: None,
            symbols: Vec::new(),
            children: Vec::new(),
            anchor: None,
        });
        self.scopes[self.current.index()].children.push(id);
        self.current = id;
        id
    }

    /// Return to the parent scope.
    ///
    /// # Panics
    /// Panics if called on the global scope; push/pop calls must pair up.
    pub fn pop(&mut self) -> ScopeId {
        let parent = self.scopes[self.current.index()]
            .parent
            .unwrap_or_else(|| panic!("scope pop below the global scope"));
        self.current = parent;
        parent
    }

    /// Attach the anchoring AST node to a scope.
    pub fn set_anchor(&mut self, id: ScopeId, node: NodeId) {
        self.scopes[id.index()].anchor = Some(node);
    }

    pub fn anchor(&self, id: ScopeId) -> Option<NodeId> {
        self.scopes[id.index()].anchor
    }

    /// Insert a symbol into a scope, keeping entries ordered by definition
    /// position and growing the scope's bounding range.
    ///
    /// Fails (returning `false`) if the name is already present in this
    /// scope; the caller reports the redeclaration.
    pub fn insert(&mut self, id: ScopeId, name: Name, span: Span, node: NodeId) -> bool {
        let scope = &mut self.scopes[id.index()];
        if scope.symbols.iter().any(|s| s.name == name) {
            return false;
        }

        let key = (span.start, span.end);
        let at = scope
            .symbols
            .partition_point(|s| (s.span.start, s.span.end) < key);
        scope.symbols.insert(
            at,
            Symbol {
                name,
                span,
                node: Some(node),
            },
        );

        scope.range = Some(match scope.range {
            None => span,
            Some(range) => range.merge(span),
        });
        true
    }

    /// Insert into the current scope.
    pub fn insert_current(&mut self, name: Name, span: Span, node: NodeId) -> bool {
        self.insert(self.current, name, span, node)
    }

    /// Look a name up as of a source position.
    ///
    /// Searches `from` for a symbol defined strictly before `position`,
    /// then walks the parent chain. The global scope ignores the position:
    /// top-level declarations are visible throughout the module.
    pub fn lookup_as_of(&self, from: ScopeId, name: Name, position: u32) -> Option<&Symbol> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.index()];
            let found = scope.symbols.iter().find(|s| {
                s.name == name && (scope.kind == ScopeKind::Global || s.span.start < position)
            });
            if found.is_some() {
                return found;
            }
            cursor = scope.parent;
        }
        None
    }

    /// Look a name up in exactly one scope, ignoring position.
    ///
    /// Used for member resolution against enumeration and structure scopes.
    pub fn lookup_local(&self, id: ScopeId, name: Name) -> Option<&Symbol> {
        self.scopes[id.index()].symbols.iter().find(|s| s.name == name)
    }

    /// Walk from `from` outwards (including `from` itself) to the nearest
    /// scope whose kind is in `kinds`.
    pub fn enclosing_of_kinds(&self, from: ScopeId, kinds: ScopeKindSet) -> Option<ScopeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.index()];
            if kinds.contains(scope.kind) {
                return Some(id);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Render the tree for `--dump-scopes`.
    pub fn dump(&self, interner: &mica_ir::StringInterner) -> String {
        let mut out = String::new();
        self.dump_scope(ScopeId::GLOBAL, 0, interner, &mut out);
        out
    }

    fn dump_scope(
        &self,
        id: ScopeId,
        depth: usize,
        interner: &mica_ir::StringInterner,
        out: &mut String,
    ) {
        let scope = self.get(id);
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(scope.kind.display_name());
        if !scope.symbols.is_empty() {
            out.push_str(" [");
            for (i, symbol) in scope.symbols.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.lookup(symbol.name));
            }
            out.push(']');
        }
        out.push('\n');
        for &child in &scope.children {
            self.dump_scope(child, depth + 1, interner, out);
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_ir::StringInterner;

    fn node(i: u32) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn push_pop_tracks_parents() {
        let mut tree = ScopeTree::new();
        let f = tree.push(ScopeKind::Function);
        let b = tree.push(ScopeKind::Branch);

        assert_eq!(tree.get(b).parent, Some(f));
        assert_eq!(tree.pop(), f);
        assert_eq!(tree.pop(), ScopeId::GLOBAL);
        assert_eq!(tree.get(f).parent, Some(ScopeId::GLOBAL));
    }

    #[test]
    fn duplicate_insert_fails() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let x = interner.intern("x");

        assert!(tree.insert_current(x, Span::new(1, 2), node(0)));
        assert!(!tree.insert_current(x, Span::new(5, 6), node(1)));
        assert_eq!(tree.get(ScopeId::GLOBAL).symbols().len(), 1);
    }

    #[test]
    fn local_lookup_is_position_restricted() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let x = interner.intern("x");

        let f = tree.push(ScopeKind::Function);
        tree.insert(f, x, Span::new(10, 11), node(0));

        // Before the definition: invisible.
        assert!(tree.lookup_as_of(f, x, 5).is_none());
        // At the definition start: still invisible (strict forward).
        assert!(tree.lookup_as_of(f, x, 10).is_none());
        // After: visible.
        assert!(tree.lookup_as_of(f, x, 12).is_some());
    }

    #[test]
    fn global_lookup_ignores_position() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let f = interner.intern("f");

        tree.insert(ScopeId::GLOBAL, f, Span::new(100, 101), node(0));
        let inner = tree.push(ScopeKind::Function);

        // Position before the global definition - still resolves.
        assert!(tree.lookup_as_of(inner, f, 5).is_some());
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let x = interner.intern("x");
        let y = interner.intern("y");

        let f = tree.push(ScopeKind::Function);
        tree.insert(f, x, Span::new(10, 11), node(0));
        let b = tree.push(ScopeKind::Branch);
        tree.insert(b, y, Span::new(20, 21), node(1));

        assert!(tree.lookup_as_of(b, x, 30).is_some());
        assert!(tree.lookup_as_of(b, y, 30).is_some());
        // y is invisible from the outer function scope.
        assert!(tree.lookup_as_of(f, y, 30).is_none());
    }

    #[test]
    fn shadowing_resolves_innermost_first() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let x = interner.intern("x");

        let f = tree.push(ScopeKind::Function);
        tree.insert(f, x, Span::new(10, 11), node(0));
        let b = tree.push(ScopeKind::Branch);
        tree.insert(b, x, Span::new(20, 21), node(1));

        let symbol = tree.lookup_as_of(b, x, 30).unwrap();
        assert_eq!(symbol.node, Some(node(1)));
    }

    #[test]
    fn enclosing_of_kinds_includes_self() {
        let mut tree = ScopeTree::new();
        tree.push(ScopeKind::Function);
        let l = tree.push(ScopeKind::Loop);
        let b = tree.push(ScopeKind::Branch);

        let loops = ScopeKindSet::single(ScopeKind::Loop);
        assert_eq!(tree.enclosing_of_kinds(b, loops), Some(l));
        assert_eq!(tree.enclosing_of_kinds(l, loops), Some(l));

        let switches = ScopeKindSet::single(ScopeKind::Switch);
        assert_eq!(tree.enclosing_of_kinds(b, switches), None);

        let either = ScopeKindSet::single(ScopeKind::Loop).with(ScopeKind::Switch);
        assert_eq!(tree.enclosing_of_kinds(b, either), Some(l));
    }

    #[test]
    fn scope_range_bounds_symbols() {
        let interner = StringInterner::new();
        let mut tree = ScopeTree::new();
        let a = interner.intern("a");
        let b = interner.intern("b");

        let f = tree.push(ScopeKind::Function);
        tree.insert(f, a, Span::new(20, 21), node(0));
        tree.insert(f, b, Span::new(5, 6), node(1));

        assert_eq!(tree.get(f).range, Some(Span::new(5, 21)));
        // Entries stay ordered by position despite insertion order.
        let names: Vec<Name> = tree.get(f).symbols().iter().map(|s| s.name).collect();
        assert_eq!(names, vec![b, a]);
    }
}
