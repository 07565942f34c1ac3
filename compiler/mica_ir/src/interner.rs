//! String interner for identifier storage.
//!
//! Maps canonical text to compact [`Name`] handles plus the inverse lookup;
//! interning is case-sensitive and byte-exact, and equality of names is
//! handle equality. A single mutex guards the map - phases within a module
//! run on one thread, and the lock keeps the interner safe to hand to a
//! host that drives several modules, the same way the diagnostic handler
//! stays a thread-safe sink.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Handle to an interned string.
///
/// The raw value is the string's insertion index; equality and hashing are
/// O(1) on the handle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl Name {
    /// The pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw handle value, for compact debug output.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// The interner exceeded `u32::MAX` distinct strings.
    Overflow { count: usize },
}

impl fmt::Display for InternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternError::Overflow { count } => {
                write!(f, "interner exceeded capacity: {count} strings")
            }
        }
    }
}

impl std::error::Error for InternError {}

/// Interner storage: the text-to-handle map and its inverse.
struct Inner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// The string interner.
///
/// # Thread Safety
/// A mutex guards the storage, so a handler-style shared reference stays
/// sound if a host compiles independent modules concurrently. Wrap in
/// [`SharedInterner`] to share across phases.
pub struct StringInterner {
    inner: Mutex<Inner>,
}

impl StringInterner {
    /// Create a new interner with the language keywords pre-interned.
    pub fn new() -> Self {
        let mut inner = Inner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // The empty string sits at index 0 so `Name::EMPTY` is always valid.
        let empty: &'static str = "";
        inner.map.insert(empty, 0);
        inner.strings.push(empty);

        let interner = StringInterner {
            inner: Mutex::new(inner),
        };
        interner.pre_intern_keywords();
        interner
    }

    /// Try to intern a string, returning its Name or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let mut inner = self.inner.lock();
        if let Some(&index) = inner.map.get(s) {
            return Ok(Name(index));
        }

        let index = u32::try_from(inner.strings.len()).map_err(|_| InternError::Overflow {
            count: inner.strings.len(),
        })?;
        // Interned strings live for the whole process; leaking gives the
        // map a key that borrows nothing.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        inner.strings.push(leaked);
        inner.map.insert(leaked, index);
        Ok(Name(index))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity. Use `try_intern` for
    /// fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        self.inner.lock().strings[name.index()]
    }

    /// Look up the string for a Name, returning a `'static` reference.
    ///
    /// This is safe because interned strings are leaked, never deallocated.
    pub fn lookup_static(&self, name: Name) -> &'static str {
        self.inner.lock().strings[name.index()]
    }

    /// Pre-intern all Mica keywords and common identifiers.
    fn pre_intern_keywords(&self) {
        const KEYWORDS: &[&str] = &[
            // Reserved keywords
            "break",
            "case",
            "continue",
            "defer",
            "do",
            "else",
            "enum",
            "fallthrough",
            "false",
            "for",
            "foreign",
            "func",
            "guard",
            "if",
            "in",
            "infix",
            "intrinsic",
            "let",
            "nil",
            "prefix",
            "return",
            "sizeof",
            "struct",
            "switch",
            "true",
            "typeof",
            "var",
            "while",
            // Word operators
            "as",
            "is",
            // Builtin type names
            "Any",
            "Void",
            "Bool",
            "String",
            "Int8",
            "Int16",
            "Int32",
            "Int64",
            "Int128",
            "Int",
            "UInt8",
            "UInt16",
            "UInt32",
            "UInt64",
            "UInt128",
            "UInt",
            "Float16",
            "Float32",
            "Float64",
            "Float80",
            "Float128",
            "Float",
            // Common identifiers
            "main",
        ];

        for kw in KEYWORDS {
            self.intern(kw);
        }
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.lock().strings.len()
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared interner for handing one interner to every compiler phase.
///
/// This newtype enforces that all interner sharing goes through this type,
/// preventing accidental direct `Arc<StringInterner>` usage.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let interner = StringInterner::new();

        let hello = interner.intern("hello");
        let world = interner.intern("world");
        let hello2 = interner.intern("hello");

        assert_eq!(hello, hello2);
        assert_ne!(hello, world);

        assert_eq!(interner.lookup(hello), "hello");
        assert_eq!(interner.lookup(world), "world");
    }

    #[test]
    fn empty_string_is_name_empty() {
        let interner = StringInterner::new();
        let empty = interner.intern("");
        assert_eq!(empty, Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn keywords_pre_interned() {
        let interner = StringInterner::new();
        let before = interner.len();

        let func = interner.intern("func");
        let guard = interner.intern("guard");

        assert_eq!(interner.lookup(func), "func");
        assert_eq!(interner.lookup(guard), "guard");
        // Re-interning keywords allocates nothing new.
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn shared_interner_handles_agree() {
        let interner = SharedInterner::new();
        let interner2 = interner.clone();

        let a = interner.intern("shared");
        let b = interner2.intern("shared");

        assert_eq!(a, b);
    }

    #[test]
    fn lookup_static_outlives_the_borrow() {
        let interner = StringInterner::new();
        let name = interner.intern("durable");
        let text: &'static str = interner.lookup_static(name);
        assert_eq!(text, "durable");
    }
}
