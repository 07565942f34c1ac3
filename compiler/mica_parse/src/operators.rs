//! The operator catalogue.
//!
//! A fixed table mapping operator lexemes to their fixities, precedences
//! and associativities. The parser queries it during precedence climbing;
//! the lexer never decides what an operator means. Precedence is a
//! non-negative integer, higher binds tighter.

use rustc_hash::FxHashMap;

use mica_ir::{BinaryOp, Name, StringInterner, TypeOpKind, UnaryOp};

/// Operator fixity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

/// Associativity of an infix operator.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Assoc {
    Left,
    Right,
}

/// What the parser builds when an operator matches.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum OpKind {
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// `=` and the compound assignments (`Some(Add)` for `+=`).
    Assign(Option<BinaryOp>),
    /// `as` / `is`; the right operand is parsed as a type.
    TypeOp(TypeOpKind),
    /// Postfix `(` - call argument list.
    Call,
    /// Postfix `[` - subscript argument list.
    Subscript,
    /// Postfix `.` - member access.
    Member,
    /// Postfix `*` - pointer type suffix, only meaningful in type position.
    PointerStar,
}

/// One operator table entry.
#[derive(Copy, Clone, Debug)]
pub struct OpInfo {
    pub kind: OpKind,
    pub precedence: u32,
    pub assoc: Assoc,
}

const TABLE: &[(&str, Fixity, u32, Assoc, OpKind)] = {
    use Assoc::{Left, Right};
    use Fixity::{Infix, Postfix, Prefix};
    &[
        ("()", Postfix, 1000, Left, OpKind::Call),
        ("[]", Postfix, 1000, Left, OpKind::Subscript),
        (".", Postfix, 1000, Left, OpKind::Member),
        ("*", Postfix, 1000, Left, OpKind::PointerStar),
        ("!", Prefix, 950, Left, OpKind::Unary(UnaryOp::Not)),
        ("~", Prefix, 950, Left, OpKind::Unary(UnaryOp::BitNot)),
        ("+", Prefix, 950, Left, OpKind::Unary(UnaryOp::Plus)),
        ("-", Prefix, 950, Left, OpKind::Unary(UnaryOp::Neg)),
        ("<<", Infix, 900, Left, OpKind::Binary(BinaryOp::Shl)),
        (">>", Infix, 900, Left, OpKind::Binary(BinaryOp::Shr)),
        ("*", Infix, 800, Left, OpKind::Binary(BinaryOp::Mul)),
        ("/", Infix, 800, Left, OpKind::Binary(BinaryOp::Div)),
        ("%", Infix, 800, Left, OpKind::Binary(BinaryOp::Rem)),
        ("&", Infix, 800, Left, OpKind::Binary(BinaryOp::BitAnd)),
        ("+", Infix, 700, Left, OpKind::Binary(BinaryOp::Add)),
        ("-", Infix, 700, Left, OpKind::Binary(BinaryOp::Sub)),
        ("|", Infix, 700, Left, OpKind::Binary(BinaryOp::BitOr)),
        ("^", Infix, 700, Left, OpKind::Binary(BinaryOp::BitXor)),
        ("as", Infix, 600, Left, OpKind::TypeOp(TypeOpKind::Bitcast)),
        ("is", Infix, 600, Left, OpKind::TypeOp(TypeOpKind::Check)),
        ("<", Infix, 500, Left, OpKind::Binary(BinaryOp::Lt)),
        ("<=", Infix, 500, Left, OpKind::Binary(BinaryOp::LtEq)),
        (">", Infix, 500, Left, OpKind::Binary(BinaryOp::Gt)),
        (">=", Infix, 500, Left, OpKind::Binary(BinaryOp::GtEq)),
        ("==", Infix, 500, Left, OpKind::Binary(BinaryOp::Eq)),
        ("!=", Infix, 500, Left, OpKind::Binary(BinaryOp::NotEq)),
        ("&&", Infix, 400, Left, OpKind::Binary(BinaryOp::LogicAnd)),
        ("||", Infix, 300, Left, OpKind::Binary(BinaryOp::LogicOr)),
        ("=", Infix, 100, Right, OpKind::Assign(None)),
        ("*=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Mul))),
        ("/=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Div))),
        ("%=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Rem))),
        ("+=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Add))),
        ("-=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Sub))),
        ("<<=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Shl))),
        (">>=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::Shr))),
        ("&=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::BitAnd))),
        ("|=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::BitOr))),
        ("^=", Infix, 100, Right, OpKind::Assign(Some(BinaryOp::BitXor))),
    ]
};

/// The operator table, keyed by interned lexeme and fixity.
pub struct OperatorTable {
    map: FxHashMap<(Name, Fixity), OpInfo>,
    /// Distinct precedence levels, ascending; for `precedence_before`.
    levels: Vec<u32>,
}

impl OperatorTable {
    pub fn new(interner: &StringInterner) -> Self {
        let mut map = FxHashMap::default();
        let mut levels = Vec::new();
        for &(lexeme, fixity, precedence, assoc, kind) in TABLE {
            let name = interner.intern(lexeme);
            map.insert(
                (name, fixity),
                OpInfo {
                    kind,
                    precedence,
                    assoc,
                },
            );
            if !levels.contains(&precedence) {
                levels.push(precedence);
            }
        }
        levels.sort_unstable();
        OperatorTable { map, levels }
    }

    /// Look up an operator by lexeme and fixity.
    pub fn lookup(&self, name: Name, fixity: Fixity) -> Option<OpInfo> {
        self.map.get(&(name, fixity)).copied()
    }

    /// The next lower precedence level, used as the climbing threshold for
    /// right-associative operators. Returns 0 below the lowest level.
    pub fn precedence_before(&self, precedence: u32) -> u32 {
        self.levels
            .iter()
            .rev()
            .find(|&&level| level < precedence)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_ir::StringInterner;

    #[test]
    fn lookup_by_fixity() {
        let interner = StringInterner::new();
        let table = OperatorTable::new(&interner);
        let star = interner.intern("*");

        let infix = table.lookup(star, Fixity::Infix).unwrap();
        assert_eq!(infix.kind, OpKind::Binary(BinaryOp::Mul));
        assert_eq!(infix.precedence, 800);

        let postfix = table.lookup(star, Fixity::Postfix).unwrap();
        assert_eq!(postfix.kind, OpKind::PointerStar);

        assert!(table.lookup(star, Fixity::Prefix).is_none());
    }

    #[test]
    fn unknown_lexeme_fails() {
        let interner = StringInterner::new();
        let table = OperatorTable::new(&interner);
        let bogus = interner.intern("+-");
        assert!(table.lookup(bogus, Fixity::Infix).is_none());
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let interner = StringInterner::new();
        let table = OperatorTable::new(&interner);
        let mul = table.lookup(interner.intern("*"), Fixity::Infix).unwrap();
        let add = table.lookup(interner.intern("+"), Fixity::Infix).unwrap();
        assert!(mul.precedence > add.precedence);
    }

    #[test]
    fn precedence_before_steps_down_levels() {
        let interner = StringInterner::new();
        let table = OperatorTable::new(&interner);

        assert_eq!(table.precedence_before(800), 700);
        assert_eq!(table.precedence_before(300), 100);
        assert_eq!(table.precedence_before(100), 0);
        assert_eq!(table.precedence_before(0), 0);
    }

    #[test]
    fn assignments_are_right_associative() {
        let interner = StringInterner::new();
        let table = OperatorTable::new(&interner);
        let assign = table.lookup(interner.intern("="), Fixity::Infix).unwrap();
        assert_eq!(assign.assoc, Assoc::Right);
        assert_eq!(assign.kind, OpKind::Assign(None));

        let add_assign = table.lookup(interner.intern("+="), Fixity::Infix).unwrap();
        assert_eq!(add_assign.kind, OpKind::Assign(Some(BinaryOp::Add)));
    }
}
