//! Operator kinds for unary and binary expressions.
//!
//! The parser's operator table maps lexemes to these kinds together with
//! precedence and associativity; the resolver uses the lexeme to match
//! user-declared operator functions.

/// Prefix operator kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `!` - logical not.
    Not,
    /// `~` - bitwise not.
    BitNot,
    /// `+` - unary plus.
    Plus,
    /// `-` - unary minus.
    Neg,
}

impl UnaryOp {
    /// The operator's source lexeme.
    pub fn lexeme(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        }
    }
}

/// Infix operator kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Shl,
    Shr,
    Mul,
    Div,
    Rem,
    BitAnd,
    Add,
    Sub,
    BitOr,
    BitXor,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    LogicAnd,
    LogicOr,
}

impl BinaryOp {
    /// The operator's source lexeme.
    pub fn lexeme(self) -> &'static str {
        match self {
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::LogicAnd => "&&",
            BinaryOp::LogicOr => "||",
        }
    }

    /// Whether the result type is `Bool` regardless of operand types.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::Eq
                | BinaryOp::NotEq
        )
    }

    /// Whether both operands and the result must be `Bool`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicAnd | BinaryOp::LogicOr)
    }

    /// Whether the operation requires integer operands.
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
        )
    }

    /// Whether the operation is arithmetic (`+ - * / %`).
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }
}
