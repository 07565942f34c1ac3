//! Logos-derived raw tokenizer.
//!
//! Raw tokens carry no payload; the conversion layer slices the source and
//! interns identifier, operator and string text. Whitespace, newlines, `;`
//! and line comments are trivia: the grammar never needs a statement
//! separator, so they are skipped here.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n;]+")]
#[logos(skip r"//[^\n]*")]
pub enum RawToken {
    // Directives
    #[token("#load")]
    Load,

    // Keywords
    #[token("enum")]
    Enum,
    #[token("case")]
    Case,
    #[token("func")]
    Func,
    #[token("prefix")]
    Prefix,
    #[token("infix")]
    Infix,
    #[token("foreign")]
    Foreign,
    #[token("intrinsic")]
    Intrinsic,
    #[token("struct")]
    Struct,
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("fallthrough")]
    Fallthrough,
    #[token("return")]
    Return,
    #[token("defer")]
    Defer,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("guard")]
    Guard,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("switch")]
    Switch,
    #[token("while")]
    While,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("Any")]
    Any,
    #[token("typeof")]
    Typeof,
    #[token("sizeof")]
    Sizeof,
    #[token("as")]
    As,
    #[token("is")]
    Is,

    // Punctuators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("->", priority = 10)]
    Arrow,

    /// Maximal munch of operator characters; classified by the parser's
    /// operator table.
    #[regex(r"[+\-*/%&|^~!<>=.]+")]
    Operator,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexInt,
    #[regex(r"0[bB][01]+")]
    BinInt,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
}
