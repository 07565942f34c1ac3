//! Lexer for Mica using logos with string interning.
//!
//! The main entry point is [`lex()`], which converts one source file into a
//! [`TokenList`]. Spans are offset by the file's base in the driver's
//! source map, so token positions are globally ordered across a module.
//!
//! # Token Types
//!
//! - **Literals**: integers (decimal, hex, binary), floats, strings
//! - **Keywords**: reserved words (`func`, `guard`, `switch`, ...)
//! - **Operators**: maximal-munch lexemes, interned; the parser's operator
//!   table decides whether a lexeme is meaningful
//! - **Identifiers**: user-defined names (interned for O(1) comparison)
//!
//! # Escape Sequences
//!
//! String literals support `\n`, `\r`, `\t`, `\\`, `\"`, `\'`, `\0`.
//! Invalid escapes are preserved literally (e.g. `\q` stays `\q`).
//!
//! # Error Handling
//!
//! Invalid input produces `TokenKind::Error`; lexing continues past errors
//! so a malformed file still parses as far as possible.

mod raw;

use logos::Logos;
use mica_ir::{Span, StringInterner, Token, TokenKind, TokenList};
use raw::RawToken;

/// Lex one source file into a [`TokenList`].
///
/// `base` is the file's first global byte offset (from the source map); it
/// is added to every span. The returned list always ends with `Eof`.
pub fn lex(source: &str, base: u32, interner: &StringInterner) -> TokenList {
    let mut tokens = TokenList::with_capacity(source.len() / 6 + 1);
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = match Span::try_from_range(lexer.span()) {
            Ok(span) => Span::new(span.start + base, span.end + base),
            Err(_) => Span::new(u32::MAX - 1, u32::MAX),
        };
        let kind = match result {
            Ok(raw) => convert(raw, lexer.slice(), interner),
            Err(()) => TokenKind::Error,
        };
        tokens.push(Token::new(kind, span));
    }

    let eof = base.saturating_add(u32::try_from(source.len()).unwrap_or(u32::MAX - 1));
    tokens.push(Token::new(TokenKind::Eof, Span::point(eof)));
    tokens
}

/// Convert a raw token to a `TokenKind`, interning text payloads.
fn convert(raw: RawToken, slice: &str, interner: &StringInterner) -> TokenKind {
    match raw {
        RawToken::Load => TokenKind::Load,
        RawToken::Enum => TokenKind::Enum,
        RawToken::Case => TokenKind::Case,
        RawToken::Func => TokenKind::Func,
        RawToken::Prefix => TokenKind::Prefix,
        RawToken::Infix => TokenKind::Infix,
        RawToken::Foreign => TokenKind::Foreign,
        RawToken::Intrinsic => TokenKind::Intrinsic,
        RawToken::Struct => TokenKind::Struct,
        RawToken::Var => TokenKind::Var,
        RawToken::Let => TokenKind::Let,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Fallthrough => TokenKind::Fallthrough,
        RawToken::Return => TokenKind::Return,
        RawToken::Defer => TokenKind::Defer,
        RawToken::Do => TokenKind::Do,
        RawToken::For => TokenKind::For,
        RawToken::In => TokenKind::In,
        RawToken::Guard => TokenKind::Guard,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::Switch => TokenKind::Switch,
        RawToken::While => TokenKind::While,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Nil => TokenKind::Nil,
        RawToken::Any => TokenKind::Any,
        RawToken::Typeof => TokenKind::Typeof,
        RawToken::Sizeof => TokenKind::Sizeof,
        RawToken::As => TokenKind::As,
        RawToken::Is => TokenKind::Is,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::Operator => TokenKind::Op(interner.intern(slice)),
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),
        RawToken::Int => match slice.parse::<u64>() {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Error,
        },
        RawToken::HexInt => match u64::from_str_radix(&slice[2..], 16) {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Error,
        },
        RawToken::BinInt => match u64::from_str_radix(&slice[2..], 2) {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Error,
        },
        RawToken::Float => match slice.parse::<f64>() {
            Ok(value) => TokenKind::Float(value.to_bits()),
            Err(_) => TokenKind::Error,
        },
        RawToken::Str => {
            let inner = &slice[1..slice.len() - 1];
            TokenKind::Str(interner.intern(&unescape(inner)))
        }
    }
}

/// Process escape sequences in a string literal body.
///
/// Invalid escapes are preserved literally.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let interner = StringInterner::new();
        lex(source, 0, &interner).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_declaration() {
        let interner = StringInterner::new();
        let tokens = lex("var x: Int = 42", 0, &interner);

        assert_eq!(tokens.len(), 7); // var x : Int = 42 EOF
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert!(matches!(tokens[1].kind, TokenKind::Ident(_)));
        assert_eq!(tokens[2].kind, TokenKind::Colon);
        assert!(matches!(tokens[3].kind, TokenKind::Ident(_)));
        assert!(matches!(tokens[4].kind, TokenKind::Op(_)));
        assert_eq!(tokens[5].kind, TokenKind::Int(42));
        assert_eq!(tokens[6].kind, TokenKind::Eof);
    }

    #[test]
    fn operators_are_maximal_munch() {
        let interner = StringInterner::new();
        let tokens = lex("a <= b", 0, &interner);
        assert_eq!(tokens[1].kind, TokenKind::Op(interner.intern("<=")));

        // Arrow is a punctuator, not an operator lexeme.
        let tokens = lex(") -> Void", 0, &interner);
        assert_eq!(tokens[1].kind, TokenKind::Arrow);
    }

    #[test]
    fn member_dot_is_an_operator() {
        let interner = StringInterner::new();
        let tokens = lex("point.x", 0, &interner);
        assert_eq!(tokens[1].kind, TokenKind::Op(interner.intern(".")));
    }

    #[test]
    fn int_float_forms() {
        let interner = StringInterner::new();
        let tokens = lex("7 0x1F 0b101 2.5", 0, &interner);
        assert_eq!(tokens[0].kind, TokenKind::Int(7));
        assert_eq!(tokens[1].kind, TokenKind::Int(31));
        assert_eq!(tokens[2].kind, TokenKind::Int(5));
        assert_eq!(tokens[3].kind, TokenKind::Float(2.5f64.to_bits()));
    }

    #[test]
    fn string_escapes() {
        let interner = StringInterner::new();
        let tokens = lex(r#""a\nb\q""#, 0, &interner);
        if let TokenKind::Str(name) = tokens[0].kind {
            assert_eq!(interner.lookup(name), "a\nb\\q");
        } else {
            panic!("expected string token, got {:?}", tokens[0].kind);
        }
    }

    #[test]
    fn newlines_and_semicolons_are_trivia() {
        assert_eq!(
            kinds("break\n;continue"),
            kinds("break continue"),
        );
    }

    #[test]
    fn spans_are_offset_by_base() {
        let interner = StringInterner::new();
        let tokens = lex("if x", 100, &interner);
        assert_eq!(tokens[0].span, Span::new(100, 102));
        assert_eq!(tokens[1].span, Span::new(103, 104));
        assert_eq!(tokens[2].span, Span::point(104));
    }

    #[test]
    fn invalid_input_yields_error_token_and_continues() {
        let interner = StringInterner::new();
        let tokens = lex("var @ x", 0, &interner);
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert!(matches!(tokens[2].kind, TokenKind::Ident(_)));
    }

    #[test]
    fn empty_file_is_just_eof() {
        let interner = StringInterner::new();
        let tokens = lex("", 0, &interner);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn load_directive() {
        let interner = StringInterner::new();
        let tokens = lex("#load \"lib.mica\"", 0, &interner);
        assert_eq!(tokens[0].kind, TokenKind::Load);
        assert!(matches!(tokens[1].kind, TokenKind::Str(_)));
    }
}
