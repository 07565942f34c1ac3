//! Token cursor for navigating the token stream.
//!
//! The parser holds exactly one token of lookahead: [`Cursor::current`] is
//! the unconsumed token, [`Cursor::advance`] commits it.

use mica_ir::{Name, Span, Token, TokenKind, TokenList};

/// Cursor over a lexed token stream.
///
/// Invariant: the position always addresses a valid token; the list ends
/// with `Eof` and the cursor never advances past it.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        debug_assert!(!tokens.is_empty(), "token stream must at least hold Eof");
        Cursor { tokens, pos: 0 }
    }

    /// Current position, for progress checks during error recovery.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The lookahead token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// The lookahead token's kind.
    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    /// The lookahead token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    /// Check if at the end of the token stream.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Check the lookahead against a kind without consuming.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consume and return the current token. At `Eof` the cursor stays put.
    #[inline]
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    #[inline]
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The identifier name in the lookahead, if it is one.
    #[inline]
    pub fn ident_name(&self) -> Option<Name> {
        match self.current_kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The operator lexeme in the lookahead, if it is one.
    #[inline]
    pub fn op_name(&self) -> Option<Name> {
        match self.current_kind() {
            TokenKind::Op(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_ir::Token;

    fn tokens(kinds: &[TokenKind]) -> TokenList {
        let mut list = TokenList::new();
        for &kind in kinds {
            list.push(Token::dummy(kind));
        }
        list.push(Token::dummy(TokenKind::Eof));
        list
    }

    #[test]
    fn advance_stops_at_eof() {
        let list = tokens(&[TokenKind::Var]);
        let mut cursor = Cursor::new(&list);

        assert!(cursor.check(TokenKind::Var));
        cursor.advance();
        assert!(cursor.is_at_end());
        cursor.advance();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn eat_only_consumes_matches() {
        let list = tokens(&[TokenKind::Colon, TokenKind::Comma]);
        let mut cursor = Cursor::new(&list);

        assert!(!cursor.eat(TokenKind::Comma));
        assert!(cursor.eat(TokenKind::Colon));
        assert!(cursor.eat(TokenKind::Comma));
        assert!(cursor.is_at_end());
    }
}
