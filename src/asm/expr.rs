//! Expression evaluation (C1): primaries (number, char, identifier,
//! `.identifier`, parenthesized subexpression) combined left-to-right by
//! `+`/`-` with no precedence distinction (spec §4.3 "Expressions").

use crate::asm::number::{char_value, parse_number};
use crate::asm::source_map::SourceMap;
use crate::asm::symtab::SymbolTable;
use crate::asm::token::{Token, TokenKind};
use crate::error::{Error, LocatedMessage, Result};

/// Which collection/emit pass is currently running (spec §4.3's two-phase
/// fixed-point protocol). Undefined symbols resolve to the forward-reference
/// sentinel during collection, and are fatal during emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Collect,
    Emit,
}

/// Forces absolute addressing-mode sizing for an as-yet-unresolved forward
/// reference (spec §4.3).
pub const FORWARD_REF_SENTINEL: i64 = 0x100;

pub struct ExprEvaluator<'a> {
    pub symtab: &'a SymbolTable,
    pub mode: ResolveMode,
    pub file: Option<String>,
    pub source_map: Option<&'a SourceMap>,
}

impl<'a> ExprEvaluator<'a> {
    pub fn new(symtab: &'a SymbolTable, mode: ResolveMode, file: Option<String>, source_map: Option<&'a SourceMap>) -> Self {
        ExprEvaluator { symtab, mode, file, source_map }
    }

    fn located(&self, line: u32, col: u32, message: impl Into<String>) -> LocatedMessage {
        match self.source_map.and_then(|map| map.lookup(line)) {
            Some((file, line)) => LocatedMessage::at(Some(file.to_string()), line, col, message),
            None => LocatedMessage::at(self.file.clone(), line, col, message),
        }
    }

    fn resolve_symbol(&self, name: &str, line: u32, col: u32) -> Result<i64> {
        match self.symtab.get(name) {
            Some(v) => Ok(v as i64),
            None => match self.mode {
                ResolveMode::Collect => Ok(FORWARD_REF_SENTINEL),
                ResolveMode::Emit => {
                    Err(Error::Semantic(self.located(line, col, format!("undefined symbol '{}'", name))))
                }
            },
        }
    }

    /// Parse and evaluate one expression starting at `*pos`, advancing
    /// `*pos` past the tokens consumed.
    pub fn eval(&self, tokens: &[Token], pos: &mut usize) -> Result<i64> {
        let mut value = self.parse_primary(tokens, pos)?;
        loop {
            match tokens.get(*pos).map(|t| t.kind) {
                Some(TokenKind::Plus) => {
                    *pos += 1;
                    value += self.parse_primary(tokens, pos)?;
                }
                Some(TokenKind::Minus) => {
                    *pos += 1;
                    value -= self.parse_primary(tokens, pos)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_primary(&self, tokens: &[Token], pos: &mut usize) -> Result<i64> {
        let tok = tokens.get(*pos).ok_or_else(|| {
            let (line, col) = tokens.last().map(|t| (t.line, t.col)).unwrap_or((0, 0));
            Error::Parse(self.located(line, col, "expected expression, found end of line"))
        })?;
        match tok.kind {
            TokenKind::Number => {
                let v = parse_number(&tok.lexeme, tok.line, tok.col)?;
                *pos += 1;
                Ok(v)
            }
            TokenKind::Char => {
                let v = char_value(&tok.lexeme)?;
                *pos += 1;
                Ok(v)
            }
            TokenKind::Dot => {
                *pos += 1;
                let name = tokens.get(*pos).ok_or_else(|| {
                    Error::Parse(self.located(tok.line, tok.col, "expected identifier after '.'"))
                })?;
                if name.kind != TokenKind::Identifier {
                    return Err(Error::Parse(self.located(name.line, name.col, "expected identifier after '.'")));
                }
                *pos += 1;
                self.resolve_symbol(&name.lexeme, name.line, name.col)
            }
            TokenKind::Identifier => {
                *pos += 1;
                self.resolve_symbol(&tok.lexeme, tok.line, tok.col)
            }
            TokenKind::LParen => {
                *pos += 1;
                let v = self.eval(tokens, pos)?;
                match tokens.get(*pos).map(|t| t.kind) {
                    Some(TokenKind::RParen) => {
                        *pos += 1;
                        Ok(v)
                    }
                    _ => Err(Error::Parse(self.located(tok.line, tok.col, "expected ')'"))),
                }
            }
            _ => Err(Error::Parse(self.located(tok.line, tok.col, format!("unexpected token '{}' in expression", tok.lexeme)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::lexer::Lexer;

    fn eval_str(src: &str, symtab: &SymbolTable, mode: ResolveMode) -> Result<i64> {
        let tokens = Lexer::new(src, None, None).tokenize().unwrap();
        let ev = ExprEvaluator::new(symtab, mode, None, None);
        let mut pos = 0;
        ev.eval(&tokens, &mut pos)
    }

    #[test]
    fn additive_left_to_right() {
        let t = SymbolTable::new();
        assert_eq!(eval_str("1+2-1", &t, ResolveMode::Emit).unwrap(), 2);
    }

    #[test]
    fn parens_and_symbols() {
        let mut t = SymbolTable::new();
        t.define("FOO", 0x10);
        assert_eq!(eval_str("(FOO+2)", &t, ResolveMode::Emit).unwrap(), 0x12);
        assert_eq!(eval_str(".FOO", &t, ResolveMode::Emit).unwrap(), 0x10);
    }

    #[test]
    fn undefined_symbol_collect_vs_emit() {
        let t = SymbolTable::new();
        assert_eq!(eval_str("MISSING", &t, ResolveMode::Collect).unwrap(), FORWARD_REF_SENTINEL);
        assert!(eval_str("MISSING", &t, ResolveMode::Emit).is_err());
    }
}
