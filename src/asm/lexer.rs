//! Lexer (C2): streams source text into tokens, tracking (file, line, col).
//!
//! Grounded in the same field-by-field, position-advancing scan style
//! `goblin`'s parsers use over byte buffers (`pe/section_table.rs`,
//! `mach/load_command.rs`), here scanning characters instead of raw bytes.

use crate::asm::source_map::SourceMap;
use crate::asm::token::{Token, TokenKind};
use crate::error::{Error, LocatedMessage, Result};

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    file: Option<String>,
    source_map: Option<&'a SourceMap>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, file: Option<String>, source_map: Option<&'a SourceMap>) -> Lexer<'a> {
        Lexer { chars: source.chars().collect(), pos: 0, line: 1, col: 1, file, source_map }
    }

    /// Consume the whole stream, returning every token up to and including
    /// a trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Map the current expanded-text line back to (original file, line) via
    /// the source map, falling back to the lexer's own file/line when no
    /// map was supplied (single top-level file, no includes).
    fn error_at(&self, line: u32, col: u32, message: impl Into<String>) -> LocatedMessage {
        match self.source_map.and_then(|map| map.lookup(line)) {
            Some((file, line)) => LocatedMessage::at(Some(file.to_string()), line, col, message),
            None => LocatedMessage::at(self.file.clone(), line, col, message),
        }
    }

    fn single(&mut self, kind: TokenKind, line: u32, col: u32) -> Token {
        let lexeme = self.advance().unwrap().to_string();
        Token::new(kind, lexeme, line, col)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let (line, col) = (self.line, self.col);
            match self.peek() {
                None => return Ok(Token::new(TokenKind::Eof, "", line, col)),
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                    continue;
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                Some('\n') => {
                    self.advance();
                    return Ok(Token::new(TokenKind::Eol, "\n", line, col));
                }
                Some(':') => return Ok(self.single(TokenKind::Colon, line, col)),
                Some(',') => return Ok(self.single(TokenKind::Comma, line, col)),
                Some('#') => return Ok(self.single(TokenKind::Hash, line, col)),
                Some('(') => return Ok(self.single(TokenKind::LParen, line, col)),
                Some(')') => return Ok(self.single(TokenKind::RParen, line, col)),
                Some('+') => return Ok(self.single(TokenKind::Plus, line, col)),
                Some('-') => return Ok(self.single(TokenKind::Minus, line, col)),
                Some('=') => return Ok(self.single(TokenKind::Equals, line, col)),
                Some('.') => return Ok(self.single(TokenKind::Dot, line, col)),
                Some('"') => return self.lex_string(line, col),
                Some('\'') => return self.lex_char(line, col),
                Some(c) if c == '$' || c == '%' || c.is_ascii_digit() => return Ok(self.lex_number(line, col)),
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '@' => {
                    return Ok(self.lex_identifier(line, col))
                }
                Some(c) => {
                    return Err(Error::Lexical(self.error_at(line, col, format!("unexpected character '{}'", c))))
                }
            }
        }
    }

    fn lex_identifier(&mut self, line: u32, col: u32) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '@' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Identifier, s, line, col)
    }

    fn lex_number(&mut self, line: u32, col: u32) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '$' || c == '%' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, s, line, col)
    }

    fn lex_string(&mut self, line: u32, col: u32) -> Result<Token> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::Lexical(self.error_at(line, col, "unterminated string literal")))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::new(TokenKind::String, s, line, col));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn lex_char(&mut self, line: u32, col: u32) -> Result<Token> {
        self.advance(); // opening quote
        let value = match self.peek() {
            None => return Err(Error::Lexical(self.error_at(line, col, "unterminated character literal"))),
            Some('\\') => {
                self.advance();
                match self.advance() {
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    // Any other escape yields the literal character (spec §4.1).
                    Some(other) => other,
                    None => return Err(Error::Lexical(self.error_at(line, col, "unterminated character literal"))),
                }
            }
            Some(c) => {
                self.advance();
                c
            }
        };
        match self.advance() {
            Some('\'') => Ok(Token::new(TokenKind::Char, value.to_string(), line, col)),
            _ => Err(Error::Lexical(self.error_at(line, col, "unterminated character literal"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, None, None).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_comments() {
        let toks = kinds("  LDA #1 ; comment\n");
        assert_eq!(toks, vec![
            TokenKind::Identifier, TokenKind::Hash, TokenKind::Number, TokenKind::Eol, TokenKind::Eof
        ]);
    }

    #[test]
    fn dotted_label_lexes_dot_separately() {
        let toks = Lexer::new(".loop:", None, None).tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenKind::Dot);
        assert_eq!(toks[1].kind, TokenKind::Identifier);
        assert_eq!(toks[1].lexeme, "loop");
        assert_eq!(toks[2].kind, TokenKind::Colon);
    }

    #[test]
    fn multi_segment_identifier() {
        let toks = Lexer::new("draw_Sprite1_row", None, None).tokenize().unwrap();
        assert_eq!(toks[0].lexeme, "draw_Sprite1_row");
    }

    #[test]
    fn char_literal_escapes() {
        let toks = Lexer::new(r"'\n' '\'' 'A'", None, None).tokenize().unwrap();
        assert_eq!(toks[0].lexeme, "\n");
        assert_eq!(toks[1].lexeme, "'");
        assert_eq!(toks[2].lexeme, "A");
    }

    #[test]
    fn unterminated_string_is_error() {
        assert!(Lexer::new("\"abc", None, None).tokenize().is_err());
    }

    #[test]
    fn unexpected_character_is_error() {
        assert!(Lexer::new("~", None, None).tokenize().is_err());
    }
}
