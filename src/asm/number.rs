//! Number & character literal evaluation (C1), the leaf primitive under the
//! lexer and expression evaluator.

use crate::error::{Error, LocatedMessage, Result};

/// Parse a numeric literal lexeme as produced by the lexer: `$hex`, `%bin`
/// (digits restricted to 0/1), or plain decimal. Validation deferred here,
/// as spec §4.1 requires.
pub fn parse_number(lexeme: &str, line: u32, col: u32) -> Result<i64> {
    let err = |msg: String| Error::Numeric(LocatedMessage::at_line_col(msg, line, col));

    if let Some(hex) = lexeme.strip_prefix('$') {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err(format!("invalid hexadecimal literal '{}'", lexeme)));
        }
        return i64::from_str_radix(hex, 16).map_err(|_| err(format!("invalid hexadecimal literal '{}'", lexeme)));
    }

    if let Some(bin) = lexeme.strip_prefix('%') {
        if bin.is_empty() || !bin.chars().all(|c| c == '0' || c == '1') {
            return Err(err(format!("invalid binary literal '{}'", lexeme)));
        }
        return i64::from_str_radix(bin, 2).map_err(|_| err(format!("invalid binary literal '{}'", lexeme)));
    }

    if lexeme.is_empty() || !lexeme.chars().all(|c| c.is_ascii_digit()) {
        return Err(err(format!("invalid decimal literal '{}'", lexeme)));
    }
    lexeme.parse::<i64>().map_err(|_| err(format!("invalid decimal literal '{}'", lexeme)))
}

/// A lexed character literal's lexeme is already the decoded character
/// (escapes resolved by the lexer); this just maps it to its byte value.
pub fn char_value(lexeme: &str) -> Result<i64> {
    let c = lexeme.chars().next().ok_or_else(|| Error::Numeric(LocatedMessage::new("empty character literal")))?;
    Ok(c as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_bin_decimal() {
        assert_eq!(parse_number("$1A2B", 1, 1).unwrap(), 0x1A2B);
        assert_eq!(parse_number("%1010", 1, 1).unwrap(), 0b1010);
        assert_eq!(parse_number("1234", 1, 1).unwrap(), 1234);
    }

    #[test]
    fn rejects_bad_digits() {
        assert!(parse_number("%102", 1, 1).is_err());
        assert!(parse_number("$1G", 1, 1).is_err());
        assert!(parse_number("12a", 1, 1).is_err());
    }

    #[test]
    fn char_value_of_letter() {
        assert_eq!(char_value("A").unwrap(), 0x41);
    }
}
