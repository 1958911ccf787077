//! Error types shared by the assembler, CPU core, and DFS codec.
//!
//! Modeled on `goblin::error`: a single flat enum, no derive-macro crate,
//! `Display` carrying enough context for a caller to print something useful
//! without re-deriving it from the original source.

use core::fmt;
use core::result;

/// A message tagged with as much source location as was known when the
/// error was raised. `file`/`line`/`col` are independently optional because
/// some errors (e.g. include-cycle detection) only know the file, and some
/// (e.g. numeric parse errors encountered before line tracking starts) know
/// neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedMessage {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
    pub message: String,
}

impl LocatedMessage {
    pub fn new(message: impl Into<String>) -> Self {
        LocatedMessage { file: None, line: None, col: None, message: message.into() }
    }

    pub fn at_line_col(message: impl Into<String>, line: u32, col: u32) -> Self {
        LocatedMessage { file: None, line: Some(line), col: Some(col), message: message.into() }
    }

    pub fn at(file: Option<String>, line: u32, col: u32, message: impl Into<String>) -> Self {
        LocatedMessage { file, line: Some(line), col: Some(col), message: message.into() }
    }

    pub fn in_file(file: impl Into<String>, message: impl Into<String>) -> Self {
        LocatedMessage { file: Some(file.into()), line: None, col: None, message: message.into() }
    }
}

impl fmt::Display for LocatedMessage {
    /// `file(line,col): message`, `file: message`, `line:col: message`, or
    /// bare `message` — matching spec §7's location-prefix rule exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.col) {
            (Some(file), Some(line), Some(col)) => write!(f, "{}({},{}): {}", file, line, col, self.message),
            (Some(file), None, _) => write!(f, "{}: {}", file, self.message),
            (None, Some(line), Some(col)) => write!(f, "{}:{}: {}", line, col, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lexical(LocatedMessage),
    Parse(LocatedMessage),
    Semantic(LocatedMessage),
    Numeric(LocatedMessage),
    Include(LocatedMessage),
    Disk(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lexical(m) => write!(f, "{}", m),
            Error::Parse(m) => write!(f, "{}", m),
            Error::Semantic(m) => write!(f, "{}", m),
            Error::Numeric(m) => write!(f, "{}", m),
            Error::Include(m) => write!(f, "{}", m),
            Error::Disk(m) => write!(f, "{}", m),
        }
    }
}

impl std::error::Error for Error {}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Error {
        Error::Disk(format!("{}", err))
    }
}

pub type Result<T> = result::Result<T, Error>;
