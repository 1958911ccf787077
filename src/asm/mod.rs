//! The macro assembler (C1-C5): lexing, expression evaluation, include
//! expansion, and the two-phase fixed-point assembler driver.

pub mod assembler;
pub mod expr;
pub mod lexer;
pub mod number;
pub mod source_map;
pub mod symtab;
pub mod token;

pub use assembler::{assemble, AssemblyResult, ByteMap};
pub use source_map::SourceMap;

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;

/// Expand `.include`s starting from `path`, then assemble the result.
/// This is the entry point a caller reaches for when the top-level source
/// lives on disk and may pull in other files.
pub fn assemble_file(path: &Path) -> Result<AssemblyResult> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        crate::error::Error::Include(crate::error::LocatedMessage::in_file(
            path.display().to_string(),
            format!("cannot read source file: {}", e),
        ))
    })?;
    let mut map = SourceMap::new();
    let expanded = source_map::expand(&source, path, &mut map, &mut HashSet::new())?;
    assemble(&expanded, Some(path.display().to_string()), Some(&map))
}
