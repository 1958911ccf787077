//! Source map & include expander (C3).
//!
//! Grounded on `goblin::archive::Index::parse`, which builds a side-table
//! (symbol index → string offset) as a by-product of a single linear scan;
//! here the side-table is "expanded output line → original (file, line)",
//! built as a by-product of `.include` expansion.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, LocatedMessage, Result};

/// One entry per output line of the expanded source. 1-based: entry for
/// expanded line `n` lives at index `n - 1`.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: Vec<(String, u32)>,
}

impl SourceMap {
    pub fn new() -> SourceMap {
        SourceMap::default()
    }

    pub fn push(&mut self, file: impl Into<String>, original_line: u32) {
        self.entries.push((file.into(), original_line));
    }

    /// Look up the original (file, line) for a 1-based expanded line.
    /// Out-of-range lookups return `None` — callers treat that as "use the
    /// input unchanged" per spec §3.
    pub fn lookup(&self, expanded_line: u32) -> Option<(&str, u32)> {
        if expanded_line == 0 {
            return None;
        }
        self.entries.get((expanded_line - 1) as usize).map(|(f, l)| (f.as_str(), *l))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a `.include "path"` line, tolerating leading whitespace and a
/// trailing `;` comment. Returns the quoted path if this line is an include
/// directive.
fn parse_include_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix(".include")?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Expand `.include` directives in `source` (whose own path is `file`, used
/// both for relative resolution and for source-map tagging), appending one
/// entry to `map` per output line. `expanding` tracks the absolute paths
/// currently being expanded, to detect cycles.
pub fn expand(
    source: &str,
    file: &Path,
    map: &mut SourceMap,
    expanding: &mut HashSet<PathBuf>,
) -> Result<String> {
    let mut out = String::new();
    let file_display = file.display().to_string();
    let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    for (idx, line) in source.lines().enumerate() {
        let original_line = (idx + 1) as u32;
        if let Some(include_path) = parse_include_line(line) {
            let resolved = base_dir.join(include_path);
            let canonical = resolved.canonicalize().unwrap_or_else(|_| resolved.clone());
            if expanding.contains(&canonical) {
                return Err(Error::Include(LocatedMessage::at(
                    Some(file_display.clone()),
                    original_line,
                    1,
                    format!("Circular .include of '{}'", include_path),
                )));
            }
            let included_source = fs::read_to_string(&resolved).map_err(|e| {
                Error::Include(LocatedMessage::at(
                    Some(file_display.clone()),
                    original_line,
                    1,
                    format!("cannot read included file '{}': {}", include_path, e),
                ))
            })?;
            expanding.insert(canonical.clone());
            let expanded = expand(&included_source, &resolved, map, expanding)?;
            expanding.remove(&canonical);
            out.push_str(&expanded);
            if !expanded.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(line);
            out.push('\n');
            map.push(file_display.clone(), original_line);
        }
    }
    Ok(out)
}
