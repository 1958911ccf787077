//! Symbol table (spec §3): case-insensitive identifier → 16-bit address.
//!
//! Grounded on `goblin::strtab::Strtab`, which likewise owns a name-keyed
//! table over program-defined identifiers; here the "backing buffer" is
//! simply a `HashMap` since symbol names are short and few per program.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_uppercase()
    }

    /// Define or redefine a symbol. Last write wins within a collection
    /// pass (spec §3's redefinition policy).
    pub fn define(&mut self, name: &str, value: u16) {
        self.map.insert(Self::key(name), value);
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.map.get(&Self::key(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&Self::key(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        let mut t = SymbolTable::new();
        t.define("Foo", 0x1234);
        assert_eq!(t.get("FOO"), Some(0x1234));
        assert_eq!(t.get("foo"), Some(0x1234));
    }

    #[test]
    fn last_write_wins() {
        let mut t = SymbolTable::new();
        t.define("K", 1);
        t.define("K", 2);
        assert_eq!(t.get("K"), Some(2));
    }
}
