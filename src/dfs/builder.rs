//! DFS image builder (C9): `CreateBlank` + `AddFile` sector allocation over
//! a single 200 KiB side.
//!
//! Grounded on `goblin::pe::writer::PEWriter`'s section-layout allocator: a
//! running cursor handed out to each inserted piece in turn, then the
//! catalog (this crate's analogue of a section table) rewritten once per
//! insertion to reflect the new layout.

use crate::dfs::catalog::{self, Catalog, CatalogEntry};
use crate::error::{Error, Result};

const FIRST_DATA_SECTOR: u16 = 2;
/// `CreateBlank` fixes sector-count at 800 and boot-option at 3 (EXEC
/// `$.!BOOT`), per spec §4.8.
const DEFAULT_SECTOR_COUNT: u16 = 800;
const EXEC_BOOT_OPTION: u8 = 3;

/// One side of a DFS disk: a 200 KiB buffer plus the catalog describing it.
/// `interleave` is accepted and stored but never applied to physical
/// sector order (spec §9's open question on interleave).
#[derive(Debug, Clone)]
pub struct DfsImage {
    data: Vec<u8>,
    catalog: Catalog,
    interleave: u8,
}

impl DfsImage {
    /// Allocate a zeroed 200 KiB side and write an empty catalog.
    pub fn create_blank(title: &str, interleave: u8) -> Result<DfsImage> {
        catalog::validate_title(title)?;
        let data = vec![0u8; catalog::SIDE_SIZE];
        let catalog = Catalog {
            title: title.to_string(),
            boot_option: EXEC_BOOT_OPTION,
            sector_count: DEFAULT_SECTOR_COUNT,
            entries: Vec::new(),
        };
        let mut image = DfsImage { data, catalog, interleave };
        image.rewrite_catalog()?;
        log::debug!("created blank DFS side '{}', interleave={}", title, interleave);
        Ok(image)
    }

    fn rewrite_catalog(&mut self) -> Result<()> {
        catalog::write_catalog(&self.catalog, &mut self.data)
    }

    fn first_free_sector(&self) -> u16 {
        self.catalog
            .entries
            .iter()
            .map(|e| e.start_sector + sectors_needed(e.length))
            .max()
            .unwrap_or(FIRST_DATA_SECTOR)
    }

    /// Append one file: allocate `ceil(len/256)` contiguous sectors from the
    /// first free sector, copy `data`, and append a catalog entry.
    pub fn add_file(
        &mut self,
        directory: char,
        name: &str,
        data: &[u8],
        load: u32,
        exec: u32,
        locked: bool,
    ) -> Result<()> {
        catalog::validate_directory(directory)?;
        catalog::validate_name(name)?;
        if self.catalog.entries.len() >= catalog::MAX_ENTRIES {
            return Err(Error::Disk(format!("catalog full: already holds {} entries", catalog::MAX_ENTRIES)));
        }

        let start = self.first_free_sector();
        let needed = sectors_needed(data.len() as u32);
        if start as u32 + needed as u32 > self.catalog.sector_count as u32 {
            return Err(Error::Disk(format!(
                "disk full: need {} sectors from {}, only {} available",
                needed, start, self.catalog.sector_count
            )));
        }

        let offset = start as usize * catalog::SECTOR_SIZE;
        self.data[offset..offset + data.len()].copy_from_slice(data);

        self.catalog.entries.push(CatalogEntry {
            directory,
            name: name.to_string(),
            locked,
            load_address: load,
            exec_address: exec,
            length: data.len() as u32,
            start_sector: start,
        });
        self.rewrite_catalog()?;
        log::debug!("added '{}.{}' at sector {}, {} bytes", directory, name, start, data.len());
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn validate(&self) -> Result<()> {
        catalog::validate(&self.data)
    }

    pub fn interleave(&self) -> u8 {
        self.interleave
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn sectors_needed(len: u32) -> u16 {
    ((len as usize + catalog::SECTOR_SIZE - 1) / catalog::SECTOR_SIZE) as u16
}

/// The boot file's qualified DFS name: `$.NAME` for the root directory,
/// `D.NAME` otherwise (spec §6 "Boot file contents").
pub fn qualified_name(directory: char, name: &str) -> String {
    format!("{}.{}", directory, name)
}

/// `*RUN <qualified-name>\r`, the fixed contents of `$.!BOOT` for
/// auto-boot (spec §6).
pub fn boot_file_contents(directory: char, name: &str) -> Vec<u8> {
    let mut out = format!("*RUN {}", qualified_name(directory, name)).into_bytes();
    out.push(0x0D);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_dfs_round_trip() {
        let mut image = DfsImage::create_blank("TEST", 0).unwrap();
        image
            .add_file('$', "!BOOT", &boot_file_contents('$', "PROG"), 0, 0, true)
            .unwrap();
        image.add_file('$', "PROG", &vec![0u8; 300], 0x1900, 0x1900, false).unwrap();

        let cat = catalog::read_catalog(image.as_bytes()).unwrap();
        assert_eq!(cat.entries.len(), 2);
        assert_eq!(cat.boot_option, 3);

        let prog = cat.entries.iter().find(|e| e.name == "PROG").unwrap();
        assert_eq!(prog.length, 300);
        assert_eq!(prog.start_sector, 3);
        assert_eq!(prog.load_address, 0x1900);
        assert_eq!(prog.exec_address, 0x1900);

        image.validate().unwrap();
    }

    #[test]
    fn catalog_full_is_fatal() {
        let mut image = DfsImage::create_blank("T", 0).unwrap();
        for i in 0..31 {
            image.add_file('$', &format!("F{}", i), &[0u8; 1], 0, 0, false).unwrap();
        }
        assert!(image.add_file('$', "ONEMORE", &[0u8; 1], 0, 0, false).is_err());
    }

    #[test]
    fn disk_full_is_fatal() {
        let mut image = DfsImage::create_blank("T", 0).unwrap();
        let big = vec![0u8; 799 * 256];
        assert!(image.add_file('$', "HUGE", &big, 0, 0, false).is_err());
    }

    #[test]
    fn boot_contents_format() {
        assert_eq!(boot_file_contents('$', "PROG"), b"*RUN $.PROG\r");
        assert_eq!(boot_file_contents('D', "GAME"), b"*RUN D.GAME\r");
    }
}
