//! DFS catalog codec (C8): sectors 0 and 1 of a single 200 KiB side, bit
//! exact per spec §4.8.
//!
//! Grounded on `goblin::pe::section_table::SectionTable::parse` (read a
//! fixed-layout header field-by-field at known byte offsets via `scroll`)
//! and `elf::writer`'s space-padded fixed-width string table builder; here
//! the "header" is split across two 256-byte sectors instead of one
//! contiguous struct.

use scroll::{Pread, Pwrite, LE};

use crate::error::{Error, Result};

pub const SECTOR_SIZE: usize = 256;
pub const SECTORS_PER_TRACK: usize = 10;
pub const TRACKS_PER_SIDE: usize = 80;
pub const SECTORS_PER_SIDE: usize = TRACKS_PER_SIDE * SECTORS_PER_TRACK; // 800
pub const SIDE_SIZE: usize = SECTORS_PER_SIDE * SECTOR_SIZE; // 200 KiB
pub const MAX_ENTRIES: usize = 31;

const NAME_AREA_OFFSET: usize = 8; // sector 0, offset 8
const INFO_AREA_OFFSET: usize = SECTOR_SIZE + 8; // sector 1, offset 8
const ENTRY_SIZE: usize = 8;

/// A single catalog slot (spec §3 "DFS catalog entry").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub directory: char,
    pub name: String,
    pub locked: bool,
    pub load_address: u32,
    pub exec_address: u32,
    pub length: u32,
    pub start_sector: u16,
}

/// The parsed contents of sectors 0-1: title, boot option, sector count,
/// and every catalog entry.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub title: String,
    pub boot_option: u8,
    pub sector_count: u16,
    pub entries: Vec<CatalogEntry>,
}

pub fn validate_title(title: &str) -> Result<()> {
    if title.len() > 12 || !title.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return Err(Error::Disk(format!("invalid disk title '{}': must be <=12 printable ASCII bytes", title)));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 7 || !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(Error::Disk(format!("invalid file name '{}': must be 1-7 printable ASCII chars", name)));
    }
    Ok(())
}

pub fn validate_directory(dir: char) -> Result<()> {
    if dir == '$' || dir.is_ascii_uppercase() {
        Ok(())
    } else {
        Err(Error::Disk(format!("invalid directory '{}': must be '$' or A-Z", dir)))
    }
}

fn encode_directory_byte(directory: char, locked: bool) -> u8 {
    (directory as u8) | if locked { 0x80 } else { 0 }
}

fn decode_directory_byte(b: u8) -> (char, bool) {
    ((b & 0x7F) as char, b & 0x80 != 0)
}

fn pack_high_bits(load: u32, exec: u32, length: u32, start_sector: u16) -> u8 {
    let load_high = ((load >> 16) & 0x3) as u8;
    let exec_high = ((exec >> 16) & 0x3) as u8;
    let len_high = ((length >> 16) & 0x3) as u8;
    let start_high = ((start_sector >> 8) & 0x3) as u8;
    (exec_high << 6) | (len_high << 4) | (load_high << 2) | start_high
}

fn unpack_high_bits(packed: u8) -> (u32, u32, u32, u16) {
    let exec_high = ((packed >> 6) & 0x3) as u32;
    let len_high = ((packed >> 4) & 0x3) as u32;
    let load_high = ((packed >> 2) & 0x3) as u32;
    let start_high = (packed & 0x3) as u16;
    (load_high, exec_high, len_high, start_high)
}

/// Read the title, boot option, sector count, and `file_count` entries from
/// an existing 200 KiB side buffer.
pub fn read_catalog(side: &[u8]) -> Result<Catalog> {
    if side.len() != SIDE_SIZE {
        return Err(Error::Disk(format!("expected a {}-byte DFS side, got {}", SIDE_SIZE, side.len())));
    }

    let mut title = String::new();
    title.push_str(std::str::from_utf8(&side[0..8]).unwrap_or("").trim_end());
    title.push_str(std::str::from_utf8(&side[SECTOR_SIZE..SECTOR_SIZE + 4]).unwrap_or("").trim_end());
    let title = title.trim_end().to_string();

    let file_count = (side[SECTOR_SIZE + 5] / 8) as usize;
    let boot_option = (side[SECTOR_SIZE + 6] >> 4) & 0x3;
    let sector_count = (((side[SECTOR_SIZE + 6] & 0x3) as u16) << 8) | side[SECTOR_SIZE + 7] as u16;

    let mut entries = Vec::with_capacity(file_count);
    for i in 0..file_count {
        let name_off = NAME_AREA_OFFSET + i * ENTRY_SIZE;
        let name_bytes = &side[name_off..name_off + 7];
        let name = std::str::from_utf8(name_bytes).unwrap_or("").trim_end().to_string();
        let (directory, locked) = decode_directory_byte(side[name_off + 7]);

        let info_off = INFO_AREA_OFFSET + i * ENTRY_SIZE;
        let load_lo: u16 = side.pread_with(info_off, LE)?;
        let exec_lo: u16 = side.pread_with(info_off + 2, LE)?;
        let len_lo: u16 = side.pread_with(info_off + 4, LE)?;
        let packed = side[info_off + 6];
        let start_lo = side[info_off + 7];

        let (load_high, exec_high, len_high, start_high) = unpack_high_bits(packed);
        entries.push(CatalogEntry {
            directory,
            name,
            locked,
            load_address: (load_high << 16) | load_lo as u32,
            exec_address: (exec_high << 16) | exec_lo as u32,
            length: (len_high << 16) | len_lo as u32,
            start_sector: (start_high << 8) | start_lo as u16,
        });
    }

    Ok(Catalog { title, boot_option, sector_count, entries })
}

/// Serialize `catalog` into sectors 0-1 of `side`, per the writer
/// discipline: space-pad the name area and zero the info area before
/// writing entries (spec §4.8 "Catalog writer discipline").
pub fn write_catalog(catalog: &Catalog, side: &mut [u8]) -> Result<()> {
    if side.len() != SIDE_SIZE {
        return Err(Error::Disk(format!("expected a {}-byte DFS side, got {}", SIDE_SIZE, side.len())));
    }
    if catalog.entries.len() > MAX_ENTRIES {
        return Err(Error::Disk(format!("catalog full: {} entries exceeds {}", catalog.entries.len(), MAX_ENTRIES)));
    }

    let title_bytes = catalog.title.as_bytes();
    let mut title12 = [b' '; 12];
    title12[..title_bytes.len().min(12)].copy_from_slice(&title_bytes[..title_bytes.len().min(12)]);
    side[0..8].copy_from_slice(&title12[0..8]);
    side[SECTOR_SIZE..SECTOR_SIZE + 4].copy_from_slice(&title12[8..12]);

    side[SECTOR_SIZE + 5] = (catalog.entries.len() as u8) * 8;
    side[SECTOR_SIZE + 6] = (catalog.boot_option << 4) | (((catalog.sector_count >> 8) & 0x3) as u8);
    side[SECTOR_SIZE + 7] = (catalog.sector_count & 0xFF) as u8;

    side[NAME_AREA_OFFSET..SECTOR_SIZE].fill(b' ');
    side[INFO_AREA_OFFSET..2 * SECTOR_SIZE].fill(0);

    for (i, entry) in catalog.entries.iter().enumerate() {
        let name_off = NAME_AREA_OFFSET + i * ENTRY_SIZE;
        let name_bytes = entry.name.as_bytes();
        side[name_off..name_off + name_bytes.len().min(7)]
            .copy_from_slice(&name_bytes[..name_bytes.len().min(7)]);
        side[name_off + 7] = encode_directory_byte(entry.directory, entry.locked);

        let info_off = INFO_AREA_OFFSET + i * ENTRY_SIZE;
        side.pwrite_with(entry.load_address as u16, info_off, LE)?;
        side.pwrite_with(entry.exec_address as u16, info_off + 2, LE)?;
        side.pwrite_with(entry.length as u16, info_off + 4, LE)?;
        side[info_off + 6] =
            pack_high_bits(entry.load_address, entry.exec_address, entry.length, entry.start_sector);
        side[info_off + 7] = (entry.start_sector & 0xFF) as u8;
    }

    Ok(())
}

/// Rewrite just entry `index`'s info slot (load/exec/length/packed byte),
/// preserving its start-sector high bits. Used by the template patcher,
/// which must not touch any other catalog byte (spec §4.8).
pub fn rewrite_info_entry(side: &mut [u8], index: usize, load: u32, exec: u32, length: u32) -> Result<()> {
    let info_off = INFO_AREA_OFFSET + index * ENTRY_SIZE;
    let existing_packed = side[info_off + 6];
    let (_, _, _, start_high) = unpack_high_bits(existing_packed);
    let start_sector = (start_high << 8) | side[info_off + 7] as u16;

    side.pwrite_with(load as u16, info_off, LE)?;
    side.pwrite_with(exec as u16, info_off + 2, LE)?;
    side.pwrite_with(length as u16, info_off + 4, LE)?;
    side[info_off + 6] = pack_high_bits(load, exec, length, start_sector);
    Ok(())
}

/// Boot option from sector 1 byte 0x06 bits 4-5; the image is invalid
/// unless it is 3 (EXEC `$.!BOOT`).
pub fn validate(side: &[u8]) -> Result<()> {
    let catalog = read_catalog(side)?;
    if catalog.boot_option != 3 {
        return Err(Error::Disk(format!("invalid boot option {}, expected 3 (EXEC)", catalog.boot_option)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_catalog() {
        let mut side = vec![0u8; SIDE_SIZE];
        let cat = Catalog { title: "TEST".into(), boot_option: 3, sector_count: 800, entries: vec![] };
        write_catalog(&cat, &mut side).unwrap();
        let back = read_catalog(&side).unwrap();
        assert_eq!(back.title, "TEST");
        assert_eq!(back.boot_option, 3);
        assert_eq!(back.sector_count, 800);
        assert!(back.entries.is_empty());
    }

    #[test]
    fn round_trip_entry_with_high_bits() {
        let mut side = vec![0u8; SIDE_SIZE];
        let entry = CatalogEntry {
            directory: '$',
            name: "PROG".into(),
            locked: true,
            load_address: 0x1900,
            exec_address: 0x1900,
            length: 300,
            start_sector: 3,
        };
        let cat = Catalog { title: "TEST".into(), boot_option: 3, sector_count: 800, entries: vec![entry.clone()] };
        write_catalog(&cat, &mut side).unwrap();
        let back = read_catalog(&side).unwrap();
        assert_eq!(back.entries[0], entry);
    }

    #[test]
    fn directory_byte_roundtrip() {
        assert_eq!(decode_directory_byte(encode_directory_byte('$', false)), ('$', false));
        assert_eq!(decode_directory_byte(encode_directory_byte('A', true)), ('A', true));
    }

    #[test]
    fn validate_rejects_wrong_boot_option() {
        let mut side = vec![0u8; SIDE_SIZE];
        let cat = Catalog { title: "X".into(), boot_option: 0, sector_count: 800, entries: vec![] };
        write_catalog(&cat, &mut side).unwrap();
        assert!(validate(&side).is_err());
    }

    #[test]
    fn rejects_too_many_entries() {
        let mut side = vec![0u8; SIDE_SIZE];
        let entries = (0..32)
            .map(|i| CatalogEntry {
                directory: '$',
                name: format!("F{}", i),
                locked: false,
                load_address: 0,
                exec_address: 0,
                length: 1,
                start_sector: 2,
            })
            .collect();
        let cat = Catalog { title: "X".into(), boot_option: 3, sector_count: 800, entries };
        assert!(write_catalog(&cat, &mut side).is_err());
    }

    #[test]
    fn name_and_title_validation() {
        assert!(validate_name("PROG").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("TOOLONGNAME").is_err());
        assert!(validate_title("MY DISK").is_ok());
        assert!(validate_directory('$').is_ok());
        assert!(validate_directory('a').is_err());
    }
}
