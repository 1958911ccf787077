//! Template patcher (C11): substitute the `HELLO` payload in an externally
//! authored DFS image, touching only that file's sectors and its one
//! catalog info entry.
//!
//! Grounded on `goblin::elf::writer::ElfWriter`'s in-place field mutation
//! over an otherwise-untouched parsed binary: find the target, overwrite
//! exactly its bytes, leave everything else as the caller handed it to us.

use crate::dfs::catalog::{self, SECTOR_SIZE, SIDE_SIZE};
use crate::error::{Error, Result};

const TEMPLATE_ENTRY_NAME: &str = "HELLO";

fn sectors_needed(len: usize) -> usize {
    (len + SECTOR_SIZE - 1) / SECTOR_SIZE
}

/// Replace the `HELLO` file's payload in-place. `image` must be an exact
/// 200 KiB DFS side already containing a `HELLO` catalog entry. Every byte
/// outside `HELLO`'s sector range and its own catalog info entry is left
/// unchanged (spec §4.8 "Template patcher").
pub fn patch_template(image: &mut [u8], payload: &[u8], load: u32, exec: u32) -> Result<()> {
    if image.len() != SIDE_SIZE {
        return Err(Error::Disk(format!("template must be exactly {} bytes, got {}", SIDE_SIZE, image.len())));
    }

    let catalog = catalog::read_catalog(image)?;
    let index = catalog
        .entries
        .iter()
        .position(|e| e.name.eq_ignore_ascii_case(TEMPLATE_ENTRY_NAME))
        .ok_or_else(|| Error::Disk(format!("template has no '{}' entry", TEMPLATE_ENTRY_NAME)))?;

    let start = catalog.entries[index].start_sector as usize;
    let needed = sectors_needed(payload.len());
    if start + needed > catalog::SECTORS_PER_SIDE {
        return Err(Error::Disk(format!(
            "payload needs {} sectors from {}, but the side only has {}",
            needed,
            start,
            catalog::SECTORS_PER_SIDE
        )));
    }

    let region_start = start * SECTOR_SIZE;
    let region_len = needed * SECTOR_SIZE;
    image[region_start..region_start + region_len].fill(0);
    image[region_start..region_start + payload.len()].copy_from_slice(payload);

    catalog::rewrite_info_entry(image, index, load, exec, payload.len() as u32)?;

    log::debug!("patched '{}' at sector {}: {} bytes ({} sectors)", TEMPLATE_ENTRY_NAME, start, payload.len(), needed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfs::builder::DfsImage;

    fn template_with_hello() -> Vec<u8> {
        let mut image = DfsImage::create_blank("TEMPLATE", 0).unwrap();
        image.add_file('$', "HELLO", &[0u8; 256], 0x2000, 0x2000, false).unwrap();
        image.into_bytes()
    }

    #[test]
    fn s7_template_patch_determinism() {
        let original = template_with_hello();
        let mut patched = original.clone();
        patch_template(&mut patched, b"hello, world", 0x1900, 0x1901).unwrap();

        let cat = catalog::read_catalog(&patched).unwrap();
        let hello = cat.entries.iter().find(|e| e.name == "HELLO").unwrap();
        assert_eq!(hello.length, 12);
        assert_eq!(hello.load_address, 0x1900);
        assert_eq!(hello.exec_address, 0x1901);
        assert_eq!(hello.start_sector, 2);

        assert_eq!(&patched[2 * SECTOR_SIZE..2 * SECTOR_SIZE + 12], b"hello, world");
        // Everything outside HELLO's sector and its info entry is untouched.
        assert_eq!(&patched[0..SECTOR_SIZE + 8], &original[0..SECTOR_SIZE + 8]);
    }

    #[test]
    fn missing_hello_is_fatal() {
        let mut image = DfsImage::create_blank("T", 0).unwrap().into_bytes();
        assert!(patch_template(&mut image, b"x", 0, 0).is_err());
    }

    #[test]
    fn wrong_size_input_is_fatal() {
        let mut bogus = vec![0u8; 100];
        assert!(patch_template(&mut bogus, b"x", 0, 0).is_err());
    }

    #[test]
    fn payload_overrun_is_fatal() {
        let mut image = template_with_hello();
        let huge = vec![0u8; 799 * SECTOR_SIZE];
        assert!(patch_template(&mut image, &huge, 0, 0).is_err());
    }

    #[test]
    fn slack_bytes_zero_filled() {
        let mut image = template_with_hello();
        // Original HELLO payload sector had all zero bytes already; rewrite
        // with a shorter payload and check the remainder of the sector is
        // zero, not leftover garbage.
        patch_template(&mut image, b"hi", 0, 0).unwrap();
        assert_eq!(image[2 * SECTOR_SIZE + 2], 0);
        assert_eq!(image[2 * SECTOR_SIZE + 255], 0);
    }
}
