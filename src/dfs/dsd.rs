//! DSD builder (C10): combine two independent DFS sides into one
//! double-sided 400 KiB image.
//!
//! Grounded on `goblin::mach::fat::FatArch`: a fat binary is several
//! independent single-architecture blobs concatenated under one physical
//! layout scheme; here the two blobs are DFS sides and the layout scheme is
//! `Side0ThenSide1` or `TrackInterleaved` instead of per-arch offsets.

use crate::dfs::builder::DfsImage;
use crate::dfs::catalog::{SECTORS_PER_TRACK, SECTOR_SIZE, SIDE_SIZE, TRACKS_PER_SIDE};
use crate::error::{Error, Result};

/// Physical sector ordering of a double-sided image (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalOrdering {
    /// `[side 0 full][side 1 full]`.
    Side0ThenSide1,
    /// `track0-side0, track0-side1, track1-side0, track1-side1, ...`
    TrackInterleaved,
}

/// Compose two 200 KiB DFS sides into one 400 KiB `.dsd` image.
pub fn build_dsd(side0: &DfsImage, side1: &DfsImage, ordering: PhysicalOrdering) -> Result<Vec<u8>> {
    let a = side0.as_bytes();
    let b = side1.as_bytes();
    if a.len() != SIDE_SIZE || b.len() != SIDE_SIZE {
        return Err(Error::Disk("both DSD sides must be 200 KiB DFS images".into()));
    }

    let mut out = vec![0u8; 2 * SIDE_SIZE];
    match ordering {
        PhysicalOrdering::Side0ThenSide1 => {
            out[0..SIDE_SIZE].copy_from_slice(a);
            out[SIDE_SIZE..2 * SIDE_SIZE].copy_from_slice(b);
        }
        PhysicalOrdering::TrackInterleaved => {
            for track in 0..TRACKS_PER_SIDE {
                for (side_idx, side) in [a, b].into_iter().enumerate() {
                    let src_off = track * SECTORS_PER_TRACK * SECTOR_SIZE;
                    let dst_off = track_interleaved_offset(track, side_idx, 0);
                    let len = SECTORS_PER_TRACK * SECTOR_SIZE;
                    out[dst_off..dst_off + len].copy_from_slice(&side[src_off..src_off + len]);
                }
            }
        }
    }
    log::debug!("built {:?} DSD image ({} bytes)", ordering, out.len());
    Ok(out)
}

/// Byte offset of `sector` on `track`/`side` under `TrackInterleaved`
/// ordering: `(((track*2) + side) * sectorsPerTrack + sector) * sectorSize`
/// (spec §4.9).
fn track_interleaved_offset(track: usize, side: usize, sector: usize) -> usize {
    (((track * 2) + side) * SECTORS_PER_TRACK + sector) * SECTOR_SIZE
}
