//! First-fit bit allocator over a contiguous run of sectors.
//!
//! Both the inode bitmap and the sector bitmap are instances of this layout:
//! a flat bit array, most-significant-bit-first within each byte, where a
//! set bit means the resource with that index is in use. Every call that
//! changes state performs its own read-modify-write of exactly one sector.

use log::trace;

use crate::block_dev::BlockDevice;
use crate::config::SECTOR_SIZE;
use crate::error::Result;

const BITS_PER_SECTOR: usize = SECTOR_SIZE * 8;

/// Zero-fills `sectors` sectors starting at `start`, then marks the first
/// `preset_bits` bits as in use. Used at format time to reserve the fixed
/// system regions (and the root inode) before any allocation happens.
pub fn bitmap_init(
    device: &impl BlockDevice,
    start: u32,
    sectors: u32,
    preset_bits: usize,
) -> Result<()> {
    trace!("bitmap_init: start={start} sectors={sectors} preset={preset_bits}");
    let mut buf = [0u8; SECTOR_SIZE];
    for i in 0..sectors as usize {
        let covered = preset_bits.saturating_sub(i * BITS_PER_SECTOR).min(BITS_PER_SECTOR);
        let full_bytes = covered / 8;
        let tail_bits = covered % 8;

        buf.fill(0);
        buf[..full_bytes].fill(0xff);
        if tail_bits > 0 {
            // high `tail_bits` bits of the partial byte
            buf[full_bytes] = !(0xffu8 >> tail_bits);
        }
        device.write_sector(start + i as u32, &buf)?;
    }
    Ok(())
}

/// Finds the first clear bit, sets it, and returns its index. Returns
/// `Ok(None)` when the bitmap is exhausted.
///
/// `capacity` is the logical resource cap, which may be smaller than the
/// physical bit capacity of the sectors. A physically free bit at or past
/// `capacity` is still consumed, but reported as exhaustion: bits beyond
/// the cap are never valid allocations.
pub fn bitmap_first_unused(
    device: &impl BlockDevice,
    start: u32,
    sectors: u32,
    capacity: usize,
) -> Result<Option<u32>> {
    let mut buf = [0u8; SECTOR_SIZE];
    for i in 0..sectors as usize {
        device.read_sector(start + i as u32, &mut buf)?;
        for j in 0..SECTOR_SIZE {
            if buf[j] == 0xff {
                continue;
            }
            for k in 0..8 {
                let mask = 0x80u8 >> k;
                if buf[j] & mask != 0 {
                    continue;
                }
                let pos = i * BITS_PER_SECTOR + j * 8 + k;
                buf[j] |= mask;
                device.write_sector(start + i as u32, &buf)?;
                if pos < capacity {
                    trace!("bitmap_first_unused: allocated bit {pos}");
                    return Ok(Some(pos as u32));
                }
                trace!("bitmap_first_unused: free bit {pos} past capacity {capacity}");
                return Ok(None);
            }
        }
    }
    Ok(None)
}

/// Clears the bit at `index`. Clearing an already-free bit is a silent
/// no-op, not an error.
pub fn bitmap_clear(
    device: &impl BlockDevice,
    start: u32,
    index: u32,
) -> Result<()> {
    let sector = start + index / BITS_PER_SECTOR as u32;
    let byte = (index as usize % BITS_PER_SECTOR) / 8;
    let mask = !(0x80u8 >> (index % 8));

    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(sector, &mut buf)?;
    buf[byte] &= mask;
    device.write_sector(sector, &buf)?;
    trace!("bitmap_clear: freed bit {index}");
    Ok(())
}
