//! Static partition of the sector address space, derived from the
//! configuration constants in [`config`](crate::config).
//!
//! The volume is split into five regions, in order: superblock, inode
//! bitmap, sector bitmap, inode table, data sectors. Region boundaries are
//! fixed at compile time; nothing on disk records them.

use crate::config::*;
use crate::directory::DIR_ENTRY_SIZE;
use crate::inode::INODE_DISK_SIZE;

const fn sectors_for(bytes: usize) -> usize {
    (bytes + SECTOR_SIZE - 1) / SECTOR_SIZE
}

/// One bit per inode table entry.
pub const INODE_BITMAP_BYTES: usize = (MAX_FILES + 7) / 8;
pub const INODE_BITMAP_START: u32 = SUPERBLOCK_SECTOR + 1;
pub const INODE_BITMAP_SECTORS: u32 = sectors_for(INODE_BITMAP_BYTES) as u32;

/// One bit per sector of the whole volume, data region included.
pub const SECTOR_BITMAP_BYTES: usize = (TOTAL_SECTORS + 7) / 8;
pub const SECTOR_BITMAP_START: u32 = INODE_BITMAP_START + INODE_BITMAP_SECTORS;
pub const SECTOR_BITMAP_SECTORS: u32 = sectors_for(SECTOR_BITMAP_BYTES) as u32;

/// Inodes are packed but never straddle a sector boundary, so each inode
/// table sector may carry trailing dead bytes.
pub const INODES_PER_SECTOR: usize = SECTOR_SIZE / INODE_DISK_SIZE;
pub const INODE_TABLE_START: u32 = SECTOR_BITMAP_START + SECTOR_BITMAP_SECTORS;
pub const INODE_TABLE_SECTORS: u32 =
    ((MAX_FILES + INODES_PER_SECTOR - 1) / INODES_PER_SECTOR) as u32;

/// Everything from here up is data sectors.
pub const DATA_START: u32 = INODE_TABLE_START + INODE_TABLE_SECTORS;

pub const DIRENTS_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;
