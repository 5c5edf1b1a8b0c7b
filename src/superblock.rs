//! Superblock and whole-volume format.

use log::debug;

use crate::bitmap::bitmap_init;
use crate::block_dev::BlockDevice;
use crate::config::{MAGIC, MAX_FILES, SECTOR_SIZE, SUPERBLOCK_SECTOR};
use crate::error::{FsError, Result};
use crate::inode::{INODE_DISK_SIZE, Inode, InodeKind};
use crate::layout::{
    DATA_START, INODE_BITMAP_SECTORS, INODE_BITMAP_START, INODE_TABLE_SECTORS, INODE_TABLE_START,
    SECTOR_BITMAP_SECTORS, SECTOR_BITMAP_START,
};

/// Verifies the volume magic in the superblock sector.
pub fn check_magic(device: &impl BlockDevice) -> Result<()> {
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(SUPERBLOCK_SECTOR, &mut buf)?;
    let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    if magic != MAGIC {
        debug!("check_magic: found {magic:#010x}, expected {MAGIC:#010x}");
        return Err(FsError::BadMagic);
    }
    Ok(())
}

/// Formats a fresh volume: writes the magic, initializes both bitmaps with
/// their fixed reservations, and zeroes the inode table with inode 0 set up
/// as the empty root directory.
pub fn format(device: &impl BlockDevice) -> Result<()> {
    let mut buf = [0u8; SECTOR_SIZE];
    buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    device.write_sector(SUPERBLOCK_SECTOR, &buf)?;

    // inode 0 is the root directory, never freed
    bitmap_init(device, INODE_BITMAP_START, INODE_BITMAP_SECTORS, 1)?;
    // every sector below the data region belongs to the system layout
    bitmap_init(
        device,
        SECTOR_BITMAP_START,
        SECTOR_BITMAP_SECTORS,
        DATA_START as usize,
    )?;

    for i in 0..INODE_TABLE_SECTORS {
        buf.fill(0);
        if i == 0 {
            let root = Inode::new(InodeKind::Directory);
            buf[..INODE_DISK_SIZE].copy_from_slice(&root.to_bytes());
        }
        device.write_sector(INODE_TABLE_START + i, &buf)?;
    }

    debug!(
        "format: {} inodes, data region starts at sector {}",
        MAX_FILES, DATA_START
    );
    Ok(())
}
