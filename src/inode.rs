//! Inode records and the packed on-disk inode table.

use log::trace;

use crate::block_dev::BlockDevice;
use crate::config::{MAX_FILES, MAX_SECTORS_PER_FILE, SECTOR_SIZE};
use crate::error::{FsError, Result};
use crate::layout::{INODES_PER_SECTOR, INODE_TABLE_START};

/// Byte size of one serialized inode: size, kind tag, direct sector list.
pub const INODE_DISK_SIZE: usize = 4 + 4 + 4 * MAX_SECTORS_PER_FILE;

const KIND_FILE: u32 = 0;
const KIND_DIRECTORY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeKind {
    File,
    Directory,
}

/// A fixed-size inode record. For files `size` is a byte count; for
/// directories it is the number of entry slots, tombstones included. The
/// direct sector list is the only block mapping there is, which bounds the
/// maximum file size to `MAX_SECTORS_PER_FILE * SECTOR_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub size: u32,
    pub kind: InodeKind,
    pub data: [u32; MAX_SECTORS_PER_FILE],
}

impl Inode {
    pub fn new(kind: InodeKind) -> Self {
        Inode {
            size: 0,
            kind,
            data: [0; MAX_SECTORS_PER_FILE],
        }
    }

    /// Number of data sectors a file of this byte size occupies.
    pub fn sectors_used(&self) -> usize {
        (self.size as usize + SECTOR_SIZE - 1) / SECTOR_SIZE
    }

    pub fn to_bytes(&self) -> [u8; INODE_DISK_SIZE] {
        let mut buf = [0u8; INODE_DISK_SIZE];
        buf[0..4].copy_from_slice(&self.size.to_le_bytes());
        let tag = match self.kind {
            InodeKind::File => KIND_FILE,
            InodeKind::Directory => KIND_DIRECTORY,
        };
        buf[4..8].copy_from_slice(&tag.to_le_bytes());
        for (i, sector) in self.data.iter().enumerate() {
            let at = 8 + i * 4;
            buf[at..at + 4].copy_from_slice(&sector.to_le_bytes());
        }
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < INODE_DISK_SIZE {
            return Err(FsError::Io);
        }
        let size = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let kind = match u32::from_le_bytes(buf[4..8].try_into().unwrap()) {
            KIND_FILE => InodeKind::File,
            KIND_DIRECTORY => InodeKind::Directory,
            _ => return Err(FsError::Io),
        };
        let mut data = [0u32; MAX_SECTORS_PER_FILE];
        for (i, sector) in data.iter_mut().enumerate() {
            let at = 8 + i * 4;
            *sector = u32::from_le_bytes(buf[at..at + 4].try_into().unwrap());
        }
        Ok(Inode { size, kind, data })
    }
}

/// Inode table sector containing `inode_id`.
pub fn inode_sector(inode_id: u32) -> u32 {
    INODE_TABLE_START + inode_id / INODES_PER_SECTOR as u32
}

/// Byte offset of `inode_id` within its table sector.
fn inode_offset(inode_id: u32) -> usize {
    (inode_id as usize % INODES_PER_SECTOR) * INODE_DISK_SIZE
}

pub fn read_inode(device: &impl BlockDevice, inode_id: u32) -> Result<Inode> {
    if inode_id as usize >= MAX_FILES {
        return Err(FsError::Io);
    }
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(inode_sector(inode_id), &mut buf)?;
    Inode::from_bytes(&buf[inode_offset(inode_id)..])
}

pub fn write_inode(device: &impl BlockDevice, inode_id: u32, inode: &Inode) -> Result<()> {
    if inode_id as usize >= MAX_FILES {
        return Err(FsError::Io);
    }
    let sector = inode_sector(inode_id);
    let mut buf = [0u8; SECTOR_SIZE];
    device.read_sector(sector, &mut buf)?;
    let at = inode_offset(inode_id);
    buf[at..at + INODE_DISK_SIZE].copy_from_slice(&inode.to_bytes());
    device.write_sector(sector, &buf)?;
    trace!("write_inode: id={} size={} kind={:?}", inode_id, inode.size, inode.kind);
    Ok(())
}

/// Caches the most recently read inode-table sector. Only lives for the
/// duration of one path-resolution pass; consecutive components whose
/// inodes share a table sector skip the redundant read.
pub struct InodeCache {
    sector: Option<u32>,
    buf: [u8; SECTOR_SIZE],
}

impl InodeCache {
    pub fn new() -> Self {
        InodeCache {
            sector: None,
            buf: [0u8; SECTOR_SIZE],
        }
    }

    pub fn inode(&mut self, device: &impl BlockDevice, inode_id: u32) -> Result<Inode> {
        if inode_id as usize >= MAX_FILES {
            return Err(FsError::Io);
        }
        let sector = inode_sector(inode_id);
        if self.sector != Some(sector) {
            device.read_sector(sector, &mut self.buf)?;
            self.sector = Some(sector);
        }
        Inode::from_bytes(&self.buf[inode_offset(inode_id)..])
    }
}

impl Default for InodeCache {
    fn default() -> Self {
        Self::new()
    }
}
