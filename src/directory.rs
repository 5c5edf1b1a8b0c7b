//! Directory entries and the inode create/remove lifecycle.
//!
//! A directory's content is a packed list of fixed-size entry records. The
//! directory inode's `size` counts entry slots, tombstones included: removal
//! zeroes a record in place and never shrinks the list, so churn fragments
//! slot space permanently. That policy is deliberate (slot index arithmetic
//! depends on it) and is isolated behind [`DirectoryEntries`].

use log::{debug, trace};

use crate::bitmap::{bitmap_clear, bitmap_first_unused};
use crate::block_dev::BlockDevice;
use crate::config::{MAX_FILES, MAX_NAME, MAX_SECTORS_PER_FILE, SECTOR_SIZE, TOTAL_SECTORS};
use crate::error::{FsError, Result};
use crate::inode::{Inode, InodeKind, read_inode, write_inode};
use crate::layout::{
    DIRENTS_PER_SECTOR, INODE_BITMAP_SECTORS, INODE_BITMAP_START, SECTOR_BITMAP_SECTORS,
    SECTOR_BITMAP_START,
};

/// Byte size of one serialized directory entry: fixed-width name plus the
/// child's inode number. Clients parsing `read_dir` buffers depend on this
/// exact layout.
pub const DIR_ENTRY_SIZE: usize = MAX_NAME + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; MAX_NAME],
    pub inode: u32,
}

impl DirEntry {
    pub const TOMBSTONE: Self = DirEntry {
        name: [0; MAX_NAME],
        inode: 0,
    };

    /// `name` must already satisfy the filename policy (non-empty, shorter
    /// than `MAX_NAME`).
    pub fn new(name: &[u8], inode: u32) -> Self {
        let mut fixed = [0u8; MAX_NAME];
        fixed[..name.len()].copy_from_slice(name);
        DirEntry { name: fixed, inode }
    }

    /// Name with the NUL padding stripped.
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&c| c == 0).unwrap_or(MAX_NAME);
        &self.name[..end]
    }

    /// A zeroed slot left behind by a removal.
    pub fn is_tombstone(&self) -> bool {
        self.inode == 0 && self.name.iter().all(|&c| c == 0)
    }

    pub fn to_bytes(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        buf[..MAX_NAME].copy_from_slice(&self.name);
        buf[MAX_NAME..].copy_from_slice(&self.inode.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < DIR_ENTRY_SIZE {
            return Err(FsError::Io);
        }
        let mut name = [0u8; MAX_NAME];
        name.copy_from_slice(&buf[..MAX_NAME]);
        let inode = u32::from_le_bytes(buf[MAX_NAME..DIR_ENTRY_SIZE].try_into().unwrap());
        Ok(DirEntry { name, inode })
    }
}

/// The entry list of one directory, loaded together with its inode.
///
/// Mutating operations persist both the touched entry sector and the
/// directory inode, one sector write at a time.
pub struct DirectoryEntries<'a, D: BlockDevice> {
    device: &'a D,
    inode_id: u32,
    inode: Inode,
}

impl<'a, D: BlockDevice> DirectoryEntries<'a, D> {
    pub fn load(device: &'a D, inode_id: u32) -> Result<Self> {
        let inode = read_inode(device, inode_id)?;
        Self::from_inode(device, inode_id, inode)
    }

    pub fn from_inode(device: &'a D, inode_id: u32, inode: Inode) -> Result<Self> {
        if inode.kind != InodeKind::Directory {
            return Err(FsError::NotADirectory);
        }
        Ok(DirectoryEntries { device, inode_id, inode })
    }

    /// Number of entry slots, tombstones included.
    pub fn slots(&self) -> usize {
        self.inode.size as usize
    }

    /// Exact byte size of the entry list as returned by [`read_all`].
    pub fn byte_size(&self) -> usize {
        self.slots() * DIR_ENTRY_SIZE
    }

    /// Looks up a live entry by name.
    pub fn find(&self, name: &[u8]) -> Result<Option<u32>> {
        let mut buf = [0u8; SECTOR_SIZE];
        let mut remaining = self.slots();
        for &sector in self.inode.data.iter() {
            if remaining == 0 {
                break;
            }
            self.device.read_sector(sector, &mut buf)?;
            for slot in 0..DIRENTS_PER_SECTOR.min(remaining) {
                let entry = DirEntry::from_bytes(&buf[slot * DIR_ENTRY_SIZE..])?;
                if !entry.is_tombstone() && entry.name() == name {
                    trace!("dir {}: found '{}' -> inode {}",
                        self.inode_id, String::from_utf8_lossy(name), entry.inode);
                    return Ok(Some(entry.inode));
                }
            }
            remaining = remaining.saturating_sub(DIRENTS_PER_SECTOR);
        }
        Ok(None)
    }

    /// Appends an entry at the next slot. When the slot count is an exact
    /// multiple of the per-sector capacity a fresh data sector is allocated
    /// first (`DiskFull` when none is free). The slot count grows by one and
    /// never shrinks again.
    pub fn append(&mut self, entry: DirEntry) -> Result<()> {
        let slots = self.slots();
        let group = slots / DIRENTS_PER_SECTOR;
        if group >= MAX_SECTORS_PER_FILE {
            return Err(FsError::DiskFull);
        }

        let mut buf = [0u8; SECTOR_SIZE];
        if slots % DIRENTS_PER_SECTOR == 0 {
            let sector = bitmap_first_unused(
                self.device,
                SECTOR_BITMAP_START,
                SECTOR_BITMAP_SECTORS,
                TOTAL_SECTORS,
            )?
            .ok_or(FsError::DiskFull)?;
            self.inode.data[group] = sector;
            debug!("dir {}: new entry sector {} for group {}", self.inode_id, sector, group);
        } else {
            self.device.read_sector(self.inode.data[group], &mut buf)?;
        }

        let at = (slots % DIRENTS_PER_SECTOR) * DIR_ENTRY_SIZE;
        buf[at..at + DIR_ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
        self.device.write_sector(self.inode.data[group], &buf)?;

        self.inode.size += 1;
        write_inode(self.device, self.inode_id, &self.inode)?;
        trace!("dir {}: appended '{}' at slot {}",
            self.inode_id, String::from_utf8_lossy(entry.name()), slots);
        Ok(())
    }

    /// Zeroes the entry whose inode equals `child`, leaving a tombstone.
    /// Scans the fully occupied sectors first, then the partial trailing
    /// sector. The slot count is not decremented.
    pub fn erase(&mut self, child: u32) -> Result<()> {
        let slots = self.slots();
        let full_sectors = slots / DIRENTS_PER_SECTOR;
        let tail_slots = slots % DIRENTS_PER_SECTOR;

        let mut buf = [0u8; SECTOR_SIZE];
        for group in 0..full_sectors {
            if self.erase_in_sector(self.inode.data[group], DIRENTS_PER_SECTOR, child, &mut buf)? {
                return Ok(());
            }
        }
        if tail_slots > 0
            && self.erase_in_sector(self.inode.data[full_sectors], tail_slots, child, &mut buf)?
        {
            return Ok(());
        }
        Err(FsError::NoSuchFile)
    }

    fn erase_in_sector(
        &self,
        sector: u32,
        slots: usize,
        child: u32,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<bool> {
        self.device.read_sector(sector, buf)?;
        for slot in 0..slots {
            let at = slot * DIR_ENTRY_SIZE;
            let entry = DirEntry::from_bytes(&buf[at..])?;
            if !entry.is_tombstone() && entry.inode == child {
                buf[at..at + DIR_ENTRY_SIZE].copy_from_slice(&DirEntry::TOMBSTONE.to_bytes());
                self.device.write_sector(sector, buf)?;
                trace!("dir {}: erased entry for inode {}", self.inode_id, child);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns every entry slot verbatim, tombstones included, in on-disk
    /// order.
    pub fn read_all(&self) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::with_capacity(self.slots());
        let mut buf = [0u8; SECTOR_SIZE];
        let mut remaining = self.slots();
        for &sector in self.inode.data.iter() {
            if remaining == 0 {
                break;
            }
            self.device.read_sector(sector, &mut buf)?;
            for slot in 0..DIRENTS_PER_SECTOR.min(remaining) {
                entries.push(DirEntry::from_bytes(&buf[slot * DIR_ENTRY_SIZE..])?);
            }
            remaining = remaining.saturating_sub(DIRENTS_PER_SECTOR);
        }
        Ok(entries)
    }
}

/// Allocates an inode of the given kind and appends a directory entry for
/// it under `parent`. Returns the new inode's id.
///
/// On `DiskFull` the freshly allocated inode bit is not rolled back; no
/// partially applied mutation is ever undone.
pub fn create_entry(
    device: &impl BlockDevice,
    kind: InodeKind,
    parent: u32,
    name: &[u8],
) -> Result<u32> {
    let child = bitmap_first_unused(
        device,
        INODE_BITMAP_START,
        INODE_BITMAP_SECTORS,
        MAX_FILES,
    )?
    .ok_or(FsError::InodeTableFull)?;

    write_inode(device, child, &Inode::new(kind))?;
    debug!("create_entry: inode {} kind {:?} under parent {}", child, kind, parent);

    let mut entries = DirectoryEntries::load(device, parent)?;
    entries.append(DirEntry::new(name, child))?;
    Ok(child)
}

/// Unlinks `child` from `parent` and frees its inode id.
///
/// The child's on-disk kind must match `kind`. A directory child must have
/// a zero slot count; tombstoned slots still count, so a directory whose
/// every entry was removed is reported non-empty and can never be unlinked
/// (known limitation of the format). A file child must have had its data
/// sectors released and its size zeroed by the caller beforehand.
pub fn remove_entry(
    device: &impl BlockDevice,
    kind: InodeKind,
    parent: u32,
    child: u32,
) -> Result<()> {
    let child_inode = read_inode(device, child)?;
    if child_inode.kind != kind {
        debug!("remove_entry: inode {} is {:?}, expected {:?}", child, child_inode.kind, kind);
        return Err(FsError::TypeMismatch);
    }
    if child_inode.size > 0 {
        return match kind {
            InodeKind::Directory => Err(FsError::DirectoryNotEmpty),
            InodeKind::File => Err(FsError::Io),
        };
    }

    let mut entries = DirectoryEntries::load(device, parent)?;
    entries.erase(child).map_err(|e| match (e, kind) {
        (FsError::NoSuchFile, InodeKind::Directory) => FsError::NoSuchDirectory,
        (other, _) => other,
    })?;

    // The entry is gone from disk before the inode id becomes reusable.
    bitmap_clear(device, INODE_BITMAP_START, child)?;
    debug!("remove_entry: freed inode {}", child);
    Ok(())
}
