//! Sector-granular file content I/O against an inode's direct block list.

use log::{debug, trace};

use crate::bitmap::{bitmap_clear, bitmap_first_unused};
use crate::block_dev::BlockDevice;
use crate::config::{MAX_FILE_SIZE, MAX_SECTORS_PER_FILE, SECTOR_SIZE, TOTAL_SECTORS};
use crate::error::{FsError, Result};
use crate::inode::{Inode, write_inode};
use crate::layout::{SECTOR_BITMAP_SECTORS, SECTOR_BITMAP_START};

/// Reads up to `buf.len()` bytes starting at `pos`, stopping at
/// end-of-file. Returns the number of bytes read; 0 exactly at end-of-file,
/// never an error for reading there.
pub fn read_at(
    device: &impl BlockDevice,
    inode: &Inode,
    pos: usize,
    buf: &mut [u8],
) -> Result<usize> {
    let end = (pos + buf.len()).min(inode.size as usize);
    if pos >= end {
        return Ok(0);
    }

    let mut sector_buf = [0u8; SECTOR_SIZE];
    let mut cur = pos;
    let mut out = 0;
    while cur < end {
        let in_sector = cur % SECTOR_SIZE;
        let chunk = (SECTOR_SIZE - in_sector).min(end - cur);
        device.read_sector(inode.data[cur / SECTOR_SIZE], &mut sector_buf)?;
        buf[out..out + chunk].copy_from_slice(&sector_buf[in_sector..in_sector + chunk]);
        cur += chunk;
        out += chunk;
    }
    trace!("read_at: pos={pos} wanted={} got={out}", buf.len());
    Ok(out)
}

/// Writes all of `data` starting at `pos`, allocating additional data
/// sectors as needed and extending the file size when the write passes the
/// old end. Partially overlapping sectors are read-modify-written.
///
/// Fails `FileTooBig` before any mutation when the write would exceed the
/// direct block list's reach. Fails `NoSpace` when the sector bitmap runs
/// out mid-allocation; bitmap bits consumed by that point stay consumed
/// (they are not attached to the inode and not rolled back).
pub fn write_at(
    device: &impl BlockDevice,
    inode_id: u32,
    inode: &mut Inode,
    pos: usize,
    data: &[u8],
) -> Result<usize> {
    if pos + data.len() > MAX_FILE_SIZE {
        return Err(FsError::FileTooBig);
    }
    if data.is_empty() {
        return Ok(0);
    }

    let new_end = (pos + data.len()).max(inode.size as usize);
    let allocated = inode.sectors_used();
    let wanted = (new_end + SECTOR_SIZE - 1) / SECTOR_SIZE;
    for i in allocated..wanted {
        let sector = bitmap_first_unused(
            device,
            SECTOR_BITMAP_START,
            SECTOR_BITMAP_SECTORS,
            TOTAL_SECTORS,
        )?
        .ok_or_else(|| {
            debug!("write_at: sector bitmap exhausted growing inode {inode_id}");
            FsError::NoSpace
        })?;
        inode.data[i] = sector;
    }

    // Persist the grown block list and size before touching data sectors:
    // every sector the inode references is already marked in the bitmap.
    inode.size = new_end as u32;
    write_inode(device, inode_id, inode)?;

    let mut sector_buf = [0u8; SECTOR_SIZE];
    let end = pos + data.len();
    let mut cur = pos;
    let mut consumed = 0;
    while cur < end {
        let in_sector = cur % SECTOR_SIZE;
        let chunk = (SECTOR_SIZE - in_sector).min(end - cur);
        let sector = inode.data[cur / SECTOR_SIZE];
        if chunk < SECTOR_SIZE {
            device.read_sector(sector, &mut sector_buf)?;
        }
        sector_buf[in_sector..in_sector + chunk].copy_from_slice(&data[consumed..consumed + chunk]);
        device.write_sector(sector, &sector_buf)?;
        cur += chunk;
        consumed += chunk;
    }
    trace!("write_at: inode={inode_id} pos={pos} len={} new_size={}", data.len(), inode.size);
    Ok(data.len())
}

/// Releases every data sector the file's byte size covers, zeroes the size,
/// and persists the inode. Unlink requires this before the directory entry
/// goes away.
pub fn truncate(device: &impl BlockDevice, inode_id: u32, inode: &mut Inode) -> Result<()> {
    let used = inode.sectors_used();
    for i in 0..used {
        bitmap_clear(device, SECTOR_BITMAP_START, inode.data[i])?;
    }
    inode.size = 0;
    inode.data = [0; MAX_SECTORS_PER_FILE];
    write_inode(device, inode_id, inode)?;
    debug!("truncate: inode {inode_id} released {used} sectors");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inode::InodeKind;
    use std::sync::Mutex;

    struct ScratchDisk {
        sectors: Mutex<Vec<[u8; SECTOR_SIZE]>>,
    }

    impl ScratchDisk {
        /// A full-size volume whose sector bitmap is entirely marked in use.
        fn exhausted() -> Self {
            let mut sectors = vec![[0u8; SECTOR_SIZE]; TOTAL_SECTORS];
            for i in 0..SECTOR_BITMAP_SECTORS as usize {
                sectors[SECTOR_BITMAP_START as usize + i] = [0xff; SECTOR_SIZE];
            }
            ScratchDisk { sectors: Mutex::new(sectors) }
        }
    }

    impl BlockDevice for ScratchDisk {
        fn num_sectors(&self) -> usize {
            self.sectors.lock().unwrap().len()
        }
        fn read_sector(&self, id: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<()> {
            *buf = self.sectors.lock().unwrap()[id as usize];
            Ok(())
        }
        fn write_sector(&self, id: u32, buf: &[u8; SECTOR_SIZE]) -> Result<()> {
            self.sectors.lock().unwrap()[id as usize] = *buf;
            Ok(())
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_fails_no_space_when_sector_bitmap_is_full() {
        let disk = ScratchDisk::exhausted();
        let mut inode = Inode::new(InodeKind::File);
        assert_eq!(
            write_at(&disk, 1, &mut inode, 0, b"no room"),
            Err(FsError::NoSpace)
        );
        // the first allocation failed, so nothing was mutated
        assert_eq!(inode.size, 0);
        assert!(inode.data.iter().all(|&s| s == 0));
    }

    #[test]
    fn exhaustion_mid_growth_keeps_consumed_bits() {
        use crate::layout::DATA_START;

        let disk = ScratchDisk::exhausted();
        bitmap_clear(&disk, SECTOR_BITMAP_START, DATA_START).unwrap();

        // one free sector, a write that needs two
        let mut inode = Inode::new(InodeKind::File);
        let data = vec![7u8; SECTOR_SIZE + 1];
        assert_eq!(
            write_at(&disk, 1, &mut inode, 0, &data),
            Err(FsError::NoSpace)
        );
        assert_eq!(inode.size, 0);

        // the lone free bit was consumed by the failed pass and stays so
        assert_eq!(
            bitmap_first_unused(
                &disk,
                SECTOR_BITMAP_START,
                SECTOR_BITMAP_SECTORS,
                TOTAL_SECTORS
            )
            .unwrap(),
            None
        );
    }
}
