use crate::config::SECTOR_SIZE;
use crate::error::Result;

pub trait BlockDevice: Send + Sync {
    /// Returns the number of sectors on the device.
    fn num_sectors(&self) -> usize;

    /// Reads one sector into `buf`.
    fn read_sector(&self, sector_id: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<()>;

    /// Writes one sector from `buf`.
    fn write_sector(&self, sector_id: u32, buf: &[u8; SECTOR_SIZE]) -> Result<()>;

    /// Pushes any pending state to durable storage.
    fn flush(&self) -> Result<()>;

    /// Returns the size of each sector in bytes.
    fn sector_size(&self) -> usize {
        SECTOR_SIZE
    }
}
