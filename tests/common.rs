//! Shared test harness: an in-memory sector device and logging setup.

#![allow(unused)]

use std::sync::Mutex;

use quark::{BlockDevice, FsError, Result, SECTOR_SIZE, TOTAL_SECTORS};

pub struct RamDisk {
    sectors: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new() -> Self {
        RamDisk {
            sectors: Mutex::new(vec![0u8; SECTOR_SIZE * TOTAL_SECTORS]),
        }
    }
}

impl BlockDevice for RamDisk {
    fn num_sectors(&self) -> usize {
        TOTAL_SECTORS
    }

    fn read_sector(&self, sector_id: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<()> {
        if sector_id as usize >= TOTAL_SECTORS {
            return Err(FsError::Io);
        }
        let sectors = self.sectors.lock().unwrap();
        let start = sector_id as usize * SECTOR_SIZE;
        buf.copy_from_slice(&sectors[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&self, sector_id: u32, buf: &[u8; SECTOR_SIZE]) -> Result<()> {
        if sector_id as usize >= TOTAL_SECTORS {
            return Err(FsError::Io);
        }
        let mut sectors = self.sectors.lock().unwrap();
        let start = sector_id as usize * SECTOR_SIZE;
        sectors[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
