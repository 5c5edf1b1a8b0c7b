//! Simulated block device: the whole volume lives in memory and is made
//! durable only by an explicit save to a backing file.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::block_dev::BlockDevice;
use crate::config::{SECTOR_SIZE, TOTAL_SECTORS};
use crate::error::{FsError, Result};

pub const IMAGE_SIZE: usize = SECTOR_SIZE * TOTAL_SECTORS;

pub struct MemDisk {
    data: Mutex<Vec<u8>>,
    backing: Option<PathBuf>,
}

impl MemDisk {
    /// A fresh, zero-filled volume with no backing file.
    pub fn new() -> Self {
        MemDisk {
            data: Mutex::new(vec![0u8; IMAGE_SIZE]),
            backing: None,
        }
    }

    /// A fresh volume that will save to `path`. The file is not created
    /// until the first [`save`](Self::save).
    pub fn create(path: impl AsRef<Path>) -> Self {
        MemDisk {
            data: Mutex::new(vec![0u8; IMAGE_SIZE]),
            backing: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Loads an existing volume image from `path`. The image must be
    /// exactly `SECTOR_SIZE * TOTAL_SECTORS` bytes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = fs::File::open(path).map_err(|_| FsError::Io)?;
        let len = file.metadata().map_err(|_| FsError::Io)?.len();
        if len != IMAGE_SIZE as u64 {
            debug!("backing file {:?} has {} bytes, expected {}", path, len, IMAGE_SIZE);
            return Err(FsError::BadImageSize);
        }
        let mut data = vec![0u8; IMAGE_SIZE];
        file.read_exact(&mut data).map_err(|_| FsError::Io)?;
        debug!("loaded volume image from {:?}", path);
        Ok(MemDisk {
            data: Mutex::new(data),
            backing: Some(path.to_path_buf()),
        })
    }

    /// Writes the whole in-memory volume out to the backing file.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.backing else {
            return Ok(());
        };
        let data = self.data.lock().unwrap();
        let mut file = fs::File::create(path).map_err(|_| FsError::Io)?;
        file.write_all(&data).map_err(|_| FsError::Io)?;
        file.sync_all().map_err(|_| FsError::Io)?;
        debug!("saved volume image to {:?}", path);
        Ok(())
    }
}

impl BlockDevice for MemDisk {
    fn num_sectors(&self) -> usize {
        TOTAL_SECTORS
    }

    fn read_sector(&self, sector_id: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<()> {
        if sector_id as usize >= TOTAL_SECTORS {
            return Err(FsError::Io);
        }
        let data = self.data.lock().unwrap();
        let start = sector_id as usize * SECTOR_SIZE;
        buf.copy_from_slice(&data[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&self, sector_id: u32, buf: &[u8; SECTOR_SIZE]) -> Result<()> {
        if sector_id as usize >= TOTAL_SECTORS {
            return Err(FsError::Io);
        }
        let mut data = self.data.lock().unwrap();
        let start = sector_id as usize * SECTOR_SIZE;
        data[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.save()
    }
}
