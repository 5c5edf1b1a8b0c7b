//! The file system session: volume lifecycle, the open-file table, and the
//! public operations.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::block_dev::BlockDevice;
use crate::config::{MAX_FILE_SIZE, MAX_OPEN_FILES, ROOT_INODE_ID};
use crate::directory::{DirEntry, DirectoryEntries, create_entry, remove_entry};
use crate::disk::MemDisk;
use crate::error::{FsError, Result};
use crate::file::{read_at, truncate, write_at};
use crate::inode::{InodeKind, read_inode};
use crate::path::resolve;
use crate::superblock;

/// One open-file table slot: the file's inode, its size as cached at open
/// (kept current by writes through this session), and the read/write
/// cursor.
#[derive(Debug, Clone, Copy)]
struct OpenFile {
    inode: u32,
    size: u32,
    pos: u32,
}

/// A mounted volume plus its process-lifetime state.
///
/// The open-file table is owned by the session: it starts empty at every
/// boot and is never persisted. All operations are synchronous and perform
/// their sector I/O inline; the design assumes a single caller at a time.
pub struct FileSystem<D: BlockDevice> {
    device: Arc<D>,
    open_files: Vec<Option<OpenFile>>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Formats `device` as an empty volume and mounts it.
    pub fn format(device: Arc<D>) -> Result<Self> {
        superblock::format(&*device)?;
        Ok(Self::session(device))
    }

    /// Mounts an already formatted volume, verifying the magic.
    pub fn mount(device: Arc<D>) -> Result<Self> {
        superblock::check_magic(&*device)?;
        Ok(Self::session(device))
    }

    fn session(device: Arc<D>) -> Self {
        FileSystem {
            device,
            open_files: vec![None; MAX_OPEN_FILES],
        }
    }

    /// Pushes the volume to durable storage.
    pub fn sync(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }

    // --- create / remove ---

    pub fn create_file(&mut self, path: &str) -> Result<()> {
        self.create(InodeKind::File, path)
    }

    pub fn create_dir(&mut self, path: &str) -> Result<()> {
        self.create(InodeKind::Directory, path)
    }

    fn create(&mut self, kind: InodeKind, path: &str) -> Result<()> {
        let resolved = resolve(&*self.device, path)?;
        if resolved.child.is_some() {
            return Err(FsError::AlreadyExists);
        }
        let inode = create_entry(
            &*self.device,
            kind,
            resolved.parent,
            resolved.name.as_bytes(),
        )?;
        debug!("created {kind:?} '{path}' as inode {inode}");
        Ok(())
    }

    /// Removes a file: releases its data sectors, unlinks it from its
    /// parent, and frees its inode. An open file cannot be removed.
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let resolved = resolve(&*self.device, path).map_err(|_| FsError::NoSuchFile)?;
        let child = resolved.child.ok_or(FsError::NoSuchFile)?;
        if self.is_open(child) {
            return Err(FsError::FileInUse);
        }
        let mut inode = read_inode(&*self.device, child)?;
        if inode.kind != InodeKind::File {
            return Err(FsError::TypeMismatch);
        }
        // content goes first; remove_entry expects a zero-size file
        truncate(&*self.device, child, &mut inode)?;
        remove_entry(&*self.device, InodeKind::File, resolved.parent, child)?;
        debug!("unlinked '{path}' (inode {child})");
        Ok(())
    }

    /// Removes an empty directory. The root directory is protected.
    ///
    /// Emptiness means a zero slot count: tombstoned slots still count, so
    /// a directory that has only ever lost entries stays non-removable.
    pub fn remove_dir(&mut self, path: &str) -> Result<()> {
        let resolved = resolve(&*self.device, path).map_err(|_| FsError::NoSuchDirectory)?;
        let child = resolved.child.ok_or(FsError::NoSuchDirectory)?;
        if child == ROOT_INODE_ID {
            return Err(FsError::RootDirectoryProtected);
        }
        remove_entry(&*self.device, InodeKind::Directory, resolved.parent, child)?;
        debug!("removed directory '{path}' (inode {child})");
        Ok(())
    }

    // --- open-file table ---

    /// Opens an existing file and returns its descriptor. The cursor starts
    /// at 0.
    pub fn open(&mut self, path: &str) -> Result<usize> {
        let fd = self
            .open_files
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(FsError::TooManyOpenFiles)?;

        let resolved = resolve(&*self.device, path).map_err(|_| FsError::NoSuchFile)?;
        let child = resolved.child.ok_or(FsError::NoSuchFile)?;
        let inode = read_inode(&*self.device, child)?;
        if inode.kind != InodeKind::File {
            return Err(FsError::TypeMismatch);
        }
        self.open_files[fd] = Some(OpenFile {
            inode: child,
            size: inode.size,
            pos: 0,
        });
        debug!("opened '{path}' (inode {child}) as fd {fd}");
        Ok(fd)
    }

    pub fn close(&mut self, fd: usize) -> Result<()> {
        let slot = self
            .open_files
            .get_mut(fd)
            .ok_or(FsError::BadFileDescriptor)?;
        if slot.take().is_none() {
            return Err(FsError::BadFileDescriptor);
        }
        Ok(())
    }

    fn handle(&self, fd: usize) -> Result<OpenFile> {
        self.open_files
            .get(fd)
            .copied()
            .flatten()
            .ok_or(FsError::BadFileDescriptor)
    }

    fn is_open(&self, inode: u32) -> bool {
        self.open_files
            .iter()
            .flatten()
            .any(|open| open.inode == inode)
    }

    // --- file I/O ---

    /// Reads at most `buf.len()` bytes at the cursor, advancing it by the
    /// amount read. Returns 0 at end-of-file, on every call.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let open = self.handle(fd)?;
        let inode = read_inode(&*self.device, open.inode)?;
        let got = read_at(&*self.device, &inode, open.pos as usize, buf)?;
        self.open_files[fd] = Some(OpenFile {
            pos: open.pos + got as u32,
            ..open
        });
        Ok(got)
    }

    /// Writes all of `data` at the cursor, extending the file as needed,
    /// and advances the cursor. Writing is the only way to grow a file.
    pub fn write(&mut self, fd: usize, data: &[u8]) -> Result<usize> {
        let open = self.handle(fd)?;
        if open.pos as usize + data.len() > MAX_FILE_SIZE {
            return Err(FsError::FileTooBig);
        }
        let mut inode = read_inode(&*self.device, open.inode)?;
        let written = write_at(&*self.device, open.inode, &mut inode, open.pos as usize, data)?;
        self.open_files[fd] = Some(OpenFile {
            inode: open.inode,
            size: inode.size,
            pos: open.pos + written as u32,
        });
        Ok(written)
    }

    /// Moves the cursor. Any offset in `0..=size` is valid; sitting exactly
    /// at end-of-file makes the next read return 0.
    pub fn seek(&mut self, fd: usize, offset: usize) -> Result<()> {
        let open = self.handle(fd)?;
        if offset > open.size as usize {
            return Err(FsError::SeekOutOfBounds);
        }
        self.open_files[fd] = Some(OpenFile {
            pos: offset as u32,
            ..open
        });
        Ok(())
    }

    // --- directory enumeration ---

    /// Byte size of a directory's entry list: slot count times the entry
    /// record size, tombstones included.
    pub fn dir_size(&self, path: &str) -> Result<usize> {
        Ok(self.dir_entries(path)?.byte_size())
    }

    /// Returns every entry slot of the directory verbatim, tombstones
    /// included, in on-disk order. `capacity` is the caller's buffer size
    /// in bytes; it must cover the full entry list.
    pub fn read_dir(&self, path: &str, capacity: usize) -> Result<Vec<DirEntry>> {
        let entries = self.dir_entries(path)?;
        if capacity < entries.byte_size() {
            return Err(FsError::BufferTooSmall);
        }
        entries.read_all()
    }

    fn dir_entries(&self, path: &str) -> Result<DirectoryEntries<'_, D>> {
        let resolved = resolve(&*self.device, path).map_err(|_| FsError::NoSuchDirectory)?;
        let child = resolved.child.ok_or(FsError::NoSuchDirectory)?;
        DirectoryEntries::load(&*self.device, child).map_err(|e| match e {
            FsError::NotADirectory => FsError::NoSuchDirectory,
            other => other,
        })
    }
}

impl FileSystem<MemDisk> {
    /// Boots a volume from a backing file: loads and verifies an existing
    /// image, or formats a fresh one and saves it when the file does not
    /// exist. A backing file with the wrong size or magic fails the boot
    /// instead of half-mounting.
    pub fn boot(backing: impl AsRef<Path>) -> Result<Self> {
        let backing = backing.as_ref();
        if backing.exists() {
            debug!("boot: loading existing image {:?}", backing);
            let disk = MemDisk::load(backing)?;
            Self::mount(Arc::new(disk))
        } else {
            debug!("boot: no image at {:?}, formatting fresh", backing);
            let disk = MemDisk::create(backing);
            let fs = Self::format(Arc::new(disk))?;
            fs.sync()?;
            Ok(fs)
        }
    }
}
