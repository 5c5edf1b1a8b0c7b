//! Quark is a small inode-based file system on top of a fixed-size sector
//! device. One mounted volume, hierarchical directories, flat files with
//! random-access read/write, and a bounded open-file table; no permissions,
//! timestamps, or symlinks.
//!
//! Volume layout, in sector order:
//! - Superblock (magic only)
//! - Inode bitmap
//! - Sector bitmap
//! - Inode table (packed, entries never straddle sectors)
//! - Data sectors
//!
//! There is no write-ahead log and no in-memory shadow of the volume: every
//! operation re-reads what it needs and persists each logical step as one
//! or more independent sector writes, ordered so that no directory entry
//! ever references a freed inode and no inode references an unallocated
//! sector.

mod bitmap;
mod block_dev;
mod config;
mod directory;
mod disk;
mod error;
mod file;
mod fs;
mod inode;
mod layout;
mod path;
mod superblock;

pub use block_dev::BlockDevice;
pub use config::*;
pub use directory::{DIR_ENTRY_SIZE, DirEntry};
pub use disk::MemDisk;
pub use error::FsError as Error;
pub use error::{FsError, Result};
pub use fs::FileSystem;
pub use inode::{Inode, InodeKind};
pub use path::{Resolved, legal_filename, resolve};
pub use superblock::{check_magic, format};
