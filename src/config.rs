pub const MAGIC: u32 = 0x5155_524B; // "QURK"

/// Size of one device sector in bytes.
pub const SECTOR_SIZE: usize = 512;
/// Total number of sectors on the volume.
pub const TOTAL_SECTORS: usize = 2048;
/// Maximum number of files and directories (inode table entries).
pub const MAX_FILES: usize = 64;
/// Direct data sectors per inode; bounds the maximum file size.
pub const MAX_SECTORS_PER_FILE: usize = 16;

pub const MAX_FILE_SIZE: usize = MAX_SECTORS_PER_FILE * SECTOR_SIZE;

/// Maximum file name length, including the trailing NUL.
pub const MAX_NAME: usize = 16;
pub const MAX_PATH: usize = 256;
pub const MAX_OPEN_FILES: usize = 256;

pub const SUPERBLOCK_SECTOR: u32 = 0;
pub const ROOT_INODE_ID: u32 = 0;
