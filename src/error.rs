use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("path is not a valid absolute path")]
    InvalidPath,
    #[error("file or directory already exists")]
    AlreadyExists,
    #[error("no such file")]
    NoSuchFile,
    #[error("no such directory")]
    NoSuchDirectory,
    #[error("not a directory")]
    NotADirectory,
    #[error("inode kind does not match the requested operation")]
    TypeMismatch,
    #[error("directory is not empty")]
    DirectoryNotEmpty,
    #[error("the root directory cannot be removed")]
    RootDirectoryProtected,
    #[error("file is currently open")]
    FileInUse,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("bad file descriptor")]
    BadFileDescriptor,
    #[error("seek offset out of bounds")]
    SeekOutOfBounds,
    #[error("buffer too small for directory contents")]
    BufferTooSmall,
    #[error("write would exceed the maximum file size")]
    FileTooBig,
    #[error("no free data sectors left")]
    NoSpace,
    #[error("inode table is full")]
    InodeTableFull,
    #[error("no free sector for a new directory entry block")]
    DiskFull,
    #[error("superblock magic mismatch")]
    BadMagic,
    #[error("backing image has the wrong size")]
    BadImageSize,
    #[error("device I/O failure")]
    Io,
}

pub type Result<T> = core::result::Result<T, FsError>;
