use std::os::raw::c_int;
use thiserror::Error;

use crate::consts::BlockPointer;

type ErrorNum = c_int;

pub type Result<T> = std::result::Result<T, FsError>;

/// Everything a filesystem call can fail with.
///
/// Domain outcomes are expected and leave the image untouched. The remaining
/// variants are infrastructure failures: a bad block id, an oversized write or
/// a broken image file mean the caller or the configuration is wrong.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("path already exists: {0}")]
    PathExists(String),
    #[error("parent directory does not exist: {0}")]
    ParentNotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("directory block {block} is full ({capacity} entries)")]
    DirectoryFull { block: BlockPointer, capacity: usize },
    #[error("an entry named '{0}' already exists")]
    EntryExists(String),
    #[error("entry '{name}' needs {size} bytes but a directory slot holds {limit}")]
    EntryTooLarge { name: String, size: usize, limit: usize },
    #[error("disk full: requested {requested} blocks, only {available} available")]
    DiskFull { requested: usize, available: usize },
    #[error("file of {size} bytes exceeds the maximum of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("directory not empty: {0}")]
    NotEmpty(String),
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("block {block} is out of range (block count {count})")]
    OutOfRange { block: BlockPointer, count: u64 },
    #[error("{len} bytes do not fit in a {block_size} byte block")]
    DataTooLarge { len: usize, block_size: usize },
    #[error("image holds {actual} bytes but the configuration needs {expected}")]
    ImageTooSmall { expected: u64, actual: u64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// True for the expected outcomes of a well-formed request.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            FsError::OutOfRange { .. }
                | FsError::DataTooLarge { .. }
                | FsError::ImageTooSmall { .. }
                | FsError::InvalidConfig(_)
                | FsError::Io(_)
        )
    }

    pub fn errno(&self) -> ErrorNum {
        match self {
            FsError::NotFound(_) | FsError::ParentNotFound(_) => libc::ENOENT,
            FsError::PathExists(_) | FsError::EntryExists(_) => libc::EEXIST,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::NotAFile(_) => libc::EISDIR,
            FsError::DirectoryFull { .. } | FsError::DiskFull { .. } => libc::ENOSPC,
            FsError::EntryTooLarge { .. } => libc::ENAMETOOLONG,
            FsError::FileTooLarge { .. } => libc::EFBIG,
            FsError::NotEmpty(_) => libc::ENOTEMPTY,
            FsError::InvalidPath { .. } | FsError::InvalidConfig(_) => libc::EINVAL,
            FsError::OutOfRange { .. }
            | FsError::DataTooLarge { .. }
            | FsError::ImageTooSmall { .. } => libc::EIO,
            FsError::Io(error) => error.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}
