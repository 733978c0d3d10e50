//! A filesystem stored in a single flat disk image.
//!
//! Block 0 holds the superblock, the root directory lives at block 1 and
//! every other block is a directory block, a block map (one level of indirect
//! data pointers) or raw file data. Free space is never recorded: a block is
//! in use exactly when it can be reached from the root.

pub mod config;
pub mod consts;
pub mod driver;
pub mod fuse;
pub mod io;
pub mod ops;
pub mod structure;
pub mod util;

pub use config::{FsConfig, SyncPolicy};
pub use consts::BlockPointer;
pub use driver::file_drive::FileDrive;
pub use driver::memory_drive::MemoryDrive;
pub use driver::DeviceDriver;
pub use ops::{EntryKind, EntrySummary, FlatFS};
pub use structure::allocator::UsageReport;
pub use util::error::{FsError, Result};
