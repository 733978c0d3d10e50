use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::config::FsConfig;
use crate::consts::BlockPointer;
use crate::driver::file_drive::FileDrive;
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::allocator::UsageReport;
use crate::structure::directory::DirEntry;
use crate::structure::Structure;
use crate::util::error::Result;

mod directory;
mod file;
pub mod path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// What a listing shows about one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub block_maps: Vec<BlockPointer>,
    /// The directory block for directories, the data blocks for files.
    pub blocks: Vec<BlockPointer>,
}

/// A filesystem living inside a block device.
pub struct FlatFS<A: DeviceDriver> {
    structure: Structure<A>,
}

impl FlatFS<FileDrive> {
    /// Opens the disk image at `path`, creating and formatting it if needed.
    pub fn open(path: impl AsRef<Path>, config: FsConfig) -> Result<FlatFS<FileDrive>> {
        let io = IO::init(path, &config)?;
        FlatFS::mount(io, config)
    }
}

impl<A: DeviceDriver> FlatFS<A> {
    pub fn new(device: A, config: FsConfig) -> Result<FlatFS<A>> {
        let io = IO::new(device, &config)?;
        FlatFS::mount(io, config)
    }

    fn mount(io: IO<A>, config: FsConfig) -> Result<FlatFS<A>> {
        let structure = Structure::mount(io, config)?;
        Ok(FlatFS { structure })
    }

    pub fn config(&self) -> &FsConfig {
        &self.structure.config
    }

    pub fn root_block(&self) -> BlockPointer {
        self.structure.root()
    }

    pub fn get_block_size(&self) -> usize {
        self.structure.get_block_size()
    }

    pub fn stat(&self, path: &str) -> Result<EntrySummary> {
        let resolved = path::find_entry(&self.structure, path)?;
        self.summarize(&resolved.entry)
    }

    /// Every block reachable from the root, ascending.
    pub fn used_blocks(&self) -> Result<Vec<BlockPointer>> {
        Ok(self.structure.used_blocks()?.used_blocks())
    }

    pub fn usage(&self) -> Result<UsageReport> {
        self.structure.usage()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.structure.io.sync()
    }

    pub fn into_device(self) -> A {
        self.structure.io.into_device()
    }

    /// Runs the fragmentation check after a write. The write already happened,
    /// so a failing scan is only logged.
    fn check_usage(&self) {
        if let Err(error) = self.structure.usage() {
            warn!(%error, "usage scan after write failed");
        }
    }

    fn summarize(&self, entry: &DirEntry) -> Result<EntrySummary> {
        let summary = match entry {
            DirEntry::Directory { name, dir_block_id } => EntrySummary {
                name: name.clone(),
                kind: EntryKind::Directory,
                size: 0,
                block_maps: Vec::new(),
                blocks: vec![*dir_block_id],
            },
            DirEntry::File { name, size, block_maps, .. } => EntrySummary {
                name: name.clone(),
                kind: EntryKind::File,
                size: *size,
                block_maps: block_maps.clone(),
                blocks: self.structure.data_blocks(entry)?,
            },
        };
        Ok(summary)
    }
}
