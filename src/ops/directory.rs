use tracing::debug;

use crate::consts::NULL_POINTER;
use crate::driver::DeviceDriver;
use crate::ops::path::{self, ResolvedEntry};
use crate::ops::{EntrySummary, FlatFS};
use crate::structure::directory::{DirEntry, DirectoryBlock};
use crate::util::error::{FsError, Result};

impl<A: DeviceDriver> FlatFS<A> {
    pub fn mkdir(&mut self, dir_path: &str) -> Result<()> {
        let Some((parent_path, name)) = path::split_parent(dir_path) else {
            return Err(FsError::PathExists("/".to_string()));
        };
        path::validate_name(dir_path, &name)?;
        match path::find_entry(&self.structure, dir_path) {
            Ok(_) => return Err(FsError::PathExists(dir_path.to_string())),
            Err(FsError::NotFound(_)) => {}
            Err(error) => return Err(error),
        }

        let parent = path::parent_directory(&self.structure, &parent_path)?;
        let mut listing = self.structure.read_directory(parent)?;
        let placeholder = DirEntry::Directory { name: name.clone(), dir_block_id: NULL_POINTER };
        listing.check_insert(&placeholder, parent, &self.structure.config)?;
        let block = self.structure.allocate(1)?[0];
        listing.insert(DirEntry::Directory { name, dir_block_id: block }, parent, &self.structure.config)?;

        self.structure.write_directory(block, &DirectoryBlock::empty())?;
        self.structure.write_directory(parent, &listing)?;
        self.structure.persist_superblock()?;
        debug!(path = dir_path, block, "created directory");

        self.check_usage();
        Ok(())
    }

    pub fn ls(&self, dir_path: &str) -> Result<Vec<EntrySummary>> {
        let block = match path::find_entry(&self.structure, dir_path)?.entry {
            DirEntry::Directory { dir_block_id, .. } => dir_block_id,
            DirEntry::File { .. } => return Err(FsError::NotADirectory(dir_path.to_string())),
        };

        self.structure
            .read_directory(block)?
            .entries
            .iter()
            .map(|entry| self.summarize(entry))
            .collect()
    }

    /// Unlinks a file or an empty directory. Its blocks are not touched; they
    /// become free because nothing reaches them anymore.
    pub fn rm(&mut self, target: &str) -> Result<()> {
        let ResolvedEntry { entry, parent } = path::find_entry(&self.structure, target)?;
        let Some(parent) = parent else {
            return Err(FsError::InvalidPath { path: target.to_string(), reason: "the root directory cannot be removed" });
        };

        if let DirEntry::Directory { dir_block_id, .. } = &entry {
            if !self.structure.read_directory(*dir_block_id)?.is_empty() {
                return Err(FsError::NotEmpty(target.to_string()));
            }
        }

        let mut listing = self.structure.read_directory(parent)?;
        listing.remove(entry.name());
        self.structure.write_directory(parent, &listing)?;
        self.structure.persist_superblock()?;
        debug!(path = target, parent, "removed entry");

        self.check_usage();
        Ok(())
    }
}
