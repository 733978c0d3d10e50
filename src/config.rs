use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    BlockPointer, DEFAULT_BLOCK_SIZE, DEFAULT_DEFRAG_THRESHOLD, DEFAULT_DIR_ENTRY_SIZE,
    DEFAULT_MAX_BLOCK_MAP_POINTERS, DEFAULT_NUM_BLOCKS, DEFAULT_POINTER_SIZE, MIN_DIR_ENTRY_HEADER,
    SUPERBLOCK_LEN,
};
use crate::util::error::{FsError, Result};

/// When block writes reach stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Leave flushing to the OS; `FlatFS::sync` forces it.
    #[default]
    Buffered,
    /// fsync after every block write.
    EveryWrite,
}

/// Disk geometry and tunables, fixed for the lifetime of a mounted image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub block_size: usize,
    pub num_blocks: u64,
    pub pointer_size: usize,
    pub max_block_map_pointers: usize,
    pub defrag_threshold: f64,
    pub dir_entry_size: usize,
    pub sync_policy: SyncPolicy,
}

impl Default for FsConfig {
    fn default() -> Self {
        FsConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            num_blocks: DEFAULT_NUM_BLOCKS,
            pointer_size: DEFAULT_POINTER_SIZE,
            max_block_map_pointers: DEFAULT_MAX_BLOCK_MAP_POINTERS,
            defrag_threshold: DEFAULT_DEFRAG_THRESHOLD,
            dir_entry_size: DEFAULT_DIR_ENTRY_SIZE,
            sync_policy: SyncPolicy::Buffered,
        }
    }
}

impl FsConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<FsConfig> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: FsConfig = serde_json::from_str(&text)
            .map_err(|e| FsError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(FsError::InvalidConfig(message));

        if self.block_size == 0 || self.dir_entry_size == 0 {
            return invalid("block_size and dir_entry_size must be non-zero".into());
        }
        if !(1..=8).contains(&self.pointer_size) {
            return invalid(format!("pointer_size must be 1..=8 bytes, got {}", self.pointer_size));
        }
        if self.block_size < SUPERBLOCK_LEN {
            return invalid(format!(
                "block_size {} cannot hold the {} byte superblock",
                self.block_size, SUPERBLOCK_LEN
            ));
        }
        if self.dir_entry_size < MIN_DIR_ENTRY_HEADER + self.pointer_size {
            return invalid(format!(
                "dir_entry_size {} cannot hold a directory entry, need at least {}",
                self.dir_entry_size,
                MIN_DIR_ENTRY_HEADER + self.pointer_size
            ));
        }
        if self.block_size % self.pointer_size != 0 {
            return invalid(format!(
                "block_size {} is not a multiple of pointer_size {}",
                self.block_size, self.pointer_size
            ));
        }
        if self.block_size % self.dir_entry_size != 0 {
            return invalid(format!(
                "block_size {} is not a multiple of dir_entry_size {}",
                self.block_size, self.dir_entry_size
            ));
        }
        if self.num_blocks < 3 {
            return invalid(format!("need at least 3 blocks, got {}", self.num_blocks));
        }
        if self.num_blocks.checked_mul(self.block_size as u64).is_none() {
            return invalid(format!(
                "{} blocks of {} bytes overflow the image size",
                self.num_blocks, self.block_size
            ));
        }
        if self.pointer_size < 8 && self.num_blocks > 1u64 << (self.pointer_size * 8) {
            return invalid(format!(
                "{} blocks cannot be addressed with {} byte pointers",
                self.num_blocks, self.pointer_size
            ));
        }
        if self.max_block_map_pointers == 0 {
            return invalid("max_block_map_pointers must be at least 1".into());
        }
        if !(self.defrag_threshold > 0.0 && self.defrag_threshold <= 1.0) {
            return invalid(format!("defrag_threshold must be in (0, 1], got {}", self.defrag_threshold));
        }
        Ok(())
    }

    #[inline]
    pub fn pointers_per_block(&self) -> usize {
        self.block_size / self.pointer_size
    }

    #[inline]
    pub fn max_dir_entries(&self) -> usize {
        self.block_size / self.dir_entry_size
    }

    pub fn max_file_size(&self) -> u64 {
        (self.max_block_map_pointers * self.pointers_per_block()) as u64 * self.block_size as u64
    }

    pub fn image_size(&self) -> u64 {
        self.num_blocks * self.block_size as u64
    }

    pub(crate) fn contains(&self, block: BlockPointer) -> bool {
        block < self.num_blocks
    }
}
