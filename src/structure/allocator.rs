use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FsConfig;
use crate::consts::{BlockPointer, FIRST_ALLOCATABLE_BLOCK, SUPERBLOCK_ID};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::block_map::get_data_blocks;
use crate::structure::directory::{DirEntry, DirectoryBlock};
use crate::util::error::{FsError, Result};

/// Liveness of every block on the disk, one bit per block.
///
/// Never persisted: it is rebuilt from the directory tree whenever needed.
pub struct UsageMap {
    block_count: u64,
    data: Vec<u8>,
}

impl UsageMap {
    pub fn new(block_count: u64) -> UsageMap {
        UsageMap { block_count, data: vec![0; (block_count as usize).div_ceil(8)] }
    }

    pub fn is_free(&self, index: BlockPointer) -> bool {
        self.data[(index / 8) as usize] & (1 << (index % 8)) == 0
    }

    pub fn is_used(&self, index: BlockPointer) -> bool {
        !self.is_free(index)
    }

    fn mark_used(&mut self, index: BlockPointer) {
        if index < self.block_count {
            self.data[(index / 8) as usize] |= 1 << (index % 8);
        } else {
            warn!(block = index, "reference past the end of the disk ignored");
        }
    }

    pub fn used_count(&self) -> u64 {
        self.data.iter().map(|byte| byte.count_ones() as u64).sum()
    }

    pub fn used_blocks(&self) -> Vec<BlockPointer> {
        (0..self.block_count).filter(|index| self.is_used(*index)).collect()
    }
}

/// Marks every block reachable from the root directory.
pub fn compute_used_blocks<A: DeviceDriver>(
    io: &IO<A>,
    root: BlockPointer,
    config: &FsConfig,
) -> Result<UsageMap> {
    let mut usage = UsageMap::new(config.num_blocks);
    usage.mark_used(SUPERBLOCK_ID);

    let mut visited = HashSet::new();
    let mut pending = vec![root];
    while let Some(directory) = pending.pop() {
        if !visited.insert(directory) {
            warn!(block = directory, "directory reached twice, not descending again");
            continue;
        }
        usage.mark_used(directory);

        let block = DirectoryBlock::decode_lenient(&io.read_block(directory)?, config);
        for entry in &block.entries {
            match entry {
                DirEntry::Directory { dir_block_id, .. } => pending.push(*dir_block_id),
                DirEntry::File { block_maps, .. } => {
                    for map in block_maps {
                        usage.mark_used(*map);
                    }
                    for data in get_data_blocks(io, entry, config)? {
                        usage.mark_used(data);
                    }
                }
            }
        }
    }
    Ok(usage)
}

/// Lowest-numbered free blocks first. Blocks 0 and 1 are never handed out.
pub fn get_free_blocks<A: DeviceDriver>(
    io: &IO<A>,
    root: BlockPointer,
    count: usize,
    config: &FsConfig,
) -> Result<Vec<BlockPointer>> {
    let usage = compute_used_blocks(io, root, config)?;

    let free: Vec<BlockPointer> = (FIRST_ALLOCATABLE_BLOCK..config.num_blocks)
        .filter(|index| usage.is_free(*index))
        .take(count)
        .collect();
    if free.len() < count {
        return Err(FsError::DiskFull { requested: count, available: free.len() });
    }

    debug!(count, blocks = ?free, "allocated blocks");
    Ok(free)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub used: u64,
    pub free: u64,
    pub total: u64,
    pub ratio: f64,
    pub over_threshold: bool,
}

/// Reports disk usage and warns once it crosses the defrag threshold.
pub fn fragmentation_check<A: DeviceDriver>(
    io: &IO<A>,
    root: BlockPointer,
    config: &FsConfig,
) -> Result<UsageReport> {
    let used = compute_used_blocks(io, root, config)?.used_count();
    let total = config.num_blocks;
    let ratio = used as f64 / total as f64;
    let over_threshold = ratio > config.defrag_threshold;
    if over_threshold {
        warn!(
            used,
            total,
            ratio,
            threshold = config.defrag_threshold,
            "disk usage above defragmentation threshold"
        );
    }
    Ok(UsageReport { used, free: total - used, total, ratio, over_threshold })
}
