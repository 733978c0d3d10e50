use crate::config::FsConfig;
use crate::consts::BlockPointer;
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::allocator::{UsageMap, UsageReport};
use crate::structure::directory::{DirEntry, DirectoryBlock};
use crate::structure::superblock::SuperBlock;
use crate::util::error::Result;

pub mod allocator;
pub mod block_map;
pub mod directory;
pub mod superblock;

/// The on-disk layout of a mounted image.
pub struct Structure<A: DeviceDriver> {
    pub(crate) io: IO<A>,
    pub(crate) superblock: SuperBlock,
    pub(crate) config: FsConfig,
}

impl<A: DeviceDriver> Structure<A> {
    pub fn mount(mut io: IO<A>, config: FsConfig) -> Result<Structure<A>> {
        let superblock = SuperBlock::load_or_format(&mut io, &config)?;
        Ok(Structure { io, superblock, config })
    }

    pub fn root(&self) -> BlockPointer {
        self.superblock.root_dir_block_id
    }

    pub fn get_block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn read_directory(&self, block: BlockPointer) -> Result<DirectoryBlock> {
        Ok(DirectoryBlock::decode_lenient(&self.io.read_block(block)?, &self.config))
    }

    pub fn write_directory(&mut self, block: BlockPointer, directory: &DirectoryBlock) -> Result<()> {
        let bytes = directory.encode(&self.config)?;
        self.io.write_block(block, &bytes)
    }

    pub fn persist_superblock(&mut self) -> Result<()> {
        self.superblock.write(&mut self.io, &self.config)
    }

    pub fn used_blocks(&self) -> Result<UsageMap> {
        allocator::compute_used_blocks(&self.io, self.root(), &self.config)
    }

    pub fn allocate(&self, count: usize) -> Result<Vec<BlockPointer>> {
        allocator::get_free_blocks(&self.io, self.root(), count, &self.config)
    }

    pub fn usage(&self) -> Result<UsageReport> {
        allocator::fragmentation_check(&self.io, self.root(), &self.config)
    }

    pub fn data_blocks(&self, entry: &DirEntry) -> Result<Vec<BlockPointer>> {
        block_map::get_data_blocks(&self.io, entry, &self.config)
    }
}
