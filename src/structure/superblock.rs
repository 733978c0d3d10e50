use tracing::{info, warn};

use crate::config::FsConfig;
use crate::consts::{BlockPointer, DEFAULT_ROOT_BLOCK, SUPERBLOCK_ID};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::directory::DirectoryBlock;
use crate::util::error::Result;
use crate::util::serializable::{ByteSerializable, Reader};

const MAGIC: u32 = 0x464c_4653;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SuperBlock {
    pub magic: u32,
    pub root_dir_block_id: BlockPointer,
}

impl SuperBlock {
    pub fn new(root_dir_block_id: BlockPointer) -> SuperBlock {
        SuperBlock { magic: MAGIC, root_dir_block_id }
    }

    pub fn read<A: DeviceDriver>(io: &IO<A>, config: &FsConfig) -> Result<Option<SuperBlock>> {
        let buffer = io.read_block(SUPERBLOCK_ID)?;
        Ok(SuperBlock::from_bytes(&buffer, config))
    }

    pub fn write<A: DeviceDriver>(&self, io: &mut IO<A>, config: &FsConfig) -> Result<()> {
        io.write_block(SUPERBLOCK_ID, &self.to_bytes(config)?)
    }

    /// Mount policy: a superblock that is missing or does not decode means the
    /// image is unformatted. The root directory is (re)created empty at block 1
    /// and a fresh superblock pointing at it is written.
    pub fn load_or_format<A: DeviceDriver>(io: &mut IO<A>, config: &FsConfig) -> Result<SuperBlock> {
        if let Some(superblock) = SuperBlock::read(io, config)? {
            return Ok(superblock);
        }

        if io.read_block(SUPERBLOCK_ID)?.iter().any(|b| *b != 0) {
            warn!("superblock is corrupt, reformatting the image");
        } else {
            info!("formatting empty image");
        }

        io.write_block(DEFAULT_ROOT_BLOCK, &DirectoryBlock::empty().encode(config)?)?;
        let superblock = SuperBlock::new(DEFAULT_ROOT_BLOCK);
        superblock.write(io, config)?;
        Ok(superblock)
    }
}

impl ByteSerializable for SuperBlock {
    fn to_bytes(&self, _config: &FsConfig) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&self.magic.to_le_bytes());
        buffer.extend_from_slice(&self.root_dir_block_id.to_le_bytes());
        Ok(buffer)
    }

    fn from_bytes(bytes: &[u8], config: &FsConfig) -> Option<SuperBlock> {
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let mut reader = Reader::new(&bytes[..end]);

        let magic = reader.u32()?;
        if magic != MAGIC {
            return None;
        }

        // trailing zero bytes of the root id were stripped along with the padding
        let mut root = [0u8; 8];
        let remainder = reader.take(end.saturating_sub(4).min(8))?;
        root[..remainder.len()].copy_from_slice(remainder);
        let root_dir_block_id = BlockPointer::from_le_bytes(root);

        if root_dir_block_id == SUPERBLOCK_ID || !config.contains(root_dir_block_id) {
            return None;
        }
        Some(SuperBlock { magic, root_dir_block_id })
    }
}
