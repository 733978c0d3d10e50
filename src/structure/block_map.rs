use crate::config::FsConfig;
use crate::consts::{BlockPointer, NULL_POINTER};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::directory::DirEntry;
use crate::util::error::Result;
use crate::util::serializable::{read_pointer, write_pointer};

/// One indirect block: up to `pointers_per_block` data block pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMap {
    pub pointers: Vec<BlockPointer>,
}

impl BlockMap {
    /// Splits `data_blocks` over as many maps as needed, filling each one
    /// before moving on to the next.
    pub fn chain(data_blocks: &[BlockPointer], config: &FsConfig) -> Vec<BlockMap> {
        data_blocks
            .chunks(config.pointers_per_block())
            .map(|chunk| BlockMap { pointers: chunk.to_vec() })
            .collect()
    }

    pub fn encode(&self, config: &FsConfig) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(config.block_size);
        for pointer in self.pointers.iter().take(config.pointers_per_block()) {
            write_pointer(&mut buffer, *pointer, config.pointer_size);
        }
        buffer
    }

    /// Reads pointers up to the first empty slot.
    pub fn decode(block: &[u8], config: &FsConfig) -> BlockMap {
        let pointers = block
            .chunks_exact(config.pointer_size)
            .take(config.pointers_per_block())
            .filter_map(|raw| read_pointer(raw, config.pointer_size))
            .take_while(|pointer| *pointer != NULL_POINTER)
            .collect();
        BlockMap { pointers }
    }
}

/// Resolves the data blocks of a file entry through its block maps, in order.
/// Stops after `num_blocks` pointers or at the first empty slot.
pub fn get_data_blocks<A: DeviceDriver>(
    io: &IO<A>,
    entry: &DirEntry,
    config: &FsConfig,
) -> Result<Vec<BlockPointer>> {
    let DirEntry::File { block_maps, num_blocks, .. } = entry else {
        return Ok(Vec::new());
    };
    let wanted = *num_blocks as usize;

    let mut data_blocks = Vec::with_capacity(wanted);
    for map_block in block_maps {
        if data_blocks.len() >= wanted {
            break;
        }
        let map = BlockMap::decode(&io.read_block(*map_block)?, config);
        let full = map.pointers.len() == config.pointers_per_block();
        for pointer in map.pointers {
            if data_blocks.len() >= wanted {
                break;
            }
            data_blocks.push(pointer);
        }
        if !full {
            break;
        }
    }
    Ok(data_blocks)
}
