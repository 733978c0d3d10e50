use tracing::{debug, info};

use crate::consts::{BlockPointer, NULL_POINTER};
use crate::driver::DeviceDriver;
use crate::ops::path;
use crate::ops::FlatFS;
use crate::structure::block_map::BlockMap;
use crate::structure::directory::DirEntry;
use crate::util::error::{FsError, Result};

impl<A: DeviceDriver> FlatFS<A> {
    /// Stores `content` as a new file at `dest_path`.
    ///
    /// Every check (existing path, parent, size, room in the parent
    /// directory, free space) runs before the first block is written, so a
    /// failed import leaves the image as it was.
    pub fn import_file(&mut self, content: &[u8], dest_path: &str) -> Result<()> {
        let Some((parent_path, name)) = path::split_parent(dest_path) else {
            return Err(FsError::PathExists("/".to_string()));
        };
        path::validate_name(dest_path, &name)?;
        match path::find_entry(&self.structure, dest_path) {
            Ok(_) => return Err(FsError::PathExists(dest_path.to_string())),
            Err(FsError::NotFound(_)) => {}
            Err(error) => return Err(error),
        }
        let parent = path::parent_directory(&self.structure, &parent_path)?;

        let config = self.structure.config.clone();
        let size = content.len() as u64;
        let too_large = || FsError::FileTooLarge { size, limit: config.max_file_size() };
        let num_data_blocks = content.len().div_ceil(config.block_size);
        let num_map_blocks = num_data_blocks.div_ceil(config.pointers_per_block());
        if num_map_blocks > config.max_block_map_pointers {
            return Err(too_large());
        }
        let num_blocks = u32::try_from(num_data_blocks).map_err(|_| too_large())?;

        let file_entry = |block_maps: Vec<BlockPointer>| DirEntry::File { name: name.clone(), size, block_maps, num_blocks };
        let mut listing = self.structure.read_directory(parent)?;
        listing.check_insert(&file_entry(vec![NULL_POINTER; num_map_blocks]), parent, &config)?;

        let blocks = self.structure.allocate(num_map_blocks + num_data_blocks)?;
        let (map_blocks, data_blocks) = blocks.split_at(num_map_blocks);
        listing.insert(file_entry(map_blocks.to_vec()), parent, &config)?;

        for (chunk, block) in content.chunks(config.block_size).zip(data_blocks) {
            self.structure.io.write_block(*block, chunk)?;
        }
        for (map, block) in BlockMap::chain(data_blocks, &config).iter().zip(map_blocks) {
            self.structure.io.write_block(*block, &map.encode(&config))?;
        }
        self.structure.write_directory(parent, &listing)?;
        self.structure.persist_superblock()?;
        info!(path = dest_path, size, maps = ?map_blocks, blocks = ?data_blocks, "imported file");

        self.check_usage();
        Ok(())
    }

    pub fn cat(&self, file_path: &str) -> Result<Vec<u8>> {
        let entry = path::find_entry(&self.structure, file_path)?.entry;
        let size = match &entry {
            DirEntry::File { size, .. } => *size,
            DirEntry::Directory { .. } => return Err(FsError::NotAFile(file_path.to_string())),
        };

        let data_blocks = self.structure.data_blocks(&entry)?;
        let mut content = Vec::with_capacity(data_blocks.len() * self.structure.get_block_size());
        for block in &data_blocks {
            content.extend_from_slice(&self.structure.io.read_block(*block)?);
        }
        content.truncate(size as usize);
        debug!(path = file_path, size, blocks = data_blocks.len(), "read file");
        Ok(content)
    }
}
