use tracing::warn;

use crate::config::FsConfig;
use crate::consts::{BlockPointer, MAX_NAME_LENGTH, SUPERBLOCK_ID};
use crate::util::error::{FsError, Result};
use crate::util::serializable::{write_pointer, ByteSerializable, Reader};

const DIRECTORY_TAG: u8 = 1;
const FILE_TAG: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    Directory {
        name: String,
        dir_block_id: BlockPointer,
    },
    File {
        name: String,
        size: u64,
        block_maps: Vec<BlockPointer>,
        num_blocks: u32,
    },
}

impl DirEntry {
    pub fn name(&self) -> &str {
        match self {
            DirEntry::Directory { name, .. } | DirEntry::File { name, .. } => name,
        }
    }

    fn referenced_blocks(&self) -> Vec<BlockPointer> {
        match self {
            DirEntry::Directory { dir_block_id, .. } => vec![*dir_block_id],
            DirEntry::File { block_maps, .. } => block_maps.clone(),
        }
    }
}

impl ByteSerializable for DirEntry {
    fn to_bytes(&self, config: &FsConfig) -> Result<Vec<u8>> {
        let name = self.name().as_bytes();
        let too_large = |size: usize| FsError::EntryTooLarge {
            name: self.name().to_string(),
            size,
            limit: config.dir_entry_size,
        };
        if name.len() > MAX_NAME_LENGTH {
            return Err(too_large(2 + name.len()));
        }

        let mut buffer = Vec::new();
        match self {
            DirEntry::Directory { dir_block_id, .. } => {
                buffer.push(DIRECTORY_TAG);
                buffer.push(name.len() as u8);
                buffer.extend_from_slice(name);
                write_pointer(&mut buffer, *dir_block_id, config.pointer_size);
            }
            DirEntry::File { size, block_maps, num_blocks, .. } => {
                if block_maps.len() > u8::MAX as usize {
                    return Err(too_large(usize::MAX));
                }
                buffer.push(FILE_TAG);
                buffer.push(name.len() as u8);
                buffer.extend_from_slice(name);
                buffer.extend_from_slice(&size.to_le_bytes());
                buffer.extend_from_slice(&num_blocks.to_le_bytes());
                buffer.push(block_maps.len() as u8);
                for map in block_maps {
                    write_pointer(&mut buffer, *map, config.pointer_size);
                }
            }
        }

        if buffer.len() > config.dir_entry_size {
            return Err(too_large(buffer.len()));
        }
        Ok(buffer)
    }

    fn from_bytes(bytes: &[u8], config: &FsConfig) -> Option<DirEntry> {
        let mut reader = Reader::new(bytes);
        let tag = reader.u8()?;
        let name_length = reader.u8()? as usize;
        let name = std::str::from_utf8(reader.take(name_length)?).ok()?;
        if name.is_empty() || name.contains('/') {
            return None;
        }

        let entry = match tag {
            DIRECTORY_TAG => DirEntry::Directory {
                name: name.to_string(),
                dir_block_id: reader.pointer(config.pointer_size)?,
            },
            FILE_TAG => {
                let size = reader.u64()?;
                let num_blocks = reader.u32()?;
                let map_count = reader.u8()? as usize;
                let block_maps = (0..map_count)
                    .map(|_| reader.pointer(config.pointer_size))
                    .collect::<Option<Vec<_>>>()?;
                DirEntry::File { name: name.to_string(), size, block_maps, num_blocks }
            }
            _ => return None,
        };

        let in_range = entry
            .referenced_blocks()
            .iter()
            .all(|block| *block != SUPERBLOCK_ID && config.contains(*block));
        in_range.then_some(entry)
    }
}

/// The decoded contents of one directory block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryBlock {
    pub entries: Vec<DirEntry>,
}

impl DirectoryBlock {
    pub fn empty() -> DirectoryBlock {
        DirectoryBlock { entries: Vec::new() }
    }

    /// Decodes every slot of `block`. Slots that are all zero are empty;
    /// slots that fail to parse are skipped so one damaged entry does not
    /// take the rest of the directory with it.
    pub fn decode_lenient(block: &[u8], config: &FsConfig) -> DirectoryBlock {
        let mut entries = Vec::new();
        for (slot, bytes) in block.chunks(config.dir_entry_size).take(config.max_dir_entries()).enumerate() {
            if bytes.iter().all(|b| *b == 0) {
                continue;
            }
            match DirEntry::from_bytes(bytes, config) {
                Some(entry) => entries.push(entry),
                None => warn!(slot, "skipping unreadable directory slot"),
            }
        }
        DirectoryBlock { entries }
    }

    pub fn encode(&self, config: &FsConfig) -> Result<Vec<u8>> {
        let mut block = Vec::with_capacity(config.block_size);
        for entry in &self.entries {
            let mut slot = entry.to_bytes(config)?;
            slot.resize(config.dir_entry_size, 0);
            block.extend_from_slice(&slot);
        }
        block.resize(config.block_size, 0);
        Ok(block)
    }

    pub fn find(&self, name: &str) -> Option<&DirEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Fails the way `insert` would, without changing the block. The encoded
    /// size of an entry does not depend on pointer values, so placeholder
    /// pointers give the same answer as the real ones.
    pub fn check_insert(&self, entry: &DirEntry, block: BlockPointer, config: &FsConfig) -> Result<()> {
        if self.find(entry.name()).is_some() {
            return Err(FsError::EntryExists(entry.name().to_string()));
        }
        if self.entries.len() >= config.max_dir_entries() {
            return Err(FsError::DirectoryFull { block, capacity: config.max_dir_entries() });
        }
        entry.to_bytes(config)?;
        Ok(())
    }

    pub fn insert(&mut self, entry: DirEntry, block: BlockPointer, config: &FsConfig) -> Result<()> {
        self.check_insert(&entry, block, config)?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<DirEntry> {
        let index = self.entries.iter().position(|entry| entry.name() == name)?;
        Some(self.entries.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
