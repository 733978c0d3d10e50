use std::path::Path;

use tracing::trace;

use crate::config::{FsConfig, SyncPolicy};
use crate::consts::BlockPointer;
use crate::driver::file_drive::FileDrive;
use crate::driver::DeviceDriver;
use crate::util::error::{FsError, Result};

/// Fixed-size block access on top of a device.
pub struct IO<A: DeviceDriver> {
    device: A,
    block_size: usize,
    block_count: u64,
    sync_policy: SyncPolicy,
}

impl IO<FileDrive> {
    /// Opens the image at `path`, zero-filling a new one of the configured size.
    pub fn init(path: impl AsRef<Path>, config: &FsConfig) -> Result<IO<FileDrive>> {
        config.validate()?;
        let drive = FileDrive::open_or_create(path, config.image_size())?;
        IO::new(drive, config)
    }
}

impl<A: DeviceDriver> IO<A> {
    pub fn new(device: A, config: &FsConfig) -> Result<IO<A>> {
        config.validate()?;
        let needed = config.image_size();
        if device.get_size() < needed {
            return Err(FsError::ImageTooSmall { expected: needed, actual: device.get_size() });
        }

        Ok(IO {
            device,
            block_size: config.block_size,
            block_count: config.num_blocks,
            sync_policy: config.sync_policy,
        })
    }

    pub fn get_block_size(&self) -> usize {
        self.block_size
    }

    pub fn get_block_count(&self) -> u64 {
        self.block_count
    }

    pub fn into_device(self) -> A {
        self.device
    }

    /// Writes `data` to block `index`, zero-padding it to the block size.
    pub fn write_block(&mut self, index: BlockPointer, data: &[u8]) -> Result<()> {
        self.check_range(index)?;
        if data.len() > self.block_size {
            return Err(FsError::DataTooLarge { len: data.len(), block_size: self.block_size });
        }

        let mut block = data.to_vec();
        block.resize(self.block_size, 0);

        trace!(block = index, len = data.len(), "write block");
        self.device.write_at(self.offset(index), &block)?;
        if self.sync_policy == SyncPolicy::EveryWrite {
            self.device.sync()?;
        }
        Ok(())
    }

    pub fn read_block(&self, index: BlockPointer) -> Result<Vec<u8>> {
        self.check_range(index)?;

        let mut block = vec![0; self.block_size];
        self.device.read_at(self.offset(index), &mut block)?;
        trace!(block = index, "read block");
        Ok(block)
    }

    pub fn sync(&mut self) -> Result<()> {
        self.device.sync()?;
        Ok(())
    }

    fn check_range(&self, index: BlockPointer) -> Result<()> {
        if index >= self.block_count {
            return Err(FsError::OutOfRange { block: index, count: self.block_count });
        }
        Ok(())
    }

    fn offset(&self, index: BlockPointer) -> u64 {
        index * self.block_size as u64
    }
}
