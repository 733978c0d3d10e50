use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

use tracing::{info, warn};

use crate::driver::DeviceDriver;
use crate::util::error::{FsError, Result};

/// A disk image stored as one flat host file.
pub struct FileDrive {
    file: File,
    bytes: u64,
}

impl FileDrive {
    /// Opens the image at `path`, creating it zero-filled with `bytes` bytes
    /// when it does not exist yet.
    pub fn open_or_create(path: impl AsRef<Path>, bytes: u64) -> Result<FileDrive> {
        let path = path.as_ref();
        if path.exists() {
            return FileDrive::open(path, bytes);
        }

        info!(path = %path.display(), bytes, "initializing new disk image");
        let file = OpenOptions::new().read(true).write(true).create_new(true).open(path)?;
        file.set_len(bytes)?;
        Ok(FileDrive { file, bytes })
    }

    pub fn open(path: impl AsRef<Path>, bytes: u64) -> Result<FileDrive> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let actual = file.metadata()?.len();
        if actual < bytes {
            return Err(FsError::ImageTooSmall { expected: bytes, actual });
        }
        if actual > bytes {
            warn!(path = %path.display(), actual, expected = bytes, "image is larger than configured, tail is ignored");
        }
        Ok(FileDrive { file, bytes })
    }
}

impl DeviceDriver for FileDrive {
    fn get_size(&self) -> u64 {
        self.bytes
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(buffer, offset)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.write_all_at(data, offset)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::FileDrive;
    use crate::driver::DeviceDriver;
    use crate::util::error::FsError;

    #[test]
    fn creates_zero_filled_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let drive = FileDrive::open_or_create(&path, 1024 * 512).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024 * 512);
        let mut buffer = vec![0xff; 512];
        drive.read_at(1023 * 512, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0; 512]);
    }

    #[test]
    fn reopen_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        {
            let mut drive = FileDrive::open_or_create(&path, 4096).unwrap();
            drive.write_at(512, &[0x42; 8]).unwrap();
            drive.sync().unwrap();
        }

        let drive = FileDrive::open_or_create(&path, 4096).unwrap();
        let mut buffer = vec![0; 8];
        drive.read_at(512, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0x42; 8]);
    }

    #[test]
    fn rejects_short_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.img");
        std::fs::write(&path, vec![0; 100]).unwrap();

        let result = FileDrive::open_or_create(&path, 4096);
        assert!(matches!(result, Err(FsError::ImageTooSmall { expected: 4096, actual: 100 })));
    }
}
