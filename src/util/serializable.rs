use crate::config::FsConfig;
use crate::consts::BlockPointer;
use crate::util::error::Result;

/// An on-disk record. Decoding never fails loudly: a record that doesn't
/// parse is reported as `None` and the caller picks the recovery policy.
pub trait ByteSerializable: Sized {
    fn to_bytes(&self, config: &FsConfig) -> Result<Vec<u8>>;
    fn from_bytes(bytes: &[u8], config: &FsConfig) -> Option<Self>;
}

pub fn write_pointer(buffer: &mut Vec<u8>, pointer: BlockPointer, width: usize) {
    buffer.extend_from_slice(&pointer.to_le_bytes()[..width]);
}

pub fn read_pointer(bytes: &[u8], width: usize) -> Option<BlockPointer> {
    let raw = bytes.get(..width)?;
    let mut buffer = [0u8; 8];
    buffer[..width].copy_from_slice(raw);
    Some(BlockPointer::from_le_bytes(buffer))
}

/// Cursor over a record, returning `None` once the input runs out.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data }
    }

    pub fn take(&mut self, count: usize) -> Option<&'a [u8]> {
        if count > self.data.len() {
            return None;
        }
        let (head, tail) = self.data.split_at(count);
        self.data = tail;
        Some(head)
    }

    pub fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64(&mut self) -> Option<u64> {
        let mut buffer = [0u8; 8];
        buffer.copy_from_slice(self.take(8)?);
        Some(u64::from_le_bytes(buffer))
    }

    pub fn pointer(&mut self, width: usize) -> Option<BlockPointer> {
        read_pointer(self.take(width)?, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_width() {
        let mut buffer = Vec::new();
        write_pointer(&mut buffer, 0x0102_0304, 4);
        write_pointer(&mut buffer, 7, 2);
        assert_eq!(buffer, vec![4, 3, 2, 1, 7, 0]);
        assert_eq!(read_pointer(&buffer, 4), Some(0x0102_0304));
        assert_eq!(read_pointer(&buffer[4..], 2), Some(7));
        assert_eq!(read_pointer(&buffer[5..], 2), None);
    }

    #[test]
    fn reader_stops_at_end() {
        let data = [1u8, 2, 0, 0, 0];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u8(), Some(1));
        assert_eq!(reader.u32(), Some(2));
        assert_eq!(reader.u8(), None);
    }
}
