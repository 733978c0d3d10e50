pub(crate) const SUPERBLOCK_ID: BlockPointer = 0;
pub(crate) const DEFAULT_ROOT_BLOCK: BlockPointer = 1;
pub(crate) const FIRST_ALLOCATABLE_BLOCK: BlockPointer = 2;
pub(crate) const NULL_POINTER: BlockPointer = 0;
pub(crate) const MAX_NAME_LENGTH: usize = u8::MAX as usize;
/// Magic (u32) followed by the root pointer (u64).
pub(crate) const SUPERBLOCK_LEN: usize = 12;
/// Tag, name length and a one byte name, before the directory pointer.
pub(crate) const MIN_DIR_ENTRY_HEADER: usize = 3;

pub const DEFAULT_BLOCK_SIZE: usize = 512;
pub const DEFAULT_NUM_BLOCKS: u64 = 1024;
pub const DEFAULT_POINTER_SIZE: usize = 4;
pub const DEFAULT_MAX_BLOCK_MAP_POINTERS: usize = 4;
pub const DEFAULT_DEFRAG_THRESHOLD: f64 = 0.8;
pub const DEFAULT_DIR_ENTRY_SIZE: usize = 64;

pub type BlockPointer = u64;
