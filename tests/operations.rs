use std::io;

use flatfs::{DeviceDriver, EntryKind, FlatFS, FsConfig, FsError, MemoryDrive};

fn config(num_blocks: u64) -> FsConfig {
    FsConfig { num_blocks, ..FsConfig::default() }
}

fn fresh(num_blocks: u64) -> FlatFS<MemoryDrive> {
    let config = config(num_blocks);
    FlatFS::new(MemoryDrive::new(config.image_size()), config).unwrap()
}

fn names<D: DeviceDriver>(fs: &FlatFS<D>, path: &str) -> Vec<String> {
    fs.ls(path).unwrap().into_iter().map(|entry| entry.name).collect()
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn fresh_disk_has_empty_root() {
    let fs = fresh(64);
    assert!(fs.ls("/").unwrap().is_empty());
    assert_eq!(fs.root_block(), 1);

    let root = fs.stat("/").unwrap();
    assert_eq!(root.kind, EntryKind::Directory);
    assert_eq!(root.blocks, vec![1]);
    assert_eq!(fs.used_blocks().unwrap(), vec![0, 1]);
}

#[test]
fn nested_directories() {
    let mut fs = fresh(64);
    fs.mkdir("/a").unwrap();
    fs.mkdir("/a/b").unwrap();

    assert_eq!(names(&fs, "/"), vec!["a"]);
    assert_eq!(names(&fs, "/a"), vec!["b"]);
    assert!(fs.ls("/a/b").unwrap().is_empty());
    assert_eq!(fs.stat("/a").unwrap().blocks, vec![2]);
    assert_eq!(fs.stat("/a/b").unwrap().blocks, vec![3]);

    assert!(matches!(fs.mkdir("/a"), Err(FsError::PathExists(_))));
    assert!(matches!(fs.mkdir("/x/y"), Err(FsError::ParentNotFound(_))));
    assert!(matches!(fs.mkdir("/"), Err(FsError::PathExists(_))));
    assert!(matches!(fs.mkdir("/a/.."), Err(FsError::InvalidPath { .. })));
}

#[test]
fn paths_are_normalized() {
    let mut fs = fresh(64);
    fs.mkdir("a").unwrap();
    fs.mkdir("//a///b/").unwrap();
    assert_eq!(names(&fs, "/a/"), vec!["b"]);
}

#[test]
fn ls_errors() {
    let mut fs = fresh(64);
    fs.import_file(b"hello", "/f").unwrap();

    assert!(matches!(fs.ls("/missing"), Err(FsError::NotFound(_))));
    assert!(matches!(fs.ls("/f"), Err(FsError::NotADirectory(_))));
    assert!(matches!(fs.ls("/f/g"), Err(FsError::NotADirectory(_))));
    assert!(matches!(fs.cat("/"), Err(FsError::NotAFile(_))));
}

#[test]
fn import_uses_one_map_and_three_data_blocks() {
    let mut fs = fresh(64);
    let block_size = fs.get_block_size();
    let content = pattern(2 * block_size + 5);

    fs.import_file(&content, "/big.txt").unwrap();

    let summary = fs.stat("/big.txt").unwrap();
    assert_eq!(summary.kind, EntryKind::File);
    assert_eq!(summary.size, content.len() as u64);
    assert_eq!(summary.block_maps, vec![2]);
    assert_eq!(summary.blocks, vec![3, 4, 5]);
    assert_eq!(fs.used_blocks().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(fs.cat("/big.txt").unwrap(), content);
}

#[test]
fn empty_file() {
    let mut fs = fresh(64);
    fs.import_file(&[], "/empty").unwrap();

    let summary = fs.stat("/empty").unwrap();
    assert_eq!(summary.size, 0);
    assert!(summary.block_maps.is_empty());
    assert!(summary.blocks.is_empty());
    assert!(fs.cat("/empty").unwrap().is_empty());
    assert_eq!(fs.used_blocks().unwrap(), vec![0, 1]);
}

#[test]
fn large_file_chains_block_maps() {
    let mut fs = fresh(512);
    let config = fs.config().clone();
    let per_map = config.pointers_per_block();
    let content = pattern((per_map + 3) * config.block_size);

    fs.import_file(&content, "/chained").unwrap();

    let summary = fs.stat("/chained").unwrap();
    assert_eq!(summary.block_maps, vec![2, 3]);
    assert_eq!(summary.blocks.len(), per_map + 3);
    assert_eq!(summary.blocks[0], 4);
    assert_eq!(fs.cat("/chained").unwrap(), content);
}

#[test]
fn file_over_the_size_limit_is_rejected() {
    let mut fs = fresh(64);
    let limit = fs.config().max_file_size() as usize;

    let result = fs.import_file(&vec![1u8; limit + 1], "/huge");
    assert!(matches!(result, Err(FsError::FileTooLarge { .. })));
    assert!(fs.ls("/").unwrap().is_empty());
}

#[test]
fn rm_frees_and_reuses_blocks() {
    let mut fs = fresh(64);
    fs.mkdir("/a").unwrap();
    fs.import_file(b"payload", "/a/f").unwrap();
    assert_eq!(fs.stat("/a/f").unwrap().block_maps, vec![3]);
    assert_eq!(fs.stat("/a/f").unwrap().blocks, vec![4]);

    assert!(matches!(fs.rm("/a"), Err(FsError::NotEmpty(_))));
    assert!(matches!(fs.rm("/"), Err(FsError::InvalidPath { .. })));
    assert!(matches!(fs.rm("/nope"), Err(FsError::NotFound(_))));

    fs.rm("/a/f").unwrap();
    let used = fs.used_blocks().unwrap();
    assert!(!used.contains(&3));
    assert!(!used.contains(&4));

    fs.mkdir("/b").unwrap();
    assert_eq!(fs.stat("/b").unwrap().blocks, vec![3]);

    fs.rm("/a").unwrap();
    assert_eq!(names(&fs, "/"), vec!["b"]);
    assert_eq!(fs.used_blocks().unwrap(), vec![0, 1, 3]);
}

#[test]
fn disk_full_leaves_state_unchanged() {
    let mut fs = fresh(8);
    fs.import_file(b"keep me", "/keep").unwrap();
    let before_listing = fs.ls("/").unwrap();
    let before_used = fs.used_blocks().unwrap();
    let block_size = fs.get_block_size();

    let result = fs.import_file(&pattern(4 * block_size), "/big");
    assert!(matches!(result, Err(FsError::DiskFull { requested: 5, available: 4 })));

    assert_eq!(fs.ls("/").unwrap(), before_listing);
    assert_eq!(fs.used_blocks().unwrap(), before_used);
    assert_eq!(fs.cat("/keep").unwrap(), b"keep me");
}

#[test]
fn duplicate_import_keeps_original() {
    let mut fs = fresh(64);
    fs.import_file(b"first", "/f").unwrap();

    assert!(matches!(fs.import_file(b"second", "/f"), Err(FsError::PathExists(_))));
    assert!(matches!(fs.import_file(b"x", "/missing/f"), Err(FsError::ParentNotFound(_))));
    assert!(matches!(fs.import_file(b"x", "/f/g"), Err(FsError::NotADirectory(_))));
    assert_eq!(fs.cat("/f").unwrap(), b"first");
}

#[test]
fn directory_capacity() {
    let mut fs = fresh(64);
    let capacity = fs.config().max_dir_entries();
    for i in 0..capacity {
        fs.mkdir(&format!("/d{}", i)).unwrap();
    }
    let used = fs.used_blocks().unwrap();

    assert!(matches!(fs.mkdir("/overflow"), Err(FsError::DirectoryFull { .. })));
    assert!(matches!(fs.import_file(b"x", "/overflow"), Err(FsError::DirectoryFull { .. })));
    assert_eq!(fs.used_blocks().unwrap(), used);
}

#[test]
fn long_names_do_not_fit_a_slot() {
    let mut fs = fresh(64);
    let name = format!("/{}", "n".repeat(100));
    assert!(matches!(fs.mkdir(&name), Err(FsError::EntryTooLarge { .. })));
    assert!(fs.ls("/").unwrap().is_empty());
}

#[test]
fn corrupt_slot_is_skipped() {
    let mut fs = fresh(64);
    fs.mkdir("/a").unwrap();
    fs.mkdir("/b").unwrap();
    let config = fs.config().clone();

    let mut device = fs.into_device();
    device.write_at(config.block_size as u64, &[0xEE]).unwrap();

    let fs = FlatFS::new(device, config).unwrap();
    assert_eq!(names(&fs, "/"), vec!["b"]);
}

#[test]
fn corrupt_superblock_is_reformatted() {
    let mut fs = fresh(64);
    fs.mkdir("/a").unwrap();
    let config = fs.config().clone();

    let mut device = fs.into_device();
    device.write_at(0, &[0xFF; 4]).unwrap();

    let fs = FlatFS::new(device, config).unwrap();
    assert!(fs.ls("/").unwrap().is_empty());
    assert_eq!(fs.root_block(), 1);
}

#[test]
fn image_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");

    {
        let mut fs = FlatFS::open(&image, config(64)).unwrap();
        fs.mkdir("/docs").unwrap();
        fs.import_file(b"persisted", "/docs/note").unwrap();
        fs.sync().unwrap();
    }

    let fs = FlatFS::open(&image, config(64)).unwrap();
    assert_eq!(names(&fs, "/docs"), vec!["note"]);
    assert_eq!(fs.cat("/docs/note").unwrap(), b"persisted");
    assert_eq!(std::fs::metadata(&image).unwrap().len(), config(64).image_size());
}

#[test]
fn usage_report() {
    let mut fs = fresh(10);
    let report = fs.usage().unwrap();
    assert_eq!((report.used, report.free, report.total), (2, 8, 10));
    assert!(!report.over_threshold);

    fs.import_file(&pattern(6 * 512), "/f").unwrap();
    let report = fs.usage().unwrap();
    assert_eq!(report.used, 9);
    assert!(report.over_threshold);
}

/// Starts failing every read once the superblock has been rewritten, so the
/// last step of a mutating operation has already landed on disk.
struct ReadsFailAfterCommit {
    inner: MemoryDrive,
    failing: bool,
}

impl DeviceDriver for ReadsFailAfterCommit {
    fn get_size(&self) -> u64 {
        self.inner.get_size()
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
        }
        self.inner.read_at(offset, buffer)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.inner.write_at(offset, data)?;
        if offset == 0 {
            self.failing = true;
        }
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.inner.sync()
    }
}

fn failing_after_commit(fs: FlatFS<MemoryDrive>) -> FlatFS<ReadsFailAfterCommit> {
    let config = fs.config().clone();
    let device = ReadsFailAfterCommit { inner: fs.into_device(), failing: false };
    FlatFS::new(device, config).unwrap()
}

#[test]
fn usage_scan_failure_does_not_fail_the_write() {
    let config = config(64);
    let mut fs = failing_after_commit(fresh(64));
    fs.mkdir("/a").unwrap();
    let fs = FlatFS::new(fs.into_device().inner, config.clone()).unwrap();
    assert_eq!(names(&fs, "/"), vec!["a"]);

    let mut fs = failing_after_commit(fs);
    fs.import_file(b"data", "/a/f").unwrap();
    let fs = FlatFS::new(fs.into_device().inner, config.clone()).unwrap();
    assert_eq!(fs.cat("/a/f").unwrap(), b"data");

    let mut fs = failing_after_commit(fs);
    fs.rm("/a/f").unwrap();
    let fs = FlatFS::new(fs.into_device().inner, config).unwrap();
    assert!(fs.ls("/a").unwrap().is_empty());
}

#[test]
fn entry_errors_win_over_disk_full() {
    let mut fs = fresh(3);
    fs.mkdir("/x").unwrap();
    assert!(matches!(fs.mkdir("/y"), Err(FsError::DiskFull { .. })));

    let long = format!("/{}", "n".repeat(100));
    assert!(matches!(fs.mkdir(&long), Err(FsError::EntryTooLarge { .. })));
    assert!(matches!(fs.import_file(b"x", &long), Err(FsError::EntryTooLarge { .. })));

    let config = FsConfig { num_blocks: 4, dir_entry_size: 256, ..FsConfig::default() };
    let mut fs = FlatFS::new(MemoryDrive::new(config.image_size()), config).unwrap();
    fs.mkdir("/x").unwrap();
    fs.mkdir("/y").unwrap();
    assert!(matches!(fs.mkdir("/z"), Err(FsError::DirectoryFull { .. })));
    assert!(matches!(fs.import_file(b"x", "/z"), Err(FsError::DirectoryFull { .. })));
}
