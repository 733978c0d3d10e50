use std::ffi::OsStr;
use std::os::raw::c_int;
use std::time::{Duration, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen,
    Request,
};
use tracing::{trace, warn};

use crate::driver::DeviceDriver;
use crate::fuse::inodes::{child_path, parent_path, InodeTable};
use crate::ops::{EntryKind, EntrySummary, FlatFS};
use crate::util::error::FsError;

const TTL: Duration = Duration::from_secs(1);

pub struct FuseDriver<A: DeviceDriver> {
    flat_fs: FlatFS<A>,
    inodes: InodeTable,
    read_only: bool,
}

fn errno(operation: &'static str, ino: u64, error: &FsError) -> c_int {
    let errno = error.errno();
    if errno == libc::ENOENT {
        trace!(op = operation, ino, %error, "FUSE op returned ENOENT");
    } else {
        warn!(op = operation, ino, errno, %error, "FUSE op failed");
    }
    errno
}

fn file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::File => FileType::RegularFile,
    }
}

impl<A: DeviceDriver> FuseDriver<A> {
    pub fn new(flat_fs: FlatFS<A>, read_only: bool) -> FuseDriver<A> {
        FuseDriver { flat_fs, inodes: InodeTable::new(), read_only }
    }

    fn summary_to_fileattr(&self, req: &Request<'_>, ino: u64, summary: &EntrySummary) -> FileAttr {
        let (perm, nlink) = match summary.kind {
            EntryKind::Directory => (0o755, 2),
            EntryKind::File => (0o644, 1),
        };
        FileAttr {
            ino,
            size: summary.size,
            blocks: summary.blocks.len() as u64,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: file_type(summary.kind),
            perm,
            nlink,
            uid: req.uid(),
            gid: req.gid(),
            rdev: 0,
            blksize: self.flat_fs.get_block_size() as u32,
            flags: 0,
        }
    }

    fn child(&self, parent: u64, name: &OsStr) -> Result<String, c_int> {
        let parent = self.inodes.path(parent).ok_or(libc::ENOENT)?;
        let name = name.to_str().ok_or(libc::EINVAL)?;
        Ok(child_path(parent, name))
    }

    fn entry(&mut self, req: &Request<'_>, path: &str) -> Result<FileAttr, FsError> {
        let summary = self.flat_fs.stat(path)?;
        let ino = self.inodes.assign(path);
        Ok(self.summary_to_fileattr(req, ino, &summary))
    }

    fn remove(&mut self, parent: u64, name: &OsStr, expect: EntryKind, reply: ReplyEmpty) {
        if self.read_only {
            reply.error(libc::EROFS);
            return;
        }
        let path = match self.child(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };

        let result = self.flat_fs.stat(&path).and_then(|summary| {
            match (summary.kind, expect) {
                (EntryKind::Directory, EntryKind::File) => return Err(FsError::NotAFile(path.clone())),
                (EntryKind::File, EntryKind::Directory) => return Err(FsError::NotADirectory(path.clone())),
                _ => {}
            }
            self.flat_fs.rm(&path)
        });
        match result {
            Ok(()) => {
                self.inodes.forget(&path);
                reply.ok();
            }
            Err(error) => reply.error(errno("remove", parent, &error)),
        }
    }
}

impl<A: DeviceDriver> Filesystem for FuseDriver<A> {
    fn lookup(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let path = match self.child(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.entry(req, &path) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(error) => reply.error(errno("lookup", parent, &error)),
        }
    }

    fn getattr(&mut self, req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let Some(path) = self.inodes.path(ino).map(str::to_string) else {
            return reply.error(libc::ENOENT);
        };
        match self.flat_fs.stat(&path) {
            Ok(summary) => reply.attr(&TTL, &self.summary_to_fileattr(req, ino, &summary)),
            Err(error) => reply.error(errno("getattr", ino, &error)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            trace!(ino, flags, "refusing write open, file contents are immutable");
            return reply.error(libc::EROFS);
        }
        reply.opened(0, 0);
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.inodes.path(ino).map(str::to_string) else {
            return reply.error(libc::ENOENT);
        };
        match self.flat_fs.cat(&path) {
            Ok(content) => {
                let start = usize::try_from(offset).unwrap_or(0).min(content.len());
                let end = start.saturating_add(size as usize).min(content.len());
                reply.data(&content[start..end]);
            }
            Err(error) => reply.error(errno("read", ino, &error)),
        }
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let Some(path) = self.inodes.path(ino).map(str::to_string) else {
            return reply.error(libc::ENOENT);
        };
        let children = match self.flat_fs.ls(&path) {
            Ok(children) => children,
            Err(error) => return reply.error(errno("readdir", ino, &error)),
        };

        let parent_ino = self.inodes.assign(parent_path(&path));
        let mut entries = vec![(ino, FileType::Directory, ".".to_string()), (parent_ino, FileType::Directory, "..".to_string())];
        for child in children {
            let child_ino = self.inodes.assign(&child_path(&path, &child.name));
            entries.push((child_ino, file_type(child.kind), child.name));
        }

        let skip = usize::try_from(offset).unwrap_or(0);
        for (index, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(skip) {
            if reply.add(entry_ino, (index + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn mkdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
        if self.read_only {
            return reply.error(libc::EROFS);
        }
        let path = match self.child(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.flat_fs.mkdir(&path).and_then(|_| self.entry(req, &path)) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(error) => reply.error(errno("mkdir", parent, &error)),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        self.remove(parent, name, EntryKind::File, reply);
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        self.remove(parent, name, EntryKind::Directory, reply);
    }
}
