use crate::consts::BlockPointer;
use crate::driver::DeviceDriver;
use crate::structure::directory::DirEntry;
use crate::structure::Structure;
use crate::util::error::{FsError, Result};

/// An entry found by path, together with the directory block holding it.
/// The root has no parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub entry: DirEntry,
    pub parent: Option<BlockPointer>,
}

pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

pub(crate) fn normalize(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Splits `path` into its parent path and final name. `None` for the root.
pub(crate) fn split_parent(path: &str) -> Option<(String, String)> {
    let parts = segments(path);
    let (name, parent) = parts.split_last()?;
    Some((normalize(parent), name.to_string()))
}

pub(crate) fn validate_name(path: &str, name: &str) -> Result<()> {
    if name == "." || name == ".." {
        return Err(FsError::InvalidPath { path: path.to_string(), reason: "'.' and '..' are reserved names" });
    }
    Ok(())
}

pub(crate) fn find_entry<A: DeviceDriver>(structure: &Structure<A>, path: &str) -> Result<ResolvedEntry> {
    let parts = segments(path);
    let root = structure.root();
    let Some((last, intermediate)) = parts.split_last() else {
        return Ok(ResolvedEntry {
            entry: DirEntry::Directory { name: "/".to_string(), dir_block_id: root },
            parent: None,
        });
    };

    let mut current = root;
    for (depth, segment) in intermediate.iter().enumerate() {
        let directory = structure.read_directory(current)?;
        match directory.find(segment) {
            Some(DirEntry::Directory { dir_block_id, .. }) => current = *dir_block_id,
            Some(DirEntry::File { .. }) => return Err(FsError::NotADirectory(normalize(&parts[..=depth]))),
            None => return Err(FsError::NotFound(normalize(&parts[..=depth]))),
        }
    }

    let directory = structure.read_directory(current)?;
    let entry = directory
        .find(last)
        .cloned()
        .ok_or_else(|| FsError::NotFound(normalize(&parts)))?;
    Ok(ResolvedEntry { entry, parent: Some(current) })
}

/// Resolves the directory a new entry goes into.
pub(crate) fn parent_directory<A: DeviceDriver>(structure: &Structure<A>, parent: &str) -> Result<BlockPointer> {
    match find_entry(structure, parent) {
        Ok(ResolvedEntry { entry: DirEntry::Directory { dir_block_id, .. }, .. }) => Ok(dir_block_id),
        Ok(_) => Err(FsError::NotADirectory(parent.to_string())),
        Err(FsError::NotFound(_)) => Err(FsError::ParentNotFound(parent.to_string())),
        Err(error) => Err(error),
    }
}
