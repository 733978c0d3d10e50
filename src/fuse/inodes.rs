use std::collections::HashMap;

pub(crate) const ROOT_INODE: u64 = 1;

/// Inode numbers handed to the kernel. The image has no inodes of its own,
/// so each path gets a number the first time the kernel sees it.
pub(crate) struct InodeTable {
    paths: HashMap<u64, String>,
    inodes: HashMap<String, u64>,
    next: u64,
}

impl InodeTable {
    pub fn new() -> InodeTable {
        let mut table = InodeTable { paths: HashMap::new(), inodes: HashMap::new(), next: ROOT_INODE + 1 };
        table.paths.insert(ROOT_INODE, "/".to_string());
        table.inodes.insert("/".to_string(), ROOT_INODE);
        table
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    pub fn assign(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.inodes.get(path) {
            return *ino;
        }
        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.to_string());
        self.inodes.insert(path.to_string(), ino);
        ino
    }

    pub fn forget(&mut self, path: &str) {
        if let Some(ino) = self.inodes.remove(path) {
            self.paths.remove(&ino);
        }
    }
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

pub(crate) fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &path[..index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_stable_numbers() {
        let mut table = InodeTable::new();
        assert_eq!(table.path(ROOT_INODE), Some("/"));

        let a = table.assign("/a");
        assert_eq!(table.assign("/a"), a);
        let b = table.assign("/a/b");
        assert_ne!(a, b);
        assert_eq!(table.path(b), Some("/a/b"));

        table.forget("/a/b");
        assert_eq!(table.path(b), None);
        assert_ne!(table.assign("/a/b"), b);
    }

    #[test]
    fn paths() {
        assert_eq!(child_path("/", "a"), "/a");
        assert_eq!(child_path("/a", "b"), "/a/b");
        assert_eq!(parent_path("/a/b"), "/a");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/"), "/");
    }
}
