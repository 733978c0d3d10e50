use std::path::Path;

use fuser::MountOption;
use tracing::info;

use crate::driver::DeviceDriver;
use crate::ops::FlatFS;
use crate::util::error::{FsError, Result};

mod filesystem;
mod inodes;

pub use filesystem::FuseDriver;

fn mount_options(read_only: bool) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName("flatfs".to_string()),
        MountOption::Subtype("flatfs".to_string()),
        MountOption::DefaultPermissions,
        MountOption::NoAtime,
    ];
    if read_only {
        options.push(MountOption::RO);
    }
    options
}

/// Serves `fs` at `mountpoint` until it is unmounted.
pub fn mount<A: DeviceDriver>(fs: FlatFS<A>, mountpoint: impl AsRef<Path>, read_only: bool) -> Result<()> {
    let mountpoint = mountpoint.as_ref();
    if mountpoint.as_os_str().is_empty() {
        return Err(FsError::InvalidPath { path: String::new(), reason: "mountpoint cannot be empty" });
    }

    info!(mountpoint = %mountpoint.display(), read_only, "mounting");
    fuser::mount2(FuseDriver::new(fs, read_only), mountpoint, &mount_options(read_only))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::mount_options;
    use fuser::MountOption;

    #[test]
    fn read_only_option() {
        assert!(!mount_options(false).contains(&MountOption::RO));
        assert!(mount_options(true).contains(&MountOption::RO));
    }
}
