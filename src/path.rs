//! Absolute-path resolution.

use log::trace;

use crate::block_dev::BlockDevice;
use crate::config::{MAX_NAME, MAX_PATH, ROOT_INODE_ID};
use crate::directory::DirectoryEntries;
use crate::error::{FsError, Result};
use crate::inode::{InodeCache, InodeKind};

/// Legal file names are non-empty, shorter than `MAX_NAME` bytes, and use
/// only letters, digits, dots, dashes, and underscores.
pub fn legal_filename(name: &str) -> bool {
    if name.is_empty() || name.len() >= MAX_NAME {
        return false;
    }
    name.bytes()
        .all(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'-' || c == b'_')
}

/// Outcome of a successful path resolution: the parent directory's inode,
/// the final component's inode when it exists, and the final component's
/// name. A missing final component is not an error; it is the normal
/// "does not exist yet" case that create relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub parent: u32,
    pub child: Option<u32>,
    pub name: String,
}

/// Walks `path` from the root directory, one component at a time.
///
/// Any structural violation aborts as `InvalidPath`: a relative path, an
/// illegal component name, a missing intermediate component, or a
/// non-directory where a directory was expected. Resolving `/` itself
/// yields parent = child = root.
pub fn resolve(device: &impl BlockDevice, path: &str) -> Result<Resolved> {
    if !path.starts_with('/') || path.len() >= MAX_PATH {
        return Err(FsError::InvalidPath);
    }

    let mut cache = InodeCache::new();
    let mut parent = ROOT_INODE_ID;
    let mut child = Some(ROOT_INODE_ID);
    let mut name = String::new();

    for component in path.split('/').filter(|c| !c.is_empty()) {
        if !legal_filename(component) {
            trace!("resolve: illegal component '{component}'");
            return Err(FsError::InvalidPath);
        }
        // a missing or failed component anywhere but the end poisons the
        // rest of the walk
        let Some(current) = child else {
            trace!("resolve: '{name}' unresolved before '{component}'");
            return Err(FsError::InvalidPath);
        };
        let inode = cache.inode(device, current)?;
        if inode.kind != InodeKind::Directory {
            trace!("resolve: inode {current} is not a directory");
            return Err(FsError::InvalidPath);
        }
        parent = current;
        child = DirectoryEntries::from_inode(device, current, inode)?
            .find(component.as_bytes())?;
        name = component.to_string();
    }

    trace!("resolve: '{path}' -> parent={parent} child={child:?}");
    Ok(Resolved { parent, child, name })
}
