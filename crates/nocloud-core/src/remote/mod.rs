//! Remote storage for vault files.
//!
//! A remote mirrors the tree below a configuration root: the local file
//! `<root>/invoices/2024.pdf.crypt` is stored under the key
//! `invoices/2024.pdf.crypt`. Backends implement [`RemoteStorage`].

use std::path::{Component, Path, PathBuf};

use crate::config::RemoteConfig;
use crate::error::{NoCloudError, Result};

mod object_store;
mod operator;

pub use object_store::ObjectStoreRemote;
pub use operator::build_operator;

/// Capability interface of a remote backend.
pub trait RemoteStorage {
    /// Upload one local file, replacing any previous version.
    fn push(&self, path: &Path) -> Result<()>;

    /// Download every object stored under `path` (a file or a directory),
    /// replacing local files. Returns the local paths written.
    fn pull(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Open the backend described by `config` for the tree at `root`.
///
/// Pulled files are written with `mode`.
pub fn open_remote(config: &RemoteConfig, root: &Path, mode: u32) -> Result<Box<dyn RemoteStorage>> {
    config.validate()?;
    let operator = build_operator(config, root)?;
    tracing::debug!(driver = config.driver(), root = %root.display(), "opened remote");
    Ok(Box::new(ObjectStoreRemote::new(operator, root)?.with_mode(mode)))
}

/// Remote key of the local `path`, relative to `root`.
///
/// An empty key designates the whole tree.
///
/// # Errors
///
/// Returns `NoCloudError::InvalidInput` if `path` is outside `root`.
pub fn to_remote(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        NoCloudError::InvalidInput(format!(
            "{} is outside {}",
            path.display(),
            root.display()
        ))
    })?;

    let parts = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>();
    Ok(parts.join("/"))
}

/// Local path of the remote `key` under `root`.
///
/// # Errors
///
/// Returns `NoCloudError::InvalidInput` for keys that would escape `root`.
pub fn to_local(root: &Path, key: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for part in key.split('/').filter(|part| !part.is_empty()) {
        if part == "." || part == ".." {
            return Err(NoCloudError::InvalidInput(format!(
                "Refusing remote key {}",
                key
            )));
        }
        path.push(part);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_remote_strips_root() {
        let root = Path::new("/home/me/vault");
        assert_eq!(
            to_remote(root, Path::new("/home/me/vault/a/b.txt.crypt")).unwrap(),
            "a/b.txt.crypt"
        );
        assert_eq!(to_remote(root, root).unwrap(), "");
        assert!(to_remote(root, Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_to_local_joins_under_root() {
        let root = Path::new("/home/me/vault");
        assert_eq!(
            to_local(root, "a/b.txt.crypt").unwrap(),
            PathBuf::from("/home/me/vault/a/b.txt.crypt")
        );
        assert_eq!(to_local(root, "/x").unwrap(), PathBuf::from("/home/me/vault/x"));
        assert!(to_local(root, "../outside").is_err());
    }
}
