//! Remote backed by an OpenDAL operator.

use std::fs;
use std::path::{Path, PathBuf};

use opendal::{ErrorKind, Operator};
use tokio::runtime::Runtime;

use super::{to_local, to_remote, RemoteStorage};
use crate::error::Result;
use crate::fs::{write_atomic, DEFAULT_MODE};

/// A remote over any OpenDAL service.
///
/// The rest of the crate is synchronous, so the remote owns a
/// current-thread runtime and blocks on each storage call.
pub struct ObjectStoreRemote {
    operator: Operator,
    root: PathBuf,
    mode: u32,
    runtime: Runtime,
}

impl ObjectStoreRemote {
    /// Wrap `operator` for the tree at `root`.
    pub fn new(operator: Operator, root: &Path) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            operator,
            root: root.to_path_buf(),
            mode: DEFAULT_MODE,
            runtime,
        })
    }

    /// Mode applied to pulled files.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys of every file stored under `key`.
    fn list_keys(&self, key: &str) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let prefix = if key.is_empty() {
                "/".to_string()
            } else {
                format!("{}/", key)
            };

            let entries = match self.operator.list_with(&prefix).recursive(true).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
                Err(err) => return Err(err.into()),
            };
            let mut keys: Vec<String> = entries
                .into_iter()
                .filter(|entry| entry.metadata().is_file() && !entry.path().ends_with('/'))
                .map(|entry| entry.path().trim_start_matches('/').to_string())
                .collect();

            if keys.is_empty() && !key.is_empty() && self.operator.exists(key).await? {
                keys.push(key.to_string());
            }
            keys.sort();
            Ok(keys)
        })
    }
}

impl RemoteStorage for ObjectStoreRemote {
    fn push(&self, path: &Path) -> Result<()> {
        let key = to_remote(&self.root, path)?;
        let data = fs::read(path)?;
        let size = data.len();

        self.runtime
            .block_on(async { self.operator.write(&key, data).await })?;
        tracing::info!(path = %path.display(), key = %key, bytes = size, "pushed");
        Ok(())
    }

    fn pull(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let prefix = to_remote(&self.root, path)?;
        let mut written = Vec::new();

        for key in self.list_keys(&prefix)? {
            let local = to_local(&self.root, &key)?;
            let buffer = self
                .runtime
                .block_on(async { self.operator.read(&key).await })?;
            write_atomic(&local, &buffer.to_vec(), self.mode)?;
            tracing::info!(key = %key, path = %local.display(), "pulled");
            written.push(local);
        }
        Ok(written)
    }
}
