//! Filesystem utilities: vault file naming, traversal, modes and atomic writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glob::Pattern;

use crate::error::{NoCloudError, Result};

/// Suffix marking an encrypted file.
pub const ENCRYPTED_SUFFIX: &str = ".crypt";

/// Mode expected on every vault file.
pub const DEFAULT_MODE: u32 = 0o600;

/// File names skipped when walking directories.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".hg", ".git", ".env", ".DS_Store", ".localized"];

/// Whether `path` names an encrypted file.
pub fn is_encrypted(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(ENCRYPTED_SUFFIX)
}

/// `notes.txt` -> `notes.txt.crypt`
pub fn encrypted_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// `notes.txt.crypt` -> `notes.txt`; `None` if the path is not encrypted.
#[cfg(unix)]
pub fn decrypted_path(path: &Path) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    path.as_os_str()
        .as_bytes()
        .strip_suffix(ENCRYPTED_SUFFIX.as_bytes())
        .filter(|stripped| !stripped.is_empty())
        .map(|stripped| PathBuf::from(OsStr::from_bytes(stripped)))
}

#[cfg(not(unix))]
pub fn decrypted_path(path: &Path) -> Option<PathBuf> {
    path.to_str()?
        .strip_suffix(ENCRYPTED_SUFFIX)
        .filter(|stripped| !stripped.is_empty())
        .map(PathBuf::from)
}

/// Compiled set of file-name patterns to skip during traversal.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compile shell-style patterns (`*`, `?`, `[...]`).
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| {
                    NoCloudError::InvalidInput(format!(
                        "Invalid ignore pattern {}: {}",
                        p.as_ref(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether the file name matches any pattern.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        }
    }
}

/// Expand paths into the files they contain.
///
/// Files are returned as given. Directories are walked recursively in sorted
/// order; files whose name is ignored are skipped.
///
/// # Errors
///
/// Returns `NoCloudError::Io` if a path does not exist or a directory cannot
/// be read.
pub fn list_files<P: AsRef<Path>>(paths: &[P], ignore: &IgnoreSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| {
            NoCloudError::Io {
                source: io::Error::new(e.kind(), format!("{}: {}", path.display(), e)),
            }
        })?;
        if metadata.is_dir() {
            walk_directory(path, ignore, &mut files)?;
        } else {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn walk_directory(dir: &Path, ignore: &IgnoreSet, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_directory(&path, ignore, files)?;
        } else if file_type.is_file() || is_link_to_file(&path, file_type) {
            let name = entry.file_name();
            if ignore.is_ignored(&name.to_string_lossy()) {
                tracing::trace!(path = %path.display(), "ignored");
                continue;
            }
            files.push(path);
        }
    }
    Ok(())
}

/// Links to directories are not followed; dangling links are skipped.
fn is_link_to_file(path: &Path, file_type: fs::FileType) -> bool {
    file_type.is_symlink() && fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Search upward from `start` for the first directory containing one of
/// `candidates`.
///
/// Returns the directory and the matching candidate name.
pub fn find_in_path(start: &Path, candidates: &[&str]) -> Option<(PathBuf, String)> {
    let start = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };
    let start = start.canonicalize().unwrap_or(start);

    for dir in start.ancestors() {
        for candidate in candidates {
            if dir.join(candidate).is_file() {
                return Some((dir.to_path_buf(), candidate.to_string()));
            }
        }
    }
    None
}

/// Whether the permission bits of `path` equal `expected_mode`.
#[cfg(unix)]
pub fn test_mode(path: &Path, expected_mode: u32) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o7777 == expected_mode)
}

#[cfg(not(unix))]
pub fn test_mode(_path: &Path, _expected_mode: u32) -> Result<bool> {
    Ok(true)
}

/// Set the permission bits of `path` to `mode`.
#[cfg(unix)]
pub fn fix_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn fix_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Write `contents` to `destination` through a sibling temp file, applying
/// `mode` before the final rename.
pub fn write_atomic(destination: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.{}.{}.tmp", file_name, std::process::id(), nanos));

    if let Err(err) = fs::write(&temp_path, contents).and_then(|_| {
        fix_mode(&temp_path, mode).map_err(|e| io::Error::other(e.to_string()))
    }) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    rename_with_fallback(&temp_path, destination)?;
    Ok(())
}

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}
