//! Vault audit: find files left in clear and files with loose permissions.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::fs::{fix_mode, is_encrypted, test_mode};

/// Audit result for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub path: PathBuf,
    /// The file is not encrypted.
    pub clear: bool,
    /// The file mode differs from the expected one.
    pub bad_mode: bool,
    /// The mode was corrected during this run.
    pub mode_fixed: bool,
}

impl AuditFinding {
    pub fn has_issues(&self) -> bool {
        self.clear || self.bad_mode
    }

    /// Two-character status: `c` for clear, `m` for bad mode, space otherwise.
    pub fn status(&self) -> String {
        let clear = if self.clear { 'c' } else { ' ' };
        let mode = if self.bad_mode { 'm' } else { ' ' };
        format!("{}{}", clear, mode)
    }
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.path.display())
    }
}

/// Audit `files` against `expected_mode`.
///
/// One finding per file, in input order. When `fix` is set, wrong modes are
/// corrected in place; the finding still reports the original problem.
pub fn audit(files: &[PathBuf], expected_mode: u32, fix: bool) -> Result<Vec<AuditFinding>> {
    files
        .iter()
        .map(|path| audit_file(path, expected_mode, fix))
        .collect()
}

fn audit_file(path: &Path, expected_mode: u32, fix: bool) -> Result<AuditFinding> {
    let clear = !is_encrypted(path);
    let bad_mode = !test_mode(path, expected_mode)?;

    let mode_fixed = if bad_mode && fix {
        fix_mode(path, expected_mode)?;
        tracing::info!(path = %path.display(), mode = format!("{:o}", expected_mode), "fixed mode");
        true
    } else {
        false
    };

    Ok(AuditFinding {
        path: path.to_path_buf(),
        clear,
        bad_mode,
        mode_fixed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DEFAULT_MODE;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_status_letters() {
        let finding = AuditFinding {
            path: PathBuf::from("a.txt"),
            clear: true,
            bad_mode: false,
            mode_fixed: false,
        };
        assert_eq!(finding.status(), "c ");
        assert_eq!(finding.to_string(), "c  a.txt");

        let finding = AuditFinding {
            clear: false,
            bad_mode: true,
            ..finding
        };
        assert_eq!(finding.status(), " m");
        assert!(finding.has_issues());
    }

    #[cfg(unix)]
    #[test]
    fn test_audit_flags_and_fixes() {
        let dir = tempdir().unwrap();
        let clear = dir.path().join("clear.txt");
        let sealed = dir.path().join("sealed.txt.crypt");
        fs::write(&clear, "x").unwrap();
        fs::write(&sealed, "y").unwrap();
        fix_mode(&clear, 0o644).unwrap();
        fix_mode(&sealed, DEFAULT_MODE).unwrap();

        let files = vec![clear.clone(), sealed.clone()];

        let findings = audit(&files, DEFAULT_MODE, false).unwrap();
        assert_eq!(findings[0].status(), "cm");
        assert!(!findings[0].mode_fixed);
        assert!(!findings[1].has_issues());
        assert!(!test_mode(&clear, DEFAULT_MODE).unwrap());

        let findings = audit(&files, DEFAULT_MODE, true).unwrap();
        assert_eq!(findings[0].status(), "cm");
        assert!(findings[0].mode_fixed);
        assert!(test_mode(&clear, DEFAULT_MODE).unwrap());

        let findings = audit(&files, DEFAULT_MODE, true).unwrap();
        assert_eq!(findings[0].status(), "c ");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = audit(&[dir.path().join("nope")], DEFAULT_MODE, false);
        assert!(result.is_err() || cfg!(not(unix)));
    }

    #[test]
    fn test_finding_serializes() {
        let finding = AuditFinding {
            path: PathBuf::from("notes.txt"),
            clear: true,
            bad_mode: true,
            mode_fixed: false,
        };
        let yaml = serde_yml::to_string(&finding).unwrap();
        assert!(yaml.contains("clear: true"));
        assert!(yaml.contains("bad_mode: true"));
    }
}
