//! Batch renaming with a `s/pattern/replacement/` substitution.
//!
//! The pattern is a regular expression matched against the whole path. In the
//! replacement, `$i` is replaced by a 1-based counter zero-padded to the width
//! of the file count; the remaining text follows `regex` replacement syntax
//! (`$1`, `${name}`, `$$`).

use std::fs;
use std::path::PathBuf;

use regex::Regex;

use crate::error::{NoCloudError, Result};

const COUNTER: &str = "$i";

/// A parsed substitution.
#[derive(Debug, Clone)]
pub struct SubstitutionPattern {
    regex: Regex,
    replacement: String,
}

/// One planned rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl RenamePlan {
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }
}

impl SubstitutionPattern {
    /// Parse `s/pattern/replacement/`.
    ///
    /// The pattern ends at the first `/` after `s/`; the replacement may
    /// contain further slashes.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text
            .strip_prefix("s/")
            .and_then(|rest| rest.strip_suffix('/'))
            .ok_or_else(|| invalid(text))?;
        let (pattern, replacement) = body.split_once('/').ok_or_else(|| invalid(text))?;

        let regex = Regex::new(pattern).map_err(|e| {
            NoCloudError::InvalidInput(format!("Invalid rename pattern {}: {}", pattern, e))
        })?;

        Ok(Self {
            regex,
            replacement: replacement.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Compute the destination of every file, numbering them in order.
    pub fn plan(&self, files: &[PathBuf]) -> Vec<RenamePlan> {
        let width = files.len().to_string().len();

        files
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let counter = format!("{:0width$}", index + 1, width = width);
                let replacement = self.replacement.replace(COUNTER, &counter);
                let source_text = source.to_string_lossy();
                let destination = self
                    .regex
                    .replace_all(&source_text, replacement.as_str())
                    .into_owned();
                RenamePlan {
                    source: source.clone(),
                    destination: PathBuf::from(destination),
                }
            })
            .collect()
    }
}

/// Carry out `plans` in order.
///
/// Stops at the first destination that already exists unless `force` is set;
/// renames done before that point are kept.
pub fn apply(plans: &[RenamePlan], force: bool) -> Result<usize> {
    let mut renamed = 0;
    for plan in plans {
        if plan.is_noop() {
            continue;
        }
        if !force && plan.destination.exists() {
            return Err(NoCloudError::InvalidInput(format!(
                "Destination exists: {}",
                plan.destination.display()
            )));
        }
        if let Some(parent) = plan.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::rename(&plan.source, &plan.destination)?;
        tracing::debug!(
            source = %plan.source.display(),
            destination = %plan.destination.display(),
            "renamed"
        );
        renamed += 1;
    }
    Ok(renamed)
}

fn invalid(text: &str) -> NoCloudError {
    NoCloudError::InvalidInput(format!(
        "Invalid pattern {}: expected s/pattern/replacement/",
        text
    ))
}
