use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Suffix every archive file carries.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Logical identity of an archive, derived from its file name.
///
/// `billing-api.tar.gz` is the archive `billing-api`. Names are validated so
/// that joining one onto the archive directory can never leave it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchiveName(String);

impl ArchiveName {
    /// Validate a bare archive name (no suffix).
    ///
    /// Separators, NUL, the empty name and the exact names `.` and `..` are
    /// rejected, so [`ArchiveName::path_in`] always names a file directly
    /// inside the directory. Names such as `release..final` are accepted.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(CoreError::InvalidArchiveName { name });
        }
        Ok(Self(name))
    }

    /// Stricter validation for names typed by a user, such as the download
    /// target of `fetch`: any `..` sequence is refused as well.
    pub fn parse_requested(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.contains("..") {
            return Err(CoreError::InvalidArchiveName { name });
        }
        Self::parse(name)
    }

    /// Derive the name from a file name such as `billing-api.tar.gz`.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let stem = file_name
            .strip_suffix(ARCHIVE_SUFFIX)
            .ok_or_else(|| CoreError::NotAnArchive(file_name.to_string()))?;
        Self::parse(stem)
    }

    /// Derive the name from a full path to an archive file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::NotAnArchive(path.display().to_string()))?;
        Self::from_file_name(file_name)
    }

    /// Returns the bare name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the archive on disk.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{ARCHIVE_SUFFIX}", self.0)
    }

    /// Location of the archive inside `dir`.
    #[must_use]
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Returns true if `path` names a file with the archive suffix.
#[must_use]
pub fn is_archive_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > ARCHIVE_SUFFIX.len() && n.ends_with(ARCHIVE_SUFFIX))
}

impl std::fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchiveName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ArchiveName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ArchiveName> for String {
    fn from(name: ArchiveName) -> Self {
        name.0
    }
}

impl std::str::FromStr for ArchiveName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
