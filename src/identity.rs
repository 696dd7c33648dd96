//! Sample identity derivation.
//!
//! Every indexed file is keyed by a canonical string built from its
//! normalized absolute path. The same string is the vector store's primary
//! key and the token used to skip files that are already indexed.
//!
//! Normalization is purely lexical: relative paths are joined onto the
//! current working directory, `.` components are dropped, `..` pops the
//! preceding component, and repeated separators collapse. Symlinks are not
//! resolved, so two links to the same file are two samples.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical identity of an indexed sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    /// Derive the identity for a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let normalized = normalize_path(path)?;
        Ok(Self(normalized.to_string_lossy().into_owned()))
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SampleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Make a path absolute and lexically normalized.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(lexical_normalize(&absolute))
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_paths_share_identity() {
        let a = SampleId::from_path(Path::new("/samples/drums/./kicks/../kicks/kick.wav")).unwrap();
        let b = SampleId::from_path(Path::new("/samples//drums/kicks/kick.wav")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "/samples/drums/kicks/kick.wav");
    }

    #[test]
    fn test_distinct_paths_have_distinct_identities() {
        let a = SampleId::from_path(Path::new("/samples/kick.wav")).unwrap();
        let b = SampleId::from_path(Path::new("/samples/Kick.wav")).unwrap();
        let c = SampleId::from_path(Path::new("/samples/drums/kick.wav")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_relative_paths_resolve_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let id = SampleId::from_path(Path::new("loops/../pad.wav")).unwrap();
        assert_eq!(id.as_str(), cwd.join("pad.wav").to_string_lossy());
    }

    #[test]
    fn test_parent_at_root_is_clamped() {
        let id = SampleId::from_path(Path::new("/../../hat.wav")).unwrap();
        assert_eq!(id.as_str(), "/hat.wav");
    }

    #[test]
    fn test_identity_is_deterministic() {
        let path = Path::new("/a/b/../c/snare.mp3");
        let first = SampleId::from_path(path).unwrap();
        let second = SampleId::from_path(path).unwrap();
        assert_eq!(first, second);
    }
}
