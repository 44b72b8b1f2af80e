//! Private-key discovery on the local filesystem.

use std::path::{Path, PathBuf};

/// Conventional key locations probed, in order, when the operator supplies
/// no path.
const DEFAULT_KEYS: [&str; 2] = [".ssh/id_ed25519", ".ssh/id_rsa"];

/// How the operator's key-path answer resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// Operator supplied a path; tilde-expanded but NOT checked for
    /// existence — a missing file is discovered at use time.
    Supplied(PathBuf),
    /// Auto-detected under one of the default locations.
    Detected(PathBuf),
    /// Nothing supplied and nothing found.
    None,
}

/// Resolves the operator's answer to the key-path prompt against `home`.
#[must_use]
pub fn resolve_key_path(supplied: &str, home: &Path) -> KeyResolution {
    if !supplied.is_empty() {
        return KeyResolution::Supplied(expand_tilde(supplied, home));
    }
    for rel in DEFAULT_KEYS {
        let candidate = home.join(rel);
        if candidate.exists() {
            return KeyResolution::Detected(candidate);
        }
    }
    KeyResolution::None
}

/// Expands a leading `~` against `home`; other paths pass through.
#[must_use]
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(path)
}
