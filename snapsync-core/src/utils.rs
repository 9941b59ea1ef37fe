//! Remote path handling. Remote paths are `/`-separated strings regardless
//! of the local platform.

use std::path::Path;

pub fn as_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Join a directory and a child segment, tolerating trailing slashes.
pub fn join_remote(dir: &str, name: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() {
        // Either an empty dir (stays relative) or a bare "/" (stays absolute).
        if dir.starts_with('/') {
            return format!("/{name}");
        }
        return name.to_string();
    }
    format!("{trimmed}/{name}")
}

/// Join a remote directory with a relative local path, converting the
/// platform separator.
pub fn join_remote_rel(dir: &str, rel: &Path) -> String {
    join_remote(dir, &as_posix(rel))
}

/// Ordered chain of path prefixes, shortest first, preserving absoluteness:
/// `a/b/c` → `a`, `a/b`, `a/b/c`; `/x/y` → `/x`, `/x/y`.
pub fn remote_prefixes(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if current.is_empty() {
            if absolute {
                current.push('/');
            }
        } else {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Parent of a remote path, `None` for a single relative segment.
pub fn remote_parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 {
        Some("/")
    } else {
        Some(&trimmed[..idx])
    }
}

/// Final segment of a remote path.
pub fn remote_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
