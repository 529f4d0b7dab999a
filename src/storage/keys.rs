//! Key-space helpers.
//!
//! Keys are flat strings. `/` is only a naming convention, so prefix
//! listing has to be a string filter, while the backends we list from think
//! in directories. These helpers bridge the two.

/// Normalize a caller key for the backend (no leading slash).
pub fn normalize_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

/// Whether `key` has a `..` segment, which a filesystem would resolve
/// outside the store root.
pub fn has_parent_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment == "..")
}

/// The directory the backend has to list to see every key starting with
/// `prefix`.
///
/// `"images/2024/ab"` lists `"images/2024/"`, `"images"` lists the root, and
/// an empty prefix lists the root.
pub fn listing_root(prefix: &str) -> &str {
    let prefix = normalize_key(prefix);
    match prefix.rfind('/') {
        Some(idx) => &prefix[..=idx],
        None => "/",
    }
}

/// Whether a listed key belongs to the requested prefix.
pub fn matches_prefix(key: &str, prefix: &str) -> bool {
    key.starts_with(normalize_key(prefix))
}

/// Directory entries come back with a trailing slash; they are not keys.
pub fn is_directory_marker(path: &str) -> bool {
    path.is_empty() || path.ends_with('/')
}
