//! Configuration parsing for qpm
//!
//! This crate reads and writes the project manifest (`qilletni_info.yml`) and
//! lock file (`qilletni.lock`), and loads the user settings that point the client at a
//! registry.

pub mod lockfile;
pub mod manifest;
pub mod settings;

pub use lockfile::{parse_lock_file, serialize_lock_file, LOCK_FILE_NAME, LOCK_FORMAT_VERSION};
pub use manifest::{
    find_manifest, parse_manifest, serialize_manifest, Manifest, ManifestLocation, MANIFEST_FILE_NAME,
};
pub use settings::{Settings, SettingsLoader, DEFAULT_REGISTRY_URL};

use qpm_core::error::QpmError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, QpmError>;

/// 1-based line and column of a byte offset
pub(crate) fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit_once('\n')
        .map_or(before, |(_, rest)| rest)
        .chars()
        .count()
        + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let content = "a = 1\nbb = 2\n";
        assert_eq!(line_column(content, 0), (1, 1));
        assert_eq!(line_column(content, 6), (2, 1));
        assert_eq!(line_column(content, 9), (2, 4));
        assert_eq!(line_column(content, 1000), (3, 1));
    }
}
