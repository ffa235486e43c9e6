//! Source tree traversal.
//!
//! Walks a backup source in depth order so parent directories always appear
//! before their contents, which lets the executor mirror the tree as it goes.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One unit of work discovered under a source root.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Full path of the source entry
    pub path: PathBuf,

    /// Path relative to the source root
    pub relative_path: PathBuf,

    pub is_dir: bool,
}

/// Walk a source root and collect every directory and file beneath it.
/// The root itself is not included.
pub fn walk_source(root: &Path) -> std::io::Result<Vec<SourceItem>> {
    let mut items = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walk failed on symlink loop"))
        })?;

        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

        items.push(SourceItem {
            is_dir: entry.file_type().is_dir(),
            path,
            relative_path,
        });
    }

    Ok(items)
}

/// Count the files under a root. Directories contribute 0, files contribute 1.
pub fn count_files(root: &Path) -> std::io::Result<u64> {
    let mut count = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walk failed on symlink loop"))
        })?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }

    Ok(count)
}
