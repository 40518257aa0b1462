use common::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists regular files under `root` (recursively) whose extension is one of
/// `extensions`, in file-name order.
pub fn list_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));

        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
