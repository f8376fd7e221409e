//! Source tree planning and per-file copy for the CLI host.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One file to transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Path relative to the source root
    pub relative: PathBuf,
    pub size: u64,
}

/// All files under a source root, in a stable order.
#[derive(Debug, Default)]
pub struct TransferPlan {
    pub files: Vec<PlannedFile>,
    pub total_bytes: u64,
}

/// Walk `source` and map every regular file onto `destination_root`.
pub fn plan_tree(source: &Path, destination_root: &Path) -> io::Result<TransferPlan> {
    fn recurse(
        dir: &Path,
        rel_path: &Path,
        destination_root: &Path,
        files: &mut Vec<PlannedFile>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let rel_full_path = rel_path.join(entry.file_name());

            if metadata.is_dir() {
                recurse(&entry.path(), &rel_full_path, destination_root, files)?;
            } else {
                files.push(PlannedFile {
                    source: entry.path(),
                    destination: destination_root.join(&rel_full_path),
                    relative: rel_full_path,
                    size: metadata.len(),
                });
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    recurse(source, Path::new(""), destination_root, &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    let total_bytes = files.iter().map(|f| f.size).sum();
    Ok(TransferPlan { files, total_bytes })
}

/// Copy one file, creating parent directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(src, dst)
}

/// Copy then remove the source.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = copy_file(src, dst)?;
    fs::remove_file(src)?;
    Ok(bytes)
}
