use std::path::Path;
use walkdir::WalkDir;

use crate::error::{AppError, Result};

use super::SamplePath;
use super::file_role::FileRole;

/// Walk `root` once and bucket matching files by role, in `roles` order.
///
/// Entries are visited in file-name order so two walks over an unchanged tree agree.
/// The returned vectors are sorted by (bucket directory number, embedded index).
pub fn walk_dataset(root: &Path, roles: &[FileRole]) -> Result<Vec<Vec<SamplePath>>> {
    let root = std::fs::canonicalize(root)?;
    let mut buckets: Vec<Vec<SamplePath>> = vec![Vec::new(); roles.len()];

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };

        for (slot, role) in roles.iter().enumerate() {
            if let Some(index) = role.embedded_index(file_name) {
                let path = entry.path().to_path_buf();
                let dir_number = bucket_number(&path)?;
                buckets[slot].push(SamplePath {
                    path,
                    dir_number,
                    index,
                });
                break;
            }
        }
    }

    for (bucket, role) in buckets.iter_mut().zip(roles) {
        bucket.sort_by_key(|s| (s.dir_number, s.index));
        tracing::debug!("Discovered {} {} files under {:?}", bucket.len(), role, root);
    }

    Ok(buckets)
}

/// Numeric name of the directory holding `path`
fn bucket_number(path: &Path) -> Result<u32> {
    let dir_name = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Layout(format!("{:?} has no named parent directory", path)))?;

    dir_name.trim().parse::<u32>().map_err(|_| {
        AppError::Layout(format!(
            "directory {:?} holding {:?} is not a numbered bucket",
            dir_name,
            path.file_name().unwrap_or_default()
        ))
    })
}
