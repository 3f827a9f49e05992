// -- submodules
mod file_role;
mod walk;

pub use file_role::FileRole;

// -- external imports
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;
use walk::walk_dataset;

/// One discovered dataset file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SamplePath {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Number of the bucket directory the file lives in (`01`, `02`, ...)
    pub dir_number: u32,

    /// 4-digit index embedded in the file name
    pub index: u32,
}

impl SamplePath {
    /// Embedded index formatted the way it appears in file names
    pub fn index_str(&self) -> String {
        format!("{:04}", self.index)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

impl AsRef<Path> for SamplePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Per-role path sequences, index-aligned when the dataset is complete
#[derive(Debug, Clone, Default)]
pub struct DiscoveredPaths {
    pub rgb: Vec<SamplePath>,
    pub pos: Vec<SamplePath>,
    pub neg: Vec<SamplePath>,
}

// -- public API

/// Collect every file of one role under `root`.
///
/// # Errors
///
/// Returns `AppError` if:
/// - `root` cannot be read
/// - A matching file sits in a directory whose name is not an integer
pub fn collect_role_paths(root: &Path, role: FileRole) -> Result<Vec<SamplePath>> {
    Ok(walk_dataset(root, &[role])?.pop().unwrap_or_default())
}

/// Gets the RGB image paths
pub fn get_rgb_paths(root: &Path) -> Result<Vec<SamplePath>> {
    collect_role_paths(root, FileRole::Rgb)
}

/// Gets the positive and negative rectangle file paths
pub fn get_rec_paths(root: &Path) -> Result<(Vec<SamplePath>, Vec<SamplePath>)> {
    let mut buckets = walk_dataset(root, &[FileRole::Positive, FileRole::Negative])?.into_iter();
    let pos = buckets.next().unwrap_or_default();
    let neg = buckets.next().unwrap_or_default();
    Ok((pos, neg))
}

/// Discover all three roles in a single walk.
pub fn discover_dataset(root: &Path) -> Result<DiscoveredPaths> {
    let mut buckets =
        walk_dataset(root, &[FileRole::Rgb, FileRole::Positive, FileRole::Negative])?.into_iter();

    let paths = DiscoveredPaths {
        rgb: buckets.next().unwrap_or_default(),
        pos: buckets.next().unwrap_or_default(),
        neg: buckets.next().unwrap_or_default(),
    };

    tracing::info!(
        "Discovered {} images, {} positive and {} negative annotation files",
        paths.rgb.len(),
        paths.pos.len(),
        paths.neg.len()
    );
    Ok(paths)
}

// -- tests

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use std::fs;
    use tempfile::TempDir;

    /// Lay out `samples` as `<root>/<dir>/pcd<idx>{r.png,cpos.txt,cneg.txt}` with empty files.
    pub(crate) fn touch_dataset(root: &Path, samples: &[(&str, u32)]) {
        for (dir, idx) in samples {
            let bucket = root.join(dir);
            fs::create_dir_all(&bucket).unwrap();
            for suffix in ["r.png", "cpos.txt", "cneg.txt"] {
                fs::write(bucket.join(format!("pcd{:04}{}", idx, suffix)), "").unwrap();
            }
        }
    }

    #[test]
    fn test_sorted_by_bucket_then_index() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(
            temp_dir.path(),
            &[("10", 1000), ("02", 250), ("02", 201), ("01", 199), ("01", 100)],
        );

        let rgb = get_rgb_paths(temp_dir.path()).unwrap();
        let order: Vec<(u32, u32)> = rgb.iter().map(|s| (s.dir_number, s.index)).collect();
        assert_eq!(
            order,
            vec![(1, 100), (1, 199), (2, 201), (2, 250), (10, 1000)]
        );
        assert!(rgb.iter().all(|s| s.path.is_absolute()));
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(temp_dir.path(), &[("03", 300), ("01", 101), ("01", 100)]);

        let first = discover_dataset(temp_dir.path()).unwrap();
        let second = discover_dataset(temp_dir.path()).unwrap();
        assert_eq!(first.rgb, second.rgb);
        assert_eq!(first.pos, second.pos);
        assert_eq!(first.neg, second.neg);
    }

    #[test]
    fn test_roles_are_index_aligned() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(
            temp_dir.path(),
            &[("01", 100), ("01", 101), ("02", 200), ("02", 201), ("03", 300), ("03", 301)],
        );

        let paths = discover_dataset(temp_dir.path()).unwrap();
        assert_eq!(paths.rgb.len(), 6);
        for ((rgb, pos), neg) in paths.rgb.iter().zip(&paths.pos).zip(&paths.neg) {
            assert_eq!(rgb.index_str(), pos.index_str());
            assert_eq!(rgb.index_str(), neg.index_str());
            assert_eq!(rgb.dir_number, neg.dir_number);
        }

        let (pos, neg) = get_rec_paths(temp_dir.path()).unwrap();
        assert_eq!(pos, paths.pos);
        assert_eq!(neg, paths.neg);
    }

    #[test]
    fn test_unrelated_files_and_empty_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(temp_dir.path(), &[("01", 100)]);
        fs::create_dir_all(temp_dir.path().join("02")).unwrap();
        fs::write(temp_dir.path().join("01/pcd0100d.tiff"), "").unwrap();
        fs::create_dir_all(temp_dir.path().join("backgrounds")).unwrap();
        fs::write(temp_dir.path().join("backgrounds/pcdb0002r.png"), "").unwrap();

        let paths = discover_dataset(temp_dir.path()).unwrap();
        assert_eq!(paths.rgb.len(), 1);
        assert_eq!(paths.rgb[0].file_name(), "pcd0100r.png");
    }

    #[test]
    fn test_non_numeric_bucket_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(temp_dir.path(), &[("01", 100), ("extra", 500)]);

        let err = get_rgb_paths(temp_dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Layout(_)), "got {err}");
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_dataset(&temp_dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
