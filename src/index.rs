use indicatif::{ProgressFinish, ProgressIterator};
use serde::Serialize;
use serde::ser::Serializer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::discover::{SamplePath, discover_dataset};
use crate::error::{AppError, Result};
use crate::masks::MaskRecord;
use crate::progress_bar::progress_bar_style;
use crate::rectangle::{Rectangle, find_rec_points};

/// Ground-truth rectangles of one image
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationSet {
    /// Graspable rectangles
    pub pos: Vec<Rectangle>,

    /// Non-graspable rectangles
    pub neg: Vec<Rectangle>,

    /// Instance masks, attached by the mask uploader
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskRecord>,
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub rgb: SamplePath,
    pub annotations: AnnotationSet,
}

/// Image path -> annotation set, in discovery order
#[derive(Debug, Clone, Default)]
pub struct GroundTruthIndex {
    entries: Vec<IndexEntry>,

    /// Image path -> position in `entries`
    positions: HashMap<PathBuf, usize>,
}

impl GroundTruthIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `annotations` for `rgb`, replacing the value in place if the path is already a key.
    pub fn insert(&mut self, rgb: SamplePath, annotations: AnnotationSet) {
        match self.positions.get(&rgb.path) {
            Some(&position) => self.entries[position].annotations = annotations,
            None => {
                self.positions.insert(rgb.path.clone(), self.entries.len());
                self.entries.push(IndexEntry { rgb, annotations });
            }
        }
    }

    pub fn get(&self, rgb_path: &Path) -> Option<&AnnotationSet> {
        let &position = self.positions.get(rgb_path)?;
        Some(&self.entries[position].annotations)
    }

    pub fn get_mut(&mut self, rgb_path: &Path) -> Option<&mut AnnotationSet> {
        let &position = self.positions.get(rgb_path)?;
        Some(&mut self.entries[position].annotations)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, IndexEntry> {
        self.entries.iter_mut()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.rgb.path.as_path())
    }
}

impl<'a> IntoIterator for &'a GroundTruthIndex {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serialized as a JSON object keyed by image path
impl Serialize for GroundTruthIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .map(|e| (e.rgb.path.to_string_lossy(), &e.annotations)),
        )
    }
}

// -- public API

/// Makes the ground-truth index from index-aligned path sequences.
///
/// # Errors
///
/// Returns `AppError` if:
/// - The three sequences differ in length
/// - Entries at the same position belong to different samples
/// - An annotation file cannot be read or parsed
pub fn make_gt_dict(
    rgb: &[SamplePath],
    pos: &[SamplePath],
    neg: &[SamplePath],
) -> Result<GroundTruthIndex> {
    check_alignment(rgb, pos, neg)?;

    let mut index = GroundTruthIndex::new();
    for ((rgb, pos), neg) in rgb
        .iter()
        .zip(pos)
        .zip(neg)
        .progress_with_style(progress_bar_style())
        .with_message("Parsing annotations")
        .with_finish(ProgressFinish::WithMessage("Parsed".into()))
    {
        let annotations = AnnotationSet {
            pos: find_rec_points(&pos.path)?,
            neg: find_rec_points(&neg.path)?,
            mask: None,
        };
        index.insert(rgb.clone(), annotations);
    }

    tracing::info!("Indexed {} images", index.len());
    Ok(index)
}

/// Discover the dataset under `root` and build its index.
pub fn build_index(root: &Path) -> Result<GroundTruthIndex> {
    let paths = discover_dataset(root)?;
    make_gt_dict(&paths.rgb, &paths.pos, &paths.neg)
}

fn check_alignment(rgb: &[SamplePath], pos: &[SamplePath], neg: &[SamplePath]) -> Result<()> {
    if rgb.len() != pos.len() || rgb.len() != neg.len() {
        return Err(AppError::MisalignedDataset(format!(
            "found {} images, {} positive and {} negative annotation files",
            rgb.len(),
            pos.len(),
            neg.len()
        )));
    }

    for (position, ((rgb, pos), neg)) in rgb.iter().zip(pos).zip(neg).enumerate() {
        let key = (rgb.dir_number, rgb.index);
        if key != (pos.dir_number, pos.index) || key != (neg.dir_number, neg.index) {
            return Err(AppError::MisalignedDataset(format!(
                "entry {} pairs {:?} with {:?} and {:?}",
                position, rgb.path, pos.path, neg.path
            )));
        }
    }
    Ok(())
}

// -- tests
