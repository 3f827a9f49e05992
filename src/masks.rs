// -- submodules
mod client;
mod payload;

pub use client::HttpMaskClient;
pub use payload::Prediction;

// -- external imports
use image::imageops::{self, FilterType};
use image::{DynamicImage, EncodableLayout, GrayImage, ImageBuffer, Luma, PixelWithColorType};
use indicatif::{ProgressFinish, ProgressIterator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::discover::SamplePath;
use crate::error::{AppError, Result};
use crate::index::GroundTruthIndex;
use crate::progress_bar::progress_bar_style;

/// Size of the debug preview written next to each visualization
const PREVIEW_SIZE: (u32, u32) = (1200, 900);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaskConfigs {
    /// whether to request masks at all
    pub enabled: bool,

    /// host of the segmentation server
    pub host: String,

    /// port of the segmentation server
    pub port: u16,

    /// where to write masks (defaults to `masks/` beside the bucket directories)
    pub mask_dir: Option<PathBuf>,

    /// request timeout, `None` waits indefinitely
    pub timeout_secs: Option<u64>,

    /// honor `HTTP_PROXY` and friends
    pub use_system_proxy: bool,

    /// log every prediction and write resized previews
    pub debug: bool,
}

impl Default for MaskConfigs {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 665,
            mask_dir: None,
            timeout_secs: None,
            use_system_proxy: true,
            debug: false,
        }
    }
}

impl MaskConfigs {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Why an image got no masks
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("request failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("server sent an empty response")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("cannot decode returned image: {0}")]
    ImageDecode(String),

    #[error("cannot encode image for upload: {0}")]
    Encode(String),
}

impl UploadError {
    /// The server could not be reached or the transfer broke off
    pub fn is_connectivity(&self) -> bool {
        matches!(self, UploadError::Connection(_))
    }
}

/// Anything that turns an image into instance masks
pub trait MaskPredictor {
    fn predict(&self, image: &DynamicImage) -> Result<Prediction, UploadError>;
}

/// Masks attached to an annotation set
#[derive(Debug, Clone, Serialize)]
pub struct MaskRecord {
    /// `[x1, y1, x2, y2]` per instance
    pub boxes: Vec<[f32; 4]>,
    pub labels: Vec<i64>,
    pub scores: Vec<f32>,

    /// Binary masks (0 or 255)
    #[serde(skip)]
    pub masks: Vec<GrayImage>,

    /// Where each mask was written
    pub mask_paths: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct MissedMask {
    pub path: PathBuf,
    pub reason: UploadError,
}

#[derive(Debug, Default)]
pub struct MaskReport {
    /// Images that received masks
    pub masked: usize,

    /// Images that did not, in index order
    pub missed: Vec<MissedMask>,
}

impl MaskReport {
    pub fn missed_paths(&self) -> impl Iterator<Item = &Path> {
        self.missed.iter().map(|m| m.path.as_path())
    }
}

// -- public API

/// `masks/` next to the bucket directory of the first indexed image
pub fn default_mask_dir(index: &GroundTruthIndex) -> Option<PathBuf> {
    let first = index.paths().next()?;
    let data_dir = first.parent()?.parent()?;
    Some(data_dir.join("masks"))
}

/// Requests masks for every image in the index.
///
/// Successful predictions are written to `mask_dir` and attached to the index. A failed upload
/// only marks its image as missed and processing continues.
///
/// # Errors
///
/// Returns `AppError` if an image cannot be read or an output cannot be written.
pub fn create_masks<P: MaskPredictor + ?Sized>(
    index: &mut GroundTruthIndex,
    predictor: &P,
    configs: &MaskConfigs,
    mask_dir: &Path,
) -> Result<MaskReport> {
    std::fs::create_dir_all(mask_dir)?;
    tracing::info!("Requesting masks from {}, saving to {:?}", configs.url(), mask_dir);

    let mut report = MaskReport::default();
    for entry in index
        .iter_mut()
        .progress_with_style(progress_bar_style())
        .with_message("Requesting masks")
        .with_finish(ProgressFinish::WithMessage("Finished".into()))
    {
        let rgb = &entry.rgb;
        let frame = image::open(&rgb.path).map_err(|source| AppError::ImageLoad {
            path: rgb.path.clone(),
            source,
        })?;

        let prediction = match predictor.predict(&frame) {
            Ok(prediction) => prediction,
            Err(reason) => {
                tracing::warn!("No masks for {:?}: {}", rgb.path, reason);
                report.missed.push(MissedMask {
                    path: rgb.path.clone(),
                    reason,
                });
                continue;
            }
        };

        if configs.debug {
            log_prediction(rgb, &prediction);
        }

        let record = save_prediction(rgb, prediction, mask_dir, configs.debug)?;
        entry.annotations.mask = Some(record);
        report.masked += 1;
    }

    tracing::info!(
        "Masks created for {} images, missed {}",
        report.masked,
        report.missed.len()
    );
    Ok(report)
}

fn save_prediction(
    rgb: &SamplePath,
    prediction: Prediction,
    mask_dir: &Path,
    preview: bool,
) -> Result<MaskRecord> {
    let fnum = rgb.index_str();

    let vis_path = mask_dir.join(format!("pred{}maskvis.png", fnum));
    save_image(&prediction.visualization, &vis_path)?;

    if preview {
        let (w, h) = PREVIEW_SIZE;
        let resized = imageops::resize(&prediction.visualization, w, h, FilterType::Triangle);
        save_image(
            &resized,
            &mask_dir.join(format!("pred{}maskvis_preview.png", fnum)),
        )?;
    }

    let mut masks = Vec::with_capacity(prediction.masks.len());
    let mut mask_paths = Vec::with_capacity(prediction.masks.len());
    for (count, mut mask) in prediction.masks.into_iter().enumerate() {
        binarize(&mut mask);
        let mask_path = mask_dir.join(format!("pred{}mask{:02}.png", fnum, count));
        save_image(&mask, &mask_path)?;
        masks.push(mask);
        mask_paths.push(mask_path);
    }

    Ok(MaskRecord {
        boxes: prediction.boxes,
        labels: prediction.labels,
        scores: prediction.scores,
        masks,
        mask_paths,
    })
}

fn binarize(mask: &mut GrayImage) {
    for pixel in mask.pixels_mut() {
        if pixel.0[0] > 0 {
            *pixel = Luma([255]);
        }
    }
}

fn save_image<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>, path: &Path) -> Result<()>
where
    P: PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
{
    img.save(path).map_err(|source| AppError::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}

fn log_prediction(rgb: &SamplePath, prediction: &Prediction) {
    tracing::info!("{}: {} instances", rgb.file_name(), prediction.boxes.len());
    for ((bbox, label), score) in prediction
        .boxes
        .iter()
        .zip(&prediction.labels)
        .zip(&prediction.scores)
    {
        tracing::info!("  label {} score {:.3} box {:?}", label, score, bbox);
    }
}

// -- tests
