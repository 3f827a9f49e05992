use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::annotate::{VisualizeConfigs, create_vis};
use crate::error::{AppError, Result};
use crate::index::{GroundTruthIndex, build_index};
use crate::masks::{HttpMaskClient, MaskConfigs, MissedMask, create_masks, default_mask_dir};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunArgs {
    /// Dataset root holding the numbered bucket directories
    pub dataset_dir: PathBuf,

    /// Directory to save rectangle visualizations
    pub vis_dir: Option<PathBuf>,

    /// Where to write the index as JSON
    pub index_json: Option<PathBuf>,

    /// Visualization configurations
    #[serde(skip)]
    pub visualize: VisualizeConfigs,

    /// Mask server configurations
    #[serde(skip)]
    pub masks: MaskConfigs,
}

#[derive(Debug)]
pub struct RunOutput {
    pub index: GroundTruthIndex,

    /// Images the mask server gave nothing for
    pub missed: Vec<MissedMask>,
}

/// Build the ground-truth index, then visualize, request masks and export as configured.
pub fn run_pipeline(args: &RunArgs) -> Result<RunOutput> {
    let start_time = Instant::now();

    if args.dataset_dir.as_os_str().is_empty() {
        return Err(AppError::Config("dataset directory is not set".to_string()));
    }
    tracing::info!("[Dataset]: {:?}", args.dataset_dir);

    let mut index = build_index(&args.dataset_dir)?;

    if let Some(vis_dir) = &args.vis_dir {
        create_vis(vis_dir, &index, &args.visualize)?;
    }

    let mut missed = Vec::new();
    if args.masks.enabled {
        if index.is_empty() {
            tracing::warn!("No images indexed, skipping mask requests");
        } else {
            let mask_dir = match &args.masks.mask_dir {
                Some(dir) => dir.clone(),
                None => default_mask_dir(&index).ok_or_else(|| {
                    AppError::Config("cannot derive a mask directory, set mask_dir".to_string())
                })?,
            };
            let client = HttpMaskClient::new(&args.masks)?;
            missed = create_masks(&mut index, &client, &args.masks, &mask_dir)?.missed;
        }
    }

    if let Some(path) = &args.index_json {
        write_index_json(&index, path)?;
    }

    let duration = start_time.elapsed();
    tracing::info!("Total run time: {:.3?}", duration);

    Ok(RunOutput { index, missed })
}

/// Serialize the index to `path` as pretty-printed JSON
pub fn write_index_json(index: &GroundTruthIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, index)?;
    tracing::info!("Index written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::tests::touch_dataset;
    use image::RgbImage;
    use std::fs;
    use std::net::TcpListener;
    use tempfile::TempDir;

    fn dataset(root: &Path) {
        touch_dataset(root, &[("01", 100), ("02", 200)]);
        for rgb in ["01/pcd0100r.png", "02/pcd0200r.png"] {
            RgbImage::new(8, 8).save(root.join(rgb)).unwrap();
        }
        fs::write(root.join("01/pcd0100cpos.txt"), "1 1\n6 1\n6 6\n1 6\n").unwrap();
    }

    #[test]
    fn test_requires_dataset_dir() {
        let err = run_pipeline(&RunArgs::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_index_vis_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        dataset(&data_dir);

        let args = RunArgs {
            dataset_dir: data_dir,
            vis_dir: Some(temp_dir.path().join("vis")),
            index_json: Some(temp_dir.path().join("out/index.json")),
            ..Default::default()
        };
        let output = run_pipeline(&args).unwrap();

        assert_eq!(output.index.len(), 2);
        assert!(output.missed.is_empty());
        assert!(temp_dir.path().join("vis/pcd0100vis.png").is_file());
        assert!(temp_dir.path().join("vis/pcd0200vis.png").is_file());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp_dir.path().join("out/index.json")).unwrap())
                .unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_unreachable_mask_server_misses_every_image() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        dataset(&data_dir);
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let args = RunArgs {
            dataset_dir: data_dir.clone(),
            masks: MaskConfigs {
                enabled: true,
                port,
                timeout_secs: Some(5),
                use_system_proxy: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let output = run_pipeline(&args).unwrap();

        assert_eq!(output.missed.len(), 2);
        assert!(output.missed.iter().all(|m| m.reason.is_connectivity()));
        assert!(fs::canonicalize(&data_dir).unwrap().join("masks").is_dir());
        assert!(output.index.iter().all(|e| e.annotations.mask.is_none()));
    }
}
