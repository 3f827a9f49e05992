// -- submodules
mod draw;

pub use draw::{draw_rectangle, draw_rectangles};

// -- external imports
use indicatif::{ProgressFinish, ProgressIterator};
use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::index::GroundTruthIndex;
use crate::progress_bar::progress_bar_style;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizeConfigs {
    /// whether to draw negative rectangles as well
    pub include_negatives: bool,

    /// line thickness in pixels
    pub thickness: u32,

    /// RGB color of positive rectangles
    pub pos_color: [u8; 3],

    /// RGB color of negative rectangles
    pub neg_color: [u8; 3],
}

impl Default for VisualizeConfigs {
    fn default() -> Self {
        Self {
            include_negatives: false,
            thickness: 1,
            pos_color: [0, 255, 0],
            neg_color: [255, 0, 0],
        }
    }
}

/// Creates visualizations of the ground-truth rectangles as `<vis_dir>/pcd<index>vis.png`
pub fn create_vis(
    vis_dir: &Path,
    index: &GroundTruthIndex,
    configs: &VisualizeConfigs,
) -> Result<()> {
    std::fs::create_dir_all(vis_dir)?;
    tracing::info!("Writing visualizations to {:?}", vis_dir);

    for entry in index
        .iter()
        .progress_with_style(progress_bar_style())
        .with_message("Drawing rectangles")
        .with_finish(ProgressFinish::WithMessage("Finished".into()))
    {
        let rgb_path = &entry.rgb.path;
        let mut img = image::open(rgb_path)
            .map_err(|source| AppError::ImageLoad {
                path: rgb_path.clone(),
                source,
            })?
            .to_rgb8();

        draw_rectangles(&mut img, &entry.annotations, configs);

        let save_path = vis_dir.join(format!("pcd{}vis.png", entry.rgb.index_str()));
        img.save(&save_path)
            .map_err(|source| AppError::ImageSave {
                path: save_path.clone(),
                source,
            })?;
        tracing::debug!("Saved {:?}", save_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::tests::touch_dataset;
    use crate::index::build_index;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_vis_writes_one_file_per_image() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        touch_dataset(&data_dir, &[("01", 100), ("02", 205)]);
        for rgb in ["01/pcd0100r.png", "02/pcd0205r.png"] {
            RgbImage::new(16, 16).save(data_dir.join(rgb)).unwrap();
        }
        fs::write(data_dir.join("01/pcd0100cpos.txt"), "2 2\n10 2\n10 10\n2 10\n").unwrap();
        fs::write(data_dir.join("02/pcd0205cneg.txt"), "3 3\n9 3\n9 9\n3 9\n").unwrap();

        let index = build_index(&data_dir).unwrap();
        let vis_dir = temp_dir.path().join("vis/nested");
        let configs = VisualizeConfigs {
            include_negatives: true,
            ..Default::default()
        };
        create_vis(&vis_dir, &index, &configs).unwrap();

        let first = image::open(vis_dir.join("pcd0100vis.png")).unwrap().to_rgb8();
        assert_eq!(*first.get_pixel(2, 2), Rgb(configs.pos_color));

        let second = image::open(vis_dir.join("pcd0205vis.png")).unwrap().to_rgb8();
        assert_eq!(*second.get_pixel(3, 3), Rgb(configs.neg_color));
    }

    #[test]
    fn test_unreadable_image_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        touch_dataset(temp_dir.path(), &[("01", 100)]);

        let index = build_index(temp_dir.path()).unwrap();
        let err = create_vis(
            &temp_dir.path().join("vis"),
            &index,
            &VisualizeConfigs::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ImageLoad { .. }), "got {err}");
    }
}
