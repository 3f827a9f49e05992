use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pipeline::RunArgs;
use crate::toml_utils::parse_toml;

/// Index grasp-rectangle ground truth, draw it, and optionally fetch instance masks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dataset root holding the numbered bucket directories
    #[arg(value_name = "DATASET_DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Directory to save rectangle visualizations
    #[arg(value_name = "VIS_DIR")]
    pub vis_dir: Option<PathBuf>,

    /// Any value also draws negative rectangles
    #[arg(value_name = "INCLUDE_NEGATIVES")]
    pub include_negatives: Option<String>,

    /// TOML config file; command-line values take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request instance masks from the segmentation server
    #[arg(long)]
    pub masks: bool,

    /// Segmentation server host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Segmentation server port
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Directory to save masks
    #[arg(long, value_name = "DIR")]
    pub mask_dir: Option<PathBuf>,

    /// Write the index as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub index_json: Option<PathBuf>,

    /// Log every prediction and save resized previews
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Merge the optional TOML config with command-line values.
    pub fn into_run_args(self) -> Result<RunArgs> {
        let mut args = match &self.config {
            Some(toml_path) => {
                let project_root = toml_path.parent().unwrap_or(Path::new("."));
                parse_toml(toml_path, project_root)?
            }
            None => RunArgs::default(),
        };

        if let Some(dataset_dir) = self.dataset_dir {
            args.dataset_dir = dataset_dir;
        }
        if self.vis_dir.is_some() {
            args.vis_dir = self.vis_dir;
        }
        if self.include_negatives.is_some() {
            args.visualize.include_negatives = true;
        }
        if self.index_json.is_some() {
            args.index_json = self.index_json;
        }

        let masks = &mut args.masks;
        masks.enabled |= self.masks;
        masks.debug |= self.debug;
        if let Some(host) = self.host {
            masks.host = host;
        }
        if let Some(port) = self.port {
            masks.port = port;
        }
        if self.mask_dir.is_some() {
            masks.mask_dir = self.mask_dir;
        }

        Ok(args)
    }
}
