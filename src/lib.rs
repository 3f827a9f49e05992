mod annotate;
mod cli;
mod discover;
mod error;
mod index;
mod logging;
mod masks;
mod pipeline;
mod progress_bar;
mod rectangle;
mod toml_utils;

pub use annotate::{VisualizeConfigs, create_vis, draw_rectangle, draw_rectangles};
pub use cli::Cli;
pub use discover::{
    DiscoveredPaths, FileRole, SamplePath, collect_role_paths, discover_dataset, get_rec_paths,
    get_rgb_paths,
};
pub use error::{AppError, Result};
pub use index::{AnnotationSet, GroundTruthIndex, IndexEntry, build_index, make_gt_dict};
pub use logging::init_logger;
pub use masks::{
    HttpMaskClient, MaskConfigs, MaskPredictor, MaskRecord, MaskReport, MissedMask, Prediction,
    UploadError, create_masks, default_mask_dir,
};
pub use progress_bar::progress_bar_style;
pub use rectangle::{ParsedRectangles, Point, Rectangle, find_rec_points, parse_rectangles};
pub use toml_utils::parse_toml;

// Core run function
pub use pipeline::{RunArgs, RunOutput, run_pipeline, write_index_json};
