// -- imports
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::annotate::VisualizeConfigs;
use crate::error::{AppError, Result};
use crate::masks::MaskConfigs;
use crate::pipeline::RunArgs;

// -- config

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    run: RunArgs,
    visualize: VisualizeConfigs,
    masks: MaskConfigs,
}

impl TomlConfig {
    /// Parse TOML config file with explicit project root for path resolution.
    ///
    /// # Arguments
    ///
    /// * `toml_path` - Path to the TOML config file
    /// * `project_root` - Base directory for resolving relative paths
    ///
    /// # Errors
    ///
    /// Returns `AppError` if:
    /// - The path is not a valid toml file
    /// - File read fails
    /// - TOML parsing fails
    pub fn from_toml(toml_path: &Path, project_root: &Path) -> Result<Self> {
        if !toml_path.is_file() || toml_path.extension().is_none_or(|ext| ext != "toml") {
            return Err(AppError::Config(format!(
                "TOML config path is not a valid .toml file: {:?}",
                toml_path
            )));
        }

        let content = std::fs::read_to_string(toml_path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.resolve_paths(project_root);

        // Transfer section configs to run args
        config.run.visualize = config.visualize.clone();
        config.run.masks = config.masks.clone();

        Ok(config)
    }

    /// Resolve relative paths against project root
    fn resolve_paths(&mut self, project_root: &Path) {
        let resolve = |p: &mut PathBuf| {
            if !p.as_os_str().is_empty() && !p.is_absolute() {
                *p = project_root.join(&*p);
            }
        };

        resolve(&mut self.run.dataset_dir);
        if let Some(vis_dir) = self.run.vis_dir.as_mut() {
            resolve(vis_dir);
        }
        if let Some(index_json) = self.run.index_json.as_mut() {
            resolve(index_json);
        }
        if let Some(mask_dir) = self.masks.mask_dir.as_mut() {
            resolve(mask_dir);
        }
    }
}

impl From<TomlConfig> for RunArgs {
    fn from(config: TomlConfig) -> Self {
        config.run
    }
}

// -- public API

/// Parse TOML config file and return RunArgs.
///
/// # Arguments
///
/// * `toml_path` - Path to the TOML config file
/// * `project_root` - Base directory for resolving relative paths
///
/// # Errors
///
/// Returns `AppError` if TOML parsing or path resolution fails.
pub fn parse_toml(toml_path: &Path, project_root: &Path) -> Result<RunArgs> {
    TomlConfig::from_toml(toml_path, project_root).map(Into::into)
}

// -- tests
