pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{LayerSpec, PointsFormat, UnrecognizedPolicy, REFERENCE_POINTS, VALIDATION_POINTS};
use crate::utils::error::{MapError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use toml_config::{validate_layers, TomlConfig, MAX_SIZE_PX};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "survmap")]
#[command(about = "Put surveyed point files on a Web Mercator map")]
pub struct CliConfig {
    /// TOML configuration file; command line values override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Reference points file
    #[arg(long)]
    pub reference_points: Option<String>,

    /// Validation points file
    #[arg(long)]
    pub validation_points: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<PointsFormat>,

    /// What to do with points outside GGRS87 / Greek Grid
    #[arg(long, value_enum)]
    pub on_unrecognized: Option<UnrecognizedPolicy>,

    /// Where to write the GeoJSON map snapshot
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long, help = "Do not add the background tile layer")]
    pub no_background: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併 TOML 設定與命令列參數，命令列優先
    pub fn resolve(&self) -> Result<RunSettings> {
        let mut settings = match &self.config {
            Some(path) => RunSettings::from_toml(&TomlConfig::from_file(path)?),
            None => RunSettings::default(),
        };

        if let Some(file) = &self.reference_points {
            settings.set_layer(LayerSpec::reference_points(), file);
        }
        if let Some(file) = &self.validation_points {
            settings.set_layer(LayerSpec::validation_points(), file);
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(policy) = self.on_unrecognized {
            settings.on_unrecognized = policy;
        }
        if let Some(output) = &self.output {
            settings.output_path = output.clone();
        }
        if let Some(width) = self.width {
            settings.width_px = width;
        }
        if let Some(height) = self.height {
            settings.height_px = height;
        }
        if self.no_background {
            settings.background_tiles = false;
        }

        Ok(settings)
    }
}

/// A point file bound to the layer it is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSource {
    pub layer: LayerSpec,
    pub file: String,
}

/// Everything a run needs, after merging the config file and the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub layers: Vec<LayerSource>,
    pub format: PointsFormat,
    pub on_unrecognized: UnrecognizedPolicy,
    pub output_path: String,
    pub width_px: u32,
    pub height_px: u32,
    pub background_tiles: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

impl RunSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let (width_px, height_px) = config.map_size();
        Self {
            layers: config
                .layers
                .iter()
                .map(|l| LayerSource {
                    layer: l.layer_spec(),
                    file: l.file.clone(),
                })
                .collect(),
            format: config.points_format(),
            on_unrecognized: config.on_unrecognized(),
            output_path: config.output_path().to_string(),
            width_px,
            height_px,
            background_tiles: config.background_tiles(),
        }
    }

    /// Binds `file` to `layer`, replacing any file already bound to that name.
    pub fn set_layer(&mut self, layer: LayerSpec, file: &str) {
        match self.layers.iter_mut().find(|s| s.layer.name == layer.name) {
            Some(existing) => existing.file = file.to_string(),
            None => self.layers.push(LayerSource {
                layer,
                file: file.to_string(),
            }),
        }
    }

    /// Reference points first, validation points second, anything else after.
    pub fn ordered_layers(&self) -> Vec<&LayerSource> {
        let rank = |name: &str| match name {
            REFERENCE_POINTS => 0,
            VALIDATION_POINTS => 1,
            _ => 2,
        };
        let mut layers: Vec<&LayerSource> = self.layers.iter().collect();
        layers.sort_by_key(|s| rank(&s.layer.name));
        layers
    }
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(MapError::MissingConfigError {
                field: "layers (or --reference-points / --validation-points)".to_string(),
            });
        }

        crate::utils::validation::validate_path("output.path", &self.output_path)?;
        crate::utils::validation::validate_range("map.width_px", self.width_px, 1, MAX_SIZE_PX)?;
        crate::utils::validation::validate_range("map.height_px", self.height_px, 1, MAX_SIZE_PX)?;

        validate_layers(
            self.layers
                .iter()
                .map(|s| (s.layer.name.as_str(), s.file.as_str())),
        )
    }
}

impl ConfigProvider for RunSettings {
    fn points_format(&self) -> PointsFormat {
        self.format
    }

    fn on_unrecognized(&self) -> UnrecognizedPolicy {
        self.on_unrecognized
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn map_size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    fn background_tiles(&self) -> bool {
        self.background_tiles
    }
}
