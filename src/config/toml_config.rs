use crate::core::ConfigProvider;
use crate::domain::model::{LayerSpec, PointStyle, PointsFormat, UnrecognizedPolicy};
use crate::utils::error::{MapError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_OUTPUT_PATH: &str = "./output/map.geojson";
pub const DEFAULT_WIDTH_PX: u32 = 800;
pub const DEFAULT_HEIGHT_PX: u32 = 600;
pub const MAX_SIZE_PX: u32 = 16384;
pub const POINT_FILE_EXTENSIONS: [&str; 5] = ["csv", "txt", "tsv", "dat", "xyz"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: Option<InputConfig>,
    pub map: Option<MapConfig>,
    pub classification: Option<ClassificationConfig>,
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub format: Option<PointsFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub background_tiles: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub on_unrecognized: Option<UnrecognizedPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub file: String,
    pub stroke_color: Option<String>,
}

impl LayerConfig {
    pub fn layer_spec(&self) -> LayerSpec {
        match &self.stroke_color {
            Some(color) => LayerSpec::new(self.name.clone(), PointStyle::circle(color)),
            None => LayerSpec::named(&self.name),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${POINTS_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(output) = &self.output {
            crate::utils::validation::validate_path("output.path", &output.path)?;
        }

        let (width, height) = self.map_size();
        crate::utils::validation::validate_range("map.width_px", width, 1, MAX_SIZE_PX)?;
        crate::utils::validation::validate_range("map.height_px", height, 1, MAX_SIZE_PX)?;

        validate_layers(
            self.layers
                .iter()
                .map(|l| (l.name.as_str(), l.file.as_str())),
        )
    }

    pub fn points_format(&self) -> PointsFormat {
        self.input.as_ref().and_then(|i| i.format).unwrap_or_default()
    }

    pub fn on_unrecognized(&self) -> UnrecognizedPolicy {
        self.classification
            .as_ref()
            .and_then(|c| c.on_unrecognized)
            .unwrap_or_default()
    }

    pub fn output_path(&self) -> &str {
        self.output
            .as_ref()
            .map(|o| o.path.as_str())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    pub fn map_size(&self) -> (u32, u32) {
        let map = self.map.as_ref();
        (
            map.and_then(|m| m.width_px).unwrap_or(DEFAULT_WIDTH_PX),
            map.and_then(|m| m.height_px).unwrap_or(DEFAULT_HEIGHT_PX),
        )
    }

    pub fn background_tiles(&self) -> bool {
        self.map
            .as_ref()
            .and_then(|m| m.background_tiles)
            .unwrap_or(true)
    }
}

/// Layer names must be non-empty and unique; files need a text extension.
pub fn validate_layers<'a>(layers: impl Iterator<Item = (&'a str, &'a str)>) -> Result<()> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for (name, file) in layers {
        crate::utils::validation::validate_non_empty_string("layers.name", name)?;
        crate::utils::validation::validate_path("layers.file", file)?;
        if !seen.insert(name) {
            return Err(MapError::InvalidConfigValueError {
                field: "layers.name".to_string(),
                value: name.to_string(),
                reason: "Layer names must be unique".to_string(),
            });
        }
        files.push(file.to_string());
    }

    crate::utils::validation::validate_file_extensions("layers.file", &files, &POINT_FILE_EXTENSIONS)
}

impl ConfigProvider for TomlConfig {
    fn points_format(&self) -> PointsFormat {
        self.points_format()
    }

    fn on_unrecognized(&self) -> UnrecognizedPolicy {
        self.on_unrecognized()
    }

    fn output_path(&self) -> &str {
        self.output_path()
    }

    fn map_size(&self) -> (u32, u32) {
        self.map_size()
    }

    fn background_tiles(&self) -> bool {
        self.background_tiles()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
