pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, LayerSource, RunSettings};

pub use core::{
    crs::{is_in_reference_system, GGRS87},
    engine::LayerEngine,
    map::{rebuild_point_layer, MapSurface},
    pipeline::{PipelineOptions, PointFilePipeline},
    session::{MapSession, UpdateOutcome},
};
pub use utils::error::{MapError, Result};
