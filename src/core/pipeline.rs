use crate::core::crs::is_in_reference_system;
use crate::core::map::{rebuild_styled_point_layer, MapSurface};
use crate::core::parser::parse_points;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    LayerSpec, LayerSummary, LayerUpdate, Point, PointRecord, PointSetSelection, PointsFormat,
    UnrecognizedPolicy,
};
use crate::utils::error::{MapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOptions {
    pub format: PointsFormat,
    pub on_unrecognized: UnrecognizedPolicy,
}

impl PipelineOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            format: config.points_format(),
            on_unrecognized: config.on_unrecognized(),
        }
    }
}

/// Reads one point file and turns it into one named layer.
pub struct PointFilePipeline<S: Storage> {
    storage: S,
    path: String,
    layer: LayerSpec,
    options: PipelineOptions,
}

impl<S: Storage> PointFilePipeline<S> {
    pub fn new(storage: S, path: impl Into<String>, layer: LayerSpec, options: PipelineOptions) -> Self {
        Self {
            storage,
            path: path.into(),
            layer,
            options,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Picks the column pair to draw: the source set if it is in the recognized
/// system, otherwise the target set if that one is.
pub fn select_point_set(
    records: &[PointRecord],
    layer: &LayerSpec,
    policy: UnrecognizedPolicy,
) -> Result<LayerUpdate> {
    let update = |points: Vec<Point>, selection| LayerUpdate {
        layer: layer.clone(),
        points,
        selection,
    };

    if records.is_empty() {
        tracing::warn!("No points in file for layer '{}', clearing it", layer.name);
        return Ok(update(Vec::new(), PointSetSelection::Nothing));
    }

    let source: Vec<Point> = records.iter().map(|r| r.source).collect();
    if is_in_reference_system(&source)? {
        tracing::debug!("Source coordinates of '{}' are in the recognized system", layer.name);
        return Ok(update(source, PointSetSelection::Source));
    }

    let target: Option<Vec<Point>> = records.iter().map(|r| r.target).collect();
    if let Some(target) = target {
        if is_in_reference_system(&target)? {
            tracing::debug!("Target coordinates of '{}' are in the recognized system", layer.name);
            return Ok(update(target, PointSetSelection::Target));
        }
    }

    match policy {
        UnrecognizedPolicy::Skip => {
            tracing::warn!(
                "Points for layer '{}' are not in a recognized reference system, nothing drawn",
                layer.name
            );
            Ok(update(Vec::new(), PointSetSelection::Nothing))
        }
        UnrecognizedPolicy::Local => {
            tracing::info!("Drawing '{}' in local display units", layer.name);
            Ok(update(source, PointSetSelection::Local))
        }
        UnrecognizedPolicy::Reject => Err(MapError::UnrecognizedSystem {
            layer: layer.name.clone(),
        }),
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for PointFilePipeline<S> {
    fn layer_name(&self) -> &str {
        &self.layer.name
    }

    async fn extract(&self) -> Result<Vec<PointRecord>> {
        tracing::debug!("Reading points for '{}' from {}", self.layer.name, self.path);
        let data = self.storage.read_file(&self.path).await?;
        let records = parse_points(&data, self.options.format)?;
        tracing::debug!("Parsed {} rows from {}", records.len(), self.path);
        Ok(records)
    }

    async fn transform(&self, records: Vec<PointRecord>) -> Result<LayerUpdate> {
        select_point_set(&records, &self.layer, self.options.on_unrecognized)
    }

    async fn load(&self, map: &mut MapSurface, update: LayerUpdate) -> Result<LayerSummary> {
        rebuild_styled_point_layer(
            map,
            &update.layer,
            &update.points,
            update.source_is_known_system(),
        )?;

        Ok(LayerSummary {
            layer: update.layer.name,
            drawn_points: update.points.len(),
            selection: update.selection,
        })
    }
}
