use crate::core::map::MapSurface;
use crate::core::Pipeline;
use crate::domain::model::{LayerSummary, LayerUpdate};
use crate::utils::error::Result;
use std::time::Instant;

/// Runs a pipeline against a map: extract, transform, load.
pub struct LayerEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> LayerEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self, map: &mut MapSurface) -> Result<LayerSummary> {
        let layer = self.pipeline.layer_name();
        let started = Instant::now();
        tracing::info!("Updating layer '{}'", layer);

        let update = match self.prepare().await {
            Ok(update) => update,
            Err(e) => {
                // 新的選擇失敗時，舊檔案的點也不應留在地圖上
                let removed = map.remove_layer(layer);
                tracing::warn!("Layer '{}' cleared after failed update ({} removed)", layer, removed);
                return Err(e);
            }
        };
        tracing::debug!(
            "Selected {:?} with {} points",
            update.selection,
            update.points.len()
        );

        let summary = self.pipeline.load(map, update).await?;
        tracing::info!(
            "Layer '{}' now shows {} points ({:?})",
            summary.layer,
            summary.drawn_points,
            started.elapsed()
        );

        Ok(summary)
    }

    async fn prepare(&self) -> Result<LayerUpdate> {
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} rows", records.len());
        self.pipeline.transform(records).await
    }
}
