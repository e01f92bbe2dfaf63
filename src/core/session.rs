//! Shared map handle for overlapping file selections.
//!
//! Every submission for a layer takes a new generation number before its file
//! is read. When the parse finishes, the update is applied only if no newer
//! submission for the same layer has started in the meantime: last write wins.

use crate::core::map::MapSurface;
use crate::core::Pipeline;
use crate::domain::model::LayerSummary;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Applied(LayerSummary),
    /// A newer submission for the layer started before this one finished.
    Superseded { layer: String, generation: u64 },
}

#[derive(Clone)]
pub struct MapSession {
    map: Arc<Mutex<MapSurface>>,
    generations: Arc<StdMutex<HashMap<String, u64>>>,
}

impl MapSession {
    pub fn new(map: MapSurface) -> Self {
        Self {
            map: Arc::new(Mutex::new(map)),
            generations: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub async fn with_map<R>(&self, f: impl FnOnce(&mut MapSurface) -> R) -> R {
        let mut map = self.map.lock().await;
        f(&mut map)
    }

    pub async fn snapshot(&self) -> MapSurface {
        self.map.lock().await.clone()
    }

    fn begin(&self, layer: &str) -> u64 {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        let generation = generations.entry(layer.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_current(&self, layer: &str, generation: u64) -> bool {
        let generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        generations.get(layer).copied() == Some(generation)
    }

    pub async fn submit<P: Pipeline>(&self, pipeline: &P) -> Result<UpdateOutcome> {
        let layer = pipeline.layer_name().to_string();
        let generation = self.begin(&layer);
        tracing::debug!("Submission {} for layer '{}'", generation, layer);

        let update = match pipeline.extract().await {
            Ok(records) => pipeline.transform(records).await,
            Err(e) => Err(e),
        };

        let mut map = self.map.lock().await;
        if !self.is_current(&layer, generation) {
            // 較新的檔案選擇已經開始，這次的結果直接丟棄
            tracing::warn!(
                "Discarding stale submission {} for layer '{}'",
                generation,
                layer
            );
            return Ok(UpdateOutcome::Superseded { layer, generation });
        }

        let update = match update {
            Ok(update) => update,
            Err(e) => {
                map.remove_layer(&layer);
                tracing::warn!("Layer '{}' cleared after failed submission {}", layer, generation);
                return Err(e);
            }
        };

        let summary = pipeline.load(&mut map, update).await?;
        Ok(UpdateOutcome::Applied(summary))
    }
}
