use crate::core::map::MapSurface;
use crate::domain::model::{LayerSummary, LayerUpdate, PointRecord, PointsFormat, UnrecognizedPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn points_format(&self) -> PointsFormat;
    fn on_unrecognized(&self) -> UnrecognizedPolicy;
    fn output_path(&self) -> &str;
    fn map_size(&self) -> (u32, u32);
    fn background_tiles(&self) -> bool;
}

/// One file selection turned into one layer update.
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn layer_name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<PointRecord>>;
    async fn transform(&self, records: Vec<PointRecord>) -> Result<LayerUpdate>;
    async fn load(&self, map: &mut MapSurface, update: LayerUpdate) -> Result<LayerSummary>;
}
