pub mod crs;
pub mod engine;
pub mod export;
pub mod map;
pub mod parser;
pub mod pipeline;
pub mod reproject;
pub mod session;

pub use crate::domain::model::{LayerSummary, LayerUpdate, Point, PointRecord};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
