// Domain layer: point models and ports. The map surface itself lives in core.

pub mod model;
pub mod ports;
