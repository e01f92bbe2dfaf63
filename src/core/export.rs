use crate::core::map::{LayerContent, MapSurface};
use crate::core::reproject::{Projection, Reprojector};
use crate::core::Storage;
use crate::domain::model::Point;
use crate::utils::error::Result;
use serde_json::{json, Value};

/// GeoJSON FeatureCollection of every point layer, in WGS84 lon/lat.
///
/// Layer order, the tile layers and the fitted viewport are kept in a
/// `map` member next to `features`.
pub fn snapshot_geojson(map: &MapSurface) -> Result<Value> {
    let to_lonlat = Reprojector::new(map.projection(), Projection::Wgs84)?;
    let mut features = Vec::new();
    let mut layers = Vec::new();

    for layer in map.layers() {
        match layer.content() {
            LayerContent::Tiles { source } => {
                layers.push(json!({ "name": layer.name(), "kind": "tiles", "source": source }));
            }
            LayerContent::Points { features: points, style } => {
                layers.push(json!({
                    "name": layer.name(),
                    "kind": "points",
                    "count": points.len(),
                    "style": style,
                }));
                for (index, p) in points.iter().enumerate() {
                    let lonlat = to_lonlat.apply(p.0)?;
                    features.push(json!({
                        "type": "Feature",
                        "geometry": { "type": "Point", "coordinates": [lonlat.x, lonlat.y] },
                        "properties": { "layer": layer.name(), "index": index },
                    }));
                }
            }
        }
    }

    let viewport = map.viewport();
    let visible = map.visible_extent();
    let center: Point = to_lonlat.apply(viewport.center)?;

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
        "map": {
            "projection": map.projection().code(),
            "size": [map.size().0, map.size().1],
            "layers": layers,
            "viewport": {
                "center": [center.x, center.y],
                "zoom": viewport.zoom,
                "resolution": viewport.resolution,
                "extent": [visible.min().x, visible.min().y, visible.max().x, visible.max().y],
            },
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
    }))
}

pub async fn write_snapshot<S: Storage>(storage: &S, path: &str, map: &MapSurface) -> Result<()> {
    let snapshot = snapshot_geojson(map)?;
    let data = serde_json::to_vec_pretty(&snapshot)?;
    tracing::debug!("Writing map snapshot ({} bytes) to {}", data.len(), path);
    storage.write_file(path, &data).await
}
