//! The map surface: named layers plus a viewport, in the display projection.

use crate::core::reproject::{lonlat_to_web_mercator, Projection, Reprojector, MERCATOR_HALF_SIZE};
use crate::domain::model::{LayerSpec, Point, PointStyle};
use crate::utils::error::Result;
use geo::{coord, BoundingRect, MultiPoint, Rect};

pub const DISPLAY_PROJECTION: Projection = Projection::WebMercator;
/// Factor the union of point extents is scaled by before fitting.
pub const VIEWPORT_MARGIN: f64 = 1.2;
pub const DEFAULT_CENTER_LONLAT: Point = Point { x: 25.0, y: 38.4 };
pub const DEFAULT_ZOOM: f64 = 6.0;
pub const MAX_ZOOM: f64 = 28.0;
pub const BACKGROUND_LAYER: &str = "osm";
const TILE_SIZE: f64 = 256.0;

/// Resolution (metres per pixel) at zoom 0.
pub fn max_resolution() -> f64 {
    2.0 * MERCATOR_HALF_SIZE / TILE_SIZE
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    Tiles { source: String },
    Points {
        features: Vec<geo::Point<f64>>,
        style: PointStyle,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLayer {
    name: String,
    content: LayerContent,
}

impl DisplayLayer {
    pub fn tiles(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: LayerContent::Tiles {
                source: source.into(),
            },
        }
    }

    pub fn points(spec: &LayerSpec, coords: Vec<Point>) -> Self {
        Self {
            name: spec.name.clone(),
            content: LayerContent::Points {
                features: coords.into_iter().map(geo::Point::from).collect(),
                style: spec.style.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &LayerContent {
        &self.content
    }

    pub fn is_point_layer(&self) -> bool {
        matches!(self.content, LayerContent::Points { .. })
    }

    pub fn features(&self) -> &[geo::Point<f64>] {
        match &self.content {
            LayerContent::Points { features, .. } => features,
            LayerContent::Tiles { .. } => &[],
        }
    }

    /// Bounding rectangle of the layer's points, `None` for tile layers.
    pub fn extent(&self) -> Option<Rect<f64>> {
        match &self.content {
            LayerContent::Points { features, .. } => {
                MultiPoint::new(features.clone()).bounding_rect()
            }
            LayerContent::Tiles { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    /// Display units per pixel.
    pub resolution: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn at_zoom(center: Point, zoom: f64) -> Self {
        let zoom = zoom.clamp(0.0, MAX_ZOOM);
        Self {
            center,
            resolution: max_resolution() / 2f64.powf(zoom),
            zoom,
        }
    }
}

/// A single map instance. Layers are drawn in insertion order.
#[derive(Debug, Clone)]
pub struct MapSurface {
    size: (u32, u32),
    layers: Vec<DisplayLayer>,
    viewport: Viewport,
}

impl MapSurface {
    /// Empty map of `width` x `height` pixels centred on the Aegean.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width.max(1), height.max(1)),
            layers: Vec::new(),
            viewport: Viewport::at_zoom(lonlat_to_web_mercator(DEFAULT_CENTER_LONLAT), DEFAULT_ZOOM),
        }
    }

    pub fn projection(&self) -> Projection {
        DISPLAY_PROJECTION
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn layers(&self) -> &[DisplayLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&DisplayLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Area of the display projection currently in view.
    pub fn visible_extent(&self) -> Rect<f64> {
        let half_w = self.size.0 as f64 * self.viewport.resolution / 2.0;
        let half_h = self.size.1 as f64 * self.viewport.resolution / 2.0;
        let c = self.viewport.center;
        Rect::new(
            coord! { x: c.x - half_w, y: c.y - half_h },
            coord! { x: c.x + half_w, y: c.y + half_h },
        )
    }

    pub fn add_background_tiles(&mut self) {
        self.add_layer(DisplayLayer::tiles(BACKGROUND_LAYER, "openstreetmap"));
    }

    pub fn add_layer(&mut self, layer: DisplayLayer) {
        tracing::debug!("Attaching layer '{}'", layer.name);
        self.layers.push(layer);
    }

    /// Removes every layer called `name`, returning how many were removed.
    pub fn remove_layer(&mut self, name: &str) -> usize {
        let before = self.layers.len();
        self.layers.retain(|l| l.name != name);
        before - self.layers.len()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Union of all point-layer extents. Tile layers are ignored.
    pub fn point_layers_extent(&self) -> Option<Rect<f64>> {
        self.layers
            .iter()
            .filter_map(DisplayLayer::extent)
            .reduce(union)
    }

    /// Fits the view to the point layers. Returns false when there is nothing to fit.
    pub fn fit_to_point_layers(&mut self) -> bool {
        match self.point_layers_extent() {
            Some(extent) => {
                self.fit(scale_about_center(extent, VIEWPORT_MARGIN));
                true
            }
            None => false,
        }
    }

    /// Centres on `extent` with the largest zoom that still shows all of it.
    pub fn fit(&mut self, extent: Rect<f64>) {
        let needed = (extent.width() / self.size.0 as f64).max(extent.height() / self.size.1 as f64);
        let min_resolution = max_resolution() / 2f64.powf(MAX_ZOOM);
        let resolution = needed.max(min_resolution);
        let zoom = (max_resolution() / resolution).log2().clamp(0.0, MAX_ZOOM);

        self.viewport = Viewport {
            center: extent.center(),
            resolution,
            zoom,
        };
        tracing::debug!(
            "Viewport fitted: center=({:.1}, {:.1}) zoom={:.2}",
            self.viewport.center.x,
            self.viewport.center.y,
            self.viewport.zoom
        );
    }
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

fn scale_about_center(rect: Rect<f64>, factor: f64) -> Rect<f64> {
    let c = rect.center();
    let half_w = rect.width() * factor / 2.0;
    let half_h = rect.height() * factor / 2.0;
    Rect::new(
        coord! { x: c.x - half_w, y: c.y - half_h },
        coord! { x: c.x + half_w, y: c.y + half_h },
    )
}

/// Replaces the point layer called `layer_name` with `points`.
pub fn rebuild_point_layer(
    map: &mut MapSurface,
    layer_name: &str,
    points: &[Point],
    source_is_known_system: bool,
) -> Result<()> {
    rebuild_styled_point_layer(map, &LayerSpec::named(layer_name), points, source_is_known_system)
}

/// Remove, reproject, attach, fit. An empty `points` only clears the layer.
pub fn rebuild_styled_point_layer(
    map: &mut MapSurface,
    layer: &LayerSpec,
    points: &[Point],
    source_is_known_system: bool,
) -> Result<()> {
    let removed = map.remove_layer(&layer.name);
    if removed > 0 {
        tracing::debug!("Removed {} existing layer(s) named '{}'", removed, layer.name);
    }

    if points.is_empty() {
        return Ok(());
    }

    let source = if source_is_known_system {
        Projection::Ggrs87
    } else {
        map.projection()
    };
    let reprojected = Reprojector::new(source, map.projection())?.apply_all(points)?;

    map.add_layer(DisplayLayer::points(layer, reprojected));
    map.fit_to_point_layers();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{REFERENCE_POINTS, VALIDATION_POINTS};
    use crate::utils::error::MapError;

    fn local_points(offset: f64) -> Vec<Point> {
        vec![
            coord! { x: 1000.0 + offset, y: 2000.0 + offset },
            coord! { x: 1500.0 + offset, y: 2600.0 + offset },
            coord! { x: 1200.0 + offset, y: 2100.0 + offset },
        ]
    }

    fn count_named(map: &MapSurface, name: &str) -> usize {
        map.layers().iter().filter(|l| l.name() == name).count()
    }

    fn contains(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
        outer.min().x <= inner.min().x
            && outer.min().y <= inner.min().y
            && outer.max().x >= inner.max().x
            && outer.max().y >= inner.max().y
    }

    #[test]
    fn test_new_map_uses_default_view() {
        let map = MapSurface::new(800, 600);
        assert_eq!(map.projection(), Projection::WebMercator);
        assert_eq!(map.viewport().zoom, DEFAULT_ZOOM);
        assert!(map.layers().is_empty());
        assert!(map.point_layers_extent().is_none());
    }

    #[test]
    fn test_rebuild_twice_keeps_single_layer() {
        let mut map = MapSurface::new(800, 600);
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &local_points(0.0), false).unwrap();
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &local_points(50.0), false).unwrap();

        assert_eq!(count_named(&map, REFERENCE_POINTS), 1);
        let layer = map.layer(REFERENCE_POINTS).unwrap();
        assert_eq!(layer.features()[0].x(), 1050.0);
    }

    #[test]
    fn test_rebuild_with_empty_points_clears_layer() {
        let mut map = MapSurface::new(800, 600);
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &local_points(0.0), false).unwrap();
        let fitted = *map.viewport();

        rebuild_point_layer(&mut map, REFERENCE_POINTS, &[], false).unwrap();

        assert_eq!(count_named(&map, REFERENCE_POINTS), 0);
        assert_eq!(*map.viewport(), fitted);
    }

    #[test]
    fn test_local_points_are_not_reprojected() {
        let mut map = MapSurface::new(800, 600);
        let points = local_points(0.0);
        rebuild_point_layer(&mut map, VALIDATION_POINTS, &points, false).unwrap();

        let drawn: Vec<Point> = map
            .layer(VALIDATION_POINTS)
            .unwrap()
            .features()
            .iter()
            .map(|p| p.0)
            .collect();
        assert_eq!(drawn, points);
    }

    #[test]
    fn test_known_system_points_are_reprojected() {
        let mut map = MapSurface::new(800, 600);
        let points = vec![coord! { x: 476000.0, y: 4205000.0 }];
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &points, true).unwrap();

        let drawn = map.layer(REFERENCE_POINTS).unwrap().features()[0];
        // Athens in Web Mercator
        assert!(drawn.x() > 2.5e6 && drawn.x() < 2.7e6, "x = {}", drawn.x());
        assert!(drawn.y() > 4.5e6 && drawn.y() < 4.7e6, "y = {}", drawn.y());
    }

    #[test]
    fn test_unprojectable_points_fail_and_leave_no_layer() {
        let mut map = MapSurface::new(800, 600);
        rebuild_point_layer(&mut map, "x", &local_points(0.0), false).unwrap();

        let result = rebuild_point_layer(&mut map, "x", &[coord! { x: 1e20, y: 1e20 }], true);

        assert!(matches!(result, Err(MapError::Projection { .. })));
        assert!(map.layer("x").is_none());
    }

    #[test]
    fn test_viewport_covers_union_of_point_layers() {
        let mut map = MapSurface::new(800, 600);
        map.add_background_tiles();
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &local_points(0.0), false).unwrap();
        rebuild_point_layer(&mut map, VALIDATION_POINTS, &local_points(10_000.0), false).unwrap();

        let a = map.layer(REFERENCE_POINTS).unwrap().extent().unwrap();
        let b = map.layer(VALIDATION_POINTS).unwrap().extent().unwrap();
        let visible = map.visible_extent();
        assert!(contains(&visible, &a));
        assert!(contains(&visible, &b));

        let union = map.point_layers_extent().unwrap();
        assert_eq!(union.min(), a.min());
        assert_eq!(union.max(), b.max());
        assert!((map.viewport().center.x - union.center().x).abs() < 1e-6);
    }

    #[test]
    fn test_fit_keeps_margin_around_points() {
        let mut map = MapSurface::new(400, 400);
        let points = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1000.0, y: 1000.0 }];
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &points, false).unwrap();

        let visible = map.visible_extent();
        assert!(visible.width() >= 1000.0 * VIEWPORT_MARGIN - 1e-6);
        assert!(visible.height() >= 1000.0 * VIEWPORT_MARGIN - 1e-6);
    }

    #[test]
    fn test_single_point_fit_is_capped_at_max_zoom() {
        let mut map = MapSurface::new(800, 600);
        rebuild_point_layer(&mut map, REFERENCE_POINTS, &[coord! { x: 10.0, y: 20.0 }], false)
            .unwrap();

        assert_eq!(map.viewport().zoom, MAX_ZOOM);
        assert_eq!(map.viewport().center, coord! { x: 10.0, y: 20.0 });
        assert!(map.visible_extent().width() > 0.0);
    }

    #[test]
    fn test_tile_layers_are_ignored_by_fit() {
        let mut map = MapSurface::new(800, 600);
        map.add_background_tiles();
        assert!(!map.fit_to_point_layers());
        assert_eq!(map.viewport().zoom, DEFAULT_ZOOM);

        map.clear();
        assert!(map.layers().is_empty());
    }

    #[test]
    fn test_remove_absent_layer_is_noop() {
        let mut map = MapSurface::new(800, 600);
        assert_eq!(map.remove_layer("missing"), 0);
    }
}
