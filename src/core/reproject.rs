//! Coordinate conversion between the systems the map knows about.
//!
//! Every conversion goes through WGS84 longitude/latitude in degrees. The
//! Greek Grid leg, which includes a datum shift, is delegated to `proj4rs`.
//! Web Mercator uses the closed spherical formulas.

use crate::core::crs::GGRS87;
use crate::domain::model::Point;
use crate::utils::error::{MapError, Result};
use proj4rs::Proj;
use serde::Serialize;
use std::f64::consts::PI;

const WGS84_PROJ_STRING: &str = "+proj=longlat +datum=WGS84 +no_defs";

pub const EARTH_RADIUS: f64 = 6378137.0;
/// Half the side of the square Web Mercator world.
pub const MERCATOR_HALF_SIZE: f64 = PI * EARTH_RADIUS;
/// Latitude at which the Mercator square ends.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.0511287798066;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Projection {
    /// EPSG:2100
    Ggrs87,
    /// EPSG:3857
    WebMercator,
    /// EPSG:4326, degrees
    Wgs84,
}

impl Projection {
    pub fn code(self) -> &'static str {
        match self {
            Projection::Ggrs87 => GGRS87.code,
            Projection::WebMercator => "EPSG:3857",
            Projection::Wgs84 => "EPSG:4326",
        }
    }
}

/// Lon/lat degrees to Web Mercator metres.
pub fn lonlat_to_web_mercator(lonlat: Point) -> Point {
    let lat = lonlat.y.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
    let x = EARTH_RADIUS * lonlat.x.to_radians();
    let y = EARTH_RADIUS * (PI * (lat + 90.0) / 360.0).tan().ln();
    Point {
        x,
        y: y.clamp(-MERCATOR_HALF_SIZE, MERCATOR_HALF_SIZE),
    }
}

pub fn web_mercator_to_lonlat(xy: Point) -> Point {
    Point {
        x: (xy.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (xy.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Converts points between two projections. The same projection on both
/// sides returns the input untouched.
pub struct Reprojector {
    from: Projection,
    to: Projection,
    geodetic: Option<GeodeticPair>,
}

struct GeodeticPair {
    ggrs87: Proj,
    wgs84: Proj,
}

impl GeodeticPair {
    fn new() -> Result<Self> {
        let ggrs87 = Proj::from_proj_string(GGRS87.proj_string).map_err(|e| {
            MapError::projection(format!("failed to create {} projection: {:?}", GGRS87.code, e))
        })?;
        let wgs84 = Proj::from_proj_string(WGS84_PROJ_STRING)
            .map_err(|e| MapError::projection(format!("failed to create WGS84 projection: {:?}", e)))?;
        Ok(Self { ggrs87, wgs84 })
    }

    fn to_lonlat(&self, p: Point) -> Result<Point> {
        let mut point = (p.x, p.y, 0.0);
        proj4rs::transform::transform(&self.ggrs87, &self.wgs84, &mut point).map_err(|e| {
            MapError::projection(format!("({}, {}) from {}: {:?}", p.x, p.y, GGRS87.code, e))
        })?;
        Ok(Point {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    fn from_lonlat(&self, lonlat: Point) -> Result<Point> {
        let mut point = (lonlat.x.to_radians(), lonlat.y.to_radians(), 0.0);
        proj4rs::transform::transform(&self.wgs84, &self.ggrs87, &mut point).map_err(|e| {
            MapError::projection(format!(
                "({}, {}) to {}: {:?}",
                lonlat.x, lonlat.y, GGRS87.code, e
            ))
        })?;
        Ok(Point {
            x: point.0,
            y: point.1,
        })
    }
}

impl Reprojector {
    pub fn new(from: Projection, to: Projection) -> Result<Self> {
        let needs_geodetic = from != to && (from == Projection::Ggrs87 || to == Projection::Ggrs87);
        let geodetic = if needs_geodetic {
            Some(GeodeticPair::new()?)
        } else {
            None
        };
        Ok(Self { from, to, geodetic })
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    pub fn apply(&self, p: Point) -> Result<Point> {
        if self.is_identity() {
            return Ok(p);
        }

        let lonlat = self.to_lonlat(p)?;
        let out = self.from_lonlat(lonlat)?;
        if !out.x.is_finite() || !out.y.is_finite() {
            return Err(MapError::projection(format!(
                "({}, {}) has no finite image from {} to {}",
                p.x,
                p.y,
                self.from.code(),
                self.to.code()
            )));
        }
        Ok(out)
    }

    pub fn apply_all(&self, points: &[Point]) -> Result<Vec<Point>> {
        points.iter().map(|p| self.apply(*p)).collect()
    }

    fn to_lonlat(&self, p: Point) -> Result<Point> {
        match self.from {
            Projection::Wgs84 => Ok(p),
            Projection::WebMercator => Ok(web_mercator_to_lonlat(p)),
            Projection::Ggrs87 => self.geodetic()?.to_lonlat(p),
        }
    }

    fn from_lonlat(&self, lonlat: Point) -> Result<Point> {
        match self.to {
            Projection::Wgs84 => Ok(lonlat),
            Projection::WebMercator => Ok(lonlat_to_web_mercator(lonlat)),
            Projection::Ggrs87 => self.geodetic()?.from_lonlat(lonlat),
        }
    }

    fn geodetic(&self) -> Result<&GeodeticPair> {
        self.geodetic
            .as_ref()
            .ok_or_else(|| MapError::projection("geodetic transformer was not initialised"))
    }
}

pub fn reproject(points: &[Point], from: Projection, to: Projection) -> Result<Vec<Point>> {
    Reprojector::new(from, to)?.apply_all(points)
}
