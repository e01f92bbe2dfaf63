//! Recognition of the projected reference system a point set is written in.

use crate::domain::model::Point;
use crate::utils::error::{MapError, Result};

/// Axis-aligned rectangle in a reference system's native units.
/// Both corners belong to the envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Envelope {
    pub const fn new(lower_left: Point, upper_right: Point) -> Self {
        Self {
            lower_left,
            upper_right,
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.lower_left.x
            && point.x <= self.upper_right.x
            && point.y >= self.lower_left.y
            && point.y <= self.upper_right.y
    }

    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(self.lower_left, self.upper_right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSystem {
    pub code: &'static str,
    pub name: &'static str,
    pub proj_string: &'static str,
    pub envelope: Envelope,
}

/// GGRS87 / Greek Grid, the one projected system uploads are matched against.
pub const GGRS87: ReferenceSystem = ReferenceSystem {
    code: "EPSG:2100",
    name: "GGRS87 / Greek Grid",
    proj_string: "+proj=tmerc +lat_0=0 +lon_0=24 +k=0.9996 +x_0=500000 +y_0=0 +ellps=GRS80 \
                  +towgs84=-199.87,74.79,246.62,0,0,0,0 +units=m +no_defs",
    envelope: Envelope::new(
        Point {
            x: 94875.0,
            y: 3868409.0,
        },
        Point {
            x: 857398.0,
            y: 4630677.0,
        },
    ),
};

impl ReferenceSystem {
    /// True when every point lies inside the envelope. A single point outside
    /// disqualifies the whole set.
    pub fn contains_all(&self, points: &[Point]) -> Result<bool> {
        ensure_usable(points)?;
        Ok(points.iter().all(|p| self.envelope.contains(p)))
    }
}

pub fn is_in_reference_system(points: &[Point]) -> Result<bool> {
    GGRS87.contains_all(points)
}

/// Rejects empty sets and NaN/infinite coordinates.
pub fn ensure_usable(points: &[Point]) -> Result<()> {
    if points.is_empty() {
        return Err(MapError::invalid_input("point set is empty"));
    }

    if let Some((index, p)) = points
        .iter()
        .enumerate()
        .find(|(_, p)| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(MapError::invalid_input(format!(
            "point {} has a non-finite coordinate ({}, {})",
            index + 1,
            p.x,
            p.y
        )));
    }

    Ok(())
}
