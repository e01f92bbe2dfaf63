use serde::{Deserialize, Serialize};

/// A 2D coordinate pair in the native units of whatever system it was read in.
pub type Point = geo::Coord<f64>;

/// One row of an uploaded point file.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: Option<String>,
    pub source: Point,
    pub target: Option<Point>,
}

/// Column layout of a point file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum PointsFormat {
    /// Decided from the first row: a leading non-numeric field is an id,
    /// four or more numbers mean source and target pairs. A numeric id
    /// column is read as a coordinate; use `id-xy` or `id-xyxy` for those files.
    #[default]
    Auto,
    Xy,
    Xyxy,
    IdXy,
    IdXyxy,
}

impl PointsFormat {
    pub fn has_id(self) -> bool {
        matches!(self, PointsFormat::IdXy | PointsFormat::IdXyxy)
    }

    pub fn has_target(self) -> bool {
        matches!(self, PointsFormat::Xyxy | PointsFormat::IdXyxy)
    }

    /// Minimum number of non-empty fields a row needs.
    pub fn min_fields(self) -> usize {
        let coords = if self.has_target() { 4 } else { 2 };
        coords + usize::from(self.has_id())
    }
}

/// What to do with a point set that lies in no recognized reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum UnrecognizedPolicy {
    /// Clear the layer and draw nothing.
    #[default]
    Skip,
    /// Draw the source points as if they were already in display units.
    Local,
    /// Fail the update.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub fill_color: String,
    pub radius: f64,
}

impl PointStyle {
    pub fn circle(stroke_color: &str) -> Self {
        Self {
            stroke_color: stroke_color.to_string(),
            stroke_width: 4.0,
            fill_color: "rgba(255,255,255,0.4)".to_string(),
            radius: 7.0,
        }
    }
}

pub const REFERENCE_POINTS: &str = "reference_points";
pub const VALIDATION_POINTS: &str = "validation_points";

/// Identity and look of a point layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub style: PointStyle,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, style: PointStyle) -> Self {
        Self {
            name: name.into(),
            style,
        }
    }

    pub fn reference_points() -> Self {
        Self::new(REFERENCE_POINTS, PointStyle::circle("#3399CC"))
    }

    pub fn validation_points() -> Self {
        Self::new(VALIDATION_POINTS, PointStyle::circle("#cc3399"))
    }

    /// Known layer names keep their usual style; anything else is drawn blue.
    pub fn named(name: &str) -> Self {
        match name {
            VALIDATION_POINTS => Self::validation_points(),
            _ => Self::new(name, PointStyle::circle("#3399CC")),
        }
    }
}

/// Which column pair of the file ended up on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointSetSelection {
    Source,
    Target,
    /// Unrecognized source set drawn as display units.
    Local,
    /// Nothing drawn; the layer is only cleared.
    Nothing,
}

/// Result of classifying a parsed file, ready to be put on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerUpdate {
    pub layer: LayerSpec,
    pub points: Vec<Point>,
    pub selection: PointSetSelection,
}

impl LayerUpdate {
    pub fn source_is_known_system(&self) -> bool {
        matches!(
            self.selection,
            PointSetSelection::Source | PointSetSelection::Target
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub layer: String,
    pub drawn_points: usize,
    pub selection: PointSetSelection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_format_field_counts() {
        assert_eq!(PointsFormat::Xy.min_fields(), 2);
        assert_eq!(PointsFormat::IdXy.min_fields(), 3);
        assert_eq!(PointsFormat::Xyxy.min_fields(), 4);
        assert_eq!(PointsFormat::IdXyxy.min_fields(), 5);
    }

    #[test]
    fn test_points_format_serde_names() {
        let format: PointsFormat = serde_json::from_str("\"id-xyxy\"").unwrap();
        assert_eq!(format, PointsFormat::IdXyxy);
        let policy: UnrecognizedPolicy = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(policy, UnrecognizedPolicy::Local);
    }

    #[test]
    fn test_named_layers_keep_their_style() {
        assert_eq!(LayerSpec::named(VALIDATION_POINTS), LayerSpec::validation_points());
        assert_eq!(LayerSpec::named(REFERENCE_POINTS), LayerSpec::reference_points());
        assert_eq!(LayerSpec::named("extra").style.stroke_color, "#3399CC");
    }
}
