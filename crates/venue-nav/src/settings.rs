use crate::error::PersistError;
use panorama::Vec3;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Common slider metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

pub const DEFAULT_FOV: f64 = 75.0;

// View ranges
pub const FOV_RANGE: SliderRange = SliderRange::new(30.0, 120.0, 1.0);
pub const PITCH_RANGE: SliderRange = SliderRange::new(-90.0, 90.0, 0.5);

// Editor ranges
pub const GRID_SIZE_RANGE: SliderRange =
    SliderRange::new(0.1, 10.0, 0.1);
pub const PROXIMITY_RANGE: SliderRange =
    SliderRange::new(1.0, 500.0, 1.0);
pub const AUTO_ROTATE_STEP_RANGE: SliderRange =
    SliderRange::new(0.05, 5.0, 0.05);

/// Grid, snap and display options stored with each revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSettings {
    #[serde(deserialize_with = "grid_size_or_default")]
    pub grid_size: f64,
    pub snap_to_grid: bool,
    pub show_grid: bool,
    pub show_labels: bool,
    pub show_connections: bool,
}

const DEFAULT_GRID_SIZE: f64 = 1.0;

// a NaN grid size is written as `null`
fn grid_size_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_GRID_SIZE))
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: false,
            show_grid: true,
            show_labels: true,
            show_connections: true,
        }
    }
}

impl GraphSettings {
    /// Snap a position onto the floor grid. Height is left alone so
    /// nodes can sit on stairs and mezzanines.
    pub fn snap(&self, position: Vec3) -> Vec3 {
        if !self.snap_to_grid
            || !self.grid_size.is_finite()
            || self.grid_size <= 0.0
        {
            return position;
        }
        let g = self.grid_size;
        Vec3::new(
            (position.x / g).round() * g,
            (position.y / g).round() * g,
            position.z,
        )
    }

    /// Grid size back into its slider range; unusable values fall back
    /// to the default.
    pub fn sanitized(mut self) -> Self {
        self.grid_size = if self.grid_size.is_finite() {
            GRID_SIZE_RANGE.clamp(self.grid_size)
        } else {
            DEFAULT_GRID_SIZE
        };
        self
    }
}

/// Panorama viewer tunables. Not persisted with revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Hotspots closer than this get the "ahead" emphasis.
    pub proximity_threshold: f64,
    /// Degrees added per display refresh while auto-rotating.
    pub auto_rotate_step: f64,
    /// Delays of the overlay refresh passes after a change.
    pub refresh_delays_ms: Vec<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 50.0,
            auto_rotate_step: 0.5,
            refresh_delays_ms: vec![0, 50, 150, 400],
        }
    }
}

impl ViewerConfig {
    pub fn refresh_delays(&self) -> Vec<Duration> {
        self.refresh_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Pull hand-edited values back into their slider ranges.
    pub fn sanitized(mut self) -> Self {
        self.proximity_threshold =
            PROXIMITY_RANGE.clamp(self.proximity_threshold);
        self.auto_rotate_step =
            AUTO_ROTATE_STEP_RANGE.clamp(self.auto_rotate_step);
        self
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PersistError> {
        let json = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&json)?;
        Ok(config.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_floor_plane_only() {
        let settings = GraphSettings {
            grid_size: 0.5,
            snap_to_grid: true,
            ..GraphSettings::default()
        };

        let snapped = settings.snap(Vec3::new(1.26, -0.74, 2.33));

        assert!((snapped.x - 1.5).abs() < 1e-12);
        assert!((snapped.y + 0.5).abs() < 1e-12);
        assert_eq!(snapped.z, 2.33);
    }

    #[test]
    fn test_snap_disabled_leaves_position() {
        let p = Vec3::new(1.26, -0.74, 2.33);
        assert_eq!(GraphSettings::default().snap(p), p);
    }

    #[test]
    fn test_snap_ignores_non_finite_grid() {
        let p = Vec3::new(1.0, 2.0, 0.0);
        for grid_size in [f64::NAN, f64::INFINITY] {
            let settings = GraphSettings {
                grid_size,
                snap_to_grid: true,
                ..GraphSettings::default()
            };
            assert_eq!(settings.snap(p), p, "grid {}", grid_size);
        }
    }

    #[test]
    fn test_graph_settings_sanitized() {
        let nan = GraphSettings {
            grid_size: f64::NAN,
            ..GraphSettings::default()
        };
        let tiny = GraphSettings {
            grid_size: 0.0,
            ..GraphSettings::default()
        };

        assert_eq!(nan.sanitized().grid_size, 1.0);
        assert_eq!(tiny.sanitized().grid_size, GRID_SIZE_RANGE.min);
    }

    #[test]
    fn test_viewer_config_partial_json_uses_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "proximity_threshold": 12.5 }"#)
                .expect("partial config parses");

        assert_eq!(config.proximity_threshold, 12.5);
        assert_eq!(config.auto_rotate_step, 0.5);
        assert_eq!(
            config.refresh_delays(),
            vec![
                Duration::from_millis(0),
                Duration::from_millis(50),
                Duration::from_millis(150),
                Duration::from_millis(400),
            ]
        );
    }

    #[test]
    fn test_sanitized_clamps_into_ranges() {
        let config = ViewerConfig {
            proximity_threshold: -4.0,
            auto_rotate_step: 90.0,
            ..ViewerConfig::default()
        }
        .sanitized();

        assert_eq!(config.proximity_threshold, PROXIMITY_RANGE.min);
        assert_eq!(config.auto_rotate_step, AUTO_ROTATE_STEP_RANGE.max);
    }

    #[test]
    fn test_graph_settings_camel_case() {
        let json = serde_json::to_value(GraphSettings::default())
            .expect("settings serialize");
        assert_eq!(json["gridSize"], 1.0);
        assert_eq!(json["snapToGrid"], false);
    }
}
