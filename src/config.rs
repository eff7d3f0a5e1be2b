// Runtime settings: camera request, tick period, pen and initial slider values.
// Every field has a default, so a config file only needs the keys it changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::draw::DEFAULT_PEN_WIDTH;
use crate::error::{StudioError, StudioResult};
use crate::types::Color;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub camera: CameraConfig,
    /// Period of the live-capture tick.
    pub tick_interval_ms: u64,
    pub pen: PenConfig,
    pub sliders: SliderDefaults,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            tick_interval_ms: 30,
            pen: PenConfig::default(),
            sliders: SliderDefaults::default(),
        }
    }
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> StudioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StudioError::invalid_input(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> StudioResult<Self> {
        serde_json::from_str(text).map_err(|e| StudioError::invalid_input(format!("bad config: {e}")))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Requested capture format; the device may settle on something close.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 0 = default webcam
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            frame_rate: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenConfig {
    pub color: Color,
    pub width: u32,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            color: Color::RED,
            width: DEFAULT_PEN_WIDTH,
        }
    }
}

/// Initial positions of the filter controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderDefaults {
    pub blur_kernel: u32,
    pub edge_low: u8,
    pub edge_high: u8,
    pub hue: i32,
    pub brightness: i32,
    pub contrast: i32,
}

impl Default for SliderDefaults {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            edge_low: 50,
            edge_high: 150,
            hue: 0,
            brightness: 0,
            contrast: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(StudioConfig::from_json("{}").unwrap(), StudioConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = StudioConfig::from_json(
            r#"{ "camera": { "index": 2 }, "pen": { "color": { "r": 0, "g": 0, "b": 255 } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.camera.index, 2);
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.pen.color, Color::new(0, 0, 255));
        assert_eq!(cfg.pen.width, 5);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(30));
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        assert!(matches!(
            StudioConfig::from_json("{ nope"),
            Err(StudioError::InvalidInput(_))
        ));
        assert!(matches!(
            StudioConfig::load("no/such/config.json"),
            Err(StudioError::InvalidInput(_))
        ));
    }

    #[test]
    fn serializes_back_to_equal_config() {
        let cfg = StudioConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        assert_eq!(StudioConfig::from_json(&text).unwrap(), cfg);
    }
}
