use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::Result, overlay::Color};

/// What the normalizer does with a shot whose timestamp does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampPolicy {
    /// Fail the whole analysis result.
    #[default]
    Reject,
    /// Drop the offending shot.
    Skip,
    /// Keep the shot at 0:00.
    ClampToZero,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Redraw cadence while playing.
    #[serde(with = "millis")]
    pub refresh_interval: Duration,
    /// Half-width of the window around a shot during which its badge is shown.
    pub badge_window_secs: f64,
    pub timestamp_policy: TimestampPolicy,
    pub theme: OverlayTheme,
}

impl OverlayConfig {
    /// Read a JSON config file. Keys it leaves out keep their defaults.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let json_content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json_content)?)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(100),
            badge_window_secs: 2.0,
            timestamp_policy: TimestampPolicy::Reject,
            theme: OverlayTheme::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayTheme {
    pub stat_chip: Color,
    pub stat_text: Color,
    pub timeline_track: Color,
    pub playhead: Color,
    pub successful_marker: Color,
    pub fault_marker: Color,
    pub successful_badge: Color,
    pub fault_badge: Color,
    pub badge_text: Color,
    pub speed_text: Color,
    pub font_family: String,
}

impl Default for OverlayTheme {
    fn default() -> Self {
        Self {
            stat_chip: Color::rgba(0, 32, 91, 0.85),
            stat_text: Color::WHITE,
            timeline_track: Color::rgba(0, 0, 0, 0.6),
            playhead: Color::rgba(255, 255, 255, 0.9),
            successful_marker: Color::rgba(34, 139, 34, 0.8),
            fault_marker: Color::rgba(220, 20, 60, 0.8),
            successful_badge: Color::rgba(34, 139, 34, 0.9),
            fault_badge: Color::rgba(220, 20, 60, 0.9),
            badge_text: Color::WHITE,
            speed_text: Color::YELLOW,
            font_family: "Arial".to_string(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
