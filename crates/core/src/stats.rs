use serde::Serialize;

use crate::normalize::{OverlayData, ShotEvent, ShotResult};

/// Running totals as of a playback position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub shots_so_far: u32,
    pub successful_so_far: u32,
    pub faults_so_far: u32,
    pub success_rate_percent: u32,
}

impl LiveStats {
    /// Count every shot at or before `current_time`. A shot counts from the exact
    /// instant of its timestamp.
    pub fn at(data: &OverlayData, current_time: f64) -> Self {
        let mut stats = LiveStats::default();
        for shot in data.shots.iter().filter(|s| s.timestamp_seconds <= current_time) {
            stats.shots_so_far += 1;
            match shot.result {
                ShotResult::Successful => stats.successful_so_far += 1,
                ShotResult::Fault => stats.faults_so_far += 1,
            }
        }

        stats.success_rate_percent = if stats.shots_so_far > 0 {
            (f64::from(stats.successful_so_far) / f64::from(stats.shots_so_far) * 100.0).round()
                as u32
        } else {
            0
        };

        stats
    }

    pub fn lines(&self) -> [String; 4] {
        [
            format!("Total Shots: {}", self.shots_so_far),
            format!("Successful: {}", self.successful_so_far),
            format!("Faults: {}", self.faults_so_far),
            format!("Success Rate: {}%", self.success_rate_percent),
        ]
    }
}

/// The shot whose badge is on screen: the first one, in timeline order, within
/// `window` seconds of `current_time` (strict on both sides).
pub fn current_shot(data: &OverlayData, current_time: f64, window: f64) -> Option<&ShotEvent> {
    data.shots
        .iter()
        .find(|shot| (shot.timestamp_seconds - current_time).abs() < window)
}
