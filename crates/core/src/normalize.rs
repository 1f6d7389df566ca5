use log::{debug, warn};
use serde::Serialize;

use crate::{
    config::TimestampPolicy,
    error::{CourtsideError, Result},
    timestamp::parse_timestamp,
    types::AnalysisResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotResult {
    Successful,
    Fault,
}

impl ShotResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotResult::Successful => "successful",
            ShotResult::Fault => "fault",
        }
    }

    /// Only the exact literal "Successful" counts; anything else is a fault.
    fn from_serve_result(result: &str) -> Self {
        if result == "Successful" {
            ShotResult::Successful
        } else {
            ShotResult::Fault
        }
    }

    fn from_stroke_quality(quality: &str) -> Self {
        match quality {
            "Excellent" | "Good" => ShotResult::Successful,
            _ => ShotResult::Fault,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotType {
    Serve,
    Forehand,
    Backhand,
    Volley,
    Other,
}

impl ShotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::Serve => "serve",
            ShotType::Forehand => "forehand",
            ShotType::Backhand => "backhand",
            ShotType::Volley => "volley",
            ShotType::Other => "other",
        }
    }

    fn from_stroke_type(stroke_type: Option<&str>) -> Self {
        match stroke_type.map(str::to_lowercase).as_deref() {
            Some("forehand") => ShotType::Forehand,
            Some("backhand") => ShotType::Backhand,
            Some("volley") => ShotType::Volley,
            _ => ShotType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotEvent {
    pub timestamp_seconds: f64,
    pub result: ShotResult,
    pub shot_type: ShotType,
    pub feedback: Option<String>,
    pub sequence_number: Option<u32>,
    pub estimated_speed: Option<String>,
}

impl ShotEvent {
    pub fn is_serve(&self) -> bool {
        self.shot_type == ShotType::Serve
    }

    /// Speed label worth showing: serves only, and only when the source gave one.
    pub fn display_speed(&self) -> Option<&str> {
        if !self.is_serve() {
            return None;
        }
        self.estimated_speed
            .as_deref()
            .map(str::trim)
            .filter(|speed| !speed.is_empty())
    }
}

/// Immutable overlay input derived from one analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayData {
    pub total_shots_declared: u32,
    pub total_serves_declared: u32,
    pub total_faults_declared: u32,
    pub shots: Vec<ShotEvent>,
}

impl OverlayData {
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

struct PendingShot<'a> {
    label: String,
    timestamp: &'a str,
    result: ShotResult,
    shot_type: ShotType,
    feedback: Option<String>,
    sequence_number: Option<u32>,
    estimated_speed: Option<String>,
}

/// Map an analysis result onto one time-ordered sequence of shot events.
///
/// Serves are listed before strokes and the sort is stable, so a serve and a
/// stroke at the same instant keep that order. Declared totals are copied as
/// reported and never reconciled with the number of shots.
pub fn normalize(result: &AnalysisResult, policy: TimestampPolicy) -> Result<OverlayData> {
    let serves = result.serves().iter().enumerate().map(|(index, serve)| PendingShot {
        label: format!("serve {}", serve.serve_number.unwrap_or(index as u32 + 1)),
        timestamp: &serve.timestamp,
        result: ShotResult::from_serve_result(&serve.result),
        shot_type: ShotType::Serve,
        feedback: serve.feedback.clone(),
        sequence_number: Some(serve.serve_number.unwrap_or(index as u32 + 1)),
        estimated_speed: serve.estimated_speed.clone(),
    });

    let strokes = result.strokes().iter().enumerate().map(|(index, stroke)| PendingShot {
        label: format!("stroke {}", stroke.stroke_number.unwrap_or(index as u32 + 1)),
        timestamp: &stroke.timestamp,
        result: ShotResult::from_stroke_quality(&stroke.quality),
        shot_type: ShotType::from_stroke_type(stroke.stroke_type.as_deref()),
        feedback: stroke.feedback.clone(),
        sequence_number: Some(stroke.stroke_number.unwrap_or(index as u32 + 1)),
        estimated_speed: None,
    });

    let mut shots = Vec::with_capacity(result.serves().len() + result.strokes().len());
    for pending in serves.chain(strokes) {
        let timestamp_seconds = match parse_timestamp(pending.timestamp) {
            Ok(seconds) => seconds,
            Err(source) => match policy {
                TimestampPolicy::Reject => {
                    return Err(CourtsideError::MalformedTimestamp {
                        shot: pending.label,
                        source,
                    });
                }
                TimestampPolicy::Skip => {
                    warn!("Skipping {}: {}", pending.label, source);
                    continue;
                }
                TimestampPolicy::ClampToZero => {
                    warn!("Placing {} at 0:00: {}", pending.label, source);
                    0.0
                }
            },
        };

        shots.push(ShotEvent {
            timestamp_seconds,
            result: pending.result,
            shot_type: pending.shot_type,
            feedback: pending.feedback,
            sequence_number: pending.sequence_number,
            estimated_speed: pending.estimated_speed,
        });
    }

    shots.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));

    debug!(
        "Normalized {} analysis into {} shots",
        result.kind().name(),
        shots.len()
    );

    Ok(OverlayData {
        total_shots_declared: result.total_serves() + result.total_strokes(),
        total_serves_declared: result.total_serves(),
        total_faults_declared: result.faults(),
        shots,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{timestamp::TimestampError, types::AnalysisOutcome};

    fn analysis(value: serde_json::Value) -> AnalysisResult {
        match AnalysisOutcome::classify(value).unwrap() {
            AnalysisOutcome::Analysis(result) => result,
            AnalysisOutcome::Failed(failure) => panic!("unexpected failure: {}", failure.error),
        }
    }

    #[test]
    fn interleaves_serves_and_strokes_by_time() {
        let result = analysis(json!({
            "totalServes": 2,
            "faults": 0,
            "totalStrokes": 1,
            "serves": [
                {"result": "Successful", "timestamp": "0:10.0"},
                {"result": "Successful", "timestamp": "0:02.0"}
            ],
            "strokes": [{"type": "Forehand", "quality": "Good", "timestamp": "0:05.0"}]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        let order: Vec<(f64, ShotType)> = data
            .shots
            .iter()
            .map(|shot| (shot.timestamp_seconds, shot.shot_type))
            .collect();

        assert_eq!(
            order,
            vec![
                (2.0, ShotType::Serve),
                (5.0, ShotType::Forehand),
                (10.0, ShotType::Serve)
            ]
        );
    }

    #[test]
    fn equal_timestamps_keep_serves_first() {
        let result = analysis(json!({
            "strokes": [
                {"type": "Volley", "quality": "Poor", "timestamp": "0:04.0"},
                {"type": "Backhand", "quality": "Good", "timestamp": "0:01.0"}
            ],
            "serves": [{"result": "Fault", "timestamp": "0:04.0"}]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        let types: Vec<ShotType> = data.shots.iter().map(|shot| shot.shot_type).collect();
        assert_eq!(
            types,
            vec![ShotType::Backhand, ShotType::Serve, ShotType::Volley]
        );
    }

    #[test]
    fn unrecognized_outcomes_are_faults() {
        let result = analysis(json!({
            "serves": [
                {"result": "Unknown", "timestamp": "0:01.0"},
                {"result": "successful", "timestamp": "0:02.0"},
                {"result": "Successful", "timestamp": "0:03.0"}
            ],
            "strokes": [
                {"type": "Forehand", "quality": "Mediocre", "timestamp": "0:04.0"},
                {"type": "Forehand", "quality": "Average", "timestamp": "0:05.0"},
                {"type": "Forehand", "quality": "Excellent", "timestamp": "0:06.0"}
            ]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        let results: Vec<ShotResult> = data.shots.iter().map(|shot| shot.result).collect();
        assert_eq!(
            results,
            vec![
                ShotResult::Fault,
                ShotResult::Fault,
                ShotResult::Successful,
                ShotResult::Fault,
                ShotResult::Fault,
                ShotResult::Successful
            ]
        );
    }

    #[test]
    fn stroke_types_are_lower_cased_with_other_fallback() {
        let result = analysis(json!({
            "strokes": [
                {"type": "BACKHAND", "quality": "Good", "timestamp": "0:01.0"},
                {"type": "Drop Shot", "quality": "Good", "timestamp": "0:02.0"},
                {"quality": "Good", "timestamp": "0:03.0"}
            ]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        let types: Vec<&str> = data.shots.iter().map(|shot| shot.shot_type.as_str()).collect();
        assert_eq!(types, vec!["backhand", "other", "other"]);
    }

    #[test]
    fn declared_totals_pass_through_unchecked() {
        let result = analysis(json!({
            "totalServes": 12,
            "faults": 4,
            "totalStrokes": 30,
            "serves": [{"result": "Fault", "timestamp": "0:01.0"}],
            "strokes": []
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        assert_eq!(data.total_shots_declared, 42);
        assert_eq!(data.total_serves_declared, 12);
        assert_eq!(data.total_faults_declared, 4);
        assert_eq!(data.shots.len(), 1);
    }

    #[test]
    fn sequence_numbers_fall_back_to_position() {
        let result = analysis(json!({
            "serves": [
                {"serveNumber": 7, "result": "Fault", "timestamp": "0:01.0"},
                {"result": "Fault", "timestamp": "0:02.0"}
            ]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        assert_eq!(data.shots[0].sequence_number, Some(7));
        assert_eq!(data.shots[1].sequence_number, Some(2));
    }

    #[test]
    fn empty_serves_without_strokes_key_is_empty() {
        let result = analysis(json!({"serves": []}));
        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.total_shots_declared, 0);
    }

    #[test]
    fn malformed_timestamp_policies() {
        let result = analysis(json!({
            "serves": [
                {"result": "Successful", "timestamp": "0:08.0"},
                {"serveNumber": 2, "result": "Successful", "timestamp": "soon"}
            ]
        }));

        let err = normalize(&result, TimestampPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            CourtsideError::MalformedTimestamp {
                ref shot,
                source: TimestampError::MissingSeparator(ref label),
            } if shot == "serve 2" && label == "soon"
        ));

        let skipped = normalize(&result, TimestampPolicy::Skip).unwrap();
        assert_eq!(skipped.shots.len(), 1);
        assert_eq!(skipped.shots[0].timestamp_seconds, 8.0);

        let clamped = normalize(&result, TimestampPolicy::ClampToZero).unwrap();
        assert_eq!(clamped.shots.len(), 2);
        assert_eq!(clamped.shots[0].timestamp_seconds, 0.0);
        assert_eq!(clamped.shots[0].sequence_number, Some(2));
    }

    #[test]
    fn speed_is_only_shown_for_serves_with_a_label() {
        let result = analysis(json!({
            "serves": [
                {"result": "Successful", "estimatedSpeed": "175 km/h", "timestamp": "0:01.0"},
                {"result": "Successful", "estimatedSpeed": "  ", "timestamp": "0:02.0"}
            ]
        }));

        let data = normalize(&result, TimestampPolicy::Reject).unwrap();
        assert_eq!(data.shots[0].display_speed(), Some("175 km/h"));
        assert_eq!(data.shots[1].display_speed(), None);
    }
}
