use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CourtsideError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    ServeOnly,
    #[serde(alias = "full-gameplay")]
    Gameplay,
}

impl AnalysisKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::ServeOnly => "serve-only",
            AnalysisKind::Gameplay => "full-gameplay",
        }
    }

    /// Inverse of [`AnalysisKind::name`]. Also accepts `gameplay`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "serve-only" => Some(AnalysisKind::ServeOnly),
            "full-gameplay" | "gameplay" => Some(AnalysisKind::Gameplay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeEntry {
    #[serde(default)]
    pub serve_number: Option<u32>,
    #[serde(default)]
    pub estimated_speed: Option<String>,
    /// "Successful" or "Fault"; anything else is kept verbatim and scored as a fault.
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub feedback: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeEntry {
    #[serde(default)]
    pub stroke_number: Option<u32>,
    #[serde(rename = "type", default)]
    pub stroke_type: Option<String>,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub feedback: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointAnalysis {
    #[serde(default)]
    pub point_number: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggested_improvement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeOnlyAnalysis {
    #[serde(default)]
    pub total_serves: u32,
    #[serde(default)]
    pub faults: u32,
    #[serde(default)]
    pub serves: Vec<ServeEntry>,
    #[serde(default)]
    pub overall_feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameplayAnalysis {
    #[serde(default)]
    pub total_serves: u32,
    #[serde(default)]
    pub faults: u32,
    #[serde(default)]
    pub total_strokes: u32,
    #[serde(default)]
    pub serves: Vec<ServeEntry>,
    #[serde(default)]
    pub strokes: Vec<StrokeEntry>,
    #[serde(default)]
    pub point_analysis: Vec<PointAnalysis>,
    #[serde(default)]
    pub overall_feedback: String,
}

/// A structurally valid analysis, dispatched once at the boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Gameplay(GameplayAnalysis),
    ServeOnly(ServeOnlyAnalysis),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::ServeOnly(_) => AnalysisKind::ServeOnly,
            AnalysisResult::Gameplay(_) => AnalysisKind::Gameplay,
        }
    }

    pub fn serves(&self) -> &[ServeEntry] {
        match self {
            AnalysisResult::ServeOnly(a) => &a.serves,
            AnalysisResult::Gameplay(a) => &a.serves,
        }
    }

    pub fn strokes(&self) -> &[StrokeEntry] {
        match self {
            AnalysisResult::ServeOnly(_) => &[],
            AnalysisResult::Gameplay(a) => &a.strokes,
        }
    }

    pub fn point_analysis(&self) -> &[PointAnalysis] {
        match self {
            AnalysisResult::ServeOnly(_) => &[],
            AnalysisResult::Gameplay(a) => &a.point_analysis,
        }
    }

    pub fn total_serves(&self) -> u32 {
        match self {
            AnalysisResult::ServeOnly(a) => a.total_serves,
            AnalysisResult::Gameplay(a) => a.total_serves,
        }
    }

    pub fn total_strokes(&self) -> u32 {
        match self {
            AnalysisResult::ServeOnly(_) => 0,
            AnalysisResult::Gameplay(a) => a.total_strokes,
        }
    }

    pub fn faults(&self) -> u32 {
        match self {
            AnalysisResult::ServeOnly(a) => a.faults,
            AnalysisResult::Gameplay(a) => a.faults,
        }
    }

    pub fn overall_feedback(&self) -> &str {
        match self {
            AnalysisResult::ServeOnly(a) => &a.overall_feedback,
            AnalysisResult::Gameplay(a) => &a.overall_feedback,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub player: String,
    pub analysis_type: String,
    #[serde(default)]
    pub video_file: Option<String>,
}

/// The external analysis collaborator could not produce structured output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Failed(AnalysisFailure),
    Analysis(AnalysisResult),
}

impl<'de> Deserialize<'de> for AnalysisOutcome {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        AnalysisOutcome::classify(value).map_err(serde::de::Error::custom)
    }
}

impl AnalysisOutcome {
    /// Schema check for a raw JSON value returned by the analysis collaborator.
    ///
    /// An object carrying a string `error` is a failure; one that reports strokes
    /// (`totalStrokes` or a `strokes` array) is a full-gameplay analysis; any other
    /// object is serve-only. Absent totals and arrays default to zero and empty.
    pub fn classify(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(CourtsideError::InvalidAnalysis {
                reason: format!("expected a JSON object, got {}", json_kind(&value)),
            });
        };

        if object.get("error").is_some_and(Value::is_string) {
            return Ok(AnalysisOutcome::Failed(decode(value)?));
        }

        let has_strokes = object.get("totalStrokes").is_some_and(Value::is_number)
            || object.get("strokes").is_some_and(Value::is_array);

        let result = if has_strokes {
            AnalysisResult::Gameplay(decode(value)?)
        } else {
            AnalysisResult::ServeOnly(decode(value)?)
        };

        Ok(AnalysisOutcome::Analysis(result))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::classify(value)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CourtsideError::InvalidAnalysis {
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_serve_only_result() {
        let outcome = AnalysisOutcome::classify(json!({
            "totalServes": 2,
            "faults": 1,
            "serves": [
                {"serveNumber": 1, "estimatedSpeed": "160 km/h", "result": "Successful",
                 "feedback": "Good toss", "timestamp": "0:03.5"},
                {"serveNumber": 2, "estimatedSpeed": "Unable to estimate", "result": "Fault",
                 "feedback": "Rushed", "timestamp": "0:11.0"}
            ],
            "overallFeedback": "Stay loose"
        }))
        .unwrap();

        let AnalysisOutcome::Analysis(AnalysisResult::ServeOnly(analysis)) = outcome else {
            panic!("expected serve-only analysis");
        };
        assert_eq!(analysis.total_serves, 2);
        assert_eq!(analysis.serves.len(), 2);
        assert_eq!(analysis.serves[0].estimated_speed.as_deref(), Some("160 km/h"));
        assert_eq!(analysis.overall_feedback, "Stay loose");
    }

    #[test]
    fn classifies_gameplay_result() {
        let outcome = AnalysisOutcome::classify(json!({
            "totalServes": 1,
            "faults": 0,
            "totalStrokes": 1,
            "serves": [{"serveNumber": 1, "estimatedSpeed": "150 km/h", "result": "Successful",
                        "feedback": "", "timestamp": "0:01.0"}],
            "strokes": [{"strokeNumber": 1, "type": "Backhand", "quality": "Good",
                         "feedback": "Early prep", "timestamp": "0:04.0"}],
            "pointAnalysis": [{"pointNumber": 1, "description": "Long rally",
                               "suggestedImprovement": "Approach the net"}],
            "overallFeedback": "Nice"
        }))
        .unwrap();

        let AnalysisOutcome::Analysis(result) = outcome else {
            panic!("expected an analysis");
        };
        assert_eq!(result.kind(), AnalysisKind::Gameplay);
        assert_eq!(result.strokes()[0].stroke_type.as_deref(), Some("Backhand"));
        assert_eq!(result.point_analysis().len(), 1);
        assert_eq!(result.total_strokes(), 1);
    }

    #[test]
    fn strokes_array_without_total_is_still_gameplay() {
        let outcome = AnalysisOutcome::classify(json!({
            "serves": [],
            "strokes": [{"type": "Volley", "quality": "Poor", "timestamp": "0:02.0"}]
        }))
        .unwrap();

        let AnalysisOutcome::Analysis(result) = outcome else {
            panic!("expected an analysis");
        };
        assert_eq!(result.kind(), AnalysisKind::Gameplay);
        assert_eq!(result.total_strokes(), 0);
    }

    #[test]
    fn classifies_error_variant_with_raw_response() {
        let outcome = AnalysisOutcome::classify(json!({
            "error": "Failed to parse analysis",
            "rawResponse": "Sorry, I can't watch videos",
            "metadata": {"player": "Roger Federer", "analysisType": "serve-only"}
        }))
        .unwrap();

        let AnalysisOutcome::Failed(failure) = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(failure.error, "Failed to parse analysis");
        assert_eq!(failure.raw_response.as_deref(), Some("Sorry, I can't watch videos"));
        assert_eq!(failure.metadata.unwrap().player, "Roger Federer");
    }

    #[test]
    fn missing_arrays_and_totals_default_to_empty() {
        let outcome = AnalysisOutcome::classify(json!({"serves": []})).unwrap();

        let AnalysisOutcome::Analysis(result) = outcome else {
            panic!("expected an analysis");
        };
        assert_eq!(result.kind(), AnalysisKind::ServeOnly);
        assert!(result.serves().is_empty());
        assert!(result.strokes().is_empty());
        assert_eq!(result.total_serves(), 0);
    }

    #[test]
    fn rejects_non_objects_and_mistyped_fields() {
        assert!(matches!(
            AnalysisOutcome::classify(json!([1, 2, 3])),
            Err(CourtsideError::InvalidAnalysis { .. })
        ));
        assert!(matches!(
            AnalysisOutcome::classify(json!({"serves": "none"})),
            Err(CourtsideError::InvalidAnalysis { .. })
        ));
    }

    #[test]
    fn round_trips_through_json_text() {
        let text = r#"{"totalServes":1,"faults":0,"serves":[{"result":"Successful","timestamp":"0:01.0"}],"overallFeedback":""}"#;
        let outcome = AnalysisOutcome::from_json_str(text).unwrap();
        let again = serde_json::to_value(&outcome).unwrap();
        assert_eq!(again["totalServes"], 1);
        assert_eq!(again["serves"][0]["timestamp"], "0:01.0");
    }
}
