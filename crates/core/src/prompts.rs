use crate::types::AnalysisKind;

const JSON_ONLY: &str =
    "IMPORTANT: Output ONLY valid JSON with NO additional text, explanations, or markdown formatting.";

const SERVE_SCHEMA: &str = r#"{
      "serveNumber": number,
      "estimatedSpeed": "X km/h" or "Unable to estimate",
      "result": "Successful" or "Fault",
      "feedback": "Detailed feedback from {player}'s perspective",
      "timestamp": "M:SS.S"
    }"#;

pub fn analysis_prompt(kind: AnalysisKind, player: &str) -> String {
    match kind {
        AnalysisKind::ServeOnly => serve_only_prompt(player),
        AnalysisKind::Gameplay => gameplay_prompt(player),
    }
}

fn serve_only_prompt(player: &str) -> String {
    let serve = SERVE_SCHEMA.replace("{player}", player);
    format!(
        r#"This is me serving - playing tennis slowed down.
Tell me how many serves I made and how many faults, and estimate the speed of each serve in km/h if you can.
On every serve give me feedback like you are {player}.
For each serve, provide the timestamp when the serve occurs (format: "M:SS.S" like "0:13.0").

{JSON_ONLY}

{{
  "totalServes": number,
  "faults": number,
  "serves": [
    {serve}
  ],
  "overallFeedback": "General advice from {player}"
}}"#
    )
}

fn gameplay_prompt(player: &str) -> String {
    let serve = SERVE_SCHEMA.replace("{player}", player);
    format!(
        r#"This is me playing tennis slowed down.
Tell me how many serves I made and how many faults, and estimate the speed of each serve in km/h if you can. Give me input on each forehand or backhand. If possible suggest a better way to play the point.
On every serve give me feedback like you are {player}.
For each serve and stroke, provide the timestamp when it occurs (format: "M:SS.S" like "0:13.0").

{JSON_ONLY}

{{
  "totalServes": number,
  "faults": number,
  "totalStrokes": number,
  "serves": [
    {serve}
  ],
  "strokes": [
    {{
      "strokeNumber": number,
      "type": "Forehand" or "Backhand" or "Volley" or "Other",
      "quality": "Excellent" or "Good" or "Average" or "Poor",
      "feedback": "Technical feedback on the stroke",
      "timestamp": "M:SS.S"
    }}
  ],
  "pointAnalysis": [
    {{
      "pointNumber": number,
      "description": "Brief description of the point",
      "suggestedImprovement": "How {player} would suggest playing this point better"
    }}
  ],
  "overallFeedback": "General advice from {player} on gameplay and strategy"
}}"#
    )
}
