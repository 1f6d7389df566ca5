use crate::types::{AnalysisFailure, AnalysisOutcome, AnalysisResult};

/// Format seconds as M:SS timestamp, the notation the analysis uses
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_outcome_readable(outcome: &AnalysisOutcome) -> String {
    match outcome {
        AnalysisOutcome::Analysis(result) => format_analysis_readable(result),
        AnalysisOutcome::Failed(failure) => format_failure(failure),
    }
}

/// Format an analysis as human-readable markdown
pub fn format_analysis_readable(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} analysis\n\n", capitalize(result.kind().name())));

    output.push_str(&format!(
        "**Serves:** {} | **Faults:** {}",
        result.total_serves(),
        result.faults()
    ));
    if let AnalysisResult::Gameplay(gameplay) = result {
        output.push_str(&format!(" | **Strokes:** {}", gameplay.total_strokes));
    }
    output.push_str("\n\n");

    if !result.serves().is_empty() {
        output.push_str("## Serves\n\n");
        for (i, serve) in result.serves().iter().enumerate() {
            let number = serve.serve_number.unwrap_or(i as u32 + 1);
            output.push_str(&format!(
                "### #{} [{}] {}",
                number, serve.timestamp, serve.result
            ));
            if let Some(speed) = serve.estimated_speed.as_deref().map(str::trim) {
                if !speed.is_empty() {
                    output.push_str(&format!(" ({})", speed));
                }
            }
            output.push_str("\n\n");
            if let Some(feedback) = &serve.feedback {
                output.push_str(&format!("{}\n\n", feedback));
            }
        }
    }

    if !result.strokes().is_empty() {
        output.push_str("## Strokes\n\n");
        for (i, stroke) in result.strokes().iter().enumerate() {
            let number = stroke.stroke_number.unwrap_or(i as u32 + 1);
            output.push_str(&format!(
                "### #{} [{}] {} - {}\n\n",
                number,
                stroke.timestamp,
                stroke.stroke_type.as_deref().unwrap_or("Other"),
                stroke.quality
            ));
            if let Some(feedback) = &stroke.feedback {
                output.push_str(&format!("{}\n\n", feedback));
            }
        }
    }

    if !result.point_analysis().is_empty() {
        output.push_str("## Points\n\n");
        for (i, point) in result.point_analysis().iter().enumerate() {
            let number = point.point_number.unwrap_or(i as u32 + 1);
            output.push_str(&format!("{}. {}\n", number, point.description));
            if let Some(improvement) = &point.suggested_improvement {
                output.push_str(&format!("   Better: {}\n", improvement));
            }
        }
        output.push('\n');
    }

    if !result.overall_feedback().is_empty() {
        output.push_str("## Overall Feedback\n\n");
        output.push_str(result.overall_feedback());
        output.push('\n');
    }

    output
}

/// Failure text plus whatever the model said, so the user can see why.
pub fn format_failure(failure: &AnalysisFailure) -> String {
    let mut output = format!("Analysis failed: {}\n", failure.error);
    if let Some(metadata) = &failure.metadata {
        output.push_str(&format!(
            "Player: {} | Type: {}\n",
            metadata.player, metadata.analysis_type
        ));
    }
    if let Some(raw) = &failure.raw_response {
        output.push_str("\nRaw response:\n");
        output.push_str(raw);
        output.push('\n');
    }
    output
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
