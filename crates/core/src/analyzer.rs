use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::{
    error::{CourtsideError, Result},
    prompts::analysis_prompt,
    provider::{Provider, ProviderApi},
    registry::ACCEPTED_MIME_TYPE,
    types::{AnalysisFailure, AnalysisKind, AnalysisMetadata, AnalysisOutcome},
};

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub video_url: String,
    pub player: String,
    pub kind: AnalysisKind,
}

impl AnalysisRequest {
    pub fn metadata(&self) -> AnalysisMetadata {
        AnalysisMetadata {
            player: self.player.clone(),
            analysis_type: self.kind.name().to_string(),
            video_file: Some(self.video_url.clone()),
        }
    }
}

/// Something that watches a tennis video and answers with JSON text.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// The model's raw reply. May still be wrapped in markdown.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String>;
}

pub struct ProviderAnalyzer {
    provider: Provider,
    client: reqwest::Client,
}

impl ProviderAnalyzer {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

#[async_trait]
impl Analyzer for ProviderAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        let config = self.provider.config();
        let api_key = self.provider.validate_api_key()?;

        info!(
            "Requesting {} analysis from {} ({})",
            request.kind.name(),
            self.provider.name(),
            config.model
        );

        let builder = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json");
        let builder = match config.api {
            ProviderApi::GenerateContent => builder.header("x-goog-api-key", &api_key),
            ProviderApi::ChatCompletions => {
                builder.header("Authorization", format!("Bearer {}", api_key))
            }
        };

        let response = builder
            .json(&request_body(config.api, config.model, request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CourtsideError::ReportFailed {
                reason: format!("{} returned {}: {}", self.provider.name(), status, body),
            });
        }

        let response: Value = serde_json::from_str(&body)?;
        let content = reply_text(config.api, &response).ok_or_else(|| CourtsideError::ReportFailed {
            reason: format!("Invalid API response: {:?}", response),
        })?;

        debug!("{} replied with {} bytes", self.provider.name(), content.len());
        Ok(content)
    }
}

fn request_body(api: ProviderApi, model: &str, request: &AnalysisRequest) -> Value {
    let prompt = format!(
        "{}\n\nAnalyze only key moments and keep feedback concise.",
        analysis_prompt(request.kind, &request.player)
    );

    match api {
        ProviderApi::GenerateContent => json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        { "text": prompt },
                        {
                            "file_data": {
                                "mime_type": ACCEPTED_MIME_TYPE,
                                "file_uri": request.video_url,
                            },
                        },
                    ],
                },
            ],
            "generation_config": {
                "temperature": 0.3,
                "response_mime_type": "application/json",
                "response_schema": response_schema(request.kind),
            },
        }),
        // Chat completions have no portable video part, so the link rides along
        // in the text.
        ProviderApi::ChatCompletions => json!({
            "model": model,
            "messages": [
                {
                    "role": "user",
                    "content": format!(
                        "{prompt}\n\nVideo ({ACCEPTED_MIME_TYPE}): {}",
                        request.video_url
                    ),
                },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.3,
        }),
    }
}

fn reply_text(api: ProviderApi, response: &Value) -> Option<String> {
    match api {
        ProviderApi::GenerateContent => {
            let parts = response["candidates"][0]["content"]["parts"].as_array()?;
            let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();
            (!text.is_empty()).then_some(text)
        }
        ProviderApi::ChatCompletions => response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
    }
}

/// Structured-output schema for one analysis kind, in the OpenAPI subset
/// `generateContent` accepts.
fn response_schema(kind: AnalysisKind) -> Value {
    let serves = json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "serveNumber": { "type": "INTEGER" },
                "estimatedSpeed": { "type": "STRING" },
                "result": { "type": "STRING", "enum": ["Successful", "Fault"] },
                "feedback": { "type": "STRING" },
                "timestamp": { "type": "STRING" },
            },
            "required": ["serveNumber", "estimatedSpeed", "result", "feedback", "timestamp"],
        },
    });

    match kind {
        AnalysisKind::ServeOnly => json!({
            "type": "OBJECT",
            "properties": {
                "totalServes": { "type": "INTEGER" },
                "faults": { "type": "INTEGER" },
                "serves": serves,
                "overallFeedback": { "type": "STRING" },
            },
            "required": ["totalServes", "faults", "serves", "overallFeedback"],
        }),
        AnalysisKind::Gameplay => json!({
            "type": "OBJECT",
            "properties": {
                "totalServes": { "type": "INTEGER" },
                "faults": { "type": "INTEGER" },
                "totalStrokes": { "type": "INTEGER" },
                "serves": serves,
                "strokes": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "strokeNumber": { "type": "INTEGER" },
                            "type": {
                                "type": "STRING",
                                "enum": ["Forehand", "Backhand", "Volley", "Other"],
                            },
                            "quality": {
                                "type": "STRING",
                                "enum": ["Excellent", "Good", "Average", "Poor"],
                            },
                            "feedback": { "type": "STRING" },
                            "timestamp": { "type": "STRING" },
                        },
                        "required": ["strokeNumber", "type", "quality", "feedback", "timestamp"],
                    },
                },
                "pointAnalysis": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "pointNumber": { "type": "INTEGER" },
                            "description": { "type": "STRING" },
                            "suggestedImprovement": { "type": "STRING" },
                        },
                        "required": ["pointNumber", "description", "suggestedImprovement"],
                    },
                },
                "overallFeedback": { "type": "STRING" },
            },
            "required": [
                "totalServes",
                "faults",
                "totalStrokes",
                "serves",
                "strokes",
                "pointAnalysis",
                "overallFeedback",
            ],
        }),
    }
}

/// Run one analysis. Never fails: anything that goes wrong comes back as
/// `AnalysisOutcome::Failed`, with the model's reply when there was one.
pub async fn run_analysis(analyzer: &dyn Analyzer, request: &AnalysisRequest) -> AnalysisOutcome {
    let raw = match analyzer.analyze(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Analysis request failed: {e}");
            return failed_outcome(format!("Failed to analyze video: {e}"), None, request);
        }
    };

    match AnalysisOutcome::from_json_str(extract_json_payload(&raw)) {
        Ok(AnalysisOutcome::Failed(mut failure)) => {
            failure.raw_response.get_or_insert(raw);
            failure.metadata.get_or_insert_with(|| request.metadata());
            AnalysisOutcome::Failed(failure)
        }
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Analysis reply is not a usable result: {e}");
            failed_outcome(format!("Failed to parse analysis: {e}"), Some(raw), request)
        }
    }
}

fn failed_outcome(error: String, raw_response: Option<String>, request: &AnalysisRequest) -> AnalysisOutcome {
    AnalysisOutcome::Failed(AnalysisFailure {
        error,
        raw_response,
        metadata: Some(request.metadata()),
    })
}

/// Pull the JSON object out of a reply that may be fenced in markdown or
/// surrounded by prose. Schema-constrained replies pass through untouched.
pub fn extract_json_payload(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(fenced) = trimmed.strip_prefix("```") {
        let body = fenced.split_once('\n').map_or("", |(_, rest)| rest);
        let body = body.trim_end();
        return body.strip_suffix("```").unwrap_or(body).trim();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
