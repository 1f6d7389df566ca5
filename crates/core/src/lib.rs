pub mod analyzer;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod normalize;
pub mod overlay;
pub mod playback;
pub mod prompts;
pub mod provider;
pub mod registry;
pub mod session;
pub mod stats;
pub mod timestamp;
pub mod types;

pub use analyzer::{AnalysisRequest, Analyzer, ProviderAnalyzer, extract_json_payload, run_analysis};
pub use cache::{
    CachedAnalysis, get_analysis_path, get_cache_dir, get_root_cache_dir, list_cached_analyses,
    load_analysis, save_analysis, save_metadata,
};
pub use config::{OverlayConfig, OverlayTheme, TimestampPolicy};
pub use error::{CourtsideError, Result};
pub use format::{format_analysis_readable, format_failure, format_outcome_readable, format_timestamp};
pub use normalize::{OverlayData, ShotEvent, ShotResult, ShotType, normalize};
pub use overlay::{Canvas, DisplayList, DrawCommand, FrameInput, OverlayRenderer, Size};
pub use playback::{MediaElement, MediaEvent, PlaybackController, PlaybackState, SimulatedMedia};
pub use provider::{Provider, ProviderApi, ProviderConfig};
pub use registry::{BlobRegistry, InMemoryBlobRegistry, PlayableSource, VideoBlob};
pub use session::{OverlaySession, PlaybackCommand, SessionInput, SessionReport};
pub use stats::{LiveStats, current_shot};
pub use timestamp::{TimestampError, parse_timestamp};
pub use types::{AnalysisFailure, AnalysisKind, AnalysisMetadata, AnalysisOutcome, AnalysisResult};
