use std::{
    hash::{DefaultHasher, Hash, Hasher},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::warn;
use tokio::fs;

use crate::{
    error::Result,
    provider::Provider,
    types::{AnalysisKind, AnalysisMetadata, AnalysisOutcome},
};

/// One analysis found in the cache.
#[derive(Debug, Clone)]
pub struct CachedAnalysis {
    pub provider: Provider,
    pub kind: AnalysisKind,
    pub modified: SystemTime,
    pub path: PathBuf,
    /// Who and what was analyzed, when the run recorded it.
    pub metadata: Option<AnalysisMetadata>,
    pub outcome: AnalysisOutcome,
}

/// Get the cache directory for a given video URL
pub fn get_cache_dir(video_url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    video_url.hash(&mut hasher);
    let url_hash = hasher.finish();

    get_root_cache_dir().join(url_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("courtside")
}

/// Get the path for a cached analysis (provider and kind aware)
pub fn get_analysis_path(cache_dir: &Path, provider: &Provider, kind: AnalysisKind) -> PathBuf {
    cache_dir.join(format!("analysis_{}_{}.json", provider.id(), kind.name()))
}

/// Which video and player a cache directory belongs to
pub fn get_metadata_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("source.json")
}

fn parse_analysis_file_name(name: &str) -> Option<(Provider, AnalysisKind)> {
    let stem = name.strip_prefix("analysis_")?.strip_suffix(".json")?;
    let (provider, kind) = stem.split_once('_')?;
    Some((Provider::from_id(provider)?, AnalysisKind::from_name(kind)?))
}

pub async fn load_analysis(path: &Path) -> Result<AnalysisOutcome> {
    let json_content = fs::read_to_string(path).await?;
    AnalysisOutcome::from_json_str(&json_content)
}

/// Save an analysis to a file, creating its directory if needed
pub async fn save_analysis(outcome: &AnalysisOutcome, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(outcome)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

pub async fn save_metadata(metadata: &AnalysisMetadata, cache_dir: &Path) -> Result<()> {
    fs::create_dir_all(cache_dir).await?;
    let pretty_json = serde_json::to_string_pretty(metadata)?;
    fs::write(get_metadata_path(cache_dir), &pretty_json).await?;
    Ok(())
}

async fn load_metadata(cache_dir: &Path) -> Option<AnalysisMetadata> {
    let json_content = fs::read_to_string(get_metadata_path(cache_dir)).await.ok()?;
    serde_json::from_str(&json_content).ok()
}

/// Every cached analysis under `root`, newest first. Files that no longer
/// parse are skipped with a warning.
pub async fn list_cached_analyses(root: &Path) -> Result<Vec<CachedAnalysis>> {
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let cache_dir = entry.path();
        let metadata = load_metadata(&cache_dir).await;

        let mut files = fs::read_dir(&cache_dir).await?;
        while let Some(file) = files.next_entry().await? {
            let name = file.file_name();
            let Some((provider, kind)) = parse_analysis_file_name(&name.to_string_lossy()) else {
                continue;
            };
            let path = file.path();
            let outcome = match load_analysis(&path).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Skipping unreadable analysis {}: {e}", path.display());
                    continue;
                }
            };
            found.push(CachedAnalysis {
                provider,
                kind,
                modified: file.metadata().await?.modified()?,
                path,
                metadata: metadata.clone(),
                outcome,
            });
        }
    }

    found.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(found)
}
