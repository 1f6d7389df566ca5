use std::{collections::HashMap, fmt, path::Path, time::Duration};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{CourtsideError, Result};

pub const ACCEPTED_MIME_TYPE: &str = "video/mp4";
pub const MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;
/// Uploads are kept for a day.
pub const BLOB_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// URL a media element can load. The overlay never sees anything else about
/// where the video came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayableSource(String);

impl PlayableSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An uploaded video held in memory.
#[derive(Debug, Clone)]
pub struct VideoBlob {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl VideoBlob {
    /// Accepts only MP4 files up to 200 MiB.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let mime_type = mime_type.into();
        validate_upload(&name, &mime_type, data.len() as u64)?;
        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    /// Read a local file as an upload. The size is checked before reading.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_type_for(path);
        let size = tokio::fs::metadata(path).await?.len();
        validate_upload(&name, mime_type, size)?;

        let data = tokio::fs::read(path).await?;
        Self::new(name, mime_type, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

fn validate_upload(name: &str, mime_type: &str, size: u64) -> Result<()> {
    if mime_type != ACCEPTED_MIME_TYPE {
        return Err(CourtsideError::InvalidUpload {
            name: name.to_string(),
            reason: format!("expected {ACCEPTED_MIME_TYPE}, got {mime_type}"),
        });
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(CourtsideError::InvalidUpload {
            name: name.to_string(),
            reason: format!(
                "{:.1} MiB exceeds the {} MiB limit",
                size as f64 / (1024.0 * 1024.0),
                MAX_UPLOAD_BYTES / (1024 * 1024)
            ),
        });
    }
    Ok(())
}

/// Storage for uploaded videos, addressed by id.
pub trait BlobRegistry {
    fn put(&mut self, id: Uuid, blob: VideoBlob);
    fn get(&self, id: &Uuid) -> Option<&VideoBlob>;
    fn remove(&mut self, id: &Uuid) -> Option<VideoBlob>;
    /// Drop every blob stored longer than `max_age`. Returns how many went.
    fn prune_older_than(&mut self, max_age: Duration) -> usize;

    /// Store `blob` under a fresh id. Blobs older than [`BLOB_MAX_AGE`] are
    /// dropped first.
    fn register(&mut self, blob: VideoBlob) -> Uuid {
        self.prune_older_than(BLOB_MAX_AGE);
        let id = Uuid::new_v4();
        self.put(id, blob);
        id
    }

    fn resolve_source(&self, id: &Uuid) -> Option<PlayableSource> {
        self.get(id)
            .map(|_| PlayableSource::new(format!("blob:courtside/{id}")))
    }
}

struct StoredBlob {
    blob: VideoBlob,
    stored_at: Instant,
}

#[derive(Default)]
pub struct InMemoryBlobRegistry {
    blobs: HashMap<Uuid, StoredBlob>,
}

impl InMemoryBlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobRegistry for InMemoryBlobRegistry {
    fn put(&mut self, id: Uuid, blob: VideoBlob) {
        debug!("Registering {} ({} bytes) as {id}", blob.name(), blob.len());
        self.blobs.insert(
            id,
            StoredBlob {
                blob,
                stored_at: Instant::now(),
            },
        );
    }

    fn get(&self, id: &Uuid) -> Option<&VideoBlob> {
        self.blobs.get(id).map(|stored| &stored.blob)
    }

    fn remove(&mut self, id: &Uuid) -> Option<VideoBlob> {
        self.blobs.remove(id).map(|stored| stored.blob)
    }

    fn prune_older_than(&mut self, max_age: Duration) -> usize {
        let before = self.blobs.len();
        self.blobs
            .retain(|_, stored| stored.stored_at.elapsed() <= max_age);
        let pruned = before - self.blobs.len();
        if pruned > 0 {
            info!("Pruned {pruned} expired video blob(s)");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp4(name: &str) -> VideoBlob {
        VideoBlob::new(name, "video/mp4", vec![0u8; 16]).unwrap()
    }

    #[test]
    fn rejects_non_mp4_uploads() {
        let err = VideoBlob::new("clip.webm", "video/webm", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, CourtsideError::InvalidUpload { ref name, .. } if name == "clip.webm"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_upload("a.mp4", "video/mp4", MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_upload("a.mp4", "video/mp4", MAX_UPLOAD_BYTES + 1).is_err());
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(mime_type_for(Path::new("match.MP4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("match.mov")), "video/quicktime");
        assert_eq!(mime_type_for(Path::new("match")), "application/octet-stream");
    }

    #[test]
    fn resolves_only_registered_blobs() {
        let mut registry = InMemoryBlobRegistry::new();
        let id = registry.register(mp4("serve.mp4"));

        let source = registry.resolve_source(&id).unwrap();
        assert_eq!(source.as_str(), format!("blob:courtside/{id}"));
        assert_eq!(registry.get(&id).unwrap().name(), "serve.mp4");

        assert!(registry.remove(&id).is_some());
        assert!(registry.resolve_source(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn prunes_only_expired_blobs() {
        let mut registry = InMemoryBlobRegistry::new();
        let old = registry.register(mp4("old.mp4"));
        tokio::time::advance(Duration::from_secs(120)).await;
        let fresh = registry.register(mp4("fresh.mp4"));

        assert_eq!(registry.prune_older_than(Duration::from_secs(60)), 1);
        assert!(registry.get(&old).is_none());
        assert!(registry.get(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn registering_drops_day_old_uploads() {
        let mut registry = InMemoryBlobRegistry::new();
        let stale = registry.register(mp4("yesterday.mp4"));
        tokio::time::advance(BLOB_MAX_AGE + Duration::from_secs(1)).await;

        let today = registry.register(mp4("today.mp4"));
        assert!(registry.resolve_source(&stale).is_none());
        assert!(registry.resolve_source(&today).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn reads_upload_from_disk() {
        let path = std::env::temp_dir().join(format!("courtside-{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&path, b"not really a video").await.unwrap();

        let blob = VideoBlob::from_file(&path).await.unwrap();
        assert_eq!(blob.mime_type(), "video/mp4");
        assert_eq!(blob.len(), 18);

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
