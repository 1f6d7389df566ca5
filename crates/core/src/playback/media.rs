use serde::{Deserialize, Serialize};

use crate::{error::Result, overlay::Size, registry::PlayableSource};

/// Notifications a media element raises about its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEvent {
    LoadedMetadata,
    TimeUpdate,
    Play,
    Pause,
}

/// The playing video. Its clock is the only source of truth for playback time.
///
/// `play` and `pause` only request a transition; the element confirms it later
/// with a `Play` or `Pause` notification.
pub trait MediaElement {
    fn load(&mut self, source: &PlayableSource);
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
    /// `NaN` until metadata has loaded.
    fn duration(&self) -> f64;
    fn paused(&self) -> bool;
    /// On-screen box of the element, in CSS pixels.
    fn rendered_box(&self) -> Size;
}
