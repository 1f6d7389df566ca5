use crate::{normalize::OverlayData, playback::MediaEvent, registry::PlayableSource};

/// User intent coming from the transport controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    TogglePlayPause,
    Play,
    Pause,
    Restart,
    Scrub(f64),
}

/// Everything an overlay session reacts to, delivered through one inbox.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Media(MediaEvent),
    Command(PlaybackCommand),
    /// The video's rendered box may have changed.
    Resized,
    /// A new video was selected together with its analysis.
    SourceChanged {
        source: PlayableSource,
        overlay: OverlayData,
    },
}

impl From<MediaEvent> for SessionInput {
    fn from(event: MediaEvent) -> Self {
        SessionInput::Media(event)
    }
}

impl From<PlaybackCommand> for SessionInput {
    fn from(command: PlaybackCommand) -> Self {
        SessionInput::Command(command)
    }
}
