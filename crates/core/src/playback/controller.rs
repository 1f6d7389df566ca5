use log::{debug, warn};
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    error::Result,
    playback::media::{MediaElement, MediaEvent},
    registry::PlayableSource,
};

/// Transport state mirrored from the media element, for any UI to bind to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
}

pub struct PlaybackController<M> {
    media: M,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
}

impl<M: MediaElement> PlaybackController<M> {
    pub fn new(media: M) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        Self {
            media,
            state: PlaybackState::default(),
            state_tx,
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Mirror a notification from the media element.
    pub fn observe(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata => {
                self.state.duration = known_duration(self.media.duration());
                self.state.current_time = self.media.current_time();
            }
            MediaEvent::TimeUpdate => self.state.current_time = self.media.current_time(),
            MediaEvent::Play => self.state.is_playing = true,
            MediaEvent::Pause => {
                self.state.is_playing = false;
                self.state.current_time = self.media.current_time();
            }
        }
        self.publish();
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if self.state.is_playing {
            self.media.pause();
            Ok(())
        } else {
            self.media.play()
        }
    }

    pub fn play(&mut self) -> Result<()> {
        if self.state.is_playing {
            return Ok(());
        }
        self.media.play()
    }

    pub fn pause(&mut self) {
        if self.state.is_playing {
            self.media.pause();
        }
    }

    pub fn restart(&mut self) {
        self.scrub(0.0);
    }

    /// Seek to `seconds`, clamped to `[0, duration]`. Returns the applied time.
    pub fn scrub(&mut self, seconds: f64) -> f64 {
        let target = clamp_seek(seconds, self.state.duration);
        if target != seconds {
            warn!("Seek to {seconds}s clamped to {target}s");
        }
        self.media.seek(target);
        self.state.current_time = target;
        self.publish();
        target
    }

    /// Point the element at a new source. Everything mirrored so far is stale.
    pub fn load(&mut self, source: &PlayableSource) {
        debug!("Loading media source {}", source);
        self.media.load(source);
        self.state = PlaybackState::default();
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state);
    }
}

fn known_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

fn clamp_seek(seconds: f64, duration: f64) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    seconds.clamp(0.0, known_duration(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::CourtsideError, overlay::Size};

    #[derive(Default)]
    struct FakeMedia {
        time: f64,
        duration: f64,
        paused: bool,
        play_calls: u32,
        pause_calls: u32,
        seeks: Vec<f64>,
        refuse_play: bool,
    }

    impl MediaElement for FakeMedia {
        fn load(&mut self, _source: &PlayableSource) {
            self.time = 0.0;
            self.paused = true;
        }

        fn play(&mut self) -> Result<()> {
            if self.refuse_play {
                return Err(CourtsideError::Playback {
                    reason: "autoplay blocked".to_string(),
                });
            }
            self.play_calls += 1;
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) {
            self.pause_calls += 1;
            self.paused = true;
        }

        fn seek(&mut self, seconds: f64) {
            self.seeks.push(seconds);
            self.time = seconds;
        }

        fn current_time(&self) -> f64 {
            self.time
        }

        fn duration(&self) -> f64 {
            self.duration
        }

        fn paused(&self) -> bool {
            self.paused
        }

        fn rendered_box(&self) -> Size {
            Size::new(640.0, 360.0)
        }
    }

    fn loaded(duration: f64) -> PlaybackController<FakeMedia> {
        let mut controller = PlaybackController::new(FakeMedia {
            duration,
            paused: true,
            ..FakeMedia::default()
        });
        controller.observe(MediaEvent::LoadedMetadata);
        controller
    }

    #[test]
    fn mirrors_media_notifications() {
        let mut controller = loaded(90.0);
        assert_eq!(controller.state().duration, 90.0);
        assert!(!controller.state().is_playing);

        controller.toggle_play_pause().unwrap();
        assert!(
            !controller.state().is_playing,
            "state only changes once the element confirms"
        );

        controller.observe(MediaEvent::Play);
        assert!(controller.state().is_playing);

        controller.media.time = 12.5;
        controller.observe(MediaEvent::TimeUpdate);
        assert_eq!(controller.state().current_time, 12.5);

        controller.toggle_play_pause().unwrap();
        controller.observe(MediaEvent::Pause);
        assert!(!controller.state().is_playing);
        assert_eq!(controller.media().play_calls, 1);
        assert_eq!(controller.media().pause_calls, 1);
    }

    #[test]
    fn scrub_clamps_to_media_range() {
        let mut controller = loaded(60.0);

        assert_eq!(controller.scrub(75.0), 60.0);
        assert_eq!(controller.scrub(-3.0), 0.0);
        assert_eq!(controller.scrub(f64::NAN), 0.0);
        assert_eq!(controller.scrub(30.0), 30.0);
        assert_eq!(controller.media().seeks, vec![60.0, 0.0, 0.0, 30.0]);
        assert_eq!(controller.state().current_time, 30.0);
    }

    #[test]
    fn scrub_before_metadata_stays_at_zero() {
        let mut controller = PlaybackController::new(FakeMedia {
            duration: f64::NAN,
            ..FakeMedia::default()
        });
        assert_eq!(controller.scrub(10.0), 0.0);
    }

    #[test]
    fn restart_seeks_to_zero() {
        let mut controller = loaded(60.0);
        controller.scrub(42.0);
        controller.restart();
        assert_eq!(controller.state().current_time, 0.0);
        assert_eq!(controller.media().seeks.last(), Some(&0.0));
    }

    #[test]
    fn refused_play_surfaces_error() {
        let mut controller = loaded(60.0);
        controller.media.refuse_play = true;
        assert!(matches!(
            controller.toggle_play_pause(),
            Err(CourtsideError::Playback { .. })
        ));
        assert!(!controller.state().is_playing);
    }

    #[test]
    fn subscribers_see_latest_state() {
        let mut controller = loaded(60.0);
        let rx = controller.subscribe();
        controller.scrub(15.0);
        assert_eq!(rx.borrow().current_time, 15.0);
        assert_eq!(rx.borrow().duration, 60.0);
    }

    #[test]
    fn load_resets_mirrored_state() {
        let mut controller = loaded(60.0);
        controller.observe(MediaEvent::Play);
        controller.load(&PlayableSource::new("file:///next.mp4"));
        assert_eq!(controller.state(), PlaybackState::default());
    }
}
