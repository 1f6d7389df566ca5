use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};

use crate::{
    config::OverlayConfig,
    error::Result,
    normalize::OverlayData,
    overlay::{Canvas, FrameInput, OverlayRenderer},
    playback::{MediaElement, PlaybackController, PlaybackState},
    session::{PlaybackCommand, RedrawTicker, SessionInput},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub frames_drawn: u64,
    pub ticks: u64,
}

/// Keeps the overlay on `canvas` in step with the video playing in `M`.
///
/// Redraws on every playback tick while playing, and on demand (seek, resize,
/// source change, pause) while not.
pub struct OverlaySession<M, C> {
    controller: PlaybackController<M>,
    renderer: OverlayRenderer,
    canvas: C,
    overlay: OverlayData,
    refresh_interval: Duration,
    report: SessionReport,
}

impl<M: MediaElement, C: Canvas> OverlaySession<M, C> {
    pub fn new(media: M, canvas: C, overlay: OverlayData, config: &OverlayConfig) -> Self {
        Self {
            controller: PlaybackController::new(media),
            renderer: OverlayRenderer::new(config.theme.clone(), config.badge_window_secs),
            canvas,
            overlay,
            refresh_interval: config.refresh_interval,
            report: SessionReport::default(),
        }
    }

    pub fn controller(&self) -> &PlaybackController<M> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<M> {
        &mut self.controller
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn overlay(&self) -> &OverlayData {
        &self.overlay
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.controller.subscribe()
    }

    pub fn report(&self) -> SessionReport {
        self.report
    }

    /// Draw one frame from the element's clock and rendered box.
    pub fn redraw(&mut self) -> Result<()> {
        let media = self.controller.media();
        let frame = FrameInput::at(
            &self.overlay,
            media.current_time(),
            media.duration(),
            media.rendered_box(),
        );
        self.renderer.draw(&mut self.canvas, &frame)?;
        self.report.frames_drawn += 1;
        Ok(())
    }

    pub fn handle(&mut self, input: SessionInput) -> Result<()> {
        match input {
            SessionInput::Media(event) => {
                self.controller.observe(event);
                self.redraw_if_idle()
            }
            SessionInput::Command(command) => {
                self.apply(command);
                self.redraw_if_idle()
            }
            SessionInput::Resized => self.redraw(),
            SessionInput::SourceChanged { source, overlay } => {
                info!(
                    "Switching to {} with {} shot(s) on the timeline",
                    source,
                    overlay.shots.len()
                );
                self.overlay = overlay;
                self.controller.load(&source);
                self.redraw()
            }
        }
    }

    fn apply(&mut self, command: PlaybackCommand) {
        let outcome = match command {
            PlaybackCommand::TogglePlayPause => self.controller.toggle_play_pause(),
            PlaybackCommand::Play => self.controller.play(),
            PlaybackCommand::Pause => {
                self.controller.pause();
                Ok(())
            }
            PlaybackCommand::Restart => {
                self.controller.restart();
                Ok(())
            }
            PlaybackCommand::Scrub(seconds) => {
                self.controller.scrub(seconds);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            warn!("{command:?} failed: {e}");
        }
    }

    // While playing the ticker owns redraws.
    fn redraw_if_idle(&mut self) -> Result<()> {
        if self.controller.state().is_playing {
            Ok(())
        } else {
            self.redraw()
        }
    }

    /// Process inputs until shutdown or until every sender is gone.
    pub async fn run(
        &mut self,
        mut inputs: mpsc::UnboundedReceiver<SessionInput>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SessionReport> {
        let mut ticker: Option<RedrawTicker> = None;
        self.redraw()?;

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input)?,
                    None => {
                        debug!("Session inbox closed");
                        break;
                    }
                },
                _ = RedrawTicker::tick(&mut ticker) => {
                    self.report.ticks += 1;
                    self.redraw()?;
                }
            }

            let playing = self.controller.state().is_playing;
            if playing && ticker.is_none() {
                ticker = Some(RedrawTicker::start(self.refresh_interval));
            } else if !playing && ticker.is_some() {
                ticker = None;
            }
        }

        debug!(
            "Session finished after {} frame(s), {} tick(s)",
            self.report.frames_drawn, self.report.ticks
        );
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        normalize::{ShotEvent, ShotResult, ShotType},
        overlay::{DisplayList, Size},
        playback::SimulatedMedia,
        registry::PlayableSource,
    };

    fn overlay() -> OverlayData {
        OverlayData {
            total_shots_declared: 1,
            total_serves_declared: 1,
            total_faults_declared: 0,
            shots: vec![ShotEvent {
                timestamp_seconds: 5.0,
                result: ShotResult::Successful,
                shot_type: ShotType::Serve,
                feedback: None,
                sequence_number: Some(1),
                estimated_speed: Some("180 km/h".to_string()),
            }],
        }
    }

    fn session() -> (
        OverlaySession<SimulatedMedia, DisplayList>,
        mpsc::UnboundedReceiver<SessionInput>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let media = SimulatedMedia::new(30.0, Size::new(640.0, 360.0), tx);
        let session = OverlaySession::new(media, DisplayList::new(), overlay(), &OverlayConfig::default());
        (session, rx)
    }

    fn pump(
        session: &mut OverlaySession<SimulatedMedia, DisplayList>,
        rx: &mut mpsc::UnboundedReceiver<SessionInput>,
    ) {
        while let Ok(input) = rx.try_recv() {
            session.handle(input).unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn seek_while_paused_redraws_immediately() {
        let (mut session, mut rx) = session();
        session
            .handle(SessionInput::SourceChanged {
                source: PlayableSource::new("file:///serve.mp4"),
                overlay: overlay(),
            })
            .unwrap();
        pump(&mut session, &mut rx);
        assert_eq!(session.controller().state().duration, 30.0);
        let before = session.report().frames_drawn;

        session.handle(PlaybackCommand::Scrub(5.5).into()).unwrap();

        assert_eq!(session.controller().state().current_time, 5.5);
        assert_eq!(session.report().frames_drawn, before + 1);
        let texts: Vec<&str> = session.canvas().texts().collect();
        assert!(texts.contains(&"Total Shots: 1"));
        assert!(texts.contains(&"SERVE: SUCCESSFUL"));
        assert!(texts.contains(&"Speed: 180 km/h"));
    }

    #[tokio::test(start_paused = true)]
    async fn resize_always_redraws() {
        let (mut session, _rx) = session();
        session.redraw().unwrap();
        session.handle(SessionInput::Resized).unwrap();
        assert_eq!(session.report().frames_drawn, 2);
        assert_eq!(session.canvas().resizes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn source_change_replaces_overlay() {
        let (mut session, _rx) = session();
        session
            .handle(SessionInput::SourceChanged {
                source: PlayableSource::new("file:///empty.mp4"),
                overlay: OverlayData::default(),
            })
            .unwrap();

        assert!(session.overlay().is_empty());
        let texts: Vec<&str> = session.canvas().texts().collect();
        assert!(texts.contains(&"Total Shots: 0"));
        assert!(texts.contains(&"Success Rate: 0%"));
    }

    #[tokio::test(start_paused = true)]
    async fn refused_play_keeps_session_alive() {
        let (mut session, _rx) = session();
        // Nothing loaded yet, so the element refuses to play.
        session.handle(PlaybackCommand::Play.into()).unwrap();
        assert!(!session.controller().state().is_playing);
        assert_eq!(session.report().frames_drawn, 1);
    }
}
