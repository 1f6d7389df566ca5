use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use log::debug;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    error::{CourtsideError, Result},
    overlay::Size,
    playback::media::{MediaElement, MediaEvent},
    registry::PlayableSource,
    session::SessionInput,
};

/// Headless media element with its own clock.
///
/// Behaves like a browser video element: transitions are confirmed through
/// notifications sent to the session inbox, and reaching the end pauses it.
/// Clones share the same clock.
#[derive(Clone)]
pub struct SimulatedMedia {
    clock: Arc<Mutex<SimClock>>,
    notify: mpsc::UnboundedSender<SessionInput>,
}

struct SimClock {
    length: f64,
    rate: f64,
    source: Option<PlayableSource>,
    position: f64,
    running_since: Option<Instant>,
    viewport: Size,
}

impl SimClock {
    fn now(&self) -> f64 {
        let elapsed = self
            .running_since
            .map(|anchor| anchor.elapsed().as_secs_f64() * self.rate)
            .unwrap_or(0.0);
        (self.position + elapsed).min(self.length)
    }

    fn halt(&mut self) {
        self.position = self.now();
        self.running_since = None;
    }
}

impl SimulatedMedia {
    pub fn new(length: f64, viewport: Size, notify: mpsc::UnboundedSender<SessionInput>) -> Self {
        Self {
            clock: Arc::new(Mutex::new(SimClock {
                length: length.max(0.0),
                rate: 1.0,
                source: None,
                position: 0.0,
                running_since: None,
                viewport,
            })),
            notify,
        }
    }

    pub fn with_rate(self, rate: f64) -> Self {
        self.lock().rate = if rate > 0.0 { rate } else { 1.0 };
        self
    }

    /// Change the on-screen box, as a window resize would.
    pub fn set_viewport(&self, viewport: Size) {
        self.lock().viewport = viewport;
    }

    pub fn source(&self) -> Option<PlayableSource> {
        self.lock().source.clone()
    }

    /// Raise `TimeUpdate` every `every` while playing, like a browser does, and
    /// pause at the end of the media. Stops when the returned pump is dropped.
    pub fn start_clock(&self, every: Duration) -> ClockPump {
        let media = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let events: &[MediaEvent] = {
                    let mut clock = media.lock();
                    if clock.running_since.is_none() {
                        continue;
                    }
                    if clock.now() >= clock.length {
                        clock.halt();
                        &[MediaEvent::TimeUpdate, MediaEvent::Pause]
                    } else {
                        &[MediaEvent::TimeUpdate]
                    }
                };
                for event in events {
                    if !media.emit(*event) {
                        return;
                    }
                }
            }
        });
        ClockPump { handle }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimClock> {
        self.clock.lock().expect("SimulatedMedia clock poisoned")
    }

    fn emit(&self, event: MediaEvent) -> bool {
        self.notify.send(SessionInput::Media(event)).is_ok()
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, source: &PlayableSource) {
        let was_running = {
            let mut clock = self.lock();
            let was_running = clock.running_since.take().is_some();
            clock.source = Some(source.clone());
            clock.position = 0.0;
            was_running
        };
        if was_running {
            self.emit(MediaEvent::Pause);
        }
        self.emit(MediaEvent::LoadedMetadata);
    }

    fn play(&mut self) -> Result<()> {
        {
            let mut clock = self.lock();
            if clock.source.is_none() {
                return Err(CourtsideError::Playback {
                    reason: "no source loaded".to_string(),
                });
            }
            if clock.running_since.is_some() {
                return Ok(());
            }
            if clock.position >= clock.length {
                clock.position = 0.0;
            }
            clock.running_since = Some(Instant::now());
        }
        self.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        let was_running = {
            let mut clock = self.lock();
            let was_running = clock.running_since.is_some();
            clock.halt();
            was_running
        };
        if was_running {
            self.emit(MediaEvent::Pause);
        }
    }

    fn seek(&mut self, seconds: f64) {
        {
            let mut clock = self.lock();
            clock.position = seconds.clamp(0.0, clock.length);
            if clock.running_since.is_some() {
                clock.running_since = Some(Instant::now());
            }
        }
        self.emit(MediaEvent::TimeUpdate);
    }

    fn current_time(&self) -> f64 {
        self.lock().now()
    }

    fn duration(&self) -> f64 {
        let clock = self.lock();
        if clock.source.is_some() {
            clock.length
        } else {
            f64::NAN
        }
    }

    fn paused(&self) -> bool {
        self.lock().running_since.is_none()
    }

    fn rendered_box(&self) -> Size {
        self.lock().viewport
    }
}

/// Handle to the task driving `SimulatedMedia` time updates.
pub struct ClockPump {
    handle: JoinHandle<()>,
}

impl Drop for ClockPump {
    fn drop(&mut self) {
        debug!("Stopping simulated media clock");
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionInput>) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        while let Ok(input) = rx.try_recv() {
            if let SessionInput::Media(event) = input {
                events.push(event);
            }
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn clock_advances_only_while_playing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut media = SimulatedMedia::new(30.0, Size::new(640.0, 360.0), tx);

        assert!(media.duration().is_nan());
        assert!(media.play().is_err());

        media.load(&PlayableSource::new("file:///serve.mp4"));
        assert_eq!(media.duration(), 30.0);
        media.play().unwrap();
        time::sleep(Duration::from_secs(2)).await;
        assert!((media.current_time() - 2.0).abs() < 1e-6);

        media.pause();
        time::sleep(Duration::from_secs(5)).await;
        assert!((media.current_time() - 2.0).abs() < 1e-6);

        assert_eq!(
            drain(&mut rx),
            vec![MediaEvent::LoadedMetadata, MediaEvent::Play, MediaEvent::Pause]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn seek_is_clamped_and_notified() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut media = SimulatedMedia::new(30.0, Size::new(640.0, 360.0), tx);
        media.load(&PlayableSource::new("file:///serve.mp4"));

        media.seek(45.0);
        assert_eq!(media.current_time(), 30.0);
        media.seek(-1.0);
        assert_eq!(media.current_time(), 0.0);

        assert_eq!(
            drain(&mut rx),
            vec![
                MediaEvent::LoadedMetadata,
                MediaEvent::TimeUpdate,
                MediaEvent::TimeUpdate
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pump_pauses_at_end_of_media() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut media = SimulatedMedia::new(1.0, Size::new(640.0, 360.0), tx).with_rate(2.0);
        media.load(&PlayableSource::new("file:///short.mp4"));
        let _pump = media.start_clock(Duration::from_millis(250));

        media.play().unwrap();
        time::sleep(Duration::from_secs(1)).await;

        assert!(media.paused());
        assert_eq!(media.current_time(), 1.0);
        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&MediaEvent::Pause));
        assert!(events.contains(&MediaEvent::TimeUpdate));
    }
}
