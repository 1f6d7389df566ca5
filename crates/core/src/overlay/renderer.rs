use log::trace;

use crate::{
    config::OverlayTheme,
    error::Result,
    normalize::{OverlayData, ShotEvent, ShotResult},
    overlay::canvas::{Canvas, Rect, Size, TextAlign, TextStyle},
    stats::{LiveStats, current_shot},
};

const MARGIN: f64 = 20.0;

const STAT_CHIP_WIDTH: f64 = 200.0;
const STAT_CHIP_HEIGHT: f64 = 25.0;
const STAT_LINE_PITCH: f64 = 28.0;
const STAT_FIRST_BASELINE: f64 = 30.0;
const STAT_TEXT_INSET: f64 = 5.0;

const TIMELINE_OFFSET_FROM_BOTTOM: f64 = 40.0;
const TIMELINE_HEIGHT: f64 = 20.0;
const MARKER_WIDTH: f64 = 4.0;
const MARKER_OVERHANG: f64 = 2.0;
const PLAYHEAD_WIDTH: f64 = 2.0;
const PLAYHEAD_OVERHANG: f64 = 5.0;

const BADGE_WIDTH: f64 = 200.0;
const BADGE_HEIGHT: f64 = 30.0;
const BADGE_BASELINE: f64 = 40.0;
const BADGE_TEXT_INSET: f64 = 10.0;
const SPEED_BASELINE: f64 = 66.0;

/// Everything one frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub overlay: &'a OverlayData,
    pub stats: LiveStats,
    pub current_time: f64,
    pub duration: f64,
    /// The video element's rendered box, measured right before drawing.
    pub video_box: Size,
}

impl<'a> FrameInput<'a> {
    pub fn at(overlay: &'a OverlayData, current_time: f64, duration: f64, video_box: Size) -> Self {
        Self {
            overlay,
            stats: LiveStats::at(overlay, current_time),
            current_time,
            duration,
            video_box,
        }
    }
}

pub struct OverlayRenderer {
    theme: OverlayTheme,
    badge_window_secs: f64,
}

impl OverlayRenderer {
    pub fn new(theme: OverlayTheme, badge_window_secs: f64) -> Self {
        Self {
            theme,
            badge_window_secs,
        }
    }

    /// Paint one frame: stats HUD, timeline, and the current-shot badge.
    ///
    /// The canvas is brought to the size of the video box before anything is
    /// drawn, so a frame never lands on a stale backing store.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, frame: &FrameInput<'_>) -> Result<()> {
        if canvas.size() != frame.video_box {
            trace!(
                "Resizing overlay canvas to {}x{}",
                frame.video_box.width, frame.video_box.height
            );
            canvas.resize(frame.video_box);
        }
        canvas.clear();

        let size = canvas.size();
        self.draw_stats(canvas, &frame.stats);
        self.draw_timeline(canvas, size, frame);
        if let Some(shot) = current_shot(frame.overlay, frame.current_time, self.badge_window_secs)
        {
            self.draw_badge(canvas, size, shot);
        }

        canvas.flush()
    }

    fn draw_stats<C: Canvas + ?Sized>(&self, canvas: &mut C, stats: &LiveStats) {
        let style = TextStyle {
            font: format!("bold 17px {}", self.theme.font_family),
            color: self.theme.stat_text,
            align: TextAlign::Left,
        };

        for (index, line) in stats.lines().iter().enumerate() {
            let baseline = STAT_FIRST_BASELINE + index as f64 * STAT_LINE_PITCH;
            canvas.fill_rect(
                Rect::new(
                    MARGIN,
                    baseline - 20.0,
                    STAT_CHIP_WIDTH,
                    STAT_CHIP_HEIGHT,
                ),
                self.theme.stat_chip,
            );
            canvas.fill_text(line, MARGIN + STAT_TEXT_INSET, baseline, &style);
        }
    }

    fn draw_timeline<C: Canvas + ?Sized>(&self, canvas: &mut C, size: Size, frame: &FrameInput<'_>) {
        let track = Rect::new(
            MARGIN,
            size.height - TIMELINE_OFFSET_FROM_BOTTOM,
            (size.width - 2.0 * MARGIN).max(0.0),
            TIMELINE_HEIGHT,
        );
        canvas.fill_rect(track, self.theme.timeline_track);

        let duration = effective_duration(frame.duration);
        for shot in &frame.overlay.shots {
            let x = track.x + position(shot.timestamp_seconds, duration) * track.width;
            let color = match shot.result {
                ShotResult::Successful => self.theme.successful_marker,
                ShotResult::Fault => self.theme.fault_marker,
            };
            canvas.fill_rect(
                Rect::new(
                    x - MARKER_WIDTH / 2.0,
                    track.y - MARKER_OVERHANG,
                    MARKER_WIDTH,
                    track.height + 2.0 * MARKER_OVERHANG,
                ),
                color,
            );
        }

        let playhead = track.x + position(frame.current_time, duration) * track.width;
        canvas.fill_rect(
            Rect::new(
                playhead - PLAYHEAD_WIDTH / 2.0,
                track.y - PLAYHEAD_OVERHANG,
                PLAYHEAD_WIDTH,
                track.height + 2.0 * PLAYHEAD_OVERHANG,
            ),
            self.theme.playhead,
        );
    }

    fn draw_badge<C: Canvas + ?Sized>(&self, canvas: &mut C, size: Size, shot: &ShotEvent) {
        let background = match shot.result {
            ShotResult::Successful => self.theme.successful_badge,
            ShotResult::Fault => self.theme.fault_badge,
        };
        let left = size.width - MARGIN - BADGE_WIDTH;
        let right_edge = left + BADGE_WIDTH - BADGE_TEXT_INSET;

        canvas.fill_rect(Rect::new(left, MARGIN, BADGE_WIDTH, BADGE_HEIGHT), background);
        canvas.fill_text(
            &badge_text(shot),
            right_edge,
            BADGE_BASELINE,
            &TextStyle {
                font: format!("bold 16px {}", self.theme.font_family),
                color: self.theme.badge_text,
                align: TextAlign::Right,
            },
        );

        if let Some(speed) = shot.display_speed() {
            canvas.fill_text(
                &format!("Speed: {speed}"),
                right_edge,
                SPEED_BASELINE,
                &TextStyle {
                    font: format!("12px {}", self.theme.font_family),
                    color: self.theme.speed_text,
                    align: TextAlign::Right,
                },
            );
        }
    }
}

pub fn badge_text(shot: &ShotEvent) -> String {
    format!(
        "{}: {}",
        shot.shot_type.as_str().to_uppercase(),
        shot.result.as_str().to_uppercase()
    )
}

/// Media elements report 0 or NaN before metadata arrives; fall back to one
/// second so positions stay finite.
fn effective_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        1.0
    }
}

fn position(time: f64, duration: f64) -> f64 {
    (time / duration).clamp(0.0, 1.0)
}
