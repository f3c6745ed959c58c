//! Frame pacing for the preview polling loop

use std::time::{Duration, Instant};

/// Decides when the next preview frame is due
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    next_due: Option<Instant>,
    paused: bool,
}

impl FrameClock {
    /// Clock for the given frame rate; non-positive rates fall back to 25 fps
    pub fn new(frame_rate: f64) -> Self {
        let fps = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate
        } else {
            25.0
        };
        Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            next_due: None,
            paused: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.next_due = None;
    }

    pub fn toggle(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// `true` when a frame should be shown at `now`; advances the schedule.
    ///
    /// When the caller fell behind by more than one interval the schedule
    /// restarts from `now` instead of bursting to catch up.
    pub fn due(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        match self.next_due {
            None => {
                self.next_due = Some(now + self.interval);
                true
            }
            Some(next) if now >= next => {
                let following = next + self.interval;
                self.next_due = Some(if now >= following { now + self.interval } else { following });
                true
            }
            Some(_) => false,
        }
    }

    /// Time until the next frame, for scheduling a repaint
    pub fn until_due(&self, now: Instant) -> Duration {
        match self.next_due {
            Some(next) if !self.paused => next.saturating_duration_since(now),
            _ => self.interval,
        }
    }
}

/// Fit `width`x`height` into the box, keeping aspect ratio, never upscaling,
/// rounding down to even dimensions of at least 2
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (2, 2);
    }
    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    let even = |v: f64| ((v.floor() as u32) & !1).max(2);
    (even(width as f64 * scale), even(height as f64 * scale))
}
