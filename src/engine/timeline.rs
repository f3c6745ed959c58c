//! Shared zero point for the streams of one input, and cleanup of
//! outputs that were never finished

use std::path::PathBuf;

use ffmpeg_next as ffmpeg;
use ffmpeg::{format, Rational};
use tracing::{debug, warn};

/// Zero point all streams of an input are measured from, in seconds.
///
/// Taken from the container start time; when the container reports none the
/// first timestamp seen on any stream fixes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Timeline {
    origin: Option<f64>,
}

impl Timeline {
    /// `start_time` in `AV_TIME_BASE` units, `AV_NOPTS_VALUE` when unknown
    pub(crate) fn new(start_time: i64) -> Self {
        let origin = (start_time != ffmpeg::ffi::AV_NOPTS_VALUE)
            .then(|| start_time as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE));
        Self { origin }
    }

    pub(crate) fn for_input(ictx: &format::context::Input) -> Self {
        let timeline = Self::new(ictx.start_time());
        debug!("Input timeline origin: {:?}", timeline.origin());
        timeline
    }

    pub(crate) fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// The origin expressed in `time_base` ticks
    pub(crate) fn offset(&mut self, timestamp: i64, time_base: Rational) -> i64 {
        let tick = tick_seconds(time_base);
        if tick <= 0.0 {
            return 0;
        }
        let origin = *self.origin.get_or_insert(timestamp as f64 * tick);
        (origin / tick).round() as i64
    }

    /// Seconds from the origin to `timestamp`
    pub(crate) fn seconds(&mut self, timestamp: i64, time_base: Rational) -> f64 {
        let offset = self.offset(timestamp, time_base);
        (timestamp - offset) as f64 * tick_seconds(time_base)
    }
}

fn tick_seconds(time_base: Rational) -> f64 {
    if time_base.numerator() > 0 && time_base.denominator() > 0 {
        f64::from(time_base)
    } else {
        0.0
    }
}

/// Removes the output file when dropped while still armed.
///
/// Create it before the output context so the context closes first.
pub(crate) struct OutputGuard {
    path: PathBuf,
    armed: bool,
}

impl OutputGuard {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Keep the file; call after the trailer is written
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if !self.armed || !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Removed incomplete output {}", self.path.display()),
            Err(e) => warn!(
                "Could not remove incomplete output {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AV_TIME_BASE: i64 = 1_000_000;

    #[test]
    fn test_container_start_is_the_origin() {
        // MPEG-TS style 1.4s start, 90 kHz stream clock
        let mut timeline = Timeline::new(1_400_000);
        let tb = Rational::new(1, 90_000);
        assert_eq!(timeline.offset(126_000, tb), 126_000);
        assert!(timeline.seconds(126_000, tb).abs() < 1e-9);
        assert!((timeline.seconds(216_000, tb) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_streams_share_one_origin() {
        // audio starts at 0.0, video 0.3s later
        let mut timeline = Timeline::new(0);
        let audio = Rational::new(1, 48_000);
        let video = Rational::new(1, 25);

        assert_eq!(timeline.seconds(0, audio), 0.0);
        assert!((timeline.seconds(14_400, audio) - 0.3).abs() < 1e-9);
        // first video frame keeps its 0.3s lead instead of moving to zero
        assert!((timeline.seconds(7, video) - 0.28).abs() < 1e-9);
        assert_eq!(timeline.offset(7, video), 0);
    }

    #[test]
    fn test_unknown_start_uses_first_timestamp() {
        let mut timeline = Timeline::new(ffmpeg::ffi::AV_NOPTS_VALUE);
        assert_eq!(timeline.origin(), None);

        let video = Rational::new(1, 1000);
        assert_eq!(timeline.seconds(2_000, video), 0.0);
        assert_eq!(timeline.origin(), Some(2.0));

        // later streams are rebased against the same point
        let audio = Rational::new(1, 44_100);
        assert_eq!(timeline.offset(100_000, audio), 88_200);
    }

    #[test]
    fn test_negative_priming_stays_before_origin() {
        let mut timeline = Timeline::new(0);
        let audio = Rational::new(1, 44_100);
        assert!(timeline.seconds(-1024, audio) < 0.0);
        assert_eq!(Timeline::new(AV_TIME_BASE / 2).origin(), Some(0.5));
    }

    #[test]
    fn test_invalid_time_base_does_not_rebase() {
        let mut timeline = Timeline::new(1_000_000);
        assert_eq!(timeline.offset(500, Rational::new(0, 1)), 0);
    }

    #[test]
    fn test_armed_guard_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.mp4");
        std::fs::write(&path, b"header only").unwrap();

        drop(OutputGuard::new(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_disarmed_guard_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.mp4");
        std::fs::write(&path, b"complete").unwrap();

        OutputGuard::new(&path).disarm();
        assert!(path.exists());
    }

    #[test]
    fn test_guard_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        drop(OutputGuard::new(dir.path().join("never-created.mp4")));
    }
}
