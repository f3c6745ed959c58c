//! Progress reporting and cancellation for running jobs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::engine::ProcessReport;

/// Events emitted while a job runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Job opened its input and is about to process
    Started {
        input: String,
        output: String,
        trim_seconds: f64,
    },
    /// Output position advanced
    Frame { frames: u64, seconds: f64 },
    /// Job finished and the trailer is written
    Finished(ProcessReport),
    /// Job failed
    Failed(String),
}

/// Receiver of job progress, checked for cancellation between packets
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    fn should_cancel(&self) -> bool {
        false
    }
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Forwards events over a channel, used by the preview window's worker thread
pub struct ChannelProgress {
    sender: Sender<ProgressEvent>,
    cancel: CancelToken,
}

impl ChannelProgress {
    /// Create the sink together with its receiving end
    pub fn channel(cancel: CancelToken) -> (Self, Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender, cancel }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        // the window may already be gone; nothing left to tell
        let _ = self.sender.send(event);
    }

    fn should_cancel(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Writes progress to the log, at most once per interval for frame events
pub struct LogProgress {
    interval: Duration,
    last: std::sync::Mutex<Option<Instant>>,
}

impl LogProgress {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: std::sync::Mutex::new(None),
        }
    }

    fn frame_due(&self) -> bool {
        let now = Instant::now();
        match self.last.lock() {
            Ok(mut last) => {
                let due = last.map_or(true, |t| now.duration_since(t) >= self.interval);
                if due {
                    *last = Some(now);
                }
                due
            }
            Err(_) => false,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ProgressSink for LogProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started {
                input,
                output,
                trim_seconds,
            } => info!("Processing {} -> {} (first {:.3}s)", input, output, trim_seconds),
            ProgressEvent::Frame { frames, seconds } => {
                if self.frame_due() {
                    info!("{} frames, {:.2}s done", frames, seconds);
                } else {
                    debug!("{} frames, {:.2}s done", frames, seconds);
                }
            }
            ProgressEvent::Finished(report) => info!(
                "Finished: {} frames, {:.2} MB in {:.2}s",
                report.frames_encoded,
                report.bytes_written as f64 / 1024.0 / 1024.0,
                report.elapsed_seconds
            ),
            ProgressEvent::Failed(message) => error!("Processing failed: {}", message),
        }
    }
}

/// Sink that drops everything
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}
