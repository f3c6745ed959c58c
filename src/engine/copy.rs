//! Stream-copy trimming: packets are copied as-is until the trim point
//!
//! Timestamps are measured from the input's start time and rebased to zero
//! in the output. The first video packet past the trim point ends the copy;
//! audio past it is skipped.

use std::time::Instant;

use chrono::Utc;
use ffmpeg_next as ffmpeg;
use ffmpeg::{codec, encoder, format, media, Rational};
use tracing::{debug, info, warn};

use crate::domain::model::EditRequest;
use crate::engine::reencode::prepare_paths;
use crate::engine::timeline::{OutputGuard, Timeline};
use crate::engine::{init_ffmpeg, EngineMode, ProcessReport, ProgressEvent, ProgressSink};
use crate::error::{CutframeError, CutframeResult};

/// Lossless trimming engine; cuts land on packet boundaries
#[derive(Debug, Default)]
pub struct StreamCopyEngine;

struct CopiedStream {
    ost_index: usize,
    input_time_base: Rational,
    ost_time_base: Rational,
    is_video: bool,
}

impl StreamCopyEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn process(
        &self,
        request: &EditRequest,
        progress: &dyn ProgressSink,
    ) -> CutframeResult<ProcessReport> {
        let started = Instant::now();
        request.validate()?;
        prepare_paths(request)?;
        init_ffmpeg()?;

        let mut ictx = format::input(&request.input).map_err(|e| {
            CutframeError::processing(format!("Could not open input file: {}", e))
        })?;
        let guard = OutputGuard::new(&request.output);
        let mut octx = format::output(&request.output).map_err(|e| {
            CutframeError::processing(format!("Could not create output context: {}", e))
        })?;

        // input index -> output stream; unsupported streams map to None
        let mut mapping: Vec<Option<CopiedStream>> = Vec::new();
        for ist in ictx.streams() {
            let medium = ist.parameters().medium();
            let wanted = match medium {
                media::Type::Video => true,
                media::Type::Audio => request.keep_audio,
                _ => false,
            };
            if !wanted {
                mapping.push(None);
                continue;
            }

            let mut ost = octx
                .add_stream(encoder::find(codec::Id::None))
                .map_err(|e| CutframeError::processing(format!("Failed to allocate output stream: {}", e)))?;
            ost.set_parameters(ist.parameters());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            debug!("Stream {} ({:?}) copied to {}", ist.index(), medium, ost.index());
            mapping.push(Some(CopiedStream {
                ost_index: ost.index(),
                input_time_base: ist.time_base(),
                ost_time_base: ist.time_base(),
                is_video: medium == media::Type::Video,
            }));
        }

        if !mapping.iter().flatten().any(|s| s.is_video) {
            return Err(CutframeError::processing("No video stream found in input file"));
        }

        octx.write_header().map_err(|e| {
            CutframeError::processing(format!("Error writing header: {}", e))
        })?;
        for copied in mapping.iter_mut().flatten() {
            if let Some(ost) = octx.stream(copied.ost_index) {
                copied.ost_time_base = ost.time_base();
            }
        }

        progress.emit(ProgressEvent::Started {
            input: request.input.clone(),
            output: request.output.clone(),
            trim_seconds: request.trim.as_seconds(),
        });

        let trim = request.trim.as_seconds();
        let mut timeline = Timeline::for_input(&ictx);
        let mut packets = 0u64;
        let mut video_packets = 0u64;
        let mut bytes = 0u64;
        let mut last_video_seconds = 0.0f64;

        for (ist, mut packet) in ictx.packets() {
            if progress.should_cancel() {
                warn!("Copy cancelled after {} packets", packets);
                return Err(CutframeError::Cancelled);
            }
            let Some(Some(copied)) = mapping.get(ist.index()) else {
                continue;
            };
            let Some(timestamp) = packet.pts().or_else(|| packet.dts()) else {
                continue;
            };

            let offset = timeline.offset(timestamp, copied.input_time_base);
            let seconds = timeline.seconds(timestamp, copied.input_time_base);
            if seconds > trim {
                if copied.is_video {
                    debug!("Video packet at {:.3}s is past the trim point, stopping", seconds);
                    break;
                }
                continue;
            }

            packet.set_pts(packet.pts().map(|pts| pts - offset));
            packet.set_dts(packet.dts().map(|dts| dts - offset));
            packet.rescale_ts(copied.input_time_base, copied.ost_time_base);
            packet.set_position(-1);
            packet.set_stream(copied.ost_index);
            bytes += packet.size() as u64;
            packet.write_interleaved(&mut octx).map_err(|e| {
                CutframeError::processing(format!("Error writing packet: {}", e))
            })?;

            packets += 1;
            if copied.is_video {
                video_packets += 1;
                last_video_seconds = last_video_seconds.max(seconds);
                progress.emit(ProgressEvent::Frame {
                    frames: video_packets,
                    seconds,
                });
            }
        }

        if video_packets == 0 {
            return Err(CutframeError::processing(
                "No video packets fall inside the trim window",
            ));
        }

        octx.write_trailer().map_err(|e| {
            CutframeError::processing(format!("Error writing trailer: {}", e))
        })?;
        drop(octx);
        guard.disarm();

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            "Video trimmed and saved as {} ({} packets, {} video)",
            request.output, packets, video_packets
        );

        Ok(ProcessReport {
            output: request.output.clone(),
            mode: EngineMode::Copy,
            frames_encoded: video_packets,
            bytes_written: bytes,
            output_seconds: last_video_seconds,
            elapsed_seconds: elapsed,
            finished_at: Utc::now(),
        })
    }
}
