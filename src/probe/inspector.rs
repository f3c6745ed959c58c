//! Media probing through libavformat

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::{codec, media};
use tracing::{debug, info};

use crate::engine::init_ffmpeg;
use crate::error::{CutframeError, CutframeResult};
use crate::probe::{AudioStreamInfo, MediaInfo, VideoStreamInfo};

/// Reads container and stream details without decoding
#[derive(Debug, Default)]
pub struct MediaProber;

impl MediaProber {
    pub fn new() -> Self {
        Self
    }

    /// Probe a media file
    pub fn probe(&self, path: &str) -> CutframeResult<MediaInfo> {
        info!("Probing media file: {}", path);

        if !Path::new(path).exists() {
            return Err(CutframeError::InputFileNotFound {
                path: path.to_string(),
            });
        }
        let file_size = std::fs::metadata(path)?.len();

        init_ffmpeg()?;
        let ictx = ffmpeg::format::input(&path).map_err(|e| CutframeError::ProbeError {
            message: format!("Failed to open {}: {}", path, e),
        })?;

        let duration = if ictx.duration() > 0 {
            ictx.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else {
            0.0
        };
        let bit_rate = u64::try_from(ictx.bit_rate()).ok().filter(|b| *b > 0);

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();
        for stream in ictx.streams() {
            let parameters = stream.parameters();
            let codec_name = parameters.id().name().to_string();
            let time_base = stream.time_base();

            match parameters.medium() {
                media::Type::Video => {
                    let decoder = codec::context::Context::from_parameters(parameters)
                        .and_then(|ctx| ctx.decoder().video())
                        .map_err(|e| CutframeError::ProbeError {
                            message: format!("Stream {}: {}", stream.index(), e),
                        })?;
                    video_streams.push(VideoStreamInfo {
                        index: stream.index(),
                        codec: codec_name,
                        width: decoder.width(),
                        height: decoder.height(),
                        frame_rate: f64::from(stream.avg_frame_rate()),
                        time_base: (time_base.numerator(), time_base.denominator()),
                    });
                }
                media::Type::Audio => {
                    let decoder = codec::context::Context::from_parameters(parameters)
                        .and_then(|ctx| ctx.decoder().audio())
                        .map_err(|e| CutframeError::ProbeError {
                            message: format!("Stream {}: {}", stream.index(), e),
                        })?;
                    audio_streams.push(AudioStreamInfo {
                        index: stream.index(),
                        codec: codec_name,
                        sample_rate: decoder.rate(),
                        channels: decoder.channels(),
                        time_base: (time_base.numerator(), time_base.denominator()),
                    });
                }
                other => debug!("Ignoring {:?} stream {}", other, stream.index()),
            }
        }

        let media_info = MediaInfo {
            path: path.to_string(),
            container: ictx.format().name().to_string(),
            duration,
            bit_rate,
            file_size,
            video_streams,
            audio_streams,
        };
        info!(
            "Probe complete: {:.3}s, {} video / {} audio streams",
            media_info.duration,
            media_info.video_streams.len(),
            media_info.audio_streams.len()
        );
        Ok(media_info)
    }
}
