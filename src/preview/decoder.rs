//! Sequential frame decoding into RGBA buffers for the preview window

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling;
use ffmpeg::{codec, format, frame, media, Rational};
use tracing::{debug, info};

use crate::engine::init_ffmpeg;
use crate::error::{CutframeError, CutframeResult};
use crate::preview::clock::fit_within;

/// One decoded frame, tightly packed RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Presentation time in seconds
    pub seconds: f64,
}

/// Decodes the best video stream of a file frame by frame
pub struct FrameDecoder {
    ictx: format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: scaling::Context,
    source: (Pixel, u32, u32),
    target: (u32, u32),
    bounds: (u32, u32),
    video_index: usize,
    time_base: Rational,
    frame_rate: f64,
    duration: f64,
    skip_until: Option<f64>,
    eof: bool,
}

impl FrameDecoder {
    /// Open `path`, scaling frames to fit within `max_width`x`max_height`
    pub fn open(path: &str, max_width: u32, max_height: u32) -> CutframeResult<Self> {
        if !Path::new(path).exists() {
            return Err(CutframeError::InputFileNotFound {
                path: path.to_string(),
            });
        }
        init_ffmpeg()?;

        let ictx = format::input(&path).map_err(|e| {
            CutframeError::processing(format!("Could not open input file: {}", e))
        })?;
        let stream = ictx
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| CutframeError::processing("No video stream found in input file"))?;
        let video_index = stream.index();
        let time_base = stream.time_base();
        let frame_rate = f64::from(stream.avg_frame_rate());

        let decoder = codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| CutframeError::processing(format!("Failed to create video decoder: {}", e)))?;

        let duration = if ictx.duration() > 0 {
            ictx.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        let source = (decoder.format(), decoder.width(), decoder.height());
        let target = fit_within(source.1, source.2, max_width, max_height);
        let scaler = new_scaler(source, target)?;
        info!(
            "Preview opened: {}x{} shown at {}x{}, {:.3} fps",
            source.1, source.2, target.0, target.1, frame_rate
        );

        Ok(Self {
            ictx,
            decoder,
            scaler,
            source,
            target,
            bounds: (max_width, max_height),
            video_index,
            time_base,
            frame_rate,
            duration,
            skip_until: None,
            eof: false,
        })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.eof
    }

    /// Decode the next frame; `None` at end of stream
    pub fn next_frame(&mut self) -> CutframeResult<Option<PreviewFrame>> {
        let mut decoded = frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let seconds = decoded
                    .timestamp()
                    .or_else(|| decoded.pts())
                    .map(|ts| ts as f64 * f64::from(self.time_base))
                    .unwrap_or(0.0);
                if let Some(target) = self.skip_until {
                    if seconds < target {
                        continue;
                    }
                    self.skip_until = None;
                }
                return self.convert(&decoded, seconds).map(Some);
            }
            if self.eof {
                return Ok(None);
            }
            self.feed_decoder()?;
        }
    }

    /// Jump to `seconds`; the next frame returned is the first at or after it
    pub fn seek(&mut self, seconds: f64) -> CutframeResult<()> {
        let seconds = seconds.max(0.0);
        let timestamp = (seconds * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.ictx
            .seek(timestamp, ..timestamp)
            .map_err(|e| CutframeError::processing(format!("Failed to seek to {:.3}s: {}", seconds, e)))?;
        self.decoder.flush();
        self.skip_until = Some(seconds);
        self.eof = false;
        debug!("Preview seeked to {:.3}s", seconds);
        Ok(())
    }

    /// Change the bounding box frames are scaled into
    pub fn resize(&mut self, max_width: u32, max_height: u32) -> CutframeResult<()> {
        if self.bounds == (max_width, max_height) {
            return Ok(());
        }
        self.bounds = (max_width, max_height);
        self.target = fit_within(self.source.1, self.source.2, max_width, max_height);
        self.scaler = new_scaler(self.source, self.target)?;
        Ok(())
    }

    /// Read packets until one for the video stream reaches the decoder
    fn feed_decoder(&mut self) -> CutframeResult<()> {
        for (stream, packet) in self.ictx.packets() {
            if stream.index() != self.video_index {
                continue;
            }
            return self.decoder.send_packet(&packet).map_err(|e| {
                CutframeError::processing(format!("Failed to send packet to decoder: {}", e))
            });
        }
        self.eof = true;
        self.decoder.send_eof().map_err(|e| {
            CutframeError::processing(format!("Failed to flush decoder: {}", e))
        })
    }

    fn convert(&mut self, decoded: &frame::Video, seconds: f64) -> CutframeResult<PreviewFrame> {
        let source = (decoded.format(), decoded.width(), decoded.height());
        if source != self.source {
            debug!("Frame geometry changed to {:?}", source);
            self.source = source;
            self.target = fit_within(source.1, source.2, self.bounds.0, self.bounds.1);
            self.scaler = new_scaler(self.source, self.target)?;
        }

        let mut rgba = frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgba)
            .map_err(|e| CutframeError::processing(format!("Failed to convert frame: {}", e)))?;

        let (width, height) = self.target;
        Ok(PreviewFrame {
            width,
            height,
            rgba: pack_rows(rgba.data(0), rgba.stride(0), width as usize * 4, height as usize),
            seconds,
        })
    }
}

fn new_scaler(source: (Pixel, u32, u32), target: (u32, u32)) -> CutframeResult<scaling::Context> {
    scaling::Context::get(
        source.0,
        source.1,
        source.2,
        Pixel::RGBA,
        target.0,
        target.1,
        scaling::Flags::BILINEAR,
    )
    .map_err(|e| CutframeError::processing(format!("Failed to create scaler: {}", e)))
}

/// Drop per-row padding from a strided plane
fn pack_rows(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut packed = Vec::with_capacity(row_bytes * rows);
    for row in data.chunks(stride).take(rows) {
        packed.extend_from_slice(&row[..row_bytes.min(row.len())]);
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rows_strips_padding() {
        // two rows of 2 RGBA pixels, stride 12 (4 bytes padding)
        let mut data = Vec::new();
        data.extend_from_slice(&[1; 8]);
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&[2; 8]);
        data.extend_from_slice(&[0; 4]);

        let packed = pack_rows(&data, 12, 8, 2);
        assert_eq!(packed.len(), 16);
        assert!(packed[..8].iter().all(|b| *b == 1));
        assert!(packed[8..].iter().all(|b| *b == 2));
    }

    #[test]
    fn test_pack_rows_without_padding() {
        let data = vec![7u8; 32];
        assert_eq!(pack_rows(&data, 16, 16, 2), data);
    }

    #[test]
    fn test_open_missing_file() {
        let result = FrameDecoder::open("no/such/file.mp4", 640, 360);
        assert!(matches!(result, Err(CutframeError::InputFileNotFound { .. })));
    }
}
