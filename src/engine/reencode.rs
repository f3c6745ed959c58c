//! Decode, filter and re-encode the head of a video
//!
//! One video stream is decoded, pushed through a `buffer -> <chain> ->
//! buffersink` graph built from the request, encoded, and muxed. Audio
//! streams are copied packet by packet over the same window when requested.
//! All streams are measured from the input's start time, so they stay in
//! sync and the trim counts from the start of the file.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use ffmpeg_next as ffmpeg;
use ffmpeg::{codec, encoder, filter, format, frame, media, picture, Dictionary, Packet, Rational, Rescale};
use tracing::{debug, info, warn};

use crate::domain::model::EditRequest;
use crate::engine::timeline::{OutputGuard, Timeline};
use crate::engine::{init_ffmpeg, EngineMode, ProcessReport, ProgressEvent, ProgressSink};
use crate::error::{CutframeError, CutframeResult};
use crate::filters::{build_filter_description, output_size};

/// Re-encoding engine
pub struct ReencodeEngine {
    threads: usize,
}

impl Default for ReencodeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReencodeEngine {
    pub fn new() -> Self {
        Self {
            threads: Self::optimize_thread_count(),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// 75% of the cores, between 1 and 16
    fn optimize_thread_count() -> usize {
        let cpu_count = num_cpus::get();
        let optimal_threads = (cpu_count as f64 * 0.75).ceil() as usize;
        optimal_threads.clamp(1, 16)
    }

    /// Run the job
    pub fn process(
        &self,
        request: &EditRequest,
        progress: &dyn ProgressSink,
    ) -> CutframeResult<ProcessReport> {
        let started = Instant::now();
        request.validate()?;
        prepare_paths(request)?;
        init_ffmpeg()?;

        let description = build_filter_description(
            request.preset,
            request.resolution,
            request.overlay.as_ref(),
        )?;
        info!("Filter graph: {}", description);
        info!(
            "Encoder: {}, CRF {}, preset {}, {} threads",
            request.encoder.codec, request.encoder.crf, request.encoder.preset, self.threads
        );

        let mut ictx = format::input(&request.input).map_err(|e| {
            CutframeError::processing(format!("Failed to open input file: {}", e))
        })?;
        let guard = OutputGuard::new(&request.output);
        let mut octx = format::output(&request.output).map_err(|e| {
            CutframeError::processing(format!("Failed to create output file: {}", e))
        })?;

        let mut pipeline = VideoPipeline::open(&ictx, &mut octx, request, &description, self.threads)?;
        let mut audio = if request.keep_audio {
            AudioPassthrough::open(&ictx, &mut octx, pipeline.video_index)?
        } else {
            AudioPassthrough::default()
        };

        octx.write_header().map_err(|e| {
            CutframeError::processing(format!("Failed to write output header: {}", e))
        })?;
        pipeline.resolve_output_time_base(&octx)?;
        audio.resolve_output_time_bases(&octx)?;

        progress.emit(ProgressEvent::Started {
            input: request.input.clone(),
            output: request.output.clone(),
            trim_seconds: request.trim.as_seconds(),
        });

        let trim = request.trim.as_seconds();
        let mut timeline = Timeline::for_input(&ictx);
        let mut window_open = true;
        for (stream, packet) in ictx.packets() {
            if progress.should_cancel() {
                warn!("Processing cancelled after {} frames", pipeline.frames);
                return Err(CutframeError::Cancelled);
            }

            if stream.index() == pipeline.video_index {
                pipeline.decoder.send_packet(&packet).map_err(|e| {
                    CutframeError::processing(format!("Failed to send packet to decoder: {}", e))
                })?;
                window_open = pipeline.receive_decoded(&mut octx, &mut timeline, trim, progress)?;
                if !window_open {
                    debug!("Trim point {:.3}s reached", trim);
                    break;
                }
            } else {
                audio.write(stream.index(), packet, &mut timeline, trim, &mut octx)?;
            }
        }

        if window_open {
            pipeline.decoder.send_eof().map_err(|e| {
                CutframeError::processing(format!("Failed to flush decoder: {}", e))
            })?;
            pipeline.receive_decoded(&mut octx, &mut timeline, trim, progress)?;
        }
        pipeline.flush(&mut octx)?;

        octx.write_trailer().map_err(|e| {
            CutframeError::processing(format!("Failed to write output trailer: {}", e))
        })?;
        drop(octx);
        guard.disarm();

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            "Re-encoding completed: {} frames, {:.2} MB in {:.2}s",
            pipeline.frames,
            pipeline.bytes as f64 / 1024.0 / 1024.0,
            elapsed
        );
        info!("Video processing complete. Saved as {}", request.output);

        Ok(ProcessReport {
            output: request.output.clone(),
            mode: EngineMode::Reencode,
            frames_encoded: pipeline.frames,
            bytes_written: pipeline.bytes + audio.bytes,
            output_seconds: pipeline.output_seconds(),
            elapsed_seconds: elapsed,
            finished_at: Utc::now(),
        })
    }
}

/// Input must exist; the output directory is created when missing
pub(crate) fn prepare_paths(request: &EditRequest) -> CutframeResult<()> {
    if !Path::new(&request.input).exists() {
        return Err(CutframeError::InputFileNotFound {
            path: request.input.clone(),
        });
    }
    if let Some(parent) = Path::new(&request.output).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Look the encoder up by name, falling back to the H.264 default
fn find_encoder(name: &str) -> CutframeResult<ffmpeg::Codec> {
    encoder::find_by_name(name)
        .or_else(|| {
            warn!("Encoder '{}' not available, falling back to H.264", name);
            encoder::find(codec::Id::H264)
        })
        .ok_or_else(|| CutframeError::processing("No H.264 encoder available"))
}

/// Decoder, filter graph and encoder for the single video stream
struct VideoPipeline {
    video_index: usize,
    decoder: ffmpeg::decoder::Video,
    graph: filter::Graph,
    encoder: ffmpeg::encoder::Video,
    ost_index: usize,
    input_time_base: Rational,
    encoder_time_base: Rational,
    ost_time_base: Rational,
    last_pts: Option<i64>,
    frames: u64,
    bytes: u64,
}

impl VideoPipeline {
    fn open(
        ictx: &format::context::Input,
        octx: &mut format::context::Output,
        request: &EditRequest,
        description: &str,
        threads: usize,
    ) -> CutframeResult<Self> {
        let ist = ictx
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| CutframeError::processing("No video stream found in input file"))?;
        let video_index = ist.index();
        let input_time_base = ist.time_base();

        let decoder = codec::context::Context::from_parameters(ist.parameters())
            .map_err(|e| CutframeError::processing(format!("Failed to create decoder context: {}", e)))?
            .decoder()
            .video()
            .map_err(|e| CutframeError::processing(format!("Failed to create video decoder: {}", e)))?;

        let frame_rate = match ist.avg_frame_rate() {
            rate if rate.numerator() > 0 && rate.denominator() > 0 => rate,
            _ => Rational::new(request.encoder.fallback_frame_rate as i32, 1),
        };
        let encoder_time_base = frame_rate.invert();
        let (width, height) = output_size(request.resolution, decoder.width(), decoder.height());

        info!(
            "Video stream {}: {}x{} -> {}x{}, {:.3} fps",
            video_index,
            decoder.width(),
            decoder.height(),
            width,
            height,
            f64::from(frame_rate)
        );

        let graph = build_graph(&decoder, input_time_base, description)?;

        let codec = find_encoder(&request.encoder.codec)?;
        let global_header = octx.format().flags().contains(format::Flags::GLOBAL_HEADER);
        let mut ost = octx
            .add_stream(codec)
            .map_err(|e| CutframeError::processing(format!("Failed to add video stream: {}", e)))?;
        let ost_index = ost.index();

        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| CutframeError::processing(format!("Failed to create video encoder: {}", e)))?;
        video.set_width(width);
        video.set_height(height);
        video.set_aspect_ratio(decoder.aspect_ratio());
        video.set_format(format::Pixel::YUV420P);
        video.set_frame_rate(Some(frame_rate));
        video.set_time_base(encoder_time_base);
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut options = Dictionary::new();
        options.set("crf", &request.encoder.crf.to_string());
        options.set("preset", &request.encoder.preset);
        options.set("threads", &threads.to_string());

        let encoder = video
            .open_with(options)
            .map_err(|e| CutframeError::processing(format!("Failed to open video encoder: {}", e)))?;
        ost.set_parameters(&encoder);
        ost.set_time_base(encoder_time_base);

        Ok(Self {
            video_index,
            decoder,
            graph,
            encoder,
            ost_index,
            input_time_base,
            encoder_time_base,
            ost_time_base: encoder_time_base,
            last_pts: None,
            frames: 0,
            bytes: 0,
        })
    }

    /// The muxer may pick its own time base while writing the header
    fn resolve_output_time_base(&mut self, octx: &format::context::Output) -> CutframeResult<()> {
        self.ost_time_base = octx
            .stream(self.ost_index)
            .ok_or_else(|| CutframeError::processing("Output video stream disappeared"))?
            .time_base();
        Ok(())
    }

    /// Drain decoded frames into the graph; `false` once a frame lies past the trim point
    fn receive_decoded(
        &mut self,
        octx: &mut format::context::Output,
        timeline: &mut Timeline,
        trim: f64,
        progress: &dyn ProgressSink,
    ) -> CutframeResult<bool> {
        let mut decoded = frame::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let Some(timestamp) = decoded.timestamp().or_else(|| decoded.pts()) else {
                debug!("Skipping frame without timestamp");
                continue;
            };
            let offset = timeline.offset(timestamp, self.input_time_base);
            let seconds = timeline.seconds(timestamp, self.input_time_base);
            if seconds > trim {
                return Ok(false);
            }

            decoded.set_pts(Some(timestamp - offset));
            self.graph
                .get("in")
                .ok_or_else(|| CutframeError::processing("Filter source missing"))?
                .source()
                .add(&decoded)
                .map_err(|e| CutframeError::processing(format!("Failed to feed filter graph: {}", e)))?;
            self.receive_filtered(octx)?;

            progress.emit(ProgressEvent::Frame {
                frames: self.frames,
                seconds,
            });
        }
        Ok(true)
    }

    fn receive_filtered(&mut self, octx: &mut format::context::Output) -> CutframeResult<()> {
        let mut filtered = frame::Video::empty();
        loop {
            let pulled = self
                .graph
                .get("out")
                .ok_or_else(|| CutframeError::processing("Filter sink missing"))?
                .sink()
                .frame(&mut filtered);
            if pulled.is_err() {
                return Ok(());
            }

            let pts = filtered
                .pts()
                .map(|pts| pts.rescale(self.input_time_base, self.encoder_time_base))
                .map(|pts| match self.last_pts {
                    Some(last) if pts <= last => last + 1,
                    _ => pts,
                });
            self.last_pts = pts.or(self.last_pts);
            filtered.set_pts(pts);
            filtered.set_kind(picture::Type::None);

            self.encoder.send_frame(&filtered).map_err(|e| {
                CutframeError::processing(format!("Failed to send frame to encoder: {}", e))
            })?;
            self.frames += 1;
            self.receive_encoded(octx)?;
        }
    }

    fn receive_encoded(&mut self, octx: &mut format::context::Output) -> CutframeResult<()> {
        let mut encoded = Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.ost_index);
            encoded.rescale_ts(self.encoder_time_base, self.ost_time_base);
            self.bytes += encoded.size() as u64;
            encoded.write_interleaved(octx).map_err(|e| {
                CutframeError::processing(format!("Failed to write encoded packet: {}", e))
            })?;
        }
        Ok(())
    }

    /// Flush the graph, then the encoder
    fn flush(&mut self, octx: &mut format::context::Output) -> CutframeResult<()> {
        self.graph
            .get("in")
            .ok_or_else(|| CutframeError::processing("Filter source missing"))?
            .source()
            .flush()
            .map_err(|e| CutframeError::processing(format!("Failed to flush filter graph: {}", e)))?;
        self.receive_filtered(octx)?;

        self.encoder.send_eof().map_err(|e| {
            CutframeError::processing(format!("Failed to flush video encoder: {}", e))
        })?;
        self.receive_encoded(octx)
    }

    fn output_seconds(&self) -> f64 {
        self.last_pts
            .map(|pts| pts as f64 * f64::from(self.encoder_time_base))
            .unwrap_or(0.0)
    }
}

/// `buffer` source matching the decoder, the chain, and a `buffersink`
fn build_graph(
    decoder: &ffmpeg::decoder::Video,
    time_base: Rational,
    description: &str,
) -> CutframeResult<filter::Graph> {
    let mut graph = filter::Graph::new();

    let pixel_format: ffmpeg::ffi::AVPixelFormat = decoder.format().into();
    let aspect = match decoder.aspect_ratio() {
        sar if sar.numerator() > 0 && sar.denominator() > 0 => sar,
        _ => Rational::new(1, 1),
    };
    let args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
        decoder.width(),
        decoder.height(),
        pixel_format as i32,
        time_base.numerator(),
        time_base.denominator(),
        aspect.numerator(),
        aspect.denominator()
    );
    debug!("Filter source args: {}", args);

    let buffer = filter::find("buffer")
        .ok_or_else(|| CutframeError::processing("FFmpeg has no 'buffer' filter"))?;
    let buffersink = filter::find("buffersink")
        .ok_or_else(|| CutframeError::processing("FFmpeg has no 'buffersink' filter"))?;

    graph
        .add(&buffer, "in", &args)
        .map_err(|e| CutframeError::processing(format!("Failed to create filter source: {}", e)))?;
    graph
        .add(&buffersink, "out", "")
        .map_err(|e| CutframeError::processing(format!("Failed to create filter sink: {}", e)))?;

    graph
        .output("in", 0)
        .and_then(|parser| parser.input("out", 0))
        .and_then(|parser| parser.parse(description))
        .map_err(|e| {
            CutframeError::processing(format!("Failed to parse filter graph '{}': {}", description, e))
        })?;
    graph
        .validate()
        .map_err(|e| CutframeError::processing(format!("Failed to configure filter graph: {}", e)))?;

    Ok(graph)
}

/// Copied audio streams, keyed by input index
#[derive(Default)]
struct AudioPassthrough {
    streams: HashMap<usize, AudioStream>,
    bytes: u64,
}

struct AudioStream {
    ost_index: usize,
    input_time_base: Rational,
    ost_time_base: Rational,
}

impl AudioPassthrough {
    fn open(
        ictx: &format::context::Input,
        octx: &mut format::context::Output,
        video_index: usize,
    ) -> CutframeResult<Self> {
        let mut streams = HashMap::new();
        for ist in ictx.streams() {
            if ist.index() == video_index || ist.parameters().medium() != media::Type::Audio {
                continue;
            }
            let mut ost = octx
                .add_stream(encoder::find(codec::Id::None))
                .map_err(|e| CutframeError::processing(format!("Failed to add audio stream: {}", e)))?;
            ost.set_parameters(ist.parameters());
            // let the muxer choose a tag valid for its container
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            ost.set_time_base(ist.time_base());
            debug!("Audio stream {} copied to output stream {}", ist.index(), ost.index());

            streams.insert(
                ist.index(),
                AudioStream {
                    ost_index: ost.index(),
                    input_time_base: ist.time_base(),
                    ost_time_base: ist.time_base(),
                },
            );
        }
        Ok(Self { streams, bytes: 0 })
    }

    fn resolve_output_time_bases(&mut self, octx: &format::context::Output) -> CutframeResult<()> {
        for audio in self.streams.values_mut() {
            audio.ost_time_base = octx
                .stream(audio.ost_index)
                .ok_or_else(|| CutframeError::processing("Output audio stream disappeared"))?
                .time_base();
        }
        Ok(())
    }

    /// Write an audio packet if it falls inside the trim window
    fn write(
        &mut self,
        index: usize,
        mut packet: Packet,
        timeline: &mut Timeline,
        trim: f64,
        octx: &mut format::context::Output,
    ) -> CutframeResult<()> {
        let Some(audio) = self.streams.get_mut(&index) else {
            return Ok(());
        };
        let Some(timestamp) = packet.pts().or_else(|| packet.dts()) else {
            return Ok(());
        };
        let offset = timeline.offset(timestamp, audio.input_time_base);
        if timeline.seconds(timestamp, audio.input_time_base) > trim {
            return Ok(());
        }

        packet.set_pts(packet.pts().map(|pts| pts - offset));
        packet.set_dts(packet.dts().map(|dts| dts - offset));
        packet.rescale_ts(audio.input_time_base, audio.ost_time_base);
        packet.set_position(-1);
        packet.set_stream(audio.ost_index);
        self.bytes += packet.size() as u64;
        packet.write_interleaved(octx).map_err(|e| {
            CutframeError::processing(format!("Failed to write audio packet: {}", e))
        })
    }
}
