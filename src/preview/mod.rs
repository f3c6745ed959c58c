//! Frame preview: decoding to RGBA and pacing the polling loop

pub mod clock;
pub mod decoder;

pub use clock::{fit_within, FrameClock};
pub use decoder::{FrameDecoder, PreviewFrame};
