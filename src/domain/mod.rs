//! Domain layer: edit requests, presets and time values

pub mod model;

pub use model::{
    EditRequest, EncoderSettings, FilterPreset, Resolution, TextOverlay, TimeSpec,
};
