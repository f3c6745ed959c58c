//! Filter graph description builder
//!
//! Produces the textual graph handed to `avfilter_graph_parse`: the color
//! preset, a scale to the target resolution (or to even source dimensions),
//! the centered caption and a final conversion to the encoder pixel format.

use crate::domain::model::{FilterPreset, Resolution, TextOverlay};
use crate::error::{CutframeError, CutframeResult};

/// Pixel format every graph ends with; matches the encoder setup
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";

/// Keeps the source size, dropping an odd last row or column; 4:2:0 needs even sizes
pub const EVEN_SCALE: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Encoder frame size for a source of `width`x`height`; agrees with the
/// scale step of [`build_filter_description`]
pub fn output_size(resolution: Resolution, width: u32, height: u32) -> (u32, u32) {
    resolution
        .dimensions()
        .unwrap_or(((width & !1).max(2), (height & !1).max(2)))
}

/// Build the full filter chain for one job
pub fn build_filter_description(
    preset: FilterPreset,
    resolution: Resolution,
    overlay: Option<&TextOverlay>,
) -> CutframeResult<String> {
    let mut chain = vec![preset.filter_description().to_string()];

    match resolution.dimensions() {
        Some((width, height)) => chain.push(format!("scale={}:{}", width, height)),
        None => chain.push(EVEN_SCALE.to_string()),
    }

    if let Some(overlay) = overlay.filter(|o| !o.is_empty()) {
        chain.push(drawtext(overlay)?);
    }

    chain.push(format!("format={}", OUTPUT_PIXEL_FORMAT));
    Ok(chain.join(","))
}

/// `drawtext` filter centered on the frame
pub fn drawtext(overlay: &TextOverlay) -> CutframeResult<String> {
    if overlay.font_size == 0 {
        return Err(CutframeError::invalid("font size must be non-zero"));
    }
    validate_color(&overlay.font_color)?;

    let mut filter = String::from("drawtext=");
    if let Some(font_file) = overlay.font_file.as_deref().filter(|f| !f.is_empty()) {
        filter.push_str("fontfile=");
        filter.push_str(&quote_option_value(font_file));
        filter.push(':');
    }
    filter.push_str("text=");
    filter.push_str(&quote_option_value(&escape_text_expansion(&overlay.text)));
    filter.push_str(&format!(
        ":fontcolor={}:fontsize={}:x=(w-tw)/2:y=(h-th)/2",
        overlay.font_color, overlay.font_size
    ));
    Ok(filter)
}

/// Escape the characters drawtext's own text expansion treats specially
fn escape_text_expansion(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%")
}

/// Escape a value for the option parser, then quote it for the graph parser.
///
/// The option parser unescapes `\`, `'` and `:`; the graph parser keeps
/// everything inside single quotes literal, so only `'` needs the
/// close-escape-reopen treatment there.
fn quote_option_value(value: &str) -> String {
    let mut option_level = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if matches!(ch, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(ch);
    }
    format!("'{}'", option_level.replace('\'', "'\\''"))
}

fn validate_color(color: &str) -> CutframeResult<()> {
    let ok = !color.is_empty()
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '@' | '.' | '_'));
    if ok {
        Ok(())
    } else {
        Err(CutframeError::invalid(format!("invalid font color '{}'", color)))
    }
}
