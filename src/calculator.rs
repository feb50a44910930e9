//! Word-count → speech-duration calculator

/// Moderate speaking pace used by the studio
pub const WORDS_PER_MINUTE: u32 = 130;

/// Input is clamped to this many words
pub const MAX_WORDS: u32 = 10_000;

pub fn clamp_word_count(words: u32) -> u32 {
    words.min(MAX_WORDS)
}

/// Parse the raw calculator input.
///
/// Anything that is not a positive number counts as zero; fractions are
/// truncated and the result is clamped to [`MAX_WORDS`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped before the cast
pub fn parse_word_count(raw: &str) -> u32 {
    match raw.trim().replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => {
            value.min(f64::from(MAX_WORDS)).trunc() as u32
        }
        _ => 0,
    }
}

/// Speaking time as `M:SS`, rounded to the nearest second
pub fn duration_label(words: u32, words_per_minute: u32) -> String {
    let words = u64::from(clamp_word_count(words));
    let wpm = u64::from(words_per_minute.max(1));
    // round half up: words * 60 / wpm
    let total_seconds = (words * 120 + wpm) / (wpm * 2);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Text shown under the calculator input
pub fn result_line(words: u32) -> Option<String> {
    (words > 0).then(|| {
        format!(
            "⏱ Ca. {} Min bei moderatem Sprechtempo.",
            duration_label(words, WORDS_PER_MINUTE)
        )
    })
}
