/// Words shown together on screen.
pub const WORDS_PER_CHUNK: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionChunk {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl CaptionChunk {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Splits `script` into groups of eight words and spreads `total_duration`
/// evenly over them. The chunks tile `[0, total_duration)` exactly; an empty
/// script yields one empty chunk covering the whole span.
pub fn segment(script: &str, total_duration: f64) -> Vec<CaptionChunk> {
    let words: Vec<&str> = script.split_whitespace().collect();
    if words.is_empty() {
        return vec![CaptionChunk {
            text: String::new(),
            start: 0.0,
            duration: total_duration,
        }];
    }

    let count = words.len().div_ceil(WORDS_PER_CHUNK);
    let chunk_duration = total_duration / count as f64;
    words
        .chunks(WORDS_PER_CHUNK)
        .enumerate()
        .map(|(i, group)| CaptionChunk {
            text: group.join(" "),
            start: i as f64 * chunk_duration,
            duration: chunk_duration,
        })
        .collect()
}
