use chrono::Local;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Local time down to the microsecond, e.g. `20250101_093015_123456`.
pub fn timestamp_tag() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%6f").to_string()
}

fn unsafe_name_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\s/\\:*?"<>|]"#).expect("static regex"))
}

/// File name stem for a title: whitespace and path separators become `_`.
pub fn title_stem(title: &str) -> String {
    unsafe_name_chars().replace_all(title.trim(), "_").into_owned()
}

/// `dir/<stem>_<timestamp>.<ext>`, with a counter appended if that path is
/// already taken.
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let tag = timestamp_tag();
    let candidate = dir.join(format!("{stem}_{tag}.{ext}"));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}_{tag}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
