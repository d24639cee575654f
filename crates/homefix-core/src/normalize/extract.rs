//! Locating a JSON object inside free-form model output

use regex::Regex;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:json)[^\n]*\n(.*?)```").expect("JSON_FENCE is a compile-time constant")
});

/// Find the JSON object text in raw model output.
///
/// A fenced block labeled `json` wins when it contains an object; otherwise
/// the first balanced top-level `{...}` span in the whole text is used.
#[must_use]
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(body) = JSON_FENCE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| first_object_span(m.as_str()))
    {
        return Some(body);
    }
    first_object_span(raw)
}

/// First balanced `{...}` span, skipping braces inside string literals
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
