//! JSON extraction from noisy model output
//!
//! Models wrap their JSON in code fences, lead with prose, or trail off into
//! commentary. [`extract`] cuts out the outermost object without trying to
//! parse it; decoding failures are detected later by the caller.

/// Fence markers removed before searching, longest first
const FENCE_MARKERS: [&str; 2] = ["```json", "```"];

/// Pull the outermost `{ ... }` span out of `raw`.
///
/// Strips code fence markers, then returns everything from the first
/// unescaped `{` to the last `}` inclusive. When no such ordered pair exists
/// the trimmed input is returned unchanged. Total over all strings and
/// idempotent.
pub fn extract(raw: &str) -> String {
    let stripped = strip_fences(raw);

    match (first_unescaped_open_brace(&stripped), stripped.rfind('}')) {
        (Some(start), Some(end)) if start < end => stripped[start..=end].to_string(),
        _ => raw.trim().to_string(),
    }
}

fn strip_fences(raw: &str) -> String {
    FENCE_MARKERS
        .iter()
        .fold(raw.to_string(), |text, marker| text.replace(marker, ""))
}

fn first_unescaped_open_brace(text: &str) -> Option<usize> {
    let mut previous = None;
    for (index, ch) in text.char_indices() {
        if ch == '{' && previous != Some('\\') {
            return Some(index);
        }
        previous = Some(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_with_prose() {
        let raw = "Here you go:\n```json\n{\"a\":1}\n```\nthanks";
        assert_eq!(extract(raw), "{\"a\":1}");
    }

    #[test]
    fn test_escaped_brace_is_skipped() {
        assert_eq!(extract(r#"note \{ then {"x":2}"#), r#"{"x":2}"#);
    }

    #[test]
    fn test_braces_out_of_order() {
        assert_eq!(extract("  } nothing here {  "), "} nothing here {");
    }
}
