/// Cut `s` down to at most `max_bytes`, backing up to the nearest char
/// boundary so multi-byte text is never split mid-character. Used to
/// enforce the brand-context byte budget.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Remove the ```json fences models like to wrap structured output in,
/// leaving the bare payload for serde.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
