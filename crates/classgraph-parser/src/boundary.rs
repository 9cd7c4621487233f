//! Brace matching for class, namespace and method bodies.

use crate::scan::skip_literal;

/// Offset of the `}` matching the first `{` at or after `start`.
///
/// Braces inside string and char literals are not counted, and a `}` seen
/// before the first `{` is skipped. If the text runs out before the braces
/// balance, the input length is returned; callers treat that as a malformed
/// boundary and move on.
pub fn find_matching_brace(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// [`find_matching_brace`] as an `Option`: `None` when the braces never balance.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let end = find_matching_brace(text, open);
    (end < text.len()).then_some(end)
}
