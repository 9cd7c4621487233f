//! Byte-level scanning helpers shared by the extractors.
//!
//! All offsets are byte offsets. Every position these helpers stop at is an
//! ASCII byte (or the end of the text), so slicing with them never splits a
//! multi-byte character.

use std::ops::Range;

/// Identifier byte. Non-ASCII bytes count so Unicode identifiers stay whole.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if is_ident_byte(b) && !b.is_ascii_digit())
        && bytes.all(is_ident_byte)
}

/// If a string or char literal starts at `i`, return the offset just past it.
///
/// Unterminated double-quoted strings stop at the end of the line. A `'` that
/// does not open a one-character literal (C++ digit separators) is not a
/// literal.
pub fn skip_literal(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes.get(i)? {
        b'"' => {
            if bytes[i..].starts_with(b"\"\"\"") {
                let rest = &bytes[i + 3..];
                let end = rest
                    .windows(3)
                    .position(|w| w == b"\"\"\"")
                    .map_or(bytes.len(), |p| i + 3 + p + 3);
                return Some(end);
            }
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b'"' => return Some(j + 1),
                    b'\n' => return None,
                    _ => j += 1,
                }
            }
            None
        }
        b'\'' => match (bytes.get(i + 1), bytes.get(i + 2), bytes.get(i + 3)) {
            (Some(b'\\'), Some(_), Some(b'\'')) => Some(i + 4),
            (Some(c), Some(b'\''), _) if *c != b'\'' && *c != b'\\' => Some(i + 3),
            _ => None,
        },
        _ => None,
    }
}

/// Offset of the bracket closing the one opened at `open`, or `None` if the
/// text runs out first. `->` never closes an angle bracket.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let (open_b, close_b) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'<' => (b'<', b'>'),
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        let b = bytes[i];
        if b == open_b {
            depth += 1;
        } else if b == close_b && !(b == b'>' && i > 0 && bytes[i - 1] == b'-') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Nesting tracker for `()`, `[]`, `{}` and `<>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Depth {
    pub paren: usize,
    pub angle: usize,
}

impl Depth {
    /// Update for byte `b` at `i`; returns true if `b` was a bracket.
    pub fn step(&mut self, bytes: &[u8], i: usize) -> bool {
        match bytes[i] {
            b'(' | b'[' | b'{' => self.paren += 1,
            b')' | b']' | b'}' => self.paren = self.paren.saturating_sub(1),
            b'<' => self.angle += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => return false,
            b'>' => self.angle = self.angle.saturating_sub(1),
            _ => return false,
        }
        true
    }

    pub fn is_top(self) -> bool {
        self.paren == 0 && self.angle == 0
    }
}

/// First offset where `pred` holds outside every bracket pair and literal.
pub fn find_top_level(text: &str, pred: impl Fn(&[u8], usize) -> bool) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = Depth::default();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if depth.is_top() && pred(bytes, i) {
            return Some(i);
        }
        depth.step(bytes, i);
        i += 1;
    }
    None
}

/// First top-level `(`, ignoring parentheses inside `<...>`.
pub fn first_top_level_paren(text: &str) -> Option<usize> {
    find_top_level(text, |b, i| b[i] == b'(')
}

/// First top-level assignment `=`; comparison operators, `=>` and the `=`
/// of an `operator=` name do not count.
pub fn top_level_assign(text: &str) -> Option<usize> {
    find_top_level(text, |b, i| {
        if b[i] != b'=' {
            return false;
        }
        let prev = if i > 0 { b[i - 1] } else { b' ' };
        let next = b.get(i + 1).copied().unwrap_or(b' ');
        if matches!(prev, b'=' | b'!' | b'<' | b'>') || matches!(next, b'=' | b'>') {
            return false;
        }
        let before = std::str::from_utf8(&b[..i]).unwrap_or_default();
        !before.trim_end().ends_with("operator")
    })
}

/// First top-level `=>` (C# expression body).
pub fn top_level_arrow_body(text: &str) -> Option<usize> {
    find_top_level(text, |b, i| b[i] == b'=' && b.get(i + 1) == Some(&b'>'))
}

/// First top-level single `:` (not part of `::`).
pub fn top_level_colon(text: &str) -> Option<usize> {
    find_top_level(text, |b, i| {
        b[i] == b':'
            && b.get(i + 1) != Some(&b':')
            && (i == 0 || b[i - 1] != b':')
    })
}

/// Split on whitespace that sits outside `<...>`, `(...)` and `[...]`.
pub fn split_top_level_whitespace(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut depth = Depth::default();
    let mut start: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            start.get_or_insert(i);
            i = next;
            continue;
        }
        let b = bytes[i];
        if b.is_ascii_whitespace() && depth.is_top() {
            if let Some(s) = start.take() {
                ranges.push(s..i);
            }
        } else {
            start.get_or_insert(i);
            depth.step(bytes, i);
        }
        i += 1;
    }
    if let Some(s) = start {
        ranges.push(s..bytes.len());
    }
    ranges.into_iter().map(|r| &text[r]).collect()
}

/// Offset just past any whitespace starting at `i`.
pub fn skip_ws(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Previous non-whitespace byte before `i`, with its offset.
pub fn prev_non_ws(text: &str, i: usize) -> Option<(usize, u8)> {
    let bytes = text.as_bytes();
    let mut j = i.min(bytes.len());
    while j > 0 {
        j -= 1;
        if !bytes[j].is_ascii_whitespace() {
            return Some((j, bytes[j]));
        }
    }
    None
}

/// Range of the identifier that ends right before `end` (after trimming
/// whitespace).
pub fn ident_before(text: &str, end: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let (last, _) = prev_non_ws(text, end)?;
    if !is_ident_byte(bytes[last]) {
        return None;
    }
    let mut start = last;
    while start > 0 && is_ident_byte(bytes[start - 1]) {
        start -= 1;
    }
    Some(start..last + 1)
}

/// Text of the declaration that ends at `kw_start`: everything since the
/// previous `;`, `{` or `}`, without preprocessor lines.
pub fn declaration_prefix(text: &str, kw_start: usize) -> String {
    let head = &text[..kw_start];
    let from = head.rfind([';', '{', '}']).map_or(0, |p| p + 1);
    head[from..]
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unclosed `<` count of a prefix; positive means we are inside a template
/// or generic parameter list.
pub fn open_angle_depth(prefix: &str) -> usize {
    let bytes = prefix.as_bytes();
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Identifier words of a prefix, skipping anything inside brackets.
pub fn top_level_words(prefix: &str) -> Vec<&str> {
    let bytes = prefix.as_bytes();
    let mut words = Vec::new();
    let mut depth = Depth::default();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if depth.step(bytes, i) {
            i += 1;
            continue;
        }
        if depth.is_top() && is_ident_byte(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_ident_byte(bytes[i]) {
                i += 1;
            }
            // annotation names are not modifiers
            if start == 0 || bytes[start - 1] != b'@' {
                words.push(&prefix[start..i]);
            }
            continue;
        }
        i += 1;
    }
    words
}

/// Remove `@Name` / `@Name(...)` annotations, returning the remaining text
/// and the annotation names.
pub fn strip_annotations(text: &str) -> (String, Vec<String>) {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut names = Vec::new();
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        let starts_annotation = bytes[i] == b'@'
            && bytes
                .get(i + 1)
                .is_some_and(|b| is_ident_byte(*b) && !b.is_ascii_digit());
        if !starts_annotation {
            i += 1;
            continue;
        }
        out.push_str(&text[copied..i]);
        let mut j = i + 1;
        while j < bytes.len() && (is_ident_byte(bytes[j]) || bytes[j] == b'.' || bytes[j] == b':') {
            j += 1;
        }
        let name = text[i + 1..j].trim_end_matches(':');
        names.push(name.rsplit('.').next().unwrap_or(name).to_string());
        let k = skip_ws(text, j);
        if bytes.get(k) == Some(&b'(')
            && let Some(close) = matching_close(text, k)
        {
            j = close + 1;
        }
        out.push(' ');
        i = j;
        copied = j;
    }
    out.push_str(&text[copied..]);
    (out, names)
}

/// Remove leading `[Attribute]` groups (C#, C++ `[[...]]`).
pub fn strip_leading_attributes(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with('[') {
        match matching_close(rest, 0) {
            Some(close) => rest = rest[close + 1..].trim_start(),
            None => break,
        }
    }
    rest
}

/// Blank out byte ranges with spaces, keeping newlines so offsets and line
/// numbers stay valid.
pub fn mask_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for span in spans {
        let end = span.end.min(bytes.len());
        for b in &mut bytes[span.start.min(end)..end] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Blank the contents of string and char literals, keeping their quotes and
/// every line break, so keywords and brackets inside them are never matched.
pub fn mask_literals(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        match skip_literal(bytes, i) {
            Some(next) => {
                let end = next.min(bytes.len());
                for b in &mut out[(i + 1).min(end)..end.saturating_sub(1).max(i + 1)] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
                i = next;
            }
            None => i += 1,
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Collapse runs of whitespace to single spaces.
pub fn squash_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }
}
