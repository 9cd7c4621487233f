//! Member declarations shared by the brace-and-semicolon languages.
//!
//! A class body is cut into [`Segment`]s, one per top-level declaration,
//! and each segment is split into its parts by the helpers below. The
//! language extractors decide what the parts mean.

use crate::boundary::find_matching_brace;
use crate::params::{parse_param, split_params};
use crate::scan::{
    first_top_level_paren, ident_before, is_identifier, matching_close, prev_non_ws, skip_literal,
    split_top_level_whitespace, top_level_arrow_body, top_level_assign, top_level_colon,
};
use classgraph_core::language::Language;
use classgraph_core::model::Param;

/// Names that look like a call but never name a method.
const RESERVED_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "throw", "synchronized", "else",
    "do", "try", "super", "this", "assert", "sizeof", "alignof", "decltype", "static_assert",
    "typeof", "nameof", "default", "using", "lock", "foreach", "when",
];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// One top-level declaration of a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Text up to the terminating `;` or the opening brace of `block`.
    pub header: &'a str,
    /// Contents of a trailing brace block (method or property body).
    pub block: Option<&'a str>,
}

/// Cut a class body into top-level declarations.
///
/// A declaration ends at `;` or at a brace block outside parentheses. A
/// brace block stays inside the declaration when it belongs to a field
/// initializer (`= {..}`, anonymous classes, lambdas), to a C# expression
/// body, or, in C++, to a brace-initialized member or a constructor
/// initializer list entry.
pub fn segments(body: &str, language: Language) -> Vec<Segment<'_>> {
    let bytes = body.as_bytes();
    let mut out = Vec::new();
    let mut paren = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' => paren += 1,
            b')' | b']' => paren = paren.saturating_sub(1),
            b';' if paren == 0 => {
                push_segment(&mut out, &body[start..i], None);
                start = i + 1;
            }
            b'{' if paren == 0 => {
                let close = find_matching_brace(body, i);
                let header = &body[start..i];
                if continues_declaration(header, body, i, language) {
                    i = close + 1;
                    continue;
                }
                let block = &body[(i + 1).min(close)..close];
                push_segment(&mut out, header, Some(block));
                start = (close + 1).min(bytes.len());
                i = close + 1;
                continue;
            }
            b'}' if paren == 0 => start = i + 1,
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        push_segment(&mut out, &body[start..], None);
    }
    out
}

fn push_segment<'a>(out: &mut Vec<Segment<'a>>, header: &'a str, block: Option<&'a str>) {
    let trimmed = header.trim();
    if trimmed.is_empty() && block.is_none() {
        return;
    }
    // leftover initializer after a property block: `{ get; set; } = 5;`
    if trimmed.starts_with('=') {
        return;
    }
    out.push(Segment {
        header: trimmed,
        block,
    });
}

fn continues_declaration(header: &str, body: &str, brace: usize, language: Language) -> bool {
    if top_level_assign(header).is_some() || top_level_arrow_body(header).is_some() {
        return true;
    }
    if language != Language::Cpp {
        return false;
    }
    let Some((_, before)) = prev_non_ws(body, brace) else {
        return false;
    };
    let brace_init = before.is_ascii_alphanumeric() || before == b'_' || before == b'>';
    if !brace_init {
        return false;
    }
    match first_top_level_paren(header) {
        // constructor initializer list: `Foo() : a{1}, b{2} {`
        Some(paren) => matching_close(header, paren)
            .is_some_and(|close| top_level_colon(&header[close + 1..]).is_some()),
        // brace-initialized member: `int x{5};`, but not `enum E {` and friends
        None => {
            let first = header.split_whitespace().next().unwrap_or_default();
            !matches!(
                first,
                "enum" | "union" | "struct" | "class" | "namespace" | "extern" | "template"
            ) && header.split_whitespace().count() >= 2
        }
    }
}

/// A method-like declaration split at its parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<'a> {
    /// Modifiers, generic parameters and return type.
    pub prefix: &'a str,
    pub name: &'a str,
    /// Generic parameter list written after the name (`Get<T>(..)`).
    pub generics: &'a str,
    pub params: &'a str,
    /// Everything after the closing parenthesis.
    pub tail: &'a str,
    /// The name is preceded by `~` (destructor, finalizer).
    pub tilde: bool,
}

/// Split `header` at its first top-level `(`, if that comes before any
/// assignment and is preceded by a name.
pub fn split_signature(header: &str) -> Option<Signature<'_>> {
    let paren = first_top_level_paren(header)?;
    if top_level_assign(header).is_some_and(|eq| eq < paren)
        || top_level_arrow_body(header).is_some_and(|arrow| arrow < paren)
    {
        return None;
    }
    let (name_end, generics) = match prev_non_ws(header, paren) {
        Some((close, b'>')) => {
            let open = matching_open_angle(header, close)?;
            (open, &header[open + 1..close])
        }
        _ => (paren, ""),
    };
    let name_range = ident_before(header, name_end)?;
    let close = matching_close(header, paren)?;
    let tilde = prev_non_ws(header, name_range.start).is_some_and(|(_, b)| b == b'~');
    let prefix_end = if tilde {
        prev_non_ws(header, name_range.start).map_or(name_range.start, |(p, _)| p)
    } else {
        name_range.start
    };
    Some(Signature {
        prefix: header[..prefix_end].trim(),
        name: &header[name_range],
        generics,
        params: &header[paren + 1..close],
        tail: header[close + 1..].trim(),
        tilde,
    })
}

/// Offset of the `<` matching the `>` at `close`, scanning backwards.
fn matching_open_angle(text: &str, close: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        match bytes[i] {
            b'>' if i == 0 || bytes[i - 1] != b'-' => depth += 1,
            b'<' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Modifiers, generic parameters and type recovered from a declaration
/// prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    pub modifiers: Vec<String>,
    pub generic_params: Vec<String>,
    pub type_name: String,
}

impl Prefix {
    pub fn has(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// Split a prefix into known modifier words, a leading `<...>` generic
/// list and the remaining type text.
pub fn split_prefix(prefix: &str, modifiers: &[&str]) -> Prefix {
    let mut out = Prefix::default();
    let mut type_tokens = Vec::new();
    for token in split_top_level_whitespace(prefix) {
        if type_tokens.is_empty() && modifiers.contains(&token) {
            out.modifiers.push(token.to_string());
        } else if type_tokens.is_empty()
            && token.starts_with('<')
            && let Some(close) = matching_close(token, 0)
        {
            out.generic_params.extend(generic_names(&token[1..close]));
        } else {
            type_tokens.push(token);
        }
    }
    out.type_name = type_tokens.join(" ");
    out
}

/// Parameter names of a generic or template parameter list.
///
/// Bounds, defaults and variance are dropped: `T extends Foo<T>`,
/// `typename T = int`, `out T : Any`, `typename... Ts` give `T`, `T`, `T`,
/// `Ts`.
pub fn generic_names(list: &str) -> Vec<String> {
    split_params(list)
        .iter()
        .filter_map(|item| {
            let mut item = item.as_str();
            if let Some(eq) = top_level_assign(item) {
                item = &item[..eq];
            }
            if let Some(colon) = top_level_colon(item) {
                item = &item[..colon];
            }
            for bound in [" extends ", " super "] {
                if let Some(pos) = item.find(bound) {
                    item = &item[..pos];
                }
            }
            let name = item.split_whitespace().last()?.trim_start_matches("...");
            is_identifier(name).then(|| name.to_string())
        })
        .collect()
}

/// Parameters of a parameter list.
pub fn parse_params(text: &str, language: Language) -> Vec<Param> {
    split_params(text)
        .iter()
        .filter_map(|item| parse_param(item, language))
        .filter(|p| p.type_name != "void")
        .collect()
}

/// One declarator of a field declaration: type as written and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub type_name: String,
    pub name: String,
}

/// Split a field declaration (without modifiers and initializer of the
/// first declarator) into its declarators: `int x, *y, z[3]` gives three.
pub fn declarators(decl: &str, language: Language) -> Vec<Declarator> {
    let items = split_params(decl);
    let Some((first, rest)) = items.split_first() else {
        return Vec::new();
    };
    let Some(param) = parse_param(first, language) else {
        return Vec::new();
    };
    let Some(name) = param.name else {
        return Vec::new();
    };

    let tokens = split_top_level_whitespace(first);
    let base_type = tokens
        .split_last()
        .map(|(_, ty)| ty.join(" "))
        .unwrap_or_default();
    let mut out = vec![Declarator {
        type_name: param.type_name,
        name,
    }];
    for item in rest {
        let item = match top_level_assign(item) {
            Some(eq) => &item[..eq],
            None => item.as_str(),
        }
        .trim();
        let marks_len = item.len() - item.trim_start_matches(['*', '&']).len();
        let (marks, declarator) = item.split_at(marks_len);
        let (name, array) = match declarator.find('[') {
            Some(open) => declarator.split_at(open),
            None => (declarator, ""),
        };
        if is_identifier(name.trim()) && !base_type.is_empty() {
            out.push(Declarator {
                type_name: format!("{base_type}{marks}{array}"),
                name: name.trim().to_string(),
            });
        }
    }
    out
}
