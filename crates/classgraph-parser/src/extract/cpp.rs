use super::members::{
    declarators, generic_names, is_reserved_name, parse_params, segments, split_prefix,
    split_signature,
};
use super::{
    ClassHeader, HeaderScan, LanguageExtractor, Members, Namespaces, ScanScope,
    declaration_start,
};
use crate::boundary::find_matching_brace;
use crate::params::split_params;
use crate::scan::{
    declaration_prefix, find_top_level, is_ident_byte, matching_close, open_angle_depth,
    skip_literal, skip_ws, strip_leading_attributes, top_level_assign,
    top_level_colon, top_level_words,
};
use crate::types::container_target;
use classgraph_core::language::Language;
use classgraph_core::model::{
    Access, ClassKind, MethodFlags, MethodKind, MethodRecord, RelationKind, VariableFlags,
    VariableRecord,
};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const METHOD_MODIFIERS: &[&str] = &[
    "virtual", "static", "inline", "explicit", "constexpr", "consteval", "extern", "friend",
];

const FIELD_MODIFIERS: &[&str] = &["static", "mutable", "inline", "thread_local", "extern"];

/// Leading words of member declarations that are not extracted.
const SKIPPED_MEMBERS: &[&str] = &["friend", "using", "typedef", "static_assert", "enum", "namespace"];

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static NAMESPACE_RE: OnceLock<Regex> = OnceLock::new();
static USING_RE: OnceLock<Regex> = OnceLock::new();
static TEMPLATE_RE: OnceLock<Regex> = OnceLock::new();
static OPERATOR_RE: OnceLock<Regex> = OnceLock::new();

/// C++: block namespaces, `class`/`struct`/`union` headers with template
/// prefixes and base lists, access labels, operators and pure virtuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppExtractor;

impl LanguageExtractor for CppExtractor {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn namespaces(&self, text: &str) -> Namespaces {
        let re = NAMESPACE_RE.get_or_init(|| {
            Regex::new(r"\b(?:inline\s+)?namespace(?:\s+([\w:]+))?\s*\{").unwrap()
        });
        let mut namespaces = Namespaces::default();
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let open = whole.end() - 1;
            let close = find_matching_brace(text, open);
            let name = caps.get(1).map_or("", |m| m.as_str());
            namespaces
                .blocks
                .push((open + 1..close, name.trim_start_matches("::").to_string()));
        }
        namespaces
    }

    fn imports(&self, text: &str) -> Vec<String> {
        let re = USING_RE.get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*using[ \t]+(?:namespace[ \t]+)?([\w:]+)[ \t]*;").unwrap()
        });
        re.captures_iter(text).map(|c| c[1].to_string()).collect()
    }

    fn next_header(&self, text: &str, from: usize, scope: &ScanScope) -> Option<HeaderScan> {
        let re = HEADER_RE.get_or_init(|| Regex::new(r"\b(class|struct|union)\b").unwrap());
        let keyword = re.find_at(text, from)?;
        if keyword.start() >= scope.range.end {
            return None;
        }
        let resume = Some(HeaderScan::Resume(keyword.end()));

        let prefix = declaration_prefix(text, keyword.start());
        if open_angle_depth(&prefix) > 0 {
            // `template <class T>`
            return resume;
        }
        let words = top_level_words(&prefix);
        let start = class_start(text, keyword.start(), scope.range.start);
        match words.last().copied() {
            Some("enum") => return Some(skip_enum(text, start, keyword.end())),
            Some("friend") => return resume,
            _ => {}
        }

        let Some(name) = class_name(text, keyword.end()) else {
            return resume;
        };
        let mut cursor = skip_ws(text, name.end);
        if text.as_bytes().get(cursor) == Some(&b'<') {
            // explicit specialization arguments
            match matching_close(text, cursor) {
                Some(close) => cursor = close + 1,
                None => return resume,
            }
        }
        let Some(open) = text[cursor..].find(['{', ';', '=', '(', ')']).map(|p| cursor + p) else {
            return resume;
        };
        if text.as_bytes()[open] != b'{' {
            // forward declaration or elaborated type
            return resume;
        }
        let close = find_matching_brace(text, open);
        if close >= text.len() {
            return resume;
        }
        let mut end = close + 1;
        let after = skip_ws(text, end);
        if text.as_bytes().get(after) == Some(&b';') {
            end = after + 1;
        }

        let kind = if keyword.as_str() == "class" {
            ClassKind::Class
        } else {
            ClassKind::Struct
        };
        let mut header = ClassHeader::new(kind, &text[name], start, end);
        header.body = Some(open + 1..close);
        header.generic_params = template_params(&prefix);

        let tail = &text[cursor..open];
        let (qualifiers, bases) = match top_level_colon(tail) {
            Some(colon) => (&tail[..colon], &tail[colon + 1..]),
            None => (tail, ""),
        };
        header.flags.is_final = qualifiers.split_whitespace().any(|w| w == "final");
        header.bases = split_params(bases)
            .into_iter()
            .map(|base| {
                let base = base
                    .split_whitespace()
                    .filter(|w| !matches!(*w, "public" | "protected" | "private" | "virtual"))
                    .collect::<Vec<_>>()
                    .join(" ");
                (base, RelationKind::Extended)
            })
            .collect();

        header.access = match scope.outer {
            None => Access::Public,
            Some(outer) => last_label(text, scope.range.start..keyword.start())
                .map_or_else(|| default_access(outer), |(access, _)| access),
        };
        Some(HeaderScan::Class(header))
    }

    fn members(&self, body: &str, owner: &ClassHeader) -> Members {
        let mut members = Members::default();
        let mut access = default_access(owner.kind);
        for segment in segments(body, Language::Cpp) {
            let mut header = segment.header;
            if let Some((label, pos)) = last_label(header, 0..header.len()) {
                access = label;
                header = header[pos..].trim();
            }
            header = strip_leading_attributes(header);
            let mut generic_params = Vec::new();
            if let Some(rest) = header.strip_prefix("template") {
                let rest = rest.trim_start();
                if rest.starts_with('<')
                    && let Some(close) = matching_close(rest, 0)
                {
                    generic_params = generic_names(&rest[1..close]);
                    header = rest[close + 1..].trim();
                }
            }
            let first = header.split_whitespace().next().unwrap_or_default();
            if header.is_empty()
                || SKIPPED_MEMBERS.contains(&first)
                || (matches!(first, "class" | "struct" | "union") && header.split_whitespace().count() <= 2)
            {
                continue;
            }

            // statements left over from macros or unbalanced bodies
            if split_signature(header).is_some_and(|sig| is_reserved_name(sig.name)) {
                continue;
            }
            if let Some(mut method) = operator_method(header, access)
                .or_else(|| method(header, access, owner))
            {
                method.generic_params.extend(generic_params);
                members.methods.push(method);
                continue;
            }
            if segment.block.is_some() && !header.contains('{') {
                continue;
            }
            members.fields.extend(fields(header, access));
        }
        members
    }
}

/// Start of a class declaration, after any access label in front of it.
fn class_start(text: &str, kw: usize, floor: usize) -> usize {
    let start = declaration_start(text, kw, floor);
    match last_label(text, start..kw) {
        Some((_, pos)) => skip_ws(text, pos).min(kw),
        None => start,
    }
}

/// `class` and `struct` members default to private and public.
fn default_access(kind: ClassKind) -> Access {
    match kind {
        ClassKind::Class => Access::Private,
        _ => Access::Public,
    }
}

/// Name after the class keyword, skipping attributes and export macros
/// (`class [[nodiscard]] MYLIB_API Widget`).
fn class_name(text: &str, from: usize) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut i = skip_ws(text, from);
    let mut name: Option<Range<usize>> = None;
    loop {
        if bytes.get(i) == Some(&b'[') {
            i = skip_ws(text, matching_close(text, i)? + 1);
            continue;
        }
        if !bytes.get(i).is_some_and(|b| is_ident_byte(*b) && !b.is_ascii_digit()) {
            return name;
        }
        let start = i;
        while i < bytes.len() && is_ident_byte(bytes[i]) {
            i += 1;
        }
        let word = &text[start..i];
        if word == "final" && name.is_some() {
            return name;
        }
        if matches!(word, "alignas" | "__declspec" | "__attribute__") {
            let open = skip_ws(text, i);
            i = skip_ws(text, matching_close(text, open)? + 1);
            continue;
        }
        name = Some(start..i);
        i = skip_ws(text, i);
    }
}

/// `enum class E { .. };` is skipped as a whole.
fn skip_enum(text: &str, start: usize, after_keyword: usize) -> HeaderScan {
    let Some(open) = text[after_keyword..]
        .find(['{', ';'])
        .map(|p| after_keyword + p)
    else {
        return HeaderScan::Resume(after_keyword);
    };
    if text.as_bytes()[open] == b';' {
        return HeaderScan::Resume(open + 1);
    }
    let close = find_matching_brace(text, open);
    if close >= text.len() {
        return HeaderScan::Resume(after_keyword);
    }
    let after = skip_ws(text, close + 1);
    let end = if text.as_bytes().get(after) == Some(&b';') {
        after + 1
    } else {
        close + 1
    };
    HeaderScan::Opaque(start..end)
}

fn template_params(prefix: &str) -> Vec<String> {
    let re = TEMPLATE_RE.get_or_init(|| Regex::new(r"\btemplate\s*<").unwrap());
    let Some(found) = re.find(prefix) else {
        return Vec::new();
    };
    let open = found.end() - 1;
    matching_close(prefix, open)
        .map(|close| generic_names(&prefix[open + 1..close]))
        .unwrap_or_default()
}

/// Last `public:`/`protected:`/`private:` label outside braces in `range`,
/// with the offset just past its colon.
fn last_label(text: &str, range: Range<usize>) -> Option<(Access, usize)> {
    let bytes = text.as_bytes();
    let end = range.end.min(bytes.len());
    let mut depth = 0usize;
    let mut found = None;
    let mut i = range.start;
    while i < end {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        let b = bytes[i];
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_ident_byte(b) && (i == 0 || !is_ident_byte(bytes[i - 1])) => {
                let mut j = i;
                while j < end && is_ident_byte(bytes[j]) {
                    j += 1;
                }
                let access = match &text[i..j] {
                    "public" => Some(Access::Public),
                    "protected" => Some(Access::Protected),
                    "private" => Some(Access::Private),
                    _ => None,
                };
                if let Some(access) = access {
                    let mut k = skip_ws(text, j);
                    if text[k..end].starts_with("slots") {
                        k = skip_ws(text, k + "slots".len());
                    }
                    if k < end && bytes[k] == b':' && bytes.get(k + 1) != Some(&b':') {
                        found = Some((access, k + 1));
                    }
                }
                i = j;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    found
}

/// Qualifiers after a parameter list.
#[derive(Debug, Default)]
struct Tail {
    is_const: bool,
    is_override: bool,
    is_final: bool,
    has_noexcept: bool,
    is_pure: bool,
    trailing_return: Option<String>,
}

fn parse_tail(tail: &str) -> Tail {
    // constructor initializer list
    let tail = match top_level_colon(tail) {
        Some(colon) => &tail[..colon],
        None => tail,
    };
    let (tail, assigned) = match top_level_assign(tail) {
        Some(eq) => (&tail[..eq], Some(tail[eq + 1..].trim())),
        None => (tail, None),
    };
    let arrow = find_top_level(tail, |b, i| b[i] == b'-' && b.get(i + 1) == Some(&b'>'));
    let (qualifiers, trailing_return) = match arrow {
        Some(at) => {
            let ret = tail[at + 2..]
                .split_whitespace()
                .filter(|w| !matches!(*w, "override" | "final"))
                .collect::<Vec<_>>()
                .join(" ");
            (&tail[..at], Some(ret).filter(|r| !r.is_empty()))
        }
        None => (tail, None),
    };
    let words: Vec<&str> = qualifiers
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    let after_arrow = arrow.map_or("", |at| &tail[at..]);
    let has = |w: &str| words.contains(&w) || after_arrow.split_whitespace().any(|x| x == w);
    Tail {
        is_const: words.contains(&"const"),
        is_override: has("override"),
        is_final: has("final"),
        has_noexcept: words.contains(&"noexcept"),
        is_pure: assigned == Some("0"),
        trailing_return,
    }
}

fn method(header: &str, access: Access, owner: &ClassHeader) -> Option<MethodRecord> {
    let sig = split_signature(header)?;
    let prefix = split_prefix(sig.prefix, METHOD_MODIFIERS);
    let tail = parse_tail(sig.tail);
    let (kind, name, return_type) = if sig.tilde {
        (MethodKind::Destructor, format!("~{}", sig.name), None)
    } else if prefix.type_name.is_empty() {
        if sig.name != owner.name {
            // macro invocation such as `Q_PROPERTY(...)`
            return None;
        }
        (MethodKind::Constructor, sig.name.to_string(), None)
    } else {
        let ret = match (&tail.trailing_return, prefix.type_name.as_str()) {
            (Some(trailing), "auto") => trailing.clone(),
            _ => prefix.type_name.clone(),
        };
        (MethodKind::Method, sig.name.to_string(), Some(ret))
    };
    Some(MethodRecord {
        name,
        kind,
        return_type,
        params: parse_params(sig.params, Language::Cpp),
        access,
        flags: MethodFlags {
            is_static: prefix.has("static"),
            is_abstract: tail.is_pure,
            is_virtual: prefix.has("virtual") || tail.is_override || tail.is_pure,
            is_const: tail.is_const,
            is_override: tail.is_override,
            is_final: tail.is_final,
            has_noexcept: tail.has_noexcept,
        },
        generic_params: prefix.generic_params,
    })
}

/// `operator==`, `operator()`, `operator new[]` and conversion operators.
fn operator_method(header: &str, access: Access) -> Option<MethodRecord> {
    let re = OPERATOR_RE.get_or_init(|| {
        Regex::new(
            r#"\boperator\b\s*(\(\s*\)|\[\s*\]|new\s*\[\s*\]|delete\s*\[\s*\]|new\b|delete\b|->\*?|<=>|<<=|>>=|<<|>>|&&|\|\||\+\+|--|[-+*/%^&|~!=<>]=?|,|""\s*\w+|[A-Za-z_][\w:]*(?:\s*<[^()]*>)?\s*[*&]*)\s*\("#,
        )
        .unwrap()
    });
    let caps = re.captures(header)?;
    let whole = caps.get(0)?;
    let op = caps.get(1)?.as_str();
    let open = whole.end() - 1;
    let close = matching_close(header, open)?;

    let prefix = split_prefix(header[..whole.start()].trim(), METHOD_MODIFIERS);
    let tail = parse_tail(&header[close + 1..]);
    let symbolic = !op.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        || op.starts_with("new")
        || op.starts_with("delete");
    let op_compact: String = op.split_whitespace().collect();
    let (name, return_type) = if symbolic {
        let ret = match (&tail.trailing_return, prefix.type_name.as_str()) {
            (Some(trailing), "auto") => trailing.clone(),
            _ => prefix.type_name.clone(),
        };
        (format!("operator{op_compact}"), Some(ret).filter(|r| !r.is_empty()))
    } else {
        // conversion operator: the target type is the result
        (format!("operator {}", op.trim()), Some(op.trim().to_string()))
    };
    Some(MethodRecord {
        name,
        kind: MethodKind::Method,
        return_type,
        params: parse_params(&header[open + 1..close], Language::Cpp),
        access,
        flags: MethodFlags {
            is_static: prefix.has("static"),
            is_abstract: tail.is_pure,
            is_virtual: prefix.has("virtual") || tail.is_override || tail.is_pure,
            is_const: tail.is_const,
            is_override: tail.is_override,
            is_final: tail.is_final,
            has_noexcept: tail.has_noexcept,
        },
        generic_params: prefix.generic_params,
    })
}

/// Remove `{...}` initializers: `int x{5}, y{}` → `int x, y`.
fn strip_brace_init(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        match matching_close(rest, open) {
            Some(close) => rest = &rest[close + 1..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn fields(header: &str, access: Access) -> Vec<VariableRecord> {
    let decl = strip_brace_init(header);
    // the first declarator's initializer; later ones are dropped per item
    let items = split_params(&decl);
    let cleaned: Vec<String> = items
        .iter()
        .map(|item| {
            let item = match top_level_assign(item) {
                Some(eq) => &item[..eq],
                None => item.as_str(),
            };
            // bit-field width
            match top_level_colon(item) {
                Some(colon) => item[..colon].trim().to_string(),
                None => item.trim().to_string(),
            }
        })
        .collect();
    let decl = cleaned.join(", ");

    let prefix = split_prefix(&decl, FIELD_MODIFIERS);
    let type_words: Vec<&str> = prefix.type_name.split_whitespace().collect();
    let flags = VariableFlags {
        is_static: prefix.has("static"),
        is_const: type_words.iter().any(|w| matches!(*w, "const" | "constexpr")),
    };
    declarators(&prefix.type_name, Language::Cpp)
        .into_iter()
        .map(|d| VariableRecord {
            target_type: container_target(&d.type_name, Language::Cpp),
            name: d.name,
            declared_type: d.type_name,
            access,
            flags,
        })
        .collect()
}
