use super::members::generic_names;
use super::{
    ClassHeader, HeaderScan, LanguageExtractor, Members, Namespaces, ScanScope,
    declaration_start, first_package_declaration,
};
use crate::boundary::find_matching_brace;
use crate::params::{parse_param, split_params};
use crate::scan::{
    Depth, find_top_level, first_top_level_paren, ident_before, is_ident_byte, mask_spans,
    matching_close, skip_literal, skip_ws, strip_annotations, top_level_assign, top_level_colon,
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

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static IMPORT_RE: OnceLock<Regex> = OnceLock::new();
static FUN_RE: OnceLock<Regex> = OnceLock::new();
static CONSTRUCTOR_RE: OnceLock<Regex> = OnceLock::new();
static PROPERTY_RE: OnceLock<Regex> = OnceLock::new();
static INFERRED_RE: OnceLock<Regex> = OnceLock::new();

/// Kotlin: `class`, `interface`, `object` and `companion object` headers,
/// primary constructors, supertype lists, `fun` declarations and
/// properties. Enum and annotation classes are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinExtractor;

impl LanguageExtractor for KotlinExtractor {
    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn namespaces(&self, text: &str) -> Namespaces {
        Namespaces::file(first_package_declaration(text).unwrap_or_default())
    }

    fn imports(&self, text: &str) -> Vec<String> {
        let re = IMPORT_RE.get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*import[ \t]+([\w.]+(?:\.\*)?)").unwrap()
        });
        re.captures_iter(text).map(|c| c[1].to_string()).collect()
    }

    fn next_header(&self, text: &str, from: usize, scope: &ScanScope) -> Option<HeaderScan> {
        let re = HEADER_RE.get_or_init(|| {
            Regex::new(
                r"(?:^|[^\w.:@])(?:(companion)\s+)?(class|interface|object)\b(?:[ \t]+([A-Za-z_]\w*))?",
            )
            .unwrap()
        });
        let caps = re.captures_at(text, from)?;
        let keyword = caps.get(2)?;
        let first = caps.get(1).unwrap_or(keyword);
        if first.start() >= scope.range.end {
            return None;
        }
        let resume = Some(HeaderScan::Resume(keyword.end()));
        let line_start = text[..first.start()].rfind('\n').map_or(0, |p| p + 1);
        let start = declaration_start(text, first.start(), scope.range.start).max(line_start);
        let (prefix, _) = strip_annotations(&text[line_start..first.start()]);
        let words: Vec<&str> = prefix.split_whitespace().collect();
        let has = |w: &str| words.contains(&w);

        let companion = caps.get(1).is_some();
        let name = match (caps.get(3), keyword.as_str()) {
            (Some(name), _) => name.as_str(),
            (None, "object") if companion => "Companion",
            (None, "object") => {
                // object expression: `object : Listener { .. }`
                return Some(match text[keyword.end()..].find('{') {
                    Some(p) => {
                        let open = keyword.end() + p;
                        let close = find_matching_brace(text, open);
                        HeaderScan::Opaque(keyword.start()..(close + 1).min(text.len()))
                    }
                    None => HeaderScan::Resume(keyword.end()),
                });
            }
            _ => return resume,
        };
        let name_end = caps.get(3).map_or(keyword.end(), |m| m.end());

        let kind = match keyword.as_str() {
            "interface" => ClassKind::Interface,
            "object" => ClassKind::Object,
            _ => ClassKind::Class,
        };

        let mut cursor = name_end;
        let mut generic_params = Vec::new();
        if text.as_bytes().get(cursor) == Some(&b'<') {
            let Some(close) = matching_close(text, cursor) else {
                return resume;
            };
            generic_params = generic_names(&text[cursor + 1..close]);
            cursor = close + 1;
        }
        cursor = skip_constructor_keyword(text, cursor);
        let mut ctor_params = None;
        let paren = skip_ws(text, cursor);
        if text.as_bytes().get(paren) == Some(&b'(') {
            let Some(close) = matching_close(text, paren) else {
                return resume;
            };
            ctor_params = Some(text[paren + 1..close].to_string());
            cursor = close + 1;
        }

        let mut supertypes = "";
        let colon = skip_ws(text, cursor);
        if text.as_bytes().get(colon) == Some(&b':') && text.as_bytes().get(colon + 1) != Some(&b':')
        {
            let end = clause_end(text, colon + 1);
            supertypes = &text[colon + 1..end];
            cursor = end;
        }
        let mut next = skip_ws(text, cursor);
        if word_at(text, next, "where") {
            cursor = clause_end(text, next + "where".len());
            next = skip_ws(text, cursor);
        }

        let (body, end) = if text.as_bytes().get(next) == Some(&b'{') {
            let close = find_matching_brace(text, next);
            if close >= text.len() {
                return resume;
            }
            (Some(next + 1..close), close + 1)
        } else {
            (None, cursor)
        };

        if has("enum") || has("annotation") {
            return Some(HeaderScan::Opaque(start..end.max(name_end)));
        }

        let mut header = ClassHeader::new(kind, name, start, end.max(name_end));
        header.generic_params = generic_params;
        header.ctor_params = ctor_params;
        header.body = body;
        header.bases = split_params(supertypes)
            .iter()
            .filter_map(|entry| {
                let name = supertype_name(entry);
                (!name.is_empty()).then(|| (name.to_string(), kotlin_supertype_kind(entry)))
            })
            .collect();
        header.access = words
            .iter()
            .find_map(|w| Access::from_keyword(w))
            .unwrap_or(Access::Public);
        let inheritable = has("open") || has("abstract") || has("sealed");
        header.flags.is_abstract = has("abstract") || (has("sealed") && kind != ClassKind::Interface);
        header.flags.is_final = kind != ClassKind::Interface && !inheritable;
        header.flags.is_static =
            kind == ClassKind::Object || (scope.outer.is_some() && !has("inner"));
        Some(HeaderScan::Class(header))
    }

    fn members(&self, body: &str, owner: &ClassHeader) -> Members {
        let mut members = Members::default();
        if let Some(params) = &owner.ctor_params {
            primary_constructor(params, owner, &mut members);
        }
        let masked = mask_spans(body, &brace_blocks(body));
        members.methods.extend(functions(&masked, owner));
        members.methods.extend(secondary_constructors(&masked, owner));
        members.fields.extend(properties(&masked, owner));
        members
    }
}

/// Kind of one supertype entry as written. An entry in constructor-call
/// form (`Interface()`, `Base<T>(args)`) is `Implemented`; every other
/// entry, delegations included, is `Extended`.
pub fn kotlin_supertype_kind(entry: &str) -> RelationKind {
    let mut entry = entry.trim();
    if let Some(by) = find_word(entry, "by") {
        entry = &entry[..by];
    }
    if first_top_level_paren(entry).is_some() {
        RelationKind::Implemented
    } else {
        RelationKind::Extended
    }
}

/// `Base<T>(args)` or `Listener by delegate` reduced to the type.
fn supertype_name(entry: &str) -> &str {
    let mut entry = entry.trim();
    if let Some(by) = find_word(entry, "by") {
        entry = &entry[..by];
    }
    if let Some(paren) = first_top_level_paren(entry) {
        entry = &entry[..paren];
    }
    entry.trim()
}

/// Offset of `word` as a whole word outside any brackets.
fn find_word(text: &str, word: &str) -> Option<usize> {
    find_top_level(text, |b, i| word_at_bytes(b, i, word))
}

fn word_at(text: &str, i: usize, word: &str) -> bool {
    word_at_bytes(text.as_bytes(), i, word)
}

fn word_at_bytes(b: &[u8], i: usize, word: &str) -> bool {
    b.get(i..).is_some_and(|rest| rest.starts_with(word.as_bytes()))
        && (i == 0 || !is_ident_byte(b[i - 1]))
        && b.get(i + word.len()).is_none_or(|c| !is_ident_byte(*c))
}

/// Offset just past `[modifiers] [@Annotations] constructor` following a
/// class name, or `cursor` when there is none.
fn skip_constructor_keyword(text: &str, cursor: usize) -> usize {
    let line_end = text[cursor..].find(['\n', '(', '{', ':']).map_or(text.len(), |p| cursor + p);
    let rest = &text[cursor..line_end];
    let Some(pos) = find_word(rest, "constructor") else {
        return cursor;
    };
    let (before, _) = strip_annotations(&rest[..pos]);
    let only_modifiers = before
        .split_whitespace()
        .all(|w| Access::from_keyword(w).is_some());
    if only_modifiers {
        cursor + pos + "constructor".len()
    } else {
        cursor
    }
}

/// End of a supertype list or `where` clause starting at `from`: the first
/// top-level `{`, `}`, `;` or `=`, a `where`, or a line break that is not
/// continued by a comma.
fn clause_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = Depth::default();
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if depth.is_top() {
            match bytes[i] {
                b'{' | b'}' | b';' | b'=' => return i,
                b'\n' => {
                    let seen = text[from..i].trim();
                    let next = skip_ws(text, i);
                    if !seen.is_empty() && !seen.ends_with(',') && bytes.get(next) != Some(&b',') {
                        return i;
                    }
                }
                _ if i > from && word_at_bytes(bytes, i, "where") => return i,
                _ => {}
            }
        }
        depth.step(bytes, i);
        i += 1;
    }
    bytes.len()
}

/// Inner ranges of every outermost brace block: function bodies, `init`
/// blocks, accessors and lambdas.
fn brace_blocks(body: &str) -> Vec<Range<usize>> {
    let bytes = body.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'{' {
            let close = find_matching_brace(body, i);
            spans.push(i + 1..close);
            i = close + 1;
            continue;
        }
        i += 1;
    }
    spans
}

/// Modifier words on the line before `at`, annotations removed.
fn line_modifiers(text: &str, at: usize) -> Vec<String> {
    let line_start = text[..at].rfind('\n').map_or(0, |p| p + 1);
    let (prefix, _) = strip_annotations(&text[line_start..at]);
    prefix.split_whitespace().map(str::to_string).collect()
}

fn access_of(words: &[String]) -> Access {
    words
        .iter()
        .find_map(|w| Access::from_keyword(w))
        .unwrap_or(Access::Public)
}

fn functions(text: &str, owner: &ClassHeader) -> Vec<MethodRecord> {
    let re = FUN_RE.get_or_init(|| Regex::new(r"\bfun\b").unwrap());
    let bytes = text.as_bytes();
    let in_interface = owner.kind == ClassKind::Interface;
    let mut methods = Vec::new();
    for found in re.find_iter(text) {
        let words = line_modifiers(text, found.start());
        let has = |w: &str| words.iter().any(|m| m == w);

        let mut cursor = skip_ws(text, found.end());
        let mut generic_params = Vec::new();
        if bytes.get(cursor) == Some(&b'<') {
            let Some(close) = matching_close(text, cursor) else {
                continue;
            };
            generic_params = generic_names(&text[cursor + 1..close]);
            cursor = close + 1;
        }
        let Some(paren) = first_top_level_paren(&text[cursor..]).map(|p| cursor + p) else {
            continue;
        };
        // receiver types are dropped: `fun String.shout()` is named `shout`
        let Some(name) = ident_before(text, paren).filter(|r| r.start >= cursor) else {
            continue;
        };
        let Some(close) = matching_close(text, paren) else {
            continue;
        };

        let mut after = skip_inline_ws(text, close + 1);
        let mut return_type = None;
        if bytes.get(after) == Some(&b':') {
            let end = return_type_end(text, after + 1);
            let ty = text[after + 1..end].trim();
            if !ty.is_empty() {
                return_type = Some(ty.to_string());
            }
            after = end;
        }
        let has_body = matches!(bytes.get(skip_ws(text, after)), Some(b'{' | b'='));

        methods.push(MethodRecord {
            name: text[name].to_string(),
            kind: MethodKind::Method,
            return_type,
            params: split_params(&text[paren + 1..close])
                .iter()
                .filter_map(|p| parse_param(p, Language::Kotlin))
                .collect(),
            access: access_of(&words),
            flags: MethodFlags {
                is_static: owner.kind == ClassKind::Object,
                is_abstract: has("abstract") || (in_interface && !has_body),
                is_virtual: has("open") || has("abstract") || has("override"),
                is_override: has("override"),
                is_final: has("final"),
                ..MethodFlags::default()
            },
            generic_params,
        });
    }
    methods
}

/// Offset past spaces and tabs, stopping at line breaks.
fn skip_inline_ws(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r') {
        i += 1;
    }
    i
}

/// End of a declared return type: a top-level `{`, `=`, line break or
/// `where`.
fn return_type_end(text: &str, from: usize) -> usize {
    find_top_level(&text[from..], |b, i| {
        matches!(b[i], b'{' | b'\n')
            || (b[i] == b'=' && b.get(i + 1) != Some(&b'>'))
            || word_at_bytes(b, i, "where")
    })
    .map_or(text.len(), |p| from + p)
}

fn secondary_constructors(text: &str, owner: &ClassHeader) -> Vec<MethodRecord> {
    let re = CONSTRUCTOR_RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:[\w@]+[ \t]+)*constructor[ \t]*\(").unwrap()
    });
    let mut methods = Vec::new();
    for found in re.find_iter(text) {
        let paren = found.end() - 1;
        let Some(close) = matching_close(text, paren) else {
            continue;
        };
        let keyword = found.as_str().rfind("constructor").map_or(paren, |p| found.start() + p);
        let words = line_modifiers(text, keyword);
        methods.push(MethodRecord {
            name: owner.name.clone(),
            kind: MethodKind::Constructor,
            return_type: None,
            params: split_params(&text[paren + 1..close])
                .iter()
                .filter_map(|p| parse_param(p, Language::Kotlin))
                .collect(),
            access: access_of(&words),
            flags: MethodFlags::default(),
            generic_params: Vec::new(),
        });
    }
    methods
}

fn properties(text: &str, owner: &ClassHeader) -> Vec<VariableRecord> {
    let re = PROPERTY_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?P<mods>(?:@?[\w.]+(?:\([^)\n]*\))?[ \t]+)*?)(?P<kw>val|var)[ \t]+(?P<name>[A-Za-z_]\w*)",
        )
        .unwrap()
    });
    let bytes = text.as_bytes();
    let mut fields = Vec::new();
    for caps in re.captures_iter(text) {
        let (Some(name), Some(kw)) = (caps.name("name"), caps.name("kw")) else {
            continue;
        };
        let (mods, _) = strip_annotations(caps.name("mods").map_or("", |m| m.as_str()));
        let words: Vec<String> = mods.split_whitespace().map(str::to_string).collect();
        let has = |w: &str| words.iter().any(|m| m == w);

        let after = skip_inline_ws(text, name.end());
        let line_end = text[after..].find('\n').map_or(text.len(), |p| after + p);
        let rest = &text[after..line_end];
        let declared_type = if bytes.get(after) == Some(&b':') {
            property_type(&rest[1..])
        } else {
            inferred_type(rest)
        };

        fields.push(VariableRecord {
            name: name.as_str().to_string(),
            target_type: container_target(&declared_type, Language::Kotlin),
            declared_type,
            access: access_of(&words),
            flags: VariableFlags {
                is_static: owner.kind == ClassKind::Object || has("const"),
                is_const: kw.as_str() == "val" || has("const"),
            },
        });
    }
    fields
}

/// Declared property type, cut before an initializer, a delegate or an
/// accessor.
fn property_type(rest: &str) -> String {
    let mut ty = rest;
    if let Some(eq) = top_level_assign(ty) {
        ty = &ty[..eq];
    }
    let stop = [find_word(ty, "by"), find_word(ty, "get"), find_word(ty, "set"), ty.find('{')]
        .into_iter()
        .flatten()
        .min();
    if let Some(stop) = stop {
        ty = &ty[..stop];
    }
    ty.trim().to_string()
}

/// Type of `= Foo(..)` or `= Foo<Bar>()` initializers; empty when the
/// initializer is anything else.
fn inferred_type(rest: &str) -> String {
    let re = INFERRED_RE.get_or_init(|| {
        Regex::new(r"^=\s*((?:[a-z_]\w*\.)*[A-Z]\w*(?:<[^()=]*>)?)\s*\(").unwrap()
    });
    re.captures(rest.trim_start())
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Primary constructor: a constructor record for the whole list and a
/// field for every `val`/`var` parameter.
fn primary_constructor(params: &str, owner: &ClassHeader, members: &mut Members) {
    let mut parsed = Vec::new();
    for item in split_params(params) {
        let Some(param) = parse_param(&item, Language::Kotlin) else {
            continue;
        };
        let (text, _) = strip_annotations(&item);
        let head = top_level_colon(&text).map_or(text.as_str(), |c| &text[..c]);
        let words: Vec<String> = head.split_whitespace().map(str::to_string).collect();
        let is_val = words.iter().any(|w| w == "val");
        if (is_val || words.iter().any(|w| w == "var"))
            && let Some(name) = &param.name
        {
            members.fields.push(VariableRecord {
                name: name.clone(),
                declared_type: param.type_name.clone(),
                target_type: container_target(&param.type_name, Language::Kotlin),
                access: access_of(&words),
                flags: VariableFlags {
                    is_static: false,
                    is_const: is_val,
                },
            });
        }
        parsed.push(param);
    }
    members.methods.push(MethodRecord {
        name: owner.name.clone(),
        kind: MethodKind::Constructor,
        return_type: None,
        params: parsed,
        access: Access::Public,
        flags: MethodFlags::default(),
        generic_params: Vec::new(),
    });
}
