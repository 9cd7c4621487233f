use super::members::{
    Prefix, declarators, generic_names, is_reserved_name, parse_params, segments, split_prefix,
    split_signature,
};
use super::{
    ClassHeader, HeaderScan, LanguageExtractor, Members, Namespaces, ScanScope,
    declaration_start, first_package_declaration,
};
use crate::boundary::find_matching_brace;
use crate::params::split_params;
use crate::scan::{
    declaration_prefix, find_top_level, is_ident_byte, matching_close, open_angle_depth, skip_ws,
    strip_leading_attributes, top_level_arrow_body, top_level_assign, top_level_colon,
    top_level_words,
};
use crate::types::{base_name, container_target};
use classgraph_core::language::Language;
use classgraph_core::model::{
    Access, ClassKind, MethodFlags, MethodKind, MethodRecord, RelationKind, VariableFlags,
    VariableRecord,
};
use regex::Regex;
use std::sync::OnceLock;

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "internal", "static", "virtual", "abstract", "override",
    "sealed", "async", "extern", "unsafe", "new", "partial", "readonly", "const", "volatile",
    "event", "required", "fixed", "implicit", "explicit",
];

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static NAMESPACE_RE: OnceLock<Regex> = OnceLock::new();
static USING_RE: OnceLock<Regex> = OnceLock::new();
static OPERATOR_RE: OnceLock<Regex> = OnceLock::new();

/// C#: block and file-scoped namespaces, class/struct/interface/record
/// headers with base lists, properties, events and expression bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpExtractor;

impl LanguageExtractor for CSharpExtractor {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn namespaces(&self, text: &str) -> Namespaces {
        let re = NAMESPACE_RE.get_or_init(|| Regex::new(r"\bnamespace\s+([\w.]+)\s*\{").unwrap());
        let mut namespaces = Namespaces::default();
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let open = whole.end() - 1;
            let close = find_matching_brace(text, open);
            namespaces.blocks.push((open + 1..close, caps[1].to_string()));
        }
        // file-scoped and block namespaces never mix in one file
        if namespaces.blocks.is_empty() {
            namespaces.file_package = first_package_declaration(text).unwrap_or_default();
        }
        namespaces
    }

    fn imports(&self, text: &str) -> Vec<String> {
        let re = USING_RE.get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*(?:global[ \t]+)?using[ \t]+(?:static[ \t]+)?([\w.]+)[ \t]*;")
                .unwrap()
        });
        re.captures_iter(text).map(|c| c[1].to_string()).collect()
    }

    fn next_header(&self, text: &str, from: usize, scope: &ScanScope) -> Option<HeaderScan> {
        let re = HEADER_RE.get_or_init(|| {
            Regex::new(r"(?:^|[^\w.@])(class|interface|struct|record|enum)\s+(@?[A-Za-z_][\w]*)")
                .unwrap()
        });
        let caps = re.captures_at(text, from)?;
        let keyword = caps.get(1)?;
        let name = caps.get(2)?;
        if keyword.start() >= scope.range.end {
            return None;
        }
        let resume = Some(HeaderScan::Resume(keyword.end()));
        match name.as_str() {
            // `record struct Point`: the next match picks up `struct Point`
            "class" | "struct" => return Some(HeaderScan::Resume(name.start())),
            // `where T : class where U : new()`
            "where" | "new" => return resume,
            _ => {}
        }

        let prefix = declaration_prefix(text, keyword.start());
        if open_angle_depth(&prefix) > 0 {
            return resume;
        }
        let start = declaration_start(text, keyword.start(), scope.range.start);
        let words = top_level_words(&prefix);
        let is_record = keyword.as_str() == "record" || words.last() == Some(&"record");
        let kind = match keyword.as_str() {
            "interface" => ClassKind::Interface,
            "struct" => ClassKind::Struct,
            "enum" => return Some(skip_enum(text, start, name.end())),
            _ => ClassKind::Class,
        };

        let mut cursor = skip_ws(text, name.end());
        let mut generic_params = Vec::new();
        if text.as_bytes().get(cursor) == Some(&b'<') {
            let Some(close) = matching_close(text, cursor) else {
                return resume;
            };
            generic_params = generic_names(&text[cursor + 1..close]);
            cursor = skip_ws(text, close + 1);
        }
        let mut ctor_params = None;
        if text.as_bytes().get(cursor) == Some(&b'(') {
            // positional record or primary constructor
            let Some(close) = matching_close(text, cursor) else {
                return resume;
            };
            if is_record {
                ctor_params = Some(text[cursor + 1..close].to_string());
            }
            cursor = close + 1;
        }
        let Some(stop) = find_top_level(&text[cursor..], |b, i| {
            matches!(b[i], b'{' | b';' | b'=' | b')')
        })
        .map(|p| cursor + p) else {
            return resume;
        };
        let (body, end) = match text.as_bytes()[stop] {
            b'{' => {
                let close = find_matching_brace(text, stop);
                if close >= text.len() {
                    return resume;
                }
                (Some(stop + 1..close), close + 1)
            }
            // `record Point(int X, int Y);`
            b';' if is_record => (None, stop + 1),
            _ => return resume,
        };

        let mut header = ClassHeader::new(kind, name.as_str().trim_start_matches('@'), start, end);
        header.generic_params = generic_params;
        header.ctor_params = ctor_params;
        header.body = body;
        header.bases = base_list(&text[cursor..stop], kind);
        header.access = words
            .iter()
            .find_map(|w| Access::from_keyword(w))
            .unwrap_or(if scope.outer.is_some() {
                Access::Private
            } else {
                Access::Public
            });
        let has = |w: &str| words.contains(&w);
        header.flags.is_abstract = has("abstract");
        header.flags.is_final = has("sealed") || has("static");
        header.flags.is_static = has("static");
        Some(HeaderScan::Class(header))
    }

    fn members(&self, body: &str, owner: &ClassHeader) -> Members {
        let mut members = Members::default();
        let in_interface = owner.kind == ClassKind::Interface;
        if let Some(params) = &owner.ctor_params {
            positional_members(params, owner, &mut members);
        }
        for segment in segments(body, Language::CSharp) {
            let header = strip_leading_attributes(segment.header);
            let first = header.split_whitespace().next().unwrap_or_default();
            if header.is_empty() || first == "using" || has_word(header, "delegate") {
                continue;
            }
            let has_body = segment.block.is_some() || top_level_arrow_body(header).is_some();

            if let Some(method) = operator_method(header, in_interface) {
                members.methods.push(method);
                continue;
            }
            if let Some(sig) = split_signature(header) {
                if is_reserved_name(sig.name) {
                    continue;
                }
                let mut prefix = split_prefix(sig.prefix, MODIFIERS);
                prefix.generic_params.extend(generic_names(sig.generics));
                if let Some(method) = method_record(&prefix, sig.name, sig.params, sig.tilde, has_body, owner) {
                    members.methods.push(method);
                }
                continue;
            }
            members.fields.extend(fields(header, in_interface));
        }
        members
    }
}

/// Kind of one base-list entry: an `I`-prefixed name in a class or struct
/// declaration is an interface realization; everything else, including
/// every base of an interface, is an extension.
pub fn csharp_base_kind(base: &str, declared: ClassKind) -> RelationKind {
    if declared == ClassKind::Interface {
        return RelationKind::Extended;
    }
    let simple = base_name(base);
    let simple = simple.rsplit('.').next().unwrap_or(simple);
    let bytes = simple.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'I' && bytes[1].is_ascii_uppercase() {
        RelationKind::Implemented
    } else {
        RelationKind::Extended
    }
}

/// `: Base(args), IFoo<T> where T : class` between the name and the body.
fn base_list(tail: &str, kind: ClassKind) -> Vec<(String, RelationKind)> {
    let tail = match find_word(tail, "where") {
        Some(pos) => &tail[..pos],
        None => tail,
    };
    let Some(colon) = top_level_colon(tail) else {
        return Vec::new();
    };
    split_params(&tail[colon + 1..])
        .into_iter()
        .map(|base| {
            // record base constructor arguments
            let base = match base.find('(') {
                Some(paren) => base[..paren].trim().to_string(),
                None => base,
            };
            let kind = csharp_base_kind(&base, kind);
            (base, kind)
        })
        .collect()
}

fn skip_enum(text: &str, start: usize, after_name: usize) -> HeaderScan {
    let Some(open) = text[after_name..].find(['{', ';']).map(|p| after_name + p) else {
        return HeaderScan::Resume(after_name);
    };
    if text.as_bytes()[open] == b';' {
        return HeaderScan::Resume(open + 1);
    }
    let close = find_matching_brace(text, open);
    if close >= text.len() {
        return HeaderScan::Resume(after_name);
    }
    HeaderScan::Opaque(start..close + 1)
}

/// Offset of `word` as a whole word outside any brackets.
fn find_word(text: &str, word: &str) -> Option<usize> {
    find_top_level(text, |b, i| {
        b[i..].starts_with(word.as_bytes())
            && (i == 0 || !is_ident_byte(b[i - 1]))
            && b.get(i + word.len()).is_none_or(|c| !is_ident_byte(*c))
    })
}

fn has_word(text: &str, word: &str) -> bool {
    find_word(text, word).is_some()
}

fn member_access(prefix: &Prefix, in_interface: bool) -> Access {
    prefix
        .modifiers
        .iter()
        .find_map(|m| Access::from_keyword(m))
        .unwrap_or(if in_interface {
            Access::Public
        } else {
            Access::Private
        })
}

fn method_record(
    prefix: &Prefix,
    name: &str,
    params: &str,
    tilde: bool,
    has_body: bool,
    owner: &ClassHeader,
) -> Option<MethodRecord> {
    let in_interface = owner.kind == ClassKind::Interface;
    let (kind, name, return_type) = if tilde {
        (MethodKind::Destructor, format!("~{name}"), None)
    } else if prefix.type_name.is_empty() {
        if name != owner.name {
            return None;
        }
        (MethodKind::Constructor, name.to_string(), None)
    } else {
        (MethodKind::Method, name.to_string(), Some(prefix.type_name.clone()))
    };
    let is_static = prefix.has("static");
    let is_abstract = prefix.has("abstract") || (in_interface && !has_body && !is_static);
    Some(MethodRecord {
        name,
        kind,
        return_type,
        params: parse_params(params, Language::CSharp),
        access: member_access(prefix, in_interface),
        flags: MethodFlags {
            is_static,
            is_abstract,
            is_virtual: is_abstract || prefix.has("virtual") || prefix.has("override"),
            is_override: prefix.has("override"),
            is_final: prefix.has("sealed"),
            ..MethodFlags::default()
        },
        generic_params: prefix.generic_params.clone(),
    })
}

/// `public static Money operator +(Money a, Money b)` and conversion
/// operators (`implicit operator int(Money m)`).
fn operator_method(header: &str, in_interface: bool) -> Option<MethodRecord> {
    let re = OPERATOR_RE.get_or_init(|| Regex::new(r"\boperator\b\s*([^\s(]+)\s*\(").unwrap());
    let caps = re.captures(header)?;
    let whole = caps.get(0)?;
    let paren = whole.end() - 1;
    let close = matching_close(header, paren)?;
    let op = &caps[1];
    let prefix = split_prefix(&header[..whole.start()], MODIFIERS);
    let conversion = prefix.has("implicit") || prefix.has("explicit");
    let return_type = if conversion {
        op.to_string()
    } else {
        prefix.type_name.clone()
    };
    let name = if conversion {
        format!("operator {op}")
    } else {
        format!("operator{op}")
    };
    Some(MethodRecord {
        name,
        kind: MethodKind::Method,
        return_type: Some(return_type),
        params: parse_params(&header[paren + 1..close], Language::CSharp),
        access: member_access(&prefix, in_interface),
        flags: MethodFlags {
            is_static: true,
            ..MethodFlags::default()
        },
        generic_params: Vec::new(),
    })
}

/// Fields, properties and events of one declaration.
fn fields(header: &str, in_interface: bool) -> Vec<VariableRecord> {
    let mut decl = header;
    if let Some(arrow) = top_level_arrow_body(decl) {
        decl = &decl[..arrow];
    }
    if let Some(eq) = top_level_assign(decl) {
        decl = &decl[..eq];
    }
    let prefix = split_prefix(decl, MODIFIERS);
    let access = member_access(&prefix, in_interface);
    let flags = VariableFlags {
        is_static: prefix.has("static") || prefix.has("const"),
        is_const: prefix.has("const") || prefix.has("readonly"),
    };
    declarators(&prefix.type_name, Language::CSharp)
        .into_iter()
        // indexers: `int this[int i]`
        .filter(|d| !is_reserved_name(&d.name))
        .map(|d| VariableRecord {
            target_type: container_target(&d.type_name, Language::CSharp),
            name: d.name,
            declared_type: d.type_name,
            access,
            flags,
        })
        .collect()
}

/// Positional record parameters become public properties and a
/// constructor.
fn positional_members(params: &str, owner: &ClassHeader, members: &mut Members) {
    let params = parse_params(params, Language::CSharp);
    for param in &params {
        if let Some(name) = &param.name {
            members.fields.push(VariableRecord {
                name: name.clone(),
                declared_type: param.type_name.clone(),
                target_type: container_target(&param.type_name, Language::CSharp),
                access: Access::Public,
                flags: VariableFlags::default(),
            });
        }
    }
    members.methods.push(MethodRecord {
        name: owner.name.clone(),
        kind: MethodKind::Constructor,
        return_type: None,
        params,
        access: Access::Public,
        flags: MethodFlags::default(),
        generic_params: Vec::new(),
    });
}
