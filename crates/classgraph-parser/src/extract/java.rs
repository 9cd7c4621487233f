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
    declaration_prefix, find_top_level, is_ident_byte, matching_close, skip_ws,
    strip_annotations, top_level_assign, top_level_words,
};
use crate::types::container_target;
use classgraph_core::language::Language;
use classgraph_core::model::{
    Access, ClassKind, MethodFlags, MethodKind, MethodRecord, RelationKind, VariableFlags,
    VariableRecord,
};
use regex::Regex;
use std::sync::OnceLock;

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "final", "abstract", "synchronized", "native",
    "transient", "volatile", "strictfp", "default", "sealed", "non-sealed",
];

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static IMPORT_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\w$.@])(@interface|class|interface|enum|record)\s+([A-Za-z_$][\w$]*)")
            .unwrap()
    })
}

/// Java: `package`, `import`, class and interface headers with
/// `extends`/`implements`; enums, records and annotation types are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn namespaces(&self, text: &str) -> Namespaces {
        Namespaces::file(first_package_declaration(text).unwrap_or_default())
    }

    fn imports(&self, text: &str) -> Vec<String> {
        let re = IMPORT_RE.get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?([\w.]+(?:\.\*)?)[ \t]*;").unwrap()
        });
        re.captures_iter(text).map(|c| c[1].to_string()).collect()
    }

    fn next_header(&self, text: &str, from: usize, scope: &ScanScope) -> Option<HeaderScan> {
        let caps = header_re().captures_at(text, from)?;
        let keyword = caps.get(1)?;
        let name = caps.get(2)?;
        if keyword.start() >= scope.range.end {
            return None;
        }
        let start = declaration_start(text, keyword.start(), scope.range.start);

        let kind = match keyword.as_str() {
            "class" => ClassKind::Class,
            "interface" => ClassKind::Interface,
            _ => {
                // enum, record, @interface: skip the whole declaration
                let Some(open) = text[name.end()..].find('{').map(|p| name.end() + p) else {
                    return Some(HeaderScan::Resume(name.end()));
                };
                let close = find_matching_brace(text, open);
                if close >= text.len() {
                    return Some(HeaderScan::Resume(name.end()));
                }
                return Some(HeaderScan::Opaque(start..close + 1));
            }
        };

        let mut cursor = skip_ws(text, name.end());
        let mut generic_params = Vec::new();
        if text.as_bytes().get(cursor) == Some(&b'<') {
            let Some(close) = matching_close(text, cursor) else {
                return Some(HeaderScan::Resume(name.end()));
            };
            generic_params = generic_names(&text[cursor + 1..close]);
            cursor = close + 1;
        }
        let Some(open) = text[cursor..].find(['{', ';', '(', ')', '=']).map(|p| cursor + p) else {
            return Some(HeaderScan::Resume(name.end()));
        };
        if text.as_bytes()[open] != b'{' {
            return Some(HeaderScan::Resume(name.end()));
        }
        let close = find_matching_brace(text, open);
        if close >= text.len() {
            return Some(HeaderScan::Resume(name.end()));
        }

        let mut header = ClassHeader::new(kind, name.as_str(), start, close + 1);
        header.generic_params = generic_params;
        header.bases = inheritance(&text[cursor..open]);
        header.body = Some(open + 1..close);

        let (prefix, _) = strip_annotations(&declaration_prefix(text, keyword.start()));
        let words = top_level_words(&prefix);
        let has = |w: &str| words.contains(&w);
        header.access = access_of(&words, scope.outer);
        header.flags.is_abstract = has("abstract");
        header.flags.is_final = has("final");
        header.flags.is_static = has("static") || (scope.outer.is_some() && kind == ClassKind::Interface);
        Some(HeaderScan::Class(header))
    }

    fn members(&self, body: &str, owner: &ClassHeader) -> Members {
        let mut members = Members::default();
        let in_interface = owner.kind == ClassKind::Interface;
        for segment in segments(body, Language::Java) {
            let (header, annotations) = strip_annotations(segment.header);
            let header = header.trim();
            if let Some(sig) = split_signature(header) {
                if is_reserved_name(sig.name) {
                    continue;
                }
                let prefix = split_prefix(sig.prefix, MODIFIERS);
                let is_override = annotations.iter().any(|a| a == "Override");
                if let Some(method) =
                    method_record(&prefix, sig.name, sig.params, segment.block.is_some(), is_override, owner)
                {
                    members.methods.push(method);
                }
                continue;
            }
            if segment.block.is_some() && top_level_assign(header).is_none() {
                // initializer blocks
                continue;
            }
            let decl = match top_level_assign(header) {
                Some(eq) => &header[..eq],
                None => header,
            };
            let prefix = split_prefix(decl, MODIFIERS);
            let access = member_access(&prefix, in_interface);
            let flags = VariableFlags {
                is_static: prefix.has("static") || in_interface,
                is_const: prefix.has("final") || in_interface,
            };
            for d in declarators(&prefix.type_name, Language::Java) {
                members.fields.push(VariableRecord {
                    target_type: container_target(&d.type_name, Language::Java),
                    name: d.name,
                    declared_type: d.type_name,
                    access,
                    flags,
                });
            }
        }
        members
    }
}

fn method_record(
    prefix: &Prefix,
    name: &str,
    params: &str,
    has_body: bool,
    is_override: bool,
    owner: &ClassHeader,
) -> Option<MethodRecord> {
    let in_interface = owner.kind == ClassKind::Interface;
    let (kind, return_type) = if prefix.type_name.is_empty() {
        if name != owner.name {
            return None;
        }
        (MethodKind::Constructor, None)
    } else {
        (MethodKind::Method, Some(prefix.type_name.clone()))
    };
    let is_static = prefix.has("static");
    let is_abstract = prefix.has("abstract")
        || (in_interface && !has_body && !is_static && !prefix.has("default") && !prefix.has("private"));
    Some(MethodRecord {
        name: name.to_string(),
        kind,
        return_type,
        params: parse_params(params, Language::Java),
        access: member_access(prefix, in_interface),
        flags: MethodFlags {
            is_static,
            is_abstract,
            is_override,
            is_final: prefix.has("final"),
            ..MethodFlags::default()
        },
        generic_params: prefix.generic_params.clone(),
    })
}

/// Package-private maps to protected; interface members are public.
fn member_access(prefix: &Prefix, in_interface: bool) -> Access {
    prefix
        .modifiers
        .iter()
        .find_map(|m| Access::from_keyword(m))
        .unwrap_or(if in_interface {
            Access::Public
        } else {
            Access::Protected
        })
}

fn access_of(words: &[&str], outer: Option<ClassKind>) -> Access {
    words
        .iter()
        .find_map(|w| Access::from_keyword(w))
        .unwrap_or(match outer {
            Some(ClassKind::Interface) => Access::Public,
            _ => Access::Protected,
        })
}

/// Offset of `keyword` as a whole word outside any brackets.
fn keyword_at(clause: &str, keyword: &str) -> Option<usize> {
    find_top_level(clause, |b, i| {
        b[i..].starts_with(keyword.as_bytes())
            && (i == 0 || !is_ident_byte(b[i - 1]))
            && b.get(i + keyword.len()).is_none_or(|c| !is_ident_byte(*c))
    })
}

/// `extends A<B> implements C, D` between the name and the body.
fn inheritance(clause: &str) -> Vec<(String, RelationKind)> {
    let extends = keyword_at(clause, "extends");
    let implements = keyword_at(clause, "implements");
    let permits = keyword_at(clause, "permits");
    let list_after = |at: usize, keyword: &str| {
        let end = [extends, implements, permits]
            .into_iter()
            .flatten()
            .filter(|&p| p > at)
            .min()
            .unwrap_or(clause.len());
        split_params(&clause[at + keyword.len()..end])
    };

    let mut bases = Vec::new();
    if let Some(at) = extends {
        bases.extend(
            list_after(at, "extends")
                .into_iter()
                .map(|b| (b, RelationKind::Extended)),
        );
    }
    if let Some(at) = implements {
        bases.extend(
            list_after(at, "implements")
                .into_iter()
                .map(|b| (b, RelationKind::Implemented)),
        );
    }
    bases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inheritance_ignores_wildcards() {
        let bases = inheritance(" implements Comparator<? extends Shape> ");
        assert_eq!(
            bases,
            vec![("Comparator<? extends Shape>".to_string(), RelationKind::Implemented)]
        );
    }

    #[test]
    fn test_inheritance_clause() {
        let bases =
            inheritance(" extends Base<Map<K, V>> implements Runnable, Comparable<Foo> ");
        assert_eq!(
            bases,
            vec![
                ("Base<Map<K, V>>".to_string(), RelationKind::Extended),
                ("Runnable".to_string(), RelationKind::Implemented),
                ("Comparable<Foo>".to_string(), RelationKind::Implemented),
            ]
        );
        let bases = inheritance(" extends A, B permits C");
        assert_eq!(bases.len(), 2);
        assert!(bases.iter().all(|(_, k)| *k == RelationKind::Extended));
    }
}
