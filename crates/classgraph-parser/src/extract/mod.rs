//! Class, method and field extraction.
//!
//! Each language implements [`LanguageExtractor`]. [`extract_file`] drives a
//! single left-to-right scan over a comment-stripped file whose literals are
//! blanked out: every class header found is turned into a [`ClassRecord`],
//! its body is scanned again for nested types, and the body with those nested
//! types blanked out is handed back to the extractor for members. All
//! records, nested ones included, land in one flat [`ClassArena`].

mod cpp;
mod csharp;
mod java;
mod kotlin;
pub mod members;

pub use cpp::CppExtractor;
pub use csharp::{CSharpExtractor, csharp_base_kind};
pub use java::JavaExtractor;
pub use kotlin::{KotlinExtractor, kotlin_supertype_kind};

use crate::scan::{LineIndex, mask_literals, mask_spans, skip_ws};
use crate::types::{TypeFilter, normalize};
use classgraph_core::language::Language;
use classgraph_core::model::{
    Access, ClassArena, ClassFlags, ClassId, ClassKind, ClassRecord, MethodRecord, RelationKind,
    VariableRecord,
};
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// A class-like declaration recognized by an extractor.
#[derive(Debug, Clone)]
pub struct ClassHeader {
    pub kind: ClassKind,
    pub name: String,
    pub generic_params: Vec<String>,
    /// Base types as written, with the relation each one stands for.
    pub bases: Vec<(String, RelationKind)>,
    pub flags: ClassFlags,
    pub access: Access,
    /// Text between the braces; `None` for body-less declarations.
    pub body: Option<Range<usize>>,
    /// Start of the declaration, modifiers and annotations included.
    pub start: usize,
    /// Just past the declaration.
    pub end: usize,
    /// Primary constructor parameter list (Kotlin classes, C# records).
    pub ctor_params: Option<String>,
}

impl ClassHeader {
    pub fn new(kind: ClassKind, name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            generic_params: Vec::new(),
            bases: Vec::new(),
            flags: ClassFlags {
                is_interface: kind == ClassKind::Interface,
                ..ClassFlags::default()
            },
            access: Access::Public,
            body: None,
            start,
            end,
            ctor_params: None,
        }
    }
}

/// Outcome of looking for the next class header.
#[derive(Debug, Clone)]
pub enum HeaderScan {
    Class(ClassHeader),
    /// A declaration that is not extracted (enums, records, annotation
    /// types); its span is skipped and kept out of member extraction.
    Opaque(Range<usize>),
    /// A keyword match that turned out not to be a class; continue here.
    Resume(usize),
}

/// Where a header search runs: the scanned range and the kind of the
/// enclosing class, if any.
#[derive(Debug, Clone)]
pub struct ScanScope {
    pub range: Range<usize>,
    pub outer: Option<ClassKind>,
}

/// Package and namespace scopes of one file.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    /// `package` or file-scoped `namespace` declaration.
    pub file_package: String,
    /// Block namespaces: body range and name, in source order.
    pub blocks: Vec<(Range<usize>, String)>,
}

impl Namespaces {
    pub fn file(package: impl Into<String>) -> Self {
        Self {
            file_package: package.into(),
            blocks: Vec::new(),
        }
    }

    /// Package in effect at `offset`: the file package followed by every
    /// named namespace block enclosing it, outermost first.
    pub fn package_at(&self, offset: usize) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.file_package.is_empty() {
            parts.push(&self.file_package);
        }
        parts.extend(
            self.blocks
                .iter()
                .filter(|(range, name)| range.contains(&offset) && !name.is_empty())
                .map(|(_, name)| name.as_str()),
        );
        parts.join("::")
    }
}

/// Methods and fields of one class body.
#[derive(Debug, Clone, Default)]
pub struct Members {
    pub methods: Vec<MethodRecord>,
    pub fields: Vec<VariableRecord>,
}

/// Per-language grammar for headers and members.
pub trait LanguageExtractor: Sync {
    fn language(&self) -> Language;

    /// Package and namespace scopes of a file.
    fn namespaces(&self, text: &str) -> Namespaces;

    /// Imports as written after the import keyword.
    fn imports(&self, text: &str) -> Vec<String>;

    /// Next class-like declaration at or after `from`, within `scope.range`.
    fn next_header(&self, text: &str, from: usize, scope: &ScanScope) -> Option<HeaderScan>;

    /// Methods and fields of `body`, in which nested types are blanked out.
    fn members(&self, body: &str, owner: &ClassHeader) -> Members;

    /// Extract every class of an already comment-stripped text.
    fn extract(&self, text: &str, filter: &TypeFilter) -> ClassArena
    where
        Self: Sized,
    {
        extract_with(self, Path::new(""), text, filter)
    }
}

/// The extractor for a language.
pub fn extractor_for(language: Language) -> &'static dyn LanguageExtractor {
    match language {
        Language::Java => &JavaExtractor,
        Language::Cpp => &CppExtractor,
        Language::CSharp => &CSharpExtractor,
        Language::Kotlin => &KotlinExtractor,
    }
}

/// Extract every class of a comment-stripped file.
pub fn extract_file(path: &Path, text: &str, language: Language, filter: &TypeFilter) -> ClassArena {
    extract_with(extractor_for(language), path, text, filter)
}

fn extract_with(
    extractor: &dyn LanguageExtractor,
    path: &Path,
    text: &str,
    filter: &TypeFilter,
) -> ClassArena {
    let masked = mask_literals(text);
    let text = masked.as_str();
    let mut ctx = FileContext {
        path,
        text,
        language: extractor.language(),
        extractor,
        filter,
        namespaces: extractor.namespaces(text),
        imports: extractor.imports(text),
        lines: LineIndex::new(text),
        arena: ClassArena::new(),
    };
    let top = Scope {
        range: 0..text.len(),
        package: None,
        parent: None,
        outer: None,
    };
    ctx.scan(&top);
    debug!("{}: {} classes", path.display(), ctx.arena.len());
    ctx.arena
}

static PACKAGE_RE: OnceLock<Regex> = OnceLock::new();

/// The first `package` (Java, Kotlin) or file-scoped `namespace` (C#)
/// declaration of a file. Later declarations are ignored.
pub fn first_package_declaration(text: &str) -> Option<String> {
    let re = PACKAGE_RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:package|namespace)[ \t]+([\w.]+)[ \t\r]*(;|$)").unwrap()
    });
    re.captures(text).map(|caps| caps[1].to_string())
}

/// Start of the declaration whose keyword sits at `kw`: just past the
/// previous `;`, `{` or `}` (never before `floor`), with whitespace and
/// preprocessor lines skipped.
pub(crate) fn declaration_start(text: &str, kw: usize, floor: usize) -> usize {
    let floor = floor.min(kw);
    let head = &text[floor..kw];
    let mut start = head.rfind([';', '{', '}']).map_or(floor, |p| floor + p + 1);
    loop {
        start = skip_ws(text, start).min(kw);
        if start < kw && text.as_bytes()[start] == b'#' {
            start = text[start..kw].find('\n').map_or(kw, |nl| start + nl + 1);
        } else {
            return start;
        }
    }
}

/// C# and Kotlin namespaces are stored with `::` like their qualified names.
fn scoped_package(package: String, language: Language) -> String {
    match language {
        Language::Java => package,
        _ => package.replace('.', "::"),
    }
}

struct Scope {
    range: Range<usize>,
    /// Fixed package for nested scopes; top-level scopes look it up.
    package: Option<String>,
    parent: Option<ClassId>,
    outer: Option<ClassKind>,
}

struct FileContext<'a> {
    path: &'a Path,
    text: &'a str,
    language: Language,
    extractor: &'a dyn LanguageExtractor,
    filter: &'a TypeFilter,
    namespaces: Namespaces,
    imports: Vec<String>,
    lines: LineIndex,
    arena: ClassArena,
}

impl FileContext<'_> {
    /// Find every class in `scope`, returning the spans they occupy.
    fn scan(&mut self, scope: &Scope) -> Vec<Range<usize>> {
        let scan_scope = ScanScope {
            range: scope.range.clone(),
            outer: scope.outer,
        };
        let mut consumed = Vec::new();
        let mut pos = scope.range.start;
        while pos < scope.range.end {
            let Some(found) = self.extractor.next_header(self.text, pos, &scan_scope) else {
                break;
            };
            match found {
                HeaderScan::Resume(next) => pos = next.max(pos + 1),
                HeaderScan::Opaque(span) => {
                    pos = span.end.max(pos + 1);
                    consumed.push(span);
                }
                HeaderScan::Class(header) => {
                    pos = header.end.max(pos + 1);
                    consumed.push(header.start..header.end);
                    self.add_class(header, scope);
                }
            }
        }
        consumed
    }

    fn add_class(&mut self, header: ClassHeader, scope: &Scope) {
        let package = match &scope.package {
            Some(package) => package.clone(),
            None => scoped_package(self.namespaces.package_at(header.start), self.language),
        };
        let mut record = ClassRecord::new(&header.name, package, self.language);
        record.kind = header.kind;
        record.generic_params.clone_from(&header.generic_params);
        record.flags = header.flags;
        record.access = header.access;
        record.parent = scope.parent;
        record.imports.clone_from(&self.imports);
        record.file = self.path.to_path_buf();
        record.line_start = self.lines.line_of(header.start);
        record.line_end = self
            .lines
            .line_of(header.end.saturating_sub(1).max(header.start));
        for (base, kind) in &header.bases {
            let target = normalize(base, self.language);
            if !target.is_empty() && target != header.name {
                record.add_relation(target, *kind);
            }
        }
        let qualified = record.qualified_name();
        let id = self.arena.push(record);
        if let Some(parent) = scope.parent
            && let Some(outer) = self.arena.get_mut(parent)
        {
            outer.nested.push(id);
        }

        let members = match &header.body {
            Some(body) => {
                let inner = Scope {
                    range: body.clone(),
                    package: Some(qualified),
                    parent: Some(id),
                    outer: Some(header.kind),
                };
                let nested = self.scan(&inner);
                let local: Vec<Range<usize>> = nested
                    .iter()
                    .map(|r| r.start.saturating_sub(body.start)..r.end.saturating_sub(body.start))
                    .collect();
                let masked = mask_spans(&self.text[body.clone()], &local);
                self.extractor.members(&masked, &header)
            }
            None => self.extractor.members("", &header),
        };

        let (filter, language) = (self.filter, self.language);
        if let Some(record) = self.arena.get_mut(id) {
            apply_members(record, members, filter, language);
        }
    }
}

/// Attach members and derive `Depended` relations from their types.
fn apply_members(record: &mut ClassRecord, members: Members, filter: &TypeFilter, language: Language) {
    let Members { methods, fields } = members;
    if language == Language::Cpp && methods.iter().any(|m| m.flags.is_abstract) {
        record.flags.is_abstract = true;
    }

    let mut targets = Vec::new();
    for method in &methods {
        let types = method
            .return_type
            .iter()
            .map(String::as_str)
            .chain(method.param_types());
        for raw in types {
            if let Some(target) = filter.dependency_target(raw, language)
                && !names_generic(&target, &record.generic_params, &method.generic_params)
            {
                targets.push(target);
            }
        }
    }
    for field in &fields {
        if let Some(target) = filter.dependency_target(&field.declared_type, language)
            && !names_generic(&target, &record.generic_params, &[])
        {
            targets.push(target);
        }
    }
    for target in targets {
        record.add_dependency(target);
    }
    record.methods = methods;
    record.fields = fields;
}

/// Whether a type key refers to a class or method generic parameter
/// (`T`, `TKey`, `T::value_type`).
fn names_generic(target: &str, class_params: &[String], method_params: &[String]) -> bool {
    let head = target
        .split("::")
        .next()
        .and_then(|s| s.split('.').next())
        .unwrap_or(target);
    class_params.iter().chain(method_params).any(|p| p == head)
}
