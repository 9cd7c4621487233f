//! Type normalization and the primitive filter.
//!
//! [`normalize`] reduces a type as written to an identity key; [`TypeFilter`]
//! decides whether that key is worth a dependency edge. The filter is built
//! once per run and passed by reference to every extractor and to the
//! resolver.

use crate::params::split_params;
use crate::scan::{matching_close, strip_annotations};
use anyhow::{Context, Result};
use classgraph_core::language::Language;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Ignored in every language.
const BASE_IGNORED: &[&str] = &[
    "void", "bool", "boolean", "char", "byte", "short", "int", "long", "float", "double",
    "auto", "var", "string",
];

const CPP_IGNORED: &[&str] = &[
    "wchar_t", "char8_t", "char16_t", "char32_t", "signed", "unsigned", "size_t", "ssize_t",
    "ptrdiff_t", "nullptr_t", "intptr_t", "uintptr_t", "int8_t", "int16_t", "int32_t",
    "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "wstring", "string_view",
    "u16string", "u32string", "vector", "list", "forward_list", "deque", "array", "map",
    "unordered_map", "multimap", "unordered_multimap", "set", "unordered_set", "multiset",
    "stack", "queue", "priority_queue", "pair", "tuple", "optional", "variant", "any",
    "function", "unique_ptr", "shared_ptr", "weak_ptr", "ostream", "istream", "iostream",
    "ostringstream", "istringstream", "stringstream", "ifstream", "ofstream", "fstream",
    "thread", "mutex", "recursive_mutex", "lock_guard", "unique_lock", "condition_variable",
    "atomic", "future", "promise", "initializer_list", "bitset", "span", "exception",
];

const JAVA_IGNORED: &[&str] = &[
    "Byte", "Short", "Integer", "Long", "Float", "Double", "Boolean", "Character", "Void",
    "String", "Object", "Number", "CharSequence", "StringBuilder", "List", "ArrayList",
    "LinkedList", "Map", "HashMap", "TreeMap", "LinkedHashMap", "ConcurrentHashMap",
    "SortedMap", "Set", "HashSet", "TreeSet", "LinkedHashSet", "SortedSet", "Collection",
    "Iterable", "Iterator", "Queue", "Deque", "ArrayDeque", "Stack", "Vector", "Optional",
    "Stream", "Function", "BiFunction", "Supplier", "Consumer", "BiConsumer", "Predicate",
    "Runnable", "Callable", "Future", "CompletableFuture", "Class", "Comparable",
    "Comparator",
];

const CSHARP_IGNORED: &[&str] = &[
    "sbyte", "ushort", "uint", "ulong", "nint", "nuint", "decimal", "object", "dynamic",
    "String", "Object", "Int16", "Int32", "Int64", "UInt32", "UInt64", "Boolean", "Byte",
    "Char", "Single", "Double", "Decimal", "DateTime", "DateTimeOffset", "TimeSpan", "Guid",
    "List", "IList", "ICollection", "IEnumerable", "IEnumerator", "IReadOnlyList",
    "IReadOnlyCollection", "Dictionary", "IDictionary", "IReadOnlyDictionary",
    "SortedDictionary", "SortedList", "HashSet", "ISet", "SortedSet", "Queue", "Stack",
    "LinkedList", "Task", "ValueTask", "Func", "Action", "Predicate", "Nullable", "Lazy",
    "Tuple", "ValueTuple", "Span", "ReadOnlySpan", "Memory", "StringBuilder",
];

const KOTLIN_IGNORED: &[&str] = &[
    "Int", "Long", "Short", "Byte", "Float", "Double", "Boolean", "Char", "String", "Unit",
    "Any", "Nothing", "Number", "Array", "IntArray", "LongArray", "ByteArray", "DoubleArray",
    "FloatArray", "BooleanArray", "CharArray", "List", "MutableList", "ArrayList", "Map",
    "MutableMap", "HashMap", "LinkedHashMap", "Set", "MutableSet", "HashSet",
    "LinkedHashSet", "Collection", "MutableCollection", "Iterable", "Sequence", "Pair",
    "Triple", "Lazy", "Result", "Comparable", "Flow", "StateFlow", "MutableStateFlow",
    "SharedFlow", "MutableSharedFlow", "Deferred", "Job",
];

/// Containers whose first template argument is the contained type.
const SINGLE_ARG_CONTAINERS: &[&str] = &[
    // C++
    "vector", "list", "forward_list", "deque", "array", "set", "unordered_set", "multiset",
    "stack", "queue", "priority_queue", "optional", "unique_ptr", "shared_ptr", "weak_ptr",
    "span", "initializer_list", "atomic", "future", "promise",
    // Java
    "List", "ArrayList", "LinkedList", "Set", "HashSet", "TreeSet", "LinkedHashSet",
    "SortedSet", "Collection", "Iterable", "Iterator", "Queue", "Deque", "ArrayDeque",
    "Stack", "Vector", "Optional", "Stream", "Supplier", "Consumer", "Predicate", "Future",
    "CompletableFuture", "Callable",
    // C#
    "IList", "ICollection", "IEnumerable", "IEnumerator", "IReadOnlyList",
    "IReadOnlyCollection", "ISet", "Task", "ValueTask", "Nullable", "Lazy", "Span",
    "ReadOnlySpan", "Memory",
    // Kotlin
    "MutableList", "MutableSet", "MutableCollection", "Array", "Sequence", "Flow",
    "StateFlow", "MutableStateFlow", "SharedFlow", "MutableSharedFlow", "Deferred", "Result",
];

/// Map-like containers: the second template argument is the contained type.
const MAP_CONTAINERS: &[&str] = &[
    "map", "unordered_map", "multimap", "unordered_multimap", "Map", "HashMap", "TreeMap",
    "LinkedHashMap", "ConcurrentHashMap", "SortedMap", "MutableMap", "Dictionary",
    "IDictionary", "IReadOnlyDictionary", "SortedDictionary", "SortedList",
];

/// Standard-library scope prefixes dropped from identity keys, longest first.
const STD_PREFIXES: &[&str] = &[
    "std::",
    "java.util.function.",
    "java.util.concurrent.",
    "java.util.",
    "java.lang.",
    "java.io.",
    "System.Collections.Generic.",
    "System.Collections.",
    "System.Threading.Tasks.",
    "System.",
    "kotlin.collections.",
    "kotlin.",
];

fn modifiers(language: Language) -> &'static [&'static str] {
    match language {
        Language::Cpp => &[
            "const", "static", "volatile", "mutable", "register", "inline", "extern",
            "typename", "constexpr", "consteval", "constinit", "thread_local", "struct",
            "class", "enum", "union", "virtual", "explicit", "friend", "using",
        ],
        Language::Java => &[
            "final", "static", "transient", "volatile", "synchronized", "abstract", "native",
            "strictfp", "public", "private", "protected", "extends", "super",
        ],
        Language::CSharp => &[
            "const", "readonly", "static", "volatile", "ref", "out", "in", "params",
            "unsafe", "new", "public", "private", "protected", "internal", "sealed",
            "override", "virtual", "abstract", "extern", "async", "required", "scoped", "this",
        ],
        Language::Kotlin => &[
            "val", "var", "vararg", "out", "in", "suspend", "lateinit", "const", "override",
            "open", "private", "protected", "public", "internal", "noinline", "crossinline",
        ],
    }
}

/// Strip a known standard-library prefix (and a leading `::`).
pub fn strip_std_prefix(name: &str) -> &str {
    let name = name.trim().trim_start_matches("::");
    STD_PREFIXES
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .unwrap_or(name)
}

/// Type name without its template arguments: `std::vector<int>` → `std::vector`.
pub fn base_name(raw: &str) -> &str {
    raw.find('<').map_or(raw, |open| &raw[..open]).trim()
}

/// Top-level template arguments of the first `<...>` group.
pub fn template_args(raw: &str) -> Vec<String> {
    let Some(open) = raw.find('<') else {
        return Vec::new();
    };
    match matching_close(raw, open) {
        Some(close) => split_params(&raw[open + 1..close]),
        None => Vec::new(),
    }
}

/// Remove every balanced `<...>` group. An unbalanced `<` cuts the rest.
fn remove_generics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match matching_close(rest, open) {
            Some(close) => rest = &rest[close + 1..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Kotlin and C# lambda types: `(Int) -> Unit`, `suspend () -> T`.
fn is_function_type(text: &str) -> bool {
    text.starts_with('(') || text.contains("->")
}

/// Canonical identity key of a type as written.
///
/// Annotations, modifiers, pointer/reference/array/nullable marks and
/// template arguments are removed, and a standard-library prefix is dropped:
/// `const std::vector<Foo>&` → `vector`, `java.util.List<String>` → `List`.
/// Function types normalize to the empty key.
pub fn normalize(raw: &str, language: Language) -> String {
    let (text, _) = strip_annotations(raw);
    let mut text = text.trim();
    // wildcards and variance: `? extends Foo`, `out T`, Kotlin star projection
    if let Some(rest) = text.strip_prefix('?') {
        text = rest.trim_start();
    }
    if text == "*" || is_function_type(text) {
        return String::new();
    }

    let without_generics = remove_generics(text);
    let mut cleaned = String::with_capacity(without_generics.len());
    let mut bracket = 0usize;
    for c in without_generics.chars() {
        match c {
            '[' => bracket += 1,
            ']' => bracket = bracket.saturating_sub(1),
            '*' | '&' | '^' | '?' if bracket == 0 => cleaned.push(' '),
            _ if bracket > 0 => {}
            _ => cleaned.push(c),
        }
    }
    let cleaned = cleaned.replace("...", " ");

    let mods = modifiers(language);
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !mods.contains(w))
        .collect();
    strip_std_prefix(&words.join(" ")).to_string()
}

/// Innermost contained type of a container, pointer, array or nullable
/// declaration, normalized; empty when `raw` is none of those.
///
/// `std::vector<std::shared_ptr<Widget>>` → `Widget`,
/// `Map<String, Order>` → `Order`, `Foo*` → `Foo`.
pub fn container_target(raw: &str, language: Language) -> String {
    let mods = modifiers(language);
    let mut current = strip_annotations(raw).0.trim().to_string();
    let mut unwrapped = false;
    loop {
        let words: Vec<&str> = current
            .split_whitespace()
            .filter(|w| !mods.contains(w))
            .collect();
        let joined = words.join(" ");
        let trimmed = joined.trim_end_matches(['*', '&', '^', '?', ' ']);
        let trimmed = strip_array_suffix(trimmed);
        if trimmed.len() != joined.len() {
            unwrapped = true;
        }
        let trimmed = trimmed.to_string();

        let base = strip_std_prefix(base_name(&trimmed));
        let args = template_args(&trimmed);
        let next = if MAP_CONTAINERS.contains(&base) {
            args.get(1).or(args.first())
        } else if SINGLE_ARG_CONTAINERS.contains(&base) {
            args.first()
        } else {
            None
        };
        match next {
            Some(inner) => {
                current = inner.clone();
                unwrapped = true;
            }
            None => {
                current = trimmed;
                break;
            }
        }
    }
    if unwrapped {
        normalize(&current, language)
    } else {
        String::new()
    }
}

fn strip_array_suffix(mut text: &str) -> &str {
    loop {
        let t = text.trim_end();
        if let Some(rest) = t.strip_suffix("...") {
            text = rest;
        } else if t.ends_with(']')
            && let Some(open) = t.rfind('[')
        {
            text = &t[..open];
        } else {
            return t;
        }
    }
}

/// The primitive filter: built-in ignore sets per language plus any names
/// loaded from ignore-list files.
#[derive(Debug, Clone)]
pub struct TypeFilter {
    ignored: HashMap<Language, HashSet<String>>,
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeFilter {
    /// Built-in sets only.
    pub fn builtin() -> Self {
        let ignored = Language::ALL
            .into_iter()
            .map(|lang| {
                let specific = match lang {
                    Language::Cpp => CPP_IGNORED,
                    Language::Java => JAVA_IGNORED,
                    Language::CSharp => CSHARP_IGNORED,
                    Language::Kotlin => KOTLIN_IGNORED,
                };
                let set = BASE_IGNORED
                    .iter()
                    .chain(specific)
                    .map(|s| (*s).to_string())
                    .collect();
                (lang, set)
            })
            .collect();
        Self { ignored }
    }

    /// Built-in sets unioned with `<dir>/<language>.txt` files.
    ///
    /// Each file holds one type name per line; blank lines and `#` comments
    /// are skipped. Upper-case file names (`CPP.txt`) are accepted too. A
    /// missing directory or file adds nothing.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut filter = Self::builtin();
        if !dir.is_dir() {
            debug!("ignore-list directory {} not found, using built-ins", dir.display());
            return Ok(filter);
        }
        for lang in Language::ALL {
            let candidates = [
                dir.join(format!("{}.txt", lang.name())),
                dir.join(format!("{}.txt", lang.name().to_uppercase())),
            ];
            let Some(path) = candidates.iter().find(|p| p.is_file()) else {
                continue;
            };
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read ignore list {}", path.display()))?;
            let names: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .collect();
            if names.is_empty() {
                warn!("ignore list {} is empty", path.display());
            }
            debug!("loaded {} ignored names for {}", names.len(), lang);
            filter.extend(lang, names);
        }
        Ok(filter)
    }

    /// Add names to one language's ignore set.
    pub fn extend<I, S>(&mut self, language: Language, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored
            .entry(language)
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    /// Builder form of [`TypeFilter::extend`].
    pub fn with_extra<I, S>(mut self, language: Language, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend(language, names);
        self
    }

    /// Whether a normalized key is too fundamental to be a dependency.
    ///
    /// True for empty keys, single upper-case letters (unresolved generic
    /// parameters), numeric array bounds, and names in the language's set.
    /// A multi-word key (`unsigned long`) is ignorable when every word is.
    pub fn is_ignorable(&self, key: &str, language: Language) -> bool {
        let key = strip_std_prefix(key);
        if key.is_empty() {
            return true;
        }
        let mut chars = key.chars();
        let first = chars.next().unwrap_or_default();
        if first.is_ascii_digit() {
            return true;
        }
        if first.is_ascii_uppercase() && chars.next().is_none() {
            return true;
        }
        let Some(set) = self.ignored.get(&language) else {
            return false;
        };
        set.contains(key) || key.split_whitespace().all(|w| set.contains(w))
    }

    /// The type a declaration of `raw` depends on, if any.
    ///
    /// The normalized key itself when it is not ignorable; otherwise the
    /// innermost contained type, so `std::vector<Widget>` depends on `Widget`.
    pub fn dependency_target(&self, raw: &str, language: Language) -> Option<String> {
        let key = normalize(raw, language);
        if !self.is_ignorable(&key, language) {
            return Some(key);
        }
        let inner = container_target(raw, language);
        (!self.is_ignorable(&inner, language)).then_some(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ignorable_everywhere() {
        let filter = TypeFilter::builtin();
        for lang in Language::ALL {
            assert!(filter.is_ignorable("int", lang), "{lang}");
            assert!(filter.is_ignorable("T", lang), "{lang}");
            assert!(!filter.is_ignorable("MyClass", lang), "{lang}");
        }
    }

    #[test]
    fn test_normalize_cpp() {
        assert_eq!(normalize("const std::vector<Foo>&", Language::Cpp), "vector");
        assert_eq!(normalize("Widget*", Language::Cpp), "Widget");
        assert_eq!(normalize("static const ns::Bar *", Language::Cpp), "ns::Bar");
        assert_eq!(normalize("::std::string", Language::Cpp), "string");
        assert_eq!(normalize("int[10]", Language::Cpp), "int");
        assert_eq!(normalize("unsigned long", Language::Cpp), "unsigned long");
        assert_eq!(normalize("struct Node*", Language::Cpp), "Node");
    }

    #[test]
    fn test_normalize_jvm_and_dotnet() {
        assert_eq!(normalize("java.util.List<String>", Language::Java), "List");
        assert_eq!(normalize("@Nullable Order[]", Language::Java), "Order");
        assert_eq!(normalize("Object...", Language::Java), "Object");
        assert_eq!(normalize("? extends Shape", Language::Java), "Shape");
        assert_eq!(normalize("User?", Language::Kotlin), "User");
        assert_eq!(normalize("(Int) -> Unit", Language::Kotlin), "");
        assert_eq!(normalize("ref Order", Language::CSharp), "Order");
        assert_eq!(normalize("System.String", Language::CSharp), "String");
    }

    #[test]
    fn test_container_target() {
        assert_eq!(
            container_target("std::vector<std::shared_ptr<Widget>>", Language::Cpp),
            "Widget"
        );
        assert_eq!(container_target("std::map<int, Order*>", Language::Cpp), "Order");
        assert_eq!(container_target("Foo*", Language::Cpp), "Foo");
        assert_eq!(container_target("Foo", Language::Cpp), "");
        assert_eq!(
            container_target("Map<String, List<Item>>", Language::Java),
            "Item"
        );
        assert_eq!(container_target("Task<Result>", Language::CSharp), "Result");
        assert_eq!(container_target("MutableList<User>?", Language::Kotlin), "User");
    }

    #[test]
    fn test_dependency_target() {
        let filter = TypeFilter::builtin();
        assert_eq!(
            filter.dependency_target("std::vector<Widget>", Language::Cpp),
            Some("Widget".to_string())
        );
        assert_eq!(
            filter.dependency_target("const Engine&", Language::Cpp),
            Some("Engine".to_string())
        );
        assert_eq!(filter.dependency_target("std::vector<int>", Language::Cpp), None);
        assert_eq!(filter.dependency_target("List<T>", Language::Java), None);
        assert_eq!(filter.dependency_target("String", Language::Java), None);
    }

    #[test]
    fn test_template_args() {
        assert_eq!(
            template_args("std::map<std::string, std::vector<int>>"),
            vec!["std::string", "std::vector<int>"]
        );
        assert!(template_args("Foo").is_empty());
        assert_eq!(base_name("std::vector<int>"), "std::vector");
    }

    #[test]
    fn test_with_extra() {
        let filter = TypeFilter::builtin().with_extra(Language::Java, ["Logger"]);
        assert!(filter.is_ignorable("Logger", Language::Java));
        assert!(!filter.is_ignorable("Logger", Language::Cpp));
    }
}
