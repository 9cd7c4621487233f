//! Name indices over every analyzed record and the lookup order used to
//! turn a relation target as written into a graph node id.

use classgraph_core::language::Language;
use classgraph_core::model::ClassRecord;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Qualified and simple-name indices of one run.
#[derive(Debug, Default)]
pub struct TypeIndex {
    qualified: HashSet<String>,
    by_simple: HashMap<String, BTreeSet<String>>,
}

/// How a target was resolved; ambiguity is never guessed away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A declared type.
    Found(String),
    /// Several declared types share the simple name.
    Ambiguous(String),
    /// Nothing declared matches; the name stands for an external type.
    External(String),
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Self::Found(id) | Self::Ambiguous(id) | Self::External(id) => id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            Self::Found(id) | Self::Ambiguous(id) | Self::External(id) => id,
        }
    }
}

impl TypeIndex {
    pub fn new<'a>(records: impl IntoIterator<Item = &'a ClassRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            let id = record.qualified_name();
            index
                .by_simple
                .entry(record.name.clone())
                .or_default()
                .insert(id.clone());
            index.qualified.insert(id);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.qualified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.qualified.contains(id)
    }

    /// Declared ids whose simple name is `name`, sorted.
    pub fn candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.by_simple
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Resolve `target`, a normalized type key written inside `owner`.
    ///
    /// Tried in order: the key inside each enclosing scope from the
    /// innermost outward, the key as an id, the key through each import,
    /// and a unique simple-name match for unqualified keys. A type in the
    /// owner's own package shadows a global one of the same name.
    pub fn resolve(&self, target: &str, owner: &ClassRecord) -> Resolution {
        let language = owner.language;
        let sep = language.scope_separator();
        let key = canonical(target, language);

        let owner_id = owner.qualified_name();
        for scope in enclosing_scopes(&owner_id, sep) {
            let candidate = format!("{scope}{sep}{key}");
            if self.contains(&candidate) {
                return Resolution::Found(candidate);
            }
        }
        if self.contains(&key) {
            return Resolution::Found(key);
        }

        for import in &owner.imports {
            if let Some(candidate) = through_import(import, &key, language)
                .into_iter()
                .find(|c| self.contains(c))
            {
                return Resolution::Found(candidate);
            }
        }

        if is_qualified(&key) {
            return Resolution::External(key);
        }
        let mut matches = self.candidates(&key);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Resolution::Found(only.to_string()),
            (Some(_), Some(_)) => Resolution::Ambiguous(key),
            _ => Resolution::External(key),
        }
    }
}

/// The key in the id form of `language`: C# and Kotlin ids separate
/// namespaces with `::`, so `models.User` becomes `models::User`.
pub fn canonical(target: &str, language: Language) -> String {
    match language {
        Language::CSharp | Language::Kotlin => target.replace('.', "::"),
        Language::Java | Language::Cpp => target.to_string(),
    }
}

fn is_qualified(key: &str) -> bool {
    key.contains("::") || key.contains('.')
}

/// `a::b::C` gives `a::b::C`, `a::b`, `a`: the record itself first so its
/// nested types resolve, then every enclosing scope.
fn enclosing_scopes<'a>(id: &'a str, sep: &'a str) -> impl Iterator<Item = &'a str> {
    std::iter::successors(Some(id), move |scope| {
        scope.rsplit_once(sep).map(|(outer, _)| outer)
    })
    .filter(|scope| !scope.is_empty())
}

/// Ids `key` may stand for through one import.
///
/// An import naming a type (`com.acme.Order`, `using std::vector`) covers
/// keys starting with that simple name. A wildcard import (`com.acme.*`)
/// and a C#/C++ namespace import (`using Shop.Core`) cover every key.
fn through_import(import: &str, key: &str, language: Language) -> Vec<String> {
    let sep = language.scope_separator();
    let wildcard = import.ends_with('*');
    let import = canonical(import, language);
    let import = import.trim_end_matches(['*', '.', ':']);
    if import.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let (head, rest) = match key.split_once(sep) {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };
    if import.rsplit(sep).next() == Some(head) {
        out.push(match rest {
            Some(rest) => format!("{import}{sep}{rest}"),
            None => import.to_string(),
        });
    }
    if wildcard || matches!(language, Language::CSharp | Language::Cpp) {
        out.push(format!("{import}{sep}{key}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, package: &str, language: Language) -> ClassRecord {
        ClassRecord::new(name, package, language)
    }

    #[test]
    fn test_enclosing_scopes() {
        let scopes: Vec<&str> = enclosing_scopes("a::b::C", "::").collect();
        assert_eq!(scopes, vec!["a::b::C", "a::b", "a"]);
        let scopes: Vec<&str> = enclosing_scopes("Main", ".").collect();
        assert_eq!(scopes, vec!["Main"]);
    }

    #[test]
    fn test_through_import() {
        assert_eq!(
            through_import("com.acme.Order", "Order", Language::Java),
            vec!["com.acme.Order"]
        );
        assert!(through_import("com.acme.Order", "Invoice", Language::Java).is_empty());
        assert_eq!(
            through_import("com.acme.*", "Invoice", Language::Java),
            vec!["com.acme.Invoice"]
        );
        assert_eq!(
            through_import("Shop.Core", "Entity", Language::CSharp),
            vec!["Shop::Core::Entity"]
        );
        assert_eq!(
            through_import("com.acme.Order", "Order.Line", Language::Java),
            vec!["com.acme.Order.Line"]
        );
        assert_eq!(
            through_import("com.acme.Order", "Order::Line", Language::Kotlin),
            vec!["com::acme::Order::Line"]
        );
    }

    #[test]
    fn test_resolve_prefers_enclosing_scope() {
        let records = vec![
            record("Foo", "a::b", Language::Cpp),
            record("Foo", "c::d", Language::Cpp),
            record("User", "a::b", Language::Cpp),
        ];
        let index = TypeIndex::new(&records);
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.resolve("Foo", &records[2]),
            Resolution::Found("a::b::Foo".to_string())
        );
        let outsider = record("Other", "x", Language::Cpp);
        assert_eq!(
            index.resolve("Foo", &outsider),
            Resolution::Ambiguous("Foo".to_string())
        );
        assert_eq!(
            index.resolve("User", &outsider),
            Resolution::Found("a::b::User".to_string())
        );
        assert_eq!(
            index.resolve("ext::Thing", &outsider),
            Resolution::External("ext::Thing".to_string())
        );
    }

    #[test]
    fn test_duplicate_declarations_are_not_ambiguous() {
        let records = vec![
            record("Foo", "a", Language::Cpp),
            record("Foo", "a", Language::Cpp),
        ];
        let index = TypeIndex::new(&records);
        let owner = record("Bar", "z", Language::Cpp);
        assert_eq!(index.resolve("Foo", &owner).id(), "a::Foo");
    }

    #[test]
    fn test_own_package_shadows_global() {
        let records = vec![
            record("Foo", "", Language::Cpp),
            record("Foo", "a::b", Language::Cpp),
            record("User", "a::b", Language::Cpp),
        ];
        let index = TypeIndex::new(&records);
        assert_eq!(
            index.resolve("Foo", &records[2]),
            Resolution::Found("a::b::Foo".to_string())
        );
        let global = record("Main", "", Language::Cpp);
        assert_eq!(
            index.resolve("Foo", &global),
            Resolution::Found("Foo".to_string())
        );
    }

    #[test]
    fn test_candidates_outlive_key() {
        let records = vec![record("Foo", "a", Language::Java), record("Foo", "b", Language::Java)];
        let index = TypeIndex::new(&records);
        let found: Vec<&str> = {
            let key = String::from("Foo");
            index.candidates(&key).collect()
        };
        assert_eq!(found, vec!["a.Foo", "b.Foo"]);
    }

    #[test]
    fn test_dotted_keys_in_csharp() {
        let records = vec![record("User", "App::Models", Language::CSharp)];
        let index = TypeIndex::new(&records);
        let owner = record("Service", "App", Language::CSharp);
        assert_eq!(
            index.resolve("Models.User", &owner),
            Resolution::Found("App::Models::User".to_string())
        );
    }
}
