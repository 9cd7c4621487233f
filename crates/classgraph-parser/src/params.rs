//! Splitting of parameter, template-argument and base lists.

use crate::scan::{
    is_identifier, skip_literal, split_top_level_whitespace, strip_annotations,
    strip_leading_attributes, top_level_assign, top_level_colon,
};
use classgraph_core::language::Language;
use classgraph_core::model::Param;

/// Words that can end a type but never name a parameter.
const TYPE_WORDS: &[&str] = &[
    "int", "char", "short", "long", "float", "double", "bool", "boolean", "byte", "void",
    "unsigned", "signed", "const", "volatile", "auto", "wchar_t", "size_t", "string", "object",
    "decimal", "var",
];

/// Modifiers dropped from parameter types.
const PARAM_MODIFIERS: &[&str] = &["final", "this", "scoped"];

/// Kotlin parameter modifiers in front of the name.
const KOTLIN_PARAM_MODIFIERS: &[&str] = &[
    "vararg", "noinline", "crossinline", "val", "var", "private", "protected", "public",
    "internal", "override", "open", "final", "lateinit",
];

/// Split a comma-separated list at top-level commas only.
///
/// `<...>` nests, and so do `(...)`, `[...]` and `{...}` so default values
/// and function types stay whole. The `>` of `->` does not close anything.
/// Items are trimmed and empty items are dropped.
pub fn split_params(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'<' | b'(' | b'[' | b'{' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' | b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                items.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    items.push(text[start..].trim().to_string());
    items.retain(|item| !item.is_empty());
    items
}

/// Split one parameter declaration into its type and optional name.
pub fn parse_param(item: &str, language: Language) -> Option<Param> {
    let (text, _) = strip_annotations(item);
    let text = strip_leading_attributes(&text);
    let text = match top_level_assign(text) {
        Some(eq) => &text[..eq],
        None => text,
    }
    .trim();
    if text.is_empty() || text == "..." {
        return None;
    }

    if language == Language::Kotlin {
        return parse_kotlin_param(text);
    }

    let tokens: Vec<&str> = split_top_level_whitespace(text)
        .into_iter()
        .filter(|t| !PARAM_MODIFIERS.contains(t))
        .collect();
    let (&last, type_tokens) = tokens.split_last()?;

    let marks_len = last.len() - last.trim_start_matches(['*', '&', '^']).len();
    let (marks, declarator) = last.split_at(marks_len);
    let (name, array) = match declarator.find('[') {
        Some(open) => declarator.split_at(open),
        None => (declarator, ""),
    };

    if !type_tokens.is_empty() && is_identifier(name) && !TYPE_WORDS.contains(&name) {
        let mut type_name = type_tokens.join(" ");
        type_name.push_str(marks);
        type_name.push_str(array);
        return Some(Param {
            type_name: java_varargs(type_name),
            name: Some(name.to_string()),
        });
    }

    Some(Param {
        type_name: java_varargs(tokens.join(" ")),
        name: None,
    })
}

fn parse_kotlin_param(text: &str) -> Option<Param> {
    let colon = top_level_colon(text)?;
    let name = text[..colon]
        .split_whitespace()
        .rfind(|w| !KOTLIN_PARAM_MODIFIERS.contains(w))?;
    let type_name = text[colon + 1..].trim();
    if type_name.is_empty() || !is_identifier(name) {
        return None;
    }
    Some(Param {
        type_name: type_name.to_string(),
        name: Some(name.to_string()),
    })
}

/// `Object...` is written as the array it is received as.
fn java_varargs(type_name: String) -> String {
    match type_name.strip_suffix("...") {
        Some(element) => format!("{}[]", element.trim_end()),
        None => type_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(item: &str, language: Language) -> (String, Option<String>) {
        let p = parse_param(item, language).unwrap();
        (p.type_name, p.name)
    }

    #[test]
    fn test_split_simple_list() {
        assert_eq!(
            split_params("int, std::vector<std::string>, MyClass"),
            vec!["int", "std::vector<std::string>", "MyClass"]
        );
    }

    #[test]
    fn test_split_nested_generics() {
        assert_eq!(split_params("A<B,C>, D"), vec!["A<B,C>", "D"]);
        assert_eq!(
            split_params("Map<K, List<V>> m, (Int) -> Unit f"),
            vec!["Map<K, List<V>> m", "(Int) -> Unit f"]
        );
    }

    #[test]
    fn test_split_drops_empty_items() {
        assert_eq!(split_params("a, , b,"), vec!["a", "b"]);
        assert!(split_params("   ").is_empty());
    }

    #[test]
    fn test_split_keeps_default_calls_whole() {
        assert_eq!(
            split_params("int x = max(1, 2), Foo f"),
            vec!["int x = max(1, 2)", "Foo f"]
        );
    }

    #[test]
    fn test_cpp_params() {
        assert_eq!(
            param("const std::vector<T>& items", Language::Cpp),
            ("const std::vector<T>&".into(), Some("items".into()))
        );
        assert_eq!(param("Foo *p", Language::Cpp), ("Foo*".into(), Some("p".into())));
        assert_eq!(param("const Foo&", Language::Cpp), ("const Foo&".into(), None));
        assert_eq!(param("unsigned long", Language::Cpp), ("unsigned long".into(), None));
        assert_eq!(param("int arr[]", Language::Cpp), ("int[]".into(), Some("arr".into())));
        assert_eq!(param("int n = 5", Language::Cpp), ("int".into(), Some("n".into())));
    }

    #[test]
    fn test_java_params() {
        assert_eq!(
            param("@NotNull final String name", Language::Java),
            ("String".into(), Some("name".into()))
        );
        assert_eq!(
            param("@Min(1) int age", Language::Java),
            ("int".into(), Some("age".into()))
        );
        assert_eq!(
            param("Object... args", Language::Java),
            ("Object[]".into(), Some("args".into()))
        );
        assert_eq!(
            param("Map<String, List<Order>> index", Language::Java),
            ("Map<String, List<Order>>".into(), Some("index".into()))
        );
    }

    #[test]
    fn test_csharp_params() {
        assert_eq!(
            param("[FromBody] OrderDto dto", Language::CSharp),
            ("OrderDto".into(), Some("dto".into()))
        );
        assert_eq!(
            param("this string s", Language::CSharp),
            ("string".into(), Some("s".into()))
        );
        assert_eq!(
            param("out int count", Language::CSharp),
            ("out int".into(), Some("count".into()))
        );
    }

    #[test]
    fn test_kotlin_params() {
        assert_eq!(
            param("val name: String", Language::Kotlin),
            ("String".into(), Some("name".into()))
        );
        assert_eq!(
            param("private val repo: Repository<User> = Repository()", Language::Kotlin),
            ("Repository<User>".into(), Some("repo".into()))
        );
        assert_eq!(
            param("vararg items: Int", Language::Kotlin),
            ("Int".into(), Some("items".into()))
        );
        assert!(parse_param("noType", Language::Kotlin).is_none());
    }
}
