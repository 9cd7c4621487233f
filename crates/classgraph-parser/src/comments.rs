//! Comment removal ahead of extraction.

use classgraph_core::language::Language;
use regex::{Captures, Regex};
use std::sync::OnceLock;

const PLAIN_LITERALS: &str = r#""(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])'"#;
const COMMENTS: &str = r"(?P<line>//[^\n]*)|(?P<block>/\*(?s:.*?)\*/)";

static JVM_RE: OnceLock<Regex> = OnceLock::new();
static CPP_RE: OnceLock<Regex> = OnceLock::new();
static CSHARP_RE: OnceLock<Regex> = OnceLock::new();

/// Literal alternatives come first so comment markers inside them are never
/// matched.
fn build(extra_literals: &str) -> Regex {
    Regex::new(&format!(
        "(?P<lit>{extra_literals}|{PLAIN_LITERALS})|{COMMENTS}"
    ))
    .unwrap()
}

fn comment_re(language: Language) -> &'static Regex {
    match language {
        // Java text blocks and Kotlin raw strings
        Language::Java | Language::Kotlin => JVM_RE.get_or_init(|| build(r#""""(?s:.*?)""""#)),
        Language::Cpp => CPP_RE.get_or_init(|| build(r#"R"\((?s:.*?)\)""#)),
        Language::CSharp => {
            CSHARP_RE.get_or_init(|| build(r#""""(?s:.*?)"""|@"(?:[^"]|"")*""#))
        }
    }
}

/// Remove `//` and `/* */` comments, keeping string and char literals intact.
///
/// Block comments are replaced by their newlines (or a single space) so line
/// numbers computed on the result match the original file.
pub fn strip_comments(text: &str, language: Language) -> String {
    comment_re(language)
        .replace_all(text, |caps: &Captures<'_>| {
            if let Some(lit) = caps.name("lit") {
                return lit.as_str().to_string();
            }
            if let Some(block) = caps.name("block") {
                let newlines = block.as_str().matches('\n').count();
                return if newlines == 0 {
                    " ".to_string()
                } else {
                    "\n".repeat(newlines)
                };
            }
            String::new()
        })
        .into_owned()
}
