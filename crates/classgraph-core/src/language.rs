//! Supported source languages and the tie-break policies that pick between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A source language the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Cpp,
    CSharp,
    Kotlin,
}

impl Language {
    /// Every supported language, in detection order.
    pub const ALL: [Language; 4] = [
        Language::Java,
        Language::Cpp,
        Language::CSharp,
        Language::Kotlin,
    ];

    /// Map a file extension (without the dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "java" => Some(Self::Java),
            "cpp" | "h" | "hpp" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            "kt" => Some(Self::Kotlin),
            _ => None,
        }
    }

    /// Detect the language of a file from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse a language identifier as written in config or on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "java" => Some(Self::Java),
            "cpp" | "c++" | "cxx" => Some(Self::Cpp),
            "csharp" | "c#" | "cs" => Some(Self::CSharp),
            "kotlin" | "kt" => Some(Self::Kotlin),
            _ => None,
        }
    }

    /// Stable identifier, also the stem of the language's ignore-list file.
    pub fn name(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Kotlin => "kotlin",
        }
    }

    /// Separator placed between a package and a simple name in qualified ids.
    pub fn scope_separator(self) -> &'static str {
        match self {
            Self::Java => ".",
            Self::Cpp | Self::CSharp | Self::Kotlin => "::",
        }
    }

    /// Join a package and a simple name with this language's separator.
    pub fn qualify(self, package: &str, name: &str) -> String {
        if package.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", package, self.scope_separator(), name)
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick one language to stand for a set of detected languages.
///
/// An empty set has none, a homogeneous set is its own language, and any mix
/// falls back to C++.
pub fn default_language_tiebreak(languages: &[Language]) -> Option<Language> {
    let mut distinct: Vec<Language> = languages.to_vec();
    distinct.sort();
    distinct.dedup();
    match distinct.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => Some(Language::Cpp),
    }
}
