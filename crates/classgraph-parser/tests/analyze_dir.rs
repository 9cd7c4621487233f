use classgraph_core::config::AnalysisConfig;
use classgraph_core::language::Language;
use classgraph_core::model::RelationKind;
use classgraph_parser::{ParseError, TypeFilter, analyze, analyze_files, analyze_with, collect_sources, parse_file};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/Main.java", "package app;\npublic class Main extends Base { Helper h; }\n");
    write(root, "src/Base.java", "package app;\npublic abstract class Base {}\n");
    write(root, "native/engine.hpp", "class Engine : public Component { Fuel* fuel; };\n");
    write(root, "net/Client.cs", "namespace Net { public class Client : IDisposable { } }\n");
    write(root, "kt/Model.kt", "package kt\nclass Model(val id: Long)\n");
    write(root, "README.md", "class NotCode {}\n");
    write(root, ".hidden/Secret.java", "class Secret {}\n");
    write(root, "gen/Generated.java", "class Generated {}\n");
    write(root, ".classgraphignore", "gen/\n");
    dir
}

fn names(records: &[classgraph_core::model::ClassRecord]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.qualified_name()).collect();
    names.sort();
    names
}

#[test]
fn test_collect_sources_filters_tree() {
    let dir = project();
    let files = collect_sources(dir.path(), &AnalysisConfig::default());
    let rel: Vec<String> = files
        .iter()
        .map(|p| {
            p.strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(
        rel,
        vec![
            "kt/Model.kt",
            "native/engine.hpp",
            "net/Client.cs",
            "src/Base.java",
            "src/Main.java",
        ]
    );
}

#[test]
fn test_collect_sources_skips_large_files() {
    let dir = project();
    write(dir.path(), "src/Huge.java", &"// filler\n".repeat(200));
    let config = AnalysisConfig {
        max_file_bytes: 1000,
        ..AnalysisConfig::default()
    };
    let files = collect_sources(dir.path(), &config);
    assert!(files.iter().all(|p| !p.ends_with("Huge.java")));
    assert_eq!(files.len(), 5);
}

#[test]
fn test_analyze_mixed_languages() {
    let dir = project();
    let records = analyze(dir.path(), &TypeFilter::builtin());
    assert_eq!(
        names(&records),
        vec!["Engine", "Net::Client", "app.Base", "app.Main", "kt::Model"]
    );
    let main = records.iter().find(|r| r.name == "Main").unwrap();
    assert!(main.file.ends_with("Main.java"));
    assert!(
        main.relations
            .iter()
            .any(|r| r.target == "Base" && r.kind == RelationKind::Extended)
    );
    let client = records.iter().find(|r| r.name == "Client").unwrap();
    assert_eq!(client.language, Language::CSharp);
    assert!(
        client
            .relations
            .iter()
            .any(|r| r.target == "IDisposable" && r.kind == RelationKind::Implemented)
    );
}

#[test]
fn test_analyze_is_deterministic() {
    let dir = project();
    let filter = TypeFilter::builtin();
    let first = analyze(dir.path(), &filter);
    let second = analyze(dir.path(), &filter);
    assert_eq!(first, second);
}

#[test]
fn test_failed_file_is_skipped() {
    let dir = project();
    let good = dir.path().join("src/Main.java");
    let missing = dir.path().join("src/Missing.java");
    let arena = analyze_files(&[missing, good], &TypeFilter::builtin());
    assert_eq!(arena.len(), 1);
    assert_eq!(arena.records()[0].name, "Main");
}

#[test]
fn test_parse_file_errors() {
    let dir = project();
    let filter = TypeFilter::builtin();
    let err = parse_file(&dir.path().join("README.md"), &filter).unwrap_err();
    assert!(matches!(err, ParseError::Unsupported(_)));
    let err = parse_file(&dir.path().join("src/Missing.java"), &filter).unwrap_err();
    assert!(matches!(err, ParseError::Read { .. }));
    assert!(err.to_string().contains("Missing.java"));
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Latin.java");
    let mut bytes = b"class Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b" { Menu menu; }\nclass Bar {}\n");
    fs::write(&path, bytes).unwrap();
    let arena = parse_file(&path, &TypeFilter::builtin()).unwrap();
    assert!(arena.records().iter().any(|r| r.name == "Bar"));
}

#[test]
fn test_ignore_lists_extend_filter() {
    let dir = project();
    write(dir.path(), ".classgraph/ignore/java.txt", "# vendor types\nHelper\n");
    let config = AnalysisConfig::default();
    let filter = TypeFilter::load(&dir.path().join(&config.ignore_dir)).unwrap();
    let arena = analyze_with(dir.path(), &filter, &config);
    let main = arena.records().iter().find(|r| r.name == "Main").unwrap();
    assert!(main.relations.iter().all(|r| r.target != "Helper"));

    let unfiltered = analyze(dir.path(), &TypeFilter::builtin());
    let main = unfiltered.iter().find(|r| r.name == "Main").unwrap();
    assert!(main.relations.iter().any(|r| r.target == "Helper"));
}
