use classgraph_core::graph::GraphDocument;
use classgraph_core::language::Language;
use classgraph_core::model::{ClassRecord, RelationKind};
use classgraph_parser::{TypeFilter, parse_source};
use classgraph_resolver::{GraphBuilder, build_graph};
use std::path::Path;

fn records(files: &[(&str, &str)]) -> Vec<ClassRecord> {
    let filter = TypeFilter::builtin();
    let mut out = Vec::new();
    for (name, source) in files {
        let path = Path::new(name);
        let language = Language::from_path(path).unwrap();
        out.extend(parse_source(path, source, language, &filter).into_records());
    }
    out
}

fn node_ids(doc: &GraphDocument) -> Vec<&str> {
    doc.nodes.iter().map(|n| n.id.as_str()).collect()
}

fn edges(doc: &GraphDocument) -> Vec<(&str, &str, RelationKind)> {
    doc.links
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str(), e.relation))
        .collect()
}

#[test]
fn test_derived_base_other_end_to_end() {
    let recs = records(&[(
        "derived.cpp",
        "class Derived : public Base { Base* ptr; void f(Other o); };",
    )]);
    let doc = build_graph(&recs, &TypeFilter::builtin());

    assert_eq!(node_ids(&doc), vec!["Base", "Derived", "Other"]);
    assert!(doc.node("Base").unwrap().placeholder);
    assert!(doc.node("Other").unwrap().placeholder);
    assert!(!doc.node("Derived").unwrap().placeholder);
    assert_eq!(
        edges(&doc),
        vec![
            ("Derived", "Base", RelationKind::Extended),
            ("Derived", "Other", RelationKind::Depended),
        ]
    );
    assert!(doc.validate().is_empty());
    assert_eq!(doc.language, Some(Language::Cpp));
}

const NAMESPACES: &str = r"
namespace A { namespace B {
class Foo {};
class User { Foo* foo; };
} }

namespace C { namespace D {
class Foo {};
} }

namespace E {
class Client { Foo* foo; };
}
";

#[test]
fn test_qualified_resolution_within_namespace() {
    let doc = build_graph(&records(&[("ns.hpp", NAMESPACES)]), &TypeFilter::builtin());
    assert!(doc.has_edge("A::B::User", "A::B::Foo", RelationKind::Depended));
    assert!(!doc.has_edge("A::B::User", "C::D::Foo", RelationKind::Depended));
}

const SHADOWED: &str = r"
class Foo {};
class Main { Foo* foo; };

namespace A { namespace B {
class Foo {};
class User { Foo* foo; };
} }

namespace C {
class Client { Foo* foo; };
}
";

#[test]
fn test_own_namespace_shadows_global_type() {
    let doc = build_graph(&records(&[("shadow.hpp", SHADOWED)]), &TypeFilter::builtin());
    assert!(doc.has_edge("A::B::User", "A::B::Foo", RelationKind::Depended));
    assert!(!doc.has_edge("A::B::User", "Foo", RelationKind::Depended));
    assert!(doc.has_edge("Main", "Foo", RelationKind::Depended));
    assert!(doc.has_edge("C::Client", "Foo", RelationKind::Depended));
    assert_eq!(doc.placeholder_count(), 0);
}

#[test]
fn test_own_package_wins_over_other_package() {
    let recs = records(&[
        ("a/Foo.java", "package a;\npublic class Foo {}\n"),
        ("b/Foo.java", "package b;\npublic class Foo {}\n"),
        ("b/User.java", "package b;\npublic class User { private Foo foo; }\n"),
    ]);
    let doc = build_graph(&recs, &TypeFilter::builtin());
    assert!(doc.has_edge("b.User", "b.Foo", RelationKind::Depended));
    assert!(!doc.has_edge("b.User", "a.Foo", RelationKind::Depended));
}

#[test]
fn test_ambiguous_name_left_unresolved() {
    let doc = build_graph(&records(&[("ns.hpp", NAMESPACES)]), &TypeFilter::builtin());
    assert!(doc.has_edge("E::Client", "Foo", RelationKind::Depended));
    let literal = doc.node("Foo").unwrap();
    assert!(literal.placeholder);
    assert!(doc.validate().is_empty());
}

#[test]
fn test_imports_disambiguate() {
    let recs = records(&[
        ("Order.java", "package com.acme.model;\npublic class Order {}\n"),
        ("Legacy.java", "package com.other;\npublic class Order {}\n"),
        (
            "Service.java",
            "package com.acme.app;\nimport com.acme.model.Order;\npublic class Service { private Order order; }\n",
        ),
        (
            "Report.java",
            "package com.acme.app;\nimport com.other.*;\npublic class Report { Order source; Service service; }\n",
        ),
    ]);
    let doc = build_graph(&recs, &TypeFilter::builtin());
    assert!(doc.has_edge("com.acme.app.Service", "com.acme.model.Order", RelationKind::Depended));
    assert!(doc.has_edge("com.acme.app.Report", "com.other.Order", RelationKind::Depended));
    assert!(doc.has_edge("com.acme.app.Report", "com.acme.app.Service", RelationKind::Depended));
    assert_eq!(doc.placeholder_count(), 0);
}

#[test]
fn test_nested_types_resolve_from_enclosing_class() {
    let recs = records(&[(
        "Outer.java",
        "package p;\nclass Outer {\n  static class Inner {}\n  Inner inner;\n}\nclass Other extends Outer.Inner {}\n",
    )]);
    let doc = build_graph(&recs, &TypeFilter::builtin());
    assert!(doc.has_edge("p.Outer", "p.Outer.Inner", RelationKind::Depended));
    assert!(doc.has_edge("p.Other", "p.Outer.Inner", RelationKind::Extended));
    assert_eq!(doc.node("p.Outer.Inner").unwrap().package, "p.Outer");
}

#[test]
fn test_csharp_using_and_dotted_names() {
    let recs = records(&[
        ("Entity.cs", "namespace Shop.Core { public abstract class Entity {} }"),
        ("Models.cs", "namespace Shop.Models { public class User {} }"),
        (
            "Order.cs",
            "using Shop.Core;\nnamespace Shop { public class Order : Entity { public Models.User Buyer { get; set; } } }",
        ),
    ]);
    let doc = build_graph(&recs, &TypeFilter::builtin());
    assert!(doc.has_edge("Shop::Order", "Shop::Core::Entity", RelationKind::Extended));
    assert!(doc.has_edge("Shop::Order", "Shop::Models::User", RelationKind::Depended));
    assert_eq!(doc.language, Some(Language::CSharp));
}

#[test]
fn test_ignorable_targets_and_self_loops_dropped() {
    let mut record = ClassRecord::new("Node", "", Language::Cpp);
    record.add_relation("int", RelationKind::Depended);
    record.add_relation("T", RelationKind::Depended);
    record.add_relation("Node", RelationKind::Depended);
    record.add_relation("Edge", RelationKind::Depended);
    let filter = TypeFilter::builtin().with_extra(Language::Cpp, ["Edge"]);
    let doc = build_graph(&[record], &filter);
    assert!(doc.links.is_empty());
    assert_eq!(node_ids(&doc), vec!["Node"]);
}

#[test]
fn test_closure_over_unresolved_targets() {
    let mut records = Vec::new();
    for i in 0..20 {
        let mut record = ClassRecord::new(format!("C{i}"), "pkg", Language::Kotlin);
        record.add_relation(format!("C{}", (i * 7) % 20), RelationKind::Depended);
        record.add_relation(format!("ext::Missing{}", i % 3), RelationKind::Extended);
        record.add_relation(format!("Lost{}", i % 4), RelationKind::Implemented);
        records.push(record);
    }
    let doc = build_graph(&records, &TypeFilter::builtin());
    assert!(doc.validate().is_empty());
    assert_eq!(doc.placeholder_count(), 3 + 4);
    assert_eq!(doc.node("ext::Missing1").unwrap().package, "ext");
}

#[test]
fn test_building_twice_merged_is_idempotent() {
    let once = records(&[("ns.hpp", NAMESPACES)]);
    let mut twice = once.clone();
    twice.extend(once.clone());
    let filter = TypeFilter::builtin();
    assert_eq!(build_graph(&once, &filter), build_graph(&twice, &filter));
}

#[test]
fn test_node_contents_and_source_path() {
    let recs = records(&[(
        "Shape.java",
        "package geo;\npublic interface Shape {\n  double area();\n  int SIDES = 0;\n}\n",
    )]);
    let filter = TypeFilter::builtin();
    let doc = GraphBuilder::new(&filter).source_path("/src/geo").build(&recs);
    assert_eq!(doc.analysis_source_path, "/src/geo");
    let shape = doc.node("geo.Shape").unwrap();
    assert!(shape.flags.is_interface);
    assert_eq!(shape.methods, vec!["public area(): double"]);
    assert_eq!(shape.attributes, vec!["public static int SIDES"]);
    assert_eq!(shape.lines_of_code, Some(4));
    assert_eq!(shape.language, Some(Language::Java));
}

#[test]
fn test_mixed_languages_tiebreak() {
    let recs = records(&[
        ("A.java", "class A {}"),
        ("b.hpp", "class B {};"),
    ]);
    let doc = build_graph(&recs, &TypeFilter::builtin());
    assert_eq!(doc.language, Some(Language::Cpp));
    assert!(build_graph(&[], &TypeFilter::builtin()).language.is_none());
}
