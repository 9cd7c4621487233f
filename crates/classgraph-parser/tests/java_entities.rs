use classgraph_core::model::{Access, ClassArena, ClassKind, ClassRecord, MethodKind, RelationKind};
use classgraph_parser::{Language, TypeFilter, parse_source};
use std::path::Path;

fn parse(source: &str) -> ClassArena {
    parse_source(Path::new("Test.java"), source, Language::Java, &TypeFilter::builtin())
}

fn class<'a>(arena: &'a ClassArena, name: &str) -> &'a ClassRecord {
    arena
        .records()
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn targets(record: &ClassRecord, kind: RelationKind) -> Vec<&str> {
    let mut out: Vec<&str> = record
        .relations
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.target.as_str())
        .collect();
    out.sort_unstable();
    out
}

const ORDER: &str = r#"package com.acme.shop;

import java.util.List;
import com.acme.core.*;

/** Order aggregate. */
public abstract class Order extends Entity implements Comparable<Order>, Auditable {
    private final List<LineItem> items = new ArrayList<>();
    protected Customer customer;
    static int counter = 0;

    public Order(Customer customer) {
        this.customer = customer;
    }

    @Override
    public int compareTo(Order other) {
        return 0;
    }

    public abstract Money total(Currency currency);

    public static class Builder {
        private String note;
        Order build() { return null; }
    }
}
"#;

#[test]
fn test_class_header_and_package() {
    let arena = parse(ORDER);
    assert_eq!(arena.len(), 2);
    let order = class(&arena, "Order");
    assert_eq!(order.package, "com.acme.shop");
    assert_eq!(order.qualified_name(), "com.acme.shop.Order");
    assert_eq!(order.kind, ClassKind::Class);
    assert!(order.flags.is_abstract);
    assert_eq!(order.access, Access::Public);
    assert_eq!(order.line_start, 7);
    assert_eq!(order.imports, vec!["java.util.List", "com.acme.core.*"]);
}

#[test]
fn test_extends_and_implements() {
    let arena = parse(ORDER);
    let order = class(&arena, "Order");
    assert_eq!(targets(order, RelationKind::Extended), vec!["Entity"]);
    assert_eq!(targets(order, RelationKind::Implemented), vec!["Auditable", "Comparable"]);
}

#[test]
fn test_members() {
    let arena = parse(ORDER);
    let order = class(&arena, "Order");

    let fields: Vec<(&str, &str)> = order
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.declared_type.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("items", "List<LineItem>"),
            ("customer", "Customer"),
            ("counter", "int"),
        ]
    );
    assert_eq!(order.fields[0].target_type, "LineItem");
    assert_eq!(order.fields[0].access, Access::Private);
    assert!(order.fields[0].flags.is_const);
    assert_eq!(order.fields[1].access, Access::Protected);
    assert!(order.fields[2].flags.is_static);

    let names: Vec<&str> = order.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Order", "compareTo", "total"]);
    assert_eq!(order.methods[0].kind, MethodKind::Constructor);
    assert!(order.methods[0].return_type.is_none());
    assert!(order.methods[1].flags.is_override);
    assert!(order.methods[2].flags.is_abstract);
    assert_eq!(order.methods[2].return_type.as_deref(), Some("Money"));
}

#[test]
fn test_dependencies_from_members() {
    let arena = parse(ORDER);
    let order = class(&arena, "Order");
    assert_eq!(
        targets(order, RelationKind::Depended),
        vec!["Currency", "Customer", "LineItem", "Money"]
    );
}

#[test]
fn test_nested_class_is_separate_record() {
    let arena = parse(ORDER);
    let order_id = arena
        .iter()
        .find(|(_, r)| r.name == "Order")
        .map(|(id, _)| id)
        .unwrap();
    let builder = class(&arena, "Builder");
    assert_eq!(builder.package, "com.acme.shop.Order");
    assert_eq!(builder.qualified_name(), "com.acme.shop.Order.Builder");
    assert_eq!(builder.parent, Some(order_id));
    assert!(builder.flags.is_static);
    assert_eq!(builder.fields.len(), 1);
    assert_eq!(builder.methods.len(), 1);
    assert_eq!(builder.methods[0].access, Access::Protected);
    assert_eq!(targets(builder, RelationKind::Depended), vec!["Order"]);

    // nested members stay with the nested record
    let order = class(&arena, "Order");
    assert!(order.fields.iter().all(|f| f.name != "note"));
    assert!(order.methods.iter().all(|m| m.name != "build"));
}

#[test]
fn test_interface_methods() {
    let arena = parse(
        r#"package demo;
public interface Shape extends Drawable {
    double area();
    default String label() { return "shape"; }
    static Shape unit() { return null; }
    int SIDES = 0;
}
"#,
    );
    let shape = class(&arena, "Shape");
    assert_eq!(shape.kind, ClassKind::Interface);
    assert!(shape.flags.is_interface);
    assert_eq!(targets(shape, RelationKind::Extended), vec!["Drawable"]);

    let area = &shape.methods[0];
    assert_eq!(area.name, "area");
    assert!(area.flags.is_abstract);
    assert_eq!(area.access, Access::Public);
    assert!(!shape.methods[1].flags.is_abstract);
    assert!(shape.methods[2].flags.is_static);
    assert!(!shape.methods[2].flags.is_abstract);

    let sides = &shape.fields[0];
    assert_eq!(sides.name, "SIDES");
    assert!(sides.flags.is_static && sides.flags.is_const);
    assert_eq!(sides.access, Access::Public);
}

#[test]
fn test_enums_are_skipped() {
    let arena = parse("enum Color { RED, GREEN; Color() {} }\nclass Palette { Color primary; }\n");
    assert_eq!(arena.len(), 1);
    let palette = class(&arena, "Palette");
    assert_eq!(targets(palette, RelationKind::Depended), vec!["Color"]);
}

#[test]
fn test_generic_parameters_are_not_dependencies() {
    let arena = parse(
        "class Repo<T extends Entity> {\n  T find(long id) { return null; }\n  <R> R map(Mapper<T, R> m) { return null; }\n}\n",
    );
    let repo = class(&arena, "Repo");
    assert_eq!(repo.generic_params, vec!["T"]);
    assert_eq!(repo.methods[1].generic_params, vec!["R"]);
    assert_eq!(targets(repo, RelationKind::Depended), vec!["Mapper"]);
}

#[test]
fn test_comments_and_strings_do_not_confuse_extraction() {
    let arena = parse(
        r#"class Greeter {
    // class Fake { }
    /* interface Hidden {} */
    private String greeting = "class NotAClass {";
    void greet(Person p) { System.out.println("}"); }
}
"#,
    );
    assert_eq!(arena.len(), 1);
    let greeter = class(&arena, "Greeter");
    assert_eq!(greeter.fields.len(), 1);
    assert_eq!(greeter.methods.len(), 1);
    assert_eq!(targets(greeter, RelationKind::Depended), vec!["Person"]);
}

#[test]
fn test_varargs_become_arrays() {
    let arena = parse("class Log { void write(String fmt, Object... args) {} }");
    let write = &class(&arena, "Log").methods[0];
    let types: Vec<&str> = write.param_types().collect();
    assert_eq!(types, vec!["String", "Object[]"]);
}

#[test]
fn test_statement_artifact_is_not_a_method() {
    let arena = parse(
        r"class Guard {
    Widget value;
    return (value);
}
",
    );
    let guard = class(&arena, "Guard");
    assert!(guard.methods.iter().all(|m| m.name != "return"));
    assert!(guard.methods.is_empty());
    let names: Vec<&str> = guard.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["value"]);
    assert_eq!(guard.relations.len(), 1);
    assert_eq!(guard.relations[0].target, "Widget");
}
