use classgraph_core::model::{Access, ClassArena, ClassKind, ClassRecord, MethodKind, RelationKind};
use classgraph_parser::{Language, TypeFilter, parse_source};
use std::path::Path;

fn parse(source: &str) -> ClassArena {
    parse_source(Path::new("test.hpp"), source, Language::Cpp, &TypeFilter::builtin())
}

fn class<'a>(arena: &'a ClassArena, name: &str) -> &'a ClassRecord {
    arena
        .records()
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn relations(record: &ClassRecord) -> Vec<(&str, RelationKind)> {
    record
        .relations
        .iter()
        .map(|r| (r.target.as_str(), r.kind))
        .collect()
}

#[test]
fn test_derived_base_other() {
    let arena = parse("class Derived : public Base { Base* ptr; void f(Other o); };");
    assert_eq!(arena.len(), 1);
    let derived = class(&arena, "Derived");
    assert_eq!(
        relations(derived),
        vec![("Base", RelationKind::Extended), ("Other", RelationKind::Depended)]
    );
    assert_eq!(derived.fields[0].name, "ptr");
    assert_eq!(derived.fields[0].declared_type, "Base*");
    assert_eq!(derived.fields[0].target_type, "Base");
    assert_eq!(derived.fields[0].access, Access::Private);
    assert_eq!(derived.methods[0].name, "f");
}

const SHAPES: &str = r#"#include <vector>
#include <memory>

namespace geo {
namespace shapes {

template <typename T>
struct Point {
    T x, y;
};

class Shape {
public:
    virtual ~Shape() = default;
    virtual double area() const = 0;
    static int count;
protected:
    std::vector<std::shared_ptr<Point<double>>> vertices;
private:
    Style* style_;
};

} // namespace shapes
}
"#;

#[test]
fn test_namespaces_qualify_classes() {
    let arena = parse(SHAPES);
    let shape = class(&arena, "Shape");
    assert_eq!(shape.package, "geo::shapes");
    assert_eq!(shape.qualified_name(), "geo::shapes::Shape");
    assert_eq!(class(&arena, "Point").qualified_name(), "geo::shapes::Point");
}

#[test]
fn test_template_struct() {
    let arena = parse(SHAPES);
    let point = class(&arena, "Point");
    assert_eq!(point.kind, ClassKind::Struct);
    assert_eq!(point.generic_params, vec!["T"]);
    let names: Vec<&str> = point.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert!(point.fields.iter().all(|f| f.access == Access::Public));
    assert!(point.relations.is_empty());
}

#[test]
fn test_access_labels_and_pure_virtuals() {
    let arena = parse(SHAPES);
    let shape = class(&arena, "Shape");
    assert!(shape.flags.is_abstract);

    let dtor = &shape.methods[0];
    assert_eq!(dtor.name, "~Shape");
    assert_eq!(dtor.kind, MethodKind::Destructor);
    assert_eq!(dtor.access, Access::Public);

    let area = &shape.methods[1];
    assert!(area.flags.is_abstract && area.flags.is_virtual && area.flags.is_const);
    assert_eq!(area.return_type.as_deref(), Some("double"));

    let access: Vec<(&str, Access)> = shape
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.access))
        .collect();
    assert_eq!(
        access,
        vec![
            ("count", Access::Public),
            ("vertices", Access::Protected),
            ("style_", Access::Private),
        ]
    );
    assert!(shape.fields[0].flags.is_static);
    assert_eq!(shape.fields[1].target_type, "Point");
}

#[test]
fn test_container_and_pointer_dependencies() {
    let arena = parse(SHAPES);
    let shape = class(&arena, "Shape");
    let mut deps: Vec<&str> = shape.relations.iter().map(|r| r.target.as_str()).collect();
    deps.sort_unstable();
    assert_eq!(deps, vec!["Point", "Style"]);
}

#[test]
fn test_operators_and_multi_declarators() {
    let arena = parse(
        r#"class Vec2 {
public:
    Vec2 operator+(const Vec2& o) const;
    bool operator==(const Vec2& o) const = default;
    explicit operator bool() const;
    friend std::ostream& operator<<(std::ostream& os, const Vec2& v);
private:
    float x_ = 0.0f, y_ = 0.0f;
};
"#,
    );
    let vec2 = class(&arena, "Vec2");
    let names: Vec<&str> = vec2.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["operator+", "operator==", "operator bool"]);
    assert_eq!(vec2.methods[0].return_type.as_deref(), Some("Vec2"));
    assert_eq!(vec2.methods[2].return_type.as_deref(), Some("bool"));
    let fields: Vec<&str> = vec2.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["x_", "y_"]);
    assert!(vec2.relations.is_empty());
}

#[test]
fn test_skips_forward_declarations_and_enums() {
    let arena = parse(
        r#"class Forward;
enum class Mode { Fast, Slow };
struct Config {
    Mode mode{Mode::Fast};
    int retries = 3;
};
"#,
    );
    assert_eq!(arena.len(), 1);
    let config = class(&arena, "Config");
    let names: Vec<&str> = config.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["mode", "retries"]);
    assert_eq!(relations(config), vec![("Mode", RelationKind::Depended)]);
}

#[test]
fn test_constructor_initializer_lists() {
    let arena = parse(
        r#"class Engine : public Component, private Noncopyable {
public:
    Engine(Fuel* fuel) : Component("engine"), fuel_{fuel} {}
    Engine(const Engine&) = delete;
private:
    Fuel* fuel_;
};
"#,
    );
    let engine = class(&arena, "Engine");
    assert_eq!(
        relations(engine),
        vec![
            ("Component", RelationKind::Extended),
            ("Noncopyable", RelationKind::Extended),
            ("Fuel", RelationKind::Depended),
        ]
    );
    assert_eq!(engine.methods.len(), 2);
    assert!(engine.methods.iter().all(|m| m.kind == MethodKind::Constructor));
    assert_eq!(engine.fields.len(), 1);
}

#[test]
fn test_nested_struct_in_class() {
    let arena = parse(
        r#"namespace net {
class Client {
public:
    struct Options { int timeout; };
    explicit Client(Options opts);
private:
    Options opts_;
};
}
"#,
    );
    let options = class(&arena, "Options");
    assert_eq!(options.package, "net::Client");
    assert_eq!(options.access, Access::Public);
    let client = class(&arena, "Client");
    assert_eq!(client.fields.len(), 1);
    assert_eq!(client.methods[0].kind, MethodKind::Constructor);
    assert_eq!(relations(client), vec![("Options", RelationKind::Depended)]);
}

#[test]
fn test_statement_artifact_is_not_a_method() {
    let arena = parse(
        r"class Guard {
    Widget value;
    return (value);
};
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
