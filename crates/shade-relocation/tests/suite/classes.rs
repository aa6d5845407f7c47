use pretty_assertions::assert_eq;
use shade_classfile::{ClassFile, ConstValue, ElementValue};
use shade_relocation::{relocate_class, RelocatorSet, SimpleRelocator};
use shade_test_utils::ClassBuilder;

fn relocators() -> RelocatorSet {
    RelocatorSet::new().with(SimpleRelocator::new("org.foo", Some("shaded.org.foo")))
}

fn widget() -> ClassBuilder {
    ClassBuilder::new("org/foo/Widget")
        .implements("org/foo/api/Shape")
        .field("owner", "Lorg/foo/Owner;")
        .calls("init", "org/foo/Util")
        .string_constant("name", "org.foo.Widget")
        .source_file("Widget.java")
}

#[test]
fn class_names_and_string_literals_are_relocated() {
    let relocated = relocate_class("org/foo/Widget.class", &widget().to_bytes(), &relocators()).unwrap();
    assert!(relocated.changed);

    let class = ClassFile::parse(&relocated.bytes).unwrap();
    assert_eq!(class.this_class, "shaded/org/foo/Widget");
    assert_eq!(class.interfaces, vec!["shaded/org/foo/api/Shape".to_string()]);
    assert_eq!(class.fields[0].descriptor, "Lshaded/org/foo/Owner;");
    assert_eq!(class.source_file(), Some("Widget.java"));

    let referenced = class.referenced_classes();
    assert!(referenced.contains("shaded/org/foo/Util"));
    assert!(!referenced.iter().any(|name| name.starts_with("org/foo/")));

    let text = String::from_utf8_lossy(&relocated.bytes);
    assert!(text.contains("shaded.org.foo.Widget"));
    assert!(!text.contains("Lorg/foo/"));
}

#[test]
fn relocating_twice_is_a_no_op() {
    let relocators = relocators();
    let once = relocate_class("org/foo/Widget.class", &widget().to_bytes(), &relocators).unwrap();
    let twice = relocate_class("shaded/org/foo/Widget.class", &once.bytes, &relocators).unwrap();

    assert!(!twice.changed);
    assert_eq!(
        ClassFile::parse(&twice.bytes).unwrap(),
        ClassFile::parse(&once.bytes).unwrap()
    );
}

#[test]
fn unrelated_classes_report_no_change() {
    let class = ClassBuilder::new("com/acme/Main").calls("main", "com/acme/Helper");
    let relocated = relocate_class("com/acme/Main.class", &class.to_bytes(), &relocators()).unwrap();
    assert!(!relocated.changed);
}

#[test]
fn excluded_classes_keep_their_names() {
    let relocators = RelocatorSet::new().with(
        SimpleRelocator::new("org.foo", Some("shaded.org.foo"))
            .exclude("org.foo.api.*")
            .unwrap(),
    );
    let relocated = relocate_class("org/foo/Widget.class", &widget().to_bytes(), &relocators).unwrap();
    let class = ClassFile::parse(&relocated.bytes).unwrap();
    assert_eq!(class.this_class, "shaded/org/foo/Widget");
    assert_eq!(class.interfaces, vec!["org/foo/api/Shape".to_string()]);
}

#[test]
fn malformed_classes_name_the_entry() {
    let err = relocate_class("org/foo/Broken.class", b"\xCA\xFE\xBA\xBE\x00", &relocators()).unwrap_err();
    assert!(err.to_string().contains("org/foo/Broken.class"), "{err}");
}

#[test]
fn kotlin_metadata_string_table_is_relocated() {
    let class = ClassBuilder::new("org/foo/Box")
        .signature("<T:Ljava/lang/Object;>Lorg/foo/Base<TT;>;")
        .kotlin_metadata(&["(Lorg/foo/Bar;)Lorg/foo/Baz;", "Lorg/foo/Bar;", "org/foo/Bar", "name"]);
    let relocated = relocate_class("org/foo/Box.class", &class.to_bytes(), &relocators()).unwrap();

    let class = ClassFile::parse(&relocated.bytes).unwrap();
    assert_eq!(
        class.signature(),
        Some("<T:Ljava/lang/Object;>Lshaded/org/foo/Base<TT;>;")
    );

    let metadata = class
        .runtime_visible_annotations()
        .find(|a| a.type_descriptor == "Lkotlin/Metadata;")
        .unwrap();
    let (_, ElementValue::Array(values)) = metadata
        .elements
        .iter()
        .find(|(name, _)| name == "d2")
        .unwrap()
    else {
        panic!("d2 should be an array");
    };
    let d2: Vec<&str> = values
        .iter()
        .map(|value| match value {
            ElementValue::Const(ConstValue::String(s)) => s.as_str().unwrap(),
            other => panic!("unexpected d2 element {other:?}"),
        })
        .collect();
    assert_eq!(
        d2,
        vec![
            "(Lshaded/org/foo/Bar;)Lshaded/org/foo/Baz;",
            "Lshaded/org/foo/Bar;",
            "shaded/org/foo/Bar",
            "name",
        ]
    );
}
