use pretty_assertions::assert_eq;
use shade_classfile::{remap_class, Attribute, ClassFile, Constant, Remapper};

use super::{count, widget_class};

struct ShadeFoo;

impl Remapper for ShadeFoo {
    fn map(&mut self, internal_name: &str) -> String {
        if internal_name.starts_with("org/foo/") {
            format!("shaded/{internal_name}")
        } else {
            internal_name.to_string()
        }
    }

    fn map_value(&mut self, value: &str) -> String {
        if value.starts_with("org.foo.") {
            format!("shaded.{value}")
        } else {
            value.to_string()
        }
    }
}

#[test]
fn remaps_structure_descriptors_signatures_and_code() {
    let bytes = widget_class().to_bytes().unwrap();
    let remapped = remap_class(&bytes, &mut ShadeFoo).unwrap();
    let class = ClassFile::parse(&remapped).unwrap();

    assert_eq!(class.this_class, "shaded/org/foo/Widget");
    assert_eq!(class.interfaces, vec!["shaded/org/foo/api/Shape".to_string()]);
    assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(
        class.fields[0].signature(),
        Some("Ljava/util/List<Lshaded/org/foo/Part;>;")
    );
    assert_eq!(
        class.methods[0].descriptor,
        "(Lshaded/org/foo/Owner;)Ljava/lang/String;"
    );
    assert_eq!(class.source_file(), Some("Widget.java"));
    assert_eq!(class.inner_classes()[0].inner_class, "shaded/org/foo/Widget$Knob");
    assert_eq!(class.inner_classes()[0].inner_name.as_deref(), Some("Knob"));

    let Attribute::Code(code) = &class.methods[0].attributes[0] else {
        panic!("expected Code attribute");
    };
    assert_eq!(
        code.constants[0].constant,
        Constant::String("shaded.org.foo.Widget".into())
    );
    let Constant::MethodRef(method) = &code.constants[1].constant else {
        panic!("expected method ref");
    };
    assert_eq!(method.owner, "shaded/org/foo/Util");
}

#[test]
fn output_pool_has_no_stale_names() {
    let bytes = widget_class().to_bytes().unwrap();
    let remapped = remap_class(&bytes, &mut ShadeFoo).unwrap();
    assert!(count(&bytes, b"org/foo/") > 0);
    assert_eq!(
        count(&remapped, b"org/foo/"),
        count(&remapped, b"shaded/org/foo/")
    );
}

#[test]
fn unparsable_signature_is_kept_verbatim() {
    let mut class = widget_class();
    class.fields[0].attributes = vec![Attribute::Signature("Lorg/foo/List<>;".into())];
    class.remap(&mut ShadeFoo);
    assert_eq!(class.fields[0].signature(), Some("Lorg/foo/List<>;"));
    assert_eq!(class.this_class, "shaded/org/foo/Widget");
}

#[test]
fn collects_referenced_classes() {
    let refs = widget_class().referenced_classes();
    let expected = [
        "java/lang/Object",
        "java/lang/String",
        "java/util/List",
        "org/foo/Owner",
        "org/foo/Part",
        "org/foo/Util",
        "org/foo/Widget$Knob",
        "org/foo/api/Shape",
    ];
    assert_eq!(
        refs.into_iter().collect::<Vec<_>>(),
        expected.iter().map(|s| s.to_string()).collect::<Vec<_>>()
    );
}
