mod remap;
mod round_trip;

use shade_classfile::access::{PRIVATE, PUBLIC, STATIC, SUPER};
use shade_classfile::{
    Attribute, ClassFile, ClassMember, Code, CodeConstant, Constant, InnerClassInfo, MemberRef,
};

/// A small class touching most places a class name can hide.
pub(crate) fn widget_class() -> ClassFile {
    ClassFile {
        minor_version: 0,
        major_version: 52,
        access_flags: PUBLIC | SUPER,
        this_class: "org/foo/Widget".into(),
        super_class: Some("java/lang/Object".into()),
        interfaces: vec!["org/foo/api/Shape".into()],
        fields: vec![ClassMember {
            access_flags: PRIVATE,
            name: "parts".into(),
            descriptor: "Ljava/util/List;".into(),
            attributes: vec![Attribute::Signature(
                "Ljava/util/List<Lorg/foo/Part;>;".into(),
            )],
        }],
        methods: vec![ClassMember {
            access_flags: PUBLIC | STATIC,
            name: "describe".into(),
            descriptor: "(Lorg/foo/Owner;)Ljava/lang/String;".into(),
            attributes: vec![Attribute::Code(Code {
                max_stack: 1,
                max_locals: 1,
                // ldc #?; invokestatic #?; areturn
                bytecode: vec![0x12, 0x00, 0xb8, 0x00, 0x00, 0xb0],
                constants: vec![
                    CodeConstant {
                        offset: 1,
                        narrow: true,
                        constant: Constant::String("org.foo.Widget".into()),
                    },
                    CodeConstant {
                        offset: 3,
                        narrow: false,
                        constant: Constant::MethodRef(MemberRef {
                            owner: "org/foo/Util".into(),
                            name: "name".into(),
                            descriptor: "(Ljava/lang/String;)Ljava/lang/String;".into(),
                        }),
                    },
                ],
                exception_table: Vec::new(),
                attributes: Vec::new(),
            })],
        }],
        attributes: vec![
            Attribute::SourceFile("Widget.java".into()),
            Attribute::InnerClasses(vec![InnerClassInfo {
                inner_class: "org/foo/Widget$Knob".into(),
                outer_class: Some("org/foo/Widget".into()),
                inner_name: Some("Knob".into()),
                access_flags: PUBLIC | STATIC,
            }]),
        ],
    }
}

pub(crate) fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}
