use pretty_assertions::assert_eq;
use shade_classfile::{Attribute, ClassFile, Code, CodeConstant, Constant, JavaString};

use super::widget_class;

#[test]
fn written_class_parses_back_identically() {
    let class = widget_class();
    let bytes = class.to_bytes().unwrap();
    assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(ClassFile::parse(&bytes).unwrap(), class);
}

#[test]
fn rewriting_is_stable() {
    let first = widget_class().to_bytes().unwrap();
    let second = ClassFile::parse(&first).unwrap().to_bytes().unwrap();
    assert_eq!(first, second);
}

#[test]
fn narrow_ldc_operands_stay_addressable_in_large_pools() {
    let mut bytecode = Vec::new();
    let mut constants = Vec::new();
    for i in 0..300 {
        constants.push(CodeConstant {
            offset: bytecode.len() + 1,
            narrow: false,
            constant: Constant::String(JavaString::from(format!("value-{i}"))),
        });
        bytecode.extend_from_slice(&[0x13, 0x00, 0x00, 0x57]); // ldc_w; pop
    }
    constants.push(CodeConstant {
        offset: bytecode.len() + 1,
        narrow: true,
        constant: Constant::String("last".into()),
    });
    bytecode.extend_from_slice(&[0x12, 0x00, 0x57, 0xb1]); // ldc; pop; return

    let mut class = widget_class();
    class.methods[0].attributes = vec![Attribute::Code(Code {
        max_stack: 1,
        max_locals: 1,
        bytecode,
        constants,
        exception_table: Vec::new(),
        attributes: Vec::new(),
    })];

    let bytes = class.to_bytes().unwrap();
    let parsed = ClassFile::parse(&bytes).unwrap();
    assert_eq!(parsed, class);
}

#[test]
fn rejects_bad_magic_and_truncation() {
    assert!(ClassFile::parse(&[0, 1, 2, 3]).is_err());
    let bytes = widget_class().to_bytes().unwrap();
    assert!(ClassFile::parse(&bytes[..bytes.len() - 3]).is_err());
}
