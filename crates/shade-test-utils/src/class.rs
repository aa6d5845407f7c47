use shade_classfile::access::{PUBLIC, STATIC, SUPER};
use shade_classfile::{
    Annotation, Attribute, ClassFile, ClassMember, Code, CodeConstant, ConstValue, Constant,
    ElementValue, MemberRef,
};

/// Builds minimal class files that reference other classes in the usual places.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    class: ClassFile,
}

impl ClassBuilder {
    /// A public class extending `java/lang/Object`. `name` is an internal name.
    pub fn new(name: &str) -> Self {
        Self {
            class: ClassFile {
                minor_version: 0,
                major_version: 52,
                access_flags: PUBLIC | SUPER,
                this_class: name.to_string(),
                super_class: Some("java/lang/Object".to_string()),
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.class.super_class = Some(super_class.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.class.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.class.fields.push(ClassMember {
            access_flags: PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        });
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.class.attributes.push(Attribute::SourceFile(name.to_string()));
        self
    }

    /// Adds `static void <name>()` calling `owner.run()V`.
    pub fn calls(mut self, method: &str, owner: &str) -> Self {
        // invokestatic #0; return
        let code = code(
            vec![0xb8, 0x00, 0x00, 0xb1],
            vec![CodeConstant {
                offset: 1,
                narrow: false,
                constant: Constant::MethodRef(MemberRef {
                    owner: owner.to_string(),
                    name: "run".to_string(),
                    descriptor: "()V".to_string(),
                }),
            }],
        );
        self.class.methods.push(static_method(method, "()V", code));
        self
    }

    /// Adds `static Object <name>()` returning the string literal `value`.
    pub fn string_constant(mut self, method: &str, value: &str) -> Self {
        // ldc #0; areturn
        let code = code(
            vec![0x12, 0x00, 0xb0],
            vec![CodeConstant {
                offset: 1,
                narrow: true,
                constant: Constant::String(value.into()),
            }],
        );
        self.class
            .methods
            .push(static_method(method, "()Ljava/lang/Object;", code));
        self
    }

    /// Adds a generic `Signature` attribute to the class.
    pub fn signature(mut self, signature: &str) -> Self {
        self.class.attributes.push(Attribute::Signature(signature.to_string()));
        self
    }

    /// Adds a `@kotlin.Metadata` annotation whose `d2` string table is `d2`.
    pub fn kotlin_metadata(mut self, d2: &[&str]) -> Self {
        let strings = d2
            .iter()
            .map(|s| ElementValue::Const(ConstValue::String((*s).into())))
            .collect();
        let annotation = Annotation {
            type_descriptor: "Lkotlin/Metadata;".to_string(),
            elements: vec![
                ("k".to_string(), ElementValue::Const(ConstValue::Int(1))),
                ("d2".to_string(), ElementValue::Array(strings)),
            ],
        };
        self.class
            .attributes
            .push(Attribute::RuntimeVisibleAnnotations(vec![annotation]));
        self
    }

    pub fn name(&self) -> &str {
        &self.class.this_class
    }

    pub fn build(self) -> ClassFile {
        self.class
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.class
            .to_bytes()
            .expect("test class should serialize")
    }
}

fn code(bytecode: Vec<u8>, constants: Vec<CodeConstant>) -> Code {
    Code {
        max_stack: 1,
        max_locals: 0,
        bytecode,
        constants,
        exception_table: Vec::new(),
        attributes: Vec::new(),
    }
}

fn static_method(name: &str, descriptor: &str, code: Code) -> ClassMember {
    ClassMember {
        access_flags: PUBLIC | STATIC,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        attributes: vec![Attribute::Code(code)],
    }
}
