use crate::attribute::{parse_attributes, write_attributes, Attribute};
use crate::constant_pool::{Constant, ConstantPool, ConstantPoolBuilder};
use crate::error::{Error, Result};
use crate::reader::{Reader, Writer};

/// A method body. The bytecode is kept verbatim except for constant-pool
/// operands: those are lifted into [`Code::constants`], zeroed in
/// [`Code::bytecode`] and patched back in place on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytecode: Vec<u8>,
    pub constants: Vec<CodeConstant>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeConstant {
    /// Offset of the index operand inside the bytecode.
    pub offset: usize,
    /// `true` for the one-byte operand of `ldc`.
    pub narrow: bool,
    pub constant: Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: Option<String>,
}

impl Code {
    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()? as usize;
        let mut bytecode = reader.read_bytes(code_length)?.to_vec();

        let mut constants = Vec::new();
        for (offset, narrow) in constant_operands(&bytecode)? {
            let index = if narrow {
                std::mem::take(&mut bytecode[offset]) as u16
            } else {
                let wide = u16::from_be_bytes([bytecode[offset], bytecode[offset + 1]]);
                bytecode[offset..offset + 2].fill(0);
                wide
            };
            constants.push(CodeConstant {
                offset,
                narrow,
                constant: cp.constant(index)?,
            });
        }

        let handlers = reader.read_u2()? as usize;
        let mut exception_table = Vec::with_capacity(handlers);
        for _ in 0..handlers {
            exception_table.push(ExceptionHandler {
                start_pc: reader.read_u2()?,
                end_pc: reader.read_u2()?,
                handler_pc: reader.read_u2()?,
                catch_type: cp.get_optional_class_name(reader.read_u2()?)?,
            });
        }

        let attributes = parse_attributes(reader, cp)?;
        Ok(Self {
            max_stack,
            max_locals,
            bytecode,
            constants,
            exception_table,
            attributes,
        })
    }

    pub(crate) fn write(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        out.u2(self.max_stack);
        out.u2(self.max_locals);

        let mut code = self.bytecode.clone();
        for operand in &self.constants {
            let index = pool.constant(&operand.constant)?;
            if operand.narrow {
                code[operand.offset] =
                    u8::try_from(index).map_err(|_| Error::Other("ldc operand above index 255"))?;
            } else {
                code[operand.offset..operand.offset + 2].copy_from_slice(&index.to_be_bytes());
            }
        }
        out.u4(code.len() as u32);
        out.bytes(&code);

        out.count(self.exception_table.len(), "exception_table")?;
        for handler in &self.exception_table {
            out.u2(handler.start_pc);
            out.u2(handler.end_pc);
            out.u2(handler.handler_pc);
            out.u2(pool.optional_class(handler.catch_type.as_deref())?);
        }
        write_attributes(&self.attributes, out, pool)
    }

    /// Constants loaded through the one-byte `ldc` form.
    pub(crate) fn narrow_constants(&self) -> impl Iterator<Item = &Constant> {
        self.constants
            .iter()
            .filter(|c| c.narrow)
            .map(|c| &c.constant)
    }
}

/// Returns `(operand offset, is_narrow)` for every instruction that indexes the constant pool.
fn constant_operands(code: &[u8]) -> Result<Vec<(usize, bool)>> {
    let mut operands = Vec::new();
    let mut pc = 0usize;
    let read_i32 = |at: usize| -> Result<i32> {
        code.get(at..at + 4)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or(Error::MalformedAttribute("Code"))
    };

    while pc < code.len() {
        let opcode = code[pc];
        let len = match opcode {
            0x12 => {
                operands.push((pc + 1, true));
                2
            }
            0x13 | 0x14 | 0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1 => {
                operands.push((pc + 1, false));
                3
            }
            0xb9 | 0xba => {
                operands.push((pc + 1, false));
                5
            }
            0xc5 => {
                operands.push((pc + 1, false));
                4
            }
            0x00..=0x0f | 0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 | 0xac..=0xb1 => 1,
            0xbe | 0xbf | 0xc2 | 0xc3 => 1,
            0x10 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 2,
            0x11 | 0x84 | 0x99..=0xa8 | 0xc6 | 0xc7 => 3,
            0xc8 | 0xc9 => 5,
            0xc4 => match code.get(pc + 1) {
                Some(0x84) => 6,
                Some(_) => 4,
                None => return Err(Error::MalformedAttribute("Code")),
            },
            0xaa => {
                let base = pc + 1 + (3 - pc % 4);
                let low = read_i32(base + 4)?;
                let high = read_i32(base + 8)?;
                let entries = (high as i64 - low as i64 + 1).max(0) as usize;
                base + 12 + entries * 4 - pc
            }
            0xab => {
                let base = pc + 1 + (3 - pc % 4);
                let pairs = read_i32(base + 4)?.max(0) as usize;
                base + 8 + pairs * 8 - pc
            }
            _ => return Err(Error::InvalidOpcode { offset: pc, opcode }),
        };
        pc += len;
    }
    if pc != code.len() {
        return Err(Error::MalformedAttribute("Code"));
    }
    Ok(operands)
}

/// `StackMapTable` kept as raw frames with the positions of its `Object_variable_info`
/// class indices, which are zeroed in `data` until written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMapTable {
    pub data: Vec<u8>,
    pub classes: Vec<(usize, String)>,
}

impl StackMapTable {
    pub(crate) fn parse(info: &[u8], cp: &ConstantPool) -> Result<Self> {
        let mut reader = Reader::new(info);
        let mut classes = Vec::new();
        let mut verification_types = |reader: &mut Reader<'_>, count: usize| -> Result<()> {
            for _ in 0..count {
                match reader.read_u1()? {
                    0..=6 => {}
                    7 => {
                        let offset = reader.offset();
                        let index = reader.read_u2()?;
                        classes.push((offset, cp.get_class_name(index)?));
                    }
                    8 => reader.skip(2)?,
                    _ => return Err(Error::MalformedAttribute("StackMapTable")),
                }
            }
            Ok(())
        };

        let frames = reader.read_u2()?;
        for _ in 0..frames {
            let frame_type = reader.read_u1()?;
            match frame_type {
                0..=63 => {}
                64..=127 => verification_types(&mut reader, 1)?,
                247 => {
                    reader.skip(2)?;
                    verification_types(&mut reader, 1)?;
                }
                248..=251 => reader.skip(2)?,
                252..=254 => {
                    reader.skip(2)?;
                    verification_types(&mut reader, (frame_type - 251) as usize)?;
                }
                255 => {
                    reader.skip(2)?;
                    let locals = reader.read_u2()? as usize;
                    verification_types(&mut reader, locals)?;
                    let stack = reader.read_u2()? as usize;
                    verification_types(&mut reader, stack)?;
                }
                _ => return Err(Error::MalformedAttribute("StackMapTable")),
            }
        }
        reader.ensure_empty("StackMapTable")?;
        let mut data = info.to_vec();
        for (offset, _) in &classes {
            data[*offset..*offset + 2].fill(0);
        }
        Ok(Self { data, classes })
    }

    pub(crate) fn write(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        let mut data = self.data.clone();
        for (offset, class) in &self.classes {
            let index = pool.class(class)?;
            data[*offset..*offset + 2].copy_from_slice(&index.to_be_bytes());
        }
        out.bytes(&data);
        Ok(())
    }
}
