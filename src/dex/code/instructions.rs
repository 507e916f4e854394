//! Register-based instructions
//!
//! Unlike the raw dex format, there is only one variant per kind of operation: the operand types
//! carried by the registers determine which exact opcode gets chosen during encoding (eg. `add`
//! on two `long` registers is `add-long`). Instructions are generic over the register type so
//! that the same representation is used while building (over [`Local`](super::Local)) and after
//! register assignment (over [`RegisterSpec`](super::RegisterSpec)).

use super::Typed;
use crate::dex::types::TypeId;
use crate::dex::{BaseType, FieldId, MethodId};
use std::fmt;
use std::ops::Not;

/// Constant values that can be loaded into a register or used as a static field initializer
#[derive(Clone, PartialEq, Debug)]
pub enum Constant<'g> {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),

    /// Class literal
    Type(TypeId<'g>),

    Null,
}

impl<'g> Constant<'g> {
    /// Check if a value of this constant fits in a register or field of the given type
    pub fn is_assignable_to(&self, ty: TypeId<'g>) -> bool {
        let expected = match self {
            Constant::Boolean(_) => BaseType::Boolean,
            Constant::Byte(_) => BaseType::Byte,
            Constant::Short(_) => BaseType::Short,
            Constant::Char(_) => BaseType::Char,
            Constant::Int(_) => BaseType::Int,
            Constant::Long(_) => BaseType::Long,
            Constant::Float(_) => BaseType::Float,
            Constant::Double(_) => BaseType::Double,
            Constant::String(_) | Constant::Type(_) | Constant::Null => {
                return ty.is_reference()
            }
        };
        ty.base_type() == Some(expected)
    }

    /// Loading strings and classes may throw (resolution can fail)
    pub fn can_throw(&self) -> bool {
        matches!(self, Constant::String(_) | Constant::Type(_))
    }
}

impl<'g> fmt::Display for Constant<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(b) => write!(f, "{}", b),
            Constant::Byte(b) => write!(f, "{}", b),
            Constant::Short(s) => write!(f, "{}", s),
            Constant::Char(c) => write!(f, "{:#06x}", c),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Long(l) => write!(f, "{}L", l),
            Constant::Float(x) => write!(f, "{}f", x),
            Constant::Double(d) => write!(f, "{}d", d),
            Constant::String(s) => write!(f, "{:?}", s),
            Constant::Type(ty) => write!(f, "{:?}", ty),
            Constant::Null => f.write_str("null"),
        }
    }
}

/// Binary comparison operators available for branches
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Comparison {
    EQ,
    NE,
    LT,
    GE,
    GT,
    LE,
}

impl Comparison {
    /// Whether the comparison also makes sense on references
    pub fn is_equality(self) -> bool {
        matches!(self, Comparison::EQ | Comparison::NE)
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Comparison::EQ => "eq",
            Comparison::NE => "ne",
            Comparison::LT => "lt",
            Comparison::GE => "ge",
            Comparison::GT => "gt",
            Comparison::LE => "le",
        }
    }
}

impl Not for Comparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Comparison::EQ => Comparison::NE,
            Comparison::GE => Comparison::LT,
            Comparison::GT => Comparison::LE,
            Comparison::LE => Comparison::GT,
            Comparison::LT => Comparison::GE,
            Comparison::NE => Comparison::EQ,
        }
    }
}

/// Comparison modes for floating point
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CompareMode {
    /// -1 on NaN
    L,

    /// 1 on NaN
    G,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    /// Check if the operator applies to values of this type
    pub fn accepts(self, base_type: BaseType) -> bool {
        match self {
            UnaryOp::Not => matches!(base_type, BaseType::Int | BaseType::Long),
            UnaryOp::Negate => matches!(
                base_type,
                BaseType::Int | BaseType::Long | BaseType::Float | BaseType::Double
            ),
        }
    }
}

/// Possible bit shifts
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ShiftType {
    Left,
    LogicalRight,
    ArithmeticRight,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    And,
    Or,
    Xor,
    Shift(ShiftType),
}

impl BinaryOp {
    /// Check if the operator applies to values of this type
    pub fn accepts(self, base_type: BaseType) -> bool {
        match self {
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Remainder => matches!(
                base_type,
                BaseType::Int | BaseType::Long | BaseType::Float | BaseType::Double
            ),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Shift(_) => {
                matches!(base_type, BaseType::Int | BaseType::Long)
            }
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::Divide => "div",
            BinaryOp::Remainder => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shift(ShiftType::Left) => "shl",
            BinaryOp::Shift(ShiftType::ArithmeticRight) => "shr",
            BinaryOp::Shift(ShiftType::LogicalRight) => "ushr",
        }
    }
}

/// Type of method to invoke
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InvokeType {
    Static,
    Virtual,

    /// Constructors and private methods
    Direct,

    Super,
    Interface,
}

/// How an instruction affects control flow
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Branchingness {
    /// Execution continues with the next instruction
    None,

    /// Unconditional jump
    Goto,

    /// Conditional jump (or fall through)
    If,

    Return,
    Throw,
}

/// Register-based instruction, parametrized over the register representation
#[derive(Clone, PartialEq, Debug)]
pub enum Instruction<'g, R> {
    /// Copy an incoming argument into its home register
    MoveParameter { dst: R, index: u16 },

    Move { dst: R, src: R },
    Const { dst: R, value: Constant<'g> },
    Unary { op: UnaryOp, dst: R, src: R },
    Binary { op: BinaryOp, dst: R, a: R, b: R },

    /// Conversion between primitive types (eg. `int-to-long`)
    NumericCast { dst: R, src: R },

    CheckCast { dst: R, src: R, class: TypeId<'g> },
    InstanceOf { dst: R, src: R, class: TypeId<'g> },
    CompareLongs { dst: R, a: R, b: R },
    CompareFloatingPoint { mode: CompareMode, dst: R, a: R, b: R },
    InstanceGet { field: FieldId<'g>, dst: R, instance: R },
    InstancePut { field: FieldId<'g>, instance: R, src: R },
    StaticGet { field: FieldId<'g>, dst: R },
    StaticPut { field: FieldId<'g>, src: R },
    NewInstance { dst: R, class: TypeId<'g> },
    Invoke {
        invoke_type: InvokeType,
        method: MethodId<'g>,
        args: Vec<R>,
    },

    /// Retrieve the result of the preceding invoke
    MoveResult { dst: R },

    NewArray { dst: R, length: R },
    ArrayLength { dst: R, array: R },
    ArrayGet { dst: R, array: R, index: R },
    ArrayPut { array: R, index: R, src: R },
    MonitorEnter { object: R },
    MonitorExit { object: R },

    Goto,

    /// Conditional branch, comparing against zero when `b` is absent
    If {
        comparison: Comparison,
        a: R,
        b: Option<R>,
    },

    ReturnVoid,
    Return { value: R },
    Throw { value: R },
}

impl<'g, R> Instruction<'g, R> {
    pub fn branchingness(&self) -> Branchingness {
        match self {
            Instruction::Goto => Branchingness::Goto,
            Instruction::If { .. } => Branchingness::If,
            Instruction::ReturnVoid | Instruction::Return { .. } => Branchingness::Return,
            Instruction::Throw { .. } => Branchingness::Throw,
            _ => Branchingness::None,
        }
    }

    /// Registers read or written by the instruction
    pub fn operands(&self) -> Vec<&R> {
        use Instruction::*;
        match self {
            Goto | ReturnVoid => vec![],
            MoveParameter { dst, .. }
            | Const { dst, .. }
            | StaticGet { dst, .. }
            | NewInstance { dst, .. }
            | MoveResult { dst } => vec![dst],
            StaticPut { src, .. } => vec![src],
            MonitorEnter { object } | MonitorExit { object } => vec![object],
            Return { value } | Throw { value } => vec![value],
            Move { dst, src }
            | Unary { dst, src, .. }
            | NumericCast { dst, src }
            | CheckCast { dst, src, .. }
            | InstanceOf { dst, src, .. } => vec![dst, src],
            Binary { dst, a, b, .. }
            | CompareLongs { dst, a, b }
            | CompareFloatingPoint { dst, a, b, .. } => vec![dst, a, b],
            InstanceGet { dst, instance, .. } => vec![dst, instance],
            InstancePut { instance, src, .. } => vec![instance, src],
            Invoke { args, .. } => args.iter().collect(),
            NewArray { dst, length } => vec![dst, length],
            ArrayLength { dst, array } => vec![dst, array],
            ArrayGet { dst, array, index } => vec![dst, array, index],
            ArrayPut { array, index, src } => vec![array, index, src],
            If { a, b, .. } => {
                let mut operands = vec![a];
                operands.extend(b.iter());
                operands
            }
        }
    }

    /// Translate every register, stopping at the first one that fails to translate
    pub fn map_registers<R2, E>(
        &self,
        map_register: impl Fn(&R) -> Result<R2, E>,
    ) -> Result<Instruction<'g, R2>, E> {
        use Instruction::*;
        let m = &map_register;
        Ok(match self {
            MoveParameter { dst, index } => MoveParameter {
                dst: m(dst)?,
                index: *index,
            },
            Move { dst, src } => Move {
                dst: m(dst)?,
                src: m(src)?,
            },
            Const { dst, value } => Const {
                dst: m(dst)?,
                value: value.clone(),
            },
            Unary { op, dst, src } => Unary {
                op: *op,
                dst: m(dst)?,
                src: m(src)?,
            },
            Binary { op, dst, a, b } => Binary {
                op: *op,
                dst: m(dst)?,
                a: m(a)?,
                b: m(b)?,
            },
            NumericCast { dst, src } => NumericCast {
                dst: m(dst)?,
                src: m(src)?,
            },
            CheckCast { dst, src, class } => CheckCast {
                dst: m(dst)?,
                src: m(src)?,
                class: *class,
            },
            InstanceOf { dst, src, class } => InstanceOf {
                dst: m(dst)?,
                src: m(src)?,
                class: *class,
            },
            CompareLongs { dst, a, b } => CompareLongs {
                dst: m(dst)?,
                a: m(a)?,
                b: m(b)?,
            },
            CompareFloatingPoint { mode, dst, a, b } => CompareFloatingPoint {
                mode: *mode,
                dst: m(dst)?,
                a: m(a)?,
                b: m(b)?,
            },
            InstanceGet {
                field,
                dst,
                instance,
            } => InstanceGet {
                field: field.clone(),
                dst: m(dst)?,
                instance: m(instance)?,
            },
            InstancePut {
                field,
                instance,
                src,
            } => InstancePut {
                field: field.clone(),
                instance: m(instance)?,
                src: m(src)?,
            },
            StaticGet { field, dst } => StaticGet {
                field: field.clone(),
                dst: m(dst)?,
            },
            StaticPut { field, src } => StaticPut {
                field: field.clone(),
                src: m(src)?,
            },
            NewInstance { dst, class } => NewInstance {
                dst: m(dst)?,
                class: *class,
            },
            Invoke {
                invoke_type,
                method,
                args,
            } => Invoke {
                invoke_type: *invoke_type,
                method: method.clone(),
                args: args.iter().map(m).collect::<Result<_, _>>()?,
            },
            MoveResult { dst } => MoveResult { dst: m(dst)? },
            NewArray { dst, length } => NewArray {
                dst: m(dst)?,
                length: m(length)?,
            },
            ArrayLength { dst, array } => ArrayLength {
                dst: m(dst)?,
                array: m(array)?,
            },
            ArrayGet { dst, array, index } => ArrayGet {
                dst: m(dst)?,
                array: m(array)?,
                index: m(index)?,
            },
            ArrayPut { array, index, src } => ArrayPut {
                array: m(array)?,
                index: m(index)?,
                src: m(src)?,
            },
            MonitorEnter { object } => MonitorEnter { object: m(object)? },
            MonitorExit { object } => MonitorExit { object: m(object)? },
            Goto => Goto,
            If { comparison, a, b } => If {
                comparison: *comparison,
                a: m(a)?,
                b: b.as_ref().map(m).transpose()?,
            },
            ReturnVoid => ReturnVoid,
            Return { value } => Return { value: m(value)? },
            Throw { value } => Throw { value: m(value)? },
        })
    }
}

impl<'g, R: Typed<'g>> Instruction<'g, R> {
    /// Whether the instruction may throw an exception (and so ends a block inside of a try)
    pub fn can_throw(&self) -> bool {
        use Instruction::*;
        match self {
            Const { value, .. } => value.can_throw(),
            Binary { op, b, .. } => {
                matches!(op, BinaryOp::Divide | BinaryOp::Remainder)
                    && b.ty().base_type().map_or(false, |b| b.is_integral())
            }
            CheckCast { .. }
            | InstanceOf { .. }
            | InstanceGet { .. }
            | InstancePut { .. }
            | StaticGet { .. }
            | StaticPut { .. }
            | NewInstance { .. }
            | Invoke { .. }
            | NewArray { .. }
            | ArrayLength { .. }
            | ArrayGet { .. }
            | ArrayPut { .. }
            | MonitorEnter { .. }
            | MonitorExit { .. }
            | Throw { .. } => true,
            MoveParameter { .. }
            | Move { .. }
            | Unary { .. }
            | NumericCast { .. }
            | CompareLongs { .. }
            | CompareFloatingPoint { .. }
            | MoveResult { .. }
            | Goto
            | If { .. }
            | ReturnVoid
            | Return { .. } => false,
        }
    }
}

impl<'g, R: fmt::Display> fmt::Display for Instruction<'g, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            MoveParameter { dst, index } => write!(f, "move-param {}, #{}", dst, index),
            Move { dst, src } => write!(f, "move {}, {}", dst, src),
            Const { dst, value } => write!(f, "const {}, {}", dst, value),
            Unary { op, dst, src } => {
                let mnemonic = match op {
                    UnaryOp::Not => "not",
                    UnaryOp::Negate => "neg",
                };
                write!(f, "{} {}, {}", mnemonic, dst, src)
            }
            Binary { op, dst, a, b } => write!(f, "{} {}, {}, {}", op.mnemonic(), dst, a, b),
            NumericCast { dst, src } => write!(f, "convert {}, {}", dst, src),
            CheckCast { dst, src, class } => {
                write!(f, "check-cast {}, {}, {:?}", dst, src, class)
            }
            InstanceOf { dst, src, class } => {
                write!(f, "instance-of {}, {}, {:?}", dst, src, class)
            }
            CompareLongs { dst, a, b } => write!(f, "cmp-long {}, {}, {}", dst, a, b),
            CompareFloatingPoint { mode, dst, a, b } => {
                let mnemonic = match mode {
                    CompareMode::L => "cmpl",
                    CompareMode::G => "cmpg",
                };
                write!(f, "{} {}, {}, {}", mnemonic, dst, a, b)
            }
            InstanceGet {
                field,
                dst,
                instance,
            } => write!(f, "iget {}, {}, {:?}", dst, instance, field),
            InstancePut {
                field,
                instance,
                src,
            } => write!(f, "iput {}, {}, {:?}", src, instance, field),
            StaticGet { field, dst } => write!(f, "sget {}, {:?}", dst, field),
            StaticPut { field, src } => write!(f, "sput {}, {:?}", src, field),
            NewInstance { dst, class } => write!(f, "new-instance {}, {:?}", dst, class),
            Invoke {
                invoke_type,
                method,
                args,
            } => {
                let mnemonic = match invoke_type {
                    InvokeType::Static => "invoke-static",
                    InvokeType::Virtual => "invoke-virtual",
                    InvokeType::Direct => "invoke-direct",
                    InvokeType::Super => "invoke-super",
                    InvokeType::Interface => "invoke-interface",
                };
                write!(f, "{} {{", mnemonic)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "}}, {:?}", method)
            }
            MoveResult { dst } => write!(f, "move-result {}", dst),
            NewArray { dst, length } => write!(f, "new-array {}, {}", dst, length),
            ArrayLength { dst, array } => write!(f, "array-length {}, {}", dst, array),
            ArrayGet { dst, array, index } => write!(f, "aget {}, {}, {}", dst, array, index),
            ArrayPut { array, index, src } => write!(f, "aput {}, {}, {}", src, array, index),
            MonitorEnter { object } => write!(f, "monitor-enter {}", object),
            MonitorExit { object } => write!(f, "monitor-exit {}", object),
            Goto => f.write_str("goto"),
            If {
                comparison,
                a,
                b: Some(b),
            } => write!(f, "if-{} {}, {}", comparison.mnemonic(), a, b),
            If {
                comparison,
                a,
                b: None,
            } => write!(f, "if-{}z {}", comparison.mnemonic(), a),
            ReturnVoid => f.write_str("return-void"),
            Return { value } => write!(f, "return {}", value),
            Throw { value } => write!(f, "throw {}", value),
        }
    }
}
