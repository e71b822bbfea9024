//! SSA values referenced as instruction operands.

use std::fmt;
use std::rc::Rc;

use nvgpu_dtype::DType;

use crate::types::Type;

/// Constant payload of a value defined by a constant instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl ConstValue {
    /// Integer view of the constant; booleans count as 0/1, floats do not match.
    pub const fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => Some(v as i64),
            Self::Bool(v) => Some(v as i64),
            Self::Float(_) => None,
        }
    }
}

/// How a value came to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDef {
    /// Result of a constant instruction.
    Constant(ConstValue),
    /// Block or function argument.
    Argument,
    /// Result of some other instruction.
    Result,
}

/// An SSA value: name, type and definition.
///
/// Instructions hold operands as `Rc<Value>`; the same value may feed several
/// operands of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    name: String,
    ty: Type,
    def: ValueDef,
}

impl Value {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>, def: ValueDef) -> Rc<Self> {
        Rc::new(Self { name: name.into(), ty: ty.into(), def })
    }

    pub fn argument(name: impl Into<String>, ty: impl Into<Type>) -> Rc<Self> {
        Self::new(name, ty, ValueDef::Argument)
    }

    pub fn result(name: impl Into<String>, ty: impl Into<Type>) -> Rc<Self> {
        Self::new(name, ty, ValueDef::Result)
    }

    pub fn constant(name: impl Into<String>, dtype: DType, value: ConstValue) -> Rc<Self> {
        Self::new(name, Type::Scalar(dtype), ValueDef::Constant(value))
    }

    /// Name without the leading `%`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn def(&self) -> &ValueDef {
        &self.def
    }

    /// Statically known integer value, if the value is an integer or boolean constant.
    pub fn try_constant_int(&self) -> Option<i64> {
        match &self.def {
            ValueDef::Constant(value) => value.as_int(),
            ValueDef::Argument | ValueDef::Result => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name)
    }
}
