//! Pointer chain resolution
//!
//! A `DeepPointer` is a base-module-relative offset chain. When resolving,
//! each offset EXCEPT the last is added and then dereferenced with a
//! pointer-sized read; the last offset is just added to produce the final
//! address, where the typed payload lives.

use super::ProcessContext;
use crate::error::ReadError;

/// Decoded type of the value at the end of a pointer chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Single byte, non-zero = true
    Bool,
    /// Little-endian 32-bit signed integer
    I32,
    /// Little-endian IEEE-754 single
    F32,
}

/// A value decoded at the end of a pointer chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    I32(i32),
    F32(f32),
}

impl TypedValue {
    /// The boolean payload, if this is a boolean signal
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer signal
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TypedValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a float signal
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            TypedValue::F32(v) => Some(*v),
            _ => None,
        }
    }
}

/// An immutable typed memory location in the target process
///
/// Defined once at engine construction; resolution happens fresh on every
/// read, so relocated intermediate pointers are picked up per tick.
#[derive(Debug, Clone)]
pub struct DeepPointer {
    module: &'static str,
    offsets: Vec<i64>,
    kind: ValueKind,
}

impl DeepPointer {
    /// Create a new pointer chain rooted at `module`'s base address
    pub fn new(module: &'static str, offsets: &[i64], kind: ValueKind) -> Self {
        Self {
            module,
            offsets: offsets.to_vec(),
            kind,
        }
    }

    /// The base module this chain resolves against
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// The decoded type of the destination value
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Resolve the chain to the destination address
    ///
    /// Intermediate dereferences use the process's pointer width. A null
    /// intermediate pointer is reported as `InvalidAddress` since following
    /// it would leave mapped memory.
    pub fn resolve_address(&self, ctx: &ProcessContext) -> Result<usize, ReadError> {
        if !self.module.eq_ignore_ascii_case(&ctx.module_name) {
            return Err(ReadError::ModuleNotFound);
        }

        let mut ptr = ctx.base_address as i64;
        for (i, &offset) in self.offsets.iter().enumerate() {
            let address = ptr + offset;

            if i + 1 < self.offsets.len() {
                ptr = ctx.read_ptr(address as usize)?;
                if ptr == 0 {
                    return Err(ReadError::InvalidAddress);
                }
            } else {
                ptr = address;
            }
        }

        Ok(ptr as usize)
    }

    /// Resolve and read the typed payload at the destination
    pub fn read(&self, ctx: &ProcessContext) -> Result<TypedValue, ReadError> {
        let address = self.resolve_address(ctx)?;
        match self.kind {
            ValueKind::Bool => ctx.reader.read_bool(address).map(TypedValue::Bool),
            ValueKind::I32 => ctx.reader.read_i32(address).map(TypedValue::I32),
            ValueKind::F32 => ctx.reader.read_f32(address).map(TypedValue::F32),
        }
    }
}
