//! Common types used throughout the compiler
//!
//! This module defines data types that are shared across multiple
//! compiler phases: type tags, virtual registers and their allocator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual register identifier
///
/// Names an IR operand before code generation and a stack slot after the
/// enclosing function's frame has been laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VReg(pub u32);

impl VReg {
    pub fn new(id: u32) -> Self {
        VReg(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Virtual register generator for one compilation run
///
/// Identifiers are strictly increasing and never handed out twice. There is
/// no release: every register ends up with its own stack slot anyway.
#[derive(Debug, Clone, Default)]
pub struct VRegAllocator {
    next_id: u32,
}

impl VRegAllocator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a fresh virtual register
    pub fn allocate(&mut self) -> VReg {
        let reg = VReg(self.next_id);
        self.next_id += 1;
        reg
    }

    /// Number of registers handed out so far
    pub fn allocated(&self) -> u32 {
        self.next_id
    }

    /// Start over for an independent compilation
    pub fn reset(&mut self) {
        self.next_id = 0;
    }
}

/// Type tags attached to symbols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    Void,
    Nil,
    /// Struct type, by declared name
    Struct(String),
    Pointer(Box<Type>),
    Function,
    Unknown,
}

impl Type {
    /// Short tag name ("int", "bool", "struct", ...)
    pub fn name(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Void => "void",
            Type::Nil => "nil",
            Type::Struct(_) => "struct",
            Type::Pointer(_) => "pointer",
            Type::Function => "func",
            Type::Unknown => "unknown",
        }
    }

    /// Values of these types fit in one 8-byte slot
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Int | Type::Bool | Type::Nil | Type::Pointer(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    /// Declared name of a struct type
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Struct(name) => write!(f, "struct {}", name),
            Type::Pointer(inner) => write!(f, "*{}", inner),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vreg_allocator_is_monotonic() {
        let mut vregs = VRegAllocator::new();

        assert_eq!(vregs.allocate(), VReg(0));
        assert_eq!(vregs.allocate(), VReg(1));
        assert_eq!(vregs.allocate(), VReg(2));
        assert_eq!(vregs.allocated(), 3);
    }

    #[test]
    fn test_vreg_allocator_reset() {
        let mut vregs = VRegAllocator::new();
        vregs.allocate();
        vregs.allocate();

        vregs.reset();
        assert_eq!(vregs.allocate(), VReg(0));
    }

    #[test]
    fn test_vreg_display() {
        assert_eq!(VReg(7).to_string(), "r7");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Type::Int.name(), "int");
        assert_eq!(Type::Bool.name(), "bool");
        assert_eq!(Type::Struct("Point".to_string()).name(), "struct");
        assert_eq!(Type::Pointer(Box::new(Type::Struct("Point".to_string()))).to_string(), "*struct Point");
    }

    #[test]
    fn test_scalar_types() {
        assert!(Type::Int.is_scalar());
        assert!(Type::Pointer(Box::new(Type::Int)).is_scalar());
        assert!(!Type::Struct("Point".to_string()).is_scalar());
        assert_eq!(Type::Struct("Point".to_string()).struct_name(), Some("Point"));
    }
}
