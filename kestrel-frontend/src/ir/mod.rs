//! Register-oriented Intermediate Representation
//! 
//! ## Architecture
//! 
//! The module is structured as follows:
//! - `ops` - Operands and binary/unary/comparison operations
//! - `instructions` - IR instructions
//! - `function` - Function fragments
//! - `module` - The whole program and its JSON form
//! - `builder` - IR construction utilities

// Public exports - clean API surface
pub use self::ops::{Operand, BinaryOp, UnaryOp, CompareOp};
pub use self::instructions::Instruction;
pub use self::function::FuncFrag;
pub use self::module::{Program, IrError};
pub use self::builder::FragBuilder;

// Internal modules
mod ops;
mod instructions;
mod function;
mod module;
mod builder;

#[cfg(test)]
mod tests;
