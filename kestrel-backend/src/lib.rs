//! Kestrel Compiler - Backend
//!
//! This crate provides the backend for the Kestrel compiler, responsible
//! for lowering IR function fragments to AArch64 assembly.

pub mod error;
pub mod lower;
pub mod options;
pub mod session;

pub use error::CodegenError;
pub use lower::{lower_function, lower_program, FrameLayout, Location};
pub use options::{CodegenOptions, RuntimeSymbols};
pub use session::CompilationSession;

// Re-export IR types from frontend for convenience
pub use kestrel_frontend::ir::{
    Instruction, Operand, BinaryOp, UnaryOp, CompareOp, FuncFrag, Program, FragBuilder
};
pub use kestrel_common::{VReg, VRegAllocator};

#[cfg(test)]
mod tests;
