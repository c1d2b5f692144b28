//! Kestrel Compiler - Code Generation Backend
//! 
//! Target model for the final phase of compilation: turning lowered
//! instructions into AArch64 assembly text. It includes:
//! 
//! - Assembly instruction and register definitions
//! - ABI implementation (calling convention, stack frames)
//! - The physical scratch register pool
//! - Text emission

pub mod asm;
pub mod abi;
pub mod regpool;
pub mod emit;

pub use asm::{Reg, Cond, AsmInst};
pub use abi::{Frame, AbiError, CallingConvention};
pub use regpool::{RegisterPool, PhysReg, RegPoolError, POOL_SIZE};
pub use emit::{emit_instructions, join_lines};

/// Render lowered instructions as one newline-terminated assembly text
pub fn generate_assembly(instructions: &[AsmInst]) -> String {
    join_lines(&emit_instructions(instructions))
}
