//! Kestrel Compiler - Frontend data model
//! 
//! The scanner, parser and type checker live outside this repository. What
//! they hand over to the back half is defined here:
//! - `semantic`: the scope-chained symbol table, including struct prototypes
//!   and their instantiation
//! - `ir`: the flat, register-oriented instruction model, grouped into
//!   function fragments

pub mod semantic;
pub mod ir;

pub use semantic::{SymbolTable, ScopeId, Scope, Entry, VarEntry, FuncEntry, StructEntry, SemanticError};
pub use ir::{Instruction, Operand, FuncFrag, Program, FragBuilder, IrError};
