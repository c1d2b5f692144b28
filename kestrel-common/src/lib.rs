//! Kestrel Compiler - Common Types and Utilities
//! 
//! This crate contains shared types, error definitions, and the virtual
//! register allocator used by every phase of the Kestrel back half.

pub mod error;
pub mod types;

pub use error::CompilerError;
pub use types::*;
