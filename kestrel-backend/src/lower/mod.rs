//! Lowering Module - IR to AArch64
//!
//! Organized bottom-up: `frame` decides where every register lives,
//! `context` moves values between those homes and scratch registers,
//! `instruction` lowers one IR instruction, and `program` stitches
//! functions and data into a file.

pub mod frame;
pub mod context;
mod instruction;
mod program;

pub use frame::{FrameLayout, Location};
pub use context::LoweringContext;
pub use instruction::{lower_instruction, INT_FORMAT_LABEL};
pub use program::{lower_function, lower_program};
