//! Backend errors

use kestrel_codegen::{AbiError, RegPoolError};
use kestrel_common::{CompilerError, VReg};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error(transparent)]
    Pool(#[from] RegPoolError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error("Unknown global variable '{name}' in function '{function}'")]
    UnknownGlobal { name: String, function: String },

    #[error("Register {vreg} is read in function '{function}' but never defined")]
    UndefinedRegister { vreg: VReg, function: String },
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Pool(err) => err.into(),
            CodegenError::Abi(err) => err.into(),
            CodegenError::UnknownGlobal { .. } => CompilerError::semantic_error(err.to_string()),
            CodegenError::UndefinedRegister { .. } => CompilerError::internal_error(err.to_string()),
        }
    }
}
