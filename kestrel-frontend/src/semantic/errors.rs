//! Semantic error definitions
//!
//! Lookups in the symbol table never fail, they return `None`. The only
//! errors raised here come from struct instantiation.

use kestrel_common::CompilerError;
use thiserror::Error;

/// Errors raised while building scopes from struct prototypes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Unknown struct type '{type_name}' for field '{field}'")]
    UnknownStructType {
        type_name: String,
        field: String,
    },

    #[error("Struct '{struct_name}' contains itself by value")]
    RecursiveStruct {
        struct_name: String,
    },

    #[error("'{name}' does not name a struct type")]
    NotAStruct {
        name: String,
    },
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        CompilerError::semantic_error(err.to_string())
    }
}
