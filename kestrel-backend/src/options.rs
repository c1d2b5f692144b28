//! Code generation options

use serde::{Deserialize, Serialize};

/// Names of the C runtime routines the generated code calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSymbols {
    pub malloc: String,
    pub free: String,
    pub printf: String,
}

impl Default for RuntimeSymbols {
    fn default() -> Self {
        Self {
            malloc: "malloc".to_string(),
            free: "free".to_string(),
            printf: "printf".to_string(),
        }
    }
}

/// Options for lowering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    /// Value of the `.arch` directive
    pub arch: String,
    /// Emit each IR instruction as a comment before its lowering
    pub annotate_ir: bool,
    pub runtime: RuntimeSymbols,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            arch: "armv8-a".to_string(),
            annotate_ir: false,
            runtime: RuntimeSymbols::default(),
        }
    }
}
