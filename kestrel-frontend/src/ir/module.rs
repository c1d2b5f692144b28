//! IR Program
//! 
//! The ordered list of function fragments for one compilation unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use crate::ir::FuncFrag;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("IR serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Program in IR
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FuncFrag>,
}

impl Program {
    pub fn new() -> Self {
        Self { functions: Vec::new() }
    }

    pub fn add_function(&mut self, function: FuncFrag) {
        self.functions.push(function);
    }

    pub fn get_function(&self, label: &str) -> Option<&FuncFrag> {
        self.functions.iter().find(|f| f.label == label)
    }

    /// Dump the program as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, IrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read back a program produced by [`Program::to_json`]
    pub fn from_json(text: &str) -> Result<Self, IrError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
