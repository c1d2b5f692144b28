//! Function Fragments
//! 
//! A fragment is one function's compiled body at IR level: the label it is
//! known by, the registers its parameters arrive in, and its instructions.

use kestrel_common::VReg;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::Instruction;

/// Function fragment in IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncFrag {
    pub label: String,
    /// Parameter registers in declaration order
    pub params: Vec<VReg>,
    pub body: Vec<Instruction>,
}

impl FuncFrag {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<VReg>) -> Self {
        self.params = params;
        self
    }

    pub fn add_param(&mut self, param: VReg) {
        self.params.push(param);
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.body.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for FuncFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}(", self.label)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 { write!(f, ",")?; }
            write!(f, "{param}")?;
        }
        writeln!(f, "):")?;
        for instruction in &self.body {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}
