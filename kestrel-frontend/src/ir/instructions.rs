//! IR Instructions
//!
//! Defines all instruction types available in the IR. Each instruction
//! defines at most one virtual register and reads any number of them.

use kestrel_common::VReg;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{Operand, BinaryOp, UnaryOp, CompareOp};

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Copy: target = operand
    Mov {
        target: VReg,
        operand: Operand,
    },

    /// Binary operation: target = op lhs, rhs
    Binary {
        op: BinaryOp,
        target: VReg,
        lhs: VReg,
        rhs: Operand,
    },

    /// Unary operation: target = op source
    Unary {
        op: UnaryOp,
        target: VReg,
        source: VReg,
    },

    /// Comparison: target = (lhs cond rhs) ? 1 : 0
    Compare {
        cond: CompareOp,
        target: VReg,
        lhs: VReg,
        rhs: Operand,
    },

    /// Read a global variable
    LoadGlobal {
        target: VReg,
        name: String,
    },

    /// Write a global variable
    StoreGlobal {
        source: VReg,
        name: String,
    },

    /// target = base->field, `index` is the field's position in its struct
    LoadField {
        target: VReg,
        base: VReg,
        field: String,
        index: usize,
    },

    /// base->field = source
    StoreField {
        source: VReg,
        base: VReg,
        field: String,
        index: usize,
    },

    /// Heap-allocate `size` 8-byte elements and bind the pointer to target
    New {
        target: VReg,
        type_name: String,
        size: usize,
    },

    /// Release heap memory
    Delete {
        source: VReg,
    },

    /// Print an integer followed by a newline
    Print {
        source: VReg,
    },

    /// Branch target
    Label {
        label: String,
    },

    /// Unconditional branch
    Branch {
        label: String,
    },

    /// Branch when condition is non-zero (`on_true`) or zero (`!on_true`)
    CondBranch {
        condition: VReg,
        on_true: bool,
        label: String,
    },

    /// Function call: target = function(args...)
    Call {
        target: Option<VReg>,
        function: String,
        args: Vec<VReg>,
    },

    /// Return from the enclosing function
    Return {
        value: Option<VReg>,
    },
}

impl Instruction {
    /// Register defined by this instruction, if any
    pub fn target(&self) -> Option<VReg> {
        match self {
            Instruction::Mov { target, .. }
            | Instruction::Binary { target, .. }
            | Instruction::Unary { target, .. }
            | Instruction::Compare { target, .. }
            | Instruction::LoadGlobal { target, .. }
            | Instruction::LoadField { target, .. }
            | Instruction::New { target, .. } => Some(*target),
            Instruction::Call { target, .. } => *target,
            _ => None,
        }
    }

    /// Defined registers as a list (empty or one element)
    pub fn targets(&self) -> Vec<VReg> {
        self.target().into_iter().collect()
    }

    /// Registers read by this instruction, in operand order
    pub fn sources(&self) -> Vec<VReg> {
        match self {
            Instruction::Mov { operand, .. } => operand.reg().into_iter().collect(),
            Instruction::Binary { lhs, rhs, .. } | Instruction::Compare { lhs, rhs, .. } => {
                std::iter::once(*lhs).chain(rhs.reg()).collect()
            }
            Instruction::Unary { source, .. }
            | Instruction::StoreGlobal { source, .. }
            | Instruction::Delete { source }
            | Instruction::Print { source } => vec![*source],
            Instruction::LoadField { base, .. } => vec![*base],
            Instruction::StoreField { source, base, .. } => vec![*source, *base],
            Instruction::CondBranch { condition, .. } => vec![*condition],
            Instruction::Call { args, .. } => args.clone(),
            Instruction::Return { value } => value.iter().copied().collect(),
            Instruction::LoadGlobal { .. }
            | Instruction::New { .. }
            | Instruction::Label { .. }
            | Instruction::Branch { .. } => Vec::new(),
        }
    }

    /// Immediate operand, if any
    pub fn immediate(&self) -> Option<i64> {
        match self {
            Instruction::Mov { operand, .. } => operand.imm(),
            Instruction::Binary { rhs, .. } | Instruction::Compare { rhs, .. } => rhs.imm(),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Instruction::Label { label }
            | Instruction::Branch { label }
            | Instruction::CondBranch { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Rewrite the label of a branch or label instruction; returns false for other instructions
    pub fn set_label(&mut self, new_label: impl Into<String>) -> bool {
        match self {
            Instruction::Label { label }
            | Instruction::Branch { label }
            | Instruction::CondBranch { label, .. } => {
                *label = new_label.into();
                true
            }
            _ => false,
        }
    }

    /// Calls into other code, which clobbers the argument registers
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Instruction::Call { .. }
                | Instruction::New { .. }
                | Instruction::Delete { .. }
                | Instruction::Print { .. }
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Mov { target, operand } => write!(f, "    mov {target},{operand}"),
            Instruction::Binary { op, target, lhs, rhs } => write!(f, "    {op} {target},{lhs},{rhs}"),
            Instruction::Unary { op, target, source } => write!(f, "    {op} {target},{source}"),
            Instruction::Compare { cond, target, lhs, rhs } => write!(f, "    cmp.{cond} {target},{lhs},{rhs}"),
            Instruction::LoadGlobal { target, name } => write!(f, "    ldg {target},@{name}"),
            Instruction::StoreGlobal { source, name } => write!(f, "    stg {source},@{name}"),
            Instruction::LoadField { target, base, field, .. } => write!(f, "    ldf {target},{base}.{field}"),
            Instruction::StoreField { source, base, field, .. } => write!(f, "    stf {source},{base}.{field}"),
            Instruction::New { target, type_name, .. } => write!(f, "    new {target},{type_name}"),
            Instruction::Delete { source } => write!(f, "    delete {source}"),
            Instruction::Print { source } => write!(f, "    print {source}"),
            Instruction::Label { label } => write!(f, "{label}:"),
            Instruction::Branch { label } => write!(f, "    b {label}"),
            Instruction::CondBranch { condition, on_true, label } => {
                let mnemonic = if *on_true { "cbnz" } else { "cbz" };
                write!(f, "    {mnemonic} {condition},{label}")
            }
            Instruction::Call { target, function, args } => {
                write!(f, "    call ")?;
                if let Some(target) = target {
                    write!(f, "{target},")?;
                }
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { write!(f, ",")?; }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Instruction::Return { value: Some(value) } => write!(f, "    ret {value}"),
            Instruction::Return { value: None } => write!(f, "    ret"),
        }
    }
}
