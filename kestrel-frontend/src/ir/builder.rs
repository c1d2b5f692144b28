//! IR Builder
//!
//! Provides utilities for constructing function fragments programmatically.
//! Every value-producing helper allocates a fresh target register from the
//! session's allocator and returns it.

use kestrel_common::{VReg, VRegAllocator};
use crate::ir::{
    Operand, BinaryOp, UnaryOp, CompareOp,
    Instruction, FuncFrag
};

/// Builder for one function fragment
pub struct FragBuilder<'a> {
    frag: FuncFrag,
    vregs: &'a mut VRegAllocator,
    next_label_id: u32,
}

impl<'a> FragBuilder<'a> {
    pub fn new(label: impl Into<String>, vregs: &'a mut VRegAllocator) -> Self {
        Self {
            frag: FuncFrag::new(label),
            vregs,
            next_label_id: 0,
        }
    }

    /// Declare the next parameter
    pub fn param(&mut self) -> VReg {
        let reg = self.vregs.allocate();
        self.frag.add_param(reg);
        reg
    }

    /// Use an existing register (e.g. from the symbol table) as the next parameter
    pub fn bind_param(&mut self, reg: VReg) -> &mut Self {
        self.frag.add_param(reg);
        self
    }

    pub fn fresh_label(&mut self) -> String {
        let label = format!(".L{}_{}", self.frag.label, self.next_label_id);
        self.next_label_id += 1;
        label
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.frag.push(instruction);
        self
    }

    pub fn mov(&mut self, operand: impl Into<Operand>) -> VReg {
        let target = self.vregs.allocate();
        self.assign(target, operand);
        target
    }

    /// Store into a register that already exists, typically a variable's
    pub fn assign(&mut self, target: VReg, operand: impl Into<Operand>) -> &mut Self {
        self.push(Instruction::Mov { target, operand: operand.into() })
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: VReg, rhs: impl Into<Operand>) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::Binary { op, target, lhs, rhs: rhs.into() });
        target
    }

    pub fn unary(&mut self, op: UnaryOp, source: VReg) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::Unary { op, target, source });
        target
    }

    pub fn compare(&mut self, cond: CompareOp, lhs: VReg, rhs: impl Into<Operand>) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::Compare { cond, target, lhs, rhs: rhs.into() });
        target
    }

    pub fn load_global(&mut self, name: &str) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::LoadGlobal { target, name: name.to_string() });
        target
    }

    pub fn store_global(&mut self, source: VReg, name: &str) -> &mut Self {
        self.push(Instruction::StoreGlobal { source, name: name.to_string() })
    }

    pub fn load_field(&mut self, base: VReg, field: &str, index: usize) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::LoadField { target, base, field: field.to_string(), index });
        target
    }

    pub fn store_field(&mut self, source: VReg, base: VReg, field: &str, index: usize) -> &mut Self {
        self.push(Instruction::StoreField { source, base, field: field.to_string(), index })
    }

    /// Heap-allocate `size` elements of `type_name` into a fresh register
    pub fn new_object(&mut self, type_name: &str, size: usize) -> VReg {
        let target = self.vregs.allocate();
        self.alloc_into(target, type_name, size);
        target
    }

    /// Heap-allocate into an existing register
    pub fn alloc_into(&mut self, target: VReg, type_name: &str, size: usize) -> &mut Self {
        self.push(Instruction::New { target, type_name: type_name.to_string(), size })
    }

    pub fn delete(&mut self, source: VReg) -> &mut Self {
        self.push(Instruction::Delete { source })
    }

    pub fn print(&mut self, source: VReg) -> &mut Self {
        self.push(Instruction::Print { source })
    }

    pub fn label(&mut self, label: &str) -> &mut Self {
        self.push(Instruction::Label { label: label.to_string() })
    }

    pub fn branch(&mut self, label: &str) -> &mut Self {
        self.push(Instruction::Branch { label: label.to_string() })
    }

    pub fn branch_if(&mut self, condition: VReg, on_true: bool, label: &str) -> &mut Self {
        self.push(Instruction::CondBranch { condition, on_true, label: label.to_string() })
    }

    pub fn call(&mut self, function: &str, args: Vec<VReg>) -> VReg {
        let target = self.vregs.allocate();
        self.push(Instruction::Call { target: Some(target), function: function.to_string(), args });
        target
    }

    pub fn call_void(&mut self, function: &str, args: Vec<VReg>) -> &mut Self {
        self.push(Instruction::Call { target: None, function: function.to_string(), args })
    }

    pub fn ret(&mut self, value: Option<VReg>) -> &mut Self {
        self.push(Instruction::Return { value })
    }

    pub fn finish(self) -> FuncFrag {
        self.frag
    }
}
