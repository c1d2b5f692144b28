//! Lowering Context
//!
//! Per-function state shared by the instruction lowering routines, plus the
//! helpers that move virtual registers between their home location and
//! physical registers.

use std::collections::BTreeSet;
use kestrel_codegen::{AsmInst, CallingConvention, PhysReg, Reg, RegisterPool};
use kestrel_common::VReg;
use crate::error::CodegenError;
use crate::lower::frame::{FrameLayout, Location};
use crate::options::CodegenOptions;

/// Largest immediate materialized with a single `mov`
const MAX_MOV_IMM: i64 = 65535;

pub struct LoweringContext<'a> {
    pub function: &'a str,
    pub layout: &'a FrameLayout,
    pub options: &'a CodegenOptions,
    pub globals: &'a BTreeSet<String>,
    pub return_label: String,
    pool: &'a mut RegisterPool,
    scratch: Vec<PhysReg>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(
        function: &'a str,
        layout: &'a FrameLayout,
        options: &'a CodegenOptions,
        globals: &'a BTreeSet<String>,
        pool: &'a mut RegisterPool,
    ) -> Self {
        Self {
            function,
            layout,
            options,
            globals,
            return_label: format!(".L{}_ret", function),
            pool,
            scratch: Vec::new(),
        }
    }

    /// Take a scratch register for the instruction being lowered
    pub fn acquire(&mut self) -> Result<Reg, CodegenError> {
        let reg = self.pool.acquire()?;
        self.scratch.push(reg);
        Ok(reg.reg())
    }

    /// Hand back every scratch register taken since the last call
    pub fn release_scratch(&mut self) {
        for reg in self.scratch.drain(..) {
            self.pool.release(reg);
        }
    }

    pub fn pool(&self) -> &RegisterPool {
        &*self.pool
    }

    pub fn location(&self, vreg: VReg) -> Result<Location, CodegenError> {
        self.layout.location(vreg).ok_or_else(|| CodegenError::UndefinedRegister {
            vreg,
            function: self.function.to_string(),
        })
    }

    /// Copy the current value of `vreg` into `dst`
    pub fn load_into(&self, dst: Reg, vreg: VReg, code: &mut Vec<AsmInst>) -> Result<(), CodegenError> {
        match self.location(vreg)? {
            Location::Slot(offset) => load_frame(dst, offset, code),
            Location::Param(index) => {
                let src = CallingConvention::PARAM_REGS[index as usize];
                if src != dst {
                    code.push(AsmInst::Mov(dst, src));
                }
            }
        }
        Ok(())
    }

    /// Load `vreg` into a fresh scratch register
    pub fn fetch(&mut self, vreg: VReg, code: &mut Vec<AsmInst>) -> Result<Reg, CodegenError> {
        let reg = self.acquire()?;
        self.load_into(reg, vreg, code)?;
        Ok(reg)
    }

    /// Write `src` to the home location of `vreg`
    pub fn store_from(&self, src: Reg, vreg: VReg, code: &mut Vec<AsmInst>) -> Result<(), CodegenError> {
        match self.location(vreg)? {
            Location::Slot(offset) => store_frame(src, offset, code),
            Location::Param(index) => {
                let dst = CallingConvention::PARAM_REGS[index as usize];
                if src != dst {
                    code.push(AsmInst::Mov(dst, src));
                }
            }
        }
        Ok(())
    }

    /// Store a call result while parameters are spilled
    ///
    /// A parameter target is written to its spill slot so the following
    /// restore brings the new value back into its register.
    pub fn store_call_result(&self, src: Reg, vreg: VReg, code: &mut Vec<AsmInst>) -> Result<(), CodegenError> {
        match self.location(vreg)? {
            Location::Param(index) => {
                code.push(AsmInst::Str(src, Reg::FP, CallingConvention::param_spill_offset(index)));
                Ok(())
            }
            Location::Slot(_) => self.store_from(src, vreg, code),
        }
    }

    /// Load `vreg` into an argument register while parameters are spilled
    pub fn load_arg(&self, dst: Reg, vreg: VReg, code: &mut Vec<AsmInst>) -> Result<(), CodegenError> {
        match self.location(vreg)? {
            Location::Param(index) => {
                code.push(AsmInst::Ldr(dst, Reg::FP, CallingConvention::param_spill_offset(index)));
                Ok(())
            }
            Location::Slot(_) => self.load_into(dst, vreg, code),
        }
    }

    /// Save the live parameter registers to the caller-provided home area
    pub fn spill_params(&self, code: &mut Vec<AsmInst>) {
        for index in self.layout.param_indices() {
            code.push(AsmInst::Str(
                CallingConvention::PARAM_REGS[index as usize],
                Reg::FP,
                CallingConvention::param_spill_offset(index),
            ));
        }
    }

    pub fn restore_params(&self, code: &mut Vec<AsmInst>) {
        for index in self.layout.param_indices() {
            code.push(AsmInst::Ldr(
                CallingConvention::PARAM_REGS[index as usize],
                Reg::FP,
                CallingConvention::param_spill_offset(index),
            ));
        }
    }
}

/// Put an immediate into `dst`
pub fn load_imm(dst: Reg, imm: i64, code: &mut Vec<AsmInst>) {
    if (-MAX_MOV_IMM..=MAX_MOV_IMM).contains(&imm) {
        code.push(AsmInst::MovI(dst, imm));
    } else {
        code.push(AsmInst::LdrLit(dst, imm));
    }
}

fn load_frame(dst: Reg, offset: i32, code: &mut Vec<AsmInst>) {
    if offset >= CallingConvention::MIN_DIRECT_OFFSET {
        code.push(AsmInst::Ldr(dst, Reg::FP, offset));
    } else {
        let addr = slot_address(offset, code);
        code.push(AsmInst::Ldr(dst, addr, 0));
    }
}

fn store_frame(src: Reg, offset: i32, code: &mut Vec<AsmInst>) {
    if offset >= CallingConvention::MIN_DIRECT_OFFSET {
        code.push(AsmInst::Str(src, Reg::FP, offset));
    } else {
        let addr = slot_address(offset, code);
        code.push(AsmInst::Str(src, addr, 0));
    }
}

/// Compute `x29 + offset` into the slot scratch register
fn slot_address(offset: i32, code: &mut Vec<AsmInst>) -> Reg {
    let scratch = CallingConvention::SLOT_SCRATCH;
    let distance = offset.unsigned_abs();
    if distance <= CallingConvention::MAX_ADD_IMM {
        code.push(AsmInst::SubI(scratch, Reg::FP, distance));
    } else {
        load_imm(scratch, distance as i64, code);
        code.push(AsmInst::Sub(scratch, Reg::FP, scratch));
    }
    scratch
}
