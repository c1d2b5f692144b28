//! Instruction Lowering - Handles lowering of individual instructions
//!
//! Each IR instruction becomes a short, self-contained AArch64 sequence:
//! operands are loaded from their home locations into scratch registers,
//! the operation runs, and the result is written back. No value stays in a
//! scratch register across instructions.

use kestrel_codegen::{AbiError, AsmInst, CallingConvention, Cond, Reg};
use kestrel_frontend::ir::{BinaryOp, CompareOp, Instruction, Operand, UnaryOp};
use log::trace;
use crate::error::CodegenError;
use crate::lower::context::{load_imm, LoweringContext};

/// Label of the integer format string in `.rodata`
pub const INT_FORMAT_LABEL: &str = ".Lfmt_int";

/// Lower a single instruction
///
/// Scratch registers taken while lowering are returned to the pool whether
/// or not lowering succeeds.
pub fn lower_instruction(ctx: &mut LoweringContext<'_>, inst: &Instruction) -> Result<Vec<AsmInst>, CodegenError> {
    trace!("{}: lowering {}", ctx.function, inst);

    let mut code = Vec::new();
    if ctx.options.annotate_ir {
        code.push(AsmInst::Comment(inst.to_string().trim().to_string()));
    }

    let result = lower_into(ctx, inst, &mut code);
    ctx.release_scratch();
    result.map(|_| code)
}

fn lower_into(ctx: &mut LoweringContext<'_>, inst: &Instruction, code: &mut Vec<AsmInst>) -> Result<(), CodegenError> {
    match inst {
        Instruction::Mov { target, operand } => {
            let reg = operand_reg(ctx, operand, code)?;
            ctx.store_from(reg, *target, code)?;
        }

        Instruction::Binary { op, target, lhs, rhs } => {
            let lhs_reg = ctx.fetch(*lhs, code)?;
            match (op, rhs) {
                (BinaryOp::Add, Operand::Imm(imm)) if (0..4096).contains(imm) => {
                    code.push(AsmInst::AddI(lhs_reg, lhs_reg, *imm as u32));
                }
                (BinaryOp::Sub, Operand::Imm(imm)) if (0..4096).contains(imm) => {
                    code.push(AsmInst::SubI(lhs_reg, lhs_reg, *imm as u32));
                }
                _ => {
                    let rhs_reg = operand_reg(ctx, rhs, code)?;
                    code.push(binary_inst(*op, lhs_reg, rhs_reg));
                }
            }
            ctx.store_from(lhs_reg, *target, code)?;
        }

        Instruction::Unary { op, target, source } => {
            let reg = ctx.fetch(*source, code)?;
            match op {
                UnaryOp::Not => code.push(AsmInst::EorI(reg, reg, 1)),
                UnaryOp::Neg => code.push(AsmInst::Neg(reg, reg)),
            }
            ctx.store_from(reg, *target, code)?;
        }

        Instruction::Compare { cond, target, lhs, rhs } => {
            let lhs_reg = ctx.fetch(*lhs, code)?;
            let rhs_reg = operand_reg(ctx, rhs, code)?;
            code.push(AsmInst::Cmp(lhs_reg, rhs_reg));
            code.push(AsmInst::CSet(lhs_reg, condition(*cond)));
            ctx.store_from(lhs_reg, *target, code)?;
        }

        Instruction::LoadGlobal { target, name } => {
            check_global(ctx, name)?;
            let addr = ctx.acquire()?;
            global_address(addr, name, code);
            code.push(AsmInst::Ldr(addr, addr, 0));
            ctx.store_from(addr, *target, code)?;
        }

        Instruction::StoreGlobal { source, name } => {
            check_global(ctx, name)?;
            let value = ctx.fetch(*source, code)?;
            let addr = ctx.acquire()?;
            global_address(addr, name, code);
            code.push(AsmInst::Str(value, addr, 0));
        }

        Instruction::LoadField { target, base, index, .. } => {
            let reg = ctx.fetch(*base, code)?;
            code.push(AsmInst::Ldr(reg, reg, field_offset(*index)));
            ctx.store_from(reg, *target, code)?;
        }

        Instruction::StoreField { source, base, index, .. } => {
            let value = ctx.fetch(*source, code)?;
            let base_reg = ctx.fetch(*base, code)?;
            code.push(AsmInst::Str(value, base_reg, field_offset(*index)));
        }

        Instruction::New { target, size, .. } => {
            ctx.spill_params(code);
            let bytes = *size as i64 * CallingConvention::SLOT_SIZE as i64;
            load_imm(CallingConvention::RETURN_REG, bytes, code);
            code.push(AsmInst::Bl(ctx.options.runtime.malloc.clone()));
            ctx.store_call_result(CallingConvention::RETURN_REG, *target, code)?;
            ctx.restore_params(code);
        }

        Instruction::Delete { source } => {
            ctx.spill_params(code);
            ctx.load_into(Reg::X(0), *source, code)?;
            code.push(AsmInst::Bl(ctx.options.runtime.free.clone()));
            ctx.restore_params(code);
        }

        Instruction::Print { source } => {
            ctx.spill_params(code);
            // Value first: it may live in x0
            ctx.load_into(Reg::X(1), *source, code)?;
            global_address(Reg::X(0), INT_FORMAT_LABEL, code);
            code.push(AsmInst::Bl(ctx.options.runtime.printf.clone()));
            ctx.restore_params(code);
        }

        Instruction::Label { label } => code.push(AsmInst::Label(label.clone())),

        Instruction::Branch { label } => code.push(AsmInst::B(label.clone())),

        Instruction::CondBranch { condition, on_true, label } => {
            let reg = ctx.fetch(*condition, code)?;
            if *on_true {
                code.push(AsmInst::Cbnz(reg, label.clone()));
            } else {
                code.push(AsmInst::Cbz(reg, label.clone()));
            }
        }

        Instruction::Call { target, function, args } => {
            lower_call(ctx, *target, function, args, code)?;
        }

        Instruction::Return { value } => {
            if let Some(value) = value {
                ctx.load_into(CallingConvention::RETURN_REG, *value, code)?;
            }
            code.push(AsmInst::B(ctx.return_label.clone()));
        }
    }
    Ok(())
}

fn lower_call(
    ctx: &mut LoweringContext<'_>,
    target: Option<kestrel_common::VReg>,
    function: &str,
    args: &[kestrel_common::VReg],
    code: &mut Vec<AsmInst>,
) -> Result<(), CodegenError> {
    if args.len() > CallingConvention::MAX_REG_PARAMS {
        return Err(AbiError::TooManyArguments(args.len(), CallingConvention::MAX_REG_PARAMS).into());
    }

    ctx.spill_params(code);

    // The callee spills its own parameters just above its frame record,
    // which is this area
    let home = CallingConvention::home_area_size(args.len());
    if home > 0 {
        code.push(AsmInst::SubI(Reg::Sp, Reg::Sp, home));
    }

    for (index, arg) in args.iter().enumerate() {
        ctx.load_arg(CallingConvention::PARAM_REGS[index], *arg, code)?;
    }
    code.push(AsmInst::Bl(function.to_string()));

    if home > 0 {
        code.push(AsmInst::AddI(Reg::Sp, Reg::Sp, home));
    }
    if let Some(target) = target {
        ctx.store_call_result(CallingConvention::RETURN_REG, target, code)?;
    }

    ctx.restore_params(code);
    Ok(())
}

fn operand_reg(ctx: &mut LoweringContext<'_>, operand: &Operand, code: &mut Vec<AsmInst>) -> Result<Reg, CodegenError> {
    match operand {
        Operand::Reg(vreg) => ctx.fetch(*vreg, code),
        Operand::Imm(imm) => {
            let reg = ctx.acquire()?;
            load_imm(reg, *imm, code);
            Ok(reg)
        }
    }
}

fn binary_inst(op: BinaryOp, rd: Reg, rm: Reg) -> AsmInst {
    match op {
        BinaryOp::Add => AsmInst::Add(rd, rd, rm),
        BinaryOp::Sub => AsmInst::Sub(rd, rd, rm),
        BinaryOp::Mul => AsmInst::Mul(rd, rd, rm),
        BinaryOp::Div => AsmInst::SDiv(rd, rd, rm),
        BinaryOp::And => AsmInst::And(rd, rd, rm),
        BinaryOp::Or => AsmInst::Orr(rd, rd, rm),
    }
}

fn condition(op: CompareOp) -> Cond {
    match op {
        CompareOp::Eq => Cond::Eq,
        CompareOp::Ne => Cond::Ne,
        CompareOp::Lt => Cond::Lt,
        CompareOp::Le => Cond::Le,
        CompareOp::Gt => Cond::Gt,
        CompareOp::Ge => Cond::Ge,
    }
}

fn field_offset(index: usize) -> i32 {
    index as i32 * CallingConvention::SLOT_SIZE as i32
}

fn global_address(dst: Reg, symbol: &str, code: &mut Vec<AsmInst>) {
    code.push(AsmInst::Adrp(dst, symbol.to_string()));
    code.push(AsmInst::AddLo12(dst, dst, symbol.to_string()));
}

fn check_global(ctx: &LoweringContext<'_>, name: &str) -> Result<(), CodegenError> {
    if ctx.globals.contains(name) {
        Ok(())
    } else {
        Err(CodegenError::UnknownGlobal {
            name: name.to_string(),
            function: ctx.function.to_string(),
        })
    }
}
