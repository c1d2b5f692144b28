//! AArch64 Assembly Instruction Definitions
//!
//! This module defines the subset of the A64 instruction set the backend
//! emits, plus the directives and labels that frame it.

use std::fmt;

/// AArch64 general purpose register
///
/// - X0-X7: arguments and results
/// - X8: indirect result
/// - X9-X15: caller-saved temporaries
/// - X16-X17: intra-procedure-call scratch, X18 platform register
/// - X19-X28: callee-saved
/// - X29: frame pointer, X30: link register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    X(u8),
    Sp,
    Xzr,
}

impl Reg {
    pub const FP: Reg = Reg::X(29);
    pub const LR: Reg = Reg::X(30);
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::X(n) => write!(f, "x{}", n),
            Reg::Sp => write!(f, "sp"),
            Reg::Xzr => write!(f, "xzr"),
        }
    }
}

/// Condition codes used by `cset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Le => "le",
            Cond::Gt => "gt",
            Cond::Ge => "ge",
        };
        write!(f, "{}", s)
    }
}

/// AArch64 Assembly Instructions
///
/// Memory operands are `[base, #offset]` with a byte offset.
#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Arithmetic Instructions
    Add(Reg, Reg, Reg),           // rd = rn + rm
    Sub(Reg, Reg, Reg),           // rd = rn - rm
    Mul(Reg, Reg, Reg),           // rd = rn * rm
    SDiv(Reg, Reg, Reg),          // rd = rn / rm (signed)
    Neg(Reg, Reg),                // rd = -rn

    // Arithmetic with Immediate
    AddI(Reg, Reg, u32),          // rd = rn + imm
    SubI(Reg, Reg, u32),          // rd = rn - imm

    // Logical Instructions
    And(Reg, Reg, Reg),           // rd = rn & rm
    Orr(Reg, Reg, Reg),           // rd = rn | rm
    EorI(Reg, Reg, u64),          // rd = rn ^ imm

    // Comparison
    Cmp(Reg, Reg),                // flags = rn - rm
    CSet(Reg, Cond),              // rd = cond ? 1 : 0

    // Moves
    Mov(Reg, Reg),                // rd = rn
    MovI(Reg, i64),               // rd = imm (16-bit range)
    LdrLit(Reg, i64),             // rd = imm via literal pool

    // Memory Instructions
    Ldr(Reg, Reg, i32),           // rt = [rn, #off]
    Str(Reg, Reg, i32),           // [rn, #off] = rt
    Stp(Reg, Reg, Reg),           // [rn] = rt1, rt2
    Ldp(Reg, Reg, Reg),           // rt1, rt2 = [rn]

    // Addressing
    Adrp(Reg, String),            // rd = page of symbol
    AddLo12(Reg, Reg, String),    // rd = rn + low 12 bits of symbol

    // Control Flow Instructions
    B(String),
    Cbz(Reg, String),
    Cbnz(Reg, String),
    Bl(String),
    Ret,

    // Assembly Pseudo-Instructions
    Label(String),
    Directive(String),
    Comment(String),
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Arithmetic
            AsmInst::Add(rd, rn, rm) => write!(f, "\tadd {}, {}, {}", rd, rn, rm),
            AsmInst::Sub(rd, rn, rm) => write!(f, "\tsub {}, {}, {}", rd, rn, rm),
            AsmInst::Mul(rd, rn, rm) => write!(f, "\tmul {}, {}, {}", rd, rn, rm),
            AsmInst::SDiv(rd, rn, rm) => write!(f, "\tsdiv {}, {}, {}", rd, rn, rm),
            AsmInst::Neg(rd, rn) => write!(f, "\tneg {}, {}", rd, rn),

            // Arithmetic Immediate
            AsmInst::AddI(rd, rn, imm) => write!(f, "\tadd {}, {}, #{}", rd, rn, imm),
            AsmInst::SubI(rd, rn, imm) => write!(f, "\tsub {}, {}, #{}", rd, rn, imm),

            // Logical
            AsmInst::And(rd, rn, rm) => write!(f, "\tand {}, {}, {}", rd, rn, rm),
            AsmInst::Orr(rd, rn, rm) => write!(f, "\torr {}, {}, {}", rd, rn, rm),
            AsmInst::EorI(rd, rn, imm) => write!(f, "\teor {}, {}, #{}", rd, rn, imm),

            // Comparison
            AsmInst::Cmp(rn, rm) => write!(f, "\tcmp {}, {}", rn, rm),
            AsmInst::CSet(rd, cond) => write!(f, "\tcset {}, {}", rd, cond),

            // Moves
            AsmInst::Mov(rd, rn) => write!(f, "\tmov {}, {}", rd, rn),
            AsmInst::MovI(rd, imm) => write!(f, "\tmov {}, #{}", rd, imm),
            AsmInst::LdrLit(rd, imm) => write!(f, "\tldr {}, ={}", rd, imm),

            // Memory
            AsmInst::Ldr(rt, rn, 0) => write!(f, "\tldr {}, [{}]", rt, rn),
            AsmInst::Ldr(rt, rn, off) => write!(f, "\tldr {}, [{}, #{}]", rt, rn, off),
            AsmInst::Str(rt, rn, 0) => write!(f, "\tstr {}, [{}]", rt, rn),
            AsmInst::Str(rt, rn, off) => write!(f, "\tstr {}, [{}, #{}]", rt, rn, off),
            AsmInst::Stp(rt1, rt2, rn) => write!(f, "\tstp {}, {}, [{}]", rt1, rt2, rn),
            AsmInst::Ldp(rt1, rt2, rn) => write!(f, "\tldp {}, {}, [{}]", rt1, rt2, rn),

            // Addressing
            AsmInst::Adrp(rd, sym) => write!(f, "\tadrp {}, {}", rd, sym),
            AsmInst::AddLo12(rd, rn, sym) => write!(f, "\tadd {}, {}, :lo12:{}", rd, rn, sym),

            // Control Flow
            AsmInst::B(label) => write!(f, "\tb {}", label),
            AsmInst::Cbz(rt, label) => write!(f, "\tcbz {}, {}", rt, label),
            AsmInst::Cbnz(rt, label) => write!(f, "\tcbnz {}, {}", rt, label),
            AsmInst::Bl(label) => write!(f, "\tbl {}", label),
            AsmInst::Ret => write!(f, "\tret"),

            // Pseudo
            AsmInst::Label(label) => write!(f, "{}:", label),
            AsmInst::Directive(text) => write!(f, "\t{}", text),
            AsmInst::Comment(text) => write!(f, "\t// {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_display() {
        assert_eq!(format!("{}", Reg::X(0)), "x0");
        assert_eq!(format!("{}", Reg::FP), "x29");
        assert_eq!(format!("{}", Reg::LR), "x30");
        assert_eq!(format!("{}", Reg::Sp), "sp");
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(format!("{}", AsmInst::SubI(Reg::Sp, Reg::Sp, 16)), "\tsub sp, sp, #16");
        assert_eq!(format!("{}", AsmInst::Stp(Reg::FP, Reg::LR, Reg::Sp)), "\tstp x29, x30, [sp]");
        assert_eq!(format!("{}", AsmInst::Str(Reg::X(0), Reg::FP, -16)), "\tstr x0, [x29, #-16]");
        assert_eq!(format!("{}", AsmInst::Ldr(Reg::X(9), Reg::X(10), 0)), "\tldr x9, [x10]");
        assert_eq!(format!("{}", AsmInst::CSet(Reg::X(9), Cond::Le)), "\tcset x9, le");
        assert_eq!(format!("{}", AsmInst::AddLo12(Reg::X(9), Reg::X(9), "count".to_string())), "\tadd x9, x9, :lo12:count");
        assert_eq!(format!("{}", AsmInst::Label("main".to_string())), "main:");
        assert_eq!(format!("{}", AsmInst::Comment("new r5,Point".to_string())), "\t// new r5,Point");
    }
}
