//! AArch64 ABI Implementation
//!
//! This module implements the parts of the AAPCS64 procedure call standard
//! the backend relies on: argument registers, the frame record, and the
//! 16-byte stack alignment rule.

use crate::asm::{AsmInst, Reg};
use kestrel_common::CompilerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Too many parameters: {0} (maximum: {1})")]
    TooManyParameters(usize, usize),

    #[error("Too many call arguments: {0} (maximum: {1})")]
    TooManyArguments(usize, usize),

    #[error("Stack frame of {0} bytes is not 16-byte aligned")]
    MisalignedFrame(u32),

    #[error("Stack frame too large: {0} bytes")]
    FrameTooLarge(u32),
}

impl From<AbiError> for CompilerError {
    fn from(err: AbiError) -> Self {
        match err {
            // The source program asked for more than the convention supports
            AbiError::TooManyParameters(..) | AbiError::TooManyArguments(..) => {
                CompilerError::semantic_error(err.to_string())
            }
            AbiError::MisalignedFrame(_) | AbiError::FrameTooLarge(_) => {
                CompilerError::internal_error(err.to_string())
            }
        }
    }
}

/// AArch64 calling convention as used by the backend
///
/// Register usage:
/// - X0-X7: arguments; X0 also carries the return value
/// - X16: slot-addressing scratch for frames deeper than `ldur` reaches
/// - X29: frame pointer, X30: link register
///
/// Parameters stay in their argument registers for the whole function body.
/// Around anything that calls out they are spilled to `[x29, #16 + 8*i]`,
/// which is the home area the caller reserves just below its own stack
/// pointer before branching.
pub struct CallingConvention;

impl CallingConvention {
    /// Maximum number of parameters that can be passed in registers
    pub const MAX_REG_PARAMS: usize = 8;

    /// Registers used for passing parameters
    pub const PARAM_REGS: [Reg; 8] = [
        Reg::X(0), Reg::X(1), Reg::X(2), Reg::X(3),
        Reg::X(4), Reg::X(5), Reg::X(6), Reg::X(7),
    ];

    pub const RETURN_REG: Reg = Reg::X(0);
    pub const SLOT_SCRATCH: Reg = Reg::X(16);
    pub const STACK_PTR: Reg = Reg::Sp;
    pub const FRAME_PTR: Reg = Reg::FP;
    pub const LINK_REG: Reg = Reg::LR;

    /// Bytes holding the saved frame pointer and link register
    pub const FRAME_RECORD_SIZE: u32 = 16;
    pub const SLOT_SIZE: u32 = 8;
    pub const STACK_ALIGN: u32 = 16;

    /// Largest unsigned immediate of an `add`/`sub`
    pub const MAX_ADD_IMM: u32 = 4095;

    /// Largest aligned step the stack pointer takes in one `add`/`sub`
    pub const MAX_SP_STEP: u32 = Self::MAX_ADD_IMM / Self::STACK_ALIGN * Self::STACK_ALIGN;

    /// Largest frame whose slots stay addressable with 32-bit offsets
    pub const MAX_FRAME_SIZE: u32 = 1 << 30;

    /// Lowest offset reachable with an unscaled `[x29, #off]` access
    pub const MIN_DIRECT_OFFSET: i32 = -256;

    /// Get the register for a parameter index (0-based)
    pub fn param_reg(index: usize) -> Result<Reg, AbiError> {
        if index >= Self::MAX_REG_PARAMS {
            return Err(AbiError::TooManyParameters(index + 1, Self::MAX_REG_PARAMS));
        }
        Ok(Self::PARAM_REGS[index])
    }

    /// Offset above the frame pointer where parameter `index` is spilled
    pub fn param_spill_offset(index: u8) -> i32 {
        Self::FRAME_RECORD_SIZE as i32 + index as i32 * Self::SLOT_SIZE as i32
    }

    /// Bytes a caller reserves below its stack pointer for a callee with `args` parameters
    pub fn home_area_size(args: usize) -> u32 {
        align_to(args as u32 * Self::SLOT_SIZE, Self::STACK_ALIGN)
    }
}

/// Round `size` up to the next multiple of `align`
pub fn align_to(size: u32, align: u32) -> u32 {
    size.div_ceil(align) * align
}

/// Stack Frame Layout
///
/// Stack grows downward. After the prologue:
/// ```text
///   [x29, #16 + 8*i]  parameter spill area (caller's home area)
///   [x29, #8]         saved x30
///   [x29, #0]         saved x29
///   [x29, #-8] ...    local slots, one per defined virtual register
///   sp                x29 - locals_size
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bytes of local slots before alignment
    pub raw_size: u32,

    /// Bytes of local slots reserved below the frame record
    pub locals_size: u32,
}

impl Frame {
    /// Lay out a frame for `slots` 8-byte locals
    pub fn for_slots(slots: usize) -> Result<Self, AbiError> {
        let raw_size = u32::try_from(slots)
            .ok()
            .and_then(|slots| slots.checked_mul(CallingConvention::SLOT_SIZE))
            .ok_or(AbiError::FrameTooLarge(u32::MAX))?;
        Self::new(raw_size)
    }

    /// Lay out a frame for `raw_size` bytes of locals, padded to the stack alignment
    pub fn new(raw_size: u32) -> Result<Self, AbiError> {
        if raw_size > CallingConvention::MAX_FRAME_SIZE {
            return Err(AbiError::FrameTooLarge(raw_size));
        }
        let locals_size = align_to(raw_size, CallingConvention::STACK_ALIGN);
        let frame = Self { raw_size, locals_size };
        frame.validate()?;
        Ok(frame)
    }

    fn validate(&self) -> Result<(), AbiError> {
        if self.locals_size % CallingConvention::STACK_ALIGN != 0 {
            return Err(AbiError::MisalignedFrame(self.locals_size));
        }
        Ok(())
    }

    /// Split the locals area into aligned steps that each fit one immediate
    fn sp_steps(&self) -> impl Iterator<Item = u32> {
        let step = CallingConvention::MAX_SP_STEP;
        let full = self.locals_size / step;
        let rest = self.locals_size % step;
        std::iter::repeat(step).take(full as usize).chain((rest > 0).then_some(rest))
    }

    /// Total bytes the prologue takes off the stack pointer
    pub fn total_size(&self) -> u32 {
        CallingConvention::FRAME_RECORD_SIZE + self.locals_size
    }

    /// Generate function prologue
    ///
    /// 1. Reserves the frame record
    /// 2. Saves x29 and x30 into it
    /// 3. Points x29 at the frame record
    /// 4. Allocates space for locals, in several steps for large frames
    pub fn gen_prologue(&self) -> Vec<AsmInst> {
        let mut code = vec![
            AsmInst::SubI(Reg::Sp, Reg::Sp, CallingConvention::FRAME_RECORD_SIZE),
            AsmInst::Stp(CallingConvention::FRAME_PTR, CallingConvention::LINK_REG, Reg::Sp),
            AsmInst::Mov(CallingConvention::FRAME_PTR, Reg::Sp),
        ];

        code.extend(self.sp_steps().map(|step| AsmInst::SubI(Reg::Sp, Reg::Sp, step)));

        code
    }

    /// Generate function epilogue, the exact reverse of the prologue
    pub fn gen_epilogue(&self) -> Vec<AsmInst> {
        let mut code: Vec<AsmInst> = self.sp_steps()
            .map(|step| AsmInst::AddI(Reg::Sp, Reg::Sp, step))
            .collect();

        code.push(AsmInst::Ldp(CallingConvention::FRAME_PTR, CallingConvention::LINK_REG, Reg::Sp));
        code.push(AsmInst::AddI(Reg::Sp, Reg::Sp, CallingConvention::FRAME_RECORD_SIZE));
        code.push(AsmInst::Ret);

        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Net change to sp across a straight-line sequence
    fn sp_delta(code: &[AsmInst]) -> i64 {
        code.iter()
            .map(|inst| match inst {
                AsmInst::SubI(Reg::Sp, Reg::Sp, n) => -(*n as i64),
                AsmInst::AddI(Reg::Sp, Reg::Sp, n) => *n as i64,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_calling_convention() {
        assert_eq!(CallingConvention::param_reg(0).unwrap(), Reg::X(0));
        assert_eq!(CallingConvention::param_reg(7).unwrap(), Reg::X(7));
        assert_eq!(CallingConvention::param_reg(8), Err(AbiError::TooManyParameters(9, 8)));
    }

    #[test]
    fn test_param_spill_offsets() {
        assert_eq!(CallingConvention::param_spill_offset(0), 16);
        assert_eq!(CallingConvention::param_spill_offset(1), 24);
        assert_eq!(CallingConvention::param_spill_offset(2), 32);
    }

    #[test]
    fn test_home_area_is_aligned() {
        assert_eq!(CallingConvention::home_area_size(0), 0);
        assert_eq!(CallingConvention::home_area_size(1), 16);
        assert_eq!(CallingConvention::home_area_size(2), 16);
        assert_eq!(CallingConvention::home_area_size(3), 32);
    }

    #[test]
    fn test_frame_padding() {
        for slots in 0..12 {
            let frame = Frame::for_slots(slots).unwrap();
            let raw = slots as u32 * 8;
            assert_eq!(frame.raw_size, raw);
            assert_eq!(frame.locals_size % 16, 0);
            assert!(frame.locals_size >= raw && frame.locals_size < raw + 16);
        }
        assert_eq!(Frame::for_slots(3).unwrap().locals_size, 32);
        assert_eq!(Frame::for_slots(4).unwrap().locals_size, 32);
    }

    #[test]
    fn test_empty_frame_is_unpadded() {
        let frame = Frame::for_slots(0).unwrap();
        assert_eq!(frame.locals_size, 0);
        assert_eq!(frame.gen_prologue(), vec![
            AsmInst::SubI(Reg::Sp, Reg::Sp, 16),
            AsmInst::Stp(Reg::FP, Reg::LR, Reg::Sp),
            AsmInst::Mov(Reg::FP, Reg::Sp),
        ]);
    }

    #[test]
    fn test_frame_with_locals() {
        let frame = Frame::for_slots(2).unwrap();

        assert_eq!(frame.total_size(), 32);
        assert_eq!(frame.gen_prologue().last(), Some(&AsmInst::SubI(Reg::Sp, Reg::Sp, 16)));
        assert_eq!(frame.gen_epilogue(), vec![
            AsmInst::AddI(Reg::Sp, Reg::Sp, 16),
            AsmInst::Ldp(Reg::FP, Reg::LR, Reg::Sp),
            AsmInst::AddI(Reg::Sp, Reg::Sp, 16),
            AsmInst::Ret,
        ]);
    }

    #[test]
    fn test_prologue_epilogue_are_inverse() {
        for slots in [0, 1, 2, 5, 16, 510, 511, 1020, 5000] {
            let frame = Frame::for_slots(slots).unwrap();
            let prologue = frame.gen_prologue();
            assert_eq!(sp_delta(&prologue), -(frame.total_size() as i64));
            assert_eq!(sp_delta(&prologue) + sp_delta(&frame.gen_epilogue()), 0);
        }
    }

    #[test]
    fn test_large_frame_is_reserved_in_steps() {
        let frame = Frame::for_slots(1100).unwrap();
        assert_eq!(frame.locals_size, 8800);

        let prologue = frame.gen_prologue();
        assert_eq!(prologue[3..].to_vec(), vec![
            AsmInst::SubI(Reg::Sp, Reg::Sp, 4080),
            AsmInst::SubI(Reg::Sp, Reg::Sp, 4080),
            AsmInst::SubI(Reg::Sp, Reg::Sp, 640),
        ]);
        assert_eq!(frame.gen_epilogue()[..3].to_vec(), vec![
            AsmInst::AddI(Reg::Sp, Reg::Sp, 4080),
            AsmInst::AddI(Reg::Sp, Reg::Sp, 4080),
            AsmInst::AddI(Reg::Sp, Reg::Sp, 640),
        ]);
    }

    #[test]
    fn test_frame_beyond_offset_range() {
        assert!(Frame::for_slots(511).is_ok());
        assert_eq!(Frame::new(u32::MAX), Err(AbiError::FrameTooLarge(u32::MAX)));
        assert!(Frame::for_slots(usize::MAX).is_err());
    }

    #[test]
    fn test_error_categories() {
        let user: CompilerError = AbiError::TooManyArguments(9, 8).into();
        let bug: CompilerError = AbiError::MisalignedFrame(24).into();
        assert!(!user.is_internal());
        assert!(bug.is_internal());
    }
}
