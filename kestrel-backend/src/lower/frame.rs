//! Frame Layout
//!
//! Assigns every register a function defines its own 8-byte stack slot below
//! the frame pointer. Parameters are not given slots: they stay in the
//! argument registers they arrive in.

use std::collections::BTreeMap;
use kestrel_codegen::{AbiError, CallingConvention, Frame};
use kestrel_common::VReg;
use kestrel_frontend::FuncFrag;
use log::{debug, trace};

/// Where a virtual register lives while its function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Stack slot at `[x29, #offset]`
    Slot(i32),
    /// Argument register xN
    Param(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    slots: BTreeMap<VReg, i32>,
    params: BTreeMap<VReg, u8>,
    frame: Frame,
}

impl FrameLayout {
    /// Scan the fragment in order and give each newly seen target the next slot down
    pub fn compute(frag: &FuncFrag) -> Result<Self, AbiError> {
        if frag.params.len() > CallingConvention::MAX_REG_PARAMS {
            return Err(AbiError::TooManyParameters(frag.params.len(), CallingConvention::MAX_REG_PARAMS));
        }

        let mut params = BTreeMap::new();
        for (index, vreg) in frag.params.iter().enumerate() {
            params.entry(*vreg).or_insert(index as u8);
        }

        let mut slots = BTreeMap::new();
        let mut offset = 0i32;
        for inst in &frag.body {
            for target in inst.targets() {
                if params.contains_key(&target) || slots.contains_key(&target) {
                    continue;
                }
                offset -= CallingConvention::SLOT_SIZE as i32;
                trace!("{}: {} -> [x29, #{}]", frag.label, target, offset);
                slots.insert(target, offset);
            }
        }

        let frame = Frame::for_slots(slots.len())?;
        debug!(
            "{}: {} slot(s), {} param(s), frame {} -> {} bytes",
            frag.label,
            slots.len(),
            params.len(),
            frame.raw_size,
            frame.locals_size
        );

        Ok(Self { slots, params, frame })
    }

    pub fn location(&self, vreg: VReg) -> Option<Location> {
        if let Some(index) = self.params.get(&vreg) {
            return Some(Location::Param(*index));
        }
        self.slots.get(&vreg).map(|offset| Location::Slot(*offset))
    }

    pub fn slot(&self, vreg: VReg) -> Option<i32> {
        self.slots.get(&vreg).copied()
    }

    pub fn param_index(&self, vreg: VReg) -> Option<u8> {
        self.params.get(&vreg).copied()
    }

    /// Parameter register indices in ascending order
    pub fn param_indices(&self) -> Vec<u8> {
        let mut indices: Vec<u8> = self.params.values().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_common::VRegAllocator;
    use kestrel_frontend::ir::{BinaryOp, FragBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slots_in_definition_order() {
        let mut vregs = VRegAllocator::new();
        let mut b = FragBuilder::new("main", &mut vregs);
        let x = b.mov(1i64);
        let y = b.mov(2i64);
        let z = b.binary(BinaryOp::Add, x, y);
        b.assign(x, z).ret(Some(x));
        let layout = FrameLayout::compute(&b.finish()).unwrap();

        assert_eq!(layout.slot(x), Some(-8));
        assert_eq!(layout.slot(y), Some(-16));
        assert_eq!(layout.slot(z), Some(-24));
        assert_eq!(layout.slot_count(), 3);
        assert_eq!(layout.frame().raw_size, 24);
        assert_eq!(layout.frame().locals_size, 32);
    }

    #[test]
    fn test_frame_size_matches_defined_registers() {
        for count in 0..10 {
            let mut vregs = VRegAllocator::new();
            let mut b = FragBuilder::new("f", &mut vregs);
            for i in 0..count {
                b.mov(i as i64);
            }
            let layout = FrameLayout::compute(&b.finish()).unwrap();
            let raw = 8 * count as u32;
            assert_eq!(layout.frame().raw_size, raw);
            assert_eq!(layout.frame().locals_size, raw.div_ceil(16) * 16);
        }
    }

    #[test]
    fn test_params_have_no_slots() {
        let mut vregs = VRegAllocator::new();
        let mut b = FragBuilder::new("inc", &mut vregs);
        let p = b.param();
        b.assign(p, 5i64);
        let t = b.binary(BinaryOp::Add, p, 1i64);
        b.ret(Some(t));
        let layout = FrameLayout::compute(&b.finish()).unwrap();

        assert_eq!(layout.location(p), Some(Location::Param(0)));
        assert_eq!(layout.location(t), Some(Location::Slot(-8)));
        assert_eq!(layout.location(VReg(99)), None);
        assert_eq!(layout.param_indices(), vec![0]);
    }

    #[test]
    fn test_too_many_params() {
        let frag = FuncFrag::new("wide").with_params((0..9).map(VReg).collect());
        assert_eq!(FrameLayout::compute(&frag), Err(AbiError::TooManyParameters(9, 8)));
    }
}
