//! Physical Register Pool
//!
//! A fixed set of 32 register ids, each either available or in use. Lowering
//! takes scratch registers from the pool and hands them back when the
//! instruction is done; nothing is ever spilled to memory.

use crate::asm::Reg;
use kestrel_common::CompilerError;
use log::trace;
use thiserror::Error;

/// Number of general purpose register ids on the target
pub const POOL_SIZE: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegPoolError {
    #[error("No available registers in the pool")]
    Exhausted,

    #[error("Invalid register id: {0}")]
    InvalidRegister(u8),
}

impl From<RegPoolError> for CompilerError {
    fn from(err: RegPoolError) -> Self {
        CompilerError::internal_error(err.to_string())
    }
}

/// A register id handed out by the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysReg(u8);

impl PhysReg {
    pub fn new(id: u8) -> Result<Self, RegPoolError> {
        if id as usize >= POOL_SIZE {
            return Err(RegPoolError::InvalidRegister(id));
        }
        Ok(PhysReg(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    /// The 64-bit register this id names
    pub fn reg(&self) -> Reg {
        Reg::X(self.0)
    }
}

/// Availability table over all register ids
#[derive(Debug, Clone)]
pub struct RegisterPool {
    in_use: [bool; POOL_SIZE],
    reserved: [bool; POOL_SIZE],
}

impl Default for RegisterPool {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterPool {
    /// A pool with every id available
    pub fn new() -> Self {
        Self {
            in_use: [false; POOL_SIZE],
            reserved: [false; POOL_SIZE],
        }
    }

    /// A pool holding only the caller-saved temporaries x9-x15
    ///
    /// Argument registers, the intra-procedure scratch and platform
    /// registers, the callee-saved bank, fp, lr and sp/xzr are reserved.
    pub fn for_aarch64() -> Self {
        let mut pool = Self::new();
        let reserved = (0..=8).chain(16..=18).chain(19..=28).chain(29..=31);
        for id in reserved {
            pool.reserved[id] = true;
        }
        pool
    }

    /// Take the lowest available register id
    pub fn acquire(&mut self) -> Result<PhysReg, RegPoolError> {
        let id = (0..POOL_SIZE)
            .find(|&id| !self.in_use[id] && !self.reserved[id])
            .ok_or(RegPoolError::Exhausted)?;
        self.in_use[id] = true;
        trace!("regpool: acquired x{}", id);
        Ok(PhysReg(id as u8))
    }

    /// Return a register to the pool; releasing a free register is a no-op
    pub fn release(&mut self, reg: PhysReg) {
        if self.in_use[reg.0 as usize] {
            trace!("regpool: released x{}", reg.0);
        }
        self.in_use[reg.0 as usize] = false;
    }

    /// Remove an id from circulation for the lifetime of the pool
    pub fn reserve(&mut self, id: u8) -> Result<(), RegPoolError> {
        let reg = PhysReg::new(id)?;
        self.reserved[reg.0 as usize] = true;
        Ok(())
    }

    pub fn is_available(&self, reg: PhysReg) -> bool {
        !self.in_use[reg.0 as usize] && !self.reserved[reg.0 as usize]
    }

    /// Number of ids that `acquire` could still hand out
    pub fn available(&self) -> usize {
        (0..POOL_SIZE)
            .filter(|&id| !self.in_use[id] && !self.reserved[id])
            .count()
    }

    /// Number of ids currently acquired
    pub fn in_use(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }
}
