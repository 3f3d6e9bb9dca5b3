//! The fixed-layout task context snapshot (spec.md §3 "TaskContext").
//!
//! Field offsets are part of the contract: in the original system the
//! supervisor-mode dispatcher addresses these fields by literal offset from
//! assembly. We don't carry real 68k assembly in this crate, but we keep the
//! same ABI discipline the teacher crate uses for its own privileged-mode
//! handoff structures (`hypervisor::svm::data::processor_data::ProcessorData`):
//! `#[repr(C)]` plus `const_assert_eq!` on every offset that matters, so a
//! layout change is a compile error, not a silent runtime corruption.
//!
//! ```text
//!  offset  field
//!  0x00    usp             user stack pointer
//!  0x04    last_exception  vector number that produced this snapshot
//!  0x08    sr              status register (16 bits)
//!  0x0C    pc              program counter to resume at (repr(C) pads sr to a 4-byte boundary)
//!  0x10    d[0..8]         data registers D0..D7
//!  0x30    a[0..7]         address registers A0..A6 (A7 is `usp` above)
//! ```

use static_assertions::const_assert_eq;

/// Number of data registers (D0..D7).
pub const NUM_DATA_REGISTERS: usize = 8;

/// Number of general address registers excluding the stack pointer
/// (A0..A6; A7 is the stack pointer, stored separately as `usp`).
pub const NUM_ADDRESS_REGISTERS: usize = 7;

/// A complete snapshot of the CPU state at the moment of a stop.
///
/// One instance is reserved per target and reused (spec.md §3: "Lifetime:
/// one instance is statically reserved for the target and reused; it is
/// valid only while the target is stopped.").
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskContext {
    /// User stack pointer (A7).
    pub usp: u32,
    /// Vector number of the exception that produced this snapshot.
    pub last_exception: u32,
    /// Status register at the moment of the stop.
    pub sr: u16,
    /// Program counter — the instruction to resume at.
    pub pc: u32,
    /// Data registers D0..D7.
    pub d: [u32; NUM_DATA_REGISTERS],
    /// Address registers A0..A6.
    pub a: [u32; NUM_ADDRESS_REGISTERS],
}

const_assert_eq!(core::mem::offset_of!(TaskContext, usp), 0x00);
const_assert_eq!(core::mem::offset_of!(TaskContext, last_exception), 0x04);
const_assert_eq!(core::mem::offset_of!(TaskContext, sr), 0x08);
const_assert_eq!(core::mem::offset_of!(TaskContext, pc), 0x0C);
const_assert_eq!(core::mem::offset_of!(TaskContext, d), 0x10);
const_assert_eq!(core::mem::offset_of!(TaskContext, a), 0x30);

impl TaskContext {
    /// Rewinds the program counter by one opcode width. Used by the
    /// breakpoint-hit fix-up in spec.md §4.3: "the saved program counter
    /// points to the instruction after the trap... rewinds the program
    /// counter by two bytes".
    pub fn rewind_past_trap(&mut self) {
        self.pc -= crate::isa::OPCODE_WIDTH;
    }

    /// Reads data register `Dn`.
    pub fn dn(&self, n: usize) -> u32 {
        self.d[n]
    }

    /// Reads address register `An` (`n` in 0..7; use `usp` directly for A7).
    pub fn an(&self, n: usize) -> u32 {
        self.a[n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_all_zero() {
        let ctx = TaskContext::default();
        assert_eq!(ctx.pc, 0);
        assert_eq!(ctx.d, [0; NUM_DATA_REGISTERS]);
        assert_eq!(ctx.a, [0; NUM_ADDRESS_REGISTERS]);
    }

    #[test]
    fn rewind_past_trap_subtracts_opcode_width() {
        let mut ctx = TaskContext {
            pc: 0x1006,
            ..Default::default()
        };
        ctx.rewind_past_trap();
        assert_eq!(ctx.pc, 0x1004);
    }
}
