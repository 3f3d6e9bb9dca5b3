//! A deliberately minimal 68000 fetch/execute loop standing in for real
//! target hardware (see SPEC_FULL.md §4.9). This is NOT a disassembler or
//! a general emulator — it recognizes exactly the opcodes this crate's
//! dispatcher needs to exercise (`NOP`, `RTS`, the two trap opcodes, and
//! `ILLEGAL`) and treats anything else as the "anything else" exception
//! path from spec.md §4.2's dispatch table, which is what a real CPU does
//! when it meets an opcode it cannot decode.

use crate::context::TaskContext;
use crate::isa::{
    ILLEGAL_OPCODE, NOP_OPCODE, RTS_OPCODE, TRAP_BP_OPCODE, TRAP_RESTORE_OPCODE,
    VECTOR_ILLEGAL_INSTRUCTION, VECTOR_TRAP_BP, VECTOR_TRAP_RESTORE,
};
use crate::patch::AddressSpace;
use crate::error::CoreError;

/// What happened when [`step`] executed one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An ordinary instruction completed; `pc` already points past it.
    Advanced,
    /// `RTS` executed with nothing on the synthetic call stack — the
    /// target's entry routine returned, i.e. the program is done.
    Returned,
    /// An exception was raised. `pc` reflects where the hardware would
    /// leave it: past the faulting opcode for a trap instruction (it
    /// completed before raising its software interrupt), at the faulting
    /// opcode itself for a true fault like an illegal instruction (it
    /// never completed).
    Trap { vector: u32 },
}

/// Executes one instruction at `ctx.pc`, mutating `ctx.pc` as the hardware
/// would for that instruction (see [`StepOutcome`] for exactly when).
pub fn step(ctx: &mut TaskContext, memory: &AddressSpace) -> Result<StepOutcome, CoreError> {
    let opcode = memory.read_opcode(ctx.pc)?;
    match opcode {
        NOP_OPCODE => {
            ctx.pc += 2;
            Ok(StepOutcome::Advanced)
        }
        RTS_OPCODE => Ok(StepOutcome::Returned),
        TRAP_BP_OPCODE => {
            ctx.pc += 2;
            Ok(StepOutcome::Trap {
                vector: VECTOR_TRAP_BP,
            })
        }
        TRAP_RESTORE_OPCODE => {
            ctx.pc += 2;
            Ok(StepOutcome::Trap {
                vector: VECTOR_TRAP_RESTORE,
            })
        }
        ILLEGAL_OPCODE => Ok(StepOutcome::Trap {
            vector: VECTOR_ILLEGAL_INSTRUCTION,
        }),
        _ => {
            // Unrecognized opcode: this interpreter only implements the
            // handful of instructions this crate's tests need, so treat
            // anything else the same way a real 68000 treats an opcode
            // with no valid decode — an illegal-instruction fault.
            Ok(StepOutcome::Trap {
                vector: VECTOR_ILLEGAL_INSTRUCTION,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> AddressSpace {
        AddressSpace::new(0x1000, vec![0x4E, 0x71, 0x4E, 0x71, 0x4E, 0x75])
    }

    #[test]
    fn nop_advances_pc_by_two() {
        let mem = image();
        let mut ctx = TaskContext {
            pc: 0x1000,
            ..Default::default()
        };
        assert_eq!(step(&mut ctx, &mem).unwrap(), StepOutcome::Advanced);
        assert_eq!(ctx.pc, 0x1002);
    }

    #[test]
    fn rts_at_top_level_returns() {
        let mem = image();
        let mut ctx = TaskContext {
            pc: 0x1004,
            ..Default::default()
        };
        assert_eq!(step(&mut ctx, &mem).unwrap(), StepOutcome::Returned);
    }

    #[test]
    fn illegal_instruction_faults_without_advancing_pc() {
        let mem = AddressSpace::new(0x1000, vec![0x4E, 0x71, 0x4E, 0x71, 0x4A, 0xFC]);
        let mut ctx = TaskContext {
            pc: 0x1004,
            ..Default::default()
        };
        let outcome = step(&mut ctx, &mem).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Trap {
                vector: VECTOR_ILLEGAL_INSTRUCTION
            }
        );
        assert_eq!(ctx.pc, 0x1004);
    }

    #[test]
    fn trap_opcode_advances_pc_past_itself() {
        let mem = AddressSpace::new(0x1000, vec![0x4E, 0x40, 0x4E, 0x71]);
        let mut ctx = TaskContext {
            pc: 0x1000,
            ..Default::default()
        };
        let outcome = step(&mut ctx, &mem).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Trap {
                vector: VECTOR_TRAP_BP
            }
        );
        assert_eq!(ctx.pc, 0x1002);
    }
}
