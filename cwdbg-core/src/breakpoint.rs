//! The breakpoint table (spec.md §3 "Breakpoint", §4.4).

use crate::error::{CoreError, NotEnoughMemorySnafu, UnknownBreakpointSnafu};
use crate::isa::TRAP_BP_OPCODE;
use crate::patch::AddressSpace;
use log::{info, trace};
use snafu::{ensure, OptionExt};

/// A single installed breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// Unique number, assigned monotonically starting at 1. Never reused
    /// within a debugger session (spec.md §3 invariant).
    pub number: u32,
    /// Absolute address in the loaded image.
    pub address: u32,
    /// The opcode the trap displaced; written back on removal.
    pub original_opcode: u16,
    /// Number of times this breakpoint has been hit during the current run.
    pub hit_count: u32,
    /// One-shot breakpoints are removed after their first hit (used to step
    /// over subroutine calls); user-set breakpoints are not.
    pub one_shot: bool,
}

/// The ordered collection of installed breakpoints, plus the bookkeeping
/// the upper-half dispatcher needs to know which one is temporarily
/// disarmed mid-step.
///
/// Grounded on `HookManager` in the teacher crate (`Vec<Hook>` plus linear
/// `find_hook`/`find_hook_by_address` lookups) — the same "small table,
/// linear scan, numbered/keyed entries" shape, generalized from page hooks
/// to instruction breakpoints.
#[derive(Default)]
pub struct BreakpointTable {
    entries: Vec<Breakpoint>,
    next_number: u32,
    /// Tagged index (breakpoint number) of the breakpoint just hit and
    /// temporarily disarmed, per spec.md §9's suggested alternative to a
    /// raw weak pointer ("A tagged-index design... is a clean alternative
    /// to raw pointers").
    active: Option<u32>,
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_number: 1,
            active: None,
        }
    }

    /// Installs a breakpoint at `entry_point + offset`. Returns the
    /// assigned breakpoint number.
    ///
    /// spec.md §8 scenario 5: it is the front-end's responsibility never to
    /// call this while the target is running — the core's contract only
    /// guarantees safety while stopped (spec.md §5). This is an API
    /// contract, not something enforced by a runtime check here.
    pub fn set(
        &mut self, memory: &mut AddressSpace, entry_point: u32, offset: u32, one_shot: bool,
    ) -> Result<u32, CoreError> {
        ensure!(self.entries.len() < u32::MAX as usize, NotEnoughMemorySnafu);

        let address = entry_point + offset;
        let original_opcode = memory.read_opcode(address)?;
        memory.write_opcode(address, TRAP_BP_OPCODE)?;

        let number = self.next_number;
        self.next_number += 1;
        self.entries.push(Breakpoint {
            number,
            address,
            original_opcode,
            hit_count: 0,
            one_shot,
        });
        info!("breakpoint {number} installed at {address:#x} (one_shot={one_shot})");
        Ok(number)
    }

    /// Removes the breakpoint, restoring the original opcode.
    pub fn clear(&mut self, memory: &mut AddressSpace, number: u32) -> Result<(), CoreError> {
        let idx = self
            .entries
            .iter()
            .position(|b| b.number == number)
            .context(UnknownBreakpointSnafu { number })?;
        let bp = self.entries.remove(idx);
        memory.write_opcode(bp.address, bp.original_opcode)?;

        if self.active == Some(number) {
            self.active = None;
        }
        info!("breakpoint {number} cleared at {:#x}", bp.address);
        Ok(())
    }

    pub fn find_by_address(&self, address: u32) -> Option<&Breakpoint> {
        self.entries.iter().find(|b| b.address == address)
    }

    fn find_by_address_mut(&mut self, address: u32) -> Option<&mut Breakpoint> {
        self.entries.iter_mut().find(|b| b.address == address)
    }

    pub fn find_by_number(&self, number: u32) -> Option<&Breakpoint> {
        self.entries.iter().find(|b| b.number == number)
    }

    pub fn active(&self) -> Option<&Breakpoint> {
        self.active.and_then(|n| self.find_by_number(n))
    }

    /// Called at the start of each run (spec.md §4.4).
    pub fn reset_hit_counts(&mut self) {
        for bp in &mut self.entries {
            bp.hit_count = 0;
        }
        self.active = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries.iter()
    }

    /// Handles a breakpoint hit at `address`: disarms it (writes back the
    /// original opcode so a single step can pass through), bumps its hit
    /// count, and remembers it as the active breakpoint — unless it's
    /// one-shot, in which case it is removed outright (spec.md §4.4:
    /// "One-shot breakpoints skip the re-arm step; they are removed from
    /// the table after the hit is handled.").
    ///
    /// Returns the breakpoint number that was hit, or
    /// [`CoreError::UnmatchedBreakpointFixup`] if nothing in the table is
    /// installed at `address` (spec.md §4.3's internal-error case).
    pub fn handle_hit(&mut self, memory: &mut AddressSpace, address: u32) -> Result<u32, CoreError> {
        let bp = self
            .find_by_address_mut(address)
            .ok_or(CoreError::UnmatchedBreakpointFixup { address })?;
        bp.hit_count += 1;
        let number = bp.number;
        let one_shot = bp.one_shot;
        let original_opcode = bp.original_opcode;
        let hit_count = bp.hit_count;

        memory.write_opcode(address, original_opcode)?;
        trace!("breakpoint {number} hit at {address:#x} (hit_count={hit_count})");

        if one_shot {
            self.entries.retain(|b| b.number != number);
            if self.active == Some(number) {
                self.active = None;
            }
        } else {
            self.active = Some(number);
        }
        Ok(number)
    }

    /// Re-arms the active breakpoint (writes the trap opcode back) and
    /// clears the active pointer, as the trace handler does after stepping
    /// over it (spec.md §4.4).
    pub fn rearm_active(&mut self, memory: &mut AddressSpace) -> Result<(), CoreError> {
        let Some(number) = self.active else {
            return Ok(());
        };
        if let Some(bp) = self.entries.iter().find(|b| b.number == number) {
            memory.write_opcode(bp.address, TRAP_BP_OPCODE)?;
            trace!("breakpoint {number} re-armed at {:#x}", bp.address);
        }
        self.active = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> AddressSpace {
        // NOP; NOP; RTS
        AddressSpace::new(0x1000, vec![0x4E, 0x71, 0x4E, 0x71, 0x4E, 0x75])
    }

    #[test]
    fn set_then_clear_restores_original_bytes() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        let num = table.set(&mut mem, 0x1000, 0, false).unwrap();
        assert_eq!(mem.read_opcode(0x1000).unwrap(), TRAP_BP_OPCODE);

        table.clear(&mut mem, num).unwrap();
        assert_eq!(mem.read_opcode(0x1000).unwrap(), 0x4E71);
    }

    #[test]
    fn breakpoint_numbers_increase_monotonically() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        let a = table.set(&mut mem, 0x1000, 0, false).unwrap();
        let b = table.set(&mut mem, 0x1000, 2, false).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn clearing_active_breakpoint_nulls_active_pointer() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        let num = table.set(&mut mem, 0x1000, 0, false).unwrap();
        table.handle_hit(&mut mem, 0x1000).unwrap();
        assert_eq!(table.active().map(|b| b.number), Some(num));

        table.clear(&mut mem, num).unwrap();
        assert!(table.active().is_none());
    }

    #[test]
    fn one_shot_breakpoint_is_removed_after_hit() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        let num = table.set(&mut mem, 0x1000, 2, true).unwrap();
        table.handle_hit(&mut mem, 0x1002).unwrap();

        assert!(table.find_by_number(num).is_none());
        assert_eq!(mem.read_opcode(0x1002).unwrap(), 0x4E71);
    }

    #[test]
    fn clearing_unknown_breakpoint_fails() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        assert!(matches!(
            table.clear(&mut mem, 42),
            Err(CoreError::UnknownBreakpoint { number: 42 })
        ));
    }

    #[test]
    fn rearm_restores_trap_and_clears_active() {
        let mut mem = image();
        let mut table = BreakpointTable::new();
        table.set(&mut mem, 0x1000, 0, false).unwrap();
        table.handle_hit(&mut mem, 0x1000).unwrap();
        assert_eq!(mem.read_opcode(0x1000).unwrap(), 0x4E71);

        table.rearm_active(&mut mem).unwrap();
        assert_eq!(mem.read_opcode(0x1000).unwrap(), TRAP_BP_OPCODE);
        assert!(table.active().is_none());
    }
}
