//! Target liveness and stop-cause flags (spec.md §3 "TargetState").
//!
//! Modeled as a bitset rather than an enum, per spec.md: liveness and
//! stop-cause are independent axes and several `stopped-by-*` bits can in
//! principle coexist with bookkeeping state. This mirrors how the teacher
//! crate represents VMCB intercept/control bits with `bitflags!`
//! (`hypervisor::svm::vmcb::control_area::{InterceptMisc1, NpEnable}`)
//! rather than an enum, for exactly the same reason: several of these
//! conditions are independent and can be set at once.

use bitflags::bitflags;

bitflags! {
    /// Liveness and stop-cause flags for a single target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TargetState: u32 {
        /// No target has been created yet, or it was just reset.
        const IDLE = 1 << 0;
        /// The target process exists and is not currently stopped.
        const RUNNING = 1 << 1;
        /// The controller is single-stepping the target (orthogonal to the
        /// `STOPPED_BY_*` bits, per spec.md §3).
        const SINGLE_STEPPING = 1 << 2;
        /// The target ran its image to completion.
        const EXITED = 1 << 3;
        /// The target was forcibly terminated by the user.
        const KILLED = 1 << 4;
        /// Internal inconsistency or resource exhaustion occurred.
        const ERROR = 1 << 5;
        /// Stopped because a user breakpoint was hit.
        const STOPPED_BY_BREAKPOINT = 1 << 6;
        /// Stopped because a one-shot (stepping-internal) breakpoint was hit.
        const STOPPED_BY_ONE_SHOT_BREAKPOINT = 1 << 7;
        /// Stopped because of a single-step trace trap.
        const STOPPED_BY_SINGLE_STEP = 1 << 8;
        /// Stopped because of an unhandled processor exception.
        const STOPPED_BY_EXCEPTION = 1 << 9;
    }
}

impl TargetState {
    /// All `STOPPED_BY_*` bits, for the invariant in spec.md §3: "when not
    /// *running*, none of the *stopped-by-\** bits may be set."
    pub const STOPPED_MASK: TargetState = TargetState::STOPPED_BY_BREAKPOINT
        .union(TargetState::STOPPED_BY_ONE_SHOT_BREAKPOINT)
        .union(TargetState::STOPPED_BY_SINGLE_STEP)
        .union(TargetState::STOPPED_BY_EXCEPTION);

    /// True while the invariant "`RUNNING` mutually exclusive with
    /// `EXITED`/`KILLED`/`ERROR`" (spec.md §8) holds for this value.
    pub fn is_well_formed(self) -> bool {
        let terminal = TargetState::EXITED | TargetState::KILLED | TargetState::ERROR;
        if self.contains(TargetState::RUNNING) && self.intersects(terminal) {
            return false;
        }
        if !self.contains(TargetState::RUNNING) && self.intersects(TargetState::STOPPED_MASK) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_and_exited_is_not_well_formed() {
        let s = TargetState::RUNNING | TargetState::EXITED;
        assert!(!s.is_well_formed());
    }

    #[test]
    fn stopped_bit_without_running_is_not_well_formed() {
        let s = TargetState::STOPPED_BY_BREAKPOINT;
        assert!(!s.is_well_formed());
    }

    #[test]
    fn running_and_stopped_by_breakpoint_is_well_formed() {
        let s = TargetState::RUNNING | TargetState::STOPPED_BY_BREAKPOINT;
        assert!(s.is_well_formed());
    }

    #[test]
    fn idle_is_well_formed() {
        assert!(TargetState::IDLE.is_well_formed());
    }
}
