//! The supervisor-mode exception dispatcher, reduced to its decision logic
//! (spec.md §4.2). The actual privilege transition and the cross-thread
//! handoff to the debugger live in the `cwdbg` host crate's bootstrap
//! stub/controller, since those are concurrency concerns (spec.md §5), not
//! data-model logic. What belongs here is the part spec.md §4.2 describes
//! as decoding the cause from the exception vector.
//!
//! Grounded on `hypervisor::svm::vmexit::mod::handle_vmexit`'s "look at the
//! exit code, classify, act" shape — the same shape spec.md §4.2's table
//! describes one level down the privilege stack.

use crate::isa::{VECTOR_TRACE, VECTOR_TRAP_BP, VECTOR_TRAP_RESTORE};
use crate::stop::StopReason;
use log::trace;

/// The cause a given exception vector decodes to, per spec.md §4.2's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    BreakpointTrap,
    RestoreTrap,
    Trace,
    Other,
}

/// Classifies an exception vector number into a dispatch cause.
pub fn classify(vector: u32) -> Cause {
    let cause = match vector {
        VECTOR_TRAP_BP => Cause::BreakpointTrap,
        VECTOR_TRAP_RESTORE => Cause::RestoreTrap,
        VECTOR_TRACE => Cause::Trace,
        _ => Cause::Other,
    };
    trace!("exception vector {vector} classified as {cause:?}");
    cause
}

/// Maps a breakpoint-hit cause to the right stop reason, given whether the
/// breakpoint that was hit turned out to be one-shot (spec.md §3: the
/// `stopped-by-breakpoint` vs `stopped-by-one-shot-breakpoint` bits are
/// distinct).
pub fn breakpoint_stop_reason(one_shot: bool) -> StopReason {
    if one_shot {
        StopReason::OneShotBreakpoint
    } else {
        StopReason::Breakpoint
    }
}
