//! Continue vs. single-step mode transitions (spec.md §4.5).

use crate::context::TaskContext;
use crate::isa::{SR_TRACE_AND_MASK_FULL, SR_TRACE_BIT};
use log::trace;

/// Which of the two resume modes the front-end requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    Continue,
    SingleStep,
}

/// Applies the status-register bit changes spec.md §4.5 describes, given
/// whether a breakpoint is still disarmed and waiting to be stepped over.
///
/// - `single_step`: always sets T1 and the full interrupt mask.
/// - `continue`, with an active (disarmed) breakpoint: also sets T1 and the
///   full interrupt mask, so the restore handler walks one instruction over
///   the disarmed site before re-arming it. Without an active breakpoint,
///   `continue` leaves the status register untouched.
///
/// The interrupt mask must be raised in trace mode because a pending
/// interrupt dispatched by the OS under trace would deliver its handler
/// with the trace bit live, misrouting the next trace trap to the OS's
/// fault handler (spec.md §4.5).
pub fn apply(mode: ResumeMode, active_breakpoint_present: bool, context: &mut TaskContext) {
    match mode {
        ResumeMode::SingleStep => {
            context.sr |= SR_TRACE_AND_MASK_FULL;
            trace!("single-step: sr now {:#06x}", context.sr);
        }
        ResumeMode::Continue => {
            if active_breakpoint_present {
                context.sr |= SR_TRACE_AND_MASK_FULL;
                trace!("continue over active breakpoint: sr now {:#06x}", context.sr);
            }
        }
    }
}

/// Clears the trace bit, as the trace handler does once a stepped-over
/// breakpoint has been re-armed and the user did not explicitly ask to
/// single-step (spec.md §4.4: "unless the user explicitly asked to
/// single-step — clears the trace bit and resumes normally").
pub fn clear_trace_bit(context: &mut TaskContext) {
    context.sr &= !SR_TRACE_BIT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_without_active_breakpoint_leaves_sr_untouched() {
        let mut ctx = TaskContext {
            sr: 0x2000,
            ..Default::default()
        };
        apply(ResumeMode::Continue, false, &mut ctx);
        assert_eq!(ctx.sr, 0x2000);
    }

    #[test]
    fn continue_with_active_breakpoint_sets_trace_and_mask() {
        let mut ctx = TaskContext {
            sr: 0x2000,
            ..Default::default()
        };
        apply(ResumeMode::Continue, true, &mut ctx);
        assert_eq!(ctx.sr, 0x2000 | SR_TRACE_AND_MASK_FULL);
    }

    #[test]
    fn single_step_always_sets_trace_and_mask() {
        let mut ctx = TaskContext::default();
        apply(ResumeMode::SingleStep, false, &mut ctx);
        assert_eq!(ctx.sr, SR_TRACE_AND_MASK_FULL);
    }

    #[test]
    fn clear_trace_bit_only_clears_t1() {
        let mut ctx = TaskContext {
            sr: SR_TRACE_AND_MASK_FULL,
            ..Default::default()
        };
        clear_trace_bit(&mut ctx);
        assert_eq!(ctx.sr, SR_TRACE_AND_MASK_FULL & !SR_TRACE_BIT);
    }
}
