//! Stop events: the message a target sends when it stops (spec.md §3
//! "StopEvent"). Grounded on the teacher's `ExitType`
//! (`hypervisor::svm::vmexit::mod::ExitType`) — the return value a vmexit
//! handler hands back to the dispatch loop — generalized from "what should
//! happen next" to "why did we stop, and with what payload".

use crate::context::TaskContext;

/// Why the target stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A user breakpoint was hit.
    Breakpoint,
    /// A one-shot (stepping-internal) breakpoint was hit.
    OneShotBreakpoint,
    /// A single-step trace trap fired.
    SingleStep,
    /// An unhandled processor exception occurred.
    Exception,
    /// The target ran its image to completion.
    Exited,
    /// An internal error occurred (spec.md §7 "internal inconsistency").
    Error,
}

/// An inter-thread message carrying everything the controller needs to
/// react to a stop (spec.md §3 "StopEvent").
#[derive(Debug, Clone)]
pub struct StopEvent {
    pub reason: StopReason,
    /// Only meaningful for `StopReason::Exited`.
    pub exit_code: Option<i32>,
    /// Only meaningful for `StopReason::Error`.
    pub error_code: Option<u32>,
    /// The captured context at the moment of the stop. Absent for
    /// `Exited`/`Error` events raised before a context could be captured.
    pub context: Option<TaskContext>,
}

impl StopEvent {
    pub fn breakpoint(context: TaskContext) -> Self {
        Self {
            reason: StopReason::Breakpoint,
            exit_code: None,
            error_code: None,
            context: Some(context),
        }
    }

    pub fn one_shot_breakpoint(context: TaskContext) -> Self {
        Self {
            reason: StopReason::OneShotBreakpoint,
            exit_code: None,
            error_code: None,
            context: Some(context),
        }
    }

    pub fn single_step(context: TaskContext) -> Self {
        Self {
            reason: StopReason::SingleStep,
            exit_code: None,
            error_code: None,
            context: Some(context),
        }
    }

    pub fn exception(context: TaskContext) -> Self {
        Self {
            reason: StopReason::Exception,
            exit_code: None,
            error_code: None,
            context: Some(context),
        }
    }

    pub fn exited(exit_code: i32) -> Self {
        Self {
            reason: StopReason::Exited,
            exit_code: Some(exit_code),
            error_code: None,
            context: None,
        }
    }

    pub fn error(error_code: u32) -> Self {
        Self {
            reason: StopReason::Error,
            exit_code: None,
            error_code: Some(error_code),
            context: None,
        }
    }
}
