//! The target bootstrap stub. On real hardware this is the few lines of
//! assembly that run first in the new process: install the trap/trace
//! vectors, signal the debugger, and jump to the loaded image's entry
//! point. Our target is a `std::thread` rather than a cooperatively
//! scheduled OS process, so "installing vectors" has no separate
//! counterpart here; dispatch is just a function this loop calls directly.
//! The rest of the sequence (signal readiness, wait for permission, then
//! start executing, reporting every stop back across the rendezvous) is
//! preserved exactly.

use std::sync::{Arc, Mutex};

use cwdbg_core::dispatch::{self, Cause};
use cwdbg_core::interp::{self, StepOutcome};
use cwdbg_core::isa::{SR_TRACE_BIT, VECTOR_TRACE};
use cwdbg_core::patch::AddressSpace;
use cwdbg_core::{mode, StopEvent, TaskContext};
use log::{trace, warn};

use crate::dispatcher::{self, DispatcherHandle};
use crate::ipc::TargetSide;

/// Runs on the target thread from the moment it is spawned until the
/// target exits, is killed, or its rendezvous partner disappears.
///
/// `memory` and `context` are shared with the controller (both sides live
/// in one address space); the controller only touches either while this
/// function is blocked inside
/// [`TargetSide::stop_and_wait_for_resume`].
pub fn run(memory: Arc<Mutex<AddressSpace>>, context: Arc<Mutex<TaskContext>>, target: TargetSide) {
    dispatcher::install(DispatcherHandle {
        memory: memory.clone(),
        context: context.clone(),
    });
    target.signal_ready();
    target.wait_for_begin();
    trace!("target thread released, starting execution");

    loop {
        let outcome = {
            let mut ctx = context.lock().unwrap();
            let mem = memory.lock().unwrap();
            interp::step(&mut ctx, &mem)
        };

        let event = match outcome {
            Ok(StepOutcome::Advanced) => {
                let tracing = context.lock().unwrap().sr & SR_TRACE_BIT != 0;
                if !tracing {
                    continue;
                }
                let mut ctx = context.lock().unwrap();
                ctx.last_exception = VECTOR_TRACE;
                // spec.md §4.2: "trace trap... clear trace bit on outgoing
                // status register" — cleared here at save time, not left for
                // the controller's silent step-over path to clean up later.
                mode::clear_trace_bit(&mut ctx);
                StopEvent::single_step(*ctx)
            }
            Ok(StepOutcome::Returned) => StopEvent::exited(0),
            Ok(StepOutcome::Trap { vector }) => {
                let mut ctx = context.lock().unwrap();
                ctx.last_exception = vector;
                let snapshot = *ctx;
                drop(ctx);
                match dispatch::classify(vector) {
                    Cause::BreakpointTrap => StopEvent::breakpoint(snapshot),
                    // The restore trap is an internal resume mechanism,
                    // not something a loaded image ever executes; seeing
                    // one here means the image patched something it
                    // shouldn't have.
                    Cause::RestoreTrap => {
                        warn!("unexpected restore trap at {:#x}", snapshot.pc);
                        StopEvent::error(vector)
                    }
                    Cause::Trace | Cause::Other => StopEvent::exception(snapshot),
                }
            }
            Err(err) => {
                warn!("target interpreter error: {err}");
                StopEvent::error(0)
            }
        };

        let is_terminal = matches!(event.reason, cwdbg_core::StopReason::Exited | cwdbg_core::StopReason::Error);
        if target.stop_and_wait_for_resume(event).is_err() || is_terminal {
            dispatcher::uninstall();
            return;
        }
    }
}
