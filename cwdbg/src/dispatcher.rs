//! The process-wide "known location" the exception dispatcher consults to
//! find the currently installed target (spec.md §9 "Global-ish state":
//! "an implementation should make this dependence explicit: the exception
//! dispatcher holds a pointer stored at a known location at install time,
//! and that pointer is the only ambient state; everything else is passed
//! by argument.").
//!
//! Grounded on the teacher crate's use of `once_cell` for a process-wide
//! singleton in `driver` (see DESIGN.md) — the same "one slot, installed
//! once, looked up from code that has no other way to reach it" shape,
//! generalized here from a driver-wide handler table to the one target a
//! debugger session ever has installed at a time (spec.md §1 Non-goals:
//! multi-threaded targets are out of scope, so one slot is always enough).

use std::sync::{Arc, Mutex};

use cwdbg_core::patch::AddressSpace;
use cwdbg_core::TaskContext;
use once_cell::sync::OnceCell;

/// The shared handles the dispatcher needs to find the installed target's
/// memory and task context. Everything else the dispatcher touches is
/// passed to it by argument (spec.md §9).
#[derive(Clone)]
pub struct DispatcherHandle {
    pub memory: Arc<Mutex<AddressSpace>>,
    pub context: Arc<Mutex<TaskContext>>,
}

static INSTALLED: OnceCell<Mutex<Option<DispatcherHandle>>> = OnceCell::new();

fn slot() -> &'static Mutex<Option<DispatcherHandle>> {
    INSTALLED.get_or_init(|| Mutex::new(None))
}

/// Installs the dispatcher handle for the target about to run (spec.md
/// §4.7: "Installs the dispatcher as the task-level exception handler.").
/// Replaces whatever was installed before — this debugger runs one target
/// at a time, so there is never a second handle to preserve.
pub fn install(handle: DispatcherHandle) {
    *slot().lock().unwrap() = Some(handle);
}

/// Clears the installed handle once the target has exited or been killed,
/// so a stale handle can't outlive the run that installed it.
pub fn uninstall() {
    *slot().lock().unwrap() = None;
}

/// Fetches the currently installed handle, if any.
pub fn current() -> Option<DispatcherHandle> {
    slot().lock().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Serializes tests against the process-wide singleton.
    static TEST_LOCK: StdMutex<()> = StdMutex::new(());

    #[test]
    fn install_then_current_round_trips() {
        let _guard = TEST_LOCK.lock().unwrap();
        let handle = DispatcherHandle {
            memory: Arc::new(Mutex::new(AddressSpace::new(0x1000, vec![0; 4]))),
            context: Arc::new(Mutex::new(TaskContext::default())),
        };
        install(handle);
        assert!(current().is_some());
        uninstall();
        assert!(current().is_none());
    }
}
