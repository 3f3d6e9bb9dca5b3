//! The target controller (spec.md §3 "Target controller", §4.6): owns a
//! [`TargetRecord`], drives the single event loop that starts the target,
//! waits for stop events, updates the state machine, invokes the front-end
//! adapter, and permits the target to resume.
//!
//! Grounded on `hypervisor::svm::vmexit::mod::handle_vmexit`, the teacher
//! crate's own "receive one event, dispatch on its kind, mutate shared
//! state, return what happens next" loop — generalized here from a single
//! synchronous VM-exit to a blocking cross-thread rendezvous, since our
//! "guest" is a cooperatively scheduled thread rather than a VMRUN/VMEXIT
//! pair.

use std::fs;
use std::path::Path;
use std::thread;

use cwdbg_core::dispatch::breakpoint_stop_reason;
use cwdbg_core::{mode, Image, ResumeMode, StopEvent, StopReason, TargetState};
use log::{info, warn};

use crate::error::ControllerError;
use crate::frontend::FrontendAdapter;
use crate::ipc;
use crate::record::{TargetInfo, TargetRecord};

/// Base address new images are loaded at. A real OS loader picks this per
/// process; this crate doesn't model memory allocation (spec.md §1), so it
/// is fixed.
pub const DEFAULT_LOAD_BASE: u32 = 0x1000;

/// Owns one target session end to end (spec.md §3: "Ownership: the
/// debugger process owns the `TargetRecord`... for its lifetime.").
pub struct TargetController {
    record: TargetRecord,
    load_base: u32,
}

impl Default for TargetController {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetController {
    pub fn new() -> Self {
        Self {
            record: TargetRecord::new(),
            load_base: DEFAULT_LOAD_BASE,
        }
    }

    pub fn with_load_base(load_base: u32) -> Self {
        Self {
            record: TargetRecord::new(),
            load_base,
        }
    }

    pub fn record(&self) -> &TargetRecord {
        &self.record
    }

    /// spec.md §6 "load": reads an image file and installs it, replacing
    /// any previous target.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ControllerError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ControllerError::ImageLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let image = Image::parse(&bytes, self.load_base).map_err(|e| ControllerError::ImageLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.record.install_image(path.display().to_string(), image);
        info!("loaded {}", path.display());
        Ok(())
    }

    pub fn set_breakpoint(&mut self, offset: u32) -> Result<u32, ControllerError> {
        self.record.set_breakpoint(offset)
    }

    pub fn clear_breakpoint(&mut self, number: u32) -> Result<(), ControllerError> {
        self.record.clear_breakpoint(number)
    }

    pub fn set_one_shot_breakpoint(&mut self, offset: u32) -> Result<u32, ControllerError> {
        self.record.set_one_shot_breakpoint(offset)
    }

    pub fn set_continue_mode(&mut self) {
        self.record.set_continue_mode();
    }

    pub fn set_single_step_mode(&mut self) {
        self.record.set_single_step_mode();
    }

    pub fn kill(&mut self) {
        self.record.kill();
    }

    pub fn target_info(&self) -> TargetInfo {
        self.record.target_info()
    }

    /// spec.md §6 "run": starts (or restarts) the target and drives the
    /// event loop (spec.md §4.6) to completion — the target exiting, an
    /// unrecoverable error, or the front-end killing it.
    pub fn run(&mut self, frontend: &mut dyn FrontendAdapter) -> Result<(), ControllerError> {
        let memory = self.record.shared_memory().ok_or(ControllerError::NoImageLoaded)?;
        let context = self.record.shared_context();

        let (target_side, controller_side) = ipc::channel();
        let handle = {
            let memory = memory.clone();
            let context = context.clone();
            thread::spawn(move || crate::bootstrap::run(memory, context, target_side))
        };
        self.record.set_process(handle);

        // spec.md §9a: wait for the target to finish setting up before
        // releasing it, closing the race the original bootstrap design left
        // open.
        controller_side.wait_for_ready();
        self.record.set_state(TargetState::RUNNING);
        controller_side.signal_begin();

        loop {
            let Some(mut event) = controller_side.wait_for_stop() else {
                warn!("rendezvous closed unexpectedly");
                self.record.record_error(0);
                break;
            };

            match event.reason {
                StopReason::Breakpoint => {
                    let Some(one_shot) = self.handle_breakpoint_hit(&mut event)? else {
                        self.record.record_error(0);
                        break;
                    };
                    let reason = breakpoint_stop_reason(one_shot);
                    let state_bit = if one_shot {
                        TargetState::STOPPED_BY_ONE_SHOT_BREAKPOINT
                    } else {
                        TargetState::STOPPED_BY_BREAKPOINT
                    };
                    self.record.set_state(TargetState::RUNNING | state_bit);
                    event.reason = reason;

                    if self.invoke_frontend_and_check_killed(frontend) {
                        break;
                    }
                    self.resume(&controller_side)?;
                }
                StopReason::SingleStep => {
                    self.rearm_active_breakpoint()?;
                    let stepping_by_request = self.record.requested_mode() == ResumeMode::SingleStep;

                    if !stepping_by_request {
                        // Internal step-over-a-disarmed-breakpoint: resume
                        // silently, without ever telling the front-end
                        // (spec.md §4.4/§4.6). The dispatcher already
                        // cleared the trace bit on save (spec.md §4.2); this
                        // is a backstop in case a future resume path sets it
                        // again before reaching here.
                        self.clear_trace_bit();
                        controller_side.grant_resume();
                        continue;
                    }

                    self.record
                        .set_state(TargetState::RUNNING | TargetState::STOPPED_BY_SINGLE_STEP | TargetState::SINGLE_STEPPING);
                    if self.invoke_frontend_and_check_killed(frontend) {
                        break;
                    }
                    self.resume(&controller_side)?;
                }
                StopReason::Exception => {
                    self.record.set_state(TargetState::RUNNING | TargetState::STOPPED_BY_EXCEPTION);
                    if self.invoke_frontend_and_check_killed(frontend) {
                        break;
                    }
                    self.resume(&controller_side)?;
                }
                StopReason::Exited => {
                    self.record.record_exit(event.exit_code.unwrap_or(0));
                    break;
                }
                StopReason::Error => {
                    self.record.record_error(event.error_code.unwrap_or(0));
                    break;
                }
                StopReason::OneShotBreakpoint => {
                    // The target never originates this variant itself (only
                    // the controller assigns it, above, after a table
                    // lookup); seeing it here would mean a malformed event.
                    return Err(ControllerError::UnknownStopReason);
                }
            }
        }

        // Dropping our end of the rendezvous before joining matters: if the
        // target is still blocked in `stop_and_wait_for_resume` (the
        // kill/error paths above never call `grant_resume`), dropping
        // `resume_tx` here is what unblocks it (spec.md §4.8 — the
        // thread-model analogue of forcibly terminating the target
        // process).
        drop(controller_side);
        if let Some(handle) = self.record.take_process() {
            let _ = handle.join();
        }
        Ok(())
    }

    /// spec.md §4.3: rewinds the saved program counter past the trap
    /// opcode, looks the hit up in the breakpoint table, and reports
    /// whether the breakpoint that was hit is one-shot.
    ///
    /// The rewind has to land on the *shared* context, not just the
    /// `StopEvent`'s detached copy — the target thread resumes by reading
    /// straight out of that shared context, so if only the copy were
    /// rewound the target would resume two bytes past the instruction the
    /// breakpoint displaced, skipping it entirely.
    fn handle_breakpoint_hit(&mut self, event: &mut StopEvent) -> Result<Option<bool>, ControllerError> {
        if event.context.is_none() {
            return Ok(None);
        }

        let shared = self.record.shared_context();
        let address = {
            let mut ctx = shared.lock().unwrap();
            ctx.rewind_past_trap();
            ctx.pc
        };
        event.context = Some(*shared.lock().unwrap());

        let memory = self.record.shared_memory().ok_or(ControllerError::NoImageLoaded)?;
        let mut memory = memory.lock().unwrap();
        let number = self.record.breakpoints_mut().handle_hit(&mut memory, address)?;
        let one_shot = self.record.breakpoints().find_by_number(number).is_none();
        Ok(Some(one_shot))
    }

    fn rearm_active_breakpoint(&mut self) -> Result<(), ControllerError> {
        let Some(memory) = self.record.shared_memory() else {
            return Ok(());
        };
        let mut memory = memory.lock().unwrap();
        self.record.breakpoints_mut().rearm_active(&mut memory)?;
        Ok(())
    }

    fn clear_trace_bit(&mut self) {
        let context = self.record.shared_context();
        let mut ctx = context.lock().unwrap();
        mode::clear_trace_bit(&mut ctx);
    }

    /// Invokes the front-end adapter and reports whether it killed the
    /// target while handling the stop (spec.md §4.6 step 3/§4.8).
    fn invoke_frontend_and_check_killed(&mut self, frontend: &mut dyn FrontendAdapter) -> bool {
        frontend.on_stop(&mut self.record);
        self.record.state().contains(TargetState::KILLED)
    }

    /// spec.md §4.5: applies the requested resume mode's status-register
    /// changes, then releases the target.
    fn resume(&mut self, controller_side: &ipc::ControllerSide) -> Result<(), ControllerError> {
        let active_breakpoint_present = self.record.breakpoints().active().is_some();
        let requested_mode = self.record.requested_mode();
        let single_stepping = requested_mode == ResumeMode::SingleStep;

        let context = self.record.shared_context();
        {
            let mut ctx = context.lock().unwrap();
            mode::apply(requested_mode, active_breakpoint_present, &mut ctx);
        }

        // `SINGLE_STEPPING` tracks the sticky `requested_mode` (spec.md §3:
        // it is orthogonal to the stopped-by-* bits this clears), so it is
        // recomputed here rather than carried over from whatever it was.
        let mut state = TargetState::RUNNING;
        if single_stepping {
            state |= TargetState::SINGLE_STEPPING;
        }
        self.record.set_state(state);
        controller_side.grant_resume();
        Ok(())
    }
}
