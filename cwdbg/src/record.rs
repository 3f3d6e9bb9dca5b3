//! The per-run target record (spec.md §3 "TargetRecord"): everything the
//! debugger process keeps about one debugging session, and the external
//! operations spec.md §6 defines against it.
//!
//! Grounded on `hypervisor::svm::data::processor_data::ProcessorData`, which
//! plays the same role in the teacher crate — one struct a privileged loop
//! owns for the lifetime of a single guest, bundling together everything
//! that loop's handlers need to read or mutate.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cwdbg_core::{Breakpoint, BreakpointTable, Image, ResumeMode, TargetState, TaskContext};
use log::debug;

use crate::error::ControllerError;

/// Everything [`crate::controller::TargetController`] returns about the
/// current target on request (spec.md §6 "get_target_info").
#[derive(Debug, Clone)]
pub struct TargetInfo {
    pub state: TargetState,
    pub exit_code: Option<i32>,
    pub error_code: Option<u32>,
    pub context: Option<TaskContext>,
    /// A handful of raw bytes starting at the stopped `pc`, for a front-end
    /// to disassemble or hex-dump — producing the dump itself is out of
    /// scope here (spec.md §1).
    pub next_instruction_bytes: Vec<u8>,
    /// A handful of words read down from the stopped `usp`.
    pub top_stack_words: Vec<u32>,
    pub active_breakpoint: Option<Breakpoint>,
}

/// Number of bytes of `next_instruction_bytes` to capture.
const INSTRUCTION_PREVIEW_LEN: usize = 8;
/// Number of stack words to capture.
const STACK_PREVIEW_WORDS: usize = 4;

/// The debugger's record of a single target (spec.md §3). Owns the
/// breakpoint table outright (spec.md §5: "the breakpoint table is
/// accessed only by the debugger process") and shares the task context and
/// image memory with the target thread, since both sides of the real
/// system live in one address space.
pub struct TargetRecord {
    image_path: Option<String>,
    memory: Option<Arc<Mutex<cwdbg_core::patch::AddressSpace>>>,
    context: Arc<Mutex<TaskContext>>,
    entry_point: u32,
    breakpoints: BreakpointTable,
    state: TargetState,
    exit_code: Option<i32>,
    error_code: Option<u32>,
    requested_mode: ResumeMode,
    process: Option<JoinHandle<()>>,
}

impl Default for TargetRecord {
    fn default() -> Self {
        Self {
            image_path: None,
            memory: None,
            context: Arc::new(Mutex::new(TaskContext::default())),
            entry_point: 0,
            breakpoints: BreakpointTable::new(),
            state: TargetState::IDLE,
            exit_code: None,
            error_code: None,
            requested_mode: ResumeMode::Continue,
            process: None,
        }
    }
}

impl TargetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// spec.md §6 "load": installs a freshly parsed image, replacing
    /// whatever was loaded before. Resets all per-run bookkeeping (spec.md
    /// §4.4: breakpoint hit counts and the active-breakpoint pointer are
    /// reset at the start of each run).
    pub fn install_image(&mut self, path: String, image: Image) {
        let (memory, entry_point) = image.into_parts();
        self.image_path = Some(path);
        self.memory = Some(Arc::new(Mutex::new(memory)));
        self.entry_point = entry_point;
        self.breakpoints.reset_hit_counts();
        self.state = TargetState::IDLE;
        self.exit_code = None;
        self.error_code = None;
        *self.context.lock().unwrap() = TaskContext {
            pc: entry_point,
            ..Default::default()
        };
        debug!("image installed, entry point {entry_point:#x}");
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn set_state(&mut self, state: TargetState) {
        debug_assert!(state.is_well_formed());
        self.state = state;
    }

    pub fn shared_context(&self) -> Arc<Mutex<TaskContext>> {
        Arc::clone(&self.context)
    }

    pub fn shared_memory(&self) -> Option<Arc<Mutex<cwdbg_core::patch::AddressSpace>>> {
        self.memory.clone()
    }

    pub fn take_process(&mut self) -> Option<JoinHandle<()>> {
        self.process.take()
    }

    pub fn set_process(&mut self, handle: JoinHandle<()>) {
        self.process = Some(handle);
    }

    pub fn requested_mode(&self) -> ResumeMode {
        self.requested_mode
    }

    /// spec.md §6 "set_continue_mode". `requested_mode` is the single
    /// source of truth for which mode is active; `TargetState::SINGLE_STEPPING`
    /// is set only transiently, as a display bit, whenever the controller
    /// records a stop (see `cwdbg::controller`).
    pub fn set_continue_mode(&mut self) {
        self.requested_mode = ResumeMode::Continue;
    }

    /// spec.md §6 "set_single_step_mode".
    pub fn set_single_step_mode(&mut self) {
        self.requested_mode = ResumeMode::SingleStep;
    }

    /// spec.md §6 "set_breakpoint": installs a breakpoint at
    /// `entry_point + offset`.
    pub fn set_breakpoint(&mut self, offset: u32) -> Result<u32, ControllerError> {
        let memory = self.memory.as_ref().ok_or(ControllerError::NoImageLoaded)?;
        let mut memory = memory.lock().unwrap();
        Ok(self
            .breakpoints
            .set(&mut memory, self.entry_point, offset, false)?)
    }

    /// Installs a one-shot breakpoint at `entry_point + offset`. Not part
    /// of spec.md §6's external operation list (those are all persistent,
    /// user-visible breakpoints) — this is the mechanism a future
    /// step-over-a-call command would drive, supplementing the
    /// distillation per SPEC_FULL.md since spec.md §3/§4.4 name one-shot
    /// breakpoints as a first-class concept without saying who installs
    /// them.
    pub fn set_one_shot_breakpoint(&mut self, offset: u32) -> Result<u32, ControllerError> {
        let memory = self.memory.as_ref().ok_or(ControllerError::NoImageLoaded)?;
        let mut memory = memory.lock().unwrap();
        Ok(self
            .breakpoints
            .set(&mut memory, self.entry_point, offset, true)?)
    }

    /// spec.md §6 "clear_breakpoint".
    pub fn clear_breakpoint(&mut self, number: u32) -> Result<(), ControllerError> {
        let memory = self.memory.as_ref().ok_or(ControllerError::NoImageLoaded)?;
        let mut memory = memory.lock().unwrap();
        self.breakpoints.clear(&mut memory, number)?;
        Ok(())
    }

    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut BreakpointTable {
        &mut self.breakpoints
    }

    /// spec.md §6 "kill": forcibly terminates the target. The controller
    /// loop detects this state after the front-end adapter returns and
    /// exits without the normal resume acknowledgement (spec.md §4.8).
    pub fn kill(&mut self) {
        self.state = TargetState::KILLED;
    }

    pub fn record_exit(&mut self, exit_code: i32) {
        self.state = TargetState::EXITED;
        self.exit_code = Some(exit_code);
    }

    pub fn record_error(&mut self, error_code: u32) {
        self.state = TargetState::ERROR;
        self.error_code = Some(error_code);
    }

    /// spec.md §6 "get_target_info".
    pub fn target_info(&self) -> TargetInfo {
        let context = if self.state.intersects(TargetState::STOPPED_MASK) {
            Some(*self.context.lock().unwrap())
        } else {
            None
        };

        let (next_instruction_bytes, top_stack_words) = match (&self.memory, &context) {
            (Some(memory), Some(ctx)) => {
                let memory = memory.lock().unwrap();
                let bytes = (0..INSTRUCTION_PREVIEW_LEN as u32)
                    .filter_map(|i| memory.read_byte(ctx.pc + i).ok())
                    .collect();
                let words = (0..STACK_PREVIEW_WORDS as u32)
                    .filter_map(|i| memory.read_opcode(ctx.usp + i * 2).ok().map(u32::from))
                    .collect();
                (bytes, words)
            }
            _ => (Vec::new(), Vec::new()),
        };

        TargetInfo {
            state: self.state,
            exit_code: self.exit_code,
            error_code: self.error_code,
            context,
            next_instruction_bytes,
            top_stack_words,
            active_breakpoint: self.breakpoints.active().copied(),
        }
    }
}
