//! `cwdbg-core` — the stop/resume engine for a 68k assembly-level debugger.
//!
//! This crate holds the data model and decision logic from spec.md §3–§4:
//! the task context ABI, the breakpoint table, the code-patch primitive,
//! the exception-cause classification, the continue/single-step mode
//! transitions, the loaded-image contract, and a minimal target
//! interpreter that stands in for real 68k hardware in tests (see
//! SPEC_FULL.md §4.9). The concurrency/IPC machinery that ties these
//! together into a running debugger session lives in the `cwdbg` crate.

pub mod breakpoint;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod image;
pub mod interp;
pub mod isa;
pub mod mode;
pub mod patch;
pub mod state;
pub mod stop;

pub use breakpoint::{Breakpoint, BreakpointTable};
pub use context::TaskContext;
pub use error::CoreError;
pub use image::Image;
pub use mode::ResumeMode;
pub use state::TargetState;
pub use stop::{StopEvent, StopReason};
