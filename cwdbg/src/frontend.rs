//! The front-end adapter seam (spec.md §2 item 8, §4.6): the boundary
//! between this crate's stop/resume engine and whatever presents it to a
//! user — an interactive command parser or a remote wire protocol, both
//! explicitly out of scope here (spec.md §1).
//!
//! Grounded on the `VmExitHandler` function-pointer slot in
//! `hypervisor::svm::vmexit::mod` (`VMEXIT_HANDLERS: [VmExitHandler; ...]`):
//! the teacher crate plugs in per-exit-reason behavior as a callback rather
//! than hard-coding it into the dispatch loop, which is exactly the shape
//! spec.md wants for the command layer.

use crate::record::TargetRecord;

/// Implemented by whatever sits above the controller and decides what to
/// do at each stop (spec.md §4.6 step 3: "invokes the front-end adapter,
/// passing it the updated `TargetRecord`").
///
/// The adapter may call back into the record — inspecting
/// [`TargetRecord::target_info`], setting breakpoints, switching resume
/// mode, or killing the target outright — before returning. Nothing here
/// constrains what it does; the controller only checks
/// `TargetState::KILLED` on the way back out.
pub trait FrontendAdapter {
    fn on_stop(&mut self, record: &mut TargetRecord);
}

impl<F> FrontendAdapter for F
where
    F: FnMut(&mut TargetRecord),
{
    fn on_stop(&mut self, record: &mut TargetRecord) {
        self(record)
    }
}
