//! The stop/resume rendezvous between the target thread and the controller.
//! Two cooperating processes sharing an address space don't exist in a
//! userspace test harness, so this crate models the target as a second
//! `std::thread` in the same process and the privileged hand-off as a pair
//! of `mpsc` channels, the same "channel pair carries the event, the other
//! side blocks on `recv`" shape the teacher crate uses for its IOCTL round
//! trip (`hv-control::main::IoctlConnector::call`), generalized from a
//! single request/response to a repeating stop/resume cycle.
//!
//! A naive design has the bootstrap send its first stop event before the
//! debugger is listening for it. We close that race here with an explicit
//! readiness handshake before the target is told to start executing the
//! image, rather than relying on the target blocking on send.

use std::sync::mpsc::{self, Receiver, Sender};

use cwdbg_core::StopEvent;

/// The target thread's end of the rendezvous.
pub struct TargetSide {
    ready_tx: Sender<()>,
    begin_rx: Receiver<()>,
    stop_tx: Sender<StopEvent>,
    resume_rx: Receiver<()>,
}

impl TargetSide {
    /// Signals that the target's address space is set up and it is about to
    /// block waiting for permission to start executing.
    pub fn signal_ready(&self) {
        let _ = self.ready_tx.send(());
    }

    /// Blocks until the controller has acknowledged readiness and says to
    /// start executing the image.
    pub fn wait_for_begin(&self) {
        let _ = self.begin_rx.recv();
    }

    /// Sends a stop event and blocks for the matching resume. Returns `Ok`
    /// once the controller has granted resume, `Err` if the controller
    /// dropped its end of the channel instead. That is the thread-model
    /// analogue of the target process being forcibly killed: there is no
    /// process left to resume, so the caller should stop immediately
    /// without attempting to execute anything further.
    pub fn stop_and_wait_for_resume(&self, event: StopEvent) -> Result<(), ()> {
        if self.stop_tx.send(event).is_err() {
            return Err(());
        }
        self.resume_rx.recv().map_err(|_| ())
    }
}

/// The controller's end of the rendezvous.
pub struct ControllerSide {
    ready_rx: Receiver<()>,
    begin_tx: Sender<()>,
    stop_rx: Receiver<StopEvent>,
    resume_tx: Sender<()>,
}

impl ControllerSide {
    /// Blocks until the target signals it has finished setting up its
    /// address space (spec.md §9a).
    pub fn wait_for_ready(&self) {
        let _ = self.ready_rx.recv();
    }

    /// Releases the target to start executing the loaded image.
    pub fn signal_begin(&self) {
        let _ = self.begin_tx.send(());
    }

    /// Blocks waiting for the next stop event (spec.md §4.6: "loop forever
    /// waiting for stop events from the target").
    pub fn wait_for_stop(&self) -> Option<StopEvent> {
        self.stop_rx.recv().ok()
    }

    /// Grants the target permission to resume. The target reads whatever
    /// resume semantics (trace bit, interrupt mask) the controller already
    /// wrote into the shared [`cwdbg_core::TaskContext`] before calling
    /// this — there is nothing left to say over the channel itself.
    ///
    /// Dropping a `ControllerSide` instead of ever calling this is how a
    /// kill is delivered (spec.md §4.8): the target's blocked `recv` in
    /// [`TargetSide::stop_and_wait_for_resume`] unblocks with an error and
    /// it exits without ever executing again.
    pub fn grant_resume(&self) {
        let _ = self.resume_tx.send(());
    }
}

/// Builds a connected rendezvous pair.
pub fn channel() -> (TargetSide, ControllerSide) {
    let (ready_tx, ready_rx) = mpsc::channel();
    let (begin_tx, begin_rx) = mpsc::channel();
    let (stop_tx, stop_rx) = mpsc::channel();
    let (resume_tx, resume_rx) = mpsc::channel();

    (
        TargetSide {
            ready_tx,
            begin_rx,
            stop_tx,
            resume_rx,
        },
        ControllerSide {
            ready_rx,
            begin_tx,
            stop_rx,
            resume_tx,
        },
    )
}
