//! Controller-level error taxonomy (spec.md §7), layered on top of
//! [`cwdbg_core::CoreError`].

use cwdbg_core::CoreError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ControllerError {
    /// spec.md §7: "image load failure — OS loader refused — operation
    /// fails before any process is created."
    #[snafu(display("failed to load image {path}: {reason}"))]
    ImageLoadFailed { path: String, reason: String },

    /// spec.md §4.7/§4.8: failure to allocate a prerequisite (trap vectors,
    /// the target thread itself).
    #[snafu(display("failed to create the target process: {reason}"))]
    ProcessCreationFailed { reason: String },

    /// spec.md §4.8: "Unknown stop reason → fatal internal error; debugger
    /// transitions to *error* and returns."
    #[snafu(display("target reported an unrecognized stop reason"))]
    UnknownStopReason,

    /// A core-level data-model error surfaced up through the controller.
    #[snafu(display("{source}"))]
    Core { source: CoreError },

    /// spec.md §6: an operation was attempted with no target loaded yet.
    #[snafu(display("no image has been loaded"))]
    NoImageLoaded,
}

impl From<CoreError> for ControllerError {
    fn from(source: CoreError) -> Self {
        ControllerError::Core { source }
    }
}
