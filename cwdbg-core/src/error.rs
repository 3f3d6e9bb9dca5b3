//! Error taxonomy for the core engine, following spec.md §7.

use snafu::Snafu;

/// Errors surfaced by the core's data-model operations: the breakpoint
/// table, the code-patch primitive, and the image loader.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoreError {
    /// spec.md §4.1: "Fails with *invalid-address* when the address lies
    /// outside the loaded image bounds."
    #[snafu(display("address {address:#x} lies outside the loaded image (0..{bound:#x})"))]
    InvalidAddress { address: u32, bound: u32 },

    /// spec.md §4.4: "Fails *not-enough-memory*."
    #[snafu(display("not enough memory to install another breakpoint"))]
    NotEnoughMemory,

    /// spec.md §4.4: "Fails *unknown-breakpoint*."
    #[snafu(display("no breakpoint with number {number}"))]
    UnknownBreakpoint { number: u32 },

    /// spec.md §4.3: "If no breakpoint entry matches the fix-up address,
    /// this is an internal error and the stop is reclassified as
    /// *exception* with a diagnostic."
    #[snafu(display("breakpoint fix-up at {address:#x} found no matching table entry"))]
    UnmatchedBreakpointFixup { address: u32 },

    /// spec.md §6 "Loaded image contract": the header is malformed or the
    /// file is too short to contain it.
    #[snafu(display("malformed segmented image: {reason}"))]
    MalformedImage { reason: &'static str },
}
