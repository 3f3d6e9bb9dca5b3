//! `cwdbg` — the host crate that turns `cwdbg-core`'s data model into a
//! running debugger session: the target bootstrap stub, the stop/resume
//! rendezvous, the `TargetController` event loop, and the front-end adapter
//! seam a command-line or remote-protocol frontend would plug into.
//!
//! Neither of those frontends is part of this crate (spec.md §1) — see
//! [`frontend::FrontendAdapter`] for the boundary they'd implement.

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod frontend;
pub mod ipc;
pub mod logging;
pub mod record;

pub use config::DebuggerConfig;
pub use controller::TargetController;
pub use error::ControllerError;
pub use frontend::FrontendAdapter;
pub use record::{TargetInfo, TargetRecord};
