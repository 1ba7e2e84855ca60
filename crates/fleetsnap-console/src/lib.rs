//! Interactive operator console for batch VM snapshot management.
//!
//! One run connects to a single management endpoint, resolves a batch of
//! guests, and then serves snapshot commands until the operator exits.
//! The endpoint itself is abstracted behind `fleetsnap-common` traits, so
//! the whole console runs unchanged against the in-memory mock endpoint.

pub mod command;
pub mod config;
pub mod ops;
pub mod prompt;
pub mod resolve;
pub mod session;

pub use command::Command;
pub use config::ConsoleConfig;
pub use session::{SessionController, SetupError};
