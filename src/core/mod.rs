pub mod consensus;
pub mod council;
pub mod creative;
pub mod debate;
pub mod engine;
pub mod session;
pub mod voting;

#[cfg(test)]
pub mod testing;

pub use crate::core::council::Council;
pub use crate::core::engine::{CouncilMode, ModeEngine};
pub use crate::core::session::Session;
pub use crate::utils::error::Result;
