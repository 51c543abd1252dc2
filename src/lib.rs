pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::console::{ScriptedConsole, StdConsole};
pub use adapters::storage::LocalStorage;
pub use app::coding::{CodingTask, TeamCodingMode};
pub use config::toml_config::CouncilConfig;
pub use core::consensus::ConsensusMode;
pub use core::creative::CreativeMode;
pub use core::debate::DebateMode;
pub use core::voting::VotingMode;
pub use core::{Council, CouncilMode, ModeEngine, Session};
pub use domain::model::{Mode, Seat, Transcript};
pub use utils::error::{CouncilError, Result};
