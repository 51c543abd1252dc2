pub mod coding;

pub use coding::{CodingTask, TeamCodingMode};
