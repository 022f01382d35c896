//! Image pipeline for the Shipyard deployment tool.
//!
//! This module handles building and pushing service images:
//! - The [`Executor`] capability used to run external commands
//! - The build → push sequence in [`ImagePipeline`]
//! - Progress spinners around each step

mod executor;
mod pipeline;
mod progress;

pub use executor::{render_command, CommandOutput, Executor, LocalExecutor};
pub use pipeline::{ImagePipeline, DEFAULT_TOOL, TARGET_PLATFORM};
pub use progress::Progress;
