//! # migrate-engine
//!
//! Branch-based three-way regeneration and merge.
//!
//! [`pipeline::run`] regenerates the application with the old generator on
//! an orphan branch, grafts that branch into the user's history, regenerates
//! with the new generator on a sibling branch and merges the result back, so
//! only generator changes reach the user's code and conflicts surface as
//! ordinary merge conflicts.

pub mod cleanup;
pub mod digest;
pub mod error;
pub mod generator;
pub mod git_setup;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod prompt;
pub mod regenerate;
pub mod settings;
pub mod vcs;

pub use error::MigrateError;
pub use generator::{GenerateRequest, Generator, Pass, ProcessGenerator};
pub use normalize::{CommandNormalizer, LineEndingNormalizer, Normalizer};
pub use orchestrator::{Collaborators, Migration};
pub use pipeline::MigrationReport;
pub use process::{CommandSpec, IoMode};
pub use prompt::{NonInteractive, Prompter};
pub use settings::{MigrateSettings, StaleBranchPolicy};
pub use vcs::{Git, Vcs};
