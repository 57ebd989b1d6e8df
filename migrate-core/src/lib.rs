//! Migration core library: domain types, blueprint parsing, persisted state.
//!
//! Public API surface:
//! - [`types`]: version selectors, blueprint descriptors, the migration config record
//! - [`blueprint`]: blueprint name normalisation and list parsing
//! - [`paths`]: fixed branch names, scratch directory layout, tool constants
//! - [`store`]: the on-disk migration config store
//! - [`error`]: [`StoreError`]

pub mod blueprint;
pub mod error;
pub mod paths;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::MigrationStore;
pub use types::{Blueprint, BranchSet, MigrationConfig, ResolvedConfig, VersionSelector};
