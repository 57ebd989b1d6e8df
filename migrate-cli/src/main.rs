//! jhipster-migrate: upgrade a generated application to a newer generator
//! version through a three-way git merge.
//!
//! # Usage
//!
//! ```text
//! jhipster-migrate migrate [--source-version <v>] [--target-version <v>] [--verbose] ...
//! ```

mod commands;
mod interactive;
mod registry;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::migrate::MigrateArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "jhipster-migrate",
    version,
    about = "Migrate a JHipster application to a newer generator version",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate with both generator versions and merge the difference
    /// into the current branch.
    Migrate(MigrateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate(args) => {
            init_tracing(args.verbose);
            args.run()
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
