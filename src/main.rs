// rationale3p — three-player rationalized text classification.
//
//   cli → application → data / ml / infra, with domain shared by all
//
// Logging goes through tracing; RUST_LOG overrides the default
// `rationale3p=info` filter.
#![recursion_limit = "256"]

mod application;
mod cli;
mod data;
mod domain;
mod infra;
mod ml;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "rationale3p=info";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    cli::Cli::parse().run().inspect_err(|e| tracing::error!("{e:#}"))
}
