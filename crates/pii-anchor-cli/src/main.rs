// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `pii-anchor`: operator CLI for anchoring PII fingerprints.
//!
//! # Usage
//! ```text
//! pii-anchor [--config-dir DIR] [--contract ADDR] [--rpc-url URL] [--store-url URL] <command>
//! ```
//!
//! Status lines go to stdout and logs to stderr. Exit codes: `0` success,
//! `1` nothing committed, `2` committed on-chain but the off-chain mirror
//! failed.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    commands::run(args).await
}
