// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pii_anchor_core::AnchorConfig;

#[derive(Parser, Debug)]
#[command(name = "pii-anchor", author, version, about = "Anchor PII fingerprints on a ledger contract")]
pub struct Cli {
    /// Directory holding anchor.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    /// Ledger contract address, overriding the stored config
    #[arg(long, global = true)]
    pub contract: Option<String>,
    /// JSON-RPC endpoint of the signing node, overriding the stored config
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,
    /// Off-chain record store sync endpoint, overriding the stored config
    #[arg(long, global = true)]
    pub store_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show loaded detections (type, document, algorithm, digest)
    List {
        /// Detection payload JSON file, or `-` for stdin
        #[arg(long)]
        payload: PathBuf,
    },
    /// Anchor selected detections in one transaction, then mirror them off-chain
    Anchor {
        /// Detection payload JSON file, or `-` for stdin
        #[arg(long)]
        payload: PathBuf,
        /// Digest to anchor (repeatable; order is submission order)
        #[arg(long = "select", value_name = "DIGEST", conflicts_with = "all")]
        select: Vec<String>,
        /// Anchor every loaded detection in payload order
        #[arg(long)]
        all: bool,
        /// Anti-forgery token to seed the record store cookie with
        #[arg(long, value_name = "TOKEN")]
        csrf_token: Option<String>,
    },
    /// Inspect or initialize the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (stored values plus flag overrides)
    Show,
    /// Write the default configuration (plus flag overrides)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply `--contract`, `--rpc-url` and `--store-url` to `config`.
    pub fn apply_overrides(&self, config: &mut AnchorConfig) {
        if let Some(contract) = &self.contract {
            config.contract_address.clone_from(contract);
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url.clone_from(url);
        }
        if let Some(url) = &self.store_url {
            config.store_url.clone_from(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let cli = Cli::parse_from(["pii-anchor", "--rpc-url", "http://node:8545", "config", "show"]);
        let mut config = AnchorConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.store_url, AnchorConfig::default().store_url);
    }

    #[test]
    fn select_and_all_conflict() {
        let parsed = Cli::try_parse_from([
            "pii-anchor", "anchor", "--payload", "p.json", "--all", "--select", "ab12",
        ]);
        assert!(parsed.is_err());
    }
}
