// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand implementations.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use comfy_table::Table;
use pii_anchor_config_fs::FsConfigStore;
use pii_anchor_core::{
    render, AnchorConfig, AnchorOutcome, AnchorSession, ConfigError, ConfigService, ConfigStore,
    FingerprintSet, LedgerSubmitter, RecordSynchronizer, StatusEvent, StatusKind, StatusLine,
    StatusReporter, ANCHOR_CONFIG_KEY,
};
use pii_anchor_rpc::{HttpRecordStore, JsonRpcLedger, StoreSettings};
use tracing::info;

use crate::cli::{Cli, Command, ConfigAction};

/// Exit code when the chain commit stands but the off-chain mirror failed.
const SYNC_FAILED: u8 = 2;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::List { payload } => list(payload),
        Command::Anchor {
            payload,
            select,
            all,
            csrf_token,
        } => {
            let config = effective_config(&cli, open_store(&cli)?)?;
            anchor(config, payload, select, *all, csrf_token.as_deref()).await
        }
        Command::Config {
            action: ConfigAction::Show,
        } => {
            let config = effective_config(&cli, open_store(&cli)?)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Config {
            action: ConfigAction::Init { force },
        } => init(&cli, *force),
    }
}

fn open_store(cli: &Cli) -> Result<FsConfigStore> {
    match &cli.config_dir {
        Some(dir) => FsConfigStore::with_base(dir)
            .with_context(|| format!("open config dir {}", dir.display())),
        None => FsConfigStore::new().context("open platform config dir"),
    }
}

fn effective_config(cli: &Cli, store: FsConfigStore) -> Result<AnchorConfig> {
    let mut config = ConfigService::new(store)
        .load_anchor()
        .context("load anchor config")?;
    cli.apply_overrides(&mut config);
    Ok(config)
}

fn init(cli: &Cli, force: bool) -> Result<ExitCode> {
    let store = open_store(cli)?;
    let path = store.path_for(ANCHOR_CONFIG_KEY);
    if !force {
        match store.load_raw(ANCHOR_CONFIG_KEY) {
            Ok(_) => bail!("{} already exists (use --force to overwrite)", path.display()),
            Err(ConfigError::NotFound) => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("inspect existing {}", path.display()));
            }
        }
    }
    let mut config = AnchorConfig::default();
    cli.apply_overrides(&mut config);
    ConfigService::new(store)
        .save(ANCHOR_CONFIG_KEY, &config)
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn read_payload(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read payload from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("read payload {}", path.display()))
}

fn print_line(line: &StatusLine) {
    let tag = match line.kind {
        StatusKind::Info => "info",
        StatusKind::Progress => "....",
        StatusKind::Success => " ok ",
        StatusKind::Error => "FAIL",
    };
    println!("[{tag}] {}", line.title);
    for detail in line.body.iter().flat_map(|b| b.lines()) {
        println!("       {detail}");
    }
}

fn list(payload: &Path) -> Result<ExitCode> {
    let set = FingerprintSet::from_payload_json(&read_payload(payload)?);
    if !set.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Type", "Document", "Algorithm", "Digest"]);
        for (index, record) in set.records().iter().enumerate() {
            table.add_row(vec![
                (index + 1).to_string(),
                record.pii_type().to_string(),
                record
                    .document_id()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
                record.algorithm().to_string(),
                record.digest().to_string(),
            ]);
        }
        println!("{table}");
    }
    print_line(&render(&StatusEvent::Loaded {
        records: set.len(),
        skipped: set.skipped(),
        missing_document: set.missing_document(),
    }));
    Ok(ExitCode::SUCCESS)
}

async fn anchor(
    config: AnchorConfig,
    payload: &Path,
    select: &[String],
    all: bool,
    csrf_token: Option<&str>,
) -> Result<ExitCode> {
    let set = FingerprintSet::from_payload_json(&read_payload(payload)?);
    let selected = if all { set.len() } else { select.len() };

    let ledger = JsonRpcLedger::new(&config.rpc_url, config.receipt_poll_interval())
        .context("configure ledger adapter")?;
    let mut store =
        HttpRecordStore::new(StoreSettings::from(&config)).context("configure record store")?;
    if let Some(token) = csrf_token {
        store = store.with_token(token);
    }
    let session = AnchorSession::new(
        set,
        LedgerSubmitter::new(ledger, config.contract_address.clone(), config.submitter_options()),
        RecordSynchronizer::new(store),
        StatusReporter::new(config.status_history),
    );
    info!(selected, all, rpc = %config.rpc_url, "anchoring");

    let outcome = match session.connect().await {
        Ok(_) if all => session.anchor_all().await,
        Ok(_) => session.anchor(select).await,
        Err(err) => Err(err),
    };
    for line in session.status_history() {
        print_line(&line);
    }
    Ok(match outcome {
        Ok(AnchorOutcome { sync: Ok(_), .. }) => ExitCode::SUCCESS,
        Ok(AnchorOutcome { sync: Err(_), .. }) => ExitCode::from(SYNC_FAILED),
        Err(_) => ExitCode::FAILURE,
    })
}
