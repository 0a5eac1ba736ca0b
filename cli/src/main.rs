// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gem Bank CLI
//!
//! Entry point for the `gem-bank` binary. Parses CLI arguments, initializes
//! logging, runs one command against the ledger and prints its result as
//! JSON on stdout.
//!
//! - `keygen`, `derive` — offline helpers
//! - `init-bank`, `set-manager`, `set-freeze` — bank administration
//! - `init-vault`, `set-owner`, `set-lock` — vault administration
//! - `whitelist add|remove` — admission policy
//! - `create-mint`, `mint-to`, `create-metadata` — local token fixtures
//! - `deposit`, `withdraw` — custody
//! - `show`, `list` — reads
//! - `demo` — scripted walk-through on a scratch ledger

mod cli;
mod commands;
mod keyfile;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::GemBankCli;

fn main() -> Result<()> {
    let cli = GemBankCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    let output = commands::run(cli.command, &cli.ledger)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
