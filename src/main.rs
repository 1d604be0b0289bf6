//! Relive - a live-reload client for change servers.

#![allow(dead_code)]

mod actor;
mod asset;
mod cli;
mod config;
mod core;
mod document;
mod logger;
mod reload;

use std::path::Path;

use actor::{Session, WsConnector};
use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::ReliveConfig;
use document::HeadDocument;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Before the session exists Ctrl+C simply exits
    core::setup_shutdown_handler()?;

    let config = ReliveConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(watch(&cli, &config))
}

/// Start a session (explicitly or via autostart) and drive it until Ctrl+C.
async fn watch(cli: &Cli, config: &ReliveConfig) -> Result<()> {
    let document = open_page(&config.page_path());
    let connector = WsConnector::with_timeout(config.client.connect_timeout());

    let session = if cli.is_watch() {
        Some(Session::connect(&config.client, connector, document))
    } else {
        actor::autostart(&config.client, connector, document)
    };
    let Some(session) = session else {
        log!("ws"; "autostart is disabled, run `relive watch` to connect");
        return Ok(());
    };

    core::register_session(session.sender());
    let document = session.run().await;

    if core::is_shutdown() {
        debug!("page"; "final head:\n{}", document.render());
    }
    Ok(())
}

/// Seed the document from the page; a missing page starts empty.
fn open_page(path: &Path) -> HeadDocument {
    match HeadDocument::open(path) {
        Ok(document) => {
            log!("page"; "{} ({} assets)", path.display(), document.elements().len());
            document
        }
        Err(e) => {
            log!("page"; "cannot read {}: {}, starting empty", path.display(), e);
            HeadDocument::empty()
        }
    }
}
