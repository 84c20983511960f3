// ABOUTME: Server binary - loads configuration and data, then serves the chat API
// ABOUTME: Environment-driven startup with structured logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MarketScope Analytics

//! # MarketScope Server Binary
//!
//! Starts the market-intelligence chat API: loads the CSV datasets and region
//! documents from the data directory, initializes the completion provider from
//! environment variables, and serves the HTTP surface.

use anyhow::{Context, Result};
use clap::Parser;
use marketscope_server::{
    config::environment::ServerConfig,
    data::{DocumentLibrary, MarketCorpus},
    llm::{OpenAiConfig, OpenAiProvider},
    logging,
    server::{ChatServer, ServerResources},
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "marketscope-server")]
#[command(about = "MarketScope - market intelligence chat API for home appliance data")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize production logging before anything can fail
    logging::init_from_env()?;

    // Load configuration from environment
    let mut config = ServerConfig::from_env().context("loading configuration")?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting MarketScope chat API");
    info!("{}", config.summary());

    // Load the market datasets; the server is useless without them
    let corpus = MarketCorpus::load(&config.data_dir)
        .with_context(|| format!("loading market data from {}", config.data_dir.display()))?;

    // Region documents are a supplement; an empty library is acceptable
    let documents = DocumentLibrary::load(&config.data_dir);

    // Completion provider from the configured LLM settings
    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig::from_llm_config(
        &config.llm,
    )));

    let http_port = config.http_port;
    let resources = Arc::new(
        ServerResources::new(config, corpus, documents, provider)
            .context("building server resources")?,
    );

    let server = ChatServer::new(resources);
    info!("Ready to serve market intelligence questions");

    if let Err(e) = server.run(http_port).await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}
