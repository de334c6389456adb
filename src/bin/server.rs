// Copyright 2025 Daniel Gehriger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ETA Document Signing Server
//!
//! Serves `POST /api/v1/sign` (batch envelopes, basic auth) and
//! `GET /api/v1/status` with the key configured in `config.toml`.

#![allow(clippy::missing_errors_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eta_signer::{
    adapters::http::{routes, ServerState},
    infra::{config::ConfigManager, logging},
    signer_from_config, BatchOrchestrator,
};

#[derive(Parser)]
#[command(name = "eta-signer-server")]
#[command(about = "REST server signing batches of e-invoice documents")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, env = "ETA_SIGNER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to, overriding server.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let mut config = match config_manager.load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(2);
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let addr = match config.server.socket_addr() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    println!("🔐 Loading signing identity ({} keystore)...", config.keystore.backend);
    let signer = match signer_from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {}", e.chain_to_string());
            std::process::exit(1);
        }
    };
    let orchestrator = BatchOrchestrator::new(Arc::new(signer), &config.batch);
    let state = match ServerState::new(orchestrator, &config.server) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    let shutdown = state.shutdown_token();
    let server = warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown requested");
        }
        shutdown.cancel();
    });
    let (bound, server) = match server {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    println!("🚀 ETA signing server listening on {bound}");
    println!("   Endpoints:");
    println!("     GET  /api/v1/status - Server and signer status");
    println!("     POST /api/v1/sign   - Sign a batch of documents");
    println!();
    println!("⚠️  Running without TLS - use only behind a TLS-terminating proxy!");

    server.await;
    log::info!("Server stopped");
}
