//! # courier
//!
//! Relay daemon binary — wires settings, store, provider, dispatcher, and
//! the device bridge together and serves HTTP/WebSocket traffic.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use courier_llm::{OpenAiConfig, OpenAiProvider};
use courier_server::bridge::device::HttpDeviceChannel;
use courier_server::bridge::feed::channel_feed;
use courier_server::bridge::{Bridge, BridgeHandle};
use courier_server::handlers::{HandlerContext, register_default_handlers};
use courier_server::routes::{AppState, router};
use courier_server::ws::dispatch::Dispatcher;
use courier_server::ws::registry::ConnectionRegistry;
use courier_server::metrics;
use courier_settings::CourierSettings;
use courier_store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Capacity of the bridge ingest queue.
const INGEST_CAPACITY: usize = 256;

/// Courier relay daemon.
#[derive(Parser, Debug)]
#[command(name = "courier", about = "Streaming chat relay daemon")]
struct Cli {
    /// Path to the settings file (JSON).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Bind address (overrides settings).
    #[arg(long)]
    bind: Option<String>,

    /// Listen port (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database path (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn load_settings(args: &Cli) -> CourierSettings {
    let mut settings = match &args.settings {
        Some(path) => {
            courier_settings::reload_settings_from_path(path);
            (*courier_settings::get_settings()).clone()
        }
        None => courier_settings::load_default_settings(),
    };
    if let Some(bind) = &args.bind {
        settings.server.bind.clone_from(bind);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(db_path) = &args.db_path {
        settings.storage.db_path = db_path.to_string_lossy().into_owned();
    }
    settings
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Arc::new(load_settings(&args));
    courier_settings::init_settings((*settings).clone());

    let metrics_handle = metrics::install_recorder();

    let db_path = PathBuf::from(&settings.storage.db_path);
    ensure_parent_dir(&db_path)?;
    let store = Arc::new(Store::open(&db_path).context("failed to open store")?);
    info!(db_path = %db_path.display(), "store opened");

    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig {
        base_url: settings.llm.base_url.clone(),
        api_key: settings.llm.api_key.clone(),
        model: settings.llm.model.clone(),
        max_tokens: settings.llm.max_tokens,
        temperature: settings.llm.temperature,
        system_prompt: settings.llm.system_prompt.clone(),
    }));
    info!(model = %settings.llm.model, "completion provider ready");

    let registry = Arc::new(ConnectionRegistry::new());
    let ctx = Arc::new(HandlerContext {
        settings: settings.clone(),
        store: store.clone(),
        provider: provider.clone(),
        registry: registry.clone(),
    });

    let mut dispatcher = Dispatcher::new();
    register_default_handlers(&mut dispatcher);
    let dispatcher = Arc::new(dispatcher);
    info!(actions = ?dispatcher.actions(), "action handlers registered");

    let (ingest, bridge_handle) = if settings.bridge.enabled {
        let (tx, feed) = channel_feed(INGEST_CAPACITY);
        let channel = Arc::new(HttpDeviceChannel::new(settings.bridge.clone()));
        let bridge = Arc::new(Bridge::new(
            settings.clone(),
            store.clone(),
            provider,
            registry,
            channel,
        ));
        info!(hub = %settings.bridge.hub_hostname, "device bridge enabled");
        (Some(tx), Some(BridgeHandle::spawn(bridge, feed)))
    } else {
        info!("device bridge disabled");
        (None, None)
    };

    let state = AppState {
        ctx,
        dispatcher,
        metrics: metrics_handle,
        ingest,
    };

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, environment = %settings.server.environment, "courier listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    if let Some(handle) = bridge_handle {
        handle.shutdown().await;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
