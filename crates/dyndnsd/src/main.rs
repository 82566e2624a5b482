// # dyndnsd - Dynamic DNS Update Daemon
//
// This daemon is a THIN integration layer:
// - DO NOT add DNS or reconciliation logic here
// - All record logic lives in dyndns-core
// - Configuration is via environment variables ONLY (see `config`)
//
// The dyndnsd daemon is responsible for:
// 1. Reading and validating configuration
// 2. Initializing logging and the runtime
// 3. Registering zone stores and creating the configured one
// 4. Serving the update endpoint until SIGTERM/SIGINT
//
// ## Example
//
// ```bash
// export DYNDNS_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DYNDNS_PROVIDER_API_TOKEN=your_token
// export BASIC_AUTH_USERNAME=router
// export BASIC_AUTH_PASSWORD=change_me
//
// dyndnsd
// curl -u router:change_me 'http://localhost:8080/?hostname=home.example.com'
// ```

use anyhow::{Context, Result};
use axum::http::HeaderName;
use dyndnsd::{AppState, Config, router};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DyndnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    info!("Starting dyndnsd daemon");
    info!(
        "Zone {} via {} store{}",
        config.zone_id,
        config.provider_type,
        if config.dry_run { " (dry-run)" } else { "" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DyndnsExitCode::RuntimeError
        } else {
            DyndnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> Result<()> {
    let registry = dyndns_core::ZoneStoreRegistry::with_defaults();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare zone store");
        dyndns_provider_cloudflare::register(&registry);
    }

    let dyndns_config = config.dyndns_config();
    let store = registry
        .create_store(&dyndns_config)
        .context("Failed to create zone store")?;
    info!("Using {} zone store", store.store_name());

    let reconciler = dyndns_core::Reconciler::new(
        Arc::from(store),
        dyndns_config.zone_id.clone(),
        &dyndns_config.reconcile,
    )?;
    info!("Reconciling zone {}", reconciler.zone_id());

    let mut state = AppState::new(Arc::new(reconciler), dyndns_config.reconcile.include_subdomains);
    if let Some(header) = &config.client_ip_header {
        let name = HeaderName::from_bytes(header.as_bytes())
            .with_context(|| format!("Invalid client IP header: {}", header))?;
        info!("Reading client addresses from the {} header", name);
        state = state.with_client_ip_header(name);
    }

    let app = router(state, config.credentials());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Resolve once SIGTERM or SIGINT is received
///
/// If the handlers cannot be installed the error is logged and the future
/// never resolves, so the server keeps running.
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to setup signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", signal);
}

/// Resolve once CTRL-C is received
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
