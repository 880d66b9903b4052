//! Shared plumbing for commands that talk to a server

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::cli::ConnectionArgs;
use crate::config::TelewireConfig;
use crate::session::{Session, SessionCommand, SessionConfig, SessionMode};
use crate::sync::{SyncEvent, TelemetrySync};
use crate::transport::WsConnector;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ConnectionArgs,
) -> Result<TelewireConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        TelewireConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        TelewireConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref url) = args.url {
        config.connection.url = url.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration, install tracing and build the channel connector
pub fn prepare(
    args: &ConnectionArgs,
) -> Result<(TelewireConfig, WsConnector), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(args)?;
    crate::logging::init_tracing(&config.logging)?;
    let connector = WsConnector::new(config.endpoint()?);
    Ok((config, connector))
}

/// Cancel `cancel_token` on Ctrl-C or SIGTERM
pub async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Run a session to completion, handing every event to `on_event`.
///
/// `on_event` may return commands to send back to the session.
pub async fn follow<F>(
    config: &TelewireConfig,
    connector: WsConnector,
    mode: SessionMode,
    capacity: Option<usize>,
    mut on_event: F,
) -> Result<TelemetrySync, Box<dyn std::error::Error>>
where
    F: FnMut(&SyncEvent) -> Option<SessionCommand>,
{
    let mut session_config = SessionConfig::from_config(config, mode);
    if let Some(capacity) = capacity {
        session_config.request_log_capacity = capacity;
    }

    let session = Session::new(connector, session_config);
    let mut events = session.subscribe();
    let commands = session.commands();

    let cancel_token = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_signal(cancel_token.clone()));
    let session_handle = session.start(cancel_token.clone());

    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(command) = on_event(&event) {
                    // The session may already be gone; its result says why
                    let _ = commands.send(command).await;
                }
                if event == SyncEvent::Closed {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Output fell behind, events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }

    let sync = session_handle.await??;
    signal_handle.abort();
    Ok(sync)
}
