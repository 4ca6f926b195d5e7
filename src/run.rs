/// Process lifecycle
///
/// Startup order: configuration → notification store → seeded users → hub →
/// webserver. Shutdown runs in reverse once a signal arrives: the hub stops
/// dispatching and closes its sessions, then the listener drains.
use std::sync::Arc;

use anyhow::{anyhow, Context};

use crate::{
    arguments,
    config::{self, Config},
    logger::{self, LogTag},
    notifications::{NotificationHub, SqliteNotificationStore},
    webserver::{self, AppState},
};

/// Run the hub until a shutdown signal is received
pub async fn run() -> anyhow::Result<()> {
    let config_path = arguments::config_path();
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let cfg: Config = config::get_config_clone();

    if cfg.logging.file_logging {
        logger::init_with_file(&cfg.logging.log_dir);
    }

    logger::info(LogTag::System, "Notification hub starting up...");

    let store = Arc::new(
        SqliteNotificationStore::open(&cfg.storage.database_path).with_context(|| {
            format!(
                "Failed to open notification database at {}",
                cfg.storage.database_path
            )
        })?,
    );

    let seeds = arguments::seed_users();
    for user in &seeds {
        store
            .register_user(user)
            .await
            .with_context(|| format!("Failed to register seed user {}", user))?;
    }
    if !seeds.is_empty() {
        logger::info(
            LogTag::System,
            &format!("Registered {} seed user(s)", seeds.len()),
        );
    }

    let hub = NotificationHub::new(store.clone(), store, cfg.hub.clone());
    let state = Arc::new(AppState::new(cfg.webserver.clone(), hub.clone()));

    let mut server = tokio::spawn(webserver::start_server(state));

    tokio::select! {
        result = &mut server => {
            // Server exited on its own (bind failure or runtime error)
            hub.shutdown().await;
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow!(e)),
                Err(e) => Err(anyhow!("Webserver task failed: {}", e)),
            };
        }
        signal = wait_for_shutdown_signal() => {
            signal.map_err(|e| anyhow!(e))?;
        }
    }

    hub.shutdown().await;
    webserver::shutdown();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => logger::error(LogTag::Webserver, &e),
        Err(e) => logger::error(LogTag::Webserver, &format!("Webserver task failed: {}", e)),
    }

    logger::info(LogTag::System, "Notification hub stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C, SIGTERM on Unix)
async fn wait_for_shutdown_signal() -> Result<(), String> {
    #[cfg(unix)]
    let signal_name = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| format!("Failed to bind SIGINT: {}", e))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| format!("Failed to bind SIGTERM: {}", e))?;

        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    #[cfg(windows)]
    let signal_name = {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| format!("Failed to listen for shutdown signal: {}", e))?;
        "CTRL_C"
    };

    logger::warning(
        LogTag::System,
        &format!("Shutdown signal received ({}), stopping...", signal_name),
    );

    // A second Ctrl+C during shutdown exits immediately
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::error(LogTag::System, "Second Ctrl+C detected, forcing exit.");
            logger::flush();
            std::process::exit(130);
        }
    });

    Ok(())
}
