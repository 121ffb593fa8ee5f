use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Level, error, info};

use ballot_server::config::AppConfig;
use ballot_server::database::init_db;
use ballot_server::state::AppState;
use ballot_server::voting::status::run_status_sweeper;
use ballot_server::{build_router, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let level = config.log.level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;

    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;
    if let Some(ref admin) = config.admin {
        seed::seed_admin(&db, admin)
            .await
            .context("Failed to seed administrator")?;
    }

    let sweep_interval = config.voting.status_sweep_interval_secs;
    if sweep_interval > 0 {
        tokio::spawn(run_status_sweeper(db.clone(), sweep_interval));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        eligibility = ?config.voting.eligibility,
        "Server running at http://{}", addr
    );

    let app = build_router(AppState { db, config });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
