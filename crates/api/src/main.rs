use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pchart_api::config::ServerConfig;
use pchart_api::notifications::NotificationRouter;
use pchart_api::router::build_app_router;
use pchart_api::state::AppState;
use pchart_db::DbPool;
use pchart_events::EventBus;
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pchart_api=debug,pchart_db=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        steps = ?config.operation_steps,
        "Loaded server configuration"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = prepare_database(&database_url).await;

    let event_bus = Arc::new(EventBus::default());
    let router_task = spawn_notification_router(pool.clone(), &event_bus);

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state, &config);

    let host = config.host.parse().expect("HOST must be an IP address");
    let addr = SocketAddr::new(host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "P-Chart API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped accepting connections");
    // The router holds a weak handle, so this closes the channel.
    drop(event_bus);
    drain(router_task, Duration::from_secs(config.shutdown_timeout_secs)).await;
    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify the connection and apply pending migrations.
async fn prepare_database(database_url: &str) -> DbPool {
    let pool = pchart_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    pchart_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    pchart_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");
    pool
}

fn spawn_notification_router(pool: DbPool, event_bus: &Arc<EventBus>) -> JoinHandle<()> {
    let receiver = event_bus.subscribe();
    let router = NotificationRouter::new(pool, event_bus);
    tracing::info!("Notification router started");
    tokio::spawn(router.run(receiver))
}

async fn drain(task: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => tracing::info!("Notification router stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Notification router task failed"),
        Err(_) => tracing::warn!(?timeout, "Notification router did not stop in time"),
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
