use std::sync::Arc;

use golf_handicap_app::build_application;
use golf_handicap_server::{config::ServerConfig, logs::init_logger};
use golf_persistence_sqlite::{
    courses::SqliteCourseLookup, create_db_pool, migrate, rounds::SqliteRoundRepository,
    users::SqliteUserRepository,
};
use log::info;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().expect("Invalid configuration");
    init_logger(&config.log).expect("Failed to initialize logger");

    let pool = create_db_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    migrate(&pool).await.expect("Failed to create tables");

    let round_repo = Arc::new(SqliteRoundRepository::new(pool.clone()));
    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let course_lookup = Arc::new(SqliteCourseLookup::new(
        pool.clone(),
        config.course_cache_ttl,
    ));

    let app = build_application(
        round_repo,
        user_repo,
        course_lookup,
        config.reconcile_interval,
    )
    .await;

    info!(
        "Starting application on {} (handicap reconcile every {:?})",
        config.database_url, config.reconcile_interval
    );

    shutdown_signal().await;

    app.jobs.abort();
    pool.close().await;
    info!("Shut down");
}
