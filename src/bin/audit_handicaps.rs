use std::sync::Arc;

use golf_handicap_app::{
    domain::handicap::HandicapServiceImpl,
    workflow::handicap::{
        audit::{AuditHandicapsUseCase, AuditHandicapsUseCaseImpl},
        recompute::{RecomputeHandicapWorkflow, RecomputeHandicapWorkflowImpl},
    },
};
use golf_handicap_server::{config::ServerConfig, logs::init_logger};
use golf_persistence_sqlite::{
    create_db_pool, rounds::SqliteRoundRepository, users::SqliteUserRepository,
};

/// Prints every user's stored handicap next to the one their rounds produce.
/// With `--fix`, drifted handicaps are recomputed and stored.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let fix = match args.get(1).map(String::as_str) {
        None => false,
        Some("--fix") => true,
        Some(_) => {
            eprintln!("Usage: audit_handicaps [--fix]");
            std::process::exit(1);
        }
    };

    let config = ServerConfig::from_env().expect("Invalid configuration");
    init_logger(&config.log).expect("Failed to initialize logger");

    let pool = create_db_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let round_repo = Arc::new(SqliteRoundRepository::new(pool.clone()));
    let user_repo = Arc::new(SqliteUserRepository::new(pool));
    let handicap_service = Arc::new(HandicapServiceImpl::new());

    let audit = AuditHandicapsUseCaseImpl::new(
        round_repo.clone(),
        user_repo.clone(),
        handicap_service.clone(),
    );
    let entries = audit.audit_handicaps().await.expect("Audit failed");

    println!(
        "{:<24} {:>8} {:>8} {:>7}  best differentials",
        "player", "stored", "actual", "rounds"
    );
    for entry in &entries {
        let best: Vec<String> = entry
            .counted_differentials
            .iter()
            .map(|d| format!("{:.1}", d))
            .collect();
        println!(
            "{:<24} {:>8.1} {:>8.1} {:>7}  {}{}",
            entry.display_name,
            entry.stored_handicap,
            entry.computed_handicap,
            entry.total_rounds,
            best.join(", "),
            if entry.is_consistent() { "" } else { "  <- drift" }
        );
    }

    let drifted: Vec<_> = entries.iter().filter(|e| !e.is_consistent()).collect();
    println!("{} of {} handicaps drifted", drifted.len(), entries.len());

    if fix && !drifted.is_empty() {
        let recompute =
            RecomputeHandicapWorkflowImpl::new(round_repo, user_repo, handicap_service);
        for entry in drifted {
            match recompute.try_recompute_handicap(entry.user_id).await {
                Ok(handicap) => println!("Fixed {}: {:.1}", entry.display_name, handicap),
                Err(e) => eprintln!("Failed to fix {}: {}", entry.display_name, e),
            }
        }
    }
}
