//! Migrate command - Schema management for the PostgreSQL backend.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::{BackendKind, Config};
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

fn migration_failed(step: &str, e: impl std::fmt::Display) -> AppError {
    AppError::internal(format!("Migration {} failed: {}", step, e))
}

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    if config.backend != BackendKind::Postgres {
        return Err(AppError::internal(
            "Migrations need BACKEND=postgres; the memory backend has no schema",
        ));
    }

    // Manual control: nothing runs on connect
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| migration_failed("connect", e))?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations()
                .await
                .map_err(|e| migration_failed("up", e))?;
            tracing::info!("Booking schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration()
                .await
                .map_err(|e| migration_failed("down", e))?;
            tracing::info!("Rolled back the latest migration");
        }
        MigrateAction::Status => {
            let status = db
                .migration_status()
                .await
                .map_err(|e| migration_failed("status", e))?;
            let pending = status.iter().filter(|(_, applied)| !applied).count();

            for (name, applied) in &status {
                println!("{:<60} {}", name, if *applied { "applied" } else { "pending" });
            }
            tracing::info!(total = status.len(), pending, "Migration status");
        }
        MigrateAction::Fresh => {
            // Drops events, registrations, reviews and every account
            tracing::warn!("Dropping all tables and rebuilding the schema");
            db.fresh_migrations()
                .await
                .map_err(|e| migration_failed("fresh", e))?;
            tracing::info!("Schema rebuilt from scratch");
        }
    }

    Ok(())
}
