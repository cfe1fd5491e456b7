//! Registration repository with atomic seat admission.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::event::{self, Entity as EventEntity};
use super::entities::registration::{self, ActiveModel, Entity as RegistrationEntity};
use crate::errors::{AppError, AppResult};
use crate::infra::unit_of_work::settle;
use domain::{DomainError, Registration, RegistrationStatus, Withdrawal};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Registration repository trait for dependency injection.
///
/// `admit` and `withdraw` each move one event's counters together with the
/// registration row in a single atomic step.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Take a seat if `registered_count < capacity`, otherwise join the
    /// waitlist, and record the registration with the matching status.
    ///
    /// Fails with `EventNotFound` or `AlreadyRegistered`.
    async fn admit(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Registration>;

    /// Delete the user's registration and release its counter.
    /// With `promote`, a freed seat goes to the oldest waitlisted entry.
    async fn withdraw(&self, event_id: Uuid, user_id: Uuid, promote: bool)
        -> AppResult<Withdrawal>;

    async fn find(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>>;

    /// Oldest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Registration>>;

    /// Oldest first
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>>;
}

/// PostgreSQL implementation of RegistrationRepository
pub struct RegistrationStore {
    db: DatabaseConnection,
}

impl RegistrationStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn begin(&self) -> AppResult<sea_orm::DatabaseTransaction> {
        self.db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)
    }
}

#[async_trait]
impl RegistrationRepository for RegistrationStore {
    async fn admit(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Registration> {
        let txn = self.begin().await?;
        let result = admit_in(&txn, event_id, user_id).await;
        settle(txn, result).await
    }

    async fn withdraw(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        promote: bool,
    ) -> AppResult<Withdrawal> {
        let txn = self.begin().await?;
        let result = withdraw_in(&txn, event_id, user_id, promote).await;
        settle(txn, result).await
    }

    async fn find(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>> {
        let result = find_in(&self.db, event_id, user_id).await?;
        Ok(result.map(Registration::from))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Registration>> {
        let models = RegistrationEntity::find()
            .filter(registration::Column::UserId.eq(user_id))
            .order_by_asc(registration::Column::RegisteredAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Registration::from).collect())
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        let models = RegistrationEntity::find()
            .filter(registration::Column::EventId.eq(event_id))
            .order_by_asc(registration::Column::RegisteredAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Registration::from).collect())
    }
}

async fn find_in<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<registration::Model>> {
    RegistrationEntity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::UserId.eq(user_id))
        .one(conn)
        .await
        .map_err(AppError::from)
}

async fn admit_in<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
    user_id: Uuid,
) -> AppResult<Registration> {
    if find_in(conn, event_id, user_id).await?.is_some() {
        return Err(DomainError::AlreadyRegistered.into());
    }

    // Conditional increment: only one of two racing admissions can take
    // the last seat.
    let seated = EventEntity::update_many()
        .col_expr(
            event::Column::RegisteredCount,
            Expr::col(event::Column::RegisteredCount).add(1),
        )
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(event::Column::RegisteredCount).lt(Expr::col(event::Column::Capacity)))
        .exec(conn)
        .await?;

    let status = if seated.rows_affected == 1 {
        RegistrationStatus::Confirmed
    } else {
        let queued = EventEntity::update_many()
            .col_expr(
                event::Column::WaitlistCount,
                Expr::col(event::Column::WaitlistCount).add(1),
            )
            .filter(event::Column::Id.eq(event_id))
            .exec(conn)
            .await?;

        if queued.rows_affected == 0 {
            return Err(DomainError::EventNotFound.into());
        }
        RegistrationStatus::Waitlist
    };

    let registration = Registration::new(event_id, user_id, status);
    let model = ActiveModel {
        id: Set(registration.id),
        event_id: Set(registration.event_id),
        user_id: Set(registration.user_id),
        status: Set(registration.status.as_str().to_string()),
        registered_at: Set(registration.registered_at),
    }
    .insert(conn)
    .await
    .map_err(|e| match e.sql_err() {
        // Lost a race against the same user's parallel request
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyRegistered.into(),
        _ => AppError::from(e),
    })?;

    Ok(Registration::from(model))
}

async fn withdraw_in<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
    user_id: Uuid,
    promote: bool,
) -> AppResult<Withdrawal> {
    let Some(existing) = find_in(conn, event_id, user_id).await? else {
        return Ok(Withdrawal::none());
    };

    // A concurrent withdrawal already deleted the row and released its
    // counter.
    let deleted = RegistrationEntity::delete_by_id(existing.id)
        .exec(conn)
        .await?;
    if deleted.rows_affected == 0 {
        return Ok(Withdrawal::none());
    }

    let removed = Registration::from(existing);

    let counter = match removed.status {
        RegistrationStatus::Confirmed => event::Column::RegisteredCount,
        RegistrationStatus::Waitlist => event::Column::WaitlistCount,
    };
    EventEntity::update_many()
        .col_expr(counter, Expr::col(counter).sub(1))
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(counter).gt(0))
        .exec(conn)
        .await?;

    let promoted = if promote && removed.is_confirmed() {
        promote_oldest(conn, event_id).await?
    } else {
        None
    };

    Ok(Withdrawal {
        removed: Some(removed),
        promoted,
    })
}

async fn promote_oldest<C: ConnectionTrait>(
    conn: &C,
    event_id: Uuid,
) -> AppResult<Option<Registration>> {
    let oldest = RegistrationEntity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Status.eq(RegistrationStatus::Waitlist.as_str()))
        .order_by_asc(registration::Column::RegisteredAt)
        .one(conn)
        .await?;

    let Some(oldest) = oldest else {
        return Ok(None);
    };

    let seated = EventEntity::update_many()
        .col_expr(
            event::Column::RegisteredCount,
            Expr::col(event::Column::RegisteredCount).add(1),
        )
        .col_expr(
            event::Column::WaitlistCount,
            Expr::col(event::Column::WaitlistCount).sub(1),
        )
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(event::Column::RegisteredCount).lt(Expr::col(event::Column::Capacity)))
        .filter(Expr::col(event::Column::WaitlistCount).gt(0))
        .exec(conn)
        .await?;

    if seated.rows_affected == 0 {
        return Ok(None);
    }

    let mut active: ActiveModel = oldest.into();
    active.status = Set(RegistrationStatus::Confirmed.as_str().to_string());
    let model = active.update(conn).await?;

    tracing::info!(event_id = %event_id, user_id = %model.user_id, "Promoted from waitlist");
    Ok(Some(Registration::from(model)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn rows(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn row(event_id: Uuid, user_id: Uuid, status: RegistrationStatus) -> registration::Model {
        registration::Model {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status: status.as_str().to_string(),
            registered_at: Utc::now(),
        }
    }

    fn statements(db: DatabaseConnection) -> String {
        format!("{:?}", db.into_transaction_log())
    }

    #[tokio::test]
    async fn test_admit_takes_seat_when_increment_lands() {
        let (event_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<registration::Model>::new()])
            .append_query_results([[row(event_id, user_id, RegistrationStatus::Confirmed)]])
            .append_exec_results([rows(1)])
            .into_connection();

        let registration = admit_in(&db, event_id, user_id).await.unwrap();

        assert_eq!(registration.status, RegistrationStatus::Confirmed);
        let log = statements(db);
        assert!(log.contains("\"confirmed\""));
        assert!(!log.contains("waitlist_count"));
    }

    #[tokio::test]
    async fn test_admit_joins_waitlist_when_increment_misses() {
        let (event_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<registration::Model>::new()])
            .append_query_results([[row(event_id, user_id, RegistrationStatus::Waitlist)]])
            .append_exec_results([rows(0), rows(1)])
            .into_connection();

        let registration = admit_in(&db, event_id, user_id).await.unwrap();

        assert_eq!(registration.status, RegistrationStatus::Waitlist);
        let log = statements(db);
        assert!(log.contains("waitlist_count"));
        assert!(log.contains("\"waitlist\""));
        assert!(!log.contains("\"confirmed\""));
    }

    #[tokio::test]
    async fn test_admit_missing_event_inserts_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<registration::Model>::new()])
            .append_exec_results([rows(0), rows(0)])
            .into_connection();

        let err = admit_in(&db, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::EventNotFound)));
        assert!(!statements(db).contains("INSERT"));
    }

    #[tokio::test]
    async fn test_admit_existing_registration_touches_no_counter() {
        let (event_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row(event_id, user_id, RegistrationStatus::Waitlist)]])
            .into_connection();

        let err = admit_in(&db, event_id, user_id).await.unwrap_err();

        assert!(matches!(err, AppError::Domain(DomainError::AlreadyRegistered)));
        assert!(!statements(db).contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_withdraw_after_concurrent_delete_releases_nothing() {
        let (event_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row(event_id, user_id, RegistrationStatus::Confirmed)]])
            .append_exec_results([rows(0)])
            .into_connection();

        let withdrawal = withdraw_in(&db, event_id, user_id, true).await.unwrap();

        assert_eq!(withdrawal, Withdrawal::none());
        let log = statements(db);
        assert!(log.contains("DELETE"));
        assert!(!log.contains("registered_count"));
    }

    #[tokio::test]
    async fn test_withdraw_confirmed_releases_seat_and_promotes() {
        let (event_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());
        let waiting = row(event_id, Uuid::new_v4(), RegistrationStatus::Waitlist);
        let mut seated = waiting.clone();
        seated.status = RegistrationStatus::Confirmed.as_str().to_string();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row(event_id, user_id, RegistrationStatus::Confirmed)]])
            .append_query_results([[waiting.clone()]])
            .append_query_results([[seated]])
            .append_exec_results([rows(1), rows(1), rows(1)])
            .into_connection();

        let withdrawal = withdraw_in(&db, event_id, user_id, true).await.unwrap();

        assert_eq!(withdrawal.removed.map(|r| r.user_id), Some(user_id));
        let promoted = withdrawal.promoted.unwrap();
        assert_eq!(promoted.user_id, waiting.user_id);
        assert_eq!(promoted.status, RegistrationStatus::Confirmed);
    }
}
