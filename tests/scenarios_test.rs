//! End-to-end booking scenarios through the state containers.

use std::sync::Arc;

use supper_club::commands::demo::run_scenarios;
use supper_club::config::Config;
use supper_club::infra::{
    Backend, ErrorLog, LogMailer, MemoryBackend, MemorySessionStore, DEMO_MEMBER_EMAIL,
    DEMO_PASSWORD,
};
use supper_club::services::{ServiceContainer, Services};
use supper_club::state::{CatalogState, SessionState};

use domain::RegistrationStatus;

fn services_with(config: Config) -> (Arc<MemoryBackend>, Arc<dyn ServiceContainer>) {
    let backend = Arc::new(MemoryBackend::with_demo_data().unwrap());
    let services = Arc::new(Services::build(
        backend.clone(),
        Arc::new(MemorySessionStore::new()),
        Arc::new(LogMailer::new(config.smtp_from.clone())),
        config,
    ));
    (backend, services)
}

#[tokio::test]
async fn test_demo_scenarios_pass() {
    let (_, services) = services_with(Config::development());
    let log = ErrorLog::default();

    let outcomes = run_scenarios(services, log.clone()).await.unwrap();

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert!(outcome.passed, "{} failed: {}", outcome.name, outcome.detail);
    }
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_freed_seat_goes_to_waitlist_when_promotion_is_on() {
    let mut config = Config::development();
    config.waitlist_auto_promote = true;
    let (backend, services) = services_with(config);
    let log = ErrorLog::default();

    let session = Arc::new(SessionState::new(services.clone(), log.clone()));
    session.sign_in(DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await.unwrap();
    let catalog = CatalogState::new(services, session, log);
    catalog.refresh().await.unwrap();

    let omakase = catalog
        .events()
        .await
        .into_iter()
        .find(|view| view.event.title == "Omakase Night")
        .unwrap();
    let waitlisted = catalog.register(omakase.event.id).await.unwrap();
    assert_eq!(waitlisted.status, RegistrationStatus::Waitlist);

    // A confirmed guest from the seed data withdraws
    let attendees = backend
        .registrations()
        .list_for_event(omakase.event.id)
        .await
        .unwrap();
    let confirmed = attendees
        .iter()
        .find(|r| r.status == RegistrationStatus::Confirmed)
        .unwrap();
    let withdrawal = backend
        .registrations()
        .withdraw(omakase.event.id, confirmed.user_id, true)
        .await
        .unwrap();
    assert!(withdrawal.removed.is_some());
    assert_eq!(
        withdrawal.promoted.map(|r| r.user_id),
        Some(waitlisted.user_id)
    );

    catalog.refresh().await.unwrap();
    let after = catalog.event(omakase.event.id).await.unwrap();
    assert_eq!(after.event.registered_count, 20);
    assert_eq!(after.event.waitlist_count, 0);
    assert_eq!(
        catalog
            .registration_for(omakase.event.id)
            .await
            .map(|r| r.status),
        Some(RegistrationStatus::Confirmed)
    );
}
