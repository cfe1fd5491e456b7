//! Mock-backed [`Backend`] for service unit tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::{
    Backend, CredentialRepository, EventRepository, MockCredentialRepository,
    MockEventRepository, MockRegistrationRepository, MockReviewRepository, MockUserRepository,
    RegistrationRepository, ReviewRepository, UserRepository,
};
use domain::{Event, NewEvent, Subscription, User};

/// Configure the mocks, then `build()` to share them behind a Backend.
#[derive(Default)]
pub struct TestBackend {
    pub users: MockUserRepository,
    pub events: MockEventRepository,
    pub registrations: MockRegistrationRepository,
    pub reviews: MockReviewRepository,
    pub credentials: MockCredentialRepository,
}

impl TestBackend {
    pub fn build(self) -> Arc<MockBackend> {
        Arc::new(MockBackend {
            users: Arc::new(self.users),
            events: Arc::new(self.events),
            registrations: Arc::new(self.registrations),
            reviews: Arc::new(self.reviews),
            credentials: Arc::new(self.credentials),
        })
    }
}

pub struct MockBackend {
    users: Arc<MockUserRepository>,
    events: Arc<MockEventRepository>,
    registrations: Arc<MockRegistrationRepository>,
    reviews: Arc<MockReviewRepository>,
    credentials: Arc<MockCredentialRepository>,
}

#[async_trait]
impl Backend for MockBackend {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.events.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        self.registrations.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.reviews.clone()
    }

    fn credentials(&self) -> Arc<dyn CredentialRepository> {
        self.credentials.clone()
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub fn guest(name: &str) -> User {
    User::new(
        Uuid::new_v4(),
        format!("{}@example.com", name.to_lowercase()),
        name,
    )
}

pub fn member(name: &str) -> User {
    let mut user = guest(name);
    user.subscription = Some(Subscription::annual(Utc::now() - Duration::days(1), "card"));
    user
}

pub fn upcoming_event(capacity: u32, registered: u32, price: f64) -> Event {
    let mut event = Event::create(NewEvent {
        title: "Harvest Supper".to_string(),
        description: String::new(),
        chef_name: "Lucia".to_string(),
        image_url: None,
        date: Utc::now() + Duration::days(7),
        location: "Granary".to_string(),
        capacity,
        price,
    });
    event.registered_count = registered;
    event
}
