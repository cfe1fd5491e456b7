//! In-memory backend with optional demo seed data.
//!
//! One [`MemoryStore`] implements every repository trait behind a single
//! lock, so counter updates and registration rows change together exactly
//! as they do inside a PostgreSQL transaction.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::repositories::{
    Credential, CredentialRepository, EventRepository, PasswordReset, RegistrationRepository,
    ReviewRepository, UserRepository,
};
use super::unit_of_work::Backend;
use crate::errors::{AppError, AppResult, IdentityError};
use domain::{
    Attendance, DomainError, Event, NewEvent, Password, Rating, RatingSummary, Registration,
    RegistrationStatus, Review, Subscription, User, Withdrawal,
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@supperclub.local";
pub const DEMO_MEMBER_EMAIL: &str = "member@supperclub.local";
pub const DEMO_GUEST_EMAIL: &str = "guest@supperclub.local";
pub const DEMO_PASSWORD: &str = "supperclub-demo";

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    registrations: Vec<Registration>,
    reviews: Vec<Review>,
    /// Keyed by lowercased email
    credentials: HashMap<String, Credential>,
    resets: HashMap<String, PasswordReset>,
}

impl Tables {
    fn registration_index(&self, event_id: Uuid, user_id: Uuid) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.event_id == event_id && r.user_id == user_id)
    }

    fn approved_reviews(&self, event_id: Uuid) -> impl Iterator<Item = &Review> {
        self.reviews
            .iter()
            .filter(move |r| r.event_id == event_id && r.is_approved())
    }

    fn promote_oldest(&mut self, event_id: Uuid) -> Option<Registration> {
        let event = self.events.get_mut(&event_id)?;
        let mut attendance =
            Attendance::new(event.capacity, event.registered_count, event.waitlist_count);

        // Registrations are kept in insertion order, which is registered_at order
        let index = self.registrations.iter().position(|r| {
            r.event_id == event_id && r.status == RegistrationStatus::Waitlist
        })?;
        if !attendance.promote() {
            return None;
        }

        event.registered_count = attendance.registered;
        event.waitlist_count = attendance.waitlist;
        let promoted = &mut self.registrations[index];
        promoted.status = RegistrationStatus::Confirmed;

        tracing::info!(event_id = %event_id, user_id = %promoted.user_id, "Promoted from waitlist");
        Some(promoted.clone())
    }
}

/// Every repository over one set of in-process tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::internal("Memory backend lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let mut tables = self.lock()?;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(IdentityError::EmailInUse.into());
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, user: User) -> AppResult<User> {
        let mut tables = self.lock()?;
        let stored = tables.users.get_mut(&user.id).ok_or(AppError::NotFound)?;
        stored.name = user.name;
        stored.bio = user.bio;
        stored.photo_url = user.photo_url;
        stored.updated_at = user.updated_at;
        Ok(stored.clone())
    }

    async fn set_subscription(
        &self,
        user_id: Uuid,
        subscription: Subscription,
        updated_at: DateTime<Utc>,
    ) -> AppResult<User> {
        let mut tables = self.lock()?;
        let stored = tables.users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        stored.subscription = Some(subscription);
        stored.updated_at = updated_at;
        Ok(stored.clone())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let mut events: Vec<Event> = self.lock()?.events.values().cloned().collect();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        Ok(self.lock()?.events.get(&id).cloned())
    }

    async fn create(&self, event: Event) -> AppResult<Event> {
        self.lock()?.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn update(&self, event: Event) -> AppResult<Event> {
        let mut tables = self.lock()?;
        let stored = tables
            .events
            .get_mut(&event.id)
            .ok_or(DomainError::EventNotFound)?;

        if stored.registered_count > event.capacity {
            return Err(DomainError::CapacityBelowRegistered {
                capacity: event.capacity,
                registered: stored.registered_count,
            }
            .into());
        }

        // Counters stay as stored
        *stored = Event {
            registered_count: stored.registered_count,
            waitlist_count: stored.waitlist_count,
            created_at: stored.created_at,
            ..event
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.lock()?;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        tables.registrations.retain(|r| r.event_id != id);
        tables.reviews.retain(|r| r.event_id != id);
        Ok(true)
    }
}

#[async_trait]
impl RegistrationRepository for MemoryStore {
    async fn admit(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Registration> {
        let mut tables = self.lock()?;
        if tables.registration_index(event_id, user_id).is_some() {
            return Err(DomainError::AlreadyRegistered.into());
        }

        let event = tables
            .events
            .get_mut(&event_id)
            .ok_or(DomainError::EventNotFound)?;
        let mut attendance =
            Attendance::new(event.capacity, event.registered_count, event.waitlist_count);
        let status = attendance.admit();
        event.registered_count = attendance.registered;
        event.waitlist_count = attendance.waitlist;

        let registration = Registration::new(event_id, user_id, status);
        tables.registrations.push(registration.clone());
        Ok(registration)
    }

    async fn withdraw(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        promote: bool,
    ) -> AppResult<Withdrawal> {
        let mut tables = self.lock()?;
        let Some(index) = tables.registration_index(event_id, user_id) else {
            return Ok(Withdrawal::none());
        };
        let removed = tables.registrations.remove(index);

        if let Some(event) = tables.events.get_mut(&event_id) {
            let mut attendance =
                Attendance::new(event.capacity, event.registered_count, event.waitlist_count);
            attendance.withdraw(removed.status);
            event.registered_count = attendance.registered;
            event.waitlist_count = attendance.waitlist;
        }

        let promoted = if promote && removed.is_confirmed() {
            tables.promote_oldest(event_id)
        } else {
            None
        };

        Ok(Withdrawal {
            removed: Some(removed),
            promoted,
        })
    }

    async fn find(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Registration>> {
        let tables = self.lock()?;
        Ok(tables
            .registration_index(event_id, user_id)
            .map(|i| tables.registrations[i].clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Registration>> {
        let mut registrations: Vec<Registration> = self
            .lock()?
            .registrations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| r.registered_at);
        Ok(registrations)
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        let mut registrations: Vec<Registration> = self
            .lock()?
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| r.registered_at);
        Ok(registrations)
    }
}

fn newest_first(mut reviews: Vec<Review>) -> Vec<Review> {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    reviews
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create(&self, review: Review) -> AppResult<Review> {
        let mut tables = self.lock()?;
        if !tables.events.contains_key(&review.event_id) {
            return Err(DomainError::EventNotFound.into());
        }
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.lock()?.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn approve(&self, id: Uuid) -> AppResult<Option<Review>> {
        let mut tables = self.lock()?;
        Ok(tables.reviews.iter_mut().find(|r| r.id == id).map(|review| {
            review.approve();
            review.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| r.id != id);
        Ok(tables.reviews.len() < before)
    }

    async fn list_approved_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = self.lock()?.approved_reviews(event_id).cloned().collect();
        Ok(newest_first(reviews))
    }

    async fn list_pending(&self) -> AppResult<Vec<Review>> {
        let reviews = self
            .lock()?
            .reviews
            .iter()
            .filter(|r| !r.is_approved())
            .cloned()
            .collect();
        Ok(newest_first(reviews))
    }

    async fn rating_summary(&self, event_id: Uuid) -> AppResult<RatingSummary> {
        Ok(RatingSummary::from_reviews(
            self.lock()?.approved_reviews(event_id),
        ))
    }

    async fn rating_summaries(&self) -> AppResult<HashMap<Uuid, RatingSummary>> {
        let tables = self.lock()?;
        let mut by_event: HashMap<Uuid, Vec<&Review>> = HashMap::new();
        for review in tables.reviews.iter().filter(|r| r.is_approved()) {
            by_event.entry(review.event_id).or_default().push(review);
        }

        Ok(by_event
            .into_iter()
            .map(|(event_id, reviews)| (event_id, RatingSummary::from_reviews(reviews)))
            .collect())
    }
}

#[async_trait]
impl CredentialRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        Ok(self.lock()?.credentials.get(email).cloned())
    }

    async fn create(&self, credential: Credential) -> AppResult<Credential> {
        let mut tables = self.lock()?;
        if tables.credentials.contains_key(&credential.email) {
            return Err(IdentityError::EmailInUse.into());
        }
        tables
            .credentials
            .insert(credential.email.clone(), credential.clone());
        Ok(credential)
    }

    async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        self.lock()?
            .credentials
            .retain(|_, credential| credential.user_id != user_id);
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: String) -> AppResult<()> {
        let mut tables = self.lock()?;
        let credential = tables
            .credentials
            .values_mut()
            .find(|c| c.user_id == user_id)
            .ok_or(AppError::NotFound)?;
        credential.password_hash = password_hash;
        Ok(())
    }

    async fn store_reset(&self, reset: PasswordReset) -> AppResult<()> {
        self.lock()?.resets.insert(reset.token_hash.clone(), reset);
        Ok(())
    }

    async fn take_reset(&self, token_hash: &str) -> AppResult<Option<PasswordReset>> {
        Ok(self.lock()?.resets.remove(token_hash))
    }
}

/// In-memory implementation of Backend
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with demo accounts, upcoming and past events,
    /// registrations and reviews.
    pub fn with_demo_data() -> AppResult<Self> {
        let backend = Self::new();
        {
            let mut tables = backend.store.lock()?;
            seed(&mut tables)?;
        }
        tracing::info!("Memory backend seeded with demo data");
        Ok(backend)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.store.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.store.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        self.store.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.store.clone()
    }

    fn credentials(&self) -> Arc<dyn CredentialRepository> {
        self.store.clone()
    }

    async fn ping(&self) -> AppResult<()> {
        self.store.lock().map(|_| ())
    }
}

fn seed_account(tables: &mut Tables, email: &str, name: &str) -> AppResult<User> {
    let password = Password::new(DEMO_PASSWORD)?;
    let user = User::new(Uuid::new_v4(), email, name);

    tables.credentials.insert(
        email.to_string(),
        Credential {
            user_id: user.id,
            email: email.to_string(),
            password_hash: password.into_string(),
            created_at: user.created_at,
        },
    );
    tables.users.insert(user.id, user.clone());
    Ok(user)
}

fn seed_event(tables: &mut Tables, input: NewEvent, guests: u32) -> Uuid {
    let event = Event::create(input);
    let id = event.id;
    tables.events.insert(id, event);

    // Anonymous guests so the counters match stored registrations
    let opened = Utc::now() - Duration::days(30);
    for i in 0..guests {
        let Some(event) = tables.events.get_mut(&id) else {
            break;
        };
        let mut attendance =
            Attendance::new(event.capacity, event.registered_count, event.waitlist_count);
        let status = attendance.admit();
        event.registered_count = attendance.registered;
        event.waitlist_count = attendance.waitlist;

        let mut registration = Registration::new(id, Uuid::new_v4(), status);
        registration.registered_at = opened + Duration::minutes(i64::from(i));
        tables.registrations.push(registration);
    }
    id
}

fn seed(tables: &mut Tables) -> AppResult<()> {
    let now = Utc::now();

    let mut admin = seed_account(tables, DEMO_ADMIN_EMAIL, "Camille Admin")?;
    admin.is_admin = true;
    tables.users.insert(admin.id, admin);

    let mut member = seed_account(tables, DEMO_MEMBER_EMAIL, "Marco Member")?;
    member.bio = Some("Pasta enthusiast".to_string());
    member.subscription = Some(Subscription::annual(now - Duration::days(30), "card"));
    tables.users.insert(member.id, member.clone());

    seed_account(tables, DEMO_GUEST_EMAIL, "Gina Guest")?;

    seed_event(
        tables,
        NewEvent {
            title: "Tuscan Harvest Supper".to_string(),
            description: "Five courses from the autumn harvest, paired with Chianti.".to_string(),
            chef_name: "Lucia Bianchi".to_string(),
            image_url: None,
            date: now + Duration::days(14),
            location: "The Old Granary".to_string(),
            capacity: 20,
            price: 150.0,
        },
        18,
    );
    seed_event(
        tables,
        NewEvent {
            title: "Omakase Night".to_string(),
            description: "A counter seat for the chef's seasonal selection.".to_string(),
            chef_name: "Kenji Mori".to_string(),
            image_url: None,
            date: now + Duration::days(21),
            location: "Harbour Kitchen".to_string(),
            capacity: 20,
            price: 180.0,
        },
        20,
    );
    seed_event(
        tables,
        NewEvent {
            title: "Street Food Sunday".to_string(),
            description: "Small plates from around the world, family style.".to_string(),
            chef_name: "Ama Mensah".to_string(),
            image_url: None,
            date: now + Duration::days(30),
            location: "Riverside Market Hall".to_string(),
            capacity: 40,
            price: 25.0,
        },
        5,
    );
    let past = seed_event(
        tables,
        NewEvent {
            title: "Winter Truffle Dinner".to_string(),
            description: "Black truffle over hand-cut tajarin.".to_string(),
            chef_name: "Lucia Bianchi".to_string(),
            image_url: None,
            date: now - Duration::days(10),
            location: "The Old Granary".to_string(),
            capacity: 12,
            price: 210.0,
        },
        12,
    );

    let mut approved = Review::submit(
        past,
        &member,
        Rating::new(5)?,
        "Best truffle dish I have had outside Piedmont.",
        now - Duration::days(9),
    )?;
    approved.approve();
    tables.reviews.push(approved);

    let pending = Review::submit(
        past,
        &member,
        Rating::new(4)?,
        "Second visit, still great. Dessert could be lighter.",
        now - Duration::days(8),
    )?;
    tables.reviews.push(pending);

    Ok(())
}
