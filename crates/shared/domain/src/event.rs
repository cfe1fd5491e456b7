//! Culinary event aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_EVENT_CAPACITY, MAX_EVENT_TITLE_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Event as stored by the backend.
///
/// `registered_count` never exceeds `capacity`; the admission update in the
/// gateway is the only writer of either counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub chef_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: u32,
    /// Base (non-member) price
    pub price: f64,
    pub registered_count: u32,
    pub waitlist_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event with empty counters
    pub fn create(input: NewEvent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            chef_name: input.chef_name.trim().to_string(),
            image_url: input.image_url,
            date: input.date,
            location: input.location.trim().to_string(),
            capacity: input.capacity,
            price: input.price,
            registered_count: 0,
            waitlist_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn spots_left(&self) -> u32 {
        self.capacity.saturating_sub(self.registered_count)
    }

    pub fn is_full(&self) -> bool {
        self.registered_count >= self.capacity
    }

    /// Registration closes once the event starts.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date <= now
    }
}

/// Admin input for creating an event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub chef_name: String,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: u32,
    pub price: f64,
}

impl NewEvent {
    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.title)?;
        validate_required("Chef name", &self.chef_name)?;
        validate_required("Location", &self.location)?;
        validate_capacity(self.capacity)?;
        validate_price(self.price)
    }
}

/// Partial admin edit. Counters are not editable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub chef_name: Option<String>,
    pub image_url: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub price: Option<f64>,
}

impl EventUpdate {
    /// Field validation that needs no stored state
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(chef_name) = &self.chef_name {
            validate_required("Chef name", chef_name)?;
        }
        if let Some(location) = &self.location {
            validate_required("Location", location)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply onto the stored event.
    ///
    /// # Errors
    /// [`DomainError::CapacityBelowRegistered`] if the new capacity would
    /// leave confirmed attendees without a seat.
    pub fn apply(self, event: &mut Event) -> DomainResult<()> {
        self.validate()?;

        if let Some(capacity) = self.capacity {
            if capacity < event.registered_count {
                return Err(DomainError::CapacityBelowRegistered {
                    capacity,
                    registered: event.registered_count,
                });
            }
            event.capacity = capacity;
        }
        if let Some(title) = self.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(chef_name) = self.chef_name {
            event.chef_name = chef_name.trim().to_string();
        }
        if let Some(image_url) = self.image_url {
            event.image_url = Some(image_url).filter(|url| !url.trim().is_empty());
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(location) = self.location {
            event.location = location.trim().to_string();
        }
        if let Some(price) = self.price {
            event.price = price;
        }
        event.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    validate_required("Title", title)?;
    if title.trim().chars().count() > MAX_EVENT_TITLE_LENGTH {
        return Err(DomainError::validation(format!(
            "Title must be at most {} characters",
            MAX_EVENT_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_required(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_capacity(capacity: u32) -> DomainResult<()> {
    if capacity > MAX_EVENT_CAPACITY {
        return Err(DomainError::validation(format!(
            "Capacity must be at most {}",
            MAX_EVENT_CAPACITY
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("Price must be a positive amount"));
    }
    Ok(())
}
