//! Event registration and seat accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlist,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlist => "waitlist",
        }
    }
}

impl From<&str> for RegistrationStatus {
    fn from(s: &str) -> Self {
        match s {
            "confirmed" => RegistrationStatus::Confirmed,
            _ => RegistrationStatus::Waitlist,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's place at one event. At most one per (event, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(event_id: Uuid, user_id: Uuid, status: RegistrationStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            registered_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }
}

/// Seat counters of one event.
///
/// Backends run [`Attendance::admit`] and [`Attendance::withdraw`] inside the
/// same critical section that writes the registration row, so the pair
/// never drifts apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attendance {
    pub capacity: u32,
    pub registered: u32,
    pub waitlist: u32,
}

impl Attendance {
    pub fn new(capacity: u32, registered: u32, waitlist: u32) -> Self {
        Self {
            capacity,
            registered,
            waitlist,
        }
    }

    /// Take a seat if one is left, otherwise join the waitlist.
    pub fn admit(&mut self) -> RegistrationStatus {
        if self.registered < self.capacity {
            self.registered += 1;
            RegistrationStatus::Confirmed
        } else {
            self.waitlist += 1;
            RegistrationStatus::Waitlist
        }
    }

    /// Release the counter matching `status`.
    pub fn withdraw(&mut self, status: RegistrationStatus) {
        match status {
            RegistrationStatus::Confirmed => {
                self.registered = self.registered.saturating_sub(1)
            }
            RegistrationStatus::Waitlist => self.waitlist = self.waitlist.saturating_sub(1),
        }
    }

    /// Move one waitlisted attendee into a free seat.
    /// Returns false when there is nobody waiting or no seat.
    pub fn promote(&mut self) -> bool {
        if self.waitlist == 0 || self.registered >= self.capacity {
            return false;
        }
        self.waitlist -= 1;
        self.registered += 1;
        true
    }
}

/// Outcome of an unregister call.
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    /// Registration that was deleted, `None` when the user was not registered
    pub removed: Option<Registration>,
    /// Waitlisted registration confirmed into the freed seat
    pub promoted: Option<Registration>,
}

impl Withdrawal {
    pub fn none() -> Self {
        Self {
            removed: None,
            promoted: None,
        }
    }
}
