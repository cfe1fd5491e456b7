//! Membership subscription and subscriber pricing rules.
//!
//! A subscription is "active" for pricing and admission purposes iff its
//! status is [`SubscriptionStatus::Active`] AND its end date lies strictly in
//! the future. Every rule here takes `now` explicitly so callers decide the
//! clock.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ANNUAL_PLAN_MONTHS, ANNUAL_PLAN_PRICE, DEFAULT_PAYMENT_METHOD, FLAT_SUBSCRIBER_DISCOUNT,
};
use crate::error::{DomainError, DomainResult};
use crate::user::User;

/// Membership plan. Only the annual tier exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Annual,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Annual => "annual",
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            SubscriptionPlan::Annual => ANNUAL_PLAN_PRICE,
        }
    }
}

impl From<&str> for SubscriptionPlan {
    fn from(_s: &str) -> Self {
        SubscriptionPlan::Annual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

/// Unknown stored values read as expired so they never grant member benefits.
impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Expired,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription embedded in a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Subscription {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: f64,
    pub payment_method: String,
    pub auto_renewal: bool,
}

impl Subscription {
    /// A fresh annual subscription starting at `now`.
    pub fn annual(now: DateTime<Utc>, payment_method: impl Into<String>) -> Self {
        let end_date = now
            .checked_add_months(Months::new(ANNUAL_PLAN_MONTHS))
            .unwrap_or_else(|| now + Duration::days(365));

        Self {
            plan: SubscriptionPlan::Annual,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date,
            price: SubscriptionPlan::Annual.price(),
            payment_method: payment_method.into(),
            auto_renewal: true,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > now
    }
}

/// What a non-member is offered when redirected to the subscription page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubscriptionOffer {
    pub plan: SubscriptionPlan,
    pub price: f64,
    /// Flat amount taken off every event for members
    pub event_discount: f64,
}

impl SubscriptionOffer {
    pub fn current() -> Self {
        Self {
            plan: SubscriptionPlan::Annual,
            price: SubscriptionPlan::Annual.price(),
            event_discount: FLAT_SUBSCRIBER_DISCOUNT,
        }
    }
}

/// True iff `user` exists and holds a subscription active at `now`.
pub fn has_active_subscription(user: Option<&User>, now: DateTime<Utc>) -> bool {
    user.is_some_and(|u| u.has_active_subscription(now))
}

/// Price `user` pays for an event with `base_price`.
///
/// Members get [`FLAT_SUBSCRIBER_DISCOUNT`] off, floored at zero.
pub fn event_price(base_price: f64, user: Option<&User>, now: DateTime<Utc>) -> f64 {
    if has_active_subscription(user, now) {
        (base_price - FLAT_SUBSCRIBER_DISCOUNT).max(0.0)
    } else {
        base_price
    }
}

/// Build the subscription `user` gets by subscribing at `now`.
///
/// # Errors
/// [`DomainError::AlreadySubscribed`] if the user is already an active member.
pub fn subscribe(
    user: &User,
    now: DateTime<Utc>,
    payment_method: Option<&str>,
) -> DomainResult<Subscription> {
    if has_active_subscription(Some(user), now) {
        return Err(DomainError::AlreadySubscribed);
    }

    let method = payment_method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD);

    Ok(Subscription::annual(now, method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn member(status: SubscriptionStatus, end_date: DateTime<Utc>) -> User {
        let mut user = User::new(Uuid::new_v4(), "m@example.com", "Member");
        user.subscription = Some(Subscription {
            status,
            end_date,
            ..Subscription::annual(end_date - Duration::days(365), "card")
        });
        user
    }

    #[test]
    fn test_no_user_is_not_subscribed() {
        assert!(!has_active_subscription(None, Utc::now()));
    }

    #[test]
    fn test_user_without_subscription_pays_base_price() {
        let user = User::new(Uuid::new_v4(), "a@example.com", "A");
        let now = Utc::now();

        assert_eq!(event_price(150.0, Some(&user), now), 150.0);
        assert_eq!(event_price(10.0, Some(&user), now), 10.0);
        assert_eq!(event_price(150.0, None, now), 150.0);
    }

    #[test]
    fn test_expired_subscription_pays_base_price() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Active, now - Duration::days(1));

        assert!(!has_active_subscription(Some(&user), now));
        assert_eq!(event_price(150.0, Some(&user), now), 150.0);
    }

    #[test]
    fn test_cancelled_with_future_end_date_is_inactive() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Cancelled, now + Duration::days(90));

        assert!(!has_active_subscription(Some(&user), now));
    }

    #[test]
    fn test_end_date_equal_to_now_is_inactive() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Active, now);

        assert!(!has_active_subscription(Some(&user), now));
        assert!(has_active_subscription(
            Some(&user),
            now - Duration::seconds(1)
        ));
    }

    #[test]
    fn test_user_check_and_free_check_agree() {
        let now = Utc::now();
        let users = [
            User::new(Uuid::new_v4(), "a@example.com", "A"),
            member(SubscriptionStatus::Active, now + Duration::days(30)),
            member(SubscriptionStatus::Active, now),
            member(SubscriptionStatus::Expired, now + Duration::days(30)),
            member(SubscriptionStatus::Cancelled, now + Duration::days(30)),
        ];

        let active: Vec<bool> = users
            .iter()
            .map(|u| has_active_subscription(Some(u), now))
            .collect();
        assert_eq!(active, [false, true, false, false, false]);
        for user in &users {
            assert_eq!(
                user.has_active_subscription(now),
                has_active_subscription(Some(user), now)
            );
        }
    }

    #[test]
    fn test_member_discount_is_flat() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Active, now + Duration::days(30));

        assert_eq!(event_price(150.0, Some(&user), now), 120.0);
        assert_eq!(event_price(30.0, Some(&user), now), 0.0);
    }

    #[test]
    fn test_member_discount_never_negative() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Active, now + Duration::days(30));

        assert_eq!(event_price(12.5, Some(&user), now), 0.0);
        assert_eq!(event_price(0.0, Some(&user), now), 0.0);
    }

    #[test]
    fn test_subscribe_builds_annual_plan() {
        let now = Utc::now();
        let user = User::new(Uuid::new_v4(), "new@example.com", "New");

        let subscription = subscribe(&user, now, None).unwrap();

        assert_eq!(subscription.plan, SubscriptionPlan::Annual);
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.price, 197.0);
        assert_eq!(subscription.payment_method, "card");
        assert!(subscription.auto_renewal);
        assert_eq!(subscription.start_date, now);
        assert!(subscription.end_date > now + Duration::days(364));
        assert!(subscription.end_date <= now + Duration::days(366));
    }

    #[test]
    fn test_subscribe_rejects_active_member() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Active, now + Duration::days(10));

        assert_eq!(
            subscribe(&user, now, Some("paypal")),
            Err(DomainError::AlreadySubscribed)
        );
    }

    #[test]
    fn test_resubscribe_after_expiry() {
        let now = Utc::now();
        let user = member(SubscriptionStatus::Expired, now - Duration::days(3));

        let subscription = subscribe(&user, now, Some("paypal")).unwrap();
        assert_eq!(subscription.payment_method, "paypal");
        assert!(subscription.is_active_at(now));
    }

    #[test]
    fn test_unknown_status_reads_as_expired() {
        assert_eq!(SubscriptionStatus::from("paused"), SubscriptionStatus::Expired);
        assert_eq!(SubscriptionStatus::from("active"), SubscriptionStatus::Active);
    }
}
