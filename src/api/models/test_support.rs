//! Test helpers for constructing model fixtures.
//!
//! These builders keep review and user fixtures consistent across unit and
//! integration tests without repeating field lists.

use chrono::{DateTime, Duration, Utc};

use super::{Review, ReviewStatus, Role, UserRecord};

/// Constructs a pending review created at the given timestamp.
#[must_use]
pub fn pending_review(id: &str, created_at: DateTime<Utc>) -> Review {
    Review {
        id: id.to_owned(),
        status: ReviewStatus::Pending,
        created_at,
        title: None,
        repository: None,
        pr_number: None,
    }
}

/// Constructs a pending review created `minutes_ago` minutes before now.
#[must_use]
pub fn pending_review_minutes_ago(id: &str, minutes_ago: i64) -> Review {
    pending_review(id, Utc::now() - Duration::minutes(minutes_ago))
}

/// Constructs a completed review created at the given timestamp.
#[must_use]
pub fn completed_review(id: &str, created_at: DateTime<Utc>) -> Review {
    Review {
        status: ReviewStatus::Completed,
        ..pending_review(id, created_at)
    }
}

/// Constructs a user record with the given role.
#[must_use]
pub fn user_with_role(username: &str, role: Role) -> UserRecord {
    UserRecord {
        id: format!("user-{username}"),
        username: username.to_owned(),
        role,
        email: None,
        avatar_url: None,
    }
}
