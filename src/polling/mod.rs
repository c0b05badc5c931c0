//! Deduplicated background polling for asynchronous server-side work.
//!
//! [`PollingCoordinator`] manages a small registry of named periodic tasks.
//! Each task lists recent reviews through the gateway at a fixed cadence
//! (immediate first tick) and republishes the pending set plus the derived
//! "actively processing" subset to any number of watch subscribers. Tick
//! failures are logged and the timer keeps running; polling is self-healing
//! at its fixed, low cadence.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::gateway::ReviewListingApi;
use crate::api::models::{Review, ReviewListing, ReviewStatus};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Registry key for the pending-reviews subscription.
pub const PENDING_REVIEWS_KEY: &str = "pending-reviews";

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default listing bound per tick.
pub const DEFAULT_REVIEW_LIMIT: u32 = 50;

/// How recently a pending review must have been created to count as
/// actively processing.
const RECENCY_WINDOW_MINUTES: i64 = 5;

/// Published view of pending review activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewActivity {
    /// Reviews currently in the pending state.
    pub pending: Vec<Review>,
    /// Ids of pending reviews created within the recency window at the
    /// time of the poll tick.
    pub actively_processing: BTreeSet<String>,
}

/// Computes the actively-processing subset: pending reviews created within
/// the recency window of `now`.
#[must_use]
pub fn actively_processing(pending: &[Review], now: DateTime<Utc>) -> BTreeSet<String> {
    let cutoff = now - chrono::Duration::minutes(RECENCY_WINDOW_MINUTES);
    pending
        .iter()
        .filter(|review| review.created_at > cutoff)
        .map(|review| review.id.clone())
        .collect()
}

/// Coordinator owning the polling task registry and the published activity.
pub struct PollingCoordinator {
    reviews: Arc<dyn ReviewListingApi>,
    telemetry: Arc<dyn TelemetrySink>,
    interval: Duration,
    limit: u32,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
    activity: watch::Sender<ReviewActivity>,
}

impl PollingCoordinator {
    /// Creates a coordinator with the default cadence and listing bound.
    #[must_use]
    pub fn new(reviews: Arc<dyn ReviewListingApi>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self::with_cadence(reviews, telemetry, DEFAULT_POLL_INTERVAL, DEFAULT_REVIEW_LIMIT)
    }

    /// Creates a coordinator with an explicit cadence and listing bound.
    #[must_use]
    pub fn with_cadence(
        reviews: Arc<dyn ReviewListingApi>,
        telemetry: Arc<dyn TelemetrySink>,
        interval: Duration,
        limit: u32,
    ) -> Self {
        let (activity, _receiver) = watch::channel(ReviewActivity::default());
        Self {
            reviews,
            telemetry,
            interval,
            limit,
            tasks: Mutex::new(HashMap::new()),
            activity,
        }
    }

    /// Subscribes to the published review activity.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReviewActivity> {
        self.activity.subscribe()
    }

    /// Starts the named polling subscription. Idempotent: a second call
    /// while the subscription is live does nothing.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&self, key: &str) {
        let mut tasks = self.tasks.lock();
        if tasks.get(key).is_some_and(|handle| !handle.is_finished()) {
            debug!(key, "polling subscription already live");
            return;
        }

        let reviews = Arc::clone(&self.reviews);
        let publisher = self.activity.clone();
        let interval = self.interval;
        let limit = self.limit;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match reviews.list_reviews(limit).await {
                    Ok(listing) => publish(&publisher, listing, Utc::now()),
                    Err(error) => {
                        // Next tick retries; cadence is fixed and low.
                        warn!(%error, "polling tick failed");
                    }
                }
            }
        });
        tasks.insert(key.to_owned(), handle);
        drop(tasks);

        self.telemetry
            .record(TelemetryEvent::PollingStarted { key: key.to_owned() });
    }

    /// Stops the named subscription, cancelling its timer. A no-op when the
    /// key is absent.
    pub fn stop(&self, key: &str) {
        let removed = self.tasks.lock().remove(key);
        let Some(handle) = removed else {
            return;
        };
        handle.abort();
        self.telemetry
            .record(TelemetryEvent::PollingStopped { key: key.to_owned() });
    }

    /// Stops every subscription. Called once at teardown; leaves no live
    /// timers behind.
    pub fn stop_all(&self) {
        let drained: Vec<(String, JoinHandle<()>)> =
            self.tasks.lock().drain().collect();
        for (key, handle) in drained {
            handle.abort();
            self.telemetry
                .record(TelemetryEvent::PollingStopped { key });
        }
    }

    /// Whether the named subscription is currently live.
    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.tasks
            .lock()
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Lists reviews once, outside the timer, and republishes the derived
    /// activity.
    ///
    /// # Errors
    ///
    /// Propagates the listing call's error unchanged.
    pub async fn refresh_now(&self) -> Result<ReviewListing, ApiError> {
        let listing = self.reviews.list_reviews(self.limit).await?;
        publish(&self.activity, listing.clone(), Utc::now());
        Ok(listing)
    }
}

impl Drop for PollingCoordinator {
    fn drop(&mut self) {
        for (_key, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

fn publish(publisher: &watch::Sender<ReviewActivity>, listing: ReviewListing, now: DateTime<Utc>) {
    let pending: Vec<Review> = listing
        .reviews
        .into_iter()
        .filter(|review| review.status == ReviewStatus::Pending)
        .collect();
    let activity = ReviewActivity {
        actively_processing: actively_processing(&pending, now),
        pending,
    };
    publisher.send_replace(activity);
}
