//! Application telemetry events and sinks.
//!
//! Gatehouse is a client-side subsystem, but session lifecycle transitions
//! (token refreshes, session clears, gating fail-opens) are exactly the
//! events worth capturing when debugging authentication problems in the
//! field. Events are recorded through a sink trait so embedders choose the
//! destination.

use std::io;

use serde::{Deserialize, Serialize};

/// Why a session was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionClearReason {
    /// The user logged out.
    LoggedOut,
    /// A refresh-token exchange failed.
    RefreshFailed,
    /// No refresh token was available to recover an expired session.
    MissingRefreshToken,
}

/// A structured telemetry event emitted by the session subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A refresh-token exchange replaced the access token.
    TokenRefreshed,
    /// The session was cleared.
    SessionCleared {
        /// Why the session was cleared.
        reason: SessionClearReason,
    },
    /// The navigation gate allowed a route because the subscription lookup
    /// failed (fail-open policy).
    GateFailOpen {
        /// The route that was allowed.
        route: String,
    },
    /// A polling subscription started.
    PollingStarted {
        /// Subscription key.
        key: String,
    },
    /// A polling subscription stopped.
    PollingStopped {
        /// Subscription key.
        key: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}
