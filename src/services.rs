//! External collaborators: tracking lookup, ticket issuance, clock
//!
//! The state machine only sees the traits. The simulated implementations
//! stand in for a carrier API and a ticketing backend.

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const LOCATIONS: &[&str] = &[
    "Chicago, IL distribution center",
    "Dallas, TX logistics hub",
    "Jersey City, NJ sorting facility",
    "Portland, OR depot",
    "Atlanta, GA air dock",
    "Los Angeles, CA gateway facility",
];

const STATUS_PHRASES: &[&str] = &[
    "Package processed and in transit",
    "Parcel arrived at regional facility",
    "Shipment departed local hub",
    "Package scanned - out for next leg",
    "Parcel processed - awaiting departure",
];

// ============================================================================
// Clock
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

// ============================================================================
// Tracking Lookup
// ============================================================================

/// What the conversation knows about the package being looked up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingQuery {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingSummary {
    pub status: String,
    /// Timestamp and location of the most recent scan
    pub last_scan: String,
    pub eta: String,
}

pub trait TrackingLookup: Send + Sync {
    fn lookup(&self, query: &TrackingQuery) -> TrackingSummary;
}

/// Random but plausible tracking updates
pub struct SimulatedTracking {
    clock: Arc<dyn Clock>,
}

impl SimulatedTracking {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl TrackingLookup for SimulatedTracking {
    fn lookup(&self, query: &TrackingQuery) -> TrackingSummary {
        let mut rng = rand::thread_rng();
        let now = self.clock.now();
        let location = LOCATIONS.choose(&mut rng).unwrap_or(&"regional facility");
        let status = STATUS_PHRASES.choose(&mut rng).unwrap_or(&"In transit");
        let hours_ago = rng.gen_range(2..=33);
        let eta_days = rng.gen_range(1..=4);

        tracing::debug!(
            tracking_number = ?query.tracking_number,
            carrier = ?query.carrier,
            "Simulating tracking lookup"
        );

        TrackingSummary {
            status: (*status).to_string(),
            last_scan: format!(
                "{} · {location}",
                format_timestamp(now - TimeDelta::hours(hours_ago))
            ),
            eta: format_timestamp(now + TimeDelta::days(eta_days)),
        }
    }
}

/// `Oct 3, 4:12 PM`
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%b %-d, %-I:%M %p").to_string()
}

// ============================================================================
// Ticket Issuance
// ============================================================================

/// Support ticket identifier, `PREFIX-######`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(prefix: &str, number: u32) -> Self {
        Self(format!("{prefix}-{number:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait TicketIssuer: Send + Sync {
    fn issue(&self, prefix: &str) -> TicketId;
}

/// Six random digits; uniqueness is not guaranteed
pub struct RandomTickets;

impl TicketIssuer for RandomTickets {
    fn issue(&self, prefix: &str) -> TicketId {
        TicketId::new(prefix, rand::thread_rng().gen_range(100_000..1_000_000))
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// Collaborators available to step handlers
#[derive(Clone)]
pub struct Services {
    pub tracking: Arc<dyn TrackingLookup>,
    pub tickets: Arc<dyn TicketIssuer>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Simulated lookup and tickets on the system clock
    pub fn simulated() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            tracking: Arc::new(SimulatedTracking::new(clock.clone())),
            tickets: Arc::new(RandomTickets),
            clock,
        }
    }
}
