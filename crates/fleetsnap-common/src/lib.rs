// Shared data model and capability traits used by every fleetsnap crate.

use std::fmt::{self, Display};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Guest not found: {0}")]
    GuestNotFound(String),

    #[error("Snapshot operation failed: {0}")]
    Snapshot(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

// Define the primary Result type for endpoint operations
pub type Result<T> = std::result::Result<T, EndpointError>;

/// Operator credentials for one management endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Manual Debug so the password never reaches a log line.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::PoweredOn => "powered on",
            PowerState::PoweredOff => "powered off",
            PowerState::Suspended => "suspended",
        };
        write!(f, "{s}")
    }
}

/// A resolved reference to a live guest. Opaque beyond its display name;
/// the id is whatever the endpoint uses to address the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRef {
    pub id: String,
    pub name: String,
    pub power_state: PowerState,
}

/// One point-in-time snapshot as reported by the endpoint. Read-only
/// projection; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub guest_id: String,
    pub guest_name: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Display for SnapshotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  (taken {})",
            self.guest_name,
            self.name,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Entry point to a management endpoint. `connect` yields the session all
/// other operations run through; at most one session is live per run.
#[async_trait]
pub trait EndpointConnector: Send + Sync {
    /// Cheap availability check, performed before anything else. Failure
    /// means the endpoint capability is absent and the run must not proceed.
    async fn probe(&self) -> Result<()>;

    async fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn EndpointSession>>;
}

/// An authenticated session with one management endpoint.
#[async_trait]
pub trait EndpointSession: Send + Sync {
    /// Host identity as reported by the endpoint itself, which the caller
    /// checks against the host it asked for.
    fn host(&self) -> &str;

    async fn resolve_guest(&self, name: &str) -> Result<GuestRef>;

    /// Snapshots for one guest, ordered oldest to newest as reported by the
    /// endpoint. May be empty.
    async fn list_snapshots(&self, guest: &GuestRef) -> Result<Vec<SnapshotRecord>>;

    async fn create_snapshot(
        &self,
        guest: &GuestRef,
        name: &str,
        description: Option<&str>,
    ) -> Result<SnapshotRecord>;

    async fn delete_snapshot(&self, record: &SnapshotRecord) -> Result<()>;

    /// Idempotent teardown. Never fails; transport errors are swallowed.
    async fn disconnect(&self);
}
