//! In-memory endpoint used by tests and offline development.
//!
//! Seed guests and snapshots up front, optionally inject per-guest
//! failures, then assert on the ordered call log afterwards. State is
//! shared between the connector and every session it hands out, so
//! mutations made through a session stay visible to later assertions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use fleetsnap_common::{
    Credentials, EndpointConnector, EndpointError, EndpointSession, GuestRef, PowerState, Result,
    SnapshotRecord,
};

/// One recorded call against a [`MockEndpoint`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Probe,
    Connect { host: String, username: String },
    ResolveGuest { name: String },
    ListSnapshots { guest: String },
    CreateSnapshot { guest: String, name: String },
    DeleteSnapshot { guest: String, name: String },
    Disconnect,
}

#[derive(Default)]
struct MockState {
    /// Seeded guests, keyed by display name.
    guests: DashMap<String, GuestRef>,
    /// Snapshots per guest id, oldest first.
    snapshots: DashMap<String, Vec<SnapshotRecord>>,
    resolve_failures: DashMap<String, String>,
    create_failures: DashMap<String, String>,
    delete_failures: DashMap<String, String>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockState {
    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Scriptable endpoint double. Builder methods configure behaviour before
/// the endpoint is handed to the code under test; accessor methods inspect
/// what happened afterwards.
#[derive(Clone)]
pub struct MockEndpoint {
    available: bool,
    accepted: Option<Credentials>,
    reported_host: Option<String>,
    state: Arc<MockState>,
}

impl MockEndpoint {
    /// An available endpoint that accepts any credentials.
    pub fn new() -> Self {
        Self {
            available: true,
            accepted: None,
            reported_host: None,
            state: Arc::new(MockState::default()),
        }
    }

    /// An endpoint whose availability probe fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Accept only this username/password pair; everything else gets an
    /// authentication error.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.accepted = Some(Credentials::new(username, password));
        self
    }

    /// Report this host identity from sessions instead of echoing whatever
    /// the caller asked to connect to.
    pub fn with_reported_host(mut self, host_id: &str) -> Self {
        self.reported_host = Some(host_id.to_string());
        self
    }

    /// Seed one guest. Snapshots are added separately via [`with_snapshot`].
    ///
    /// [`with_snapshot`]: MockEndpoint::with_snapshot
    pub fn with_guest(self, name: &str, power_state: PowerState) -> Self {
        let guest = GuestRef {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            power_state,
        };
        self.state.snapshots.insert(guest.id.clone(), Vec::new());
        self.state.guests.insert(name.to_string(), guest);
        self
    }

    /// Seed one snapshot for an already-seeded guest. Insertion order is
    /// chain order, oldest first.
    pub fn with_snapshot(self, guest_name: &str, snapshot_name: &str) -> Self {
        let guest = self
            .state
            .guests
            .get(guest_name)
            .map(|g| g.clone())
            .expect("guest must be seeded before its snapshots");
        let record = SnapshotRecord {
            id: Uuid::new_v4().to_string(),
            guest_id: guest.id.clone(),
            guest_name: guest.name.clone(),
            name: snapshot_name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.state
            .snapshots
            .entry(guest.id)
            .or_default()
            .push(record);
        self
    }

    /// Make resolution of this guest name fail with a transport error.
    pub fn failing_resolve(self, guest_name: &str, message: &str) -> Self {
        self.state
            .resolve_failures
            .insert(guest_name.to_string(), message.to_string());
        self
    }

    /// Make snapshot creation on this guest fail.
    pub fn failing_create(self, guest_name: &str, message: &str) -> Self {
        self.state
            .create_failures
            .insert(guest_name.to_string(), message.to_string());
        self
    }

    /// Make snapshot deletion on this guest fail.
    pub fn failing_delete(self, guest_name: &str, message: &str) -> Self {
        self.state
            .delete_failures
            .insert(guest_name.to_string(), message.to_string());
        self
    }

    /// Everything this endpoint has served so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Current snapshots for a seeded guest, oldest first. Empty when the
    /// guest has none or was never seeded.
    pub fn snapshots_for(&self, guest_name: &str) -> Vec<SnapshotRecord> {
        let Some(guest) = self.state.guests.get(guest_name).map(|g| g.clone()) else {
            return Vec::new();
        };
        self.state
            .snapshots
            .get(&guest.id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Default for MockEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointConnector for MockEndpoint {
    async fn probe(&self) -> Result<()> {
        self.state.record(MockCall::Probe);
        if !self.available {
            return Err(EndpointError::Unavailable(
                "endpoint did not answer the availability probe".to_string(),
            ));
        }
        Ok(())
    }

    async fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn EndpointSession>> {
        self.state.record(MockCall::Connect {
            host: host.to_string(),
            username: credentials.username.clone(),
        });
        if !self.available {
            return Err(EndpointError::Unavailable(
                "endpoint did not answer the availability probe".to_string(),
            ));
        }
        if let Some(accepted) = &self.accepted {
            if accepted != credentials {
                return Err(EndpointError::Auth(
                    "endpoint rejected the supplied credentials".to_string(),
                ));
            }
        }

        let reported = self
            .reported_host
            .clone()
            .unwrap_or_else(|| host.to_string());
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            host: reported,
            open: AtomicBool::new(true),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
    host: String,
    open: AtomicBool,
}

impl MockSession {
    fn guest_by_id(&self, id: &str) -> Option<GuestRef> {
        self.state
            .guests
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl EndpointSession for MockSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn resolve_guest(&self, name: &str) -> Result<GuestRef> {
        self.state.record(MockCall::ResolveGuest {
            name: name.to_string(),
        });
        if let Some(message) = self.state.resolve_failures.get(name) {
            return Err(EndpointError::Transport(message.clone()));
        }
        self.state
            .guests
            .get(name)
            .map(|g| g.clone())
            .ok_or_else(|| EndpointError::GuestNotFound(name.to_string()))
    }

    async fn list_snapshots(&self, guest: &GuestRef) -> Result<Vec<SnapshotRecord>> {
        self.state.record(MockCall::ListSnapshots {
            guest: guest.name.clone(),
        });
        Ok(self
            .state
            .snapshots
            .get(&guest.id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn create_snapshot(
        &self,
        guest: &GuestRef,
        name: &str,
        description: Option<&str>,
    ) -> Result<SnapshotRecord> {
        self.state.record(MockCall::CreateSnapshot {
            guest: guest.name.clone(),
            name: name.to_string(),
        });
        if let Some(message) = self.state.create_failures.get(&guest.name) {
            return Err(EndpointError::Snapshot(message.clone()));
        }

        let record = SnapshotRecord {
            id: Uuid::new_v4().to_string(),
            guest_id: guest.id.clone(),
            guest_name: guest.name.clone(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state
            .snapshots
            .entry(guest.id.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn delete_snapshot(&self, record: &SnapshotRecord) -> Result<()> {
        self.state.record(MockCall::DeleteSnapshot {
            guest: record.guest_name.clone(),
            name: record.name.clone(),
        });
        if let Some(message) = self.state.delete_failures.get(&record.guest_name) {
            return Err(EndpointError::Snapshot(message.clone()));
        }
        if self.guest_by_id(&record.guest_id).is_none() {
            return Err(EndpointError::GuestNotFound(record.guest_name.clone()));
        }

        let mut removed = false;
        if let Some(mut snapshots) = self.state.snapshots.get_mut(&record.guest_id) {
            let before = snapshots.len();
            snapshots.retain(|s| s.id != record.id);
            removed = snapshots.len() < before;
        }
        if !removed {
            return Err(EndpointError::Snapshot(format!(
                "no snapshot {} on {}",
                record.name, record.guest_name
            )));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        self.state.record(MockCall::Disconnect);
    }
}
