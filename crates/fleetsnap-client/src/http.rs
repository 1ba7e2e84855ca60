//! REST client for a snapshot management endpoint.
//!
//! One connector is bound to one endpoint base URL. `connect` trades
//! operator credentials for a bearer token; every session call carries that
//! token until `disconnect` revokes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fleetsnap_common::{
    Credentials, EndpointConnector, EndpointError, EndpointSession, GuestRef, PowerState, Result,
    SnapshotRecord,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one management endpoint, addressed by its base URL.
#[derive(Clone)]
pub struct HttpEndpointConnector {
    client: Client,
    base_url: String,
}

impl HttpEndpointConnector {
    /// Connector with the default request timeout and TLS verification on.
    pub fn new(base_url: String) -> Self {
        Self::with_options(base_url, DEFAULT_TIMEOUT, false)
    }

    /// Connector with an explicit timeout. `accept_invalid_certs` disables
    /// TLS verification and is meant for lab endpoints with self-signed
    /// certificates only.
    pub fn with_options(base_url: String, timeout: Duration, accept_invalid_certs: bool) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
    host_id: String,
}

#[derive(Debug, Deserialize)]
struct GuestDto {
    id: String,
    name: String,
    power_state: PowerState,
}

#[derive(Debug, Deserialize)]
struct SnapshotDto {
    id: String,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl SnapshotDto {
    fn into_record(self, guest: &GuestRef) -> SnapshotRecord {
        SnapshotRecord {
            id: self.id,
            guest_id: guest.id.clone(),
            guest_name: guest.name.clone(),
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateSnapshotRequest<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

fn transport(err: reqwest::Error) -> EndpointError {
    EndpointError::Transport(err.to_string())
}

fn protocol(err: reqwest::Error) -> EndpointError {
    EndpointError::Protocol(err.to_string())
}

#[async_trait]
impl EndpointConnector for HttpEndpointConnector {
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/api/v1/health", self.base_url);
        debug!("Probing endpoint at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EndpointError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EndpointError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn connect(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn EndpointSession>> {
        let url = format!("{}/api/v1/session", self.base_url);
        debug!("Opening session on {} as {}", host, credentials.username);

        let response = self
            .client
            .post(&url)
            .json(&SessionRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let error_text = response.text().await.unwrap_or_default();
            let reason = if error_text.is_empty() {
                "endpoint rejected the supplied credentials".to_string()
            } else {
                error_text
            };
            return Err(EndpointError::Auth(reason));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EndpointError::Protocol(format!(
                "session open returned {status}: {error_text}"
            )));
        }

        let session: SessionResponse = response.json().await.map_err(protocol)?;
        debug!("Session open, endpoint reports host {}", session.host_id);

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: session.token,
            host: session.host_id,
            open: AtomicBool::new(true),
        }))
    }
}

/// Live authenticated session. `disconnect` revokes the token server-side
/// at most once no matter how often it is called.
pub struct HttpSession {
    client: Client,
    base_url: String,
    token: String,
    host: String,
    open: AtomicBool,
}

#[async_trait]
impl EndpointSession for HttpSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn resolve_guest(&self, name: &str) -> Result<GuestRef> {
        let url = format!("{}/api/v1/guests", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EndpointError::Auth("session token rejected".to_string()));
        }
        if response.status() == StatusCode::NOT_FOUND {
            return Err(EndpointError::GuestNotFound(name.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EndpointError::Protocol(format!(
                "guest lookup for {name} returned {status}: {error_text}"
            )));
        }

        let guest: GuestDto = response.json().await.map_err(protocol)?;
        Ok(GuestRef {
            id: guest.id,
            name: guest.name,
            power_state: guest.power_state,
        })
    }

    async fn list_snapshots(&self, guest: &GuestRef) -> Result<Vec<SnapshotRecord>> {
        let url = format!("{}/api/v1/guests/{}/snapshots", self.base_url, guest.id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EndpointError::Auth("session token rejected".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EndpointError::Snapshot(format!(
                "snapshot list for {} returned {status}: {error_text}",
                guest.name
            )));
        }

        let snapshots: Vec<SnapshotDto> = response.json().await.map_err(protocol)?;
        Ok(snapshots
            .into_iter()
            .map(|s| s.into_record(guest))
            .collect())
    }

    async fn create_snapshot(
        &self,
        guest: &GuestRef,
        name: &str,
        description: Option<&str>,
    ) -> Result<SnapshotRecord> {
        let url = format!("{}/api/v1/guests/{}/snapshots", self.base_url, guest.id);
        debug!("Creating snapshot {} on {}", name, guest.name);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CreateSnapshotRequest { name, description })
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EndpointError::Auth("session token rejected".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EndpointError::Snapshot(format!(
                "snapshot create on {} returned {status}: {error_text}",
                guest.name
            )));
        }

        let snapshot: SnapshotDto = response.json().await.map_err(protocol)?;
        Ok(snapshot.into_record(guest))
    }

    async fn delete_snapshot(&self, record: &SnapshotRecord) -> Result<()> {
        let url = format!(
            "{}/api/v1/guests/{}/snapshots/{}",
            self.base_url, record.guest_id, record.id
        );
        debug!("Deleting snapshot {} on {}", record.name, record.guest_name);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(EndpointError::Auth("session token rejected".to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EndpointError::Snapshot(format!(
                "snapshot delete on {} returned {status}: {error_text}",
                record.guest_name
            )));
        }

        Ok(())
    }

    async fn disconnect(&self) {
        // First caller wins; later calls are no-ops.
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }

        let url = format!("{}/api/v1/session", self.base_url);
        match self
            .client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Endpoint session closed");
            }
            Ok(response) => {
                warn!("Endpoint session close returned {}", response.status());
            }
            Err(e) => {
                warn!("Failed to close endpoint session: {}", e);
            }
        }
    }
}
