//! Integration tests for the REST endpoint client.
//!
//! Covers the full session lifecycle against a mocked endpoint: probe,
//! connect, guest lookup, snapshot list/create/delete, disconnect.

use fleetsnap_client::HttpEndpointConnector;
use fleetsnap_common::{
    Credentials, EndpointConnector, EndpointError, EndpointSession, GuestRef, PowerState,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn connector(server: &ServerGuard) -> HttpEndpointConnector {
    HttpEndpointConnector::new(server.url())
}

fn guest() -> GuestRef {
    GuestRef {
        id: "g-7".to_string(),
        name: "vm1".to_string(),
        power_state: PowerState::PoweredOn,
    }
}

/// Registers a session-open mock and returns a connected session.
async fn connected(server: &mut ServerGuard) -> Box<dyn EndpointSession> {
    let _session_mock = server
        .mock("POST", "/api/v1/session")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "token": "tok-1",
                "host_id": "esx-lab-01"
            })
            .to_string(),
        )
        .create_async()
        .await;

    connector(server)
        .connect("esx-lab-01", &Credentials::new("root", "secret"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_probe_succeeds_when_endpoint_healthy() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/health")
        .with_status(200)
        .create_async()
        .await;

    connector(&server).probe().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_reports_unavailable_on_error_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/health")
        .with_status(503)
        .create_async()
        .await;

    let err = connector(&server).probe().await.unwrap_err();
    assert!(matches!(err, EndpointError::Unavailable(_)));
}

#[tokio::test]
async fn test_connect_returns_session_with_reported_host() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/session")
        .match_body(Matcher::Json(json!({
            "username": "root",
            "password": "secret"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "token": "tok-1",
                "host_id": "esx-lab-01"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let session = connector(&server)
        .connect("esx-lab-01", &Credentials::new("root", "secret"))
        .await
        .unwrap();

    assert_eq!(session.host(), "esx-lab-01");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connect_maps_unauthorized_to_auth_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/session")
        .with_status(401)
        .with_body("bad password")
        .create_async()
        .await;

    let err = match connector(&server)
        .connect("esx-lab-01", &Credentials::new("root", "wrong"))
        .await
    {
        Ok(_) => panic!("unauthorized response must fail the connect"),
        Err(e) => e,
    };

    assert!(matches!(err, EndpointError::Auth(msg) if msg == "bad password"));
}

#[tokio::test]
async fn test_resolve_guest_sends_token_and_parses_reply() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let mock = server
        .mock("GET", "/api/v1/guests")
        .match_query(Matcher::UrlEncoded("name".into(), "vm1".into()))
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "g-7",
                "name": "vm1",
                "power_state": "POWERED_ON"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let guest = session.resolve_guest("vm1").await.unwrap();
    assert_eq!(guest.id, "g-7");
    assert_eq!(guest.power_state, PowerState::PoweredOn);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_resolve_guest_missing_maps_to_guest_not_found() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let _mock = server
        .mock("GET", "/api/v1/guests")
        .match_query(Matcher::UrlEncoded("name".into(), "ghost".into()))
        .with_status(404)
        .create_async()
        .await;

    let err = session.resolve_guest("ghost").await.unwrap_err();
    assert!(matches!(err, EndpointError::GuestNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn test_list_snapshots_preserves_endpoint_order() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let _mock = server
        .mock("GET", "/api/v1/guests/g-7/snapshots")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": "s-1",
                    "name": "base",
                    "description": null,
                    "created_at": "2024-03-01T10:00:00Z"
                },
                {
                    "id": "s-2",
                    "name": "pre-patch",
                    "description": "before kernel update",
                    "created_at": "2024-03-02T10:00:00Z"
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let snapshots = session.list_snapshots(&guest()).await.unwrap();
    let names: Vec<&str> = snapshots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["base", "pre-patch"]);
    assert_eq!(snapshots[0].guest_name, "vm1");
    assert_eq!(
        snapshots[1].description.as_deref(),
        Some("before kernel update")
    );
}

#[tokio::test]
async fn test_create_snapshot_posts_body_and_parses_created() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let mock = server
        .mock("POST", "/api/v1/guests/g-7/snapshots")
        .match_header("authorization", "Bearer tok-1")
        .match_body(Matcher::Json(json!({
            "name": "pre-patch",
            "description": null
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "s-9",
                "name": "pre-patch",
                "description": null,
                "created_at": "2024-03-02T10:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let record = session
        .create_snapshot(&guest(), "pre-patch", None)
        .await
        .unwrap();

    assert_eq!(record.id, "s-9");
    assert_eq!(record.guest_id, "g-7");
    assert_eq!(record.guest_name, "vm1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_snapshot_failure_carries_endpoint_message() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let _mock = server
        .mock("POST", "/api/v1/guests/g-7/snapshots")
        .with_status(500)
        .with_body("datastore full")
        .create_async()
        .await;

    let err = session
        .create_snapshot(&guest(), "pre-patch", None)
        .await
        .unwrap_err();

    match err {
        EndpointError::Snapshot(msg) => assert!(msg.contains("datastore full")),
        other => panic!("expected snapshot error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_snapshot_issues_delete() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let mock = server
        .mock("DELETE", "/api/v1/guests/g-7/snapshots/s-2")
        .match_header("authorization", "Bearer tok-1")
        .with_status(204)
        .create_async()
        .await;

    let record = fleetsnap_common::SnapshotRecord {
        id: "s-2".to_string(),
        guest_id: "g-7".to_string(),
        guest_name: "vm1".to_string(),
        name: "pre-patch".to_string(),
        description: None,
        created_at: "2024-03-02T10:00:00Z".parse().unwrap(),
    };
    session.delete_snapshot(&record).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_disconnect_revokes_token_once() {
    let mut server = Server::new_async().await;
    let session = connected(&mut server).await;

    let mock = server
        .mock("DELETE", "/api/v1/session")
        .match_header("authorization", "Bearer tok-1")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    session.disconnect().await;
    session.disconnect().await;
    mock.assert_async().await;
}
