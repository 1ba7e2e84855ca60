//! Endpoint client implementations for the fleetsnap console.
//!
//! `http` speaks the management endpoint's `/api/v1` REST dialect; `mock`
//! is an in-memory endpoint used by tests and offline development. Both
//! implement the capability traits from `fleetsnap-common`, so the console
//! never knows which one it is driving.

pub mod http;
pub mod mock;

pub use http::HttpEndpointConnector;
pub use mock::{MockCall, MockEndpoint};
