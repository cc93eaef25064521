//! HTTP access to the tseep assessment service.
//!
//! Wraps `reqwest` with bearer injection and a single refresh-and-retry on
//! 401, and implements `AssessmentApi` on top of it.

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::TseepClient;
pub use config::{load_config, load_config_from, ClientConfig};
pub use error::HttpError;
pub use http::{ApiRequest, AuthenticatedClient};
