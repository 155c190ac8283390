//! # Fieldsync Server
//!
//! Control surface for the fieldsync engine: typed request/response
//! handlers for trigger/status/start/stop, a webhook receiver with
//! HMAC-SHA256 signature verification, and read-through record access.
//!
//! This crate is deliberately framework-less. A host binds the
//! [`ControlHandler`] methods to whatever HTTP router it uses; every
//! handler speaks plain serde types. The control surface never touches
//! record or cursor state directly, only the engine's operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod handler;
mod messages;

pub use auth::WebhookVerifier;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::ControlHandler;
pub use messages::{
    AckResponse, HealthResponse, RecordsRequest, RecordsResponse, StartRequest, TriggerRequest,
    TriggerResponse, WebhookEvent, WebhookResponse,
};
