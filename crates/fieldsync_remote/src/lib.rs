//! # Fieldsync Remote
//!
//! HTTP implementation of the engine's `RemoteEntitySource` contract
//! against the field-service platform's REST API.
//!
//! Auth is fully encapsulated: the client owns a cached access token and
//! refreshes it through the platform's refresh-token grant when it is
//! absent, expired, or rejected. The engine only ever sees the
//! fetch/create/update contract, never tokens.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod client;
mod config;

pub use client::FsmClient;
pub use config::RemoteConfig;
