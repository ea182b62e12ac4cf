//! Phabricator Conduit API client.
//!
//! Implements the [`phab_core::Conduit`] trait over HTTP: each call is one
//! POST to `{instance}/api/{method}` with form-encoded parameters, no
//! retries, no caching. Application-level Conduit errors (`error_code` /
//! `error_info` in the response envelope) map to [`phab_core::Error::Conduit`].

mod client;
mod manager;
mod types;

pub use client::ConduitClient;
pub use manager::{ClientManager, ConduitSource};
