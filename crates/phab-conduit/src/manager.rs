//! Client acquisition with hybrid authentication.
//!
//! Per-call tokens take precedence (for user attribution) and always build
//! a fresh client; the shared default client resolves credentials from the
//! environment/config once and is cached for the lifetime of the server.

use std::sync::{Arc, Mutex};

use tracing::debug;

use phab_core::{Conduit, Credentials, Result};

use crate::client::ConduitClient;

/// Hands out [`Conduit`] clients; the tool layer and tests program against
/// this instead of constructing clients directly.
pub trait ConduitSource: Send + Sync {
    fn client(&self, api_token: Option<&str>) -> Result<Arc<dyn Conduit>>;
}

/// Default [`ConduitSource`] backed by [`ConduitClient`].
#[derive(Default)]
pub struct ClientManager {
    default_client: Mutex<Option<Arc<ConduitClient>>>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConduitSource for ClientManager {
    fn client(&self, api_token: Option<&str>) -> Result<Arc<dyn Conduit>> {
        // A personal token always builds a fresh client
        if let Some(token) = api_token.map(str::trim).filter(|t| !t.is_empty()) {
            debug!("Creating client with per-call token");
            let credentials = Credentials::resolve(Some(token))?;
            return Ok(Arc::new(ConduitClient::new(credentials)));
        }

        let mut default_client = self
            .default_client
            .lock()
            .expect("client manager mutex poisoned");

        if let Some(client) = default_client.as_ref() {
            return Ok(client.clone());
        }

        debug!("Creating default client from environment/config");
        let credentials = Credentials::resolve(None)?;
        let client = Arc::new(ConduitClient::new(credentials));
        *default_client = Some(client.clone());
        Ok(client as Arc<dyn Conduit>)
    }
}
