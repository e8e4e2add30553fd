//! Client registry: owns at most one live client, for the active provider.
//!
//! Switching providers always drops the previous client first, so a failed
//! switch leaves nothing configured rather than a stale client for a
//! different vendor.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use snapsolve_core::config::Config;
use snapsolve_core::types::{Credentials, ProviderId};
use snapsolve_core::SolveError;

use crate::http_provider::HttpVisionProvider;
use crate::registry::spec_for;
use crate::traits::VisionProvider;

/// Builds clients from credentials. Swapped out in tests.
pub trait ClientFactory: Send + Sync {
    fn create(&self, credentials: &Credentials, timeout: Duration) -> Result<Arc<dyn VisionProvider>, SolveError>;
}

/// Factory producing [`HttpVisionProvider`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn create(&self, credentials: &Credentials, timeout: Duration) -> Result<Arc<dyn VisionProvider>, SolveError> {
        Ok(Arc::new(HttpVisionProvider::new(credentials, timeout)?))
    }
}

pub struct ClientRegistry {
    factory: Arc<dyn ClientFactory>,
    timeout: Duration,
    active: Option<Arc<dyn VisionProvider>>,
    /// Why the last `set_active_provider` left nothing configured.
    failure: Option<(ProviderId, String)>,
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("active", &self.active_provider())
            .field("timeout", &self.timeout)
            .field("failure", &self.failure)
            .finish()
    }
}

impl ClientRegistry {
    pub fn new(factory: Arc<dyn ClientFactory>, timeout: Duration) -> Self {
        Self {
            factory,
            timeout,
            active: None,
            failure: None,
        }
    }

    /// Registry backed by real HTTP clients.
    pub fn http(timeout: Duration) -> Self {
        Self::new(Arc::new(HttpClientFactory), timeout)
    }

    /// Replace the live client with one built from `credentials`.
    ///
    /// The previous client is dropped before validation, so on error the
    /// registry is empty.
    pub fn set_active_provider(&mut self, credentials: &Credentials) -> Result<(), SolveError> {
        self.clear();
        let spec = spec_for(credentials.provider);

        if let Err(reason) = spec.validate_api_key(&credentials.api_key) {
            warn!(provider = spec.display_name, reason = %reason, "API key rejected");
            self.failure = Some((credentials.provider, reason.clone()));
            return Err(SolveError::NotConfigured {
                provider: spec.display_name.to_string(),
                reason,
            });
        }

        match self.factory.create(credentials, self.timeout) {
            Ok(client) => {
                info!(provider = spec.display_name, model = client.model(), "Provider client ready");
                self.active = Some(client);
                Ok(())
            }
            Err(e) => {
                self.failure = Some((credentials.provider, e.to_string()));
                Err(e)
            }
        }
    }

    /// Rebuild from a full config (timeout + active provider credentials).
    pub fn apply_config(&mut self, config: &Config) -> Result<(), SolveError> {
        self.timeout = Duration::from_secs(config.pipeline.timeout_secs.max(1));
        self.set_active_provider(&config.credentials())
    }

    /// The live client for `id`, or `NotConfigured` explaining why not.
    pub fn get_client(&self, id: ProviderId) -> Result<Arc<dyn VisionProvider>, SolveError> {
        let name = spec_for(id).display_name.to_string();
        match &self.active {
            Some(client) if client.provider() == id => Ok(Arc::clone(client)),
            Some(client) => Err(SolveError::NotConfigured {
                provider: name,
                reason: format!("active provider is {}", client.display_name()),
            }),
            None => {
                let reason = match &self.failure {
                    Some((failed, reason)) if *failed == id => reason.clone(),
                    _ => "no client initialized".to_string(),
                };
                Err(SolveError::NotConfigured { provider: name, reason })
            }
        }
    }

    /// The live client, whatever provider it belongs to.
    pub fn active(&self) -> Option<Arc<dyn VisionProvider>> {
        self.active.clone()
    }

    pub fn active_provider(&self) -> Option<ProviderId> {
        self.active.as_ref().map(|c| c.provider())
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.failure = None;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
