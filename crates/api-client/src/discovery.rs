//! Backend endpoint discovery
//!
//! The studio may be opened through a LAN address while the backend is
//! configured as `localhost`. At construction the client probes, in order:
//!
//! 1. `http://<page host>:<port>/health` when the page host is not loopback
//! 2. `<default>/server-info`, adopting the advertised `api_url` if its own
//!    `/health` answers
//!
//! Every probe has its own timeout. Failures keep the static default and
//! are only reported through `tracing`.

use cv_types::ServerInfo;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::RwLock;
use reqwest::Client;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// Resolved backend address shared by all clones of a client
#[derive(Clone)]
pub(crate) struct EndpointResolver {
    base_url: String,
    page_host: Option<String>,
    dynamic: Arc<RwLock<Option<String>>>,
    ready: Shared<BoxFuture<'static, ()>>,
}

impl EndpointResolver {
    /// Start discovery in the background
    ///
    /// Without a tokio runtime, or with discovery disabled, the static
    /// default is used and `ready` completes immediately.
    pub(crate) fn spawn(http: &Client, config: &ClientConfig) -> Self {
        let base_url = config.base_url().to_string();
        let dynamic = Arc::new(RwLock::new(None));

        let ready = if !config.discovery_enabled {
            debug!("Endpoint discovery disabled, using {}", base_url);
            futures::future::ready(()).boxed().shared()
        } else {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let probe = Probe {
                        http: http.clone(),
                        base_url: base_url.clone(),
                        page_host: config.page_host.clone(),
                        port: config.discovery_port,
                        timeout: config.discovery_timeout,
                    };
                    let slot = Arc::clone(&dynamic);
                    let task = handle.spawn(async move {
                        match probe.run().await {
                            Some(url) => {
                                info!("Using discovered backend at {}", url);
                                *slot.write() = Some(url);
                            }
                            None => debug!("Discovery found nothing, using {}", probe.base_url),
                        }
                    });
                    async move {
                        if let Err(e) = task.await {
                            warn!("Endpoint discovery task failed: {}", e);
                        }
                    }
                    .boxed()
                    .shared()
                }
                Err(_) => {
                    warn!("No tokio runtime, skipping endpoint discovery");
                    futures::future::ready(()).boxed().shared()
                }
            }
        };

        Self {
            base_url,
            page_host: config.page_host.clone(),
            dynamic,
            ready,
        }
    }

    /// Wait for discovery to finish; returns at once when it already has
    pub(crate) async fn ready(&self) {
        self.ready.clone().await
    }

    /// Discovered address if any, else the static default
    pub(crate) fn current(&self) -> String {
        self.dynamic
            .read()
            .clone()
            .unwrap_or_else(|| self.base_url.clone())
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn dynamic(&self) -> Option<String> {
        self.dynamic.read().clone()
    }

    pub(crate) fn page_host(&self) -> Option<&str> {
        self.page_host.as_deref()
    }
}

struct Probe {
    http: Client,
    base_url: String,
    page_host: Option<String>,
    port: u16,
    timeout: Duration,
}

impl Probe {
    async fn run(&self) -> Option<String> {
        if let Some(host) = self.page_host.as_deref().filter(|host| !is_loopback(host)) {
            let candidate = format!("http://{}:{}", host, self.port);
            if self.health_ok(&candidate).await {
                return Some(candidate);
            }
            debug!("No backend at page host {}", candidate);
        }

        let info = match self.server_info().await {
            Ok(info) => info,
            Err(e) => {
                debug!("Dynamic IP detection failed, using default URL: {}", e);
                return None;
            }
        };

        let advertised = info.api_url?.trim_end_matches('/').to_string();
        if advertised.is_empty() || advertised == self.base_url {
            return None;
        }

        if self.health_ok(&advertised).await {
            Some(advertised)
        } else {
            debug!("Advertised backend {} did not answer /health", advertised);
            None
        }
    }

    async fn health_ok(&self, base: &str) -> bool {
        match self
            .http
            .get(format!("{}/health", base))
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health probe to {} failed: {}", base, e);
                false
            }
        }
    }

    async fn server_info(&self) -> Result<ServerInfo, reqwest::Error> {
        self.http
            .get(format!("{}/server-info", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// `localhost` or any loopback IP, bracketed IPv6 included
pub(crate) fn is_loopback(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() || host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}
