//! mDNS service discovery.
//!
//! Servers register `_konflikt._tcp` with their instance id in a TXT
//! record; clients started without an explicit server browse for it and
//! auto-connect to the first viable candidate.  The mDNS daemon runs its
//! own threads; browse results are drained by a forwarding thread and
//! posted to the supervisor channel.

use std::collections::HashMap;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::identity;

/// The advertised service type.
pub const SERVICE_TYPE: &str = "_konflikt._tcp.local.";

/// TXT key carrying the instance id.
const TXT_ID_KEY: &str = "id";

/// Error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("mDNS daemon unavailable: {0}")]
    Daemon(String),

    /// Registration failed.  Name collisions surface here; the service is
    /// never silently renamed.
    #[error("mDNS registration failed: {0}")]
    Register(String),

    #[error("mDNS browse failed: {0}")]
    Browse(String),
}

/// A resolved Konflikt server on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub instance_id: String,
}

/// Events forwarded to the supervisor.
#[derive(Debug)]
pub enum DiscoveryEvent {
    ServerFound(DiscoveredServer),
    /// A previously seen service disappeared, by full service name.  An
    /// established session is not torn down over this.
    ServerLost(String),
}

/// Wrapper around the mDNS daemon covering both roles.
pub struct ServiceDiscovery {
    daemon: ServiceDaemon,
    registered_fullname: Option<String>,
}

impl ServiceDiscovery {
    pub fn new() -> Result<Self, DiscoveryError> {
        let daemon = ServiceDaemon::new().map_err(|e| DiscoveryError::Daemon(e.to_string()))?;
        Ok(Self { daemon, registered_fullname: None })
    }

    /// Registers this server instance (server role, at startup).
    pub fn register(
        &mut self,
        instance_name: &str,
        instance_id: &str,
        port: u16,
    ) -> Result<(), DiscoveryError> {
        let host = format!("{}.local.", identity::hostname());
        let mut properties = HashMap::new();
        properties.insert(TXT_ID_KEY.to_string(), instance_id.to_string());

        let info = ServiceInfo::new(SERVICE_TYPE, instance_name, &host, "", port, properties)
            .map_err(|e| DiscoveryError::Register(e.to_string()))?
            .enable_addr_auto();

        let fullname = info.get_fullname().to_string();
        self.daemon
            .register(info)
            .map_err(|e| DiscoveryError::Register(e.to_string()))?;

        info!("registered mDNS service {fullname} on port {port}");
        self.registered_fullname = Some(fullname);
        Ok(())
    }

    /// Unregisters the advertised service (server shutdown).
    pub fn unregister(&mut self) {
        if let Some(fullname) = self.registered_fullname.take() {
            match self.daemon.unregister(&fullname) {
                Ok(_) => debug!("unregistered mDNS service {fullname}"),
                Err(e) => warn!("failed to unregister {fullname}: {e}"),
            }
        }
    }

    /// Starts browsing and forwards results to `events` from a dedicated
    /// thread.  The caller filters out its own instance id.
    pub fn browse(&self, events: mpsc::Sender<DiscoveryEvent>) -> Result<(), DiscoveryError> {
        let receiver = self
            .daemon
            .browse(SERVICE_TYPE)
            .map_err(|e| DiscoveryError::Browse(e.to_string()))?;

        std::thread::Builder::new()
            .name("konflikt-mdns".to_string())
            .spawn(move || {
                while let Ok(event) = receiver.recv() {
                    let forwarded = match event {
                        ServiceEvent::ServiceResolved(info) => match server_from_info(&info) {
                            Some(server) => {
                                debug!(
                                    "resolved server {} at {}:{}",
                                    server.instance_id, server.host, server.port
                                );
                                DiscoveryEvent::ServerFound(server)
                            }
                            None => {
                                warn!("ignoring service without id TXT: {}", info.get_fullname());
                                continue;
                            }
                        },
                        ServiceEvent::ServiceRemoved(_, fullname) => {
                            DiscoveryEvent::ServerLost(fullname)
                        }
                        _ => continue,
                    };
                    if events.blocking_send(forwarded).is_err() {
                        break; // supervisor gone
                    }
                }
            })
            .map_err(|e| DiscoveryError::Browse(e.to_string()))?;

        Ok(())
    }

    /// Stops the daemon.  Outstanding registrations are dropped with it.
    pub fn shutdown(mut self) {
        self.unregister();
        if let Err(e) = self.daemon.shutdown() {
            warn!("mDNS daemon shutdown failed: {e}");
        }
    }
}

/// Extracts a [`DiscoveredServer`] from a resolved service.  Services
/// without the `id` TXT record are not Konflikt servers.
fn server_from_info(info: &ServiceInfo) -> Option<DiscoveredServer> {
    let instance_id = info.get_property_val_str(TXT_ID_KEY)?.to_string();
    let host = info
        .get_addresses()
        .iter()
        .next()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| info.get_hostname().trim_end_matches('.').to_string());

    Some(DiscoveredServer {
        name: info.get_fullname().to_string(),
        host,
        port: info.get_port(),
        instance_id,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
