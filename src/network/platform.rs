//! Platform network capability.
//!
//! [`NetworkPlatform`] hides how a host finds a network with a given
//! transport and pins the process to it. [`SystemNetworkPlatform`] is the
//! default: it discovers interfaces from sysfs and binds through the crate's
//! own [`ProcessRoute`].

use crate::base::neterror::NetError;
use crate::socket::route::ProcessRoute;
use std::future::Future;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

/// Link type a request can be routed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transport {
    #[default]
    Wifi,
    Cellular,
    Ethernet,
}

/// A network the process can be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: u64,
    pub transport: Transport,
    /// Interface name, used with `SO_BINDTODEVICE` where available.
    pub interface: Option<String>,
    /// Local address to bind sockets to when there is no interface binding.
    pub local_address: Option<IpAddr>,
}

impl Network {
    pub fn new(id: u64, transport: Transport) -> Self {
        Self {
            id,
            transport,
            interface: None,
            local_address: None,
        }
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    pub fn with_local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }
}

/// Future resolving once a matching network is available.
pub type NetworkRequest<'a> = Pin<Box<dyn Future<Output = Network> + Send + 'a>>;

pub trait NetworkPlatform: Send + Sync {
    /// Whether this platform can pin the process to a network at all.
    fn can_bind_process_network(&self) -> bool;

    /// Wait for a network with `transport`. Never resolves if none shows up.
    fn request_network(&self, transport: Transport) -> NetworkRequest<'_>;

    fn bind_to(&self, network: &Network) -> Result<(), NetError>;

    fn unbind(&self);
}

/// Interval between interface scans while waiting for a network.
const SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Interface discovery via `/sys/class/net`, binding through a [`ProcessRoute`].
#[derive(Debug, Clone)]
pub struct SystemNetworkPlatform {
    route: ProcessRoute,
    sysfs_root: PathBuf,
}

impl SystemNetworkPlatform {
    pub fn new(route: ProcessRoute) -> Self {
        Self {
            route,
            sysfs_root: PathBuf::from("/sys/class/net"),
        }
    }

    /// Scan a different sysfs tree.
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// One pass over the interfaces, returning the first that is up and
    /// matches `transport`.
    pub async fn find_network(&self, transport: Transport) -> Option<Network> {
        let mut entries = tokio::fs::read_dir(&self.sysfs_root).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let dir = entry.path();
            if name == "lo" || !is_up(&dir).await {
                continue;
            }
            if classify(&name, &dir).await != Some(transport) {
                continue;
            }
            let id = read_trimmed(&dir.join("ifindex"))
                .await
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            return Some(Network::new(id, transport).with_interface(name));
        }
        None
    }
}

impl NetworkPlatform for SystemNetworkPlatform {
    fn can_bind_process_network(&self) -> bool {
        cfg!(any(target_os = "linux", target_os = "android"))
    }

    fn request_network(&self, transport: Transport) -> NetworkRequest<'_> {
        Box::pin(async move {
            loop {
                if let Some(network) = self.find_network(transport).await {
                    return network;
                }
                tokio::time::sleep(SCAN_INTERVAL).await;
            }
        })
    }

    fn bind_to(&self, network: &Network) -> Result<(), NetError> {
        self.route.bind(network.clone());
        Ok(())
    }

    fn unbind(&self) {
        self.route.unbind();
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

async fn is_up(dir: &Path) -> bool {
    matches!(
        read_trimmed(&dir.join("operstate")).await.as_deref(),
        Some("up") | Some("unknown")
    )
}

async fn classify(name: &str, dir: &Path) -> Option<Transport> {
    if tokio::fs::metadata(dir.join("wireless")).await.is_ok()
        || tokio::fs::metadata(dir.join("phy80211")).await.is_ok()
    {
        return Some(Transport::Wifi);
    }
    if ["rmnet", "wwan", "ccmni"].iter().any(|p| name.starts_with(p)) {
        return Some(Transport::Cellular);
    }
    if tokio::fs::metadata(dir.join("device")).await.is_ok() {
        return Some(Transport::Ethernet);
    }
    None
}
