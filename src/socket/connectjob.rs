use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::network::platform::Network;
use crate::socket::client::SocketType;
use crate::socket::route::ProcessRoute;
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use url::{Host, Url};

/// DNS -> TCP -> TLS for a single connection.
///
/// When the process route is bound, the socket is pinned to that network
/// before it connects.
pub struct ConnectJob<'a> {
    route: &'a ProcessRoute,
    tls: &'a TlsConfig,
    connect_timeout: Option<Duration>,
}

impl<'a> ConnectJob<'a> {
    pub fn new(route: &'a ProcessRoute, tls: &'a TlsConfig) -> Self {
        Self {
            route,
            tls,
            connect_timeout: None,
        }
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub async fn connect(&self, url: &Url) -> Result<SocketType, NetError> {
        let host = url.host().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let host_name = host_label(&host);

        let addrs = resolve(&host, port).await?;
        let network = self.route.current();

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match self.connect_addr(addr, network.as_ref(), &host_name).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(last_err.unwrap_or(NetError::NameNotResolved { host: host_name }));
            }
        };

        if url.scheme() == "https" {
            let tls_stream = self.handshake(&host_name, stream).await?;
            Ok(SocketType::Ssl(tls_stream))
        } else {
            Ok(SocketType::Tcp(stream))
        }
    }

    async fn connect_addr(
        &self,
        addr: SocketAddr,
        network: Option<&Network>,
        host: &str,
    ) -> Result<TcpStream, NetError> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .connection_context(host, addr.port())?;

        if let Some(network) = network {
            pin_to_network(&socket, network, addr).connection_context(host, addr.port())?;
        }

        let connect = socket.connect(addr);
        let stream = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| NetError::ConnectionTimedOut)?,
            None => connect.await,
        }
        .connection_context(host, addr.port())?;

        stream.set_nodelay(true).ok();
        Ok(stream)
    }

    async fn handshake(
        &self,
        host: &str,
        stream: TcpStream,
    ) -> Result<tokio_boring::SslStream<TcpStream>, NetError> {
        let ssl_err = |message: String| NetError::SslProtocolError { message };

        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|e| ssl_err(e.to_string()))?;
        self.tls.apply_to_builder(&mut builder)?;
        let connector = builder.build();

        let mut config = connector.configure().map_err(|e| ssl_err(e.to_string()))?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));

        let handshake = tokio_boring::connect(config, host, stream);
        match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| NetError::ConnectionTimedOut)?,
            None => handshake.await,
        }
        .map_err(|e| ssl_err(e.to_string()))
    }
}

/// Host as used for SNI and error messages (IPv6 without brackets).
fn host_label(host: &Host<&str>) -> String {
    match host {
        Host::Domain(d) => d.to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    }
}

async fn resolve(host: &Host<&str>, port: u16) -> Result<Vec<SocketAddr>, NetError> {
    match host {
        Host::Ipv4(ip) => Ok(vec![SocketAddr::new((*ip).into(), port)]),
        Host::Ipv6(ip) => Ok(vec![SocketAddr::new((*ip).into(), port)]),
        Host::Domain(domain) => {
            let not_resolved = || NetError::NameNotResolved {
                host: domain.to_string(),
            };
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((*domain, port))
                .await
                .map_err(|_| not_resolved())?
                .collect();
            if addrs.is_empty() {
                return Err(not_resolved());
            }
            Ok(addrs)
        }
    }
}

/// Pin `socket` to `network`: by interface where the OS supports it, else by
/// binding its local address.
fn pin_to_network(socket: &TcpSocket, network: &Network, peer: SocketAddr) -> std::io::Result<()> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        if let Some(interface) = &network.interface {
            return socket.bind_device(Some(interface.as_bytes()));
        }
    }

    if let Some(local) = network.local_address {
        if local.is_ipv4() == peer.is_ipv4() {
            return socket.bind(SocketAddr::new(local, 0));
        }
    }
    tracing::debug!(network = network.id, "no usable binding for socket family");
    Ok(())
}
