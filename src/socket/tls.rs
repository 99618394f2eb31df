use crate::base::neterror::NetError;
use boring::ssl::{SslConnectorBuilder, SslVerifyMode, SslVersion};

/// Client-side TLS settings applied to every HTTPS connection.
///
/// Only HTTP/1.1 is offered over ALPN since each call uses a single
/// HTTP/1.1 connection.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    /// Verify the peer chain against the system trust store.
    pub verify_peer: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: vec!["http/1.1".to_string()],
            verify_peer: true,
        }
    }
}

fn ssl_error(message: impl Into<String>) -> NetError {
    NetError::SslProtocolError {
        message: message.into(),
    }
}

impl TlsConfig {
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|e| ssl_error(e.to_string()))?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|e| ssl_error(e.to_string()))?;
        }

        if !self.alpn_protos.is_empty() {
            builder
                .set_alpn_protos(&encode_alpn(&self.alpn_protos)?)
                .map_err(|e| ssl_error(e.to_string()))?;
        }

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }
        Ok(())
    }

    /// SNI must not be sent for IP literals (RFC 6066).
    pub fn should_set_sni(host: &str) -> bool {
        host.trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_err()
    }
}

/// ALPN wire format: each protocol prefixed by its length.
fn encode_alpn(protos: &[String]) -> Result<Vec<u8>, NetError> {
    let mut wire = Vec::new();
    for proto in protos {
        let len = u8::try_from(proto.len()).map_err(|_| ssl_error("ALPN protocol too long"))?;
        wire.push(len);
        wire.extend_from_slice(proto.as_bytes());
    }
    Ok(wire)
}
