use crate::base::neterror::NetError;
use crate::http::requestbody::BoxedBody;
use crate::socket::connectjob::ConnectJob;
use crate::socket::route::ProcessRoute;
use crate::socket::tls::TlsConfig;
use http::{Request, Response};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use url::Url;

/// An HTTP/1.1 connection ready for one request.
pub struct HttpStream {
    sender: http1::SendRequest<BoxedBody>,
}

impl HttpStream {
    pub async fn send_request(
        &mut self,
        req: Request<BoxedBody>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.send_request(req).await.map_err(NetError::from)
    }
}

/// Opens one fresh connection per request; nothing is pooled.
#[derive(Debug, Clone)]
pub struct HttpStreamFactory {
    route: ProcessRoute,
    tls: TlsConfig,
}

impl HttpStreamFactory {
    pub fn new(route: ProcessRoute, tls: TlsConfig) -> Self {
        Self { route, tls }
    }

    pub fn route(&self) -> &ProcessRoute {
        &self.route
    }

    pub async fn create_stream(
        &self,
        url: &Url,
        connect_timeout: Option<Duration>,
    ) -> Result<HttpStream, NetError> {
        let socket = ConnectJob::new(&self.route, &self.tls)
            .connect_timeout(connect_timeout)
            .connect(url)
            .await?;

        tracing::debug!(
            peer = ?socket.peer_addr().ok(),
            local = ?socket.local_addr().ok(),
            "socket connected"
        );
        let (sender, conn) = http1::handshake::<_, BoxedBody>(TokioIo::new(socket)).await?;

        // The driver ends when the response body is consumed or dropped.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream { sender })
    }
}
