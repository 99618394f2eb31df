use crate::base::neterror::NetError;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::{self, BodyWriter, RequestBody};
use crate::http::response::HttpResponse;
use crate::http::transaction::HttpTransaction;
use crate::urlrequest::context::RequestContext;
use bytes::Bytes;
use http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// A configured, not yet completed request on a single connection.
///
/// The body is either set up front or streamed through the writer returned
/// by [`open_output`](Connection::open_output), in which case the exchange
/// starts immediately and [`response`](Connection::response) collects it.
pub struct Connection {
    ctx: Arc<RequestContext>,
    url: Url,
    method: Method,
    headers: OrderedHeaderMap,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    body: Option<RequestBody>,
    in_flight: Option<JoinHandle<Result<HttpResponse, NetError>>>,
}

impl Connection {
    /// Configure a connection. With `params`, they are merged into the URL
    /// query. Unset timeouts fall back to the context defaults.
    pub fn open(
        ctx: Arc<RequestContext>,
        url: &Url,
        method: Method,
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
        headers: &[(String, String)],
        params: Option<&[(String, String)]>,
    ) -> Result<Self, NetError> {
        let url = match params {
            Some(params) => merge_query_params(url, params),
            None => url.clone(),
        };
        let headers =
            OrderedHeaderMap::from_pairs(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

        let config = ctx.config();
        let connect_timeout = connect_timeout.or(config.default_connect_timeout);
        let read_timeout = read_timeout.or(config.default_read_timeout);

        Ok(Self {
            ctx,
            url,
            method,
            headers,
            connect_timeout,
            read_timeout,
            body: None,
            in_flight: None,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_request_property(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        self.headers.insert(name, value)
    }

    pub fn request_property(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Send `body` with a `Content-Length`.
    pub fn set_fixed_body(&mut self, body: Bytes) {
        self.body = Some(RequestBody::Bytes(body));
    }

    /// Start the exchange now and return a writer for a chunked body.
    pub fn open_output(&mut self) -> Result<BodyWriter, NetError> {
        if self.in_flight.is_some() {
            return Err(NetError::invalid_argument("output already open"));
        }
        let (writer, body) = requestbody::channel();
        let exchange = self.exchange(Some(body));
        self.in_flight = Some(tokio::spawn(exchange));
        Ok(writer)
    }

    /// Complete the exchange and return the response head with its body
    /// still streaming.
    pub async fn response(mut self) -> Result<HttpResponse, NetError> {
        match self.in_flight.take() {
            Some(handle) => handle
                .await
                .map_err(|e| NetError::connection_closed(format!("request task failed: {}", e)))?,
            None => {
                let body = self.body.take();
                self.exchange(body).await
            }
        }
    }

    /// Redirects are only followed for bodiless read requests.
    fn exchange(
        &self,
        body: Option<RequestBody>,
    ) -> impl std::future::Future<Output = Result<HttpResponse, NetError>> + Send + 'static {
        let follow = self.ctx.config().follow_redirects
            && body.is_none()
            && matches!(self.method, Method::GET | Method::HEAD);
        execute(
            Arc::clone(&self.ctx),
            self.method.clone(),
            self.url.clone(),
            self.headers.clone(),
            body,
            self.connect_timeout,
            self.read_timeout,
            follow,
        )
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute(
    ctx: Arc<RequestContext>,
    method: Method,
    mut url: Url,
    headers: OrderedHeaderMap,
    mut body: Option<RequestBody>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    follow_redirects: bool,
) -> Result<HttpResponse, NetError> {
    let max_redirects = ctx.config().max_redirects;
    let mut hops = 0;

    loop {
        let mut txn = HttpTransaction::new(
            Arc::clone(ctx.stream_factory()),
            Arc::clone(ctx.cookie_handler()),
            method.clone(),
            url.clone(),
        );
        txn.set_headers(headers.clone());
        txn.set_user_agent(ctx.config().user_agent.as_str());
        txn.set_timeouts(connect_timeout, read_timeout);
        if let Some(body) = body.take() {
            txn.set_body(body);
        }

        txn.start().await?;
        let response = txn
            .take_response()
            .ok_or_else(|| NetError::invalid_response("no response"))?;

        if !follow_redirects {
            return Ok(response);
        }
        let Some(next) = redirect_target(&response) else {
            return Ok(response);
        };
        // Scheme changes are not followed; the 3xx is returned as is.
        if next.scheme() != url.scheme() {
            return Ok(response);
        }

        hops += 1;
        if hops > max_redirects {
            return Err(NetError::TooManyRedirects);
        }
        tracing::debug!(from = %url, to = %next, status = response.status().as_u16(), "following redirect");
        url = next;
    }
}

fn redirect_target(response: &HttpResponse) -> Option<Url> {
    let status = response.status();
    let is_redirect = matches!(
        status,
        StatusCode::MULTIPLE_CHOICES
            | StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !is_redirect {
        return None;
    }
    let location = response.headers().get(http::header::LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

/// Append `key=value` pairs to the URL's query in order, keeping any
/// existing query, the authority and the fragment.
///
/// Falls back to the original URL if the merged one does not re-parse.
pub fn merge_query_params(url: &Url, params: &[(String, String)]) -> Url {
    if params.is_empty() {
        return url.clone();
    }

    let mut query = url.query().unwrap_or_default().to_string();
    for (key, value) in params {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(key);
        query.push('=');
        query.push_str(value);
    }

    let mut merged = url.clone();
    merged.set_query(Some(&query));
    match Url::parse(merged.as_str()) {
        Ok(reparsed) => reparsed,
        Err(_) => url.clone(),
    }
}
