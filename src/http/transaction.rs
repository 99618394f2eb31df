use crate::base::neterror::NetError;
use crate::cookies::handler::CookieHandler;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::{BoxedBody, RequestBody};
use crate::http::response::{with_read_timeout, HttpResponse};
use crate::http::streamfactory::{HttpStream, HttpStreamFactory};
use http::{Method, Request, Version};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CreateStream,
    SendRequest,
    ReadHeaders,
    Done,
}

/// One request/response exchange over a fresh connection.
///
/// Adds `Host`, a default `User-Agent` and the jar's `Cookie` header, then
/// feeds `Set-Cookie` lines from the response back into the jar.
pub struct HttpTransaction {
    factory: Arc<HttpStreamFactory>,
    cookies: Arc<dyn CookieHandler>,
    url: Url,
    method: Method,
    headers: OrderedHeaderMap,
    body: Option<RequestBody>,
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    state: State,
    stream: Option<HttpStream>,
    response: Option<HttpResponse>,
}

impl HttpTransaction {
    pub fn new(
        factory: Arc<HttpStreamFactory>,
        cookies: Arc<dyn CookieHandler>,
        method: Method,
        url: Url,
    ) -> Self {
        Self {
            factory,
            cookies,
            url,
            method,
            headers: OrderedHeaderMap::new(),
            body: None,
            user_agent: None,
            connect_timeout: None,
            read_timeout: None,
            state: State::Idle,
            stream: None,
            response: None,
        }
    }

    pub fn set_headers(&mut self, headers: OrderedHeaderMap) {
        self.headers = headers;
    }

    pub fn set_body(&mut self, body: RequestBody) {
        self.body = Some(body);
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = Some(user_agent.into());
    }

    pub fn set_timeouts(&mut self, connect: Option<Duration>, read: Option<Duration>) {
        self.connect_timeout = connect;
        self.read_timeout = read;
    }

    /// Connect, send the request and wait for the response head.
    pub async fn start(&mut self) -> Result<(), NetError> {
        self.state = State::CreateStream;
        loop {
            match self.state {
                State::Idle | State::Done => return Ok(()),
                State::CreateStream => {
                    tracing::debug!(url = %self.url, method = %self.method, "opening connection");
                    self.stream = Some(
                        self.factory
                            .create_stream(&self.url, self.connect_timeout)
                            .await?,
                    );
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let (request, sent) = self.build_request()?;
                    let stream = self
                        .stream
                        .as_mut()
                        .ok_or_else(|| NetError::connection_closed("no stream"))?;
                    let response = stream.send_request(request);
                    tokio::pin!(response);

                    // The read timeout starts once the body is fully handed over.
                    let resp = tokio::select! {
                        resp = &mut response => resp?,
                        _ = sent => with_read_timeout(self.read_timeout, &mut response).await??,
                    };

                    for line in resp.headers().get_all(http::header::SET_COOKIE) {
                        if let Ok(line) = line.to_str() {
                            self.cookies.set_cookie(&self.url, line);
                        }
                    }

                    self.response = Some(HttpResponse::from_hyper(
                        resp,
                        self.url.clone(),
                        self.read_timeout,
                    ));
                    self.state = State::ReadHeaders;
                }
                State::ReadHeaders => {
                    tracing::debug!(
                        url = %self.url,
                        status = self.response.as_ref().map(|r| r.status().as_u16()),
                        "response headers received"
                    );
                    self.state = State::Done;
                }
            }
        }
    }

    fn build_request(&mut self) -> Result<(Request<BoxedBody>, oneshot::Receiver<()>), NetError> {
        let mut headers = self.headers.clone();

        let host = self.url.host_str().ok_or(NetError::InvalidUrl)?;
        let host = match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        headers.insert_default("Host", &host)?;

        if let Some(ua) = &self.user_agent {
            headers.insert_default("User-Agent", ua)?;
        }

        if !headers.contains("Cookie") {
            if let Some(cookie) = self.cookies.get_cookie(&self.url) {
                headers.insert("Cookie", &cookie)?;
            }
        }

        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }

        let (body, sent) = self.body.take().unwrap_or_default().into_tracked();
        let mut req = Request::builder()
            .method(self.method.clone())
            .uri(target)
            .version(Version::HTTP_11)
            .body(body)
            .map_err(|_| NetError::InvalidUrl)?;
        *req.headers_mut() = headers.to_header_map();
        Ok((req, sent))
    }

    pub fn take_response(&mut self) -> Option<HttpResponse> {
        self.response.take()
    }
}
