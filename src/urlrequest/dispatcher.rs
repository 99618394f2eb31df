use crate::base::neterror::NetError;
use crate::http::bodycodec::{encode_request_body, BodyEncoding};
use crate::http::multipart;
use crate::http::response::ResponseResult;
use crate::network::binder::NetworkBinder;
use crate::urlrequest::connection::Connection;
use crate::urlrequest::context::RequestContext;
use crate::urlrequest::spec::RequestSpec;
use std::sync::Arc;
use url::Url;

/// Turns a [`RequestSpec`] into a [`ResponseResult`].
///
/// GET/HEAD merge the query params into the URL and send no body.
/// POST/PUT/PATCH/DELETE leave the URL alone and encode the body by the
/// request `Content-Type`. Nothing is retried.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: Arc<RequestContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<RequestContext>) -> Self {
        Self { ctx }
    }

    pub async fn dispatch(&self, spec: &RequestSpec) -> Result<ResponseResult, NetError> {
        let url = Url::parse(&spec.url)?;

        if !spec.bind_to_interface {
            return self.send(spec, &url).await;
        }

        let mut binder = NetworkBinder::new(
            Arc::clone(self.ctx.network_platform()),
            self.ctx.config().bind_transport,
        );
        binder.run_bound(self.send(spec, &url)).await
    }

    async fn send(&self, spec: &RequestSpec, url: &Url) -> Result<ResponseResult, NetError> {
        let method = spec.method;
        tracing::debug!(%method, url = %url, "dispatching request");

        if method.is_read() {
            let conn = Connection::open(
                Arc::clone(&self.ctx),
                url,
                method.to_http(),
                spec.connect_timeout,
                spec.read_timeout,
                &spec.headers,
                Some(&spec.query_params),
            )?;
            return conn.response().await?.into_result().await;
        }

        let mut conn = Connection::open(
            Arc::clone(&self.ctx),
            url,
            method.to_http(),
            spec.connect_timeout,
            spec.read_timeout,
            &spec.headers,
            None,
        )?;

        let encoding = encode_request_body(conn.request_property("Content-Type"), &spec.body);
        let response = match encoding {
            BodyEncoding::Encoded(bytes) => {
                conn.set_fixed_body(bytes);
                conn.response().await?
            }
            BodyEncoding::Multipart(fields) => multipart::send_form(conn, &fields, None).await?,
            BodyEncoding::None => conn.response().await?,
        };
        response.into_result().await
    }
}
