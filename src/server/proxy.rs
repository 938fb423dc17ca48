use std::time::Duration;

use actix_web::http::header::{self, ContentType, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::web::{Bytes, Data};
use actix_web::{HttpRequest, HttpResponse};
use anyhow::{Context, Result};
use log::{debug, error};
use reqwest::Url;

/// Forwards requests to the upstream service and relays its responses.
pub struct Proxy {
    client: reqwest::Client,
    upstream: Url,
}

impl Proxy {
    /// Headers that only make sense for a single connection, plus the ones
    /// recomputed by the http clients on each side.
    const SKIP_HEADERS: [&str; 11] = [
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailer",
        "transfer-encoding",
        "upgrade",
        "host",
        "content-length",
        "proxy-connection",
    ];

    pub fn new(upstream: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build http client")?;
        let upstream = Url::parse(&upstream)
            .with_context(|| format!("parse upstream url '{upstream}'"))?;
        Ok(Self { client, upstream })
    }

    pub async fn forward(&self, req: &HttpRequest, body: Bytes) -> Result<HttpResponse> {
        let url = self.upstream_url(req);
        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .context("convert request method")?;
        debug!("Forward {} {}", method, url);

        let mut builder = self.client.request(method, url);
        for (name, value) in req.headers() {
            if Self::is_skipped(name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        let resp = builder
            .body(body)
            .send()
            .await
            .context("send request to upstream")?;

        let status = StatusCode::from_u16(resp.status().as_u16())
            .context("convert upstream status code")?;
        let mut http_resp = HttpResponse::build(status);
        for (name, value) in resp.headers() {
            if Self::is_skipped(name.as_str()) {
                continue;
            }
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                http_resp.append_header((name.as_str(), value));
            }
        }

        let data = resp.bytes().await.context("read upstream response body")?;
        Ok(http_resp.body(data))
    }

    /// Builds the upstream url from the percent-decoded request path, the
    /// one the authorizer decided on. `Url::set_path` encodes it again.
    fn upstream_url(&self, req: &HttpRequest) -> Url {
        let mut url = self.upstream.clone();
        let path = format!(
            "{}{}",
            self.upstream.path().trim_end_matches('/'),
            req.match_info().as_str()
        );
        url.set_path(&path);

        let query = req.query_string();
        url.set_query(if query.is_empty() { None } else { Some(query) });
        url
    }

    fn is_skipped(name: &str) -> bool {
        Self::SKIP_HEADERS
            .iter()
            .any(|skip| name.eq_ignore_ascii_case(skip))
    }
}

/// Default service of the server, reached only by authorized requests.
pub async fn forward_handler(req: HttpRequest, body: Bytes, proxy: Data<Proxy>) -> HttpResponse {
    match proxy.forward(&req, body).await {
        Ok(resp) => resp,
        Err(err) => {
            error!(
                "Forward {} {} to upstream failed: {:#}",
                req.method(),
                req.path(),
                err
            );
            HttpResponse::BadGateway()
                .content_type(ContentType::plaintext())
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .body("Bad Gateway")
        }
    }
}
