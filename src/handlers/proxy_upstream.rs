use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Result as ActixResult};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::{
    settings::ProxySettings,
    utils::headers::{RequestHeaderProcessor, ResponseHeaderProcessor},
    utils::responses::ResponseBuilder,
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP client bound to the protected origin
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base: Url,
}

impl UpstreamClient {
    /// # Errors
    ///
    /// Returns an error if `upstream_url` is not an absolute URL or the
    /// HTTP client cannot be constructed
    pub fn new(upstream_url: &str) -> Result<Self, UpstreamError> {
        let mut base = Url::parse(upstream_url).map_err(|source| UpstreamError::InvalidUrl {
            url: upstream_url.to_string(),
            source,
        })?;
        // Url::join replaces the last segment unless the base ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        // Redirects belong to the browser, not the gate
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, base })
    }

    /// # Errors
    ///
    /// See [`UpstreamClient::new`]
    pub fn from_settings(settings: &ProxySettings) -> Result<Self, UpstreamError> {
        Self::new(&settings.upstream_url)
    }

    /// Join the request path and raw query onto the upstream base
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse
    pub fn build_url(&self, path: &str, query: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        url.set_query((!query.is_empty()).then_some(query));
        Ok(url)
    }
}

/// Catch-all handler: forward a request that passed both gates to the origin
///
/// # Errors
///
/// Returns an error if reading the upstream response body fails
pub async fn proxy_upstream(
    req: HttpRequest,
    body: web::Bytes,
    upstream: web::Data<UpstreamClient>,
) -> ActixResult<HttpResponse> {
    let upstream_response = match execute_upstream_request(&req, &body, &upstream).await {
        Ok(response) => response,
        Err(err_response) => return Ok(err_response),
    };

    forward_response(upstream_response).await
}

/// Execute the upstream request with forwarded headers and body
///
/// # Errors
///
/// Returns an `HttpResponse` error if:
/// - The upstream URL cannot be built
/// - The HTTP method is not representable
/// - The upstream request fails
async fn execute_upstream_request(
    req: &HttpRequest,
    body: &web::Bytes,
    upstream: &UpstreamClient,
) -> Result<reqwest::Response, HttpResponse> {
    let upstream_url = upstream
        .build_url(req.path(), req.query_string())
        .map_err(|e| {
            log::warn!("Failed to build upstream URL for {}: {e}", req.path());
            ResponseBuilder::bad_gateway().build()
        })?;

    let method = convert_method(req.method())?;

    let mut request_builder = upstream.client.request(method, upstream_url);

    request_builder =
        RequestHeaderProcessor::for_proxy().forward_request_headers(req, request_builder);

    if !body.is_empty() {
        request_builder = request_builder.body(body.to_vec());
    }

    request_builder.send().await.map_err(|err| {
        log::error!("Upstream request failed: {err}");
        ResponseBuilder::bad_gateway().build()
    })
}

fn convert_method(method: &actix_web::http::Method) -> Result<reqwest::Method, HttpResponse> {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|_| {
        ResponseBuilder::bad_request()
            .with_error_code("unsupported_method")
            .with_message("HTTP method not supported")
            .build()
    })
}

/// Copy status, headers and body of the upstream response
///
/// # Errors
///
/// Returns an error if reading the upstream response body fails
async fn forward_response(upstream_response: reqwest::Response) -> ActixResult<HttpResponse> {
    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response_builder = HttpResponse::build(status);

    ResponseHeaderProcessor::for_proxy()
        .forward_response_headers(&upstream_response, &mut response_builder);

    let response_body = upstream_response.bytes().await.map_err(|err| {
        actix_web::error::ErrorBadGateway(format!("Failed to read upstream response: {err}"))
    })?;

    Ok(response_builder.body(response_body))
}
