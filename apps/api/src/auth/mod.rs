//! Session verification delegated to the external auth service.
//!
//! Every protected request must carry a `Refresh-Token` cookie; the session
//! cookies are forwarded to `AUTH_SERVICE_URL` and the request proceeds only on
//! a 200/204 answer. The check sits behind `TokenVerifier` so the middleware
//! does not care how verification happens.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "Authorization";
pub const REFRESH_TOKEN_COOKIE: &str = "Refresh-Token";
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing 'Refresh-Token' cookie")]
    MissingToken,

    #[error("auth service rejected the session (status {status})")]
    Rejected { status: u16 },

    #[error("auth service unavailable: {0}")]
    Unavailable(String),

    #[error("auth service returned unexpected status {status}")]
    Unexpected { status: u16 },
}

/// Session cookies taken from an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access: Option<String>,
    pub refresh: String,
}

impl SessionTokens {
    /// Reads the session cookies; `None` when the refresh token is absent or empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut access = None;
        let mut refresh = None;

        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='));

        for (name, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.trim() {
                ACCESS_TOKEN_COOKIE => access = Some(value.to_string()),
                REFRESH_TOKEN_COOKIE => refresh = Some(value.to_string()),
                _ => {}
            }
        }

        refresh.map(|refresh| Self { access, refresh })
    }

    fn cookie_header(&self) -> String {
        let mut cookies = Vec::with_capacity(2);
        if let Some(access) = &self.access {
            cookies.push(format!("{ACCESS_TOKEN_COOKIE}={access}"));
        }
        cookies.push(format!("{REFRESH_TOKEN_COOKIE}={}", self.refresh));
        cookies.join("; ")
    }
}

/// Pluggable session verifier.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, tokens: &SessionTokens) -> Result<(), AuthError>;
}

/// Verifies sessions by forwarding the cookies to the auth service.
pub struct HttpTokenVerifier {
    client: Client,
    url: String,
}

impl HttpTokenVerifier {
    pub fn new(url: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(AUTH_TIMEOUT).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, tokens: &SessionTokens) -> Result<(), AuthError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::COOKIE, tokens.cookie_header())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "Auth service request failed");
                AuthError::Unavailable(e.to_string())
            })?;

        match response.status().as_u16() {
            200 | 204 => Ok(()),
            status @ (401 | 403) => Err(AuthError::Rejected { status }),
            status => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, %body, "Unexpected auth service response");
                Err(AuthError::Unexpected { status })
            }
        }
    }
}

/// Middleware guarding the resume API. Install with
/// `axum::middleware::from_fn_with_state(verifier, require_auth)`.
pub async fn require_auth(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let tokens = SessionTokens::from_headers(request.headers()).ok_or(AuthError::MissingToken)?;
    if tokens.access.is_none() {
        warn!(
            path = %request.uri().path(),
            "Missing access token cookie, verifying with refresh token only"
        );
    }

    verifier.verify(&tokens).await?;
    debug!(path = %request.uri().path(), "Request authenticated");
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    struct StubVerifier(fn() -> Result<(), AuthError>);

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(&self, _tokens: &SessionTokens) -> Result<(), AuthError> {
            (self.0)()
        }
    }

    fn make_app(verify: fn() -> Result<(), AuthError>) -> Router {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(StubVerifier(verify));
        Router::new()
            .route(
                "/protected",
                get(|| async { "ok" }).options(|| async { "preflight" }),
            )
            .route_layer(middleware::from_fn_with_state(verifier, require_auth))
    }

    fn make_request(method: Method, cookie: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder()
            .method(method)
            .uri("/protected");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; Authorization=abc; Refresh-Token=xyz"),
        );
        let tokens = SessionTokens::from_headers(&headers).unwrap();
        assert_eq!(tokens.access.as_deref(), Some("abc"));
        assert_eq!(tokens.refresh, "xyz");
        assert_eq!(tokens.cookie_header(), "Authorization=abc; Refresh-Token=xyz");
    }

    #[test]
    fn test_missing_or_empty_refresh_token() {
        let mut headers = HeaderMap::new();
        assert!(SessionTokens::from_headers(&headers).is_none());
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("Authorization=abc; Refresh-Token="),
        );
        assert!(SessionTokens::from_headers(&headers).is_none());
    }

    #[tokio::test]
    async fn test_valid_session_passes() {
        let response = make_app(|| Ok(()))
            .oneshot(make_request(Method::GET, Some("Refresh-Token=r")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let response = make_app(|| Ok(()))
            .oneshot(make_request(Method::GET, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verifier_outcomes_map_to_statuses() {
        let cases: [(fn() -> Result<(), AuthError>, StatusCode); 3] = [
            (
                || Err(AuthError::Rejected { status: 403 }),
                StatusCode::UNAUTHORIZED,
            ),
            (
                || Err(AuthError::Unavailable("refused".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                || Err(AuthError::Unexpected { status: 418 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (verify, expected) in cases {
            let response = make_app(verify)
                .oneshot(make_request(Method::GET, Some("Refresh-Token=r")))
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_options_skips_verification() {
        let response = make_app(|| Err(AuthError::Rejected { status: 401 }))
            .oneshot(make_request(Method::OPTIONS, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn spawn_auth_service(status: StatusCode) -> String {
        let app = Router::new().route(
            "/check",
            get(move |headers: HeaderMap| async move {
                let forwarded = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if forwarded.contains("Refresh-Token=r") {
                    status
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/check")
    }

    fn make_tokens() -> SessionTokens {
        SessionTokens {
            access: Some("a".to_string()),
            refresh: "r".to_string(),
        }
    }

    #[tokio::test]
    async fn test_http_verifier_forwards_cookies() {
        let url = spawn_auth_service(StatusCode::NO_CONTENT).await;
        let verifier = HttpTokenVerifier::new(url).unwrap();
        assert!(verifier.verify(&make_tokens()).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_verifier_maps_statuses() {
        let url = spawn_auth_service(StatusCode::FORBIDDEN).await;
        let err = HttpTokenVerifier::new(url)
            .unwrap()
            .verify(&make_tokens())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 403 }));

        let url = spawn_auth_service(StatusCode::BAD_GATEWAY).await;
        let err = HttpTokenVerifier::new(url)
            .unwrap()
            .verify(&make_tokens())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unexpected { status: 502 }));
    }

    #[tokio::test]
    async fn test_http_verifier_unreachable_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let verifier = HttpTokenVerifier::new(format!("http://{addr}/check")).unwrap();
        let err = verifier.verify(&make_tokens()).await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)));
    }
}
