//! HTTP update endpoint
//!
//! `GET /?hostname=<name>[&ip=<address>]` reconciles the zone and answers in
//! plain text:
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | Records changed | 200 | `Hosts Updated: a.example.com.,example.com.` |
//! | Nothing to change | 200 | `Already up to date.` |
//! | Any error | 500 | The error message |
//!
//! Without `ip`, the caller's address is used: the TCP peer, or the first
//! entry of the configured client-IP header when running behind a proxy.

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use dyndns_core::{DesiredUpdate, Reconciler};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::{BasicCredentials, basic_auth};

/// Shared handler state
pub struct AppState {
    reconciler: Arc<Reconciler>,
    include_subdomains: bool,
    client_ip_header: Option<HeaderName>,
}

impl AppState {
    pub fn new(reconciler: Arc<Reconciler>, include_subdomains: bool) -> Self {
        Self {
            reconciler,
            include_subdomains,
            client_ip_header: None,
        }
    }

    /// Read the client address from `header` instead of the TCP peer
    pub fn with_client_ip_header(mut self, header: HeaderName) -> Self {
        self.client_ip_header = Some(header);
        self
    }
}

/// Query parameters of an update request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateParams {
    pub hostname: Option<String>,
    pub ip: Option<String>,
}

/// Build the router with basic auth in front of every route
pub fn router(state: AppState, credentials: BasicCredentials) -> Router {
    Router::new()
        .route("/", get(update))
        .layer(from_fn_with_state(Arc::new(credentials), basic_auth))
        .with_state(Arc::new(state))
}

async fn update(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UpdateParams>, QueryRejection>,
    request: Request,
) -> Response {
    // Malformed queries are reported like any other failed update
    let Query(params) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::error!("Update failed: {}", rejection.body_text());
            return (StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text()).into_response();
        }
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match apply_update(&state, params, request.headers(), peer).await {
        Ok(names) if names.is_empty() => (StatusCode::OK, "Already up to date.").into_response(),
        Ok(names) => (StatusCode::OK, format!("Hosts Updated: {}", names.join(","))).into_response(),
        Err(e) => {
            tracing::error!("Update failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn apply_update(
    state: &AppState,
    params: UpdateParams,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> dyndns_core::Result<Vec<String>> {
    let ip = params
        .ip
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| observed_ip(state.client_ip_header.as_ref(), headers, peer))
        .unwrap_or_default();

    let update = DesiredUpdate::new(
        params.hostname.unwrap_or_default(),
        ip,
        state.include_subdomains,
    )?;

    tracing::info!(
        "Update requested for {} -> {} (subdomains: {})",
        update.hostname,
        update.ip,
        update.include_subdomains
    );

    state.reconciler.update_ip_for_hostname(&update).await
}

/// Address the request came from
///
/// With a client-IP header configured, only that header is trusted.
fn observed_ip(
    client_ip_header: Option<&HeaderName>,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Option<String> {
    match client_ip_header {
        Some(name) => headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use dyndns_core::{ExistingRecord, MemoryZoneStore, ReconcileConfig, ZoneRecordStore};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const ZONE: &str = "Z1";
    const PEER: &str = "203.0.113.7:51000";

    fn store() -> MemoryZoneStore {
        MemoryZoneStore::with_records(
            ZONE,
            vec![
                ExistingRecord::a("example.com.", ["1.1.1.1"]),
                ExistingRecord::a("a.example.com.", ["1.1.1.1"]),
                ExistingRecord::a("other.com.", ["1.1.1.1"]),
            ],
        )
    }

    fn app_with(store: MemoryZoneStore, header: Option<&str>) -> Router {
        let reconciler =
            Reconciler::new(Arc::new(store), ZONE, &ReconcileConfig::default()).unwrap();
        let mut state = AppState::new(Arc::new(reconciler), true);
        if let Some(name) = header {
            state = state.with_client_ip_header(HeaderName::from_bytes(name.as_bytes()).unwrap());
        }
        router(state, BasicCredentials::new("admin", "s3cret"))
    }

    fn request(uri: &str, auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(user_pass) = auth {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(user_pass)),
            );
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(PEER.parse::<SocketAddr>().unwrap()));
        request
    }

    async fn send(app: Router, request: Request) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn values_of(records: &[ExistingRecord], name: &str) -> Vec<String> {
        records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.values.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let response = app_with(store(), None)
            .oneshot(request("/?hostname=example.com&ip=2.2.2.2", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"dyndns\""
        );
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_touch_zone() {
        let zone = store();
        let app = app_with(zone.clone(), None);

        let (status, body) =
            send(app, request("/?hostname=example.com&ip=2.2.2.2", Some("admin:nope"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized");

        let records = zone.list_records(ZONE).await.unwrap();
        assert_eq!(values_of(&records, "example.com."), vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn test_update_then_already_up_to_date() {
        let app = app_with(store(), None);

        let (status, body) = send(
            app.clone(),
            request("/?hostname=example.com&ip=2.2.2.2", Some("admin:s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hosts Updated: example.com.,a.example.com.");

        let (status, body) = send(
            app,
            request("/?hostname=example.com&ip=2.2.2.2", Some("admin:s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Already up to date.");
    }

    #[tokio::test]
    async fn test_duplicate_hostname_is_server_error() {
        let zone = store();
        let (status, body) = send(
            app_with(zone.clone(), None),
            request("/?hostname=example.com&hostname=x.com&ip=2.2.2.2", Some("admin:s3cret")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("hostname"));

        let records = zone.list_records(ZONE).await.unwrap();
        assert_eq!(values_of(&records, "example.com."), vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn test_missing_hostname() {
        let (status, body) = send(
            app_with(store(), None),
            request("/?ip=2.2.2.2", Some("admin:s3cret")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to determine hostname");
    }

    #[tokio::test]
    async fn test_peer_address_used_without_ip() {
        let zone = store();
        let (status, _) = send(
            app_with(zone.clone(), None),
            request("/?hostname=other.com", Some("admin:s3cret")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let records = zone.list_records(ZONE).await.unwrap();
        assert_eq!(values_of(&records, "other.com."), vec!["203.0.113.7"]);
        assert_eq!(values_of(&records, "example.com."), vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn test_client_ip_header_takes_first_entry() {
        let zone = store();
        let mut req = request("/?hostname=other.com", Some("admin:s3cret"));
        req.headers_mut().insert(
            "x-forwarded-for",
            "198.51.100.4, 10.0.0.1".parse().unwrap(),
        );

        let (status, body) = send(app_with(zone.clone(), Some("X-Forwarded-For")), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hosts Updated: other.com.");

        let records = zone.list_records(ZONE).await.unwrap();
        assert_eq!(values_of(&records, "other.com."), vec!["198.51.100.4"]);
    }

    #[tokio::test]
    async fn test_missing_client_ip_header() {
        let (status, body) = send(
            app_with(store(), Some("X-Forwarded-For")),
            request("/?hostname=other.com", Some("admin:s3cret")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to determine ip");
    }

    #[tokio::test]
    async fn test_store_error_is_reported() {
        let (status, body) = send(
            app_with(MemoryZoneStore::new(), None),
            request("/?hostname=example.com&ip=2.2.2.2", Some("admin:s3cret")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Failed to list records of zone Z1"));
    }
}
