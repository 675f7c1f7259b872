//! Account handlers

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tandem_core::{Account, AccountView, Error, WriteReport, WriteStatus};

/// Response header naming the backend that answered a read
pub const SOURCE_HEADER: &str = "x-tandem-source";

/// First `user` value of the query string, `""` when absent
fn requested_user(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// `GET /account?user=<name>`
///
/// Always 200. An unknown name yields the zero-valued account.
pub async fn get(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let outcome = state.coordinator.read(&requested_user(params)).await;
    let view = outcome.account.map(AccountView::from).unwrap_or_default();

    ([(SOURCE_HEADER, outcome.source.to_string())], Json(view))
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    cache: String,
    store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

impl From<&WriteReport> for WriteResponse {
    fn from(report: &WriteReport) -> Self {
        Self {
            cache: slot(&report.cache),
            store: slot(&report.store),
            id: report.store_id(),
        }
    }
}

fn slot<T>(result: &tandem_core::Result<T>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// `POST /account`
///
/// 200 when both backends took the write, 202 when only one did, 503 when
/// neither did.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<AccountView>, JsonRejection>,
) -> Response {
    let Json(view) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected account payload: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.coordinator.write(Account::from(view)).await {
        Ok(report) => {
            let status = match report.status() {
                WriteStatus::Committed => StatusCode::OK,
                WriteStatus::Partial => StatusCode::ACCEPTED,
                WriteStatus::Failed => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(WriteResponse::from(&report))).into_response()
        }
        Err(e @ Error::InvalidAccount(_)) => {
            tracing::warn!("Rejected account: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!("Failed to write account: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Any other method on `/account`
pub async fn unsupported(method: Method) -> StatusCode {
    tracing::error!(%method, "No suitable handler found for this method");
    StatusCode::METHOD_NOT_ALLOWED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCache, SqliteStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tandem_core::{CachePort, Coordinator, CoordinatorConfig};
    use tower::ServiceExt;

    struct DownCache;

    #[async_trait]
    impl CachePort for DownCache {
        async fn get(&self, _key: &str) -> tandem_core::Result<Option<Vec<u8>>> {
            Err(Error::CacheUnavailable("connection refused".into()))
        }

        async fn put(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Duration,
        ) -> tandem_core::Result<()> {
            Err(Error::CacheUnavailable("connection refused".into()))
        }

        fn name(&self) -> &'static str {
            "down"
        }
    }

    async fn app_with(cache: Arc<dyn CachePort>, config: CoordinatorConfig) -> Router {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let coordinator = Coordinator::new(cache, store, config);
        crate::router(AppState {
            coordinator: Arc::new(coordinator),
        })
    }

    async fn app() -> Router {
        app_with(Arc::new(MemoryCache::new()), CoordinatorConfig::default()).await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let source = response
            .headers()
            .get(SOURCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, source, body)
    }

    fn get_account(user: &str) -> Request<Body> {
        Request::get(format!("/account?user={}", user))
            .body(Body::empty())
            .unwrap()
    }

    fn post_account(body: &str) -> Request<Body> {
        Request::post("/account")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read_from_cache() {
        let app = app().await;

        let (status, _, body) =
            send(&app, post_account(r#"{"name":"alice","balance":100.5}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache"], "ok");
        assert_eq!(body["store"], "ok");
        assert!(body["id"].is_i64());

        let (status, source, body) = send(&app, get_account("alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("cache"));
        assert_eq!(body, json!({"name": "alice", "balance": 100.5}));
    }

    #[tokio::test]
    async fn test_read_falls_back_to_store_after_ttl() {
        let app = app_with(
            Arc::new(MemoryCache::new()),
            CoordinatorConfig::default().with_cache_ttl(Duration::from_millis(50)),
        )
        .await;

        send(&app, post_account(r#"{"name":"alice","balance":100.5}"#)).await;
        let (_, source, first) = send(&app, get_account("alice")).await;
        assert_eq!(source.as_deref(), Some("cache"));

        tokio::time::sleep(Duration::from_millis(100)).await;

        let (status, source, second) = send(&app, get_account("alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("store"));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_unknown_account_is_zero_valued() {
        let app = app().await;

        let (status, source, body) = send(&app, get_account("nobody")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("not-found"));
        assert_eq!(body, json!({"name": "", "balance": 0.0}));
    }

    #[tokio::test]
    async fn test_read_takes_first_user_value() {
        let app = app().await;
        send(&app, post_account(r#"{"name":"a","balance":3.5}"#)).await;

        let (status, source, body) = send(&app, get_account("a&user=b")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("cache"));
        assert_eq!(body, json!({"name": "a", "balance": 3.5}));

        let (status, source, body) = send(&app, get_account("b&user=a")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("not-found"));
        assert_eq!(body, json!({"name": "", "balance": 0.0}));
    }

    #[tokio::test]
    async fn test_read_without_user_is_zero_valued() {
        let app = app().await;

        let request = Request::get("/account").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"name": "", "balance": 0.0}));
    }

    #[tokio::test]
    async fn test_rejects_bad_payloads() {
        let app = app().await;

        let (status, _, _) = send(&app, post_account("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(&app, post_account(r#"{"name":"bob"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(&app, post_account(r#"{"name":"","balance":1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_rewrite_diverges_cache_from_store() {
        let app = app().await;

        send(&app, post_account(r#"{"name":"carol","balance":1.0}"#)).await;
        let (status, _, body) = send(&app, post_account(r#"{"name":"carol","balance":2.0}"#)).await;

        // The store keeps one row per name, so only the cache takes the update
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["cache"], "ok");
        assert_ne!(body["store"], "ok");

        let (_, source, body) = send(&app, get_account("carol")).await;
        assert_eq!(source.as_deref(), Some("cache"));
        assert_eq!(body["balance"], 2.0);
    }

    #[tokio::test]
    async fn test_cache_outage_is_partial_and_reads_from_store() {
        let app = app_with(Arc::new(DownCache), CoordinatorConfig::default()).await;

        let (status, _, body) = send(&app, post_account(r#"{"name":"dave","balance":7.25}"#)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["store"], "ok");

        let (status, source, body) = send(&app, get_account("dave")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("store"));
        assert_eq!(body, json!({"name": "dave", "balance": 7.25}));
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let app = app().await;

        let request = Request::delete("/account").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
