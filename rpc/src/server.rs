//! Axum-based RPC server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_node::{GovernanceMetrics, NodeHandle};

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub handle: NodeHandle,
    /// `None` when metrics are disabled.
    pub metrics: Option<Arc<GovernanceMetrics>>,
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::metrics))
        .route("/balances", post(handlers::set_balance))
        .route("/balances/:user", get(handlers::get_balance))
        .route("/admin/pause", post(handlers::pause))
        .route("/admin/unpause", post(handlers::unpause))
        .route(
            "/proposals",
            get(handlers::list_proposals).post(handlers::create_proposal),
        )
        .route("/proposals/count", get(handlers::proposal_count))
        .route("/proposals/:id", get(handlers::get_proposal))
        .route("/proposals/:id/status", get(handlers::proposal_status))
        .route(
            "/proposals/:id/votes",
            get(handlers::list_votes).post(handlers::cast_vote),
        )
        .route("/proposals/:id/votes/:user", get(handlers::get_user_vote))
        .route("/proposals/:id/execute", post(handlers::execute_proposal))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct RpcServer {
    pub port: u16,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Serve until `shutdown` fires.
    pub async fn start(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        info!("RPC server listening on {}", addr);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        info!("RPC server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_node::{AgoraNode, NodeConfig};
    use agora_nullables::NullClock;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ADMIN: &str = "SP0ADMIN";

    fn test_app() -> (Router, AgoraNode, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(0));
        let config = NodeConfig {
            admin: ADMIN.into(),
            use_memory_store: true,
            ..NodeConfig::default()
        };
        let node = AgoraNode::start_with_clock(config, clock.clone()).expect("node starts");
        let app = router(AppState {
            handle: node.handle.clone(),
            metrics: Some(Arc::clone(&node.metrics)),
        });
        (app, node, clock)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(c) = caller {
            req = req.header("x-agora-caller", c);
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn proposal_lifecycle_over_http() {
        let (app, node, clock) = test_app();

        let (status, _) = call(
            &app,
            "POST",
            "/balances",
            Some(ADMIN),
            Some(json!({"user": "carol", "amount": 250_000})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &app,
            "POST",
            "/proposals",
            Some("carol"),
            Some(json!({
                "title": "Fund docs",
                "description": "Pay the writers",
                "target_contract": "SP0TREASURY",
                "action_data_hex": "deadbeef"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);

        clock.advance(1);
        let (status, body) = call(
            &app,
            "POST",
            "/proposals/1/votes",
            Some("carol"),
            Some(json!({"support": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weight"], 250_000);

        let (_, body) = call(&app, "GET", "/proposals/1", None, None).await;
        assert_eq!(body["state"], "active");
        assert_eq!(body["action_data_hex"], "deadbeef");

        let (status, body) = call(&app, "POST", "/proposals/1/execute", Some("carol"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "VOTING_ENDED");

        clock.set(1 + 1 + 1_440 + 2_880);
        let (_, body) = call(&app, "GET", "/proposals/1/status", None, None).await;
        assert_eq!(body["status"], "executable");

        let (status, body) = call(&app, "POST", "/proposals/1/execute", Some("carol"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_voters"], 1);

        let (status, body) = call(&app, "POST", "/proposals/1/execute", Some("carol"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "PROPOSAL_NOT_ACTIVE");

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn missing_caller_is_unauthorized() {
        let (app, node, _clock) = test_app();
        let (status, body) = call(&app, "POST", "/admin/pause", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "MISSING_CALLER");
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (app, node, _clock) = test_app();
        let (status, body) = call(
            &app,
            "POST",
            "/balances",
            Some("mallory"),
            Some(json!({"user": "mallory", "amount": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "NOT_AUTHORIZED");

        let (_, body) = call(&app, "GET", "/balances/mallory", None, None).await;
        assert_eq!(body["amount"], 0);
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_proposal_is_not_found() {
        let (app, node, _clock) = test_app();
        let (status, body) = call(&app, "GET", "/proposals/9", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "PROPOSAL_NOT_FOUND");

        let (_, body) = call(&app, "GET", "/proposals/count", None, None).await;
        assert_eq!(body["count"], 0);
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn listing_pages_with_cursor() {
        let (app, node, _clock) = test_app();
        call(
            &app,
            "POST",
            "/balances",
            Some(ADMIN),
            Some(json!({"user": "alice", "amount": 1_000})),
        )
        .await;
        for i in 0..3 {
            let (status, _) = call(
                &app,
                "POST",
                "/proposals",
                Some("alice"),
                Some(json!({"title": format!("p{i}")})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = call(&app, "GET", "/proposals?count=2", None, None).await;
        assert_eq!(body["proposals"].as_array().unwrap().len(), 2);
        let cursor = body["cursor"].as_str().unwrap().to_string();

        let (_, body) = call(
            &app,
            "GET",
            &format!("/proposals?count=2&cursor={cursor}"),
            None,
            None,
        )
        .await;
        let page = body["proposals"].as_array().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], 3);
        assert!(body.get("cursor").is_none());
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn user_vote_is_null_until_cast() {
        let (app, node, clock) = test_app();
        call(
            &app,
            "POST",
            "/balances",
            Some(ADMIN),
            Some(json!({"user": "alice", "amount": 1_000})),
        )
        .await;
        call(&app, "POST", "/proposals", Some("alice"), Some(json!({"title": "t"}))).await;

        let (status, body) = call(&app, "GET", "/proposals/1/votes/alice", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        clock.advance(1);
        call(
            &app,
            "POST",
            "/proposals/1/votes",
            Some("alice"),
            Some(json!({"support": false})),
        )
        .await;
        let (_, body) = call(&app, "GET", "/proposals/1/votes/alice", None, None).await;
        assert_eq!(body["support"], false);
        assert_eq!(body["weight"], 1_000);
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        let (app, node, _clock) = test_app();
        let resp = app
            .clone()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("agora_proposals_created_total"));
        node.stop().await.unwrap();
    }
}
