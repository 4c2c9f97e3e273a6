//! Transport Module Tests
//!
//! Drives the router in-process, without binding a socket.
//!
//! ## Test Scopes
//! - **Record Operations**: JSON contracts of the five operations.
//! - **Timeouts**: a timed-out request still lets issued storage calls finish.
//! - **Administration**: joining, listing and removing nodes.

#[cfg(test)]
mod tests {
    use crate::coordinator::Coordinator;
    use crate::error::EngineError;
    use crate::nodes::{EngineFactory, EngineOptions, MemoryEngine, MemoryEngineFactory, NodeManager, StorageEngine};
    use crate::ring::HashRing;
    use crate::server::{ServerState, router};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(factory: Arc<dyn EngineFactory>, request_timeout: Duration) -> Router {
        let nodes = NodeManager::new(factory);
        let ring = Arc::new(HashRing::new(3));
        for i in 1..=5 {
            let node = format!("node{}", i);
            nodes.add_node(node.clone(), format!("mem/{}", node)).unwrap();
            ring.add_node(node);
        }

        router(Arc::new(ServerState {
            coordinator: Coordinator::new(ring, nodes),
            request_timeout,
            data_dir: PathBuf::from("mem"),
            engine_options: EngineOptions::default(),
        }))
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryEngineFactory), Duration::from_secs(5))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    // ============================================================
    // RECORD OPERATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_put_get_over_http() {
        let app = app();

        let (status, body) = call(&app, "POST", "/put", Some(json!({"key": "hello", "value": "world"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (status, body) = call(&app, "POST", "/get", Some(json!({"key": "hello"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "world", "found": true}));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_an_error() {
        let app = app();

        let (status, body) = call(&app, "POST", "/get", Some(json!({"key": "nonexistent"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "", "found": false}));
    }

    #[tokio::test]
    async fn test_update_value_and_key_over_http() {
        let app = app();
        call(&app, "POST", "/put", Some(json!({"key": "hello", "value": "world"}))).await;

        let (_, body) = call(
            &app,
            "POST",
            "/update_value",
            Some(json!({"key": "hello", "old_value": "world", "new_value": "universe"})),
        )
        .await;
        assert_eq!(body, json!({"success": true}));

        let (_, body) = call(
            &app,
            "POST",
            "/update_value",
            Some(json!({"key": "hello", "old_value": "world", "new_value": "again"})),
        )
        .await;
        assert_eq!(body, json!({"success": false}));

        let (_, body) = call(&app, "POST", "/update_key", Some(json!({"old_key": "hello", "new_key": "hi"}))).await;
        assert_eq!(body, json!({"success": true}));

        let (_, body) = call(&app, "POST", "/get", Some(json!({"key": "hi"}))).await;
        assert_eq!(body, json!({"value": "universe", "found": true}));
        let (_, body) = call(&app, "POST", "/get", Some(json!({"key": "hello"}))).await;
        assert_eq!(body["found"], json!(false));
    }

    #[tokio::test]
    async fn test_delete_over_http() {
        let app = app();
        call(&app, "POST", "/put", Some(json!({"key": "k", "value": "v"}))).await;

        let (status, body) = call(&app, "POST", "/delete", Some(json!({"key": "k"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, body) = call(&app, "POST", "/get", Some(json!({"key": "k"}))).await;
        assert_eq!(body["found"], json!(false));
    }

    #[tokio::test]
    async fn test_placement_over_http() {
        let app = app();

        let (status, body) = call(&app, "POST", "/placement", Some(json!({"key": "apple"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = app();

        let (status, _) = call(&app, "POST", "/put", Some(json!({"key": "only-key"}))).await;
        assert!(status.is_client_error());
    }

    // ============================================================
    // TIMEOUT TESTS
    // ============================================================

    struct SlowEngine {
        inner: MemoryEngine,
        delay: Duration,
    }

    impl StorageEngine for SlowEngine {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
            self.inner.get(key)
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
            std::thread::sleep(self.delay);
            self.inner.put(key, value)
        }

        fn delete(&self, key: &[u8]) -> Result<(), EngineError> {
            self.inner.delete(key)
        }

        fn close(&self) -> Result<(), EngineError> {
            self.inner.close()
        }

        fn location(&self) -> &Path {
            self.inner.location()
        }
    }

    struct SlowFactory;

    impl EngineFactory for SlowFactory {
        fn open(&self, location: &Path, _options: &EngineOptions) -> Result<Arc<dyn StorageEngine>, EngineError> {
            Ok(Arc::new(SlowEngine {
                inner: MemoryEngine::new(location),
                delay: Duration::from_millis(200),
            }))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timed_out_put_still_lands() {
        let app = app_with(Arc::new(SlowFactory), Duration::from_millis(20));

        let (status, body) = call(&app, "POST", "/put", Some(json!({"key": "k", "value": "v"}))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body, json!({"success": false}));

        tokio::time::sleep(Duration::from_millis(600)).await;

        let (status, body) = call(&app, "POST", "/get", Some(json!({"key": "k"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "v", "found": true}));
    }

    // ============================================================
    // ADMINISTRATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_node_lifecycle_over_http() {
        let app = app();

        let (status, body) = call(&app, "POST", "/nodes", Some(json!({"node_id": "node6"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"success": true}));

        let (status, _) = call(&app, "POST", "/nodes", Some(json!({"node_id": "node6"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, "GET", "/nodes", None).await;
        assert_eq!(body["ring"].as_array().unwrap().len(), 6);
        assert_eq!(body["registered"].as_array().unwrap().len(), 6);
        assert_eq!(body["ring"][5], json!("node6"));

        let (status, _) = call(&app, "DELETE", "/nodes/node6", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "DELETE", "/nodes/node6", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));

        let (_, body) = call(&app, "GET", "/nodes", None).await;
        assert_eq!(body["ring"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_add_node_rejects_path_like_ids() {
        let app = app();

        for bad in ["", "..", "a/b", "node#1"] {
            let (status, _) = call(&app, "POST", "/nodes", Some(json!({"node_id": bad}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{:?} should be rejected", bad);
        }
    }
}
