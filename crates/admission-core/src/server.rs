//! HTTPS front door
//!
//! Serves `POST /mutate` plus the liveness and readiness probes over TLS.
//! The listener owns connection handling; each request gets its own
//! invocation of the shared, read-only [`ReviewHandler`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tracing::info;

use crate::handler::{mutate_handler, ReviewHandler};
use crate::{Error, Result, MAX_REVIEW_BODY_BYTES};

/// Server configuration, resolved once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// PEM certificate chain (server certificate first)
    pub cert_file: PathBuf,
    /// PEM private key matching `cert_file`
    pub key_file: PathBuf,
}

/// Build the webhook router
///
/// - `POST /mutate` - admission reviews
/// - `GET /healthz` - liveness
/// - `GET /readyz` - readiness
pub fn webhook_router(handler: Arc<ReviewHandler>) -> Router {
    Router::new()
        .route(
            "/mutate",
            post(mutate_handler).layer(DefaultBodyLimit::max(MAX_REVIEW_BODY_BYTES)),
        )
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .with_state(handler)
}

/// Install the aws-lc-rs rustls crypto provider for the process
///
/// Must run before any TLS configuration is built.
pub fn install_crypto_provider() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| Error::tls("a rustls crypto provider is already installed"))
}

/// Load TLS material and serve the webhook until the listener fails
pub async fn serve(config: ServerConfig, handler: ReviewHandler) -> Result<()> {
    let tls_config = RustlsConfig::from_pem_file(&config.cert_file, &config.key_file)
        .await
        .map_err(|e| {
            Error::tls(format!(
                "failed to load {} / {}: {}",
                config.cert_file.display(),
                config.key_file.display(),
                e
            ))
        })?;

    let policy = handler.policy_name();
    let app = webhook_router(Arc::new(handler));

    info!(addr = %config.addr, policy, "Starting webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| Error::server(format!("webhook server on {}: {}", config.addr, e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{is_pod_resource, set_annotation, MockMutationPolicy};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const UID: &str = "b5c5ad4a-2f28-4c5b-9e0e-6a7bd0e7f2a1";

    fn router(should_mutate: bool) -> Router {
        let mut policy = MockMutationPolicy::new();
        policy.expect_name().return_const("mock");
        policy.expect_handles().returning(|r| is_pod_resource(r));
        policy.expect_should_mutate().return_const(should_mutate);
        policy.expect_mutate().returning(|pod| {
            let mut mutated = pod.clone();
            set_annotation(&mut mutated, "example.io/mutated", "true");
            mutated
        });
        webhook_router(Arc::new(ReviewHandler::with_json_codec(Arc::new(policy))))
    }

    fn review_body(object: Option<Value>) -> String {
        let mut request = json!({
            "uid": UID,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "default",
            "operation": "CREATE"
        });
        if let Some(object) = object {
            request["object"] = object;
        }
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": request
        })
        .to_string()
    }

    fn pod() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {"containers": [{"name": "main", "image": "nginx"}]}
        })
    }

    fn mutate_request(content_type: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mutate")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn probes_return_ok() {
        for path in ["/healthz", "/readyz"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = router(false).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }

    #[tokio::test]
    async fn mutate_rejects_wrong_content_type() {
        let request = mutate_request("text/plain", review_body(Some(pod())));
        let response = router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn mutate_rejects_unparseable_envelope() {
        let request = mutate_request("application/json", "{\"request\": [".to_string());
        let response = router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("failed to unmarshal AdmissionReview"));
    }

    #[tokio::test]
    async fn mutate_rejects_review_without_request() {
        let body = json!({"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"});
        let request = mutate_request("application/json", body.to_string());
        let response = router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mutate_allows_unselected_pod_without_patch() {
        let request = mutate_request("application/json", review_body(Some(pod())));
        let response = router(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["apiVersion"], "admission.k8s.io/v1");
        assert_eq!(body["kind"], "AdmissionReview");
        assert_eq!(body["response"]["uid"], UID);
        assert_eq!(body["response"]["allowed"], true);
        assert!(body["response"].get("patch").is_none());
    }

    #[tokio::test]
    async fn mutate_returns_json_patch_for_selected_pod() {
        let request = mutate_request("application/json", review_body(Some(pod())));
        let response = router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["response"]["allowed"], true);
        assert_eq!(body["response"]["patchType"], "JSONPatch");
        assert!(body["response"]["patch"].is_string());
    }

    /// Story: an UPDATE of a large pod is reviewed, not refused
    ///
    /// UPDATE reviews carry both `object` and `oldObject`, so a pod near the
    /// API server's request ceiling doubles past axum's default body limit.
    #[tokio::test]
    async fn story_large_update_review_is_answered() {
        let mut large = pod();
        large["metadata"]["annotations"] = json!({"example.io/blob": "x".repeat(1_250_000)});

        let mut body: Value = serde_json::from_str(&review_body(Some(large.clone()))).unwrap();
        body["request"]["operation"] = json!("UPDATE");
        body["request"]["oldObject"] = large;
        let body = body.to_string();
        assert!(body.len() > 2_500_000);

        let request = mutate_request("application/json", body);
        let response = router(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["response"]["uid"], UID);
        assert_eq!(body["response"]["allowed"], true);
    }

    /// Story: a review with no embedded object is rejected but still correlated
    #[tokio::test]
    async fn story_missing_object_is_rejected_with_uid() {
        let request = mutate_request("application/json", review_body(None));
        let response = router(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["response"]["uid"], UID);
        assert_eq!(body["response"]["allowed"], false);
        assert_eq!(body["response"]["status"]["reason"], "BadRequest");
    }
}
