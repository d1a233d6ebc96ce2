//! Review handler
//!
//! Runs one admission review through the pipeline:
//!
//! ```text
//! Received ─► ContentValidated ─► Decoded ─► Evaluated ─┬─► Mutated ─► Diffed ─┬─► ResponseBuilt
//!                                                       └─► Unchanged ──────────┘
//! ```
//!
//! A wrong content type or an unparseable envelope never reaches the
//! pipeline and is answered at the HTTP level. Every later failure becomes a
//! rejected `AdmissionResponse` carrying the request's UID. Nothing is
//! retried and nothing is shared between requests apart from the read-only
//! codec and policy.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, error, info, warn};

use crate::codec::{JsonCodec, ObjectCodec};
use crate::patch::{create_patch, patch_bytes};
use crate::pod::display_name;
use crate::policy::MutationPolicy;
use crate::review::{AdmissionRequest, AdmissionResponse, AdmissionReview, StatusReason};
use crate::{Error, Result, JSON_CONTENT_TYPE};

/// Errors answered at the HTTP level, before a review response can be built
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The request body was not declared as JSON
    #[error("contentType={0}, expected application/json")]
    UnsupportedMediaType(String),

    /// The body was not an AdmissionReview carrying a request
    #[error("invalid admission review: {0}")]
    MalformedReview(String),
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReviewError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ReviewError::MalformedReview(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// Orchestrates codec, policy and patch generation for each review
///
/// Both collaborators are fixed at construction and never mutated, so one
/// handler is shared by every connection.
#[derive(Clone)]
pub struct ReviewHandler {
    codec: Arc<dyn ObjectCodec>,
    policy: Arc<dyn MutationPolicy>,
}

impl ReviewHandler {
    /// Create a handler from an explicit codec and policy
    pub fn new(codec: Arc<dyn ObjectCodec>, policy: Arc<dyn MutationPolicy>) -> Self {
        Self { codec, policy }
    }

    /// Create a handler that decodes admitted objects as JSON
    pub fn with_json_codec(policy: Arc<dyn MutationPolicy>) -> Self {
        Self::new(Arc::new(JsonCodec), policy)
    }

    /// Name of the policy this handler applies
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Answer a full review envelope
    ///
    /// The reply echoes the envelope's apiVersion/kind and always carries the
    /// request's UID.
    pub fn review(&self, review: &AdmissionReview) -> std::result::Result<AdmissionReview, ReviewError> {
        let request = review
            .request
            .as_ref()
            .ok_or_else(|| ReviewError::MalformedReview("admission review request is nil".to_string()))?;

        let mut response = self.admit(request);
        response.uid = request.uid.clone();
        Ok(review.reply(response))
    }

    /// Decide on a single admission request
    pub fn admit(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let uid = request.uid.as_str();
        let policy = self.policy.name();

        if !self.policy.handles(&request.resource) {
            debug!(
                uid = %uid,
                policy,
                group = %request.resource.group,
                resource = %request.resource.resource,
                "Resource not handled by policy, allowing unchanged"
            );
            return AdmissionResponse::allow(uid);
        }

        let Some(raw) = request.object_bytes() else {
            warn!(uid = %uid, policy, "No object in admission request");
            return AdmissionResponse::reject(
                uid,
                StatusReason::BadRequest,
                "no object provided in admission request",
            );
        };

        let pod = match self.codec.decode(raw) {
            Ok(pod) => pod,
            Err(e) => {
                error!(uid = %uid, policy, error = %e, "Failed to decode pod");
                return reject_error(uid, &e);
            }
        };

        if !self.policy.should_mutate(&pod) {
            debug!(uid = %uid, policy, pod = %display_name(&pod), "Pod does not require mutation");
            return AdmissionResponse::allow(uid);
        }

        let mutated = self.policy.mutate(&pod);

        match self.patch_response(uid, &pod, &mutated) {
            Ok(response) => response,
            Err(e) => {
                error!(uid = %uid, policy, error = %e, "Failed to build patch");
                reject_error(uid, &e)
            }
        }
    }

    /// Encode both snapshots, diff them and attach the patch
    fn patch_response(&self, uid: &str, original: &Pod, mutated: &Pod) -> Result<AdmissionResponse> {
        let original_bytes = self.codec.encode(original)?;
        let mutated_bytes = self.codec.encode(mutated)?;
        let patch = create_patch(&original_bytes, &mutated_bytes)?;

        if patch.0.is_empty() {
            // The policy selected the pod but changed nothing; no patch field at all.
            warn!(
                uid = %uid,
                policy = self.policy.name(),
                pod = %display_name(original),
                "Mutation produced an empty patch, allowing without patch"
            );
            return Ok(AdmissionResponse::allow(uid));
        }

        let bytes = patch_bytes(&patch)?;
        info!(
            uid = %uid,
            policy = self.policy.name(),
            pod = %display_name(original),
            patch_ops = patch.0.len(),
            "Mutating pod"
        );
        debug!(uid = %uid, patch = %String::from_utf8_lossy(&bytes), "Generated JSON patch");

        Ok(AdmissionResponse::allow(uid).with_patch(bytes))
    }
}

/// Reject a review with the status reason matching the error's cause
fn reject_error(uid: &str, error: &Error) -> AdmissionResponse {
    let reason = if error.is_bad_request() {
        StatusReason::BadRequest
    } else {
        StatusReason::InternalError
    };
    AdmissionResponse::reject(uid, reason, error.to_string())
}

/// Reject anything not declared as `application/json`
///
/// Media type parameters such as `charset` are ignored.
fn check_content_type(headers: &HeaderMap) -> std::result::Result<(), ReviewError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let media_type = content_type.split(';').next().unwrap_or("").trim();

    if media_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(ReviewError::UnsupportedMediaType(content_type.to_string()))
    }
}

/// Handle `POST /mutate`
pub async fn mutate_handler(
    State(handler): State<Arc<ReviewHandler>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Json<AdmissionReview>, ReviewError> {
    if let Err(e) = check_content_type(&headers) {
        error!(error = %e, "Rejecting review");
        return Err(e);
    }

    debug!(body = %String::from_utf8_lossy(&body), "Handling request");

    let review: AdmissionReview = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Failed to parse admission review");
        ReviewError::MalformedReview(format!("failed to unmarshal AdmissionReview: {e}"))
    })?;

    let reply = handler.review(&review).inspect_err(|e| {
        error!(error = %e, "Rejecting review");
    })?;

    debug!(response = ?reply.response, "Sending response");
    Ok(Json(reply))
}
