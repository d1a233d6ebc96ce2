//! AdmissionReview envelope types
//!
//! The API server posts an `AdmissionReview` carrying a `request` and expects
//! the same envelope back carrying a `response`. The admitted object is kept
//! as raw JSON so decoding stays the codec's responsibility and a review whose
//! object cannot be decoded still yields a UID to echo.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use k8s_openapi::ByteString;
use kube::core::{GroupVersionKind, GroupVersionResource};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Top-level review envelope, used for both directions
///
/// `apiVersion` and `kind` are plain fields rather than a flattened
/// `TypeMeta`: serde's flatten buffering cannot hand a `RawValue` through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    /// Envelope API version, echoed back on the response
    pub api_version: String,
    /// Envelope kind, echoed back on the response
    pub kind: String,
    /// Present on the way in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    /// Present on the way out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Build the reply envelope for this review, echoing its group-version-kind
    pub fn reply(&self, response: AdmissionResponse) -> AdmissionReview {
        AdmissionReview {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            request: None,
            response: Some(response),
        }
    }
}

/// The operation that triggered the review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Object creation
    Create,
    /// Object update
    Update,
    /// Object deletion
    Delete,
    /// Connect to a subresource (exec, attach, port-forward)
    Connect,
}

/// One candidate mutation, as sent by the API server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Correlation identifier, echoed verbatim in the response
    pub uid: String,
    /// Kind of the object being admitted
    pub kind: GroupVersionKind,
    /// Resource type being admitted
    pub resource: GroupVersionResource,
    /// Subresource, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    /// Kind as originally requested, before any conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<GroupVersionKind>,
    /// Resource as originally requested, before any conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_resource: Option<GroupVersionResource>,
    /// Object name; may be empty on CREATE with `generateName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Object namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Triggering operation
    pub operation: Operation,
    /// Raw object being admitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Box<RawValue>>,
    /// Raw object before the update, on UPDATE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object: Option<Box<RawValue>>,
    /// Whether the request is a dry run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

impl AdmissionRequest {
    /// Raw bytes of the admitted object, if the request carries one
    pub fn object_bytes(&self) -> Option<&[u8]> {
        self.object
            .as_deref()
            .map(|raw| raw.get().as_bytes())
            .filter(|raw| *raw != b"null")
    }
}

/// Encoding of the patch carried by a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchType {
    /// RFC 6902 JSON Patch
    #[serde(rename = "JSONPatch")]
    JsonPatch,
}

/// Machine-readable reason attached to a rejected review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReason {
    /// The review or the object it carries was malformed
    BadRequest,
    /// The webhook failed while building its answer
    InternalError,
}

impl StatusReason {
    /// The apimachinery `StatusReason` string
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusReason::BadRequest => "BadRequest",
            StatusReason::InternalError => "InternalError",
        }
    }

    /// HTTP status code conventionally paired with this reason
    pub fn code(&self) -> i32 {
        match self {
            StatusReason::BadRequest => 400,
            StatusReason::InternalError => 500,
        }
    }
}

/// The webhook's verdict on one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Copied from the request
    pub uid: String,
    /// Whether the object may be persisted
    pub allowed: bool,
    /// Populated only when the review is rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Serialized JSON Patch, base64 on the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<ByteString>,
    /// Present exactly when `patch` is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
}

impl AdmissionResponse {
    /// Allow the object unchanged
    pub fn allow(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            ..Default::default()
        }
    }

    /// Reject the object with a status explaining why
    pub fn reject(uid: impl Into<String>, reason: StatusReason, message: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: false,
            status: Some(Status {
                code: Some(reason.code()),
                message: Some(message.into()),
                reason: Some(reason.as_str().to_string()),
                status: Some("Failure".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Attach serialized JSON Patch bytes
    pub fn with_patch(mut self, patch: Vec<u8>) -> Self {
        self.patch = Some(ByteString(patch));
        self.patch_type = Some(PatchType::JsonPatch);
        self
    }

    /// Reason string of the attached status, if any
    pub fn reason(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(object: serde_json::Value) -> AdmissionReview {
        let body = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "name": "web",
                "namespace": "default",
                "operation": "CREATE",
                "object": object
            }
        });
        serde_json::from_str(&body.to_string()).unwrap()
    }

    #[test]
    fn parses_api_server_review() {
        let review = parse(json!({"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "web"}}));

        assert_eq!(review.kind, "AdmissionReview");
        let request = review.request.unwrap();
        assert_eq!(request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(request.resource.resource, "pods");
        assert_eq!(request.kind.kind, "Pod");
        assert_eq!(request.operation, Operation::Create);
        assert!(request.object_bytes().unwrap().starts_with(b"{"));
        assert!(request.old_object.is_none());
    }

    #[test]
    fn null_object_reads_as_absent() {
        let review = parse(serde_json::Value::Null);
        assert!(review.request.unwrap().object_bytes().is_none());
    }

    #[test]
    fn allow_response_omits_optional_fields() {
        let value = serde_json::to_value(AdmissionResponse::allow("abc")).unwrap();
        assert_eq!(value, json!({"uid": "abc", "allowed": true}));
    }

    #[test]
    fn patched_response_is_base64_with_patch_type() {
        let response = AdmissionResponse::allow("abc").with_patch(b"[]".to_vec());
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["patch"], "W10=");
        assert_eq!(value["patchType"], "JSONPatch");
    }

    #[test]
    fn rejected_response_carries_reason_and_code() {
        let response =
            AdmissionResponse::reject("abc", StatusReason::BadRequest, "no object provided");
        assert!(!response.allowed);
        assert_eq!(response.reason(), Some("BadRequest"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"]["message"], "no object provided");
        assert_eq!(value["status"]["code"], 400);
        assert!(value.get("patch").is_none());
    }

    #[test]
    fn reply_echoes_envelope_type_metadata() {
        let review = parse(json!({}));
        let reply = review.reply(AdmissionResponse::allow("abc"));

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["apiVersion"], "admission.k8s.io/v1");
        assert_eq!(value["kind"], "AdmissionReview");
        assert!(value.get("request").is_none());
        assert_eq!(value["response"]["uid"], "abc");
    }
}
