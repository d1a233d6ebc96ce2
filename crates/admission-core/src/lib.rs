//! Shared engine for pod mutating admission webhooks
//!
//! Every webhook built on this crate has the same shape: a TLS front door that
//! accepts `AdmissionReview` requests on `/mutate`, a review handler that
//! decodes the admitted Pod, asks a [`MutationPolicy`] whether and how to
//! change it, and answers with a JSON Patch that reconciles the two snapshots.
//!
//! # Pipeline
//!
//! ```text
//! POST /mutate ──► ReviewHandler ──► decode ──► should_mutate ──► mutate ──► encode ──► diff
//!                        │                           │ false
//!                        ◄───────── allowed, no patch ┘
//! ```
//!
//! # Modules
//!
//! - [`codec`] - Pod decoding and deterministic encoding
//! - [`patch`] - JSON Patch generation between two encoded snapshots
//! - [`policy`] - The predicate/mutator seam implemented by each webhook
//! - [`pod`] - Read-only helpers for inspecting pod security settings
//! - [`review`] - AdmissionReview envelope types
//! - [`handler`] - Per-request review pipeline
//! - [`server`] - HTTPS router and listener
//! - [`config`] - Startup flags shared by every webhook binary
//! - [`telemetry`] - Logging initialisation

#![deny(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod patch;
pub mod pod;
pub mod policy;
pub mod review;
pub mod server;
pub mod telemetry;

pub use codec::{JsonCodec, ObjectCodec};
pub use config::ServeArgs;
pub use error::Error;
pub use handler::{ReviewError, ReviewHandler};
pub use policy::MutationPolicy;
pub use review::{AdmissionRequest, AdmissionResponse, AdmissionReview, PatchType, StatusReason};
pub use server::{install_crypto_provider, serve, webhook_router, ServerConfig};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default HTTPS port for the webhook server
pub const DEFAULT_WEBHOOK_PORT: u16 = 443;

/// Largest review body accepted on `/mutate`
///
/// An UPDATE review carries two copies of an object that the API server
/// caps at 3 MiB, plus the envelope.
pub const MAX_REVIEW_BODY_BYTES: usize = 8 * 1024 * 1024;

/// The only content type accepted on `/mutate`
pub const JSON_CONTENT_TYPE: &str = "application/json";
