//! Hyper-V runtime class mutating admission webhook
//!
//! Runs the Windows e2e suite under Hyper-V isolation by assigning a
//! Hyper-V runtime class to every pod that does not set one. Host-process
//! pods and pods pinned to Linux nodes are left alone, since neither can run
//! in a Hyper-V isolated Windows sandbox.

#![deny(missing_docs)]

pub mod config;
pub mod policy;

pub use config::{resolve_runtime_class_name, DEFAULT_RUNTIME_CLASS_NAME};
pub use policy::HypervPolicy;
