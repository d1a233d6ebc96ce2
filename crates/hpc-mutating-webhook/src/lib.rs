//! HPC mutating admission webhook
//!
//! Windows host-process pods cannot run the Linux-style `agnhost` entrypoint
//! that e2e tests put in their pod specs. This webhook finds host-process,
//! host-network pods with agnhost containers and rewrites each such container
//! to copy the agnhost binary to an `.exe` and run it through PowerShell,
//! preserving the original subcommand and arguments.

#![deny(missing_docs)]

pub mod policy;

pub use policy::HpcPolicy;
