//! Runtime class configuration

/// Runtime class assigned when `RUNTIME_CLASS_NAME` is not provided
pub const DEFAULT_RUNTIME_CLASS_NAME: &str = "runhcs-wcow-hypervisor";

/// Resolve the configured runtime class name, falling back to the default
///
/// Blank values count as unset.
pub fn resolve_runtime_class_name(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_RUNTIME_CLASS_NAME)
        .to_string()
}
