//! The predicate/mutator seam
//!
//! Each webhook binary supplies one [`MutationPolicy`]. The review handler
//! only calls [`MutationPolicy::mutate`] after [`MutationPolicy::should_mutate`]
//! returned true, and both calls are pure: no I/O, no shared mutable state.

use k8s_openapi::api::core::v1::Pod;
use kube::core::GroupVersionResource;
#[cfg(test)]
use mockall::automock;

/// Decides whether a Pod should be transformed, and transforms it
#[cfg_attr(test, automock)]
pub trait MutationPolicy: Send + Sync {
    /// Short policy name used in log fields
    fn name(&self) -> &'static str;

    /// Whether this policy reviews objects of the given resource type
    ///
    /// Defaults to core-group `pods`; anything else is allowed unchanged
    /// without decoding.
    fn handles(&self, resource: &GroupVersionResource) -> bool {
        is_pod_resource(resource)
    }

    /// Total, deterministic predicate; never modifies the Pod
    fn should_mutate(&self, pod: &Pod) -> bool;

    /// Return a copy of the Pod with only the intended fields changed
    fn mutate(&self, pod: &Pod) -> Pod;
}

/// Whether the resource is the core-group `pods` resource
pub fn is_pod_resource(resource: &GroupVersionResource) -> bool {
    resource.group.is_empty() && resource.resource == "pods"
}

/// Set an annotation, creating the annotation map if the Pod has none
pub fn set_annotation(pod: &mut Pod, key: &str, value: &str) {
    pod.metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
}
