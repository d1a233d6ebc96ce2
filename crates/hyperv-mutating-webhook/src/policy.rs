//! Hyper-V predicate and mutator

use admission_core::pod::{
    any_container_host_process, containers, init_containers, node_selector, pod_host_process,
    OS_NODE_SELECTOR,
};
use admission_core::policy::{set_annotation, MutationPolicy};
use k8s_openapi::api::core::v1::Pod;

use crate::config::DEFAULT_RUNTIME_CLASS_NAME;

/// Annotation recording that the pod was seen by this webhook
pub const MUTATED_ANNOTATION: &str = "hyperv-runtimeclass-mutating-webhook";

/// Value written to [`MUTATED_ANNOTATION`]
pub const MUTATED_VALUE: &str = "mutated";

/// OS this runtime class cannot serve
const EXCLUDED_OS: &str = "linux";

/// Assigns a Hyper-V runtime class to eligible pods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypervPolicy {
    runtime_class_name: String,
}

impl HypervPolicy {
    /// Create a policy assigning the given runtime class
    pub fn new(runtime_class_name: impl Into<String>) -> Self {
        Self {
            runtime_class_name: runtime_class_name.into(),
        }
    }

    /// Runtime class assigned to pods that do not set one
    pub fn runtime_class_name(&self) -> &str {
        &self.runtime_class_name
    }
}

impl Default for HypervPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_CLASS_NAME)
    }
}

impl MutationPolicy for HypervPolicy {
    fn name(&self) -> &'static str {
        "hyperv"
    }

    fn should_mutate(&self, pod: &Pod) -> bool {
        !is_host_process_pod(pod) && node_selector(pod, OS_NODE_SELECTOR) != Some(EXCLUDED_OS)
    }

    fn mutate(&self, pod: &Pod) -> Pod {
        let mut mutated = pod.clone();
        set_annotation(&mut mutated, MUTATED_ANNOTATION, MUTATED_VALUE);

        // An explicit runtime class always wins.
        if let Some(spec) = mutated.spec.as_mut() {
            if spec.runtime_class_name.is_none() {
                spec.runtime_class_name = Some(self.runtime_class_name.clone());
            }
        }
        mutated
    }
}

/// Host-process requested at pod level, or by any container or init container
pub fn is_host_process_pod(pod: &Pod) -> bool {
    pod_host_process(pod) == Some(true)
        || any_container_host_process(containers(pod).iter().chain(init_containers(pod)))
}
