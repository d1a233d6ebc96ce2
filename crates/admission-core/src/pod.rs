//! Read-only helpers for inspecting Pod security settings
//!
//! Policies need to tell "not specified" apart from "specified false" at
//! both pod and container level, so the lookups return `Option<bool>` and
//! leave the interpretation to the caller.

use k8s_openapi::api::core::v1::{Container, Pod};

/// Node selector key that pins a pod to an operating system
pub const OS_NODE_SELECTOR: &str = "kubernetes.io/os";

/// Pod-level `securityContext.windowsOptions.hostProcess`
pub fn pod_host_process(pod: &Pod) -> Option<bool> {
    pod.spec
        .as_ref()?
        .security_context
        .as_ref()?
        .windows_options
        .as_ref()?
        .host_process
}

/// Container-level `securityContext.windowsOptions.hostProcess`
pub fn container_host_process(container: &Container) -> Option<bool> {
    container
        .security_context
        .as_ref()?
        .windows_options
        .as_ref()?
        .host_process
}

/// Regular containers of the pod, empty when the pod has no spec
pub fn containers(pod: &Pod) -> &[Container] {
    pod.spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default()
}

/// Init containers of the pod, empty when none are declared
pub fn init_containers(pod: &Pod) -> &[Container] {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.init_containers.as_deref())
        .unwrap_or_default()
}

/// Whether any of `containers` explicitly requests host-process mode
pub fn any_container_host_process<'a>(
    mut containers: impl Iterator<Item = &'a Container>,
) -> bool {
    containers.any(|c| container_host_process(c) == Some(true))
}

/// Pod-level `hostNetwork`, treating unset as false
pub fn host_network(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.host_network)
        .unwrap_or(false)
}

/// Value of a node selector entry, if present
pub fn node_selector<'a>(pod: &'a Pod, key: &str) -> Option<&'a str> {
    pod.spec
        .as_ref()?
        .node_selector
        .as_ref()?
        .get(key)
        .map(String::as_str)
}

/// Human-readable `namespace/name` for log fields
///
/// Pods admitted on CREATE often only carry `generateName`, which is used
/// when `name` is still empty.
pub fn display_name(pod: &Pod) -> String {
    let meta = &pod.metadata;
    let name = meta
        .name
        .as_deref()
        .or(meta.generate_name.as_deref())
        .unwrap_or("");
    match meta.namespace.as_deref() {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        PodSecurityContext, PodSpec, SecurityContext, WindowsSecurityContextOptions,
    };
    use std::collections::BTreeMap;

    fn windows_options(host_process: Option<bool>) -> Option<WindowsSecurityContextOptions> {
        Some(WindowsSecurityContextOptions {
            host_process,
            ..Default::default()
        })
    }

    fn container_with(host_process: Option<bool>) -> Container {
        Container {
            name: "c".to_string(),
            security_context: Some(SecurityContext {
                windows_options: windows_options(host_process),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn pod_host_process_is_tri_state() {
        let mut pod = Pod::default();
        assert_eq!(pod_host_process(&pod), None);

        pod.spec = Some(PodSpec {
            security_context: Some(PodSecurityContext {
                windows_options: windows_options(None),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(pod_host_process(&pod), None);

        pod.spec.as_mut().unwrap().security_context = Some(PodSecurityContext {
            windows_options: windows_options(Some(false)),
            ..Default::default()
        });
        assert_eq!(pod_host_process(&pod), Some(false));
    }

    #[test]
    fn container_host_process_reads_security_context() {
        assert_eq!(container_host_process(&Container::default()), None);
        assert_eq!(container_host_process(&container_with(Some(true))), Some(true));
        assert_eq!(container_host_process(&container_with(Some(false))), Some(false));
    }

    #[test]
    fn any_container_requires_explicit_true() {
        let unset = [container_with(None), container_with(Some(false))];
        assert!(!any_container_host_process(unset.iter()));

        let set = [container_with(None), container_with(Some(true))];
        assert!(any_container_host_process(set.iter()));
    }

    #[test]
    fn missing_spec_reads_as_empty() {
        let pod = Pod::default();
        assert!(containers(&pod).is_empty());
        assert!(init_containers(&pod).is_empty());
        assert!(!host_network(&pod));
        assert_eq!(node_selector(&pod, OS_NODE_SELECTOR), None);
    }

    #[test]
    fn node_selector_lookup() {
        let pod = Pod {
            spec: Some(PodSpec {
                node_selector: Some(BTreeMap::from([(
                    OS_NODE_SELECTOR.to_string(),
                    "windows".to_string(),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(node_selector(&pod, OS_NODE_SELECTOR), Some("windows"));
        assert_eq!(node_selector(&pod, "other"), None);
    }

    #[test]
    fn display_name_falls_back_to_generate_name() {
        let mut pod = Pod::default();
        pod.metadata.generate_name = Some("web-".to_string());
        assert_eq!(display_name(&pod), "web-");

        pod.metadata.namespace = Some("team".to_string());
        pod.metadata.name = Some("web-1".to_string());
        assert_eq!(display_name(&pod), "team/web-1");
    }
}
