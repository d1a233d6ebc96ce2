//! HPC predicate and mutator

use admission_core::policy::{set_annotation, MutationPolicy};
use admission_core::pod::{any_container_host_process, containers, host_network, pod_host_process};
use k8s_openapi::api::core::v1::{Container, Pod};

/// Image substring and entrypoint token identifying agnhost containers
pub const AGNHOST: &str = "agnhost";

/// Annotation recording that the pod was rewritten
pub const MUTATED_ANNOTATION: &str = "hpc.kubernetes.io/mutated";

/// Interpreter invocation replacing the container command
pub const WRAPPER_COMMAND: [&str; 2] = ["powershell", "-Command"];

/// Script prefix; the joined agnhost arguments follow it
const SCRIPT_PREFIX: &str = r"Copy-Item c:\hpc\agnhost -Destination c:\hpc\agnhost.exe; c:\hpc\agnhost.exe ";

/// Rewrites agnhost containers in host-process pods
#[derive(Debug, Clone, Copy, Default)]
pub struct HpcPolicy;

impl MutationPolicy for HpcPolicy {
    fn name(&self) -> &'static str {
        "hpc"
    }

    fn should_mutate(&self, pod: &Pod) -> bool {
        host_process_requested(pod)
            && host_network(pod)
            && containers(pod).iter().any(is_agnhost_container)
    }

    fn mutate(&self, pod: &Pod) -> Pod {
        let mut mutated = pod.clone();
        let mut changed = false;

        if let Some(spec) = mutated.spec.as_mut() {
            for container in spec.containers.iter_mut().filter(|c| is_agnhost_container(c)) {
                let (command, args) =
                    wrap_command(container.command.as_deref(), container.args.as_deref());
                container.command = Some(command);
                container.args = Some(args);
                changed = true;
            }
        }

        if changed {
            set_annotation(&mut mutated, MUTATED_ANNOTATION, "true");
        }
        mutated
    }
}

/// Host-process requested at pod level or by any regular container
pub fn host_process_requested(pod: &Pod) -> bool {
    pod_host_process(pod) == Some(true) || any_container_host_process(containers(pod).iter())
}

/// Whether a command token is `agnhost` alone or `agnhost` followed by whitespace
///
/// Anchored at the start: `notagnhost` and `agnhost-foo` do not match.
pub fn matches_agnhost_command(token: &str) -> bool {
    token
        .strip_prefix(AGNHOST)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Agnhost image with either no command or an agnhost entrypoint
pub fn is_agnhost_container(container: &Container) -> bool {
    let uses_agnhost_image = container
        .image
        .as_deref()
        .is_some_and(|image| image.contains(AGNHOST));
    if !uses_agnhost_image {
        return false;
    }

    match container.command.as_deref() {
        None | Some([]) => true,
        Some([first, ..]) => matches_agnhost_command(first),
    }
}

/// Build the PowerShell command and argument vectors for an agnhost container
///
/// The leading `agnhost` token is dropped; the rest of the command and all
/// arguments are space-joined onto the script.
pub fn wrap_command(command: Option<&[String]>, args: Option<&[String]>) -> (Vec<String>, Vec<String>) {
    let mut parts: Vec<&str> = Vec::new();

    if let Some((first, rest)) = command.unwrap_or_default().split_first() {
        let first = strip_agnhost(first);
        if !first.is_empty() {
            parts.push(first);
        }
        parts.extend(rest.iter().map(String::as_str));
    }
    parts.extend(args.unwrap_or_default().iter().map(String::as_str));

    let script = format!("{SCRIPT_PREFIX}{}", parts.join(" "));
    (
        WRAPPER_COMMAND.iter().map(|s| s.to_string()).collect(),
        vec![script],
    )
}

fn strip_agnhost(token: &str) -> &str {
    if matches_agnhost_command(token) {
        token[AGNHOST.len()..].trim_start()
    } else {
        token
    }
}
