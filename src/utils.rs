/// Longest name Kubernetes accepts for a DNS-1035 label.
const MAX_NAME_LENGTH: usize = 63;
const MD5_HEX_LENGTH: usize = 32;

/// Name of an object derived from `parent`.
///
/// Names that would exceed 63 characters keep a prefix of the parent and
/// replace the rest with the md5 of the parent, so distinct parents still
/// produce distinct children.
pub fn child_name(parent: &str, suffix: &str) -> String {
    if parent.len() + suffix.len() <= MAX_NAME_LENGTH {
        return format!("{parent}{suffix}");
    }
    let head = match MAX_NAME_LENGTH.checked_sub(MD5_HEX_LENGTH + suffix.len()) {
        Some(head) if head > 0 => head,
        // The suffix alone leaves no room for a prefix.
        _ => return format!("{:x}", md5::compute(format!("{parent}{suffix}"))),
    };
    let prefix = parent
        .get(..head)
        .unwrap_or(parent)
        .trim_end_matches('-');
    format!("{prefix}{:x}{suffix}", md5::compute(parent))
}

/// Cluster-internal hostname of a service.
pub fn service_hostname(name: &str, namespace: &str, cluster_domain: &str) -> String {
    format!("{name}.{namespace}.svc.{cluster_domain}")
}
