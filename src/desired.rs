//! Desired state of the objects derived from an async ingress.
//!
//! Both builders are pure: they are recomputed from the original ingress on
//! every reconciliation and never look at what is currently stored.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{Service, ServicePort, ServiceSpec},
    apimachinery::pkg::util::intstr::IntOrString,
};
use kube::{ResourceExt, api::ObjectMeta};

use crate::{
    consts,
    crd::{
        HeaderMatch, HttpIngressPath, HttpIngressRuleValue, IngressBackend, IngressBackendSplit,
        IngressRule, KIngress, KIngressSpec,
    },
    ctx::RoutingSettings,
    mode::AsyncMode,
    utils::{child_name, service_hostname},
};

/// Port the `-async` service exposes and forwards to.
const ASYNC_SERVICE_PORT: i32 = 80;

/// Port layout of a service speaking a given transport.
struct Transport {
    port_name: &'static str,
    protocol: &'static str,
    port: i32,
}

const HTTP1: Transport = Transport {
    port_name: "http",
    protocol: "TCP",
    port: 80,
};

/// Everything a path needs to be sent to the async producer.
struct AsyncRoute {
    splits: Vec<IngressBackendSplit>,
    original_host: String,
    producer_host: String,
}

impl AsyncRoute {
    fn new(ingress: &KIngress, settings: &RoutingSettings) -> Self {
        let name = ingress.name_any();
        let namespace = ingress.namespace().unwrap_or_default();
        AsyncRoute {
            splits: vec![IngressBackendSplit {
                backend: IngressBackend {
                    service_name: child_name(&name, consts::ASYNC_SUFFIX),
                    service_namespace: namespace.clone(),
                    service_port: IntOrString::Int(ASYNC_SERVICE_PORT),
                },
                percent: 100,
                append_headers: BTreeMap::new(),
            }],
            original_host: service_hostname(&name, &namespace, &settings.cluster_domain),
            producer_host: service_hostname(
                consts::PRODUCER_SERVICE_NAME,
                &settings.system_namespace,
                &settings.cluster_domain,
            ),
        }
    }

    /// Points `path` at the producer, keeping its match criteria.
    fn apply(&self, mut path: HttpIngressPath) -> HttpIngressPath {
        path.splits = self.splits.clone();
        path.append_headers = BTreeMap::from([(
            consts::ASYNC_ORIGINAL_HOST_HEADER.to_string(),
            self.original_host.clone(),
        )]);
        path.rewrite_host = self.producer_host.clone();
        path
    }
}

fn prefer(value: &str) -> (String, HeaderMatch) {
    (consts::PREFER_HEADER.to_string(), HeaderMatch::exact(value))
}

/// Async by default: every path gets a sync twin selected by
/// `Prefer: respond-sync`, followed by its async catch-all.
fn always_async_paths(paths: &[HttpIngressPath], route: &AsyncRoute) -> Vec<HttpIngressPath> {
    paths
        .iter()
        .flat_map(|path| {
            let mut sync_path = path.clone();
            let (header, opt_out) = prefer(consts::PREFER_SYNC);
            sync_path.headers.insert(header, opt_out);
            [sync_path, route.apply(path.clone())]
        })
        .collect()
}

/// Sync by default: a single leading path selected by
/// `Prefer: respond-async`, then the original paths.
fn conditional_async_paths(paths: &[HttpIngressPath], route: &AsyncRoute) -> Vec<HttpIngressPath> {
    let opt_in = route.apply(HttpIngressPath {
        headers: BTreeMap::from([prefer(consts::PREFER_ASYNC)]),
        ..Default::default()
    });
    std::iter::once(opt_in).chain(paths.iter().cloned()).collect()
}

fn rewrite_rule(rule: &IngressRule, mode: AsyncMode, route: &AsyncRoute) -> IngressRule {
    let paths = rule.paths();
    if paths.is_empty() {
        return rule.clone();
    }
    let paths = match mode {
        AsyncMode::Always => always_async_paths(paths, route),
        AsyncMode::Conditional | AsyncMode::Default => conditional_async_paths(paths, route),
    };
    IngressRule {
        http: Some(HttpIngressRuleValue { paths }),
        ..rule.clone()
    }
}

fn derived_annotations(ingress: &KIngress, ingress_class: &str) -> BTreeMap<String, String> {
    let mut annotations: BTreeMap<String, String> = ingress
        .annotations()
        .iter()
        .filter(|(key, _)| key.as_str() != consts::LAST_APPLIED_ANNOTATION)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    annotations.insert(
        consts::INGRESS_CLASS_ANNOTATION.to_string(),
        ingress_class.to_string(),
    );
    annotations
}

/// Builds `<name>-new`, a copy of `ingress` whose rules can route requests
/// to the async producer.
///
/// Each original rule produces exactly one rule, in order.
pub fn make_new_ingress(ingress: &KIngress, mode: AsyncMode, settings: &RoutingSettings) -> KIngress {
    let route = AsyncRoute::new(ingress, settings);
    KIngress {
        metadata: ObjectMeta {
            name: Some(format!("{}{}", ingress.name_any(), consts::NEW_SUFFIX)),
            namespace: ingress.namespace(),
            annotations: Some(derived_annotations(ingress, &settings.ingress_class)),
            labels: ingress.metadata.labels.clone(),
            owner_references: ingress.metadata.owner_references.clone(),
            ..Default::default()
        },
        spec: KIngressSpec {
            rules: ingress
                .spec
                .rules
                .iter()
                .map(|rule| rewrite_rule(rule, mode, &route))
                .collect(),
            ..ingress.spec.clone()
        },
        status: None,
    }
}

/// Builds `<name>-async`, an `ExternalName` service aliasing the async
/// producer. Splits of the derived ingress target it.
pub fn make_async_service(ingress: &KIngress, settings: &RoutingSettings) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(child_name(&ingress.name_any(), consts::ASYNC_SUFFIX)),
            namespace: ingress.namespace(),
            labels: Some(BTreeMap::from([(
                consts::ASYNC_SERVICE_LABEL.to_string(),
                ingress.name_any(),
            )])),
            owner_references: ingress.metadata.owner_references.clone(),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ExternalName".to_string()),
            external_name: Some(service_hostname(
                consts::PRODUCER_SERVICE_NAME,
                &settings.system_namespace,
                &settings.cluster_domain,
            )),
            ports: Some(vec![ServicePort {
                name: Some(HTTP1.port_name.to_string()),
                protocol: Some(HTTP1.protocol.to_string()),
                port: HTTP1.port,
                target_port: Some(IntOrString::Int(ASYNC_SERVICE_PORT)),
                ..Default::default()
            }]),
            selector: Some(BTreeMap::from([(
                "app".to_string(),
                consts::PRODUCER_SERVICE_NAME.to_string(),
            )])),
            session_affinity: Some("None".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
