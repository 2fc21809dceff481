use std::sync::{Arc, atomic::AtomicBool};

use k8s_openapi::api::core::v1::Service;
use kube::runtime::reflector::Store;

use crate::{args::AsyncIngressArgs, crd::KIngress, domains::DomainTable, store::KubeObjectStore};

/// Read-only inputs of the desired state computation.
#[derive(Debug, Clone)]
pub struct RoutingSettings {
    /// Class stamped on derived ingresses.
    pub ingress_class: String,
    pub system_namespace: String,
    pub cluster_domain: String,
    pub domains: DomainTable,
}

impl RoutingSettings {
    pub fn from_args(args: &AsyncIngressArgs) -> Self {
        let domains = DomainTable::default();
        RoutingSettings {
            ingress_class: domains.resolve_ingress_class(args.ingress_class_name.as_deref()),
            system_namespace: args.system_namespace.clone(),
            cluster_domain: args.cluster_domain.clone(),
            domains,
        }
    }
}

#[derive(Clone)]
pub struct Context {
    pub args: AsyncIngressArgs,
    pub client: kube::Client,
    pub is_leader: Arc<AtomicBool>,
    pub hostname: String,
    pub settings: RoutingSettings,
    pub ingresses: KubeObjectStore<KIngress>,
    pub services: KubeObjectStore<Service>,
}

impl Context {
    pub fn new(
        args: AsyncIngressArgs,
        client: kube::Client,
        ingress_cache: Store<KIngress>,
        service_cache: Store<Service>,
    ) -> anyhow::Result<Self> {
        let is_leader = Arc::new(AtomicBool::new(false));
        let hostname = std::env::var("HOSTNAME").or_else(|_| std::env::var("HOST"))?;
        let settings = RoutingSettings::from_args(&args);
        Ok(Context {
            ingresses: KubeObjectStore::new(client.clone(), ingress_cache),
            services: KubeObjectStore::new(client.clone(), service_cache),
            args,
            client,
            is_leader,
            hostname,
            settings,
        })
    }
}
