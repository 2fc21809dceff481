use kube::ResourceExt;

use crate::{
    crd::{Condition, KIngress, KIngressStatus, LoadBalancerIngressStatus, LoadBalancerStatus},
    domains::{DomainTable, Visibility},
};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_LOAD_BALANCER_READY: &str = "LoadBalancerReady";
pub const CONDITION_NETWORK_CONFIGURED: &str = "NetworkConfigured";

const STATUS_TRUE: &str = "True";
const STATUS_UNKNOWN: &str = "Unknown";

impl KIngressStatus {
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    fn is_true(&self, type_: &str) -> bool {
        self.condition(type_).is_some_and(|c| c.status == STATUS_TRUE)
    }

    fn set_condition(&mut self, type_: &str, status: &str) {
        let condition = Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: None,
            message: None,
        };
        match self.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
        self.conditions.sort_by(|a, b| a.type_.cmp(&b.type_));
    }

    /// `Ready` follows the dependent conditions.
    fn update_ready(&mut self) {
        let ready = self.is_true(CONDITION_LOAD_BALANCER_READY)
            && self.is_true(CONDITION_NETWORK_CONFIGURED);
        self.set_condition(
            CONDITION_READY,
            if ready { STATUS_TRUE } else { STATUS_UNKNOWN },
        );
    }

    pub fn mark_load_balancer_ready(
        &mut self,
        public: Vec<LoadBalancerIngressStatus>,
        private: Vec<LoadBalancerIngressStatus>,
    ) {
        self.public_load_balancer = Some(LoadBalancerStatus { ingress: public });
        self.private_load_balancer = Some(LoadBalancerStatus { ingress: private });
        self.set_condition(CONDITION_LOAD_BALANCER_READY, STATUS_TRUE);
        self.update_ready();
    }

    pub fn mark_network_configured(&mut self) {
        self.set_condition(CONDITION_NETWORK_CONFIGURED, STATUS_TRUE);
        self.update_ready();
    }
}

fn internal_domain(domain: &str) -> LoadBalancerIngressStatus {
    LoadBalancerIngressStatus {
        domain_internal: Some(domain.to_string()),
        ..Default::default()
    }
}

/// Reports the ingress as served by the gateways of its class. Only the
/// status is touched.
pub fn mark_ingress_ready(ingress: &mut KIngress, domains: &DomainTable) {
    let name = ingress.name_any();
    let public = domains.domain_for(&name, Visibility::Public);
    let private = domains.domain_for(&name, Visibility::Private);
    let generation = ingress.metadata.generation;

    let status = ingress.status.get_or_insert_default();
    status.observed_generation = generation;
    status.mark_load_balancer_ready(vec![internal_domain(public)], vec![internal_domain(private)]);
    status.mark_network_configured();
}
