use std::collections::BTreeMap;

use crate::consts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Cluster-local hostnames of an ingress implementation's gateways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerDomain {
    pub private: String,
    pub public: String,
}

impl LoadBalancerDomain {
    pub fn new(private: &str, public: &str) -> Self {
        LoadBalancerDomain {
            private: private.to_string(),
            public: public.to_string(),
        }
    }

    pub fn select(&self, visibility: Visibility) -> &str {
        match visibility {
            Visibility::Private => &self.private,
            Visibility::Public => &self.public,
        }
    }
}

/// Immutable table of known ingress implementations, keyed by the first
/// label of their class name (`kourier` for `kourier.ingress.networking.knative.dev`).
///
/// Built once at startup and shared read-only between reconciliations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTable {
    classes: BTreeMap<String, LoadBalancerDomain>,
    fallback: LoadBalancerDomain,
}

impl Default for DomainTable {
    fn default() -> Self {
        DomainTable::new(
            [
                (
                    "istio",
                    LoadBalancerDomain::new(
                        "istio-ingressgateway.istio-system.svc.cluster.local",
                        "knative-local-gateway.istio-system.svc.cluster.local",
                    ),
                ),
                (
                    "kourier",
                    LoadBalancerDomain::new(
                        "kourier.kourier-system.svc.cluster.local",
                        "kourier.kourier-system.svc.cluster.local",
                    ),
                ),
            ],
            LoadBalancerDomain::new(
                "kourier-internal.kourier-system.svc.cluster.local",
                "kourier.kourier-system.svc.cluster.local",
            ),
        )
    }
}

fn lookup_key(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

impl DomainTable {
    pub fn new<'a>(
        classes: impl IntoIterator<Item = (&'a str, LoadBalancerDomain)>,
        fallback: LoadBalancerDomain,
    ) -> Self {
        DomainTable {
            classes: classes
                .into_iter()
                .map(|(key, domain)| (key.to_string(), domain))
                .collect(),
            fallback,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&LoadBalancerDomain> {
        self.classes.get(lookup_key(name))
    }

    /// Domain of the gateway serving `name`, or the default gateway when
    /// the first label of `name` is not a known class.
    pub fn domain_for(&self, name: &str, visibility: Visibility) -> &str {
        self.lookup(name).unwrap_or(&self.fallback).select(visibility)
    }

    /// Ingress class stamped on derived ingresses. Unknown or missing
    /// classes fall back to Kourier.
    pub fn resolve_ingress_class(&self, class: Option<&str>) -> String {
        match class {
            Some(class) if self.lookup(class).is_some() => class.to_string(),
            Some(class) => {
                tracing::warn!(
                    "Unknown ingress class {class}, falling back to {}",
                    consts::DEFAULT_INGRESS_CLASS
                );
                consts::DEFAULT_INGRESS_CLASS.to_string()
            }
            None => consts::DEFAULT_INGRESS_CLASS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DomainTable, LoadBalancerDomain, Visibility};

    #[rstest]
    #[case("istio.hello", Visibility::Private, "istio-ingressgateway.istio-system.svc.cluster.local")]
    #[case("istio.hello", Visibility::Public, "knative-local-gateway.istio-system.svc.cluster.local")]
    #[case("kourier", Visibility::Private, "kourier.kourier-system.svc.cluster.local")]
    #[case("hello", Visibility::Private, "kourier-internal.kourier-system.svc.cluster.local")]
    #[case("hello", Visibility::Public, "kourier.kourier-system.svc.cluster.local")]
    #[case("", Visibility::Public, "kourier.kourier-system.svc.cluster.local")]
    fn resolves_domains(
        #[case] name: &str,
        #[case] visibility: Visibility,
        #[case] expected: &str,
    ) {
        assert_eq!(DomainTable::default().domain_for(name, visibility), expected);
    }

    #[rstest]
    #[case(Some("istio.ingress.networking.knative.dev"), "istio.ingress.networking.knative.dev")]
    #[case(Some("kourier.ingress.networking.knative.dev"), "kourier.ingress.networking.knative.dev")]
    #[case(Some("contour.ingress.networking.knative.dev"), "kourier.ingress.networking.knative.dev")]
    #[case(Some(""), "kourier.ingress.networking.knative.dev")]
    #[case(None, "kourier.ingress.networking.knative.dev")]
    fn resolves_ingress_class(#[case] class: Option<&str>, #[case] expected: &str) {
        assert_eq!(DomainTable::default().resolve_ingress_class(class), expected);
    }

    #[test]
    fn custom_table_uses_its_own_fallback() {
        let table = DomainTable::new(
            [("contour", LoadBalancerDomain::new("contour-internal", "contour-external"))],
            LoadBalancerDomain::new("private-default", "public-default"),
        );
        assert_eq!(table.domain_for("contour.x", Visibility::Public), "contour-external");
        assert_eq!(table.domain_for("istio.x", Visibility::Private), "private-default");
    }
}
